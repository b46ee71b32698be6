//! The side-effecting steps a rule can take.
//!
//! | Operation | Native implementation |
//! |---|---|
//! | **Render** | spawns the external renderer (`blogc` by default) |
//! | **Copy** | `std::fs::copy`, creating parent directories |
//! | **Remove** | `std::fs::remove_file`, then prunes empty parents |
//! | **Is empty dir** | `std::fs::read_dir` |
//!
//! The module is split into:
//! - **Backend**: the [`Executor`] trait, [`RenderJob`] and [`ExecError`]
//! - **Native**: [`NativeExecutor`], the implementation used by the binary

pub mod backend;
pub mod native;

pub use backend::{ExecError, Executor, RenderJob};
pub use native::NativeExecutor;
