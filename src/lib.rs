//! # sitemake
//!
//! An incremental build orchestrator for a static blog. Given a project file
//! listing posts, pages, tags and static files, it works out which output
//! files are out of date and drives an external renderer (`blogc` by
//! default) to regenerate only those.
//!
//! # Architecture: Enumerate, Decide, Execute
//!
//! Every build rule runs the same three steps:
//!
//! ```text
//! 1. Enumerate  BuildContext  →  expected outputs     (pure path composition + stat)
//! 2. Decide     output + deps →  stale or fresh       (mtime comparison)
//! 3. Execute    stale output  →  render / copy / rm   (external renderer, filesystem)
//! ```
//!
//! Steps 1 and 2 never write anything. Step 3 goes through the
//! [`exec::Executor`] trait, so rule logic is tested against a recording mock
//! while the binary uses [`exec::NativeExecutor`].
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `sitemake.toml` loading, stock defaults, merging and validation |
//! | [`context`] | The [`BuildContext`](context::BuildContext): settings plus every stat'd input |
//! | [`file`] | [`FileHandle`](file::FileHandle): a path with its captured mtime |
//! | [`rebuild`] | The staleness decision |
//! | [`variables`] | Renderer variables and the shared builders rules use |
//! | [`rules`] | The rule table, `all`, and every build rule |
//! | [`dispatch`] | Parses `name:key=value` invocations and runs matching rules |
//! | [`exec`] | Executor trait and the native implementation |
//! | [`trigger`] | `watch` and `runserver`: rebuild on change |
//! | [`output`] | CLI output formatting: the rule listing |
//!
//! # Design Decisions
//!
//! ## Stat Once, Compare Later
//!
//! Every input is stat'd exactly once, when the context is built, and every
//! output once, when its rule enumerates it. A staleness decision compares
//! these snapshots and never goes back to the filesystem. The trigger loops
//! get fresh timestamps by building a whole new context.
//!
//! ## Missing Means Stale
//!
//! A dependency that cannot be stat'd forces a rebuild instead of failing the
//! build. The renderer then reports the real problem (a missing post, a typo
//! in a template name) in its own words.
//!
//! ## Prefix Dispatch
//!
//! Rule names on the command line are prefixes. `sitemake p` runs
//! `pagination`, `posts` and `pages`, in table order. Rules are never
//! deduplicated or reordered.

pub mod config;
pub mod context;
pub mod dispatch;
pub mod exec;
pub mod file;
pub mod output;
pub mod rebuild;
pub mod rules;
pub mod trigger;
pub mod variables;

#[cfg(test)]
pub(crate) mod test_helpers;
