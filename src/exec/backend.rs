//! Executor trait and shared types.
//!
//! The [`Executor`] trait defines the four operations rules may perform:
//! render, copy, remove, and the empty-directory query used after a clean.
//! Rules only ever talk to this trait, so the engine can be driven by the
//! [`NativeExecutor`](super::native::NativeExecutor) in production and by a
//! recording mock in tests.

use crate::context::BuildContext;
use crate::file::FileHandle;
use crate::variables::{LocalVariables, Variables};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("{program} exited with status {status}")]
    Failed { program: String, status: i32 },
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl ExecError {
    /// The process status this failure maps to: a failed external step keeps
    /// its own status, anything else is an engine error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExecError::Failed { status, .. } => *status,
            ExecError::Spawn { .. } | ExecError::Io { .. } => 3,
        }
    }
}

/// Everything the renderer needs to produce one output file.
#[derive(Debug, Clone, Copy)]
pub struct RenderJob<'a> {
    /// Rule-scoped variables.
    pub variables: &'a Variables,
    /// Per-document variables, for single-document rules.
    pub local: Option<LocalVariables<'a>>,
    /// Render the template's listing block over all `sources`.
    pub listing: bool,
    pub template: &'a FileHandle,
    pub output: &'a FileHandle,
    pub sources: &'a [FileHandle],
}

/// Trait for executors.
///
/// Every call blocks until the step has finished. A returned error aborts the
/// calling rule.
pub trait Executor {
    /// Regenerate `job.output` from its template and sources.
    fn render(&self, ctx: &BuildContext, job: &RenderJob<'_>) -> Result<(), ExecError>;

    /// Copy a static file into the output directory.
    fn copy(&self, source: &FileHandle, output: &FileHandle) -> Result<(), ExecError>;

    /// Delete a built file. `output_dir` bounds any cleanup of parent
    /// directories.
    fn remove(&self, output_dir: &Path, output: &FileHandle) -> Result<(), ExecError>;

    /// True when `dir` has no entries, or does not exist.
    fn is_empty_dir(&self, dir: &Path) -> bool;
}
