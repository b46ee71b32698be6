//! Trigger loops: rebuild on file changes, optionally behind a preview
//! server.
//!
//! Both `watch` and `runserver` do one full build, then sleep on a debounced
//! filesystem watcher. Each batch of relevant events reloads the context and
//! runs one more full build. Passes never overlap: events that arrive while a
//! pass is running wait in the channel and are handled as the next batch.

use crate::context::BuildContext;
use crate::file::FileHandle;
use crate::rules::{Engine, RuleArgs, RuleError};
use notify::RecursiveMode;
use notify_debouncer_mini::{DebouncedEventKind, new_debouncer};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::process::{Child, Command};
use std::sync::mpsc::channel;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Quiet period before a burst of events is handled.
pub const DEBOUNCE: Duration = Duration::from_millis(250);

/// Preview server spawned by `runserver`.
pub const RUNSERVER_PROGRAM: &str = "blogc-runserver";

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("failed to initialize file watcher: {0}")]
    WatcherInit(notify::Error),
    #[error("watch channel closed: {0}")]
    Channel(String),
    #[error("failed to start {program}: {source}")]
    Server {
        program: String,
        source: std::io::Error,
    },
}

// =============================================================================
// What to watch
// =============================================================================

/// The paths whose changes trigger a rebuild.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct WatchPlan {
    /// Individual inputs: settings file, templates, sources.
    pub files: BTreeSet<PathBuf>,
    /// Directories holding `files`, watched non-recursively.
    pub dirs: BTreeSet<PathBuf>,
    /// Copied directories, watched recursively so new files are noticed.
    pub trees: BTreeSet<PathBuf>,
    /// Never relevant, even inside a watched tree.
    pub output_dir: PathBuf,
}

impl WatchPlan {
    pub fn for_context(ctx: &BuildContext) -> Self {
        let files: BTreeSet<PathBuf> = ctx
            .watched_files()
            .into_iter()
            .map(|f: &FileHandle| lexical(&f.path))
            .collect();
        let dirs = files
            .iter()
            .filter_map(|f| f.parent().map(Path::to_path_buf))
            .collect();
        let trees = ctx
            .settings
            .copy
            .iter()
            .map(|entry| lexical(&ctx.root_dir.join(entry)))
            .filter(|path| path.is_dir())
            .collect();
        Self {
            files,
            dirs,
            trees,
            output_dir: lexical(&ctx.output_dir),
        }
    }

    pub fn is_relevant(&self, path: &Path) -> bool {
        let path = lexical(path);
        if path.starts_with(&self.output_dir) {
            return false;
        }
        self.files.contains(&path) || self.trees.iter().any(|t| path.starts_with(t))
    }

    fn watches(&self) -> impl Iterator<Item = (&PathBuf, RecursiveMode)> {
        let dirs = self.dirs.iter().map(|d| (d, RecursiveMode::NonRecursive));
        let trees = self.trees.iter().map(|t| (t, RecursiveMode::Recursive));
        dirs.chain(trees)
    }
}

/// Resolve `.` and `..` components without touching the filesystem, so
/// paths built from settings compare equal to the ones the watcher reports.
fn lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

// =============================================================================
// Loop
// =============================================================================

fn build_pass<F>(ctx: &BuildContext, pass: &mut F)
where
    F: FnMut(&BuildContext) -> Result<(), RuleError>,
{
    match pass(ctx) {
        Ok(()) => info!("build complete"),
        Err(e) => error!(error = %e, "build failed"),
    }
}

/// Watch the inputs of `ctx` and call `pass` after every relevant change.
///
/// Blocks until the watcher shuts down. A failing pass, or a context that
/// fails to reload, is logged and watching continues.
pub fn watch_and_rebuild<F>(ctx: &BuildContext, mut pass: F) -> Result<(), WatchError>
where
    F: FnMut(&BuildContext) -> Result<(), RuleError>,
{
    let (tx, rx) = channel();
    let mut debouncer = new_debouncer(DEBOUNCE, tx).map_err(WatchError::WatcherInit)?;

    let mut plan = WatchPlan::for_context(ctx);
    let mut watching = BTreeSet::new();
    let mut register = |plan: &WatchPlan| {
        for (path, mode) in plan.watches() {
            if watching.contains(path) {
                continue;
            }
            match debouncer.watcher().watch(path, mode) {
                Ok(()) => {
                    debug!(path = %path.display(), "watching");
                    watching.insert(path.clone());
                }
                Err(e) => warn!(path = %path.display(), error = %e, "cannot watch"),
            }
        }
    };
    register(&plan);
    info!(dir = %ctx.root_dir.display(), "watching for changes");

    let mut reloaded: Option<BuildContext> = None;
    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let changed: Vec<_> = events
                    .iter()
                    .filter(|e| matches!(e.kind, DebouncedEventKind::Any))
                    .filter(|e| plan.is_relevant(&e.path))
                    .collect();
                if changed.is_empty() {
                    continue;
                }
                for event in &changed {
                    info!(path = %event.path.display(), "changed");
                }

                let current = reloaded.as_ref().unwrap_or(ctx);
                match current.reload() {
                    Ok(fresh) => {
                        plan = WatchPlan::for_context(&fresh);
                        register(&plan);
                        build_pass(&fresh, &mut pass);
                        reloaded = Some(fresh);
                    }
                    Err(e) => error!(error = %e, "failed to reload project"),
                }
            }
            Ok(Err(e)) => warn!(error = %e, "watch error, continuing"),
            Err(e) => return Err(WatchError::Channel(e.to_string())),
        }
    }
}

// =============================================================================
// Rules
// =============================================================================

pub fn watch_exec(
    engine: &Engine<'_>,
    ctx: &BuildContext,
    _outputs: &[FileHandle],
    _args: &RuleArgs,
) -> Result<(), RuleError> {
    let mut pass = |ctx: &BuildContext| engine.run_all(ctx);
    build_pass(ctx, &mut pass);
    watch_and_rebuild(ctx, pass)?;
    Ok(())
}

/// Build the preview server command line from the rule arguments.
pub fn server_command(ctx: &BuildContext, args: &RuleArgs) -> Command {
    let arg = |key: &str, default: &'static str| {
        args.get(key).map_or(default, String::as_str).to_string()
    };
    let mut cmd = Command::new(RUNSERVER_PROGRAM);
    cmd.arg("-t")
        .arg(arg("host", "127.0.0.1"))
        .arg("-p")
        .arg(arg("port", "8080"))
        .arg("-m")
        .arg(arg("threads", "20"))
        .arg(&ctx.output_dir);
    cmd
}

/// Kills the preview server when dropped.
struct ServerGuard(Child);

impl Drop for ServerGuard {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

pub fn runserver_exec(
    engine: &Engine<'_>,
    ctx: &BuildContext,
    _outputs: &[FileHandle],
    args: &RuleArgs,
) -> Result<(), RuleError> {
    let mut pass = |ctx: &BuildContext| engine.run_all(ctx);
    build_pass(ctx, &mut pass);

    let mut cmd = server_command(ctx, args);
    debug!(command = ?cmd, "starting preview server");
    let child = cmd.spawn().map_err(|source| WatchError::Server {
        program: RUNSERVER_PROGRAM.to_string(),
        source,
    })?;
    let _server = ServerGuard(child);
    info!(
        host = args.get("host").map_or("127.0.0.1", String::as_str),
        port = args.get("port").map_or("8080", String::as_str),
        "preview server running"
    );

    watch_and_rebuild(ctx, pass)?;
    Ok(())
}
