//! The rule catalogue and the machinery to run a rule.
//!
//! A [`Rule`] pairs an optional output enumerator with an executor function.
//! Enumerators are pure functions of the [`BuildContext`]: they compose the
//! expected output paths and stat them, nothing more. Executors walk those
//! outputs, ask [`needs_rebuild`](crate::rebuild::needs_rebuild) about each
//! one and hand the stale ones to the [`Executor`].
//!
//! The [`RuleTable`] is built once at startup and never changes. Its order is
//! significant: `all` runs the file-generating rules in table order and
//! `clean` removes their outputs in that same order.
//!
//! | Rule | Generates files | Module |
//! |------|-----------------|--------|
//! | `all` | no | here |
//! | `index`, `atom`, `atom_tags`, `pagination`, `tags` | yes | [`listing`] |
//! | `posts`, `pages` | yes | [`documents`] |
//! | `copy` | yes | [`files`] |
//! | `clean` | no | [`files`] |
//! | `runserver`, `watch` | no | [`crate::trigger`] |

pub mod documents;
pub mod files;
pub mod listing;

use crate::context::BuildContext;
use crate::exec::{ExecError, Executor};
use crate::file::FileHandle;
use crate::trigger::{self, WatchError};
use std::collections::BTreeMap;
use thiserror::Error;

/// Arguments given to a rule on the command line (`name:key=value,...`).
pub type RuleArgs = BTreeMap<String, String>;

pub type OutputFn = fn(&BuildContext) -> Vec<FileHandle>;
pub type ExecFn =
    fn(&Engine<'_>, &BuildContext, &[FileHandle], &RuleArgs) -> Result<(), RuleError>;

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("rule not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error(transparent)]
    Watch(#[from] WatchError),
}

impl RuleError {
    pub fn exit_code(&self) -> i32 {
        match self {
            RuleError::Exec(e) => e.exit_code(),
            RuleError::NotFound(_) | RuleError::Watch(_) => 3,
        }
    }
}

pub struct Rule {
    pub name: &'static str,
    pub help: &'static str,
    /// `None` for meta-rules and for `clean`, which enumerates through the
    /// engine's table.
    pub outputs: Option<OutputFn>,
    pub exec: ExecFn,
    /// Rules that produce files take part in `all` and `clean`.
    pub generates_files: bool,
}

impl Rule {
    /// The outputs this rule would produce right now.
    pub fn outputs(&self, ctx: &BuildContext) -> Vec<FileHandle> {
        self.outputs.map(|f| f(ctx)).unwrap_or_default()
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("generates_files", &self.generates_files)
            .finish()
    }
}

/// Ordered, immutable catalogue of rules.
#[derive(Debug)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// The rules the `sitemake` binary knows about.
    pub fn standard() -> Self {
        Self::new(vec![
            Rule {
                name: "all",
                help: "run all build rules",
                outputs: None,
                exec: all_exec,
                generates_files: false,
            },
            Rule {
                name: "index",
                help: "build website index from posts",
                outputs: Some(listing::index_outputs),
                exec: listing::index_exec,
                generates_files: true,
            },
            Rule {
                name: "atom",
                help: "build main atom feed from posts",
                outputs: Some(listing::atom_outputs),
                exec: listing::atom_exec,
                generates_files: true,
            },
            Rule {
                name: "atom_tags",
                help: "build atom feeds for each tag from posts",
                outputs: Some(listing::atom_tags_outputs),
                exec: listing::atom_tags_exec,
                generates_files: true,
            },
            Rule {
                name: "pagination",
                help: "build pagination pages from posts",
                outputs: Some(listing::pagination_outputs),
                exec: listing::pagination_exec,
                generates_files: true,
            },
            Rule {
                name: "posts",
                help: "build individual pages for each post",
                outputs: Some(documents::posts_outputs),
                exec: documents::posts_exec,
                generates_files: true,
            },
            Rule {
                name: "tags",
                help: "build post listings for each tag from posts",
                outputs: Some(listing::tags_outputs),
                exec: listing::tags_exec,
                generates_files: true,
            },
            Rule {
                name: "pages",
                help: "build individual pages for each page",
                outputs: Some(documents::pages_outputs),
                exec: documents::pages_exec,
                generates_files: true,
            },
            Rule {
                name: "copy",
                help: "copy static files from source directory to output directory",
                outputs: Some(files::copy_outputs),
                exec: files::copy_exec,
                generates_files: true,
            },
            Rule {
                name: "clean",
                help: "clean built files and empty directories in output directory",
                outputs: None,
                exec: files::clean_exec,
                generates_files: false,
            },
            Rule {
                name: "runserver",
                help: "run blogc-runserver pointing to output directory, if available,\n\
                       \x20                 rebuilding as needed\n\
                       \x20                 arguments: host (127.0.0.1), port (8080) and threads (20)",
                outputs: None,
                exec: trigger::runserver_exec,
                generates_files: false,
            },
            Rule {
                name: "watch",
                help: "watch for changes in the source files, rebuilding as needed",
                outputs: None,
                exec: trigger::watch_exec,
                generates_files: false,
            },
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Every rule whose name starts with `prefix`, in table order.
    pub fn matching<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a Rule> {
        self.rules.iter().filter(move |r| r.name.starts_with(prefix))
    }

    /// The union of every file-generating rule's current outputs, in table
    /// order.
    pub fn built_files(&self, ctx: &BuildContext) -> Vec<FileHandle> {
        self.rules
            .iter()
            .filter(|r| r.generates_files)
            .flat_map(|r| r.outputs(ctx))
            .collect()
    }
}

/// What a running rule can reach besides the context: the table it came
/// from and the executor doing the work.
#[derive(Clone, Copy)]
pub struct Engine<'a> {
    pub table: &'a RuleTable,
    pub executor: &'a dyn Executor,
}

impl<'a> Engine<'a> {
    pub fn new(table: &'a RuleTable, executor: &'a dyn Executor) -> Self {
        Self { table, executor }
    }

    /// Enumerate a rule's outputs and run it over them.
    pub fn execute(
        &self,
        ctx: &BuildContext,
        rule: &Rule,
        args: &RuleArgs,
    ) -> Result<(), RuleError> {
        let outputs = rule.outputs(ctx);
        (rule.exec)(self, ctx, &outputs, args)
    }

    /// Run every file-generating rule in table order, stopping at the first
    /// failure.
    pub fn run_all(&self, ctx: &BuildContext) -> Result<(), RuleError> {
        let no_args = RuleArgs::new();
        for rule in self.table.iter().filter(|r| r.generates_files) {
            self.execute(ctx, rule, &no_args)?;
        }
        Ok(())
    }
}

/// Path separator placed after a configurable prefix; empty prefixes get
/// none.
pub(crate) fn separator(prefix: &str) -> &'static str {
    if prefix.is_empty() { "" } else { "/" }
}

fn all_exec(
    engine: &Engine<'_>,
    ctx: &BuildContext,
    _outputs: &[FileHandle],
    _args: &RuleArgs,
) -> Result<(), RuleError> {
    engine.run_all(ctx)
}
