//! Native executor: spawns the renderer and touches the filesystem.
//!
//! The renderer is invoked as
//!
//! ```text
//! <renderer> [-D KEY=VALUE ...] [-l] -t <template> -o <output> <sources ...>
//! ```
//!
//! with `-D` definitions for the project's `[global]` table first, then the
//! rule-scoped variables, then the per-document ones. A later definition of
//! the same key wins inside the renderer.

use super::backend::{ExecError, Executor, RenderJob};
use crate::context::BuildContext;
use crate::file::FileHandle;
use std::fs;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

pub struct NativeExecutor {
    renderer: String,
}

impl NativeExecutor {
    pub fn new(renderer: impl Into<String>) -> Self {
        Self {
            renderer: renderer.into(),
        }
    }

    pub fn renderer(&self) -> &str {
        &self.renderer
    }

    /// Build the renderer command line for `job` without running it.
    pub fn render_command(&self, ctx: &BuildContext, job: &RenderJob<'_>) -> Command {
        let mut cmd = Command::new(&self.renderer);

        let mut define = |key: &str, value: &str| {
            cmd.arg("-D").arg(format!("{key}={value}"));
        };
        for (key, value) in &ctx.settings.global {
            define(key, value);
        }
        for (key, value) in job.variables.iter() {
            define(key, value);
        }
        if let Some(local) = job.local {
            for (key, value) in local.iter() {
                define(key, value);
            }
        }
        if job.listing {
            cmd.arg("-l");
        }
        cmd.arg("-t").arg(&job.template.path);
        cmd.arg("-o").arg(&job.output.path);
        cmd.args(job.sources.iter().map(|s| &s.path));

        match ctx.settings.get("locale") {
            "" => {}
            locale => {
                cmd.env("LC_ALL", locale);
            }
        }
        cmd
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ExecError + '_ {
    move |source| ExecError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl Executor for NativeExecutor {
    fn render(&self, ctx: &BuildContext, job: &RenderJob<'_>) -> Result<(), ExecError> {
        info!("GEN {}", job.output.short_path);

        if let Some(parent) = job.output.path.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }

        let mut cmd = self.render_command(ctx, job);
        if ctx.verbose {
            info!(command = ?cmd, "running renderer");
        } else {
            debug!(command = ?cmd, "running renderer");
        }

        let status = cmd.status().map_err(|source| ExecError::Spawn {
            program: self.renderer.clone(),
            source,
        })?;
        if status.success() {
            Ok(())
        } else {
            Err(ExecError::Failed {
                program: self.renderer.clone(),
                // Killed by a signal: report a generic failure.
                status: status.code().unwrap_or(1),
            })
        }
    }

    fn copy(&self, source: &FileHandle, output: &FileHandle) -> Result<(), ExecError> {
        info!("COPY {}", output.short_path);

        if let Some(parent) = output.path.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        fs::copy(&source.path, &output.path).map_err(io_error(&source.path))?;
        Ok(())
    }

    fn remove(&self, output_dir: &Path, output: &FileHandle) -> Result<(), ExecError> {
        info!("RM {}", output.short_path);

        fs::remove_file(&output.path).map_err(io_error(&output.path))?;

        // Prune directories the removal left empty, stopping at the root.
        let mut dir = output.path.parent();
        while let Some(d) = dir {
            if d == output_dir || !d.starts_with(output_dir) || fs::remove_dir(d).is_err() {
                break;
            }
            debug!(dir = %d.display(), "removed empty directory");
            dir = d.parent();
        }
        Ok(())
    }

    fn is_empty_dir(&self, dir: &Path) -> bool {
        match fs::read_dir(dir) {
            Ok(mut entries) => entries.next().is_none(),
            Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use crate::variables::{LocalVariables, Variables};
    use std::ffi::OsStr;

    fn args(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    // =========================================================================
    // Render command line
    // =========================================================================

    #[test]
    fn render_command_orders_definitions_globals_first() {
        let project = Project::new().posts(&["hello"]).write();
        let ctx = project.context();
        let vars = Variables::for_rule("posts", "post");
        let output = ctx.output_handle("_build/post/hello/index.html");
        let job = RenderJob {
            variables: &vars,
            local: Some(LocalVariables::for_document(&ctx.posts[0])),
            listing: false,
            template: &ctx.main_template,
            output: &output,
            sources: &ctx.posts[..1],
        };

        let cmd = NativeExecutor::new("blogc").render_command(&ctx, &job);
        let args = args(&cmd);
        assert_eq!(cmd.get_program(), OsStr::new("blogc"));

        let defines: Vec<&str> = args
            .windows(2)
            .filter(|w| w[0] == "-D")
            .map(|w| w[1].as_str())
            .collect();
        assert_eq!(defines.first(), Some(&"AUTHOR_EMAIL=author@example.com"));
        let rule = defines.iter().position(|d| *d == "MAKE_RULE=posts").unwrap();
        let title = defines.iter().position(|d| d.starts_with("SITE_TITLE=")).unwrap();
        assert!(title < rule);
        assert_eq!(defines.last(), Some(&"MAKE_SLUG=hello"));

        assert!(!args.contains(&"-l".to_string()));
        let tail = &args[args.len() - 5..];
        assert_eq!(tail[0], "-t");
        assert_eq!(tail[1], ctx.main_template.path.to_string_lossy());
        assert_eq!(tail[2], "-o");
        assert_eq!(tail[3], output.path.to_string_lossy());
        assert_eq!(tail[4], ctx.posts[0].path.to_string_lossy());
    }

    #[test]
    fn render_command_listing_flag_and_locale() {
        let project = Project::new()
            .posts(&["a", "b"])
            .setting("locale", "en_US.utf8")
            .write();
        let ctx = project.context();
        let vars = Variables::new();
        let output = ctx.output_handle("_build/index.html");
        let job = RenderJob {
            variables: &vars,
            local: None,
            listing: true,
            template: &ctx.main_template,
            output: &output,
            sources: &ctx.posts,
        };

        let cmd = NativeExecutor::new("blogc").render_command(&ctx, &job);
        assert!(args(&cmd).contains(&"-l".to_string()));
        assert!(args(&cmd).ends_with(&[
            ctx.posts[0].path.to_string_lossy().into_owned(),
            ctx.posts[1].path.to_string_lossy().into_owned(),
        ]));
        let env: Vec<_> = cmd.get_envs().collect();
        assert_eq!(env, vec![(OsStr::new("LC_ALL"), Some(OsStr::new("en_US.utf8")))]);
    }

    #[test]
    fn render_spawn_failure_is_engine_error() {
        let project = Project::new().write();
        let ctx = project.context();
        let vars = Variables::new();
        let output = ctx.output_handle("_build/index.html");
        let job = RenderJob {
            variables: &vars,
            local: None,
            listing: true,
            template: &ctx.main_template,
            output: &output,
            sources: &[],
        };

        let exec = NativeExecutor::new("/nonexistent/sitemake-renderer");
        let err = exec.render(&ctx, &job).unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
        assert_eq!(err.exit_code(), 3);
    }

    // =========================================================================
    // Filesystem operations
    // =========================================================================

    #[test]
    fn copy_creates_parent_directories() {
        let project = Project::new().file("static/css/site.css", "body{}").write();
        let ctx = project.context();
        let source = ctx.output_handle("static/css/site.css");
        let output = ctx.output_handle("_build/static/css/site.css");

        NativeExecutor::new("blogc").copy(&source, &output).unwrap();

        let copied = fs::read_to_string(project.root().join("_build/static/css/site.css")).unwrap();
        assert_eq!(copied, "body{}");
    }

    #[test]
    fn copy_missing_source_fails() {
        let project = Project::new().write();
        let ctx = project.context();
        let source = ctx.output_handle("static/missing.css");
        let output = ctx.output_handle("_build/static/missing.css");

        let err = NativeExecutor::new("blogc").copy(&source, &output).unwrap_err();
        assert!(matches!(err, ExecError::Io { .. }));
    }

    #[test]
    fn remove_prunes_empty_parents_but_keeps_output_root() {
        let project = Project::new()
            .file("_build/post/hello/index.html", "x")
            .file("_build/robots.txt", "r")
            .write();
        let ctx = project.context();
        let exec = NativeExecutor::new("blogc");

        exec.remove(&ctx.output_dir, &ctx.output_handle("_build/post/hello/index.html"))
            .unwrap();
        assert!(!ctx.output_dir.join("post").exists());
        assert!(ctx.output_dir.is_dir());
        assert!(!exec.is_empty_dir(&ctx.output_dir));

        exec.remove(&ctx.output_dir, &ctx.output_handle("_build/robots.txt"))
            .unwrap();
        assert!(ctx.output_dir.is_dir());
        assert!(exec.is_empty_dir(&ctx.output_dir));
    }

    #[test]
    fn missing_directory_counts_as_empty() {
        let project = Project::new().write();
        let exec = NativeExecutor::new("blogc");
        assert!(exec.is_empty_dir(&project.root().join("_build")));
    }
}
