use clap::{ArgAction, CommandFactory, FromArgMatches, Parser};
use sitemake::config::{self, DEFAULT_SETTINGS_FILE};
use sitemake::context::{BuildContext, ContextOptions};
use sitemake::dispatch::dispatch;
use sitemake::exec::NativeExecutor;
use sitemake::output;
use sitemake::rules::{Engine, RuleError, RuleTable};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sitemake")]
#[command(about = "Incremental build tool for blogc-powered static blogs")]
#[command(long_about = "\
Incremental build tool for blogc-powered static blogs

Reads the project file, works out which output files are older than their
sources, templates or the project file itself, and regenerates only those by
running the renderer.

Project layout (defaults):

  sitemake.toml                   # Posts, pages, tags, copy list, settings
  content/
  ├── post/
  │   └── first-post.txt          # One file per entry in `posts`
  ├── about.txt                   # One file per entry in `pages`
  └── index.txt                   # A page named \"index\" becomes the site root
  templates/
  └── main.tmpl                   # Main template (atom feeds have a built-in one)
  _build/                         # Output directory

Rules are given as NAME or NAME:KEY=VALUE,KEY=VALUE. A NAME matches every rule
it is a prefix of. With no rules, `all` is run.

Run 'sitemake --gen-config' to print a documented sitemake.toml.")]
#[command(version = env!("SITEMAKE_VERSION"), disable_version_flag = true)]
struct Cli {
    /// Project file
    #[arg(short = 'f', long = "file", default_value = DEFAULT_SETTINGS_FILE)]
    file: PathBuf,

    /// Output directory (overrides `output_dir` from the project file)
    #[arg(short, long, env = "SITEMAKE_OUTPUT_DIR")]
    output: Option<String>,

    /// Show renderer command lines and other details
    #[arg(short = 'V', long)]
    verbose: bool,

    /// Renderer program
    #[arg(long, env = "SITEMAKE_RENDERER", default_value = "blogc")]
    renderer: String,

    /// Print a stock sitemake.toml with all options documented
    #[arg(long)]
    gen_config: bool,

    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    _version: Option<bool>,

    /// Rules to run
    #[arg(value_name = "RULE", default_value = "all")]
    rules: Vec<String>,
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn main() -> ExitCode {
    let table = RuleTable::standard();
    let matches = Cli::command()
        .after_help(output::rule_help(&table))
        .get_matches();
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.gen_config {
        print!("{}", config::stock_settings_toml());
        return ExitCode::SUCCESS;
    }

    let options = ContextOptions {
        settings_file: cli.file,
        output_dir: cli.output,
        verbose: cli.verbose,
    };
    let ctx = match BuildContext::new(&options) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("{e}");
            return exit_code(e.exit_code());
        }
    };

    let executor = NativeExecutor::new(cli.renderer);
    let engine = Engine::new(&table, &executor);
    match dispatch(&engine, &ctx, &cli.rules) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Unknown rules were already reported as they were found.
            if !matches!(e, RuleError::NotFound(_)) {
                error!("{e}");
            }
            exit_code(e.exit_code())
        }
    }
}
