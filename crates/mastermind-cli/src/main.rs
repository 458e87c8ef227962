mod cmd;
mod dispatch;
mod output;
mod post;

use std::path::{Path, PathBuf};

use agent_host::{JobStore, ProcessRunner};
use anyhow::Context as _;
use clap::Parser;
use mastermind_core::config::{Config, WarnLevel};
use mastermind_core::options::extract_globals;
use mastermind_core::MastermindError;

use crate::dispatch::Context;

/// Hidden entry point a background job's worker process is started with.
pub const RUN_JOB: &str = "__run-job";

#[derive(Parser)]
#[command(
    name = "mastermind",
    about = "Dispatch declarative AI agents to an external agent host",
    disable_help_flag = true,
    disable_version_flag = true,
    trailing_var_arg = true
)]
struct Cli {
    /// Config file (default: ./mastermind.yaml when present)
    #[arg(long, env = "MASTERMIND_CONFIG")]
    config: Option<PathBuf>,

    /// Host binary to invoke (overrides host.binary in the config)
    #[arg(long, env = "MASTERMIND_HOST")]
    host: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Agent name, agent options and global options, in any order
    #[arg(allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("✗ {e:#}");
        if e.downcast_ref::<MastermindError>().is_some_and(MastermindError::is_usage) {
            eprintln!("Run `mastermind --help` for usage.");
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.args.first().map(String::as_str) == Some(RUN_JOB) {
        init_tracing(false);
        return run_job(&cli.args[1..]);
    }

    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    let config = Config::resolve(cli.config.as_deref(), &cwd)?;

    let (globals, remaining) = extract_globals(cli.args, config.global_defaults())?;
    init_tracing(globals.verbose);

    for w in config.validate() {
        match w.level {
            WarnLevel::Error => anyhow::bail!("{}", w.message),
            WarnLevel::Warning => tracing::warn!("config: {}", w.message),
        }
    }

    let ctx = Context {
        host_binary: cli.host.unwrap_or_else(|| config.host.binary.clone()),
        jobs: JobStore::new(resolve_in(&cwd, &config.jobs_dir)),
        config,
        json: cli.json,
        runner: &ProcessRunner,
    };

    dispatch::dispatch(&ctx, &globals, remaining)
}

fn run_job(args: &[String]) -> anyhow::Result<()> {
    let [spec] = args else {
        anyhow::bail!("usage: mastermind {RUN_JOB} <job.json>");
    };
    let status = JobStore::run_job(Path::new(spec), &ProcessRunner)
        .with_context(|| format!("background job {spec} failed"))?;
    if status.state == agent_host::JobState::Failed {
        anyhow::bail!(
            "{}",
            status.message.as_deref().unwrap_or("background job failed")
        );
    }
    Ok(())
}

fn resolve_in(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
