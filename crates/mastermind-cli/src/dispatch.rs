use agent_host::{HostRunner, JobStore};
use mastermind_core::config::Config;
use mastermind_core::options::GlobalOptions;
use mastermind_core::{registry, MastermindError};

use crate::cmd;

/// Everything a handler needs besides its own arguments.
pub struct Context<'a> {
    pub config: Config,
    pub host_binary: String,
    pub jobs: JobStore,
    pub json: bool,
    pub runner: &'a dyn HostRunner,
}

/// Route the arguments left after global extraction.
///
/// The first one names a built-in (`--help`, `--list-agents`, …) or an
/// agent; the rest belong to that agent.
pub fn dispatch(ctx: &Context, globals: &GlobalOptions, args: Vec<String>) -> anyhow::Result<()> {
    let Some((name, rest)) = args.split_first() else {
        eprint!("{}", cmd::list::usage());
        return Err(MastermindError::NoAgent.into());
    };

    match name.as_str() {
        "--help" | "-h" => {
            print!("{}", cmd::list::usage());
            Ok(())
        }
        "--version" => {
            println!("mastermind {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "--list-agents" => cmd::list::run(ctx.json),
        "--jobs" => cmd::jobs::run(ctx, rest),
        "--interactive" => {
            let stdin = std::io::stdin();
            cmd::interactive::run(ctx, globals, stdin.lock())
        }
        agent => run_agent(ctx, globals, agent, rest),
    }
}

/// Look up `name` exactly and run it. Unknown names print the registry as a
/// hint and never reach the host.
pub fn run_agent(
    ctx: &Context,
    globals: &GlobalOptions,
    name: &str,
    args: &[String],
) -> anyhow::Result<()> {
    let Some(spec) = registry::lookup(name) else {
        eprintln!("Available agents:");
        eprint!("{}", cmd::list::agent_lines());
        return Err(MastermindError::UnknownAgent(name.to_string()).into());
    };
    tracing::debug!(agent = spec.name, "dispatching");
    cmd::agent::run(ctx, spec, globals, args)
}
