use std::path::{Path, PathBuf};
use std::process::Command;

use agent_host::{HostInvocation, HostOutput};
use anyhow::Context as _;
use mastermind_core::analysis::{self, AnalysisOptions};
use mastermind_core::options::GlobalOptions;
use mastermind_core::project::{allocate_output_dir, project_name};
use mastermind_core::prompt;
use mastermind_core::registry::AgentSpec;
use mastermind_core::schema::AgentArgs;

use crate::dispatch::Context;
use crate::output::print_json;
use crate::{post, RUN_JOB};

/// Agent options that steer the dispatcher and are not sent to the host.
const LOCAL_OPTIONS: &[&str] = &["background"];

/// Parse, validate, invoke the host once, then post-process.
///
/// Every check that can fail on user input runs before the first side
/// effect (output directory, host process).
pub fn run(
    ctx: &Context,
    spec: &'static AgentSpec,
    globals: &GlobalOptions,
    args: &[String],
) -> anyhow::Result<()> {
    let parsed = spec.schema.parse(spec.name, args)?;
    ensure_host(&ctx.host_binary)?;

    let output_dir = if spec.is_generation() {
        let name = project_name(globals.project_name.as_deref(), parsed.description.as_deref());
        let dir = allocate_output_dir(&globals.output_dir, &name)?;
        tracing::info!(dir = %dir.display(), "output directory");
        Some(dir)
    } else {
        None
    };

    let inv = build_invocation(ctx, spec, globals, &parsed, output_dir.as_deref());
    if globals.verbose {
        eprintln!("→ {}", inv.display());
    }

    if parsed.flag("background") {
        return launch_background(ctx, spec, inv);
    }

    let out = ctx
        .runner
        .run(&inv)
        .with_context(|| format!("agent '{}' failed", spec.name))?;

    print_output(ctx, spec, &out, output_dir.as_deref())?;

    if let Some(dir) = output_dir {
        post_process(ctx, globals, &parsed, &dir);
    }
    Ok(())
}

/// Absence of the host binary is a hard failure, checked before any side
/// effect.
fn ensure_host(binary: &str) -> anyhow::Result<PathBuf> {
    which::which(binary).map_err(|_| {
        anyhow::anyhow!(
            "host binary '{binary}' not found on PATH\n\
             Install the agent host (e.g. `npm install -g @qodo/command`) \
             or point --host / MASTERMIND_HOST at it"
        )
    })
}

pub(crate) fn build_invocation(
    ctx: &Context,
    spec: &AgentSpec,
    globals: &GlobalOptions,
    parsed: &AgentArgs,
    output_dir: Option<&Path>,
) -> HostInvocation {
    let mut inv = HostInvocation::new(&ctx.host_binary, spec.host_subcommand)
        .args(ctx.config.host.extra_args.iter().cloned())
        .timeout_secs(ctx.config.host.timeout_seconds);

    if let Some(prompt) = prompt::assemble(spec, parsed.description.as_deref()) {
        inv = inv.set("prompt", prompt);
    }
    inv = inv.set("language", &globals.language);
    if let Some(framework) = &globals.framework {
        inv = inv.set("framework", framework);
    }
    if let Some(dir) = output_dir {
        inv = inv.set("output_dir", dir.display().to_string());
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        inv = inv.set("project_name", name);
    } else if let Some(name) = &globals.project_name {
        inv = inv.set("project_name", name);
    }

    for (key, value) in &parsed.settings {
        if !LOCAL_OPTIONS.contains(&key.as_str()) {
            inv = inv.set(key, value);
        }
    }

    if spec.is_massive() {
        if let Some(description) = parsed.description.as_deref() {
            let opts = AnalysisOptions {
                language: &globals.language,
                framework: globals.framework.as_deref(),
                max_chunk_size: parsed
                    .integer("max-chunk-size")
                    .and_then(|n| u64::try_from(n).ok())
                    .unwrap_or(analysis::DEFAULT_MAX_CHUNK_SIZE),
                strategy: parsed
                    .text("chunk-strategy")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_default(),
            };
            let plan = analysis::analyze(description, &opts);
            tracing::info!(
                project_type = plan.project_type.as_str(),
                complexity = plan.complexity,
                estimated_lines = plan.estimated_lines,
                strategy = %plan.chunk_strategy,
                chunks = plan.chunks.len(),
                duration = %plan.estimated_duration,
                "project analysis"
            );
            for (key, value) in plan.settings() {
                inv = inv.set(key, value);
            }
        }
    }

    inv
}

fn print_output(
    ctx: &Context,
    spec: &AgentSpec,
    out: &HostOutput,
    output_dir: Option<&Path>,
) -> anyhow::Result<()> {
    match (&out.json, ctx.json) {
        (Some(value), _) => print_json(value)?,
        (None, true) => print_json(&serde_json::json!({
            "agent": spec.name,
            "output_dir": output_dir.map(|d| d.display().to_string()),
            "stdout": out.stdout,
            "duration_ms": out.duration_ms,
        }))?,
        (None, false) => print!("{}", out.stdout),
    }
    if let (Some(dir), false) = (output_dir, ctx.json) {
        println!("✓ {} finished: {}", spec.name, dir.display());
    }
    Ok(())
}

fn post_process(ctx: &Context, globals: &GlobalOptions, parsed: &AgentArgs, dir: &Path) {
    let timeout = ctx.config.host.timeout_seconds;
    if globals.create_git_repo {
        post::init_git_repo(dir, &ctx.config.post.commit_message, timeout);
    }
    if ctx.config.post.run_tests && !parsed.flag("no-tests") {
        post::run_tests(dir, timeout);
    }
}

fn launch_background(ctx: &Context, spec: &AgentSpec, inv: HostInvocation) -> anyhow::Result<()> {
    let exe = std::env::current_exe().context("cannot locate the mastermind executable")?;
    let mut worker = Command::new(exe);
    worker.arg(RUN_JOB);

    let handle = ctx
        .jobs
        .launch(spec.name, inv, worker)
        .context("failed to start background job")?;
    let log = ctx.jobs.log_path(&handle.id);

    if ctx.json {
        print_json(&serde_json::json!({
            "job": handle.id,
            "agent": spec.name,
            "log": log.display().to_string(),
        }))
    } else {
        println!("Started background job {} ({})", handle.id, spec.name);
        println!("  log: {}", log.display());
        println!("  check progress with: mastermind --jobs");
        Ok(())
    }
}
