use std::time::Duration;

use agent_host::{JobState, JobStatus};

use crate::dispatch::Context;
use crate::output::{print_json, print_table};

const WAIT_POLL: Duration = Duration::from_millis(250);

/// `--jobs [<id> [--cancel | --wait]]`
pub fn run(ctx: &Context, args: &[String]) -> anyhow::Result<()> {
    match args {
        [] => list(ctx),
        [id] => show(ctx, &ctx.jobs.handle(id)?.status()?),
        [id, action] if action == "--cancel" => {
            let status = ctx.jobs.handle(id)?.cancel()?;
            show(ctx, &status)
        }
        [id, action] if action == "--wait" => {
            let status = ctx.jobs.handle(id)?.wait(WAIT_POLL, None)?;
            show(ctx, &status)?;
            if status.state != JobState::Succeeded {
                anyhow::bail!("job {id} {}", status.state);
            }
            Ok(())
        }
        _ => anyhow::bail!("usage: mastermind --jobs [<id> [--cancel | --wait]]"),
    }
}

fn show(ctx: &Context, status: &JobStatus) -> anyhow::Result<()> {
    if ctx.json {
        return print_json(status);
    }
    println!("{}  {}  {}", status.id, status.agent, status.state);
    if let Some(code) = status.exit_code {
        println!("  exit code: {code}");
    }
    if let Some(message) = &status.message {
        println!("  {message}");
    }
    println!("  log: {}", ctx.jobs.log_path(&status.id).display());
    Ok(())
}

/// Every background job recorded in the jobs directory.
fn list(ctx: &Context) -> anyhow::Result<()> {
    let jobs = ctx.jobs.list()?;

    if ctx.json {
        return print_json(&jobs);
    }

    if jobs.is_empty() {
        println!("No background jobs in {}.", ctx.jobs.dir().display());
        return Ok(());
    }

    let rows = jobs
        .iter()
        .map(|j| {
            vec![
                j.id.clone(),
                j.agent.clone(),
                j.state.to_string(),
                j.exit_code.map(|c| c.to_string()).unwrap_or_default(),
                j.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                j.message.clone().unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["ID", "AGENT", "STATE", "EXIT", "UPDATED", "MESSAGE"], rows);
    Ok(())
}
