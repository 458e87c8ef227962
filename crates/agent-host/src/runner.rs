use std::time::Instant;

use serde::Serialize;

use crate::invocation::HostInvocation;
use crate::process::HostProcess;
use crate::{HostError, Result};

// ─── HostOutput ───────────────────────────────────────────────────────────

/// The result of a host call that exited successfully.
#[derive(Debug, Clone, Serialize)]
pub struct HostOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// Structured result, when stdout is JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<serde_json::Value>,
    pub duration_ms: u64,
}

impl HostOutput {
    pub fn from_stdout(stdout: String) -> Self {
        let json = parse_json(&stdout);
        Self {
            exit_code: 0,
            stdout,
            stderr: String::new(),
            json,
            duration_ms: 0,
        }
    }
}

/// Whole stdout as JSON, else the last non-empty line.
///
/// Hosts commonly print progress text and finish with a single JSON line.
pub fn parse_json(stdout: &str) -> Option<serde_json::Value> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(v) = serde_json::from_str(trimmed) {
        return Some(v);
    }
    trimmed
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .and_then(|l| serde_json::from_str(l).ok())
}

// ─── Public API ───────────────────────────────────────────────────────────

/// Run one host call to completion.
///
/// Fails with [`HostError::Spawn`] if the binary cannot be started,
/// [`HostError::Timeout`] if the invocation's limit expires, and
/// [`HostError::Exit`] on a non-zero exit.
pub async fn run(inv: &HostInvocation) -> Result<HostOutput> {
    let started = Instant::now();
    tracing::info!(subcommand = %inv.subcommand, "invoking host");
    tracing::debug!(command = %inv.display(), "host argv");

    let process = HostProcess::spawn(inv)?;
    tracing::debug!(pid = ?process.id(), "host started");
    let done = process.finish(inv.timeout()).await?;

    let duration_ms = started.elapsed().as_millis() as u64;
    tracing::info!(duration_ms, "host finished");

    Ok(HostOutput {
        exit_code: done.status.code().unwrap_or(0),
        json: parse_json(&done.stdout),
        stdout: done.stdout,
        stderr: done.stderr,
        duration_ms,
    })
}

/// Blocking wrapper around [`run`] for synchronous callers.
///
/// Reuses the ambient runtime when called from inside one.
pub fn run_blocking(inv: &HostInvocation) -> Result<HostOutput> {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => tokio::task::block_in_place(|| handle.block_on(run(inv))),
        Err(_) => {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(HostError::Io)?;
            rt.block_on(run(inv))
        }
    }
}

// ─── HostRunner ───────────────────────────────────────────────────────────

/// The seam between command handling and process execution.
pub trait HostRunner {
    fn run(&self, inv: &HostInvocation) -> Result<HostOutput>;
}

/// Runs the host as a real child process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl HostRunner for ProcessRunner {
    fn run(&self, inv: &HostInvocation) -> Result<HostOutput> {
        run_blocking(inv)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
