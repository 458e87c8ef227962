//! Detached host calls.
//!
//! A job is two files under the jobs directory: `<id>.job.json` holds the
//! [`JobSpec`] and `<id>.status.json` holds the latest [`JobStatus`]. The
//! launcher writes the job spec and a `queued` marker, then spawns a worker
//! process in its own process group with stdio sent to `<id>.log`. The
//! worker calls [`JobStore::run_job`], which records `running`, drives the
//! host, and records the final state. Every marker write is atomic.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::invocation::HostInvocation;
use crate::runner::HostRunner;
use crate::{HostError, Result};

const SPEC_SUFFIX: &str = ".job.json";
const STATUS_SUFFIX: &str = ".status.json";
const LOG_SUFFIX: &str = ".log";

// ─── Types ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    pub id: String,
    pub agent: String,
    pub invocation: HostInvocation,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    pub id: String,
    pub agent: String,
    pub state: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobStatus {
    fn transition(mut self, state: JobState) -> Self {
        self.state = state;
        self.updated_at = Utc::now();
        self
    }
}

// ─── JobStore ─────────────────────────────────────────────────────────────

pub struct JobStore {
    dir: PathBuf,
}

impl JobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn log_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}{LOG_SUFFIX}"))
    }

    fn spec_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}{SPEC_SUFFIX}"))
    }

    fn status_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}{STATUS_SUFFIX}"))
    }

    /// Record a new job as `queued` and return the path of its spec file.
    pub fn enqueue(&self, agent: &str, invocation: HostInvocation) -> Result<(JobSpec, PathBuf)> {
        std::fs::create_dir_all(&self.dir)?;
        let id = new_job_id();
        let now = Utc::now();
        let spec = JobSpec {
            id: id.clone(),
            agent: agent.to_string(),
            invocation,
            created_at: now,
        };
        let spec_path = self.spec_path(&id);
        write_json(&spec_path, &spec)?;
        write_json(
            &self.status_path(&id),
            &JobStatus {
                id,
                agent: agent.to_string(),
                state: JobState::Queued,
                pid: None,
                exit_code: None,
                message: None,
                created_at: now,
                updated_at: now,
            },
        )?;
        Ok((spec, spec_path))
    }

    /// Enqueue a job and start `worker` detached to run it.
    ///
    /// The job spec path is appended as the worker's last argument. The worker
    /// is expected to call [`JobStore::run_job`] with it.
    pub fn launch(
        &self,
        agent: &str,
        invocation: HostInvocation,
        mut worker: Command,
    ) -> Result<JobHandle> {
        let (spec, spec_path) = self.enqueue(agent, invocation)?;
        let log = File::create(self.log_path(&spec.id))?;

        worker
            .arg(&spec_path)
            .stdin(Stdio::null())
            .stdout(log.try_clone()?)
            .stderr(log);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            worker.process_group(0);
        }

        let child = match worker.spawn() {
            Ok(child) => child,
            Err(e) => {
                self.record_failure(&spec.id, format!("failed to start worker: {e}"))?;
                return Err(HostError::Job(format!("failed to start worker: {e}")));
            }
        };
        tracing::info!(job = %spec.id, pid = child.id(), "background job started");
        if let Err(e) = self.record_pid(&spec.id, child.id()) {
            tracing::warn!(job = %spec.id, error = %e, "could not record worker pid");
        }

        Ok(JobHandle {
            id: spec.id.clone(),
            pid: Some(child.id()),
            status_path: self.status_path(&spec.id),
        })
    }

    /// Worker side: run the job described by `spec_path` to completion.
    pub fn run_job(spec_path: &Path, runner: &dyn HostRunner) -> Result<JobStatus> {
        let spec: JobSpec = read_json(spec_path)?;
        let dir = spec_path
            .parent()
            .ok_or_else(|| HostError::Job(format!("bad job path {}", spec_path.display())))?;
        let store = JobStore::new(dir);
        let status_path = store.status_path(&spec.id);

        let current: JobStatus = read_json(&status_path)?;
        if current.state.is_terminal() {
            tracing::info!(job = %spec.id, state = %current.state, "job already finished");
            return Ok(current);
        }

        let mut running = current.transition(JobState::Running);
        running.pid = Some(std::process::id());
        write_json(&status_path, &running)?;

        let finished = match runner.run(&spec.invocation) {
            Ok(out) => {
                print!("{}", out.stdout);
                let mut s = running.transition(JobState::Succeeded);
                s.exit_code = Some(out.exit_code);
                s
            }
            Err(e) => {
                eprintln!("{e}");
                let mut s = running.transition(JobState::Failed);
                s.exit_code = e.exit_code();
                s.message = Some(e.to_string());
                s
            }
        };
        let current: JobStatus = read_json(&status_path)?;
        if current.state == JobState::Cancelled {
            tracing::info!(job = %spec.id, "job cancelled while running");
            return Ok(current);
        }
        write_json(&status_path, &finished)?;
        tracing::info!(job = %spec.id, state = %finished.state, "background job finished");
        Ok(finished)
    }

    pub fn handle(&self, id: &str) -> Result<JobHandle> {
        let status_path = self.status_path(id);
        if !status_path.is_file() {
            return Err(HostError::Job(format!("no such job: {id}")));
        }
        let status: JobStatus = read_json(&status_path)?;
        Ok(JobHandle {
            id: id.to_string(),
            pid: status.pid,
            status_path,
        })
    }

    /// All known jobs, oldest first.
    pub fn list(&self) -> Result<Vec<JobStatus>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut jobs = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_status = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(STATUS_SUFFIX));
            if is_status {
                match read_json::<JobStatus>(&path) {
                    Ok(s) => jobs.push(s),
                    Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable job"),
                }
            }
        }
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(jobs)
    }

    /// Attach the worker pid to a still-queued marker so the job can be
    /// cancelled before the worker records itself as running.
    fn record_pid(&self, id: &str, pid: u32) -> Result<()> {
        let path = self.status_path(id);
        let mut status: JobStatus = read_json(&path)?;
        if status.state != JobState::Queued || status.pid.is_some() {
            return Ok(());
        }
        status.pid = Some(pid);
        write_json(&path, &status)
    }

    fn record_failure(&self, id: &str, message: String) -> Result<()> {
        let path = self.status_path(id);
        let mut status = read_json::<JobStatus>(&path)?.transition(JobState::Failed);
        status.message = Some(message);
        write_json(&path, &status)
    }
}

// ─── JobHandle ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct JobHandle {
    pub id: String,
    pid: Option<u32>,
    status_path: PathBuf,
}

impl JobHandle {
    pub fn status(&self) -> Result<JobStatus> {
        read_json(&self.status_path)
    }

    /// Kill the worker's process group and record `cancelled`.
    ///
    /// A job that already finished is left as it is.
    pub fn cancel(&self) -> Result<JobStatus> {
        let status = self.status()?;
        if status.state.is_terminal() {
            return Ok(status);
        }
        if let Some(pid) = status.pid.or(self.pid) {
            kill_group(pid);
        }
        let cancelled = status.transition(JobState::Cancelled);
        write_json(&self.status_path, &cancelled)?;
        tracing::info!(job = %self.id, "background job cancelled");
        Ok(cancelled)
    }

    /// Poll until the job reaches a terminal state.
    pub fn wait(&self, poll: Duration, limit: Option<Duration>) -> Result<JobStatus> {
        let started = Instant::now();
        loop {
            let status = self.status()?;
            if status.state.is_terminal() {
                return Ok(status);
            }
            if let Some(limit) = limit {
                if started.elapsed() >= limit {
                    return Err(HostError::Job(format!(
                        "job {} still {} after {}s",
                        self.id,
                        status.state,
                        limit.as_secs()
                    )));
                }
            }
            std::thread::sleep(poll);
        }
    }
}

// ─── Helpers ──────────────────────────────────────────────────────────────

fn new_job_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(12);
    id
}

#[cfg(unix)]
fn kill_group(pid: u32) {
    let _ = Command::new("kill")
        .arg("-9")
        .arg("--")
        .arg(format!("-{pid}"))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

#[cfg(not(unix))]
fn kill_group(pid: u32) {
    let _ = Command::new("taskkill")
        .args(["/F", "/T", "/PID", &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_vec_pretty(value).map_err(|e| HostError::Job(e.to_string()))?;
    let dir = path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let data = std::fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|source| HostError::Parse {
        path: path.display().to_string(),
        source,
    })
}

// ─── Tests ────────────────────────────────────────────────────────────────
