use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;

use crate::invocation::HostInvocation;
use crate::{HostError, Result};

// ─── HostProcess ──────────────────────────────────────────────────────────

/// A running host subprocess.
///
/// Stdout is read line by line and echoed to the debug log as it arrives.
/// Both streams are decoded lossily; invalid UTF-8 never fails the call.
/// Stderr is drained by a background task into a buffer that is attached to
/// the error when the process exits non-zero.
pub(crate) struct HostProcess {
    child: Child,
    stdout: BufReader<ChildStdout>,
    stderr_buf: Arc<Mutex<String>>,
    stderr_task: Option<JoinHandle<()>>,
}

/// Everything the host printed, plus how it exited.
#[derive(Debug)]
pub(crate) struct Finished {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl HostProcess {
    pub(crate) fn spawn(inv: &HostInvocation) -> Result<Self> {
        let cmd = build_command(inv);
        Self::from_command(cmd).map_err(|e| match e {
            HostError::Io(source) => HostError::Spawn {
                binary: inv.binary.clone(),
                source,
            },
            other => other,
        })
    }

    fn from_command(mut cmd: Command) -> Result<Self> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| HostError::Process("stdout not captured".into()))?;

        let stderr_buf = Arc::new(Mutex::new(String::new()));
        let stderr_task = child.stderr.take().map(|stderr| {
            let buf = Arc::clone(&stderr_buf);
            tokio::spawn(async move {
                let mut reader = BufReader::new(stderr);
                while let Ok(Some(line)) = next_line_lossy(&mut reader).await {
                    if let Ok(mut b) = buf.lock() {
                        if !b.is_empty() {
                            b.push('\n');
                        }
                        b.push_str(&line);
                    }
                }
            })
        });

        Ok(Self {
            child,
            stdout: BufReader::new(stdout),
            stderr_buf,
            stderr_task,
        })
    }

    pub(crate) fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Read stdout to EOF, then reap the child.
    ///
    /// With a limit, the whole read-and-wait is bounded; on expiry the child
    /// is killed and [`HostError::Timeout`] returned.
    pub(crate) async fn finish(mut self, limit: Option<Duration>) -> Result<Finished> {
        let (stdout, status) = match limit {
            None => self.drain_and_wait().await?,
            Some(limit) => {
                let outcome = tokio::time::timeout(limit, self.drain_and_wait()).await;
                match outcome {
                    Ok(done) => done?,
                    Err(_) => {
                        tracing::warn!(secs = limit.as_secs(), "host command timed out, killing");
                        self.kill().await;
                        return Err(HostError::Timeout(limit.as_secs()));
                    }
                }
            }
        };

        let stderr = self
            .stderr_buf
            .lock()
            .map(|b| b.clone())
            .unwrap_or_default();

        if !status.success() {
            return Err(HostError::Exit {
                code: status.code(),
                stderr,
            });
        }

        Ok(Finished {
            status,
            stdout,
            stderr,
        })
    }

    async fn drain_and_wait(&mut self) -> Result<(String, ExitStatus)> {
        let mut out = String::new();
        while let Some(line) = next_line_lossy(&mut self.stdout).await? {
            tracing::debug!(target: "host", "{line}");
            out.push_str(&line);
            out.push('\n');
        }
        let status = self.child.wait().await?;
        if let Some(task) = self.stderr_task.take() {
            let _ = task.await;
        }
        Ok((out, status))
    }

    /// Best-effort; errors are ignored.
    pub(crate) async fn kill(&mut self) {
        let _ = self.child.kill().await;
    }
}

/// One line without its terminator, or `None` at EOF.
async fn next_line_lossy<R: AsyncBufRead + Unpin>(reader: &mut R) -> std::io::Result<Option<String>> {
    let mut raw = Vec::new();
    if reader.read_until(b'\n', &mut raw).await? == 0 {
        return Ok(None);
    }
    if raw.last() == Some(&b'\n') {
        raw.pop();
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(&raw).into_owned()))
}

// ─── Command builder ──────────────────────────────────────────────────────

fn build_command(inv: &HostInvocation) -> Command {
    let argv = inv.argv();
    let mut cmd = Command::new(&argv[0]);
    cmd.args(&argv[1..]);
    if let Some(cwd) = &inv.cwd {
        cmd.current_dir(cwd);
    }
    cmd
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str) -> HostInvocation {
        HostInvocation::new("sh", "-c").arg(script)
    }

    #[tokio::test]
    async fn captures_stdout_and_stderr() {
        let proc = HostProcess::spawn(&shell("echo one; echo two; echo oops >&2")).unwrap();
        let done = proc.finish(None).await.unwrap();
        assert!(done.status.success());
        assert_eq!(done.stdout, "one\ntwo\n");
        assert_eq!(done.stderr, "oops");
    }

    #[tokio::test]
    async fn non_zero_exit_carries_code_and_stderr() {
        let proc = HostProcess::spawn(&shell("echo bad input >&2; exit 3")).unwrap();
        let err = proc.finish(None).await.unwrap_err();
        assert_eq!(err.exit_code(), Some(3));
        let msg = err.to_string();
        assert!(msg.contains("exited with code 3"), "{msg}");
        assert!(msg.contains("bad input"), "{msg}");
    }

    #[tokio::test]
    async fn timeout_kills_the_child() {
        let proc = HostProcess::spawn(&shell("sleep 30")).unwrap();
        let started = std::time::Instant::now();
        let err = proc
            .finish(Some(Duration::from_millis(200)))
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::Timeout(_)));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn invalid_utf8_output_does_not_fail_a_successful_host() {
        let script = r#"printf 'caf\351\n{"ok": true}\n'; printf 'bad \377\nstill here\n' >&2; exit 0"#;
        let done = HostProcess::spawn(&shell(script))
            .unwrap()
            .finish(None)
            .await
            .unwrap();
        assert!(done.status.success());
        assert_eq!(done.stdout, "caf\u{FFFD}\n{\"ok\": true}\n");
        assert_eq!(done.stderr, "bad \u{FFFD}\nstill here");
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let inv = HostInvocation::new("definitely-not-a-real-host-binary", "run");
        let err = HostProcess::spawn(&inv).err().unwrap();
        assert!(matches!(err, HostError::Spawn { .. }));
        assert!(err.to_string().contains("definitely-not-a-real-host-binary"));
    }

    #[tokio::test]
    async fn runs_in_requested_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let inv = shell("pwd").cwd(dir.path());
        let done = HostProcess::spawn(&inv).unwrap().finish(None).await.unwrap();
        let printed = std::path::PathBuf::from(done.stdout.trim());
        assert_eq!(
            printed.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }
}
