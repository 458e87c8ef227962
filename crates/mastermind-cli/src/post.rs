//! Post-processing of a generated project: git repository and test run.
//!
//! Nothing here is fatal. A missing tool or a failing step is reported as a
//! warning and the invocation still succeeds.

use std::path::Path;

use agent_host::{run_blocking, HostError, HostInvocation};
use mastermind_core::project::{detect_test_command, TestCommand};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Done,
    Skipped(String),
    Failed(String),
}

fn warn(step: &str, outcome: &StepOutcome) {
    match outcome {
        StepOutcome::Done => {}
        StepOutcome::Skipped(why) => {
            tracing::warn!(step, reason = %why, "skipped");
            eprintln!("warning: {step} skipped: {why}");
        }
        StepOutcome::Failed(why) => {
            tracing::warn!(step, reason = %why, "failed");
            eprintln!("warning: {step} failed: {why}");
        }
    }
}

/// Run one command in `dir`, bounded by `timeout_secs` (`0` = no limit).
fn step(dir: &Path, program: &str, args: &[&str], timeout_secs: u64) -> StepOutcome {
    if which::which(program).is_err() {
        return StepOutcome::Skipped(format!("'{program}' not found on PATH"));
    }
    let inv = HostInvocation::new(program, args.first().copied().unwrap_or_default())
        .args(args.iter().skip(1).copied())
        .cwd(dir)
        .timeout_secs(timeout_secs);
    match run_blocking(&inv) {
        Ok(_) => StepOutcome::Done,
        Err(HostError::Exit { code, stderr }) => {
            let tail = stderr.lines().last().unwrap_or_default().to_string();
            let code = code.map_or_else(|| "signal".to_string(), |c| c.to_string());
            let msg = format!("{} exited with {code} {tail}", inv.display());
            StepOutcome::Failed(msg.trim_end().to_string())
        }
        Err(e) => StepOutcome::Failed(e.to_string()),
    }
}

/// `git init`, `git add -A`, then one commit.
pub fn init_git_repo(dir: &Path, message: &str, timeout_secs: u64) -> StepOutcome {
    let identity = [
        "-c",
        "user.name=mastermind",
        "-c",
        "user.email=mastermind@localhost",
    ];
    let commit: Vec<&str> = identity
        .iter()
        .copied()
        .chain(["commit", "-q", "--allow-empty", "-m", message])
        .collect();

    let outcome = [
        vec!["init", "-q"],
        vec!["add", "-A"],
        commit,
    ]
    .iter()
    .map(|args| step(dir, "git", args, timeout_secs))
    .find(|o| *o != StepOutcome::Done)
    .unwrap_or(StepOutcome::Done);

    warn("git", &outcome);
    if outcome == StepOutcome::Done {
        tracing::info!(dir = %dir.display(), "initialised git repository");
    }
    outcome
}

/// Detect the project's test runner and run it.
pub fn run_tests(dir: &Path, timeout_secs: u64) -> StepOutcome {
    let outcome = match detect_test_command(dir) {
        None => StepOutcome::Skipped("no recognised project marker".to_string()),
        Some(TestCommand { program, args, .. }) => step(dir, program, args, timeout_secs),
    };
    warn("tests", &outcome);
    outcome
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn tests_skipped_without_marker() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(run_tests(dir.path(), 10), StepOutcome::Skipped(_)));
    }

    #[test]
    fn missing_program_is_skipped() {
        let dir = TempDir::new().unwrap();
        let outcome = step(dir.path(), "no-such-tool-for-mastermind", &["x"], 10);
        assert!(matches!(outcome, StepOutcome::Skipped(ref why) if why.contains("not found")));
    }

    #[test]
    fn failing_command_is_reported() {
        let dir = TempDir::new().unwrap();
        let outcome = step(dir.path(), "sh", &["-c", "echo broken >&2; exit 2"], 10);
        match outcome {
            StepOutcome::Failed(why) => {
                assert!(why.contains("exited with 2"), "{why}");
                assert!(why.contains("broken"), "{why}");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn git_repo_is_committed_when_git_available() {
        if which::which("git").is_err() {
            return;
        }
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("main.py"), "print('hi')\n").unwrap();
        let outcome = init_git_repo(dir.path(), "Initial commit", 30);
        assert_eq!(outcome, StepOutcome::Done);
        assert!(dir.path().join(".git").is_dir());
    }
}
