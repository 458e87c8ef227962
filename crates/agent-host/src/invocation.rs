use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ─── HostInvocation ───────────────────────────────────────────────────────

/// One call of the host binary:
///
/// ```text
/// <binary> <subcommand> [extra args…] --set key=value --set key=value …
/// ```
///
/// Settings keep insertion order; a repeated key replaces the earlier value
/// in place so each key is sent once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInvocation {
    pub binary: String,
    pub subcommand: String,
    #[serde(default)]
    pub extra_args: Vec<String>,
    #[serde(default)]
    pub settings: Vec<(String, String)>,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
    /// Wall-clock limit for the whole call; `None` waits indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl HostInvocation {
    pub fn new(binary: impl Into<String>, subcommand: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            subcommand: subcommand.into(),
            extra_args: Vec::new(),
            settings: Vec::new(),
            cwd: None,
            timeout_secs: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.settings.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.settings.push((key, value)),
        }
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// `0` means no limit.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = (secs > 0).then_some(secs);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Full argument vector, binary first.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(2 + self.extra_args.len() + self.settings.len() * 2);
        argv.push(self.binary.clone());
        argv.push(self.subcommand.clone());
        argv.extend(self.extra_args.iter().cloned());
        for (k, v) in &self.settings {
            argv.push("--set".to_string());
            argv.push(format!("{k}={v}"));
        }
        argv
    }

    /// A shell-pasteable rendering for logs and `--verbose` output.
    pub fn display(&self) -> String {
        self.argv()
            .iter()
            .map(|a| shell_quote(a))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,@+".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
