use crate::error::{MastermindError, Result};
use crate::options::{GlobalOptions, DEFAULT_LANGUAGE, DEFAULT_OUTPUT_DIR};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "mastermind.yaml";
pub const DEFAULT_HOST_BINARY: &str = "qodo";
pub const DEFAULT_JOBS_DIR: &str = ".mastermind/jobs";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// HostConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default = "default_host_binary")]
    pub binary: String,
    /// Wall-clock limit for one host call. `0` disables the limit.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Arguments inserted after the subcommand, before the `--set` pairs.
    #[serde(default = "default_extra_args")]
    pub extra_args: Vec<String>,
}

fn default_host_binary() -> String {
    DEFAULT_HOST_BINARY.to_string()
}

fn default_timeout_seconds() -> u64 {
    300
}

fn default_extra_args() -> Vec<String> {
    vec!["--ci".to_string()]
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            binary: default_host_binary(),
            timeout_seconds: default_timeout_seconds(),
            extra_args: default_extra_args(),
        }
    }
}

// ---------------------------------------------------------------------------
// DefaultsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            output_dir: default_output_dir(),
        }
    }
}

// ---------------------------------------------------------------------------
// PostConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostConfig {
    /// Run the detected test command after a generation that included tests.
    #[serde(default = "default_run_tests")]
    pub run_tests: bool,
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
}

fn default_run_tests() -> bool {
    true
}

fn default_commit_message() -> String {
    "Initial commit: generated by mastermind".to_string()
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            run_tests: default_run_tests(),
            commit_message: default_commit_message(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub post: PostConfig,
    #[serde(default = "default_jobs_dir")]
    pub jobs_dir: PathBuf,
}

fn default_jobs_dir() -> PathBuf {
    PathBuf::from(DEFAULT_JOBS_DIR)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: HostConfig::default(),
            defaults: DefaultsConfig::default(),
            post: PostConfig::default(),
            jobs_dir: default_jobs_dir(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Load the config for this invocation.
    ///
    /// An explicit path must exist. Otherwise `mastermind.yaml` in `cwd` is
    /// used when present, and built-in defaults when not.
    pub fn resolve(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(MastermindError::InvalidConfig(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            return Self::load(path);
        }
        let implicit = cwd.join(CONFIG_FILE);
        if implicit.is_file() {
            tracing::debug!(path = %implicit.display(), "loading config");
            Self::load(&implicit)
        } else {
            Ok(Self::default())
        }
    }

    /// Starting point for global option extraction. A blank
    /// `defaults.language` falls back to the built-in default.
    pub fn global_defaults(&self) -> GlobalOptions {
        let language = match self.defaults.language.trim() {
            "" => DEFAULT_LANGUAGE,
            lang => lang,
        };
        GlobalOptions::with_defaults(language, self.defaults.output_dir.clone())
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.host.binary.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "host.binary is empty".to_string(),
            });
        }

        if self.host.timeout_seconds == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "host.timeout_seconds is 0: host calls will never time out".to_string(),
            });
        }

        if self.defaults.language.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!("defaults.language is empty, falling back to {DEFAULT_LANGUAGE}"),
            });
        }

        if self.post.commit_message.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "post.commit_message is empty".to_string(),
            });
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_no_file() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::resolve(None, dir.path()).unwrap();
        assert_eq!(cfg.host.binary, DEFAULT_HOST_BINARY);
        assert_eq!(cfg.host.timeout_seconds, 300);
        assert_eq!(cfg.host.extra_args, vec!["--ci".to_string()]);
        assert_eq!(cfg.defaults.output_dir, PathBuf::from("generated"));
        assert!(cfg.post.run_tests);
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "host:\n  binary: /opt/bin/agent-host\ndefaults:\n  language: rust\n",
        )
        .unwrap();
        let cfg = Config::resolve(None, dir.path()).unwrap();
        assert_eq!(cfg.host.binary, "/opt/bin/agent-host");
        assert_eq!(cfg.host.timeout_seconds, 300);
        assert_eq!(cfg.defaults.language, "rust");
        assert_eq!(cfg.defaults.output_dir, PathBuf::from("generated"));
        assert_eq!(cfg.jobs_dir, PathBuf::from(DEFAULT_JOBS_DIR));

        let globals = cfg.global_defaults();
        assert_eq!(globals.language, "rust");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = Config::resolve(Some(&dir.path().join("nope.yaml")), dir.path()).unwrap_err();
        assert!(matches!(err, MastermindError::InvalidConfig(_)));
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "host: [unclosed").unwrap();
        assert!(matches!(
            Config::resolve(Some(&path), dir.path()),
            Err(MastermindError::Yaml(_))
        ));
    }

    #[test]
    fn validate_flags_problems() {
        let mut cfg = Config::default();
        cfg.host.binary = " ".into();
        cfg.host.timeout_seconds = 0;
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().any(|w| w.level == WarnLevel::Error));
    }

    #[test]
    fn blank_default_language_falls_back() {
        let mut cfg = Config::default();
        cfg.defaults.language = "  ".into();
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.message.contains(&format!("falling back to {DEFAULT_LANGUAGE}"))));
        assert_eq!(cfg.global_defaults().language, DEFAULT_LANGUAGE);
    }
}
