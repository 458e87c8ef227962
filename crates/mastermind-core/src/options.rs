//! Global option extraction.
//!
//! Global flags may appear anywhere on the command line, before or after the
//! agent name. [`extract_globals`] pulls them out of the raw argument vector
//! and hands back everything else, untouched and in order, for the agent's
//! own parser. The result is an owned, immutable [`GlobalOptions`] that the
//! caller threads through every later step of the invocation.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::{MastermindError, Result};

pub const DEFAULT_LANGUAGE: &str = "python";
pub const DEFAULT_OUTPUT_DIR: &str = "generated";

/// Options meaningful to every agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlobalOptions {
    pub language: String,
    pub framework: Option<String>,
    pub output_dir: PathBuf,
    pub project_name: Option<String>,
    pub create_git_repo: bool,
    pub verbose: bool,
}

impl Default for GlobalOptions {
    fn default() -> Self {
        Self::with_defaults(DEFAULT_LANGUAGE, DEFAULT_OUTPUT_DIR)
    }
}

impl GlobalOptions {
    /// Baseline options before any flag is applied. Callers pass the
    /// configured defaults here so flags only ever override them.
    pub fn with_defaults(language: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            language: language.into(),
            framework: None,
            output_dir: output_dir.into(),
            project_name: None,
            create_git_repo: false,
            verbose: false,
        }
    }
}

/// The global flags, and whether each consumes a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GlobalFlag {
    Language,
    Framework,
    OutputDir,
    ProjectName,
    Git,
    Verbose,
}

impl GlobalFlag {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "--language" => Some(GlobalFlag::Language),
            "--framework" => Some(GlobalFlag::Framework),
            "--output-dir" => Some(GlobalFlag::OutputDir),
            "--project-name" => Some(GlobalFlag::ProjectName),
            "--git" => Some(GlobalFlag::Git),
            "--verbose" | "-v" => Some(GlobalFlag::Verbose),
            _ => None,
        }
    }

    fn takes_value(self) -> bool {
        !matches!(self, GlobalFlag::Git | GlobalFlag::Verbose)
    }

    fn apply(self, opts: &mut GlobalOptions, value: Option<String>) {
        match self {
            GlobalFlag::Language => opts.language = value.unwrap_or_default(),
            GlobalFlag::Framework => opts.framework = value,
            GlobalFlag::OutputDir => opts.output_dir = PathBuf::from(value.unwrap_or_default()),
            GlobalFlag::ProjectName => opts.project_name = value,
            GlobalFlag::Git => opts.create_git_repo = true,
            GlobalFlag::Verbose => opts.verbose = true,
        }
    }
}

/// Split `args` into resolved global options and the remaining tokens.
///
/// - Unknown flags are forwarded, not rejected; the agent parser owns them.
/// - A value flag at the end of input, or followed by another `--flag`, is a
///   [`MastermindError::MissingValue`].
/// - `--flag=value` is accepted for value flags.
/// - A bare `--` stops extraction; it and everything after it are forwarded.
/// - When a flag repeats, the last occurrence wins.
pub fn extract_globals<I>(args: I, base: GlobalOptions) -> Result<(GlobalOptions, Vec<String>)>
where
    I: IntoIterator<Item = String>,
{
    let mut opts = base;
    let mut remaining = Vec::new();
    let mut iter = args.into_iter();

    while let Some(token) = iter.next() {
        if token == "--" {
            remaining.push(token);
            remaining.extend(iter.by_ref());
            break;
        }

        if let Some((name, value)) = token.split_once('=') {
            if let Some(flag) = GlobalFlag::parse(name).filter(|f| f.takes_value()) {
                if value.is_empty() {
                    return Err(MastermindError::MissingValue(name.to_string()));
                }
                flag.apply(&mut opts, Some(value.to_string()));
                continue;
            }
        }

        let Some(flag) = GlobalFlag::parse(&token) else {
            remaining.push(token);
            continue;
        };

        if flag.takes_value() {
            match iter.next() {
                Some(value) if !value.starts_with("--") => flag.apply(&mut opts, Some(value)),
                _ => return Err(MastermindError::MissingValue(token)),
            }
        } else {
            flag.apply(&mut opts, None);
        }
    }

    tracing::debug!(
        language = %opts.language,
        framework = ?opts.framework,
        output_dir = %opts.output_dir.display(),
        remaining = remaining.len(),
        "global options resolved"
    );

    Ok((opts, remaining))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn extract(list: &[&str]) -> Result<(GlobalOptions, Vec<String>)> {
        extract_globals(args(list), GlobalOptions::default())
    }

    #[test]
    fn defaults_when_no_globals() {
        let (opts, rest) = extract(&["generate", "a", "todo", "app"]).unwrap();
        assert_eq!(opts, GlobalOptions::default());
        assert_eq!(rest, args(&["generate", "a", "todo", "app"]));
    }

    #[test]
    fn value_flags_are_consumed() {
        let (opts, rest) = extract(&[
            "--language",
            "go",
            "generate",
            "--framework",
            "gin",
            "api",
            "--output-dir",
            "out",
            "--project-name",
            "svc",
        ])
        .unwrap();
        assert_eq!(opts.language, "go");
        assert_eq!(opts.framework.as_deref(), Some("gin"));
        assert_eq!(opts.output_dir, PathBuf::from("out"));
        assert_eq!(opts.project_name.as_deref(), Some("svc"));
        assert_eq!(rest, args(&["generate", "api"]));
    }

    #[test]
    fn boolean_toggles() {
        let (opts, rest) = extract(&["code-review", "--git", "-v"]).unwrap();
        assert!(opts.create_git_repo);
        assert!(opts.verbose);
        assert_eq!(rest, args(&["code-review"]));
    }

    #[test]
    fn equals_form() {
        let (opts, rest) = extract(&["generate", "--language=rust", "cli"]).unwrap();
        assert_eq!(opts.language, "rust");
        assert_eq!(rest, args(&["generate", "cli"]));
    }

    #[test]
    fn unknown_flags_are_forwarded_in_order() {
        let (_, rest) = extract(&[
            "chunked-generation",
            "--max-chunk-size",
            "500",
            "--language",
            "python",
            "big",
            "--no-tests",
        ])
        .unwrap();
        assert_eq!(
            rest,
            args(&["chunked-generation", "--max-chunk-size", "500", "big", "--no-tests"])
        );
    }

    #[test]
    fn remaining_preserves_relative_order() {
        let input = [
            "x", "--git", "y", "--language", "js", "z", "--unknown", "w", "--verbose", "v",
        ];
        let (_, rest) = extract(&input).unwrap();
        let expected: Vec<String> = args(&["x", "y", "z", "--unknown", "w", "v"]);
        assert_eq!(rest, expected);
    }

    #[test]
    fn missing_value_at_end_is_fatal() {
        let err = extract(&["generate", "app", "--framework"]).unwrap_err();
        assert!(matches!(err, MastermindError::MissingValue(ref f) if f == "--framework"));
        assert_eq!(err.to_string(), "Missing value for --framework");
    }

    #[test]
    fn value_flag_followed_by_flag_is_missing_value() {
        let err = extract(&["generate", "--language", "--git"]).unwrap_err();
        assert!(matches!(err, MastermindError::MissingValue(_)));
    }

    #[test]
    fn empty_equals_value_is_missing_value() {
        let err = extract(&["generate", "--output-dir="]).unwrap_err();
        assert!(matches!(err, MastermindError::MissingValue(ref f) if f == "--output-dir"));
    }

    #[test]
    fn last_occurrence_wins() {
        let (opts, _) = extract(&["--language", "go", "generate", "--language", "rust"]).unwrap();
        assert_eq!(opts.language, "rust");
    }

    #[test]
    fn double_dash_stops_extraction() {
        let (opts, rest) = extract(&["generate", "--", "--language", "tips"]).unwrap();
        assert_eq!(opts.language, DEFAULT_LANGUAGE);
        assert_eq!(rest, args(&["generate", "--", "--language", "tips"]));
    }

    #[test]
    fn configured_defaults_are_overridden_only_by_flags() {
        let base = GlobalOptions::with_defaults("typescript", "/tmp/out");
        let (opts, _) = extract_globals(args(&["generate", "app"]), base).unwrap();
        assert_eq!(opts.language, "typescript");
        assert_eq!(opts.output_dir, PathBuf::from("/tmp/out"));
    }
}
