//! Generated project directories: naming, collision-free allocation, and
//! detection of the test runner a generated project expects.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::error::{MastermindError, Result};

const FALLBACK_NAME: &str = "project";
const SLUG_WORDS: usize = 5;
const MAX_SUFFIX: u32 = 10_000;

// ---------------------------------------------------------------------------
// Naming
// ---------------------------------------------------------------------------

/// Turn free text into a directory-safe slug: the first few words,
/// lowercased, non-alphanumerics dropped, joined with `-`.
pub fn slugify(text: &str) -> String {
    let words: Vec<String> = text
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .take(SLUG_WORDS)
        .map(|w| w.to_ascii_lowercase())
        .collect();
    if words.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        words.join("-")
    }
}

/// The explicit `--project-name` wins; otherwise the description is slugged.
pub fn project_name(explicit: Option<&str>, description: Option<&str>) -> String {
    match explicit {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => description.map(slugify).unwrap_or_else(|| FALLBACK_NAME.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

/// A project name must stay inside the output directory: one plain path
/// component, no separators, no `.` or `..`.
pub fn validate_project_name(name: &str) -> Result<()> {
    let mut parts = Path::new(name).components();
    let single = matches!((parts.next(), parts.next()), (Some(Component::Normal(_)), None));
    if !single || name.contains(['/', '\\']) {
        return Err(MastermindError::InvalidValue {
            option: "project-name".into(),
            value: name.into(),
            reason: "must be a single directory name".into(),
        });
    }
    Ok(())
}

/// Create `base/name`, or `base/name-1`, `base/name-2`, … if taken.
///
/// Each candidate is claimed with a single `create_dir`, so an existing
/// directory is never reused or overwritten. The base directory is created
/// if missing.
pub fn allocate_output_dir(base: &Path, name: &str) -> Result<PathBuf> {
    validate_project_name(name)?;
    std::fs::create_dir_all(base)?;

    for n in 0..MAX_SUFFIX {
        let candidate = if n == 0 {
            base.join(name)
        } else {
            base.join(format!("{name}-{n}"))
        };
        match std::fs::create_dir(&candidate) {
            Ok(()) => {
                if n > 0 {
                    tracing::info!(
                        requested = %base.join(name).display(),
                        chosen = %candidate.display(),
                        "output directory exists, using suffixed name"
                    );
                }
                return Ok(candidate);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(MastermindError::OutputDirExhausted(
        base.join(name).display().to_string(),
    ))
}

// ---------------------------------------------------------------------------
// Project type → test runner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectKind {
    Node,
    Rust,
    Python,
    Go,
    Maven,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCommand {
    pub kind: ProjectKind,
    pub program: &'static str,
    pub args: &'static [&'static str],
}

impl TestCommand {
    pub fn display(&self) -> String {
        std::iter::once(self.program)
            .chain(self.args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Marker file → project kind → test command. First match wins.
const TEST_RUNNERS: &[(&str, ProjectKind, &str, &[&str])] = &[
    ("package.json", ProjectKind::Node, "npm", &["test"]),
    ("Cargo.toml", ProjectKind::Rust, "cargo", &["test"]),
    ("pyproject.toml", ProjectKind::Python, "python", &["-m", "pytest"]),
    ("setup.py", ProjectKind::Python, "python", &["-m", "pytest"]),
    ("requirements.txt", ProjectKind::Python, "python", &["-m", "pytest"]),
    ("go.mod", ProjectKind::Go, "go", &["test", "./..."]),
    ("pom.xml", ProjectKind::Maven, "mvn", &["test"]),
];

pub fn detect_test_command(dir: &Path) -> Option<TestCommand> {
    TEST_RUNNERS
        .iter()
        .find(|(marker, ..)| dir.join(marker).is_file())
        .map(|&(_, kind, program, args)| TestCommand {
            kind,
            program,
            args,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn slugify_takes_leading_words() {
        assert_eq!(
            slugify("Enterprise e-commerce platform"),
            "enterprise-e-commerce-platform"
        );
        assert_eq!(
            slugify("a very long description with many many words"),
            "a-very-long-description-with"
        );
        assert_eq!(slugify("!!!"), "project");
    }

    #[test]
    fn explicit_project_name_wins() {
        assert_eq!(project_name(Some("shop"), Some("an online shop")), "shop");
        assert_eq!(project_name(Some("  "), Some("an online shop")), "an-online-shop");
        assert_eq!(project_name(None, None), "project");
    }

    #[test]
    fn allocation_suffixes_on_collision() {
        let dir = TempDir::new().unwrap();
        let first = allocate_output_dir(dir.path(), "shop").unwrap();
        let second = allocate_output_dir(dir.path(), "shop").unwrap();
        let third = allocate_output_dir(dir.path(), "shop").unwrap();
        assert_eq!(first, dir.path().join("shop"));
        assert_eq!(second, dir.path().join("shop-1"));
        assert_eq!(third, dir.path().join("shop-2"));
        assert!(first.is_dir() && second.is_dir() && third.is_dir());
    }

    #[test]
    fn allocation_never_touches_existing_contents() {
        let dir = TempDir::new().unwrap();
        let existing = dir.path().join("shop");
        std::fs::create_dir_all(&existing).unwrap();
        std::fs::write(existing.join("keep.txt"), "keep").unwrap();

        let chosen = allocate_output_dir(dir.path(), "shop").unwrap();
        assert_eq!(chosen, dir.path().join("shop-1"));
        assert_eq!(
            std::fs::read_to_string(existing.join("keep.txt")).unwrap(),
            "keep"
        );
    }

    #[test]
    fn names_that_escape_the_base_are_rejected() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("generated");
        for name in ["../escape", "/tmp/abs", "a/b", "..", ".", "a\\b"] {
            let err = allocate_output_dir(&base, name).unwrap_err();
            assert!(
                matches!(err, MastermindError::InvalidValue { ref option, .. } if option == "project-name"),
                "{name}: {err}"
            );
        }
        assert!(!base.exists());
        assert!(!dir.path().join("escape").exists());
        assert!(validate_project_name("my-shop.v2").is_ok());
    }

    #[test]
    fn allocation_creates_missing_base() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("generated/nested");
        let chosen = allocate_output_dir(&base, "app").unwrap();
        assert_eq!(chosen, base.join("app"));
    }

    #[test]
    fn detects_test_runner_from_markers() {
        let dir = TempDir::new().unwrap();
        assert_eq!(detect_test_command(dir.path()), None);

        std::fs::write(dir.path().join("requirements.txt"), "pytest\n").unwrap();
        let cmd = detect_test_command(dir.path()).unwrap();
        assert_eq!(cmd.kind, ProjectKind::Python);
        assert_eq!(cmd.display(), "python -m pytest");

        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        let cmd = detect_test_command(dir.path()).unwrap();
        assert_eq!(cmd.kind, ProjectKind::Node);
        assert_eq!(cmd.display(), "npm test");
    }
}
