//! Declarative per-agent option schemas and the single parser they drive.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{MastermindError, Result};

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Text,
    Integer,
    /// A boolean switch. The parsed value records whether it was given; the
    /// host setting is `sets` when given and `!sets` otherwise.
    Flag { sets: bool },
    Choice(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Default(&'static str),
    Optional,
}

/// One `--name` an agent understands.
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    /// Flag name without the leading `--`.
    pub name: &'static str,
    pub kind: OptionKind,
    pub presence: Presence,
    /// Key used in the `--set key=value` pair handed to the host.
    pub setting: &'static str,
    pub help: &'static str,
}

impl OptionSpec {
    pub const fn new(
        name: &'static str,
        kind: OptionKind,
        presence: Presence,
        setting: &'static str,
        help: &'static str,
    ) -> Self {
        Self {
            name,
            kind,
            presence,
            setting,
            help,
        }
    }

    fn takes_value(&self) -> bool {
        !matches!(self.kind, OptionKind::Flag { .. })
    }

    fn convert(&self, raw: &str) -> Result<OptionValue> {
        match self.kind {
            OptionKind::Text => Ok(OptionValue::Text(raw.to_string())),
            OptionKind::Integer => raw
                .parse::<i64>()
                .map(OptionValue::Integer)
                .map_err(|_| self.invalid(raw, "expected an integer")),
            OptionKind::Choice(choices) => {
                if choices.contains(&raw) {
                    Ok(OptionValue::Text(raw.to_string()))
                } else {
                    Err(self.invalid(raw, &format!("expected one of {}", choices.join(", "))))
                }
            }
            OptionKind::Flag { .. } => Err(self.invalid(raw, "flag takes no value")),
        }
    }

    /// The string sent to the host. Flags translate "was given" into the
    /// value they set, so `--no-tests` becomes `include_tests=false`.
    fn setting_value(&self, value: &OptionValue) -> String {
        match (self.kind, value) {
            (OptionKind::Flag { sets }, OptionValue::Flag(given)) => {
                (if *given { sets } else { !sets }).to_string()
            }
            _ => value.to_string(),
        }
    }

    fn invalid(&self, value: &str, reason: &str) -> MastermindError {
        MastermindError::InvalidValue {
            option: self.name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Usage line fragment, e.g. `--max-chunk-size <integer>  (default: 2000)`.
    pub fn usage(&self) -> String {
        let arg = match self.kind {
            OptionKind::Text => " <text>".to_string(),
            OptionKind::Integer => " <integer>".to_string(),
            OptionKind::Flag { .. } => String::new(),
            OptionKind::Choice(choices) => format!(" <{}>", choices.join("|")),
        };
        let presence = match self.presence {
            Presence::Required => "  (required)".to_string(),
            Presence::Default(d) if self.takes_value() => format!("  (default: {d})"),
            _ => String::new(),
        };
        format!("--{}{arg}{presence}", self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionRule {
    Required,
    Forbidden,
}

/// The full command-line contract of one agent.
#[derive(Debug, Clone, Copy)]
pub struct OptionSchema {
    pub description: DescriptionRule,
    pub options: &'static [OptionSpec],
}

// ---------------------------------------------------------------------------
// Parsed values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Text(String),
    Integer(i64),
    Flag(bool),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Text(s) => f.write_str(s),
            OptionValue::Integer(n) => write!(f, "{n}"),
            OptionValue::Flag(b) => write!(f, "{b}"),
        }
    }
}

/// Result of parsing one agent's arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AgentArgs {
    /// Free-form words joined with single spaces, in original order.
    pub description: Option<String>,
    /// Resolved values keyed by option name (explicit or defaulted).
    pub options: BTreeMap<String, OptionValue>,
    /// The same values keyed by host setting name.
    pub settings: BTreeMap<String, String>,
}

impl AgentArgs {
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.options.get(name) {
            Some(OptionValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.options.get(name) {
            Some(OptionValue::Integer(n)) => Some(*n),
            _ => None,
        }
    }

    /// Whether a flag option was given on the command line.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.options.get(name), Some(OptionValue::Flag(true)))
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

impl OptionSchema {
    fn find(&self, name: &str) -> Option<&'static OptionSpec> {
        self.options.iter().find(|o| o.name == name)
    }

    /// Parse `args` (everything after the agent name) against this schema.
    ///
    /// Recognized `--flag value` pairs are isolated first; every other token
    /// becomes part of the description, so hyphenated words such as
    /// `e-commerce` are never mistaken for flags. A bare `--` ends option
    /// parsing.
    pub fn parse(&self, agent: &str, args: &[String]) -> Result<AgentArgs> {
        let mut words: Vec<&str> = Vec::new();
        let mut explicit: BTreeMap<&'static str, OptionValue> = BTreeMap::new();
        let mut iter = args.iter();

        while let Some(token) = iter.next() {
            if token == "--" {
                words.extend(iter.by_ref().map(String::as_str));
                break;
            }
            let Some(stripped) = token.strip_prefix("--") else {
                words.push(token);
                continue;
            };

            let (name, inline) = match stripped.split_once('=') {
                Some((n, v)) => (n, Some(v)),
                None => (stripped, None),
            };
            let spec = self
                .find(name)
                .ok_or_else(|| MastermindError::UnknownOption(token.clone()))?;

            let value = match (spec.kind, inline) {
                (OptionKind::Flag { .. }, None) => OptionValue::Flag(true),
                (OptionKind::Flag { .. }, Some(v)) => {
                    return Err(spec.invalid(v, "flag takes no value"))
                }
                (_, Some(v)) if !v.is_empty() => spec.convert(v)?,
                (_, Some(_)) => return Err(MastermindError::MissingValue(format!("--{name}"))),
                (_, None) => match iter.next() {
                    Some(v) if !v.starts_with("--") => spec.convert(v)?,
                    _ => return Err(MastermindError::MissingValue(format!("--{name}"))),
                },
            };
            explicit.insert(spec.name, value);
        }

        let mut parsed = AgentArgs::default();
        for spec in self.options {
            let value = match explicit.remove(spec.name) {
                Some(v) => v,
                None => match (spec.kind, spec.presence) {
                    (OptionKind::Flag { .. }, _) => OptionValue::Flag(false),
                    (_, Presence::Required) => {
                        return Err(MastermindError::MissingRequired(spec.name.to_string()))
                    }
                    (_, Presence::Default(d)) => spec.convert(d)?,
                    (_, Presence::Optional) => continue,
                },
            };
            parsed
                .settings
                .insert(spec.setting.to_string(), spec.setting_value(&value));
            parsed.options.insert(spec.name.to_string(), value);
        }

        let description = (!words.is_empty()).then(|| words.join(" "));
        match (self.description, &description) {
            (DescriptionRule::Required, None) => {
                return Err(MastermindError::MissingDescription(agent.to_string()))
            }
            (DescriptionRule::Forbidden, Some(_)) => {
                return Err(MastermindError::UnexpectedArgument(words[0].to_string()))
            }
            _ => {}
        }
        parsed.description = description;

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: OptionSchema = OptionSchema {
        description: DescriptionRule::Required,
        options: &[
            OptionSpec::new(
                "max-chunk-size",
                OptionKind::Integer,
                Presence::Default("2000"),
                "max_chunk_size",
                "",
            ),
            OptionSpec::new(
                "chunk-strategy",
                OptionKind::Choice(&["modular", "layered"]),
                Presence::Default("modular"),
                "chunk_strategy",
                "",
            ),
            OptionSpec::new(
                "no-tests",
                OptionKind::Flag { sets: false },
                Presence::Optional,
                "include_tests",
                "",
            ),
            OptionSpec::new("focus", OptionKind::Text, Presence::Optional, "focus", ""),
        ],
    };

    const REQUIRED: OptionSchema = OptionSchema {
        description: DescriptionRule::Forbidden,
        options: &[OptionSpec::new(
            "package",
            OptionKind::Text,
            Presence::Required,
            "package_name",
            "",
        )],
    };

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_fill_unset_options() {
        let parsed = SCHEMA.parse("gen", &args(&["an", "app"])).unwrap();
        assert_eq!(parsed.description.as_deref(), Some("an app"));
        assert_eq!(parsed.integer("max-chunk-size"), Some(2000));
        assert_eq!(parsed.text("chunk-strategy"), Some("modular"));
        assert!(!parsed.flag("no-tests"));
        assert_eq!(parsed.settings["include_tests"], "true");
        assert!(!parsed.options.contains_key("focus"));
    }

    #[test]
    fn description_words_around_flags_are_joined() {
        let parsed = SCHEMA
            .parse(
                "gen",
                &args(&["enterprise", "--no-tests", "e-commerce", "--max-chunk-size", "500", "platform"]),
            )
            .unwrap();
        assert_eq!(parsed.description.as_deref(), Some("enterprise e-commerce platform"));
        assert_eq!(parsed.integer("max-chunk-size"), Some(500));
        assert_eq!(parsed.settings["include_tests"], "false");
    }

    #[test]
    fn quoted_and_unquoted_descriptions_agree() {
        let unquoted = SCHEMA
            .parse("gen", &args(&["enterprise", "e-commerce", "platform"]))
            .unwrap();
        let quoted = SCHEMA
            .parse("gen", &args(&["enterprise e-commerce platform"]))
            .unwrap();
        assert_eq!(unquoted.description, quoted.description);
    }

    #[test]
    fn unknown_option_names_the_token() {
        let err = SCHEMA.parse("gen", &args(&["app", "--turbo"])).unwrap_err();
        assert_eq!(err.to_string(), "Unknown option: --turbo");
    }

    #[test]
    fn invalid_choice_is_rejected() {
        let err = SCHEMA
            .parse("gen", &args(&["app", "--chunk-strategy", "random"]))
            .unwrap_err();
        assert!(matches!(err, MastermindError::InvalidValue { ref option, .. } if option == "chunk-strategy"));
    }

    #[test]
    fn invalid_integer_is_rejected() {
        let err = SCHEMA
            .parse("gen", &args(&["app", "--max-chunk-size=big"]))
            .unwrap_err();
        assert!(matches!(err, MastermindError::InvalidValue { .. }));
    }

    #[test]
    fn value_option_at_end_is_missing_value() {
        let err = SCHEMA.parse("gen", &args(&["app", "--focus"])).unwrap_err();
        assert_eq!(err.to_string(), "Missing value for --focus");
    }

    #[test]
    fn flag_with_inline_value_is_invalid() {
        let err = SCHEMA
            .parse("gen", &args(&["app", "--no-tests=yes"]))
            .unwrap_err();
        assert!(matches!(err, MastermindError::InvalidValue { .. }));
    }

    #[test]
    fn missing_required_option_names_it() {
        let err = REQUIRED.parse("package-health", &[]).unwrap_err();
        assert_eq!(err.to_string(), "Missing required option: --package");
    }

    #[test]
    fn forbidden_description_rejects_stray_words() {
        let err = REQUIRED
            .parse("package-health", &args(&["--package", "left-pad", "extra"]))
            .unwrap_err();
        assert_eq!(err.to_string(), "Unexpected argument: extra");
    }

    #[test]
    fn required_description_must_be_present() {
        let err = SCHEMA.parse("gen", &args(&["--no-tests"])).unwrap_err();
        assert!(matches!(err, MastermindError::MissingDescription(_)));
    }

    #[test]
    fn double_dash_makes_the_rest_description() {
        let parsed = SCHEMA
            .parse("gen", &args(&["notes", "--", "--no-tests", "is", "a", "word"]))
            .unwrap();
        assert_eq!(parsed.description.as_deref(), Some("notes --no-tests is a word"));
        assert!(!parsed.flag("no-tests"));
    }

    #[test]
    fn usage_lines() {
        assert_eq!(SCHEMA.options[0].usage(), "--max-chunk-size <integer>  (default: 2000)");
        assert_eq!(SCHEMA.options[2].usage(), "--no-tests");
        assert_eq!(REQUIRED.options[0].usage(), "--package <text>  (required)");
    }
}
