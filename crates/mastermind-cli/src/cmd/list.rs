use std::fmt::Write as _;

use mastermind_core::registry::{self, AgentKind, AgentSpec};
use mastermind_core::schema::DescriptionRule;
use serde::Serialize;

use crate::output::{print_json, print_table};

#[derive(Serialize)]
struct AgentEntry {
    name: &'static str,
    description: &'static str,
    host_subcommand: &'static str,
    kind: &'static str,
    takes_description: &'static str,
    options: Vec<OptionEntry>,
}

#[derive(Serialize)]
struct OptionEntry {
    usage: String,
    help: &'static str,
}

fn kind_label(spec: &AgentSpec) -> &'static str {
    match spec.kind {
        AgentKind::Generation { massive: false } => "generation",
        AgentKind::Generation { massive: true } => "massive generation",
        AgentKind::Analysis => "analysis",
    }
}

fn description_label(rule: DescriptionRule) -> &'static str {
    match rule {
        DescriptionRule::Required => "required",
        DescriptionRule::Forbidden => "none",
    }
}

/// `--list-agents`
pub fn run(json: bool) -> anyhow::Result<()> {
    if json {
        let entries: Vec<AgentEntry> = registry::all()
            .iter()
            .map(|spec| AgentEntry {
                name: spec.name,
                description: spec.description,
                host_subcommand: spec.host_subcommand,
                kind: kind_label(spec),
                takes_description: description_label(spec.schema.description),
                options: spec
                    .schema
                    .options
                    .iter()
                    .map(|o| OptionEntry {
                        usage: o.usage(),
                        help: o.help,
                    })
                    .collect(),
            })
            .collect();
        return print_json(&entries);
    }

    let rows = registry::all()
        .iter()
        .map(|spec| {
            vec![
                spec.name.to_string(),
                kind_label(spec).to_string(),
                spec.description.to_string(),
            ]
        })
        .collect();
    print_table(&["AGENT", "KIND", "DESCRIPTION"], rows);
    Ok(())
}

/// One indented line per agent, for hints on stderr.
pub fn agent_lines() -> String {
    let width = registry::all().iter().map(|s| s.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for spec in registry::all() {
        let _ = writeln!(out, "  {:width$}  {}", spec.name, spec.description);
    }
    out
}

pub fn usage() -> String {
    let mut out = String::from(
        "Usage: mastermind [--config <path>] [--host <bin>] [--json] <agent> [description…] [options]\n\
         \n\
         Built-ins:\n\
         \x20 --help, -h        Show this help\n\
         \x20 --list-agents     List available agents\n\
         \x20 --interactive     Prompt for agents and descriptions on stdin\n\
         \x20 --jobs [<id> [--cancel|--wait]]  List, inspect, cancel or wait for background jobs\n\
         \x20 --version         Print the version\n\
         \n\
         Global options (before or after the agent name):\n\
         \x20 --language <lang>       Target language (default: python)\n\
         \x20 --framework <name>      Target framework\n\
         \x20 --output-dir <dir>      Base directory for generated projects (default: generated)\n\
         \x20 --project-name <name>   Name of the generated project directory\n\
         \x20 --git                   Initialise a git repository in the generated project\n\
         \x20 --verbose, -v           Debug logging\n\
         \n\
         Agents:\n",
    );
    for spec in registry::all() {
        let _ = writeln!(out, "  {}  {}", spec.name, spec.description);
        if spec.schema.description == DescriptionRule::Required {
            let _ = writeln!(out, "      <description>  (required)");
        }
        for opt in spec.schema.options {
            let _ = writeln!(out, "      {}", opt.usage());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_mentions_every_agent_and_builtin() {
        let text = usage();
        for spec in registry::all() {
            assert!(text.contains(spec.name), "missing {}", spec.name);
        }
        for builtin in ["--list-agents", "--interactive", "--jobs", "--git"] {
            assert!(text.contains(builtin));
        }
        assert!(text.contains("--package <text>  (required)"));
    }

    #[test]
    fn agent_lines_are_aligned() {
        let lines = agent_lines();
        assert_eq!(lines.lines().count(), registry::all().len());
        assert!(lines.lines().all(|l| l.starts_with("  ")));
    }
}
