//! The static agent registry: every agent name the dispatcher accepts, what
//! it does, which host subcommand runs it, and its option schema.

use crate::schema::{DescriptionRule, OptionKind, OptionSchema, OptionSpec, Presence};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    /// Writes a new project into the output directory.
    Generation { massive: bool },
    /// Inspects an existing project and reports back.
    Analysis,
}

#[derive(Debug, Clone, Copy)]
pub struct AgentSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub host_subcommand: &'static str,
    pub kind: AgentKind,
    pub schema: OptionSchema,
}

impl AgentSpec {
    pub fn is_generation(&self) -> bool {
        matches!(self.kind, AgentKind::Generation { .. })
    }

    pub fn is_massive(&self) -> bool {
        matches!(self.kind, AgentKind::Generation { massive: true })
    }
}

pub const CHUNK_STRATEGIES: &[&str] = &["modular", "layered", "feature", "domain"];
pub const QUALITY_LEVELS: &[&str] = &["basic", "standard", "production", "enterprise"];
const SEVERITIES: &[&str] = &["low", "medium", "high", "critical"];
const LICENSE_POLICIES: &[&str] = &["permissive", "weak-copyleft", "strict"];
const ECOSYSTEMS: &[&str] = &["npm", "pypi", "cargo", "maven", "go"];
const TELEMETRY_STANDARDS: &[&str] = &["opentelemetry", "prometheus", "datadog"];

const NO_TESTS: OptionSpec = OptionSpec::new(
    "no-tests",
    OptionKind::Flag { sets: false },
    Presence::Optional,
    "include_tests",
    "Skip generating tests",
);

const NO_DOCS: OptionSpec = OptionSpec::new(
    "no-docs",
    OptionKind::Flag { sets: false },
    Presence::Optional,
    "include_docs",
    "Skip generating documentation",
);

const PROJECT_PATH: OptionSpec = OptionSpec::new(
    "project-path",
    OptionKind::Text,
    Presence::Default("."),
    "project_path",
    "Project to inspect",
);

static AGENTS: &[AgentSpec] = &[
    AgentSpec {
        name: "generate",
        description: "Generate a complete project from a description",
        host_subcommand: "generate_code",
        kind: AgentKind::Generation { massive: false },
        schema: OptionSchema {
            description: DescriptionRule::Required,
            options: &[NO_TESTS, NO_DOCS],
        },
    },
    AgentSpec {
        name: "chunked-generation",
        description: "Generate a massive multi-module project in dependency-ordered chunks",
        host_subcommand: "chunked_generation",
        kind: AgentKind::Generation { massive: true },
        schema: OptionSchema {
            description: DescriptionRule::Required,
            options: &[
                OptionSpec::new(
                    "max-chunk-size",
                    OptionKind::Integer,
                    Presence::Default("2000"),
                    "max_chunk_size",
                    "Upper bound on lines per chunk",
                ),
                OptionSpec::new(
                    "chunk-strategy",
                    OptionKind::Choice(CHUNK_STRATEGIES),
                    Presence::Default("modular"),
                    "chunk_strategy",
                    "How the project is split into chunks",
                ),
                OptionSpec::new(
                    "quality-level",
                    OptionKind::Choice(QUALITY_LEVELS),
                    Presence::Default("production"),
                    "quality_level",
                    "Target code quality",
                ),
                OptionSpec::new(
                    "max-parallel",
                    OptionKind::Integer,
                    Presence::Default("3"),
                    "max_parallel",
                    "Chunks generated concurrently by the host",
                ),
                NO_TESTS,
                NO_DOCS,
            ],
        },
    },
    AgentSpec {
        name: "code-review",
        description: "Review local changes against a target branch",
        host_subcommand: "code_review",
        kind: AgentKind::Analysis,
        schema: OptionSchema {
            description: DescriptionRule::Forbidden,
            options: &[
                OptionSpec::new(
                    "target-branch",
                    OptionKind::Text,
                    Presence::Default("main"),
                    "target_branch",
                    "Branch to diff against",
                ),
                OptionSpec::new(
                    "severity",
                    OptionKind::Choice(SEVERITIES),
                    Presence::Default("medium"),
                    "severity_threshold",
                    "Lowest severity to report",
                ),
                OptionSpec::new(
                    "focus",
                    OptionKind::Text,
                    Presence::Optional,
                    "focus",
                    "Area to concentrate on (e.g. security)",
                ),
                OptionSpec::new(
                    "background",
                    OptionKind::Flag { sets: true },
                    Presence::Optional,
                    "background",
                    "Run detached; check progress with --jobs",
                ),
            ],
        },
    },
    AgentSpec {
        name: "license-compliance",
        description: "Scan dependencies for license conflicts",
        host_subcommand: "license_compliance",
        kind: AgentKind::Analysis,
        schema: OptionSchema {
            description: DescriptionRule::Forbidden,
            options: &[
                PROJECT_PATH,
                OptionSpec::new(
                    "policy",
                    OptionKind::Choice(LICENSE_POLICIES),
                    Presence::Default("permissive"),
                    "policy",
                    "License policy to enforce",
                ),
                OptionSpec::new(
                    "fail-on-violation",
                    OptionKind::Flag { sets: true },
                    Presence::Optional,
                    "fail_on_violation",
                    "Treat violations as failures",
                ),
            ],
        },
    },
    AgentSpec {
        name: "package-health",
        description: "Score the maintenance health of a package",
        host_subcommand: "package_health",
        kind: AgentKind::Analysis,
        schema: OptionSchema {
            description: DescriptionRule::Forbidden,
            options: &[
                OptionSpec::new(
                    "package",
                    OptionKind::Text,
                    Presence::Required,
                    "package_name",
                    "Package to score",
                ),
                OptionSpec::new(
                    "ecosystem",
                    OptionKind::Choice(ECOSYSTEMS),
                    Presence::Default("npm"),
                    "ecosystem",
                    "Package registry",
                ),
                OptionSpec::new(
                    "min-score",
                    OptionKind::Integer,
                    Presence::Default("70"),
                    "min_score",
                    "Score below which the package is flagged",
                ),
            ],
        },
    },
    AgentSpec {
        name: "observability",
        description: "Enforce logging, metrics and tracing conventions",
        host_subcommand: "observability_enforcer",
        kind: AgentKind::Analysis,
        schema: OptionSchema {
            description: DescriptionRule::Forbidden,
            options: &[
                PROJECT_PATH,
                OptionSpec::new(
                    "standard",
                    OptionKind::Choice(TELEMETRY_STANDARDS),
                    Presence::Default("opentelemetry"),
                    "standard",
                    "Telemetry convention to check against",
                ),
                OptionSpec::new(
                    "auto-fix",
                    OptionKind::Flag { sets: true },
                    Presence::Optional,
                    "auto_fix",
                    "Apply fixes in place",
                ),
            ],
        },
    },
    AgentSpec {
        name: "clean-code",
        description: "Flag code smells and suggest refactorings",
        host_subcommand: "clean_code",
        kind: AgentKind::Analysis,
        schema: OptionSchema {
            description: DescriptionRule::Forbidden,
            options: &[
                OptionSpec::new(
                    "path",
                    OptionKind::Text,
                    Presence::Default("."),
                    "path",
                    "File or directory to inspect",
                ),
                OptionSpec::new(
                    "max-function-length",
                    OptionKind::Integer,
                    Presence::Default("50"),
                    "max_function_length",
                    "Longest acceptable function, in lines",
                ),
            ],
        },
    },
    AgentSpec {
        name: "codegraph-navigator",
        description: "Answer questions about a codebase's structure",
        host_subcommand: "codegraph_navigator",
        kind: AgentKind::Analysis,
        schema: OptionSchema {
            description: DescriptionRule::Required,
            options: &[OptionSpec::new(
                "path",
                OptionKind::Text,
                Presence::Default("."),
                "path",
                "Repository root",
            )],
        },
    },
];

/// All registered agents, in display order.
pub fn all() -> &'static [AgentSpec] {
    AGENTS
}

/// Exact-match lookup. No prefix matching, no case folding.
pub fn lookup(name: &str) -> Option<&'static AgentSpec> {
    AGENTS.iter().find(|a| a.name == name)
}
