//! Up-front sizing of a chunked generation request.
//!
//! The host does the actual chunking; this gives it (and the user) a rough
//! plan: what kind of project the description asks for, how complex it is,
//! how many lines that implies, how the work splits into dependent chunks,
//! and which architecture choices follow from the description.
//!
//! Terms are matched on word boundaries, so `ai` does not match `email`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::MastermindError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    WebApplication,
    MachineLearning,
    GameDevelopment,
    Microservices,
    DataPlatform,
    MobileApplication,
    DesktopApplication,
    EnterpriseSoftware,
}

impl ProjectType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectType::WebApplication => "web_application",
            ProjectType::MachineLearning => "machine_learning",
            ProjectType::GameDevelopment => "game_development",
            ProjectType::Microservices => "microservices",
            ProjectType::DataPlatform => "data_platform",
            ProjectType::MobileApplication => "mobile_application",
            ProjectType::DesktopApplication => "desktop_application",
            ProjectType::EnterpriseSoftware => "enterprise_software",
        }
    }
}

/// How the host is asked to split the project. Recorded in the plan; the
/// chunk layout itself is chosen by project type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    #[default]
    Modular,
    Layered,
    Feature,
    Domain,
}

impl ChunkStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            ChunkStrategy::Modular => "modular",
            ChunkStrategy::Layered => "layered",
            ChunkStrategy::Feature => "feature",
            ChunkStrategy::Domain => "domain",
        }
    }
}

impl fmt::Display for ChunkStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChunkStrategy {
    type Err = MastermindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "modular" => Ok(ChunkStrategy::Modular),
            "layered" => Ok(ChunkStrategy::Layered),
            "feature" => Ok(ChunkStrategy::Feature),
            "domain" => Ok(ChunkStrategy::Domain),
            other => Err(MastermindError::InvalidValue {
                option: "chunk-strategy".into(),
                value: other.into(),
                reason: "expected one of modular, layered, feature, domain".into(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Term tables
// ---------------------------------------------------------------------------

/// A list of words compiled once into a single word-bounded alternation.
struct Terms {
    words: &'static [&'static str],
    re: OnceLock<Regex>,
}

impl Terms {
    const fn new(words: &'static [&'static str]) -> Self {
        Self {
            words,
            re: OnceLock::new(),
        }
    }

    fn regex(&self) -> &Regex {
        self.re.get_or_init(|| word_alternation(self.words))
    }

    fn matches(&self, text: &str) -> bool {
        self.regex().is_match(text)
    }

    fn count(&self, text: &str) -> usize {
        self.regex().find_iter(text).count()
    }
}

fn word_alternation(words: &[&str]) -> Regex {
    let alternation = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{alternation})\b")).expect("escaped terms form a valid regex")
}

/// Checked in order; the first table with a matching term wins.
static TYPE_TERMS: [(ProjectType, Terms); 7] = [
    (
        ProjectType::WebApplication,
        Terms::new(&[
            "web app", "website", "web application", "api", "rest", "graphql", "frontend",
            "backend", "full stack", "web service", "web platform",
        ]),
    ),
    (
        ProjectType::MachineLearning,
        Terms::new(&[
            "machine learning", "ml", "ai", "neural network", "deep learning", "data science",
            "model", "training", "prediction", "classification", "regression", "nlp",
            "computer vision", "tensorflow", "pytorch",
        ]),
    ),
    (
        ProjectType::GameDevelopment,
        Terms::new(&[
            "game", "gaming", "unity", "unreal", "pygame", "game engine", "graphics",
            "rendering", "physics", "gameplay", "2d", "3d",
        ]),
    ),
    (
        ProjectType::Microservices,
        Terms::new(&[
            "microservice", "microservices", "distributed", "service mesh", "kubernetes",
            "docker", "containerized", "scalable architecture",
        ]),
    ),
    (
        ProjectType::DataPlatform,
        Terms::new(&[
            "data platform", "data pipeline", "etl", "data warehouse", "analytics", "big data",
            "data processing", "streaming",
        ]),
    ),
    (
        ProjectType::MobileApplication,
        Terms::new(&[
            "mobile app", "android", "ios", "react native", "flutter", "mobile application",
            "smartphone", "tablet",
        ]),
    ),
    (
        ProjectType::DesktopApplication,
        Terms::new(&[
            "desktop app", "desktop application", "gui", "tkinter", "qt", "electron",
            "native app", "windows app", "mac app",
        ]),
    ),
];

static SIMPLE_TERMS: Terms = Terms::new(&["simple", "basic", "minimal", "quick", "small"]);
static COMPLEX_TERMS: Terms =
    Terms::new(&["complex", "advanced", "enterprise", "large", "comprehensive"]);
static VERY_COMPLEX_TERMS: Terms =
    Terms::new(&["massive", "huge", "extensive", "full-featured", "complete"]);
static HEAVY_TECH_TERMS: Terms =
    Terms::new(&["kubernetes", "microservices", "machine learning", "blockchain", "ai"]);
static FEATURE_TERMS: Terms =
    Terms::new(&["feature", "function", "capability", "module", "component"]);
static SERVICE_TERMS: Terms = Terms::new(&["service", "microservice", "domain", "module"]);
static FRONTEND_TERMS: Terms = Terms::new(&["frontend", "ui", "interface", "web interface"]);
static DATABASE_TERMS: Terms = Terms::new(&["database", "sql"]);
static API_TERMS: Terms = Terms::new(&["api", "rest"]);
static TEST_TERMS: Terms = Terms::new(&["test", "tests", "testing"]);
static DATABASE_WORD: Terms = Terms::new(&["database"]);
static NOSQL_TERMS: Terms = Terms::new(&["nosql"]);
static CLOUD_TERMS: Terms = Terms::new(&["cloud", "aws"]);
static DOCKER_TERMS: Terms = Terms::new(&["docker"]);

/// Estimated total lines indexed by complexity score (1..=10).
const LINES_BY_SCORE: [u64; 10] = [
    500, 1_000, 2_500, 5_000, 10_000, 20_000, 40_000, 80_000, 150_000, 300_000,
];

pub const DEFAULT_MAX_CHUNK_SIZE: u64 = 2000;
const MIN_CHUNKS: u64 = 2;
const MAX_CHUNKS: u64 = 10;
const MIN_SERVICES: usize = 2;
const MAX_SERVICES: usize = 5;

// ---------------------------------------------------------------------------
// Chunk layouts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Tech {
    Language,
    Framework,
    Named(&'static str),
}

/// A fixed chunk in a per-type layout. `lines` is capped by the requested
/// maximum chunk size.
struct ChunkTemplate {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    depends_on: &'static [&'static str],
    lines: u64,
    priority: u32,
    complexity: &'static str,
    files: &'static [&'static str],
    interfaces: &'static [(&'static str, &'static str)],
    technologies: &'static [Tech],
}

const WEB_CORE: &[ChunkTemplate] = &[
    ChunkTemplate {
        id: "core_infrastructure",
        name: "Core Infrastructure",
        description: "Project setup, configuration, and core utilities",
        depends_on: &[],
        lines: 1_500,
        priority: 1,
        complexity: "medium",
        files: &[
            "requirements.txt", "setup.py", "config.py", "utils.py", "constants.py",
            "exceptions.py", "logging_config.py",
        ],
        interfaces: &[("config", "Configuration management"), ("utils", "Utility functions")],
        technologies: &[Tech::Language, Tech::Framework],
    },
    ChunkTemplate {
        id: "database_models",
        name: "Database Models",
        description: "Data models, schemas, and database configuration",
        depends_on: &["core_infrastructure"],
        lines: 2_000,
        priority: 2,
        complexity: "medium",
        files: &["models.py", "database.py", "migrations/", "schemas.py"],
        interfaces: &[("models", "Data models"), ("database", "Database connection")],
        technologies: &[Tech::Language, Tech::Named("database")],
    },
    ChunkTemplate {
        id: "api_backend",
        name: "API Backend",
        description: "REST API endpoints, business logic, and services",
        depends_on: &["core_infrastructure", "database_models"],
        lines: 3_000,
        priority: 3,
        complexity: "high",
        files: &["api/", "services/", "controllers/", "middleware/", "auth.py"],
        interfaces: &[("api", "REST endpoints"), ("services", "Business logic")],
        technologies: &[Tech::Language, Tech::Framework, Tech::Named("api")],
    },
];

static WEB_FRONTEND: ChunkTemplate = ChunkTemplate {
    id: "frontend_ui",
    name: "Frontend UI",
    description: "User interface components and frontend logic",
    depends_on: &["api_backend"],
    lines: 2_500,
    priority: 4,
    complexity: "medium",
    files: &["templates/", "static/", "components/", "pages/"],
    interfaces: &[("ui", "User interface"), ("components", "Reusable components")],
    technologies: &[Tech::Named("html"), Tech::Named("css"), Tech::Named("javascript")],
};

const WEB_TAIL: &[ChunkTemplate] = &[
    ChunkTemplate {
        id: "auth_security",
        name: "Authentication & Security",
        description: "User authentication, authorization, and security features",
        depends_on: &["database_models"],
        lines: 1_800,
        priority: 5,
        complexity: "high",
        files: &["auth/", "security/", "permissions.py", "jwt_handler.py"],
        interfaces: &[("auth", "Authentication"), ("security", "Security utilities")],
        technologies: &[Tech::Language, Tech::Named("security")],
    },
    ChunkTemplate {
        id: "testing_suite",
        name: "Testing Suite",
        description: "Comprehensive test suite for all components",
        depends_on: &["api_backend", "auth_security"],
        lines: 2_000,
        priority: 6,
        complexity: "medium",
        files: &["tests/", "test_config.py", "fixtures/", "test_utils.py"],
        interfaces: &[("tests", "Test utilities")],
        technologies: &[Tech::Language, Tech::Named("testing")],
    },
];

const ML_CHUNKS: &[ChunkTemplate] = &[
    ChunkTemplate {
        id: "data_preprocessing",
        name: "Data Preprocessing",
        description: "Data loading, cleaning, and preprocessing pipelines",
        depends_on: &[],
        lines: 2_000,
        priority: 1,
        complexity: "medium",
        files: &["data/", "preprocessing.py", "data_loader.py", "feature_engineering.py"],
        interfaces: &[("data", "Data loading"), ("preprocessing", "Data preprocessing")],
        technologies: &[Tech::Language, Tech::Named("pandas"), Tech::Named("numpy")],
    },
    ChunkTemplate {
        id: "model_architecture",
        name: "Model Architecture",
        description: "Neural network architectures and model definitions",
        depends_on: &["data_preprocessing"],
        lines: 2_500,
        priority: 2,
        complexity: "high",
        files: &["models/", "architectures.py", "layers.py", "model_utils.py"],
        interfaces: &[
            ("models", "Model definitions"),
            ("architectures", "Network architectures"),
        ],
        technologies: &[Tech::Language, Tech::Framework, Tech::Named("ml")],
    },
    ChunkTemplate {
        id: "training_pipeline",
        name: "Training Pipeline",
        description: "Model training, validation, and optimization",
        depends_on: &["model_architecture"],
        lines: 2_200,
        priority: 3,
        complexity: "high",
        files: &["training/", "trainer.py", "optimizer.py", "scheduler.py"],
        interfaces: &[("training", "Training pipeline"), ("trainer", "Model trainer")],
        technologies: &[Tech::Language, Tech::Framework, Tech::Named("training")],
    },
    ChunkTemplate {
        id: "evaluation_metrics",
        name: "Evaluation & Metrics",
        description: "Model evaluation, metrics, and performance analysis",
        depends_on: &["training_pipeline"],
        lines: 1_500,
        priority: 4,
        complexity: "medium",
        files: &["evaluation/", "metrics.py", "visualizations.py", "reports.py"],
        interfaces: &[("evaluation", "Model evaluation"), ("metrics", "Performance metrics")],
        technologies: &[Tech::Language, Tech::Named("visualization")],
    },
    ChunkTemplate {
        id: "inference_service",
        name: "Inference Service",
        description: "Model serving and inference API",
        depends_on: &["model_architecture"],
        lines: 1_800,
        priority: 5,
        complexity: "medium",
        files: &["inference/", "api.py", "model_server.py", "prediction.py"],
        interfaces: &[("inference", "Model inference"), ("api", "Inference API")],
        technologies: &[Tech::Language, Tech::Named("api"), Tech::Named("serving")],
    },
];

const GAME_CHUNKS: &[ChunkTemplate] = &[
    ChunkTemplate {
        id: "game_engine_core",
        name: "Game Engine Core",
        description: "Core game engine systems and utilities",
        depends_on: &[],
        lines: 2_500,
        priority: 1,
        complexity: "high",
        files: &["engine/", "core.py", "game_loop.py", "time_manager.py"],
        interfaces: &[("engine", "Game engine"), ("core", "Core systems")],
        technologies: &[Tech::Language, Tech::Framework],
    },
    ChunkTemplate {
        id: "graphics_rendering",
        name: "Graphics & Rendering",
        description: "Graphics rendering, sprites, and visual effects",
        depends_on: &["game_engine_core"],
        lines: 2_200,
        priority: 2,
        complexity: "high",
        files: &["graphics/", "renderer.py", "sprites.py", "effects.py"],
        interfaces: &[("graphics", "Graphics system"), ("renderer", "Rendering engine")],
        technologies: &[Tech::Language, Tech::Named("graphics")],
    },
    ChunkTemplate {
        id: "game_mechanics",
        name: "Game Mechanics",
        description: "Core gameplay mechanics and systems",
        depends_on: &["game_engine_core"],
        lines: 2_000,
        priority: 3,
        complexity: "medium",
        files: &["mechanics/", "player.py", "entities.py", "physics.py"],
        interfaces: &[("mechanics", "Game mechanics"), ("entities", "Game entities")],
        technologies: &[Tech::Language, Tech::Named("physics")],
    },
];

const MICROSERVICE_BASE: &[ChunkTemplate] = &[
    ChunkTemplate {
        id: "service_discovery",
        name: "Service Discovery",
        description: "Service registry, discovery, and configuration management",
        depends_on: &[],
        lines: 1_500,
        priority: 1,
        complexity: "medium",
        files: &["discovery/", "registry.py", "config_service.py", "health_check.py"],
        interfaces: &[("discovery", "Service discovery"), ("config", "Configuration")],
        technologies: &[Tech::Language, Tech::Named("microservices")],
    },
    ChunkTemplate {
        id: "api_gateway",
        name: "API Gateway",
        description: "API gateway for routing and load balancing",
        depends_on: &["service_discovery"],
        lines: 2_000,
        priority: 2,
        complexity: "high",
        files: &["gateway/", "router.py", "load_balancer.py", "middleware.py"],
        interfaces: &[("gateway", "API gateway"), ("router", "Request routing")],
        technologies: &[Tech::Language, Tech::Named("gateway")],
    },
];

const SERVICE_LINES: u64 = 1_800;

const DATA_PLATFORM_CHUNKS: &[ChunkTemplate] = &[
    ChunkTemplate {
        id: "data_ingestion",
        name: "Data Ingestion",
        description: "Data ingestion pipelines and connectors",
        depends_on: &[],
        lines: 2_000,
        priority: 1,
        complexity: "medium",
        files: &["ingestion/", "connectors.py", "pipelines.py", "streaming.py"],
        interfaces: &[("ingestion", "Data ingestion"), ("connectors", "Data connectors")],
        technologies: &[Tech::Language, Tech::Named("data")],
    },
    ChunkTemplate {
        id: "data_processing",
        name: "Data Processing",
        description: "ETL pipelines and data transformation",
        depends_on: &["data_ingestion"],
        lines: 2_500,
        priority: 2,
        complexity: "high",
        files: &["processing/", "etl.py", "transformations.py", "validators.py"],
        interfaces: &[("processing", "Data processing"), ("etl", "ETL pipelines")],
        technologies: &[Tech::Language, Tech::Named("etl")],
    },
    ChunkTemplate {
        id: "data_storage",
        name: "Data Storage",
        description: "Data warehouse and storage management",
        depends_on: &["data_processing"],
        lines: 1_800,
        priority: 3,
        complexity: "medium",
        files: &["storage/", "warehouse.py", "partitioning.py", "indexing.py"],
        interfaces: &[("storage", "Data storage"), ("warehouse", "Data warehouse")],
        technologies: &[Tech::Language, Tech::Named("database")],
    },
];

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkPlan {
    pub id: String,
    pub name: String,
    pub description: String,
    pub depends_on: Vec<String>,
    pub estimated_lines: u64,
    pub priority: u32,
    pub complexity: &'static str,
    pub files: Vec<String>,
    pub interfaces: BTreeMap<String, String>,
    pub technologies: Vec<String>,
}

/// Inputs besides the description.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisOptions<'a> {
    pub language: &'a str,
    pub framework: Option<&'a str>,
    pub max_chunk_size: u64,
    pub strategy: ChunkStrategy,
}

impl Default for AnalysisOptions<'_> {
    fn default() -> Self {
        Self {
            language: "python",
            framework: None,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            strategy: ChunkStrategy::default(),
        }
    }
}

impl AnalysisOptions<'_> {
    fn technology(&self, tech: Tech) -> Option<String> {
        match tech {
            Tech::Language => Some(self.language.to_string()),
            Tech::Framework => self.framework.filter(|f| !f.is_empty()).map(str::to_string),
            Tech::Named(name) => Some(name.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectAnalysis {
    pub project_type: ProjectType,
    pub complexity: u8,
    pub estimated_lines: u64,
    pub chunk_strategy: ChunkStrategy,
    pub chunks: Vec<ChunkPlan>,
    pub global_dependencies: Vec<String>,
    pub architecture_decisions: BTreeMap<String, String>,
    pub estimated_duration: String,
}

impl ProjectAnalysis {
    /// Extra `--set` pairs describing the plan.
    pub fn settings(&self) -> Vec<(String, String)> {
        let mut out = vec![
            ("project_type".into(), self.project_type.as_str().into()),
            ("complexity".into(), self.complexity.to_string()),
            ("estimated_lines".into(), self.estimated_lines.to_string()),
            ("chunk_count".into(), self.chunks.len().to_string()),
            (
                "chunk_ids".into(),
                self.chunks
                    .iter()
                    .map(|c| c.id.as_str())
                    .collect::<Vec<_>>()
                    .join(","),
            ),
        ];
        if let Some(pattern) = self.architecture_decisions.get("architecture_pattern") {
            out.push(("architecture_pattern".into(), pattern.clone()));
        }
        if !self.global_dependencies.is_empty() {
            out.push((
                "global_dependencies".into(),
                self.global_dependencies.join(","),
            ));
        }
        out
    }
}

pub fn identify_project_type(description: &str) -> ProjectType {
    let text = description.to_lowercase();
    TYPE_TERMS
        .iter()
        .find(|(_, terms)| terms.matches(&text))
        .map(|(ty, _)| *ty)
        .unwrap_or(ProjectType::EnterpriseSoftware)
}

/// Complexity on a 1..=10 scale, starting from 5.
pub fn estimate_complexity(description: &str) -> u8 {
    let text = description.to_lowercase();
    let mut score: u8 = 5;

    if SIMPLE_TERMS.matches(&text) {
        score = score.saturating_sub(2).max(1);
    } else if COMPLEX_TERMS.matches(&text) {
        score = (score + 2).min(8);
    } else if VERY_COMPLEX_TERMS.matches(&text) {
        score = (score + 4).min(10);
    }

    let features = FEATURE_TERMS.count(&text);
    if features > 10 {
        score = (score + 2).min(10);
    } else if features > 5 {
        score = (score + 1).min(10);
    }

    if HEAVY_TECH_TERMS.matches(&text) {
        score = (score + 1).min(10);
    }

    score
}

pub fn estimate_lines(complexity: u8) -> u64 {
    let idx = usize::from(complexity.clamp(1, 10)) - 1;
    LINES_BY_SCORE[idx]
}

fn from_template(t: &ChunkTemplate, opts: &AnalysisOptions) -> ChunkPlan {
    ChunkPlan {
        id: t.id.into(),
        name: t.name.into(),
        description: t.description.into(),
        depends_on: t.depends_on.iter().map(|d| d.to_string()).collect(),
        estimated_lines: t.lines.min(opts.max_chunk_size.max(1)),
        priority: t.priority,
        complexity: t.complexity,
        files: t.files.iter().map(|f| f.to_string()).collect(),
        interfaces: t
            .interfaces
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        technologies: t
            .technologies
            .iter()
            .filter_map(|&tech| opts.technology(tech))
            .collect(),
    }
}

fn web_chunks(text: &str, opts: &AnalysisOptions) -> Vec<ChunkPlan> {
    let frontend = FRONTEND_TERMS.matches(text).then_some(&WEB_FRONTEND);
    WEB_CORE
        .iter()
        .chain(frontend)
        .chain(WEB_TAIL)
        .map(|t| from_template(t, opts))
        .collect()
}

/// One service per `service`/`domain`/`module` mention, between 2 and 5.
fn microservice_chunks(text: &str, opts: &AnalysisOptions) -> Vec<ChunkPlan> {
    let services = SERVICE_TERMS.count(text).clamp(MIN_SERVICES, MAX_SERVICES);
    let mut chunks: Vec<ChunkPlan> = MICROSERVICE_BASE
        .iter()
        .map(|t| from_template(t, opts))
        .collect();

    for i in 1..=services {
        let id = format!("service_{i}");
        chunks.push(ChunkPlan {
            name: format!("Service {i}"),
            description: format!("Microservice {i} implementation"),
            depends_on: vec!["service_discovery".into()],
            estimated_lines: SERVICE_LINES.min(opts.max_chunk_size.max(1)),
            priority: 2 + i as u32,
            complexity: "medium",
            files: vec![format!("services/{id}/"), format!("{id}_api.py")],
            interfaces: BTreeMap::from([(id.clone(), format!("Service {i} API"))]),
            technologies: [Tech::Language, Tech::Framework]
                .into_iter()
                .filter_map(|tech| opts.technology(tech))
                .collect(),
            id,
        });
    }
    chunks
}

/// A linear chain of module chunks: each depends on the one before it.
pub fn plan_chunks(estimated_lines: u64, max_chunk_size: u64) -> Vec<ChunkPlan> {
    let max_chunk_size = max_chunk_size.max(1);
    let count = (estimated_lines / max_chunk_size + 1).clamp(MIN_CHUNKS, MAX_CHUNKS);
    let per_chunk = (estimated_lines / count).min(max_chunk_size);

    (1..=count)
        .map(|i| ChunkPlan {
            id: format!("module_{i}"),
            name: format!("Module {i}"),
            description: format!("Project module {i}"),
            depends_on: if i > 1 {
                vec![format!("module_{}", i - 1)]
            } else {
                Vec::new()
            },
            estimated_lines: per_chunk,
            priority: i as u32,
            complexity: "medium",
            files: vec![format!("module_{i}.py")],
            interfaces: BTreeMap::from([(format!("module_{i}"), format!("Module {i} interface"))]),
            technologies: Vec::new(),
        })
        .collect()
}

fn chunks_for(
    project_type: ProjectType,
    text: &str,
    estimated_lines: u64,
    opts: &AnalysisOptions,
) -> Vec<ChunkPlan> {
    let from = |layout: &[ChunkTemplate]| -> Vec<ChunkPlan> {
        layout.iter().map(|t| from_template(t, opts)).collect()
    };
    match project_type {
        ProjectType::WebApplication => web_chunks(text, opts),
        ProjectType::MachineLearning => from(ML_CHUNKS),
        ProjectType::GameDevelopment => from(GAME_CHUNKS),
        ProjectType::Microservices => microservice_chunks(text, opts),
        ProjectType::DataPlatform => from(DATA_PLATFORM_CHUNKS),
        ProjectType::MobileApplication
        | ProjectType::DesktopApplication
        | ProjectType::EnterpriseSoftware => {
            let mut chunks = plan_chunks(estimated_lines, opts.max_chunk_size);
            for chunk in &mut chunks {
                chunk.technologies.push(opts.language.to_string());
            }
            chunks
        }
    }
}

/// Toolchain prerequisites for the language, the framework, and whatever the
/// description mentions.
pub fn global_dependencies(description: &str, language: &str, framework: Option<&str>) -> Vec<String> {
    let text = description.to_lowercase();
    let mut deps: Vec<String> = match language {
        "python" => vec!["python>=3.8".into(), "pip".into(), "virtualenv".into()],
        "javascript" => vec!["node.js".into(), "npm".into()],
        "java" => vec!["java".into(), "maven".into()],
        _ => Vec::new(),
    };
    if let Some(framework) = framework.filter(|f| !f.is_empty()) {
        deps.push(framework.to_string());
    }
    if DATABASE_TERMS.matches(&text) {
        deps.push("database".into());
    }
    if API_TERMS.matches(&text) {
        deps.push("api_framework".into());
    }
    if TEST_TERMS.matches(&text) {
        deps.push("testing_framework".into());
    }
    deps
}

pub fn architecture_decisions(
    description: &str,
    project_type: ProjectType,
    language: &str,
    framework: Option<&str>,
) -> BTreeMap<String, String> {
    let text = description.to_lowercase();
    let framework = framework.filter(|f| !f.is_empty());
    let mut decisions = BTreeMap::new();
    let mut decide = |key: &str, value: &str| {
        decisions.insert(key.to_string(), value.to_string());
    };

    decide("primary_language", language);
    if let Some(framework) = framework {
        decide("primary_framework", framework);
    }

    match project_type {
        ProjectType::WebApplication => {
            let pattern = if framework.is_some() { "Framework-specific" } else { "MVC" };
            decide("architecture_pattern", pattern);
            decide("api_style", "REST");
        }
        ProjectType::Microservices => {
            decide("architecture_pattern", "Microservices");
            decide("communication", "HTTP/gRPC");
        }
        ProjectType::MachineLearning => {
            decide("architecture_pattern", "Pipeline");
            decide("model_serving", "API");
        }
        _ => {}
    }

    if DATABASE_WORD.matches(&text) {
        let kind = if NOSQL_TERMS.matches(&text) { "NoSQL" } else { "SQL" };
        decide("database_type", kind);
    }

    if CLOUD_TERMS.matches(&text) {
        decide("deployment_target", "Cloud");
    } else if DOCKER_TERMS.matches(&text) {
        decide("containerization", "Docker");
    }

    decisions
}

/// Rough wall-clock estimate: 0.1 s per line scaled by complexity, plus 30 s
/// of coordination per chunk.
pub fn estimate_duration(estimated_lines: u64, complexity: u8, chunk_count: usize) -> String {
    let multiplier = 1.0 + (f64::from(complexity) - 5.0) * 0.2;
    let total = estimated_lines as f64 * 0.1 * multiplier + chunk_count as f64 * 30.0;
    let secs = total.max(0.0) as u64;

    if secs < 60 {
        format!("{secs} seconds")
    } else if secs < 3600 {
        format!("{} minutes", secs / 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

pub fn analyze(description: &str, opts: &AnalysisOptions) -> ProjectAnalysis {
    let text = description.to_lowercase();
    let project_type = identify_project_type(description);
    let complexity = estimate_complexity(description);
    let estimated_lines = estimate_lines(complexity);
    let chunks = chunks_for(project_type, &text, estimated_lines, opts);
    let estimated_duration = estimate_duration(estimated_lines, complexity, chunks.len());

    ProjectAnalysis {
        project_type,
        complexity,
        estimated_lines,
        chunk_strategy: opts.strategy,
        chunks,
        global_dependencies: global_dependencies(description, opts.language, opts.framework),
        architecture_decisions: architecture_decisions(
            description,
            project_type,
            opts.language,
            opts.framework,
        ),
        estimated_duration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(analysis: &ProjectAnalysis) -> Vec<&str> {
        analysis.chunks.iter().map(|c| c.id.as_str()).collect()
    }

    fn chunk<'a>(analysis: &'a ProjectAnalysis, id: &str) -> &'a ChunkPlan {
        analysis.chunks.iter().find(|c| c.id == id).unwrap()
    }

    #[test]
    fn identifies_web_application() {
        assert_eq!(
            identify_project_type("A REST API for invoices"),
            ProjectType::WebApplication
        );
        assert_eq!(
            identify_project_type("a full stack web platform"),
            ProjectType::WebApplication
        );
    }

    #[test]
    fn identifies_other_types() {
        assert_eq!(identify_project_type("a pygame platformer"), ProjectType::GameDevelopment);
        assert_eq!(identify_project_type("a physics engine"), ProjectType::GameDevelopment);
        assert_eq!(identify_project_type("a churn regression"), ProjectType::MachineLearning);
        assert_eq!(identify_project_type("kubernetes operator"), ProjectType::Microservices);
        assert_eq!(
            identify_project_type("a scalable architecture for payments"),
            ProjectType::Microservices
        );
        assert_eq!(identify_project_type("nightly ETL jobs"), ProjectType::DataPlatform);
        assert_eq!(
            identify_project_type("log data processing"),
            ProjectType::DataPlatform
        );
        assert_eq!(identify_project_type("a tablet reader"), ProjectType::MobileApplication);
        assert_eq!(
            identify_project_type("a native app for notes"),
            ProjectType::DesktopApplication
        );
        assert_eq!(
            identify_project_type("enterprise e-commerce platform"),
            ProjectType::EnterpriseSoftware
        );
    }

    #[test]
    fn short_terms_need_word_boundaries() {
        // "email" contains "ai" and "mail" but is not a machine learning project
        assert_eq!(
            identify_project_type("an email archiver"),
            ProjectType::EnterpriseSoftware
        );
    }

    #[test]
    fn complexity_adjustments() {
        assert_eq!(estimate_complexity("a todo list"), 5);
        assert_eq!(estimate_complexity("a simple todo list"), 3);
        assert_eq!(estimate_complexity("an enterprise ledger"), 7);
        assert_eq!(estimate_complexity("a massive ledger"), 9);
        assert_eq!(estimate_complexity("an enterprise ai ledger"), 8);
    }

    #[test]
    fn feature_words_raise_complexity() {
        let six = "feature function module component capability feature";
        assert_eq!(estimate_complexity(six), 6);
        // plurals are not counted
        assert_eq!(estimate_complexity("features features features features features features"), 5);
    }

    #[test]
    fn lines_follow_the_score_table() {
        assert_eq!(estimate_lines(1), 500);
        assert_eq!(estimate_lines(5), 10_000);
        assert_eq!(estimate_lines(10), 300_000);
        assert_eq!(estimate_lines(0), 500);
    }

    #[test]
    fn generic_chunks_form_a_chain_within_bounds() {
        let chunks = plan_chunks(10_000, 2_000);
        assert_eq!(chunks.len(), 6);
        assert!(chunks[0].depends_on.is_empty());
        assert_eq!(chunks[5].depends_on, vec!["module_5".to_string()]);
        assert!(chunks.iter().all(|c| c.estimated_lines <= 2_000));

        assert_eq!(plan_chunks(500, 2_000).len(), 2);
        assert_eq!(plan_chunks(300_000, 2_000).len(), 10);
    }

    #[test]
    fn enterprise_description_gets_ten_modules() {
        let analysis = analyze("enterprise e-commerce platform", &AnalysisOptions::default());
        assert_eq!(analysis.project_type, ProjectType::EnterpriseSoftware);
        assert_eq!(analysis.complexity, 7);
        assert_eq!(analysis.estimated_lines, 40_000);
        assert_eq!(analysis.chunks.len(), 10);
        assert_eq!(analysis.chunks[0].technologies, vec!["python".to_string()]);
    }

    #[test]
    fn web_layout_without_frontend() {
        let analysis = analyze("A REST API for invoices", &AnalysisOptions::default());
        assert_eq!(
            ids(&analysis),
            [
                "core_infrastructure",
                "database_models",
                "api_backend",
                "auth_security",
                "testing_suite"
            ]
        );
        assert_eq!(
            chunk(&analysis, "testing_suite").depends_on,
            vec!["api_backend".to_string(), "auth_security".to_string()]
        );
        assert_eq!(chunk(&analysis, "api_backend").estimated_lines, 2_000);
        assert_eq!(chunk(&analysis, "core_infrastructure").estimated_lines, 1_500);
        assert_eq!(chunk(&analysis, "auth_security").priority, 5);
    }

    #[test]
    fn web_layout_with_frontend_and_framework() {
        let opts = AnalysisOptions {
            framework: Some("django"),
            max_chunk_size: 1_000,
            ..AnalysisOptions::default()
        };
        let analysis = analyze("a backend and frontend for a bookshop", &opts);
        assert_eq!(analysis.chunks.len(), 6);
        let frontend = chunk(&analysis, "frontend_ui");
        assert_eq!(frontend.priority, 4);
        assert_eq!(frontend.depends_on, vec!["api_backend".to_string()]);
        assert!(analysis.chunks.iter().all(|c| c.estimated_lines == 1_000));
        assert_eq!(
            chunk(&analysis, "core_infrastructure").technologies,
            vec!["python".to_string(), "django".to_string()]
        );
    }

    #[test]
    fn ml_layout_branches_after_the_model() {
        let analysis = analyze("an image classification model", &AnalysisOptions::default());
        assert_eq!(analysis.project_type, ProjectType::MachineLearning);
        assert_eq!(analysis.chunks.len(), 5);
        assert_eq!(
            chunk(&analysis, "inference_service").depends_on,
            vec!["model_architecture".to_string()]
        );
    }

    #[test]
    fn microservices_scale_with_named_services() {
        let analysis = analyze(
            "distributed order service, payment service and user service",
            &AnalysisOptions::default(),
        );
        assert_eq!(
            ids(&analysis),
            ["service_discovery", "api_gateway", "service_1", "service_2", "service_3"]
        );
        assert_eq!(chunk(&analysis, "service_3").priority, 5);

        let few = analyze("a distributed ledger", &AnalysisOptions::default());
        assert_eq!(few.chunks.len(), 4);
    }

    #[test]
    fn game_and_data_layouts() {
        let game = analyze("a 2d platformer", &AnalysisOptions::default());
        assert_eq!(ids(&game), ["game_engine_core", "graphics_rendering", "game_mechanics"]);
        let data = analyze("nightly etl jobs", &AnalysisOptions::default());
        assert_eq!(ids(&data), ["data_ingestion", "data_processing", "data_storage"]);
    }

    #[test]
    fn global_dependencies_follow_language_and_description() {
        assert_eq!(
            global_dependencies("a REST API with a database and tests", "python", Some("fastapi")),
            [
                "python>=3.8",
                "pip",
                "virtualenv",
                "fastapi",
                "database",
                "api_framework",
                "testing_framework"
            ]
        );
        assert_eq!(global_dependencies("a cli", "javascript", None), ["node.js", "npm"]);
        assert!(global_dependencies("a cli", "rust", None).is_empty());
    }

    #[test]
    fn architecture_decisions_by_type_and_keywords() {
        let web = architecture_decisions("a rest api with a nosql database", ProjectType::WebApplication, "python", None);
        assert_eq!(web["architecture_pattern"], "MVC");
        assert_eq!(web["api_style"], "REST");
        assert_eq!(web["database_type"], "NoSQL");
        assert!(!web.contains_key("primary_framework"));

        let framed = architecture_decisions("an api on aws", ProjectType::WebApplication, "python", Some("flask"));
        assert_eq!(framed["architecture_pattern"], "Framework-specific");
        assert_eq!(framed["primary_framework"], "flask");
        assert_eq!(framed["deployment_target"], "Cloud");

        let svc = architecture_decisions("docker services", ProjectType::Microservices, "go", None);
        assert_eq!(svc["communication"], "HTTP/gRPC");
        assert_eq!(svc["containerization"], "Docker");
    }

    #[test]
    fn strategy_parses_known_names_only() {
        assert_eq!("layered".parse::<ChunkStrategy>().unwrap(), ChunkStrategy::Layered);
        assert!("random".parse::<ChunkStrategy>().is_err());
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(estimate_duration(100, 5, 0), "10 seconds");
        assert_eq!(estimate_duration(10_000, 5, 6), "19 minutes");
        assert_eq!(estimate_duration(80_000, 8, 10), "3h 38m");
    }

    #[test]
    fn analysis_settings() {
        let opts = AnalysisOptions {
            strategy: ChunkStrategy::Domain,
            ..AnalysisOptions::default()
        };
        let analysis = analyze("A REST API for invoices", &opts);
        assert_eq!(analysis.chunk_strategy, ChunkStrategy::Domain);
        let settings = analysis.settings();
        assert!(settings.contains(&("project_type".into(), "web_application".into())));
        assert!(settings.contains(&("chunk_count".into(), "5".into())));
        assert!(settings.contains(&("architecture_pattern".into(), "MVC".into())));
        assert!(settings.contains(&(
            "global_dependencies".into(),
            "python>=3.8,pip,virtualenv,api_framework".into()
        )));
    }
}
