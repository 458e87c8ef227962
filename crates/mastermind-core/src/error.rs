use thiserror::Error;

#[derive(Debug, Error)]
pub enum MastermindError {
    #[error("Missing value for {0}")]
    MissingValue(String),

    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Missing required option: --{0}")]
    MissingRequired(String),

    #[error("Invalid value '{value}' for --{option}: {reason}")]
    InvalidValue {
        option: String,
        value: String,
        reason: String,
    },

    #[error("Unexpected argument: {0}")]
    UnexpectedArgument(String),

    #[error("Missing description: '{0}' needs a project description")]
    MissingDescription(String),

    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("No agent specified")]
    NoAgent,

    #[error("could not allocate an output directory under {0}")]
    OutputDirExhausted(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl MastermindError {
    /// True for errors caused by the command line rather than the environment.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            MastermindError::MissingValue(_)
                | MastermindError::UnknownOption(_)
                | MastermindError::MissingRequired(_)
                | MastermindError::InvalidValue { .. }
                | MastermindError::UnexpectedArgument(_)
                | MastermindError::MissingDescription(_)
                | MastermindError::UnknownAgent(_)
                | MastermindError::NoAgent
        )
    }
}

pub type Result<T> = std::result::Result<T, MastermindError>;
