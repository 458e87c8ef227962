use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to start '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("host command timed out after {0}s")]
    Timeout(u64),

    #[error("{}", exit_message(.code, .stderr))]
    Exit { code: Option<i32>, stderr: String },

    #[error("Process error: {0}")]
    Process(String),

    #[error("job error: {0}")]
    Job(String),

    #[error("Failed to parse job file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl HostError {
    /// Exit code of a failed host process, if it exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            HostError::Exit { code, .. } => *code,
            _ => None,
        }
    }
}

fn exit_message(code: &Option<i32>, stderr: &str) -> String {
    let head = match code {
        Some(c) => format!("host command exited with code {c}"),
        None => "host command terminated by signal".to_string(),
    };
    if stderr.is_empty() {
        head
    } else {
        format!("{head}\nstderr: {stderr}")
    }
}
