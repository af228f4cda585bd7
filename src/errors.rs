use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("GitHub API {operation} failed with status {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("Timed out waiting for {what} after {attempts} attempts")]
    Timeout { what: String, attempts: u32 },

    #[error("All {0} repositories failed to provision")]
    BatchFailed(usize),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProvisionError {
    /// Whether a polling loop may treat this failure as "not ready yet".
    pub fn is_not_ready(&self) -> bool {
        matches!(self, ProvisionError::Status { .. } | ProvisionError::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, ProvisionError>;
