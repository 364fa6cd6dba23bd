use thiserror::Error;

#[derive(Error, Debug)]
pub enum CdnupError {
    #[error("Project validation failed: {0}")]
    ProjectValidation(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("CDN request failed: {0}")]
    CdnRequest(String),

    #[error("git {command} failed: {message}")]
    GitCommand { command: String, message: String },

    #[error("Git operation failed: {0}")]
    GitOperation(String),

    #[error("Pull request failed: {0}")]
    PullRequest(String),

    #[error("Failed to update: {}", .0.join(", "))]
    UpdateFailed(Vec<String>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, CdnupError>;
