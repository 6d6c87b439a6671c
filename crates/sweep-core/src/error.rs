use thiserror::Error;

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("finding {0} has no repository")]
    MissingRepository(String),

    #[error("failed to clone {repo}: {detail}")]
    Clone { repo: String, detail: String },

    #[error("git command failed (`git {args}`): {detail}")]
    Git { args: String, detail: String },

    #[error("worktree error: {0}")]
    Worktree(String),

    #[error("{tool} is not available: {detail}")]
    ToolUnavailable { tool: String, detail: String },

    #[error("assistant is not usable: {0}")]
    AssistantUnavailable(String),

    #[error("finding source failed: {0}")]
    Source(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SweepError>;
