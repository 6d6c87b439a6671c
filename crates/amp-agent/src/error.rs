use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AmpAgentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to spawn '{}': {source}", executable.display())]
    Spawn {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("assistant executable '{}' not found: {detail}", executable.display())]
    NotFound { executable: PathBuf, detail: String },

    #[error("Process error: {0}")]
    Process(String),
}
