use std::path::PathBuf;

use thiserror::Error;

/// The two ways a backend call can fail, as far as the widgets care
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The backend answered with a non-2xx status
    Http,
    /// The request never produced a usable response
    Transport,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("backend returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("could not read {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("request task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Status(_) => ErrorKind::Http,
            ClientError::Request(_) | ClientError::File { .. } | ClientError::Task(_) => {
                ErrorKind::Transport
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
