use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VendiffError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Reference archive error ({}): {message}", path.display())]
    Archive { path: PathBuf, message: String },

    #[error("Failed to read {}: {source}", path.display())]
    LocalRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path error: {0}")]
    Path(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl VendiffError {
    pub fn archive(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Archive {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn local_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LocalRead {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, VendiffError>;
