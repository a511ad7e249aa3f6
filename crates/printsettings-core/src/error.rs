use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to read fragment {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse fragment {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid fragment {path}: {reason}")]
    InvalidFragment { path: PathBuf, reason: String },

    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    #[error("Failed to merge definitions into {container}: {reason}")]
    DefinitionMerge { container: String, reason: String },

    #[error("Dependency resolution failed: {0}")]
    DependencyResolution(#[from] DependencyResolutionError),

    #[error("Setting definitions have already been collected")]
    AlreadyCollected,

    #[error("Setting definitions have not been collected yet")]
    NotCollected,

    #[error("Preference error: {0}")]
    Preference(String),
}

/// Why a single dependency pair could not be wired into a container.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DependencyResolutionError {
    #[error("{role} '{key}' has no definition in this container")]
    DefinitionNotFound { key: String, role: KeyRole },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    Dependent,
    Requirement,
}

impl std::fmt::Display for KeyRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyRole::Dependent => write!(f, "setting"),
            KeyRole::Requirement => write!(f, "requirement"),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppenderError>;
