use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid package index {path:?}: {message}")]
    InvalidIndex { path: PathBuf, message: String },

    #[error("Package {0:?} is declared more than once")]
    DuplicatePackage(String),

    #[error("No go.mod found in {0:?} or any parent directory")]
    ModuleNotFound(PathBuf),

    #[error("Invalid go.mod {path:?}: {message}")]
    InvalidModule { path: PathBuf, message: String },

    #[error("Unable to resolve import for {path:?}: {message}")]
    ImportResolution { path: PathBuf, message: String },
}
