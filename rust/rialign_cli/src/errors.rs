use rialign::AlignmentError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("JSON parsing error in {}: {source}", path.display())]
    Json {
        source: serde_json::Error,
        path: PathBuf,
    },

    #[error("Error interpreting the config: {0}")]
    Config(String),

    #[error("Alignment failed: {0}")]
    Alignment(#[from] AlignmentError),

    #[error("Invalid progress bar template: {0}")]
    Progress(#[from] indicatif::style::TemplateError),
}

impl CliError {
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| CliError::Io { source, path }
    }

    pub fn json(path: impl Into<PathBuf>) -> impl FnOnce(serde_json::Error) -> Self {
        let path = path.into();
        move |source| CliError::Json { source, path }
    }
}
