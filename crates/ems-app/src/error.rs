//! Error types for the ems-app service layer.

use std::path::PathBuf;

/// Application error wrapping the backend crates' errors behind one type for
/// every frontend.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(#[from] ems_project::ProjectError),

    #[error("Failed to read project file: {path}")]
    ProjectFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Program error: {0}")]
    Program(#[from] ems_program::ProgramError),

    #[error("Program not found: {0}")]
    ProgramNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ems-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<ems_project::ValidationError> for AppError {
    fn from(err: ems_project::ValidationError) -> Self {
        AppError::Project(err.into())
    }
}
