//! ems-project: project file format, validation and model building.

pub mod build;
pub mod migrate;
pub mod schema;
pub mod validate;

pub use build::build_model;
pub use migrate::{LATEST_VERSION, migrate_to_latest};
pub use schema::*;
pub use validate::{ValidationError, validate_project};

use std::path::Path;

use ems_measures::MeasureError;
use ems_program::ProgramError;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unknown project format: {path} (expected .yaml, .yml or .json)")]
    UnknownFormat { path: String },

    #[error("Migration error: {what}")]
    Migration { what: String },

    #[error("Program error: {0}")]
    Program(#[from] ProgramError),

    #[error("Measure error: {0}")]
    Measure(#[from] MeasureError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Project file encoding, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    pub fn from_path(path: &Path) -> ProjectResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            _ => Err(ProjectError::UnknownFormat {
                path: path.display().to_string(),
            }),
        }
    }
}

/// Parse, migrate and validate project text.
pub fn parse_project(content: &str, format: Format) -> ProjectResult<Project> {
    let project: Project = match format {
        Format::Yaml => serde_yaml::from_str(content)?,
        Format::Json => serde_json::from_str(content)?,
    };
    let project = migrate_to_latest(project)?;
    validate_project(&project)?;
    Ok(project)
}

/// Validate and serialize.
pub fn render_project(project: &Project, format: Format) -> ProjectResult<String> {
    validate_project(project)?;
    Ok(match format {
        Format::Yaml => serde_yaml::to_string(project)?,
        Format::Json => serde_json::to_string_pretty(project)?,
    })
}

/// Load a `.yaml`/`.yml`/`.json` project file.
pub fn load(path: &Path) -> ProjectResult<Project> {
    let format = Format::from_path(path)?;
    parse_project(&std::fs::read_to_string(path)?, format)
}

/// Save in the format the extension names.
pub fn save(path: &Path, project: &Project) -> ProjectResult<()> {
    let content = render_project(project, Format::from_path(path)?)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_yaml(path: &Path) -> ProjectResult<Project> {
    parse_project(&std::fs::read_to_string(path)?, Format::Yaml)
}

pub fn save_yaml(path: &Path, project: &Project) -> ProjectResult<()> {
    std::fs::write(path, render_project(project, Format::Yaml)?)?;
    Ok(())
}

pub fn load_json(path: &Path) -> ProjectResult<Project> {
    parse_project(&std::fs::read_to_string(path)?, Format::Json)
}

pub fn save_json(path: &Path, project: &Project) -> ProjectResult<()> {
    std::fs::write(path, render_project(project, Format::Json)?)?;
    Ok(())
}
