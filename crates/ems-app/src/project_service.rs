//! Project loading, saving, validation, and introspection.

use std::path::Path;

use ems_program::{CallingPoint, EmsModel};
use ems_project::{Format, Project, parse_project, render_project};

use crate::error::{AppError, AppResult};

/// Whether a listed body is scheduled directly or only reachable by `RUN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramKind {
    Program,
    Subroutine,
}

impl ProgramKind {
    pub fn label(self) -> &'static str {
        match self {
            ProgramKind::Program => "program",
            ProgramKind::Subroutine => "subroutine",
        }
    }
}

/// Summary of a generated program for listing.
#[derive(Debug, Clone)]
pub struct ProgramSummary {
    pub name: String,
    pub kind: ProgramKind,
    /// Calling manager and point, for scheduled programs.
    pub schedule: Option<(String, CallingPoint)>,
    pub line_count: usize,
    pub reads: Vec<String>,
}

/// Load a `.yaml`/`.yml`/`.json` project, migrating and validating it.
pub fn load_project(path: &Path) -> AppResult<Project> {
    let format = Format::from_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|e| AppError::ProjectFileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(parse_project(&content, format)?)
}

/// Save a project in the format its extension names.
pub fn save_project(path: &Path, project: &Project) -> AppResult<()> {
    let content = render_project(project, Format::from_path(path)?)?;

    std::fs::write(path, content).map_err(|e| AppError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

/// Validate project structure, then build the model to check every program
/// against its declarations.
pub fn validate_project(project: &Project) -> AppResult<()> {
    ems_project::validate_project(project)?;
    ems_project::build_model(project)?;
    Ok(())
}

/// List every program and subroutine the project produces, measures included.
pub fn list_programs(project: &Project) -> AppResult<Vec<ProgramSummary>> {
    let model = ems_project::build_model(project)?;
    Ok(summarize(&model))
}

pub(crate) fn summarize(model: &EmsModel) -> Vec<ProgramSummary> {
    let scheduled = |name: &str| {
        model
            .calling_managers()
            .iter()
            .find(|m| m.programs.iter().any(|p| p.as_str() == name))
            .map(|m| (m.name.clone(), m.calling_point))
    };

    let programs = model.programs().iter().map(|p| (p, ProgramKind::Program));
    let subroutines = model
        .subroutines()
        .iter()
        .map(|p| (p, ProgramKind::Subroutine));

    programs
        .chain(subroutines)
        .map(|(program, kind)| ProgramSummary {
            name: program.name.to_string(),
            kind,
            schedule: match kind {
                ProgramKind::Program => scheduled(program.name.as_str()),
                ProgramKind::Subroutine => None,
            },
            line_count: program.body.lines().len(),
            reads: program.body.reads().iter().map(|r| r.to_string()).collect(),
        })
        .collect()
}
