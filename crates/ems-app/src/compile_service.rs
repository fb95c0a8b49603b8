//! Project -> EMS model -> IDF text.

use std::path::Path;

use ems_program::{EmsModel, to_idf};
use ems_project::Project;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::project_service::{self, ProgramSummary};

/// A built model with its rendered IDF objects.
#[derive(Debug, Clone)]
pub struct CompiledProject {
    pub model: EmsModel,
    pub idf: String,
}

impl CompiledProject {
    pub fn programs(&self) -> Vec<ProgramSummary> {
        project_service::summarize(&self.model)
    }
}

pub fn compile_project(project: &Project) -> AppResult<CompiledProject> {
    let model = ems_project::build_model(project)?;
    let idf = to_idf(&model);
    info!(project = %project.name, summary = %model.summary(), "compiled project");
    Ok(CompiledProject { model, idf })
}

/// Load and compile a project file.
pub fn compile_file(path: &Path) -> AppResult<CompiledProject> {
    let project = project_service::load_project(path)?;
    compile_project(&project)
}

/// Write the IDF text of a compiled project.
pub fn write_output(path: &Path, compiled: &CompiledProject) -> AppResult<()> {
    std::fs::write(path, &compiled.idf).map_err(|e| AppError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}
