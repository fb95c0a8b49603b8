//! Shared application service layer for the EMS toolkit.
//!
//! Frontends go through this crate for project management, model
//! compilation and ad-hoc rule programs.

pub mod compile_service;
pub mod error;
pub mod project_service;
pub mod rules;

pub use compile_service::{CompiledProject, compile_file, compile_project, write_output};
pub use error::{AppError, AppResult};
pub use project_service::{
    ProgramKind, ProgramSummary, list_programs, load_project, save_project, validate_project,
};
pub use rules::{RuleArg, compile_rules, parse_action_arg, parse_rule_arg};
