//! Error types for program generation.

use ems_core::EmsError;
use thiserror::Error;

/// Result type for program generation.
pub type ProgramResult<T> = Result<T, ProgramError>;

/// Errors raised while building programs or assembling an EMS model.
///
/// Every error is raised before any text is handed out: a caller either gets
/// a complete program or one of these.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProgramError {
    /// Rule list is empty or incomplete.
    #[error("Invalid rule set: {what}")]
    InvalidRuleSet { what: &'static str },

    /// Name outside the ERL identifier set.
    #[error("Invalid identifier '{name}': {reason}")]
    InvalidIdentifier { name: String, reason: &'static str },

    /// IF/ELSEIF/ELSE/ENDIF structure is broken.
    #[error("Unmatched branch: {what}")]
    UnmatchedBranch { what: String },

    /// Expression text that cannot be placed on a program line.
    #[error("Invalid expression '{expr}': {reason}")]
    InvalidExpression { expr: String, reason: &'static str },

    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    /// Name already declared in the model (names are case-insensitive).
    #[error("Duplicate name: {name}")]
    DuplicateName { name: String },

    /// Program reads a variable nobody declared or assigned.
    #[error("Undeclared variable '{name}' in {context}")]
    UndeclaredVariable { name: String, context: String },

    /// Reference to a program, subroutine or variable that does not exist.
    #[error("Unknown reference '{name}' in {context}")]
    UnknownReference { name: String, context: String },

    /// Program assigns to a read-only binding (sensor, trend, ...).
    #[error("Assignment to read-only '{name}' in {context}")]
    ReadOnlyAssignment { name: String, context: String },

    /// Host object text that would split or truncate its IDF field.
    #[error("Invalid {field} '{value}': {reason}")]
    InvalidFieldText {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    /// Actuator control type not offered by the component kind.
    #[error("Component type '{component_type}' has no control '{control}'")]
    UnsupportedControl {
        component_type: &'static str,
        control: String,
    },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}

impl From<EmsError> for ProgramError {
    fn from(err: EmsError) -> Self {
        match err {
            EmsError::NonFinite { what, value } => ProgramError::NonFinite { what, value },
            EmsError::Unit(_) => ProgramError::InvalidArg {
                what: "unit conversion failed",
            },
        }
    }
}
