use ems_core::{EmsError, UnitError};
use ems_program::ProgramError;
use thiserror::Error;

pub type MeasureResult<T> = Result<T, MeasureError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeasureError {
    #[error("Invalid argument for {measure}: {what}")]
    InvalidArgument { measure: &'static str, what: String },

    #[error("{measure} has nothing to apply: {what}")]
    NothingToApply {
        measure: &'static str,
        what: &'static str,
    },

    #[error(transparent)]
    Program(#[from] ProgramError),

    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error(transparent)]
    Core(#[from] EmsError),
}
