use thiserror::Error;

use crate::units::UnitError;

pub type EmsResult<T> = Result<T, EmsError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmsError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error(transparent)]
    Unit(#[from] UnitError),
}
