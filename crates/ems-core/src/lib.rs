//! ems-core: shared foundation for the EMS program toolkit.
//!
//! Contains:
//! - numeric (Real + tolerances + the one number formatting policy)
//! - units (uom temperature / volume-flow types, argument parsing)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

pub use error::{EmsError, EmsResult};
pub use numeric::*;
pub use units::*;
