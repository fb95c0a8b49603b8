//! Measures: model edits that declare EMS objects and generate their programs.
//!
//! Each measure takes a small argument struct (deserializable from project
//! files), classifies the host objects it touches into component kinds, and
//! builds its programs with the `ems-program` builders. A measure either adds
//! all of its objects to the model or none.
//!
//! - [`ThermochromicWindow`]: swap window constructions by surface temperature
//! - [`CondenserLoopOverride`]: switch condenser loops off in cold weather
//! - [`ComfortHalt`]: stop the simulation when running-average PMV leaves a band
//! - [`DiscretePackageSizing`]: snap air system sizing to catalog flow rates
//! - [`ZoneAverageTemperature`]: report the volume-weighted building air temperature
//! - [`CurveResultOverride`]: swap DX capacity curve coefficients in hot weather
//! - [`VrfModeOverride`]: force VRF heating mode at a fixed terminal part load ratio

pub mod comfort;
pub mod condenser;
pub mod curve;
pub mod error;
pub mod measure;
pub mod sizing;
pub mod thermochromic;
pub mod vrf;
pub mod zone_average;

pub use comfort::ComfortHalt;
pub use condenser::{CondenserLoop, CondenserLoopOverride};
pub use curve::{Biquadratic, CurveResultOverride, CurveUnit};
pub use error::{MeasureError, MeasureResult};
pub use measure::{Measure, MeasureConfig, apply_batch};
pub use sizing::DiscretePackageSizing;
pub use thermochromic::{ThermochromicWindow, WindowState};
pub use vrf::{VrfModeOverride, VrfUnit};
pub use zone_average::ZoneAverageTemperature;
