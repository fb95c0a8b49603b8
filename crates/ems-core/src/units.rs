// ems-core/src/units.rs

//! Unit types and unit-tagged argument parsing.
//!
//! Measure arguments arrive in whatever unit the user typed (`"45F"`,
//! `"1200 cfm"`); generated programs always compare against SI values, since
//! EnergyPlus sensors report °C and m³/s.

use thiserror::Error;
use uom::si::f64::{
    ThermodynamicTemperature as UomThermodynamicTemperature, Time as UomTime,
    VolumeRate as UomVolumeRate,
};

// Public canonical unit types (SI, f64)
pub type Temperature = UomThermodynamicTemperature;
pub type Time = UomTime;
pub type VolumeRate = UomVolumeRate;

#[inline]
pub fn degc(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::degree_celsius;
    Temperature::new::<degree_celsius>(v)
}

#[inline]
pub fn degf(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::degree_fahrenheit;
    Temperature::new::<degree_fahrenheit>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn m3ps(v: f64) -> VolumeRate {
    use uom::si::volume_rate::cubic_meter_per_second;
    VolumeRate::new::<cubic_meter_per_second>(v)
}

#[inline]
pub fn cfm(v: f64) -> VolumeRate {
    use uom::si::volume_rate::cubic_foot_per_minute;
    VolumeRate::new::<cubic_foot_per_minute>(v)
}

#[inline]
pub fn hours(v: f64) -> Time {
    use uom::si::time::hour;
    Time::new::<hour>(v)
}

#[inline]
pub fn minutes(v: f64) -> Time {
    use uom::si::time::minute;
    Time::new::<minute>(v)
}

#[inline]
pub fn to_degc(t: Temperature) -> f64 {
    use uom::si::thermodynamic_temperature::degree_celsius;
    t.get::<degree_celsius>()
}

#[inline]
pub fn to_degf(t: Temperature) -> f64 {
    use uom::si::thermodynamic_temperature::degree_fahrenheit;
    t.get::<degree_fahrenheit>()
}

#[inline]
pub fn to_m3ps(q: VolumeRate) -> f64 {
    use uom::si::volume_rate::cubic_meter_per_second;
    q.get::<cubic_meter_per_second>()
}

#[inline]
pub fn to_minutes(t: Time) -> f64 {
    use uom::si::time::minute;
    t.get::<minute>()
}

/// °F -> °C on bare numbers, for arguments that are always entered in °F.
#[inline]
pub fn fahrenheit_to_celsius(v: f64) -> f64 {
    to_degc(degf(v))
}

/// Error in unit parsing or conversion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    /// Input text did not parse to a number + optional unit
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Unit not recognized for this quantity
    #[error("Unknown unit '{unit}' for {quantity}")]
    UnknownUnit { unit: String, quantity: &'static str },

    /// Value out of physical range (e.g., negative absolute temperature)
    #[error("Value {value} out of range: {reason}")]
    OutOfRange { value: f64, reason: &'static str },
}

/// Parse a temperature argument.
///
/// Accepts `C`, `F`, `K` suffixes (with or without `°`); a bare number is
/// taken as °C, the unit EnergyPlus reports temperatures in.
pub fn parse_temperature(input: &str) -> Result<Temperature, UnitError> {
    let (value, unit) = split_value_and_unit(input)?;

    let t = match unit.to_lowercase().as_str() {
        "" | "c" | "°c" | "celsius" => degc(value),
        "f" | "°f" | "fahrenheit" => degf(value),
        "k" | "kelvin" => k(value),
        _ => {
            return Err(UnitError::UnknownUnit {
                unit,
                quantity: "Temperature",
            });
        }
    };

    if !t.value.is_finite() || t.value <= 0.0 {
        return Err(UnitError::OutOfRange {
            value,
            reason: "Absolute temperature must be > 0 K",
        });
    }

    Ok(t)
}

/// Parse a volume flow argument. A bare number is taken as m³/s.
pub fn parse_volume_rate(input: &str) -> Result<VolumeRate, UnitError> {
    let (value, unit) = split_value_and_unit(input)?;

    let q = match unit.to_lowercase().as_str() {
        "" | "m3/s" | "m³/s" => m3ps(value),
        "cfm" | "ft3/min" => cfm(value),
        "l/s" => m3ps(value / 1000.0),
        _ => {
            return Err(UnitError::UnknownUnit {
                unit,
                quantity: "Volume flow rate",
            });
        }
    };

    if value < 0.0 {
        return Err(UnitError::OutOfRange {
            value,
            reason: "Volume flow rate must be non-negative",
        });
    }

    Ok(q)
}

/// Split a value+unit string into (numeric_value, unit_string).
///
/// - "45F" -> (45.0, "F")
/// - "1200 cfm" -> (1200.0, "cfm")
/// - "26" -> (26.0, "")
fn split_value_and_unit(input: &str) -> Result<(f64, String), UnitError> {
    let trimmed = input.trim();

    let split_idx = trimmed
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')))
        .unwrap_or(trimmed.len());

    let (num_part, unit_part) = trimmed.split_at(split_idx);

    let value: f64 = num_part.trim().parse().map_err(|_| {
        UnitError::ParseError(format!("Could not parse numeric value from '{}'", input))
    })?;

    Ok((value, unit_part.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::{Tolerances, nearly_equal};

    fn close(a: f64, b: f64) -> bool {
        nearly_equal(
            a,
            b,
            Tolerances {
                abs: 1e-9,
                rel: 1e-9,
            },
        )
    }

    #[test]
    fn fahrenheit_to_celsius_reference_points() {
        assert!(close(fahrenheit_to_celsius(32.0), 0.0));
        assert!(close(fahrenheit_to_celsius(212.0), 100.0));
        assert!(close(fahrenheit_to_celsius(50.0), 10.0));
    }

    #[test]
    fn cfm_to_cubic_meters_per_second() {
        // 1200 cfm is the smallest package in the discrete sizing table
        assert!((to_m3ps(cfm(1200.0)) - 0.56634).abs() < 1e-4);
    }

    #[test]
    fn parse_temperature_units() {
        assert!(close(to_degc(parse_temperature("26").unwrap()), 26.0));
        assert!(close(to_degc(parse_temperature("50F").unwrap()), 10.0));
        assert!(close(to_degc(parse_temperature("50 °F").unwrap()), 10.0));
        assert!(close(to_degc(parse_temperature("273.15 K").unwrap()), 0.0));
    }

    #[test]
    fn reject_unknown_temperature_unit() {
        let err = parse_temperature("20 R").unwrap_err();
        assert!(matches!(err, UnitError::UnknownUnit { .. }));
    }

    #[test]
    fn reject_below_absolute_zero() {
        let err = parse_temperature("-500F").unwrap_err();
        assert!(matches!(err, UnitError::OutOfRange { .. }));
    }

    #[test]
    fn parse_volume_rate_units() {
        assert!(close(to_m3ps(parse_volume_rate("0.5").unwrap()), 0.5));
        assert!(close(to_m3ps(parse_volume_rate("250 l/s").unwrap()), 0.25));
        assert!(to_m3ps(parse_volume_rate("1200cfm").unwrap()) > 0.56);
    }

    #[test]
    fn reject_garbage() {
        assert!(matches!(
            parse_volume_rate("abc"),
            Err(UnitError::ParseError(_))
        ));
    }
}
