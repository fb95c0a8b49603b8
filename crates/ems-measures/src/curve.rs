//! Performance curve result override.
//!
//! Recomputes the cooling capacity curve of packaged terminal heat pump DX
//! coils from the coil inlet wet-bulb and outdoor dry-bulb temperatures, and
//! switches to an alternate set of biquadratic coefficients while the outdoor
//! temperature is above a threshold. The computed value is written through a
//! curve result actuator. One program covers all units.

use ems_core::{format_finite, format_real, parse_temperature, round_to, to_degc};
use ems_program::{
    Actuator, CallingPoint, Comparison, ComponentKind, ComponentRef, EmsModel, GlobalVariable,
    Identifier, NameAllocator, OutputDataType, OutputRequest, OutputVariable, Program,
    ProgramBuilder, ProgramCallingManager, ReportingFrequency, Sensor, UpdateFrequency,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MeasureError, MeasureResult};
use crate::measure::Measure;

const MEASURE: &str = "curve result override";

/// `a + b*x + c*x^2 + d*y + e*y^2 + f*x*y`
pub type Biquadratic = [f64; 6];

const ALTERNATE_DEFAULT: Biquadratic = [
    0.942567793,
    -0.009543347,
    0.000683770,
    -0.011042676,
    0.000005249,
    -0.000009720,
];

/// One heat pump whose DX coil capacity curve is overridden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveUnit {
    /// Packaged terminal heat pump; its `OA Node` and `Mixed Air Node` are
    /// sensed.
    pub heat_pump: String,
    /// Capacity-as-function-of-temperature curve of its cooling coil.
    pub curve: String,
    /// The curve's own coefficients, used at or below the threshold.
    pub coefficients: Biquadratic,
}

impl CurveUnit {
    pub fn new(
        heat_pump: impl Into<String>,
        curve: impl Into<String>,
        coefficients: Biquadratic,
    ) -> Self {
        Self {
            heat_pump: heat_pump.into(),
            curve: curve.into(),
            coefficients,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveResultOverride {
    pub units: Vec<CurveUnit>,
    /// Outdoor dry-bulb above which `alternate` applies, e.g. `"87.8 F"`.
    /// Bare numbers are °C.
    pub threshold: String,
    pub alternate: Biquadratic,
    pub program: String,
    pub calling_manager: String,
}

impl Default for CurveResultOverride {
    fn default() -> Self {
        Self {
            units: Vec::new(),
            threshold: "87.8 F".to_string(),
            alternate: ALTERNATE_DEFAULT,
            program: "CurveOverwriteMGR".to_string(),
            calling_manager: "EMSBasedCurveManager".to_string(),
        }
    }
}

impl CurveResultOverride {
    pub fn new(units: Vec<CurveUnit>) -> Self {
        Self {
            units,
            ..Self::default()
        }
    }

    pub fn threshold_c(&self) -> MeasureResult<f64> {
        let t = parse_temperature(&self.threshold)?;
        Ok(round_to(to_degc(t), 6))
    }
}

/// `SET <prefix><k>_<suffix> = <c>` for the six coefficients.
fn set_coefficients(
    mut body: ProgramBuilder,
    coefficients: &Biquadratic,
    name: impl Fn(usize) -> String,
) -> MeasureResult<ProgramBuilder> {
    for (k, c) in coefficients.iter().enumerate() {
        body = body.set(&name(k + 1), &format_finite(*c, "curve coefficient")?);
    }
    Ok(body)
}

/// The three lines evaluating the biquadratic with coefficients `c(k)`.
fn evaluate(body: ProgramBuilder, n: u32, c: impl Fn(usize) -> String) -> ProgramBuilder {
    body.set(
        &format!("LeftCurveInput_{n}"),
        &format!(
            "{}+({}*IVOnea_{n})+({}*IVOnea_{n}*IVOnea_{n})",
            c(1),
            c(2),
            c(3)
        ),
    )
    .set(
        &format!("RightCurveInput_{n}"),
        &format!(
            "({}*IVTwo_{n})+({}*IVTwo_{n}*IVTwo_{n})+({}*IVThree_{n})",
            c(4),
            c(5),
            c(6)
        ),
    )
    .set(
        &format!("CurveInput_{n}"),
        &format!("LeftCurveInput_{n} + RightCurveInput_{n}"),
    )
}

impl Measure for CurveResultOverride {
    fn name(&self) -> &'static str {
        MEASURE
    }

    fn allocations(&self) -> u32 {
        u32::try_from(self.units.len()).unwrap_or(u32::MAX)
    }

    fn build(&self, mut names: NameAllocator) -> MeasureResult<(EmsModel, NameAllocator)> {
        if self.units.is_empty() {
            return Err(MeasureError::NothingToApply {
                measure: MEASURE,
                what: "no heat pump DX coils selected",
            });
        }
        let threshold = self.threshold_c()?;

        let mut model = EmsModel::new();
        let mut body = ProgramBuilder::new();
        for unit in &self.units {
            let (n, next) = names.advance()?;
            names = next;
            let oa_node = format!("{} OA Node", unit.heat_pump);
            let mixed_node = format!("{} Mixed Air Node", unit.heat_pump);

            let curve = ComponentRef::new(unit.curve.as_str(), ComponentKind::Curve);
            let overwrite = Identifier::new(format!("CurveOverwrite{n}"))?;
            model.add_actuator(Actuator::for_component(
                overwrite.clone(),
                &curve,
                "Curve Result",
            )?)?;

            let previous = Identifier::new(format!("CurveInput2_{n}"))?;
            model.add_global(GlobalVariable::new(previous.clone()))?;

            let actual = Identifier::new(format!("ActualCurve{n}"))?;
            let sensors = [
                (actual.clone(), unit.curve.as_str(), "Performance Curve Output Value"),
                (Identifier::new(format!("Pressure{n}"))?, oa_node.as_str(), "System Node Pressure"),
                (
                    Identifier::new(format!("CoilInletDBT{n}"))?,
                    mixed_node.as_str(),
                    "System Node Temperature",
                ),
                (
                    Identifier::new(format!("CoilInletW{n}"))?,
                    mixed_node.as_str(),
                    "System Node Humidity Ratio",
                ),
                (Identifier::new(format!("OAT{n}"))?, oa_node.as_str(), "System Node Temperature"),
            ];
            for (name, key, variable) in sensors {
                model.add_sensor(Sensor::new(name, key, variable))?;
            }

            let reports = [
                (format!("ERLCurveValue{n}"), actual),
                (format!("OldCurveValue{n}"), previous.clone()),
                (format!("NewCurveValue{n}"), overwrite.clone()),
            ];
            for (report, variable) in reports {
                model.add_output_variable(
                    OutputVariable::new(report.as_str(), variable)
                        .with_data(OutputDataType::Averaged)
                        .with_frequency(UpdateFrequency::ZoneTimestep),
                )?;
                model.add_output_request(
                    OutputRequest::new(report).with_frequency(ReportingFrequency::Hourly),
                )?;
            }

            body = body
                .set(&format!("TTmp_{n}"), &format!("CoilInletDBT{n}"))
                .set(&format!("WTmp_{n}"), &format!("CoilInletW{n}"))
                .set(&format!("PTmp_{n}"), &format!("Pressure{n}"))
                .set(
                    &format!("MyWB_{n}"),
                    &format!("@TwbFnTdbWPb TTmp_{n} WTmp_{n} PTmp_{n}"),
                )
                .set(&format!("IVOnea_{n}"), &format!("MyWB_{n}"))
                .set(&format!("IVTwo_{n}"), &format!("OAT{n}"))
                .set(&format!("IVThree_{n}"), &format!("IVOnea_{n}*IVTwo_{n}"));
            body = set_coefficients(body, &unit.coefficients, |k| format!("C{k}_{n}"))?;
            body = set_coefficients(body, &self.alternate, |k| format!("C{k}_a{n}"))?;
            body = evaluate(body, n, |k| format!("C{k}_{n}"))
                .set(previous.as_str(), &format!("CurveInput_{n}"))
                .if_compare(&format!("OAT{n}"), Comparison::Gt, threshold);
            body = evaluate(body, n, |k| format!("C{k}_a{n}"))
                .end_if()
                .set(overwrite.as_str(), &format!("CurveInput_{n}"));
        }

        let program = Identifier::new(self.program.as_str())?;
        model.add_program(Program::new(program.clone(), body.build()?))?;
        model.add_calling_manager(
            ProgramCallingManager::new(
                self.calling_manager.as_str(),
                CallingPoint::AfterPredictorBeforeHVACManagers,
            )
            .with_program(program),
        )?;
        model.add_output_request(
            OutputRequest::new("Site Outdoor Air Drybulb Temperature")
                .with_frequency(ReportingFrequency::Hourly),
        )?;
        debug!(
            units = self.units.len(),
            threshold_c = %format_real(threshold),
            "curve override program built"
        );

        Ok((model, names))
    }
}
