//! Condenser loop override.
//!
//! Turns condenser plant loops and their pumps off while the outdoor dry-bulb
//! temperature is below a threshold and hands control back otherwise. One
//! program covers all loops, one `IF` block per loop.

use ems_core::{format_real, parse_temperature, round_to, to_degc, to_degf};
use ems_program::{
    Actuator, CallingPoint, Comparison, ComponentKind, ComponentRef, EmsModel, GlobalVariable,
    Identifier, NameAllocator, OutputDataType, OutputRequest, OutputVariable, Program,
    ProgramBuilder, ProgramCallingManager, PumpSpeed, ReportingFrequency, Sensor,
    UpdateFrequency, sanitize,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{MeasureError, MeasureResult};
use crate::measure::Measure;

const MEASURE: &str = "condenser loop override";

/// Thresholds outside this band (°F) are accepted with a warning.
const WARN_LOW_F: f64 = 30.0;
const WARN_HIGH_F: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CondenserLoop {
    pub name: String,
    /// Supply-side pump of the loop.
    pub pump: String,
    #[serde(default)]
    pub pump_speed: PumpSpeed,
}

impl CondenserLoop {
    pub fn new(name: impl Into<String>, pump: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pump: pump.into(),
            pump_speed: PumpSpeed::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CondenserLoopOverride {
    pub loops: Vec<CondenserLoop>,
    /// Outdoor dry-bulb threshold with unit, e.g. `"42.8 F"`. Bare numbers are °C.
    pub threshold: String,
    pub program: String,
    pub calling_manager: String,
}

impl Default for CondenserLoopOverride {
    fn default() -> Self {
        Self {
            loops: Vec::new(),
            threshold: "42.8 F".to_string(),
            program: "TowerControl".to_string(),
            calling_manager: "Condenser OnOff Management".to_string(),
        }
    }
}

impl CondenserLoopOverride {
    pub fn new(loops: Vec<CondenserLoop>) -> Self {
        Self {
            loops,
            ..Self::default()
        }
    }

    /// Threshold in °C as it appears in the program.
    pub fn threshold_c(&self) -> MeasureResult<f64> {
        let t = parse_temperature(&self.threshold)?;
        let f = to_degf(t);
        if !(WARN_LOW_F..=WARN_HIGH_F).contains(&f) {
            warn!(
                threshold_f = f,
                low = WARN_LOW_F,
                high = WARN_HIGH_F,
                "condenser override threshold outside the usual range"
            );
        }
        Ok(round_to(to_degc(t), 6))
    }
}

impl Measure for CondenserLoopOverride {
    fn name(&self) -> &'static str {
        MEASURE
    }

    fn allocations(&self) -> u32 {
        u32::try_from(self.loops.len()).unwrap_or(u32::MAX)
    }

    fn build(&self, mut names: NameAllocator) -> MeasureResult<(EmsModel, NameAllocator)> {
        if self.loops.is_empty() {
            return Err(MeasureError::NothingToApply {
                measure: MEASURE,
                what: "no condenser loops selected",
            });
        }
        let threshold = self.threshold_c()?;

        let mut model = EmsModel::new();
        let outdoor = Identifier::new("OutdoorTemp")?;
        model.add_sensor(Sensor::new(
            outdoor.clone(),
            "Environment",
            "Site Outdoor Air Drybulb Temperature",
        ))?;

        let mut body = ProgramBuilder::new();
        for plant_loop in &self.loops {
            let (n, next) = names.advance()?;
            names = next;
            let stem = sanitize(&plant_loop.name);

            let report = Identifier::new(format!("PumpFlowOverrideReport{n}"))?;
            model.add_global(GlobalVariable::new(report.clone()))?;

            let loop_ref = ComponentRef::new(plant_loop.name.as_str(), ComponentKind::PlantLoop);
            let loop_actuator = Identifier::new(format!("{stem}Actuator_Loop{n}"))?;
            model.add_actuator(Actuator::for_component(
                loop_actuator.clone(),
                &loop_ref,
                "On/Off Supervisory",
            )?)?;

            let pump_ref = ComponentRef::new(
                plant_loop.pump.as_str(),
                ComponentKind::Pump {
                    speed: plant_loop.pump_speed,
                },
            );
            let pump_actuator = Identifier::new(format!("{stem}PumpFlowOverride{n}"))?;
            model.add_actuator(Actuator::for_component(
                pump_actuator.clone(),
                &pump_ref,
                "Pump Mass Flow Rate",
            )?)?;

            let report_name = format!("EMS Condenser Flow Override On{n}");
            model.add_output_variable(
                OutputVariable::new(report_name.as_str(), report.clone())
                    .with_data(OutputDataType::Averaged)
                    .with_frequency(UpdateFrequency::SystemTimestep)
                    .with_units("On/Off"),
            )?;
            model.add_output_request(
                OutputRequest::new(report_name).with_frequency(ReportingFrequency::Hourly),
            )?;

            body = body
                .if_compare(outdoor.as_str(), Comparison::Lt, threshold)
                .set(loop_actuator.as_str(), "0.0")
                .set(pump_actuator.as_str(), "0.0")
                .set(report.as_str(), "1.0")
                .else_branch()
                .set(loop_actuator.as_str(), "Null")
                .set(pump_actuator.as_str(), "Null")
                .set(report.as_str(), "0.0")
                .end_if();
        }

        let program = Identifier::new(self.program.as_str())?;
        model.add_program(Program::new(program.clone(), body.build()?))?;
        model.add_calling_manager(
            ProgramCallingManager::new(
                self.calling_manager.as_str(),
                CallingPoint::InsideHVACSystemIterationLoop,
            )
            .with_program(program),
        )?;
        debug!(
            loops = self.loops.len(),
            threshold_c = %format_real(threshold),
            "condenser override program built"
        );

        Ok((model, names))
    }
}
