//! Halt the simulation on sustained discomfort.
//!
//! Per zone, a trend variable logs the Fanger PMV sensor; a program averages
//! the trend over a window and runs a subroutine that stops the run with
//! `@FatalHaltEp` once the average leaves `[-min_pmv, max_pmv]`. The halt
//! code encodes the zone index, which bound was crossed (`100` upper, `900`
//! lower) and the bound itself.

use ems_core::{format_real, hours, to_minutes};
use ems_program::{
    CallingPoint, Comparison, EmsModel, GlobalVariable, Identifier, NameAllocator,
    OutputRequest, OutputVariable, Program, ProgramBuilder, ProgramCallingManager,
    ReportingFrequency, Sensor, TrendVariable, UpdateFrequency,
};
use serde::{Deserialize, Serialize};

use crate::error::{MeasureError, MeasureResult};
use crate::measure::Measure;

const MEASURE: &str = "comfort halt";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComfortHalt {
    /// Thermal zone names.
    pub zones: Vec<String>,
    /// Lower bound magnitude: the run halts at PMV <= -min_pmv.
    pub min_pmv: f64,
    pub max_pmv: f64,
    /// Averaging window.
    pub trend_hours: f64,
    /// Zone timestep of the simulation.
    pub timestep_minutes: f64,
}

impl Default for ComfortHalt {
    fn default() -> Self {
        Self {
            zones: Vec::new(),
            min_pmv: 1.3,
            max_pmv: 2.5,
            trend_hours: 2.0,
            timestep_minutes: 15.0,
        }
    }
}

impl ComfortHalt {
    pub fn new(zones: Vec<String>) -> Self {
        Self {
            zones,
            ..Self::default()
        }
    }

    fn invalid(what: impl Into<String>) -> MeasureError {
        MeasureError::InvalidArgument {
            measure: MEASURE,
            what: what.into(),
        }
    }

    /// Timesteps in the averaging window.
    pub fn trend_timesteps(&self) -> MeasureResult<u32> {
        ems_core::ensure_finite(self.trend_hours, "trend length")?;
        ems_core::ensure_finite(self.timestep_minutes, "timestep")?;
        if self.timestep_minutes <= 0.0 {
            return Err(Self::invalid("timestep must be positive"));
        }
        let steps = (to_minutes(hours(self.trend_hours)) / self.timestep_minutes).round();
        if steps < 1.0 || steps > f64::from(u32::MAX) {
            return Err(Self::invalid(format!(
                "a {} h window holds no whole {} min timestep",
                format_real(self.trend_hours),
                format_real(self.timestep_minutes)
            )));
        }
        Ok(steps as u32)
    }

    fn check_bounds(&self) -> MeasureResult<()> {
        ems_core::ensure_finite(self.min_pmv, "minimum PMV")?;
        ems_core::ensure_finite(self.max_pmv, "maximum PMV")?;
        if self.min_pmv > self.max_pmv {
            return Err(Self::invalid(format!(
                "minimum PMV threshold {} is greater than maximum {}",
                format_real(self.min_pmv),
                format_real(self.max_pmv)
            )));
        }
        Ok(())
    }
}

impl Measure for ComfortHalt {
    fn name(&self) -> &'static str {
        MEASURE
    }

    fn allocations(&self) -> u32 {
        u32::try_from(self.zones.len()).unwrap_or(u32::MAX)
    }

    fn build(&self, mut names: NameAllocator) -> MeasureResult<(EmsModel, NameAllocator)> {
        if self.zones.is_empty() {
            return Err(MeasureError::NothingToApply {
                measure: MEASURE,
                what: "no thermal zones selected",
            });
        }
        self.check_bounds()?;
        let timesteps = self.trend_timesteps()?;
        let max = format_real(self.max_pmv);
        let min = format_real(self.min_pmv);

        let mut model = EmsModel::new();
        for zone in &self.zones {
            let (n, next) = names.advance()?;
            names = next;

            let pmv = Identifier::new(format!("PMV{n}"))?;
            model.add_sensor(Sensor::new(
                pmv.clone(),
                zone.as_str(),
                "Zone Thermal Comfort Fanger Model PMV",
            ))?;
            model.add_output_request(
                OutputRequest::new("Zone Thermal Comfort Fanger Model PMV")
                    .with_key(zone.as_str())
                    .with_frequency(ReportingFrequency::Timestep),
            )?;

            let trend = Identifier::new(format!("PMVtrendLog{n}"))?;
            model.add_trend(TrendVariable::new(trend.clone(), pmv, timesteps))?;

            let average = Identifier::new(format!("PMV{n}runningAvg"))?;
            model.add_global(GlobalVariable::new(average.clone()))?;

            let halt = Identifier::new(format!("a_{n}_Kill_Run_if_Uncomfortable"))?;
            let halt_body = ProgramBuilder::new()
                .if_compare(average.as_str(), Comparison::Ge, self.max_pmv)
                .set("tmpError", &format!("@FatalHaltEp {n}100{max}"))
                .end_if()
                .if_compare(average.as_str(), Comparison::Le, -self.min_pmv)
                .set("tmpError", &format!("@FatalHaltEp {n}900{min}"))
                .end_if()
                .build()?;
            model.add_subroutine(Program::new(halt.clone(), halt_body))?;

            let update = Identifier::new(format!("updateMy_averagePMV{n}"))?;
            let update_body = ProgramBuilder::new()
                .set(
                    average.as_str(),
                    &format!("@TrendAverage {trend} {timesteps}"),
                )
                .run(halt.as_str())
                .build()?;
            model.add_program(Program::new(update.clone(), update_body))?;

            model.add_calling_manager(
                ProgramCallingManager::new(
                    format!("Average Zone {n} PMV"),
                    CallingPoint::EndOfZoneTimestepBeforeZoneReporting,
                )
                .with_program(update),
            )?;

            model.add_output_variable(
                OutputVariable::new(
                    format!(
                        "a_{n} Running {} Hour Average PMV",
                        format_real(self.trend_hours)
                    ),
                    average,
                )
                .with_frequency(UpdateFrequency::ZoneTimestep),
            )?;
        }

        Ok((model, names))
    }
}
