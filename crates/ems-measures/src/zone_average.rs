//! Whole-building average zone air temperature.
//!
//! Reads each zone's mean air temperature and air volume and reports the
//! volume-weighted average as a new output variable.

use ems_program::{
    CallingPoint, EmsModel, GlobalVariable, Identifier, InternalVariable, NameAllocator,
    OutputDataType, OutputRequest, OutputVariable, Program, ProgramBuilder,
    ProgramCallingManager, ReportingFrequency, Sensor, UpdateFrequency,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MeasureError, MeasureResult};
use crate::measure::Measure;

const MEASURE: &str = "zone average temperature";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneAverageTemperature {
    pub zones: Vec<String>,
    pub program: String,
    pub calling_manager: String,
    /// Global holding the average.
    pub average: String,
    /// Name of the reported output variable.
    pub output_name: String,
}

impl Default for ZoneAverageTemperature {
    fn default() -> Self {
        Self {
            zones: Vec::new(),
            program: "AverageZoneTemps".to_string(),
            calling_manager: "Average Building Temperature".to_string(),
            average: "AverageBuildingTemp".to_string(),
            output_name: "Weighted Average Building Zone Air Temperature".to_string(),
        }
    }
}

impl ZoneAverageTemperature {
    pub fn new(zones: Vec<String>) -> Self {
        Self {
            zones,
            ..Self::default()
        }
    }
}

impl Measure for ZoneAverageTemperature {
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

        let mut model = EmsModel::new();
        let mut numerator = Vec::with_capacity(self.zones.len());
        let mut denominator = Vec::with_capacity(self.zones.len());
        for zone in &self.zones {
            let (n, next) = names.advance()?;
            names = next;

            let temperature = Identifier::new(format!("T{n}"))?;
            model.add_sensor(Sensor::new(
                temperature.clone(),
                zone.as_str(),
                "Zone Mean Air Temperature",
            ))?;
            let volume = Identifier::new(format!("Zn{n}vol"))?;
            model.add_internal_variable(InternalVariable::new(
                volume.clone(),
                zone.as_str(),
                "Zone Air Volume",
            ))?;

            numerator.push(format!("{temperature}*{volume}"));
            denominator.push(volume.to_string());
        }

        let average = Identifier::new(self.average.as_str())?;
        model.add_global(GlobalVariable::new(average.clone()))?;

        let body = ProgramBuilder::new()
            .set("SumNumerator", &numerator.join(" + "))
            .set("SumDenominator", &denominator.join(" + "))
            .set(average.as_str(), "SumNumerator / SumDenominator")
            .build()?;
        let program = Identifier::new(self.program.as_str())?;
        model.add_program(Program::new(program.clone(), body))?;
        model.add_calling_manager(
            ProgramCallingManager::new(
                self.calling_manager.as_str(),
                CallingPoint::EndOfZoneTimestepBeforeZoneReporting,
            )
            .with_program(program),
        )?;

        model.add_output_variable(
            OutputVariable::new(self.output_name.as_str(), average)
                .with_data(OutputDataType::Averaged)
                .with_frequency(UpdateFrequency::ZoneTimestep)
                .with_units("C"),
        )?;
        model.add_output_request(
            OutputRequest::new(self.output_name.as_str())
                .with_frequency(ReportingFrequency::Timestep),
        )?;
        debug!(zones = self.zones.len(), "zone average program built");

        Ok((model, names))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_zones() -> ZoneAverageTemperature {
        ZoneAverageTemperature::new(vec![
            "Core_ZN".to_string(),
            "Perimeter_ZN_1".to_string(),
            "Perimeter ZN 2".to_string(),
        ])
    }

    #[test]
    fn volume_weighted_program() {
        let (model, names) = three_zones().build(NameAllocator::new()).unwrap();
        model.validate().unwrap();
        assert_eq!(names.peek(), 4);

        let program = model.find_program("AverageZoneTemps").unwrap();
        assert_eq!(
            program.body.lines(),
            [
                "SET SumNumerator = T1*Zn1vol + T2*Zn2vol + T3*Zn3vol",
                "SET SumDenominator = Zn1vol + Zn2vol + Zn3vol",
                "SET AverageBuildingTemp = SumNumerator / SumDenominator",
            ]
        );

        assert_eq!(model.sensors()[2].key, "Perimeter ZN 2");
        assert_eq!(model.internal_variables()[0].data_type, "Zone Air Volume");
        assert_eq!(
            model.calling_managers()[0].calling_point,
            CallingPoint::EndOfZoneTimestepBeforeZoneReporting
        );
        let output = &model.output_variables()[0];
        assert_eq!(output.name, "Weighted Average Building Zone Air Temperature");
        assert_eq!(output.units.as_deref(), Some("C"));
        assert_eq!(model.output_requests()[0].frequency, ReportingFrequency::Timestep);
    }

    #[test]
    fn numbering_continues_from_allocator() {
        let start = NameAllocator::new().skip(2).unwrap();
        let (model, _) = three_zones().build(start).unwrap();
        assert_eq!(model.sensors()[0].name.as_str(), "T3");
        assert_eq!(model.internal_variables()[2].name.as_str(), "Zn5vol");
    }

    #[test]
    fn no_zones_is_an_error() {
        let err = ZoneAverageTemperature::default()
            .build(NameAllocator::new())
            .unwrap_err();
        assert!(matches!(err, MeasureError::NothingToApply { .. }));
    }
}
