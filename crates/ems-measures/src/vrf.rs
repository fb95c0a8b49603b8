//! Variable refrigerant flow mode override.
//!
//! Forces selected VRF outdoor units into heating mode and runs every
//! attached terminal unit at a fixed part load ratio. Mode constants are
//! initialised once per environment; the override runs inside the HVAC
//! iteration loop.

use ems_core::{ensure_finite, format_real};
use ems_program::{
    Actuator, CallingPoint, ComponentKind, ComponentRef, EmsModel, GlobalVariable, Identifier,
    NameAllocator, OutputDataType, OutputVariable, Program, ProgramBuilder, ProgramCallingManager,
    UpdateFrequency, sanitize,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{MeasureError, MeasureResult};
use crate::measure::Measure;

const MEASURE: &str = "vrf mode override";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VrfUnit {
    /// Outdoor heat pump unit.
    pub name: String,
    /// Indoor terminal units attached to it.
    #[serde(default)]
    pub terminals: Vec<String>,
}

impl VrfUnit {
    pub fn new(name: impl Into<String>, terminals: Vec<String>) -> Self {
        Self {
            name: name.into(),
            terminals,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VrfModeOverride {
    pub units: Vec<VrfUnit>,
    /// Applied to every terminal; in `(0, 1]`.
    pub part_load_ratio: f64,
    pub init_program: String,
    pub init_calling_manager: String,
    pub program: String,
    pub calling_manager: String,
}

impl Default for VrfModeOverride {
    fn default() -> Self {
        Self {
            units: Vec::new(),
            part_load_ratio: 0.5,
            init_program: "InitializeVRFControlModes".to_string(),
            init_calling_manager: "Init VRF Control Mode Constants".to_string(),
            program: "VRFControl".to_string(),
            calling_manager: "VRF OnOff Management".to_string(),
        }
    }
}

impl VrfModeOverride {
    pub fn new(units: Vec<VrfUnit>) -> Self {
        Self {
            units,
            ..Self::default()
        }
    }

    fn check_part_load_ratio(&self) -> MeasureResult<f64> {
        let plr = ensure_finite(self.part_load_ratio, "part load ratio")?;
        if plr <= 0.0 || plr > 1.0 {
            return Err(MeasureError::InvalidArgument {
                measure: MEASURE,
                what: format!("part load ratio {plr} must be greater than 0 and at most 1"),
            });
        }
        Ok(plr)
    }
}

impl Measure for VrfModeOverride {
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
                what: "no VRF outdoor units selected",
            });
        }
        if self.units.iter().all(|u| u.terminals.is_empty()) {
            return Err(MeasureError::NothingToApply {
                measure: MEASURE,
                what: "selected VRF outdoor units have no terminal units",
            });
        }
        let plr = format_real(self.check_part_load_ratio()?);

        let mut model = EmsModel::new();
        let mut init = ProgramBuilder::new();
        let mut control = ProgramBuilder::new();
        for unit in &self.units {
            let (n, next) = names.advance()?;
            names = next;

            let modes = [("off", "0.0"), ("cooling", "1.0"), ("heating", "2.0")];
            for (mode, value) in modes {
                let global = Identifier::new(format!("vrf_status_{mode}_{n}"))?;
                init = init.set(global.as_str(), value);
                model.add_global(GlobalVariable::new(global))?;
            }

            let outdoor = ComponentRef::new(unit.name.as_str(), ComponentKind::VrfHeatPump);
            let mode = Identifier::new(format!("VRF_Actuator_OnOff{n}"))?;
            model.add_actuator(Actuator::for_component(
                mode.clone(),
                &outdoor,
                "Operating Mode",
            )?)?;

            if unit.terminals.is_empty() {
                info!(unit = %unit.name, "VRF outdoor unit has no terminal units");
            }
            for terminal in &unit.terminals {
                let indoor = ComponentRef::new(terminal.as_str(), ComponentKind::VrfTerminal);
                let ratio = Identifier::new(format!("{}_VRF{n}", sanitize(terminal)))?;
                model.add_actuator(Actuator::for_component(
                    ratio.clone(),
                    &indoor,
                    "Part Load Ratio",
                )?)?;
                control = control
                    .set(mode.as_str(), &format!("vrf_status_heating_{n}"))
                    .set(ratio.as_str(), &plr);
            }

            model.add_output_variable(
                OutputVariable::new(format!("Erl VRF Control Status{n}"), mode)
                    .with_data(OutputDataType::Averaged)
                    .with_frequency(UpdateFrequency::SystemTimestep),
            )?;
        }

        let init_program = Identifier::new(self.init_program.as_str())?;
        model.add_program(Program::new(init_program.clone(), init.build()?))?;
        let program = Identifier::new(self.program.as_str())?;
        model.add_program(Program::new(program.clone(), control.build()?))?;
        model.add_calling_manager(
            ProgramCallingManager::new(
                self.init_calling_manager.as_str(),
                CallingPoint::BeginNewEnvironment,
            )
            .with_program(init_program),
        )?;
        model.add_calling_manager(
            ProgramCallingManager::new(
                self.calling_manager.as_str(),
                CallingPoint::InsideHVACSystemIterationLoop,
            )
            .with_program(program),
        )?;
        debug!(units = self.units.len(), plr = %plr, "vrf override programs built");

        Ok((model, names))
    }
}
