//! Thermochromic window emulation.
//!
//! A window's construction is swapped every timestep according to its outside
//! face temperature: one construction per temperature band, picked by a
//! piecewise program over the surface temperature sensor.

use ems_program::{
    Actuator, CallingPoint, ComponentKind, ComponentRef, ConstructionIndexVariable, EmsModel,
    Identifier, NameAllocator, PiecewiseRuleProgramBuilder, Program, ProgramCallingManager,
    Sensor, sanitize,
};
use serde::{Deserialize, Serialize};

use crate::error::{MeasureError, MeasureResult};
use crate::measure::Measure;

const MEASURE: &str = "thermochromic window";

/// Construction used while the surface is at or below `up_to_c`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowState {
    pub up_to_c: f64,
    pub construction: String,
}

impl WindowState {
    pub fn new(up_to_c: f64, construction: impl Into<String>) -> Self {
        Self {
            up_to_c,
            construction: construction.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermochromicWindow {
    /// Window sub-surface name.
    pub window: String,
    /// Temperature bands, coldest first.
    pub states: Vec<WindowState>,
    /// Construction above the last band.
    pub default_construction: String,
    pub calling_manager: String,
}

impl Default for ThermochromicWindow {
    fn default() -> Self {
        const BANDS: &[(f64, u32)] = &[
            (26.0, 25),
            (28.0, 27),
            (30.0, 29),
            (32.0, 31),
            (34.0, 33),
            (36.0, 35),
            (38.0, 37),
            (40.0, 39),
            (42.0, 41),
            (44.0, 43),
            (47.5, 45),
            (52.5, 50),
            (57.5, 55),
            (62.5, 60),
            (67.5, 65),
            (72.5, 70),
            (77.5, 75),
            (82.5, 80),
        ];
        Self {
            window: "Perimeter_ZN_1_wall_south_Window_1".to_string(),
            states: BANDS
                .iter()
                .map(|(t, c)| WindowState::new(*t, format!("TCwindow_{c}")))
                .collect(),
            default_construction: "TCwindow_85".to_string(),
            calling_manager: "My thermochromic window emulator".to_string(),
        }
    }
}

impl ThermochromicWindow {
    pub fn for_window(window: impl Into<String>) -> Self {
        Self {
            window: window.into(),
            ..Self::default()
        }
    }
}

impl Measure for ThermochromicWindow {
    fn name(&self) -> &'static str {
        MEASURE
    }

    fn build(&self, names: NameAllocator) -> MeasureResult<(EmsModel, NameAllocator)> {
        if self.window.trim().is_empty() {
            return Err(MeasureError::InvalidArgument {
                measure: MEASURE,
                what: "window name is empty".to_string(),
            });
        }

        let stem = sanitize(&self.window);
        let sensor = Identifier::new(format!("{stem}_Tout"))?;
        let actuator = Identifier::new(format!("{stem}_Construct"))?;
        let program = Identifier::new(format!("{stem}_Control"))?;

        let mut model = EmsModel::new();
        model.add_sensor(Sensor::new(
            sensor.clone(),
            self.window.as_str(),
            "Surface Outside Face Temperature",
        ))?;
        let surface = ComponentRef::new(self.window.as_str(), ComponentKind::Surface);
        model.add_actuator(Actuator::for_component(
            actuator.clone(),
            &surface,
            "Construction State",
        )?)?;

        let constructions = self
            .states
            .iter()
            .map(|s| s.construction.as_str())
            .chain(std::iter::once(self.default_construction.as_str()));
        let mut handles: Vec<(String, Identifier)> = Vec::new();
        for construction in constructions {
            let handle = Identifier::new(sanitize(construction))?;
            match handles.iter().find(|(_, h)| h.key() == handle.key()) {
                Some((other, _)) if other != construction => {
                    return Err(MeasureError::InvalidArgument {
                        measure: MEASURE,
                        what: format!(
                            "constructions '{other}' and '{construction}' both map to {handle}"
                        ),
                    });
                }
                Some(_) => {}
                None => model.add_construction_index(ConstructionIndexVariable::new(
                    handle.clone(),
                    construction,
                ))?,
            }
            handles.push((construction.to_string(), handle));
        }
        let handle_of = |construction: &str| {
            handles
                .iter()
                .find(|(c, _)| c == construction)
                .map(|(_, h)| h.as_str().to_string())
                .unwrap_or_default()
        };

        let body = PiecewiseRuleProgramBuilder::new(sensor.as_str())
            .rules(
                self.states
                    .iter()
                    .map(|s| (s.up_to_c, actuator.as_str(), handle_of(&s.construction))),
            )
            .otherwise(actuator.as_str(), handle_of(&self.default_construction))
            .build()?;
        model.add_program(Program::new(program.clone(), body))?;
        model.add_calling_manager(
            ProgramCallingManager::new(
                self.calling_manager.as_str(),
                CallingPoint::BeginTimestepBeforePredictor,
            )
            .with_program(program),
        )?;

        Ok((model, names))
    }
}
