//! Component kinds that programs actuate.
//!
//! Host objects are classified once, when they enter the model, into a small
//! closed set of kinds. Each kind knows its actuator component type and the
//! control types it offers, so nothing downstream inspects host types again.

use core::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PumpSpeed {
    #[default]
    Constant,
    Variable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleKind {
    #[default]
    Compact,
    Constant,
    Year,
}

/// Capability-tagged component kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComponentKind {
    Pump {
        #[serde(default)]
        speed: PumpSpeed,
    },
    /// Heating or cooling coil. Read through sensors only.
    Coil,
    PlantLoop,
    AirLoop,
    Surface,
    SystemNode,
    Schedule {
        #[serde(default)]
        kind: ScheduleKind,
    },
    Curve,
    VrfHeatPump,
    VrfTerminal,
    /// `Sizing:System` results of an air loop.
    AirSystemSizing,
}

impl ComponentKind {
    /// Short lowercase name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pump { .. } => "pump",
            Self::Coil => "coil",
            Self::PlantLoop => "plant loop",
            Self::AirLoop => "air loop",
            Self::Surface => "surface",
            Self::SystemNode => "system node",
            Self::Schedule { .. } => "schedule",
            Self::Curve => "curve",
            Self::VrfHeatPump => "vrf heat pump",
            Self::VrfTerminal => "vrf terminal",
            Self::AirSystemSizing => "air system sizing",
        }
    }

    /// Actuated component type, `None` if the kind has no actuators.
    pub fn actuator_type(&self) -> Option<&'static str> {
        match self {
            Self::Pump { .. } => Some("Pump"),
            Self::Coil => None,
            Self::PlantLoop => Some("Plant Loop Overall"),
            Self::AirLoop => Some("AirLoopHVAC"),
            Self::Surface => Some("Surface"),
            Self::SystemNode => Some("System Node Setpoint"),
            Self::Schedule { kind } => Some(match kind {
                ScheduleKind::Compact => "Schedule:Compact",
                ScheduleKind::Constant => "Schedule:Constant",
                ScheduleKind::Year => "Schedule:Year",
            }),
            Self::Curve => Some("Curve"),
            Self::VrfHeatPump => Some("Variable Refrigerant Flow Heat Pump"),
            Self::VrfTerminal => Some("Variable Refrigerant Flow Terminal Unit"),
            Self::AirSystemSizing => Some("Sizing:System"),
        }
    }

    /// Control types offered, in their canonical spelling.
    pub fn controls(&self) -> &'static [&'static str] {
        match self {
            Self::Pump { .. } => &["Pump Mass Flow Rate", "Pump Pressure Rise"],
            Self::Coil => &[],
            Self::PlantLoop => &["On/Off Supervisory"],
            Self::AirLoop => &["Availability Status"],
            Self::Surface => &["Construction State"],
            Self::SystemNode => &[
                "Temperature Setpoint",
                "Temperature Minimum Setpoint",
                "Temperature Maximum Setpoint",
                "Humidity Ratio Setpoint",
                "Mass Flow Rate Setpoint",
            ],
            Self::Schedule { .. } => &["Schedule Value"],
            Self::Curve => &["Curve Result"],
            Self::VrfHeatPump => &["Operating Mode"],
            Self::VrfTerminal => &["Part Load Ratio"],
            Self::AirSystemSizing => &[
                "Main Supply Volume Flow Rate",
                "Main Supply Cooling Capacity",
                "Main Supply Heating Capacity",
            ],
        }
    }

    pub fn supports(&self, control: &str) -> bool {
        self.controls()
            .iter()
            .any(|c| c.eq_ignore_ascii_case(control.trim()))
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Host object by name, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRef {
    pub name: String,
    pub kind: ComponentKind,
}

impl ComponentRef {
    pub fn new(name: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plant_loop_offers_supervisory_control() {
        let kind = ComponentKind::PlantLoop;
        assert_eq!(kind.actuator_type(), Some("Plant Loop Overall"));
        assert!(kind.supports("on/off supervisory"));
        assert!(!kind.supports("Pump Mass Flow Rate"));
    }

    #[test]
    fn schedule_type_follows_schedule_kind() {
        let kind = ComponentKind::Schedule {
            kind: ScheduleKind::Year,
        };
        assert_eq!(kind.actuator_type(), Some("Schedule:Year"));
    }

    #[test]
    fn coil_has_no_controls() {
        assert_eq!(ComponentKind::Coil.actuator_type(), None);
        assert!(ComponentKind::Coil.controls().is_empty());
    }

    #[test]
    fn kind_deserializes_from_tag() {
        let kind: ComponentKind =
            serde_json::from_str(r#"{"type":"pump","speed":"variable"}"#).unwrap();
        assert_eq!(
            kind,
            ComponentKind::Pump {
                speed: PumpSpeed::Variable
            }
        );
        let kind: ComponentKind = serde_json::from_str(r#"{"type":"pump"}"#).unwrap();
        assert_eq!(
            kind,
            ComponentKind::Pump {
                speed: PumpSpeed::Constant
            }
        );
        let kind: ComponentKind = serde_json::from_str(r#"{"type":"plant_loop"}"#).unwrap();
        assert_eq!(kind, ComponentKind::PlantLoop);
    }
}
