//! Project schema definitions.

use ems_measures::MeasureConfig;
use ems_program::{
    CallingPoint, Comparison, ComponentRef, OutputDataType, OutputReporting, UpdateFrequency,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub output: OutputReporting,
    #[serde(default)]
    pub sensors: Vec<SensorDef>,
    #[serde(default)]
    pub actuators: Vec<ActuatorDef>,
    #[serde(default)]
    pub globals: Vec<String>,
    #[serde(default)]
    pub trends: Vec<TrendDef>,
    #[serde(default)]
    pub internal_variables: Vec<InternalVariableDef>,
    #[serde(default)]
    pub output_variables: Vec<OutputVariableDef>,
    #[serde(default)]
    pub rule_programs: Vec<RuleProgramDef>,
    #[serde(default)]
    pub programs: Vec<ProgramDef>,
    #[serde(default)]
    pub measures: Vec<MeasureConfig>,
}

impl Project {
    /// Empty project at the latest schema version.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: crate::migrate::LATEST_VERSION,
            name: name.into(),
            output: OutputReporting::default(),
            sensors: Vec::new(),
            actuators: Vec::new(),
            globals: Vec::new(),
            trends: Vec::new(),
            internal_variables: Vec::new(),
            output_variables: Vec::new(),
            rule_programs: Vec::new(),
            programs: Vec::new(),
            measures: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensorDef {
    pub name: String,
    #[serde(default)]
    pub key: String,
    pub output_variable: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActuatorDef {
    pub name: String,
    pub component: ComponentRef,
    pub control: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendDef {
    pub name: String,
    pub source: String,
    pub timesteps: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InternalVariableDef {
    pub name: String,
    #[serde(default)]
    pub key: String,
    pub data_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputVariableDef {
    pub name: String,
    pub variable: String,
    #[serde(default)]
    pub data: OutputDataType,
    #[serde(default)]
    pub frequency: UpdateFrequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
}

/// Where a program runs. Programs naming the same manager share it, in file
/// order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleDef {
    pub calling_point: CallingPoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<String>,
}

/// Piecewise threshold program.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleProgramDef {
    pub name: String,
    pub comparison_variable: String,
    /// Absent in version 0 files, where `<=` was implied.
    #[serde(default)]
    pub comparison: Comparison,
    pub rules: Vec<RuleDef>,
    pub default: ActionDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleDef {
    pub boundary: f64,
    pub variable: String,
    pub expression: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionDef {
    pub variable: String,
    pub expression: String,
}

/// Free-form program or subroutine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgramDef {
    pub name: String,
    #[serde(default)]
    pub subroutine: bool,
    pub lines: Vec<LineDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleDef>,
}

/// One program line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LineDef {
    Set { target: String, expr: String },
    If { condition: String },
    ElseIf { condition: String },
    Else,
    EndIf,
    Run { subroutine: String },
    Return,
}
