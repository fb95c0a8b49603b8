//! EMS object declarations.
//!
//! Each type mirrors one `EnergyManagementSystem:*` input object. Variable
//! names are [`Identifier`]s; host object names (zones, surfaces, output
//! variables) stay plain strings because the host allows spaces in them.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::component::ComponentRef;
use crate::error::{ProgramError, ProgramResult};
use crate::ident::Identifier;
use crate::program::ProgramText;

/// Read-only binding to a simulation output variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Sensor {
    pub name: Identifier,
    /// Key value (zone, surface or `Environment`); empty for meters.
    pub key: String,
    /// Output variable or meter name, e.g. `Site Outdoor Air Drybulb Temperature`.
    pub output_variable: String,
}

impl Sensor {
    pub fn new(name: Identifier, key: impl Into<String>, output_variable: impl Into<String>) -> Self {
        Self {
            name,
            key: key.into(),
            output_variable: output_variable.into(),
        }
    }
}

/// Write binding that overrides a control point.
#[derive(Debug, Clone, PartialEq)]
pub struct Actuator {
    pub name: Identifier,
    /// Host object the actuator acts on.
    pub component_name: String,
    /// Actuated component type, e.g. `Plant Loop Overall`.
    pub component_type: String,
    /// Control type, e.g. `On/Off Supervisory`.
    pub control_type: String,
}

impl Actuator {
    /// Actuator with explicit types, no capability check.
    pub fn new(
        name: Identifier,
        component_name: impl Into<String>,
        component_type: impl Into<String>,
        control_type: impl Into<String>,
    ) -> Self {
        Self {
            name,
            component_name: component_name.into(),
            component_type: component_type.into(),
            control_type: control_type.into(),
        }
    }

    /// Actuator whose component type and control spelling come from the
    /// component's kind.
    ///
    /// # Errors
    ///
    /// `UnsupportedControl` if the kind cannot be actuated or does not offer
    /// `control` (compared case-insensitively).
    pub fn for_component(
        name: Identifier,
        component: &ComponentRef,
        control: &str,
    ) -> ProgramResult<Self> {
        let kind = &component.kind;
        let unsupported = || ProgramError::UnsupportedControl {
            component_type: kind.actuator_type().unwrap_or(kind.label()),
            control: control.to_string(),
        };
        let component_type = kind.actuator_type().ok_or_else(unsupported)?;
        let control_type = kind
            .controls()
            .iter()
            .find(|c| c.eq_ignore_ascii_case(control.trim()))
            .ok_or_else(unsupported)?;
        Ok(Self::new(
            name,
            component.name.clone(),
            component_type,
            *control_type,
        ))
    }
}

/// Global ERL variable shared by all programs.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalVariable {
    pub name: Identifier,
}

impl GlobalVariable {
    pub fn new(name: Identifier) -> Self {
        Self { name }
    }
}

/// Rolling log of an ERL variable, read through `@Trend*` functions.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendVariable {
    pub name: Identifier,
    /// Logged variable (sensor or global).
    pub source: Identifier,
    /// Number of timesteps kept.
    pub timesteps: u32,
}

impl TrendVariable {
    pub fn new(name: Identifier, source: Identifier, timesteps: u32) -> Self {
        Self {
            name,
            source,
            timesteps,
        }
    }
}

/// Read-only binding to a static simulation value (sizing results, areas).
#[derive(Debug, Clone, PartialEq)]
pub struct InternalVariable {
    pub name: Identifier,
    pub key: String,
    /// Internal data type, e.g. `Intermediate Air System Main Supply Volume Flow Rate`.
    pub data_type: String,
}

impl InternalVariable {
    pub fn new(name: Identifier, key: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name,
            key: key.into(),
            data_type: data_type.into(),
        }
    }
}

/// Handle to a construction, assignable to a `Construction State` actuator.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructionIndexVariable {
    pub name: Identifier,
    pub construction: String,
}

impl ConstructionIndexVariable {
    pub fn new(name: Identifier, construction: impl Into<String>) -> Self {
        Self {
            name,
            construction: construction.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputDataType {
    #[default]
    Averaged,
    Summed,
}

impl OutputDataType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Averaged => "Averaged",
            Self::Summed => "Summed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UpdateFrequency {
    #[default]
    ZoneTimestep,
    SystemTimestep,
}

impl UpdateFrequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ZoneTimestep => "ZoneTimestep",
            Self::SystemTimestep => "SystemTimestep",
        }
    }
}

/// Report an ERL variable as a regular output variable.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputVariable {
    /// Reported name; may contain spaces.
    pub name: String,
    pub ems_variable: Identifier,
    pub data: OutputDataType,
    pub frequency: UpdateFrequency,
    pub units: Option<String>,
}

impl OutputVariable {
    pub fn new(name: impl Into<String>, ems_variable: Identifier) -> Self {
        Self {
            name: name.into(),
            ems_variable,
            data: OutputDataType::default(),
            frequency: UpdateFrequency::default(),
            units: None,
        }
    }

    pub fn with_data(mut self, data: OutputDataType) -> Self {
        self.data = data;
        self
    }

    pub fn with_frequency(mut self, frequency: UpdateFrequency) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }
}

/// How often the host writes a requested variable to its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReportingFrequency {
    Detailed,
    Timestep,
    #[default]
    Hourly,
    Daily,
    Monthly,
    RunPeriod,
}

impl ReportingFrequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Detailed => "Detailed",
            Self::Timestep => "Timestep",
            Self::Hourly => "Hourly",
            Self::Daily => "Daily",
            Self::Monthly => "Monthly",
            Self::RunPeriod => "RunPeriod",
        }
    }
}

/// Host `Output:Variable` request; without one the host computes a variable
/// but never writes it out.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRequest {
    /// Key value, `*` for every key.
    pub key: String,
    pub variable: String,
    pub frequency: ReportingFrequency,
}

impl OutputRequest {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            key: "*".to_string(),
            variable: variable.into(),
            frequency: ReportingFrequency::default(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_frequency(mut self, frequency: ReportingFrequency) -> Self {
        self.frequency = frequency;
        self
    }

    /// Same key, variable and frequency (names compared case-insensitively).
    pub fn same_as(&self, other: &OutputRequest) -> bool {
        self.frequency == other.frequency
            && self.key.eq_ignore_ascii_case(&other.key)
            && self.variable.eq_ignore_ascii_case(&other.variable)
    }
}

/// Named program or subroutine body.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub name: Identifier,
    pub body: ProgramText,
}

impl Program {
    pub fn new(name: Identifier, body: ProgramText) -> Self {
        Self { name, body }
    }
}

/// Runs an ordered list of programs at one calling point.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramCallingManager {
    /// Display name; may contain spaces.
    pub name: String,
    pub calling_point: CallingPoint,
    pub programs: Vec<Identifier>,
}

impl ProgramCallingManager {
    pub fn new(name: impl Into<String>, calling_point: CallingPoint) -> Self {
        Self {
            name: name.into(),
            calling_point,
            programs: Vec::new(),
        }
    }

    /// Append a program to the run order.
    pub fn with_program(mut self, program: Identifier) -> Self {
        self.programs.push(program);
        self
    }
}

macro_rules! calling_points {
    ($($variant:ident),+ $(,)?) => {
        /// Phase of the simulation timestep loop at which programs run.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum CallingPoint {
            $($variant,)+
        }

        impl CallingPoint {
            pub const ALL: &'static [CallingPoint] = &[$(CallingPoint::$variant,)+];

            /// EnergyPlus keyword.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(CallingPoint::$variant => stringify!($variant),)+
                }
            }
        }
    };
}

calling_points!(
    BeginNewEnvironment,
    AfterNewEnvironmentWarmUpIsComplete,
    BeginZoneTimestepBeforeInitHeatBalance,
    BeginZoneTimestepAfterInitHeatBalance,
    BeginTimestepBeforePredictor,
    BeginZoneTimestepBeforeSetCurrentWeather,
    AfterPredictorBeforeHVACManagers,
    AfterPredictorAfterHVACManagers,
    InsideHVACSystemIterationLoop,
    EndOfZoneTimestepBeforeZoneReporting,
    EndOfZoneTimestepAfterZoneReporting,
    EndOfSystemTimestepBeforeHVACReporting,
    EndOfSystemTimestepAfterHVACReporting,
    EndOfZoneSizing,
    EndOfSystemSizing,
    AfterComponentInputReadIn,
    UserDefinedComponentModel,
    UnitarySystemSizing,
);

impl fmt::Display for CallingPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallingPoint {
    type Err = ProgramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|cp| cp.as_str().eq_ignore_ascii_case(s))
            .ok_or(ProgramError::InvalidArg {
                what: "unknown calling point",
            })
    }
}

impl TryFrom<String> for CallingPoint {
    type Error = ProgramError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CallingPoint> for String {
    fn from(cp: CallingPoint) -> Self {
        cp.as_str().to_string()
    }
}

/// Availability dictionary reporting level (actuators, internal variables).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DictionaryReporting {
    #[default]
    None,
    NotByUniqueKeyNames,
    Verbose,
}

impl DictionaryReporting {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::NotByUniqueKeyNames => "NotByUniqueKeyNames",
            Self::Verbose => "Verbose",
        }
    }
}

/// ERL debug file level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DebugOutputLevel {
    #[default]
    None,
    ErrorsOnly,
    Verbose,
}

impl DebugOutputLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::ErrorsOnly => "ErrorsOnly",
            Self::Verbose => "Verbose",
        }
    }
}

/// `Output:EnergyManagementSystem` settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputReporting {
    pub actuator_availability: DictionaryReporting,
    pub internal_variable_availability: DictionaryReporting,
    pub debug_level: DebugOutputLevel,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentKind, PumpSpeed};

    fn id(s: &str) -> Identifier {
        Identifier::new(s).unwrap()
    }

    #[test]
    fn calling_point_parses_case_insensitively() {
        let cp: CallingPoint = "insidehvacsystemiterationloop".parse().unwrap();
        assert_eq!(cp, CallingPoint::InsideHVACSystemIterationLoop);
        assert_eq!(cp.to_string(), "InsideHVACSystemIterationLoop");
        assert!("NotACallingPoint".parse::<CallingPoint>().is_err());
    }

    #[test]
    fn calling_points_are_distinct() {
        assert_eq!(CallingPoint::ALL.len(), 18);
        for cp in CallingPoint::ALL {
            assert_eq!(cp.as_str().parse::<CallingPoint>().unwrap(), *cp);
        }
    }

    #[test]
    fn calling_point_serde_uses_keyword() {
        let json = serde_json::to_string(&CallingPoint::EndOfSystemSizing).unwrap();
        assert_eq!(json, "\"EndOfSystemSizing\"");
        let back: CallingPoint = serde_json::from_str("\"endofsystemsizing\"").unwrap();
        assert_eq!(back, CallingPoint::EndOfSystemSizing);
    }

    #[test]
    fn actuator_resolves_canonical_control_spelling() {
        let pump = ComponentRef::new(
            "CondLoop Pump",
            ComponentKind::Pump {
                speed: PumpSpeed::Variable,
            },
        );
        let act = Actuator::for_component(id("CondLoopPump1"), &pump, "pump mass flow rate")
            .unwrap();
        assert_eq!(act.component_type, "Pump");
        assert_eq!(act.control_type, "Pump Mass Flow Rate");
        assert_eq!(act.component_name, "CondLoop Pump");
    }

    #[test]
    fn coil_cannot_be_actuated() {
        let coil = ComponentRef::new("Main Cooling Coil", ComponentKind::Coil);
        let err = Actuator::for_component(id("Coil1"), &coil, "Anything").unwrap_err();
        assert!(matches!(err, ProgramError::UnsupportedControl { .. }));
    }

    #[test]
    fn output_variable_builder() {
        let ov = OutputVariable::new("EMS Condenser Flow Override On1", id("PumpFlowOverrideReport1"))
            .with_frequency(UpdateFrequency::SystemTimestep)
            .with_units("On/Off");
        assert_eq!(ov.data, OutputDataType::Averaged);
        assert_eq!(ov.units.as_deref(), Some("On/Off"));
    }
}
