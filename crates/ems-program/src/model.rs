//! EMS model: every declared object plus cross-reference validation.
//!
//! Variable, program and subroutine names share one case-insensitive
//! namespace, as they do in the simulation engine. Calling managers and
//! output variables have their own.

use core::fmt;
use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{ProgramError, ProgramResult};
use crate::ident::Identifier;
use crate::idf::check_field;
use crate::objects::{
    Actuator, ConstructionIndexVariable, GlobalVariable, InternalVariable, OutputReporting,
    OutputRequest, OutputVariable, Program, ProgramCallingManager, Sensor, TrendVariable,
};

/// What a registered name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameClass {
    Sensor,
    Actuator,
    Global,
    Trend,
    Internal,
    ConstructionIndex,
    Program,
    Subroutine,
}

impl NameClass {
    /// Whether programs may read the name as a variable.
    pub fn is_variable(self) -> bool {
        !matches!(self, Self::Program | Self::Subroutine)
    }

    /// Whether programs may assign to the name.
    pub fn is_writable(self) -> bool {
        matches!(self, Self::Actuator | Self::Global)
    }

    fn label(self) -> &'static str {
        match self {
            Self::Sensor => "sensor",
            Self::Actuator => "actuator",
            Self::Global => "global variable",
            Self::Trend => "trend variable",
            Self::Internal => "internal variable",
            Self::ConstructionIndex => "construction index variable",
            Self::Program => "program",
            Self::Subroutine => "subroutine",
        }
    }
}

/// Ordered collection of EMS objects.
#[derive(Debug, Clone, Default)]
pub struct EmsModel {
    sensors: Vec<Sensor>,
    actuators: Vec<Actuator>,
    globals: Vec<GlobalVariable>,
    trends: Vec<TrendVariable>,
    internal_variables: Vec<InternalVariable>,
    construction_indices: Vec<ConstructionIndexVariable>,
    output_variables: Vec<OutputVariable>,
    programs: Vec<Program>,
    subroutines: Vec<Program>,
    calling_managers: Vec<ProgramCallingManager>,
    output_requests: Vec<OutputRequest>,
    reporting: OutputReporting,
    /// Uppercased name -> class.
    names: HashMap<String, NameClass>,
    /// Uppercased calling manager and output variable names.
    manager_names: HashSet<String>,
    output_names: HashSet<String>,
}

impl EmsModel {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&mut self, name: &Identifier, class: NameClass) -> ProgramResult<()> {
        let key = name.key();
        if self.names.contains_key(&key) {
            return Err(ProgramError::DuplicateName {
                name: name.to_string(),
            });
        }
        self.names.insert(key, class);
        Ok(())
    }

    pub fn add_sensor(&mut self, sensor: Sensor) -> ProgramResult<()> {
        check_field("sensor key", &sensor.key)?;
        check_field("sensor output variable", &sensor.output_variable)?;
        self.register(&sensor.name, NameClass::Sensor)?;
        self.sensors.push(sensor);
        Ok(())
    }

    pub fn add_actuator(&mut self, actuator: Actuator) -> ProgramResult<()> {
        check_field("actuated component", &actuator.component_name)?;
        check_field("actuated component type", &actuator.component_type)?;
        check_field("actuator control type", &actuator.control_type)?;
        self.register(&actuator.name, NameClass::Actuator)?;
        self.actuators.push(actuator);
        Ok(())
    }

    pub fn add_global(&mut self, global: GlobalVariable) -> ProgramResult<()> {
        self.register(&global.name, NameClass::Global)?;
        self.globals.push(global);
        Ok(())
    }

    /// Add a trend variable; `timesteps` must be positive.
    pub fn add_trend(&mut self, trend: TrendVariable) -> ProgramResult<()> {
        if trend.timesteps == 0 {
            return Err(ProgramError::InvalidArg {
                what: "trend variable must log at least one timestep",
            });
        }
        self.register(&trend.name, NameClass::Trend)?;
        self.trends.push(trend);
        Ok(())
    }

    pub fn add_internal_variable(&mut self, variable: InternalVariable) -> ProgramResult<()> {
        check_field("internal variable key", &variable.key)?;
        check_field("internal data type", &variable.data_type)?;
        self.register(&variable.name, NameClass::Internal)?;
        self.internal_variables.push(variable);
        Ok(())
    }

    pub fn add_construction_index(
        &mut self,
        variable: ConstructionIndexVariable,
    ) -> ProgramResult<()> {
        check_field("construction", &variable.construction)?;
        self.register(&variable.name, NameClass::ConstructionIndex)?;
        self.construction_indices.push(variable);
        Ok(())
    }

    pub fn add_output_variable(&mut self, output: OutputVariable) -> ProgramResult<()> {
        check_field("output variable name", &output.name)?;
        if let Some(units) = &output.units {
            check_field("output variable units", units)?;
        }
        if !self.output_names.insert(output.name.to_uppercase()) {
            return Err(ProgramError::DuplicateName { name: output.name });
        }
        self.output_variables.push(output);
        Ok(())
    }

    /// Ask the host to write a variable out. A request equal to one already
    /// present is dropped.
    pub fn add_output_request(&mut self, request: OutputRequest) -> ProgramResult<()> {
        check_field("output request key", &request.key)?;
        check_field("output request variable", &request.variable)?;
        if !self.output_requests.iter().any(|r| r.same_as(&request)) {
            self.output_requests.push(request);
        }
        Ok(())
    }

    pub fn add_program(&mut self, program: Program) -> ProgramResult<()> {
        self.register(&program.name, NameClass::Program)?;
        self.programs.push(program);
        Ok(())
    }

    pub fn add_subroutine(&mut self, subroutine: Program) -> ProgramResult<()> {
        self.register(&subroutine.name, NameClass::Subroutine)?;
        self.subroutines.push(subroutine);
        Ok(())
    }

    pub fn add_calling_manager(&mut self, manager: ProgramCallingManager) -> ProgramResult<()> {
        check_field("calling manager name", &manager.name)?;
        if !self.manager_names.insert(manager.name.to_uppercase()) {
            return Err(ProgramError::DuplicateName { name: manager.name });
        }
        self.calling_managers.push(manager);
        Ok(())
    }

    pub fn set_reporting(&mut self, reporting: OutputReporting) {
        self.reporting = reporting;
    }

    /// Append every object of `other`, keeping its order.
    ///
    /// Reporting settings of `self` are kept. On a name collision nothing is
    /// added.
    pub fn merge(&mut self, other: EmsModel) -> ProgramResult<()> {
        if let Some(name) = other
            .all_names()
            .find(|name| self.names.contains_key(&name.key()))
        {
            return Err(ProgramError::DuplicateName {
                name: name.to_string(),
            });
        }
        if let Some(manager) = other
            .calling_managers
            .iter()
            .find(|m| self.manager_names.contains(&m.name.to_uppercase()))
        {
            return Err(ProgramError::DuplicateName {
                name: manager.name.clone(),
            });
        }
        if let Some(output) = other
            .output_variables
            .iter()
            .find(|o| self.output_names.contains(&o.name.to_uppercase()))
        {
            return Err(ProgramError::DuplicateName {
                name: output.name.clone(),
            });
        }

        for s in other.sensors {
            self.add_sensor(s)?;
        }
        for a in other.actuators {
            self.add_actuator(a)?;
        }
        for g in other.globals {
            self.add_global(g)?;
        }
        for t in other.trends {
            self.add_trend(t)?;
        }
        for iv in other.internal_variables {
            self.add_internal_variable(iv)?;
        }
        for ci in other.construction_indices {
            self.add_construction_index(ci)?;
        }
        for ov in other.output_variables {
            self.add_output_variable(ov)?;
        }
        for p in other.programs {
            self.add_program(p)?;
        }
        for s in other.subroutines {
            self.add_subroutine(s)?;
        }
        for m in other.calling_managers {
            self.add_calling_manager(m)?;
        }
        for r in other.output_requests {
            self.add_output_request(r)?;
        }
        Ok(())
    }

    fn all_names(&self) -> impl Iterator<Item = &Identifier> {
        self.sensors
            .iter()
            .map(|s| &s.name)
            .chain(self.actuators.iter().map(|a| &a.name))
            .chain(self.globals.iter().map(|g| &g.name))
            .chain(self.trends.iter().map(|t| &t.name))
            .chain(self.internal_variables.iter().map(|v| &v.name))
            .chain(self.construction_indices.iter().map(|v| &v.name))
            .chain(self.programs.iter().map(|p| &p.name))
            .chain(self.subroutines.iter().map(|p| &p.name))
    }

    /// Class of a registered name (case-insensitive).
    pub fn lookup(&self, name: &str) -> Option<NameClass> {
        self.names.get(&name.to_ascii_uppercase()).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Check cross references.
    ///
    /// - every name a program reads is a declared variable or assigned by
    ///   the same program
    /// - no program assigns to a sensor, trend, internal or construction
    ///   index variable
    /// - every `RUN` names a declared subroutine
    /// - calling managers list declared programs
    /// - trend sources and reported variables are declared variables
    pub fn validate(&self) -> ProgramResult<()> {
        let bodies = self
            .programs
            .iter()
            .map(|p| ("program", p))
            .chain(self.subroutines.iter().map(|s| ("subroutine", s)));

        for (what, program) in bodies {
            let context = || format!("{} {}", what, program.name);
            let body = &program.body;

            for name in body.reads() {
                let declared = self.lookup(name.as_str()).is_some_and(NameClass::is_variable);
                let local = body.writes().iter().any(|w| w.key() == name.key());
                if !declared && !local {
                    return Err(ProgramError::UndeclaredVariable {
                        name: name.to_string(),
                        context: context(),
                    });
                }
            }

            for name in body.writes() {
                if let Some(class) = self.lookup(name.as_str()) {
                    if !class.is_writable() {
                        return Err(ProgramError::ReadOnlyAssignment {
                            name: name.to_string(),
                            context: format!("{} (a {})", context(), class.label()),
                        });
                    }
                }
            }

            for name in body.runs() {
                if self.lookup(name.as_str()) != Some(NameClass::Subroutine) {
                    return Err(ProgramError::UnknownReference {
                        name: name.to_string(),
                        context: context(),
                    });
                }
            }
        }

        for manager in &self.calling_managers {
            for name in &manager.programs {
                if self.lookup(name.as_str()) != Some(NameClass::Program) {
                    return Err(ProgramError::UnknownReference {
                        name: name.to_string(),
                        context: format!("calling manager {}", manager.name),
                    });
                }
            }
        }

        for trend in &self.trends {
            if !self
                .lookup(trend.source.as_str())
                .is_some_and(|c| matches!(c, NameClass::Sensor | NameClass::Global))
            {
                return Err(ProgramError::UnknownReference {
                    name: trend.source.to_string(),
                    context: format!("trend variable {}", trend.name),
                });
            }
        }

        for output in &self.output_variables {
            if !self
                .lookup(output.ems_variable.as_str())
                .is_some_and(NameClass::is_variable)
            {
                return Err(ProgramError::UnknownReference {
                    name: output.ems_variable.to_string(),
                    context: format!("output variable {}", output.name),
                });
            }
        }

        debug!(summary = %self.summary(), "EMS model validated");
        Ok(())
    }

    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    pub fn actuators(&self) -> &[Actuator] {
        &self.actuators
    }

    pub fn globals(&self) -> &[GlobalVariable] {
        &self.globals
    }

    pub fn trends(&self) -> &[TrendVariable] {
        &self.trends
    }

    pub fn internal_variables(&self) -> &[InternalVariable] {
        &self.internal_variables
    }

    pub fn construction_indices(&self) -> &[ConstructionIndexVariable] {
        &self.construction_indices
    }

    pub fn output_variables(&self) -> &[OutputVariable] {
        &self.output_variables
    }

    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    pub fn subroutines(&self) -> &[Program] {
        &self.subroutines
    }

    pub fn calling_managers(&self) -> &[ProgramCallingManager] {
        &self.calling_managers
    }

    pub fn output_requests(&self) -> &[OutputRequest] {
        &self.output_requests
    }

    pub fn reporting(&self) -> OutputReporting {
        self.reporting
    }

    /// Program or subroutine by name (case-insensitive).
    pub fn find_program(&self, name: &str) -> Option<&Program> {
        self.programs
            .iter()
            .chain(&self.subroutines)
            .find(|p| p.name.as_str().eq_ignore_ascii_case(name))
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            sensors: self.sensors.len(),
            actuators: self.actuators.len(),
            globals: self.globals.len(),
            trends: self.trends.len(),
            internal_variables: self.internal_variables.len(),
            construction_indices: self.construction_indices.len(),
            output_variables: self.output_variables.len(),
            programs: self.programs.len(),
            subroutines: self.subroutines.len(),
            calling_managers: self.calling_managers.len(),
            output_requests: self.output_requests.len(),
            program_lines: self
                .programs
                .iter()
                .chain(&self.subroutines)
                .map(|p| p.body.lines().len())
                .sum(),
        }
    }
}

/// Object counts of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModelSummary {
    pub sensors: usize,
    pub actuators: usize,
    pub globals: usize,
    pub trends: usize,
    pub internal_variables: usize,
    pub construction_indices: usize,
    pub output_variables: usize,
    pub programs: usize,
    pub subroutines: usize,
    pub calling_managers: usize,
    pub output_requests: usize,
    pub program_lines: usize,
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} sensors, {} actuators, {} globals, {} trends, {} internal variables, \
             {} construction indices, {} output variables, {} programs, {} subroutines, \
             {} calling managers, {} output requests, {} program lines",
            self.sensors,
            self.actuators,
            self.globals,
            self.trends,
            self.internal_variables,
            self.construction_indices,
            self.output_variables,
            self.programs,
            self.subroutines,
            self.calling_managers,
            self.output_requests,
            self.program_lines,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::CallingPoint;
    use crate::program::ProgramBuilder;
    use crate::statement::Comparison;

    fn id(s: &str) -> Identifier {
        Identifier::new(s).unwrap()
    }

    fn tower_model() -> EmsModel {
        let mut model = EmsModel::new();
        model
            .add_sensor(Sensor::new(
                id("OutdoorTemp"),
                "Environment",
                "Site Outdoor Air Drybulb Temperature",
            ))
            .unwrap();
        model
            .add_actuator(Actuator::new(
                id("CondLoopActuator_Loop1"),
                "Cond Loop",
                "Plant Loop Overall",
                "On/Off Supervisory",
            ))
            .unwrap();
        let body = ProgramBuilder::new()
            .if_compare("OutdoorTemp", Comparison::Lt, 6.0)
            .set("CondLoopActuator_Loop1", "0.0")
            .else_branch()
            .set("CondLoopActuator_Loop1", "Null")
            .end_if()
            .build()
            .unwrap();
        model
            .add_program(Program::new(id("TowerControl"), body))
            .unwrap();
        model
            .add_calling_manager(
                ProgramCallingManager::new(
                    "Condenser OnOff Management",
                    CallingPoint::InsideHVACSystemIterationLoop,
                )
                .with_program(id("TowerControl")),
            )
            .unwrap();
        model
    }

    #[test]
    fn valid_model_passes() {
        let model = tower_model();
        model.validate().unwrap();
        let summary = model.summary();
        assert_eq!(summary.sensors, 1);
        assert_eq!(summary.program_lines, 5);
    }

    #[test]
    fn names_are_case_insensitive() {
        let mut model = tower_model();
        let err = model.add_global(GlobalVariable::new(id("OUTDOORTEMP"))).unwrap_err();
        assert!(matches!(err, ProgramError::DuplicateName { .. }));
        assert_eq!(model.lookup("outdoortemp"), Some(NameClass::Sensor));
    }

    #[test]
    fn undeclared_read_is_reported() {
        let mut model = tower_model();
        let body = ProgramBuilder::new()
            .set("Local", "Missing + 1")
            .build()
            .unwrap();
        model.add_program(Program::new(id("Broken"), body)).unwrap();
        let err = model.validate().unwrap_err();
        assert_eq!(
            err,
            ProgramError::UndeclaredVariable {
                name: "Missing".to_string(),
                context: "program Broken".to_string(),
            }
        );
    }

    #[test]
    fn locals_may_be_read_after_assignment() {
        let mut model = tower_model();
        let body = ProgramBuilder::new()
            .set("Local", "OutdoorTemp * 2")
            .set("CondLoopActuator_Loop1", "Local")
            .build()
            .unwrap();
        model.add_program(Program::new(id("UsesLocal"), body)).unwrap();
        model.validate().unwrap();
    }

    #[test]
    fn locals_are_matched_case_insensitively() {
        let mut model = tower_model();
        let body = ProgramBuilder::new()
            .set("Local", "1.0")
            .set("CondLoopActuator_Loop1", "LOCAL + 1")
            .build()
            .unwrap();
        model.add_program(Program::new(id("P"), body)).unwrap();
        model.validate().unwrap();
    }

    #[test]
    fn host_text_that_breaks_idf_fields_is_rejected() {
        let mut model = EmsModel::new();
        let err = model
            .add_sensor(Sensor::new(
                id("T"),
                "Zone A, North; !x",
                "Zone Mean Air Temperature",
            ))
            .unwrap_err();
        assert!(matches!(
            err,
            ProgramError::InvalidFieldText {
                field: "sensor key",
                ..
            }
        ));
        assert!(!model.contains("T"));

        let err = model
            .add_calling_manager(ProgramCallingManager::new(
                "Manager\nTwo",
                CallingPoint::EndOfSystemSizing,
            ))
            .unwrap_err();
        assert!(matches!(err, ProgramError::InvalidFieldText { .. }));

        let output = OutputVariable::new("Report", id("T")).with_units("C;F");
        assert!(model.add_output_variable(output).is_err());
    }

    #[test]
    fn writing_a_sensor_is_rejected() {
        let mut model = tower_model();
        let body = ProgramBuilder::new().set("OutdoorTemp", "0.0").build().unwrap();
        model.add_program(Program::new(id("Overwrite"), body)).unwrap();
        assert!(matches!(
            model.validate().unwrap_err(),
            ProgramError::ReadOnlyAssignment { .. }
        ));
    }

    #[test]
    fn run_requires_subroutine() {
        let mut model = tower_model();
        let body = ProgramBuilder::new().run("NoSuchSub").build().unwrap();
        model.add_program(Program::new(id("Caller"), body)).unwrap();
        assert!(matches!(
            model.validate().unwrap_err(),
            ProgramError::UnknownReference { .. }
        ));
    }

    #[test]
    fn calling_manager_requires_program() {
        let mut model = tower_model();
        model
            .add_calling_manager(
                ProgramCallingManager::new("Other", CallingPoint::EndOfSystemSizing)
                    .with_program(id("Ghost")),
            )
            .unwrap();
        assert!(matches!(
            model.validate().unwrap_err(),
            ProgramError::UnknownReference { .. }
        ));
    }

    #[test]
    fn zero_length_trend_is_rejected() {
        let mut model = tower_model();
        let err = model
            .add_trend(TrendVariable::new(id("Log"), id("OutdoorTemp"), 0))
            .unwrap_err();
        assert!(matches!(err, ProgramError::InvalidArg { .. }));
    }

    #[test]
    fn merge_is_all_or_nothing() {
        let mut a = tower_model();
        let before = a.summary();
        let mut b = EmsModel::new();
        b.add_global(GlobalVariable::new(id("Fresh"))).unwrap();
        b.add_sensor(Sensor::new(id("OutdoorTemp"), "Environment", "x")).unwrap();
        assert!(matches!(
            a.merge(b).unwrap_err(),
            ProgramError::DuplicateName { .. }
        ));
        assert_eq!(a.summary(), before);
        assert!(!a.contains("Fresh"));

        let mut c = EmsModel::new();
        c.merge(tower_model()).unwrap();
        assert_eq!(c.summary(), tower_model().summary());
    }

    #[test]
    fn repeated_output_requests_collapse() {
        use crate::objects::{OutputRequest, ReportingFrequency};

        let mut a = tower_model();
        a.add_output_request(OutputRequest::new("Site Outdoor Air Drybulb Temperature"))
            .unwrap();
        let mut b = EmsModel::new();
        b.add_output_request(OutputRequest::new("SITE OUTDOOR AIR DRYBULB TEMPERATURE"))
            .unwrap();
        b.add_output_request(
            OutputRequest::new("Site Outdoor Air Drybulb Temperature")
                .with_frequency(ReportingFrequency::Timestep),
        )
        .unwrap();
        a.merge(b).unwrap();

        let requests = a.output_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].key, "*");
        assert_eq!(requests[1].frequency, ReportingFrequency::Timestep);
        assert_eq!(a.summary().output_requests, 2);

        let err = a
            .add_output_request(OutputRequest::new("Zone Mean Air Temperature").with_key("A, B"))
            .unwrap_err();
        assert!(matches!(
            err,
            ProgramError::InvalidFieldText { field: "output request key", .. }
        ));
    }
}
