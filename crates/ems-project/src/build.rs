//! Project -> EMS model.

use ems_measures::apply_batch;
use ems_program::{
    Actuator, CallingPoint, Condition, EmsModel, Expression, GlobalVariable, Identifier,
    InternalVariable, NameAllocator, OutputVariable, PiecewiseRuleProgramBuilder, Program,
    ProgramBuilder, ProgramCallingManager, ProgramResult, Sensor, Statement, TrendVariable,
};
use tracing::debug;

use crate::schema::{LineDef, Project, ScheduleDef};
use crate::validate::{ValidationError, validate_project};
use crate::{ProjectError, ProjectResult};

/// Build and validate the EMS model a project describes.
///
/// Declarations come first, then rule programs and free-form programs in
/// file order, then measures (as one batch). The finished model is
/// cross-checked with [`EmsModel::validate`].
pub fn build_model(project: &Project) -> ProjectResult<EmsModel> {
    validate_project(project)?;

    let mut model = EmsModel::new();
    model.set_reporting(project.output);

    for sensor in &project.sensors {
        model.add_sensor(Sensor::new(
            Identifier::new(sensor.name.as_str())?,
            sensor.key.as_str(),
            sensor.output_variable.as_str(),
        ))?;
    }
    for actuator in &project.actuators {
        model.add_actuator(Actuator::for_component(
            Identifier::new(actuator.name.as_str())?,
            &actuator.component,
            &actuator.control,
        )?)?;
    }
    for global in &project.globals {
        model.add_global(GlobalVariable::new(Identifier::new(global.as_str())?))?;
    }
    for trend in &project.trends {
        model.add_trend(TrendVariable::new(
            Identifier::new(trend.name.as_str())?,
            Identifier::new(trend.source.as_str())?,
            trend.timesteps,
        ))?;
    }
    for variable in &project.internal_variables {
        model.add_internal_variable(InternalVariable::new(
            Identifier::new(variable.name.as_str())?,
            variable.key.as_str(),
            variable.data_type.as_str(),
        ))?;
    }

    let mut managers = Managers::default();

    for def in &project.rule_programs {
        let body = PiecewiseRuleProgramBuilder::new(def.comparison_variable.as_str())
            .comparison(def.comparison)
            .rules(
                def.rules
                    .iter()
                    .map(|r| (r.boundary, r.variable.as_str(), r.expression.as_str())),
            )
            .otherwise(def.default.variable.as_str(), def.default.expression.as_str())
            .build()?;
        let name = Identifier::new(def.name.as_str())?;
        model.add_program(Program::new(name.clone(), body))?;
        if let Some(schedule) = &def.schedule {
            managers.schedule(schedule, name)?;
        }
    }

    for def in &project.programs {
        let mut builder = ProgramBuilder::new();
        for line in &def.lines {
            builder = builder.push(statement(line)?);
        }
        let name = Identifier::new(def.name.as_str())?;
        let program = Program::new(name.clone(), builder.build()?);
        if def.subroutine {
            model.add_subroutine(program)?;
        } else {
            model.add_program(program)?;
            if let Some(schedule) = &def.schedule {
                managers.schedule(schedule, name)?;
            }
        }
    }

    for manager in managers.into_managers() {
        model.add_calling_manager(manager)?;
    }

    if !project.measures.is_empty() {
        apply_batch(&mut model, &project.measures, NameAllocator::new())?;
    }

    for output in &project.output_variables {
        let mut variable = OutputVariable::new(
            output.name.as_str(),
            Identifier::new(output.variable.as_str())?,
        )
        .with_data(output.data)
        .with_frequency(output.frequency);
        if let Some(units) = &output.units {
            variable = variable.with_units(units.as_str());
        }
        model.add_output_variable(variable)?;
    }

    model.validate()?;
    debug!(project = %project.name, summary = %model.summary(), "built EMS model");
    Ok(model)
}

fn statement(line: &LineDef) -> ProgramResult<Statement> {
    Ok(match line {
        LineDef::Set { target, expr } => {
            Statement::assign(Identifier::new(target.as_str())?, Expression::new(expr.as_str())?)
        }
        LineDef::If { condition } => {
            Statement::If(Condition::Expr(Expression::new(condition.as_str())?))
        }
        LineDef::ElseIf { condition } => {
            Statement::ElseIf(Condition::Expr(Expression::new(condition.as_str())?))
        }
        LineDef::Else => Statement::Else,
        LineDef::EndIf => Statement::EndIf,
        LineDef::Run { subroutine } => Statement::Run(Identifier::new(subroutine.as_str())?),
        LineDef::Return => Statement::Return,
    })
}

/// Calling managers in order of first mention.
#[derive(Default)]
struct Managers {
    entries: Vec<ProgramCallingManager>,
}

impl Managers {
    fn schedule(&mut self, schedule: &ScheduleDef, program: Identifier) -> ProjectResult<()> {
        let name = schedule
            .manager
            .clone()
            .unwrap_or_else(|| default_manager_name(schedule.calling_point));
        match self
            .entries
            .iter_mut()
            .find(|m| m.name.eq_ignore_ascii_case(&name))
        {
            Some(existing) if existing.calling_point != schedule.calling_point => {
                Err(ProjectError::Validation(ValidationError::InvalidValue {
                    field: format!("schedule.calling_point of {program}"),
                    value: schedule.calling_point.to_string(),
                    reason: format!(
                        "manager '{}' already runs at {}",
                        existing.name, existing.calling_point
                    ),
                }))
            }
            Some(existing) => {
                existing.programs.push(program);
                Ok(())
            }
            None => {
                self.entries
                    .push(ProgramCallingManager::new(name, schedule.calling_point).with_program(program));
                Ok(())
            }
        }
    }

    fn into_managers(self) -> Vec<ProgramCallingManager> {
        self.entries
    }
}

fn default_manager_name(point: CallingPoint) -> String {
    format!("{point} Programs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ActionDef, ProgramDef, RuleDef, RuleProgramDef, SensorDef};
    use ems_program::Comparison;

    fn window_project() -> Project {
        let mut project = Project::new("window");
        project.sensors.push(SensorDef {
            name: "Tout".to_string(),
            key: "Win1".to_string(),
            output_variable: "Surface Outside Face Temperature".to_string(),
        });
        project.globals.extend(["C", "TC_25", "TC_85"].map(String::from));
        project.rule_programs.push(RuleProgramDef {
            name: "Win1_Control".to_string(),
            comparison_variable: "Tout".to_string(),
            comparison: Comparison::Le,
            rules: vec![RuleDef {
                boundary: 26.0,
                variable: "C".to_string(),
                expression: "TC_25".to_string(),
            }],
            default: ActionDef {
                variable: "C".to_string(),
                expression: "TC_85".to_string(),
            },
            schedule: Some(ScheduleDef {
                calling_point: CallingPoint::BeginTimestepBeforePredictor,
                manager: None,
            }),
        });
        project
    }

    #[test]
    fn rule_program_gets_default_manager() {
        let model = build_model(&window_project()).unwrap();
        let manager = &model.calling_managers()[0];
        assert_eq!(manager.name, "BeginTimestepBeforePredictor Programs");
        assert_eq!(manager.programs[0].as_str(), "Win1_Control");
    }

    #[test]
    fn programs_share_named_manager() {
        let mut project = window_project();
        project.programs.push(ProgramDef {
            name: "Reset".to_string(),
            subroutine: false,
            lines: vec![LineDef::Set {
                target: "C".to_string(),
                expr: "TC_25".to_string(),
            }],
            schedule: Some(ScheduleDef {
                calling_point: CallingPoint::BeginTimestepBeforePredictor,
                manager: None,
            }),
        });
        let model = build_model(&project).unwrap();
        assert_eq!(model.calling_managers().len(), 1);
        assert_eq!(model.calling_managers()[0].programs.len(), 2);
    }

    #[test]
    fn conflicting_calling_points_are_rejected() {
        let mut project = window_project();
        project.programs.push(ProgramDef {
            name: "Reset".to_string(),
            subroutine: false,
            lines: vec![LineDef::Return],
            schedule: Some(ScheduleDef {
                calling_point: CallingPoint::EndOfSystemSizing,
                manager: Some("BeginTimestepBeforePredictor Programs".to_string()),
            }),
        });
        assert!(matches!(
            build_model(&project).unwrap_err(),
            ProjectError::Validation(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn undeclared_read_surfaces_as_program_error() {
        let mut project = window_project();
        project.globals.retain(|g| g != "TC_85");
        assert!(matches!(
            build_model(&project).unwrap_err(),
            ProjectError::Program(_)
        ));
    }
}
