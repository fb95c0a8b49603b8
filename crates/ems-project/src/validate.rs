//! Project validation logic.
//!
//! Checks what can be checked on the file alone: schema version, name
//! syntax, uniqueness, and references between declarations. Whether programs
//! only read declared names is checked on the built model.

use std::collections::HashMap;

use ems_program::{Identifier, field_text_error};

use crate::schema::{LineDef, Project};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported feature: {feature} - {reason}")]
    Unsupported { feature: String, reason: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Declared {
    Sensor,
    Actuator,
    Global,
    Trend,
    Internal,
    Program,
    Subroutine,
}

/// Case-insensitive registry of declared names.
#[derive(Default)]
struct Names {
    by_key: HashMap<String, Declared>,
}

impl Names {
    fn declare(&mut self, name: &str, kind: Declared, field: String) -> Result<(), ValidationError> {
        check_identifier(name, &field)?;
        if self.by_key.insert(name.to_ascii_uppercase(), kind).is_some() {
            return Err(ValidationError::DuplicateId {
                id: name.to_string(),
                context: field,
            });
        }
        Ok(())
    }

    fn get(&self, name: &str) -> Option<Declared> {
        self.by_key.get(&name.to_ascii_uppercase()).copied()
    }
}

fn check_identifier(name: &str, field: &str) -> Result<(), ValidationError> {
    Identifier::new(name)
        .map(|_| ())
        .map_err(|err| ValidationError::InvalidValue {
            field: field.to_string(),
            value: name.to_string(),
            reason: err.to_string(),
        })
}

/// Host object text lands in IDF fields verbatim.
fn check_host_text(value: &str, field: impl FnOnce() -> String) -> Result<(), ValidationError> {
    match field_text_error(value) {
        Some(reason) => Err(ValidationError::InvalidValue {
            field: field(),
            value: value.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    let mut names = Names::default();

    for (i, sensor) in project.sensors.iter().enumerate() {
        names.declare(&sensor.name, Declared::Sensor, format!("sensors[{i}].name"))?;
        check_host_text(&sensor.key, || format!("sensors[{i}].key"))?;
        check_host_text(&sensor.output_variable, || {
            format!("sensors[{i}].output_variable")
        })?;
    }

    for (i, actuator) in project.actuators.iter().enumerate() {
        names.declare(&actuator.name, Declared::Actuator, format!("actuators[{i}].name"))?;
        check_host_text(&actuator.component.name, || {
            format!("actuators[{i}].component.name")
        })?;
        let kind = &actuator.component.kind;
        if !kind.supports(&actuator.control) {
            return Err(ValidationError::Unsupported {
                feature: format!("actuators[{i}].control = {}", actuator.control),
                reason: format!("{} components offer {:?}", kind, kind.controls()),
            });
        }
    }

    for (i, global) in project.globals.iter().enumerate() {
        names.declare(global, Declared::Global, format!("globals[{i}]"))?;
    }

    for (i, variable) in project.internal_variables.iter().enumerate() {
        names.declare(
            &variable.name,
            Declared::Internal,
            format!("internal_variables[{i}].name"),
        )?;
        check_host_text(&variable.key, || format!("internal_variables[{i}].key"))?;
        check_host_text(&variable.data_type, || {
            format!("internal_variables[{i}].data_type")
        })?;
    }

    for (i, trend) in project.trends.iter().enumerate() {
        names.declare(&trend.name, Declared::Trend, format!("trends[{i}].name"))?;
        if trend.timesteps == 0 {
            return Err(ValidationError::InvalidValue {
                field: format!("trends[{i}].timesteps"),
                value: "0".to_string(),
                reason: "must log at least one timestep".to_string(),
            });
        }
        if !matches!(
            names.get(&trend.source),
            Some(Declared::Sensor | Declared::Global)
        ) {
            return Err(ValidationError::MissingReference {
                id: trend.source.clone(),
                context: format!("trends[{i}].source"),
            });
        }
    }

    for (i, program) in project.rule_programs.iter().enumerate() {
        names.declare(&program.name, Declared::Program, format!("rule_programs[{i}].name"))?;
        if program.rules.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: format!("rule_programs[{i}].rules"),
                value: "[]".to_string(),
                reason: "at least one rule is required".to_string(),
            });
        }
        for (j, rule) in program.rules.iter().enumerate() {
            if !rule.boundary.is_finite() {
                return Err(ValidationError::InvalidValue {
                    field: format!("rule_programs[{i}].rules[{j}].boundary"),
                    value: rule.boundary.to_string(),
                    reason: "must be finite".to_string(),
                });
            }
        }
    }

    let schedules = project
        .rule_programs
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.schedule.as_ref().map(|s| (format!("rule_programs[{i}]"), s)))
        .chain(
            project
                .programs
                .iter()
                .enumerate()
                .filter_map(|(i, p)| p.schedule.as_ref().map(|s| (format!("programs[{i}]"), s))),
        );
    for (owner, schedule) in schedules {
        if let Some(manager) = &schedule.manager {
            check_host_text(manager, || format!("{owner}.schedule.manager"))?;
        }
    }

    for (i, program) in project.programs.iter().enumerate() {
        let kind = if program.subroutine {
            Declared::Subroutine
        } else {
            Declared::Program
        };
        names.declare(&program.name, kind, format!("programs[{i}].name"))?;
        if program.subroutine && program.schedule.is_some() {
            return Err(ValidationError::Unsupported {
                feature: format!("programs[{i}].schedule"),
                reason: "subroutines run through RUN, not from a calling manager".to_string(),
            });
        }
    }
    for (i, program) in project.programs.iter().enumerate() {
        for (j, line) in program.lines.iter().enumerate() {
            if let LineDef::Run { subroutine } = line {
                if names.get(subroutine) != Some(Declared::Subroutine) {
                    return Err(ValidationError::MissingReference {
                        id: subroutine.clone(),
                        context: format!("programs[{i}].lines[{j}]"),
                    });
                }
            }
        }
    }

    let mut output_names = HashMap::new();
    for (i, output) in project.output_variables.iter().enumerate() {
        if output_names
            .insert(output.name.to_uppercase(), i)
            .is_some()
        {
            return Err(ValidationError::DuplicateId {
                id: output.name.clone(),
                context: "output_variables".to_string(),
            });
        }
        check_identifier(&output.variable, &format!("output_variables[{i}].variable"))?;
        check_host_text(&output.name, || format!("output_variables[{i}].name"))?;
        if let Some(units) = &output.units {
            check_host_text(units, || format!("output_variables[{i}].units"))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SensorDef, TrendDef};

    fn with_sensor() -> Project {
        let mut project = Project::new("v");
        project.sensors.push(SensorDef {
            name: "OutdoorTemp".to_string(),
            key: "Environment".to_string(),
            output_variable: "Site Outdoor Air Drybulb Temperature".to_string(),
        });
        project
    }

    #[test]
    fn duplicate_names_ignore_case() {
        let mut project = with_sensor();
        project.globals.push("OUTDOORTEMP".to_string());
        assert!(matches!(
            validate_project(&project).unwrap_err(),
            ValidationError::DuplicateId { .. }
        ));
    }

    #[test]
    fn bad_identifier_reports_field() {
        let mut project = with_sensor();
        project.globals.push("Report Flag".to_string());
        match validate_project(&project).unwrap_err() {
            ValidationError::InvalidValue { field, .. } => assert_eq!(field, "globals[0]"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn trend_source_must_be_sensor_or_global() {
        let mut project = with_sensor();
        project.trends.push(TrendDef {
            name: "AvgLog".to_string(),
            source: "Avg".to_string(),
            timesteps: 4,
        });
        project.globals.push("Avg".to_string());
        validate_project(&project).unwrap();

        project.trends[0].source = "Nope".to_string();
        assert!(matches!(
            validate_project(&project).unwrap_err(),
            ValidationError::MissingReference { .. }
        ));
    }

    #[test]
    fn host_text_with_field_separators_is_rejected() {
        let mut project = with_sensor();
        project.sensors[0].key = "Zone A, North; !x".to_string();
        match validate_project(&project).unwrap_err() {
            ValidationError::InvalidValue { field, .. } => assert_eq!(field, "sensors[0].key"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn future_version_is_rejected() {
        let mut project = Project::new("future");
        project.version = crate::migrate::LATEST_VERSION + 1;
        assert_eq!(
            validate_project(&project).unwrap_err(),
            ValidationError::UnsupportedVersion {
                version: crate::migrate::LATEST_VERSION + 1
            }
        );
    }
}
