//! Schema migration framework.

use ems_program::sanitize;

use crate::ProjectError;
use crate::schema::{LineDef, Project};

pub const LATEST_VERSION: u32 = 1;

pub fn migrate_to_latest(mut project: Project) -> Result<Project, ProjectError> {
    while project.version < LATEST_VERSION {
        project = migrate_one_version(project)?;
    }
    Ok(project)
}

fn migrate_one_version(project: Project) -> Result<Project, ProjectError> {
    match project.version {
        0 => migrate_v0_to_v1(project),
        v => Err(ProjectError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}

/// Version 0 files used host-style program names (`Resize PSZ To Match
/// Product Availability`) and had no `comparison` field on rule programs.
/// The missing field deserializes as `<=`; names are sanitized here, along
/// with the `RUN` lines that refer to them.
fn migrate_v0_to_v1(mut project: Project) -> Result<Project, ProjectError> {
    for program in &mut project.rule_programs {
        program.name = sanitize(&program.name);
    }
    for program in &mut project.programs {
        program.name = sanitize(&program.name);
        for line in &mut program.lines {
            if let LineDef::Run { subroutine } = line {
                *subroutine = sanitize(subroutine);
            }
        }
    }
    project.version = 1;
    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ActionDef, ProgramDef, RuleDef, RuleProgramDef};
    use ems_program::Comparison;

    #[test]
    fn migrate_latest_is_noop() {
        let project = Project::new("test");
        let migrated = migrate_to_latest(project.clone()).unwrap();
        assert_eq!(migrated, project);
    }

    #[test]
    fn migrate_v0_sanitizes_program_names() {
        let mut project = Project::new("Sizing");
        project.version = 0;
        project.programs.push(ProgramDef {
            name: "Resize PSZ To Match Product Availability".to_string(),
            subroutine: false,
            lines: vec![LineDef::Run {
                subroutine: "Select Discrete-Flow".to_string(),
            }],
            schedule: None,
        });
        project.rule_programs.push(RuleProgramDef {
            name: "Select Discrete-Flow".to_string(),
            comparison_variable: "argMainVdot".to_string(),
            comparison: Comparison::default(),
            rules: vec![RuleDef {
                boundary: 0.56628,
                variable: "argDiscreteMainVdot".to_string(),
                expression: "0.56628".to_string(),
            }],
            default: ActionDef {
                variable: "dummy".to_string(),
                expression: "@SevereWarnEP 666.0".to_string(),
            },
            schedule: None,
        });

        let migrated = migrate_to_latest(project).unwrap();
        assert_eq!(migrated.version, LATEST_VERSION);
        assert_eq!(
            migrated.programs[0].name,
            "Resize_PSZ_To_Match_Product_Availability"
        );
        assert_eq!(
            migrated.programs[0].lines[0],
            LineDef::Run {
                subroutine: "Select_Discrete_Flow".to_string()
            }
        );
        assert_eq!(migrated.rule_programs[0].name, "Select_Discrete_Flow");
    }

    #[test]
    fn v0_rule_program_defaults_to_le() {
        let yaml = r#"
version: 0
name: Legacy
rule_programs:
  - name: Win1 Control
    comparison_variable: Tout
    rules:
      - { boundary: 26.0, variable: C, expression: TC_25 }
    default: { variable: C, expression: TC_85 }
"#;
        let project: Project = serde_yaml::from_str(yaml).unwrap();
        let migrated = migrate_to_latest(project).unwrap();
        assert_eq!(migrated.rule_programs[0].comparison, Comparison::Le);
        assert_eq!(migrated.rule_programs[0].name, "Win1_Control");
    }
}
