use ems_measures::{ComfortHalt, MeasureConfig};
use ems_project::schema::*;
use ems_project::{Format, load, load_json, load_yaml, save, save_json, save_yaml, validate_project};
use ems_program::{CallingPoint, Comparison, ComponentKind, ComponentRef, DebugOutputLevel};

fn sample_project() -> Project {
    let mut project = Project::new("Roundtrip");
    project.output.debug_level = DebugOutputLevel::Verbose;
    project.sensors.push(SensorDef {
        name: "Tout".to_string(),
        key: "Win1".to_string(),
        output_variable: "Surface Outside Face Temperature".to_string(),
    });
    project.actuators.push(ActuatorDef {
        name: "Win1_Construct".to_string(),
        component: ComponentRef::new("Win1", ComponentKind::Surface),
        control: "Construction State".to_string(),
    });
    project.globals.push("TC_25".to_string());
    project.rule_programs.push(RuleProgramDef {
        name: "Win1_Control".to_string(),
        comparison_variable: "Tout".to_string(),
        comparison: Comparison::Lt,
        rules: vec![RuleDef {
            boundary: 26.5,
            variable: "Win1_Construct".to_string(),
            expression: "TC_25".to_string(),
        }],
        default: ActionDef {
            variable: "Win1_Construct".to_string(),
            expression: "Null".to_string(),
        },
        schedule: Some(ScheduleDef {
            calling_point: CallingPoint::BeginTimestepBeforePredictor,
            manager: Some("Window Manager".to_string()),
        }),
    });
    project.programs.push(ProgramDef {
        name: "Noop".to_string(),
        subroutine: true,
        lines: vec![
            LineDef::If {
                condition: "Hour > 6".to_string(),
            },
            LineDef::Return,
            LineDef::EndIf,
        ],
        schedule: None,
    });
    project.measures.push(MeasureConfig::ComfortHalt(ComfortHalt::new(vec![
        "Core_ZN".to_string(),
    ])));
    project
}

#[test]
fn roundtrip_yaml_empty_project() {
    let project = Project::new("Empty Project");
    validate_project(&project).unwrap();

    let path = std::env::temp_dir().join("ems_project_roundtrip_empty.yaml");
    save_yaml(&path, &project).unwrap();
    let loaded = load_yaml(&path).unwrap();

    assert_eq!(project, loaded);
}

#[test]
fn roundtrip_yaml_full_project() {
    let project = sample_project();
    let path = std::env::temp_dir().join("ems_project_roundtrip_full.yaml");
    save_yaml(&path, &project).unwrap();
    assert_eq!(load_yaml(&path).unwrap(), project);
}

#[test]
fn roundtrip_json_full_project() {
    let project = sample_project();
    let path = std::env::temp_dir().join("ems_project_roundtrip_full.json");
    save_json(&path, &project).unwrap();
    assert_eq!(load_json(&path).unwrap(), project);
}

#[test]
fn format_follows_extension() {
    let project = sample_project();
    let path = std::env::temp_dir().join("ems_project_by_extension.yml");
    save(&path, &project).unwrap();
    assert_eq!(load(&path).unwrap(), project);

    assert_eq!(
        Format::from_path(std::path::Path::new("a.JSON")).unwrap(),
        Format::Json
    );
    assert!(Format::from_path(std::path::Path::new("a.toml")).is_err());
}

#[test]
fn invalid_project_is_not_saved() {
    let mut project = sample_project();
    project.globals.push("tout".to_string());
    let path = std::env::temp_dir().join("ems_project_invalid.yaml");
    let _ = std::fs::remove_file(&path);
    assert!(save_yaml(&path, &project).is_err());
    assert!(!path.exists());
}
