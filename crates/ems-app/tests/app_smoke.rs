//! Smoke test for the ems-app service layer.

use std::path::PathBuf;

use ems_app::{ProgramKind, compile_file, list_programs, load_project, save_project, validate_project, write_output};

fn demo_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.pop(); // crates
    path.pop(); // repo root
    path.push("demos");
    path.push("projects");
    path.push(name);
    path
}

#[test]
fn test_load_demo_project() {
    let project = load_project(&demo_path("03_hand_written_programs.yaml"))
        .expect("Failed to load project");
    validate_project(&project).expect("Validation should succeed");

    let programs = list_programs(&project).unwrap();
    let names: Vec<_> = programs.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Fan_Availability", "Night_Setback", "Apply_Offset"]);

    let setback = &programs[1];
    assert_eq!(setback.kind, ProgramKind::Program);
    assert_eq!(
        setback.schedule.as_ref().map(|(m, _)| m.as_str()),
        Some("Setback Manager")
    );
    assert_eq!(setback.line_count, 6);
    assert_eq!(programs[2].kind, ProgramKind::Subroutine);
    assert!(programs[2].schedule.is_none());
}

#[test]
fn test_compile_and_write_output() {
    let compiled = compile_file(&demo_path("01_thermochromic_window.yaml")).unwrap();
    assert!(compiled.idf.starts_with("Output:EnergyManagementSystem,"));
    assert!(compiled.idf.contains("EnergyManagementSystem:ConstructionIndexVariable,"));

    let out = std::env::temp_dir().join("ems_app_smoke_output.idf");
    write_output(&out, &compiled).unwrap();
    assert_eq!(std::fs::read_to_string(&out).unwrap(), compiled.idf);
}

#[test]
fn test_save_and_reload() {
    let project = load_project(&demo_path("02_plant_and_comfort.yaml")).unwrap();
    let out = std::env::temp_dir().join("ems_app_smoke_project.json");
    save_project(&out, &project).unwrap();
    assert_eq!(load_project(&out).unwrap(), project);
}
