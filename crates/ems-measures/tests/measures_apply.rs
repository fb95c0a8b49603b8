use ems_measures::{
    ComfortHalt, CondenserLoop, CondenserLoopOverride, DiscretePackageSizing, Measure,
    MeasureConfig, MeasureError, ThermochromicWindow, apply_batch,
};
use ems_program::{EmsModel, NameAllocator, ProgramError, to_idf};

fn batch() -> Vec<MeasureConfig> {
    vec![
        MeasureConfig::ComfortHalt(ComfortHalt::new(vec![
            "Core_ZN".to_string(),
            "Perimeter_ZN_1".to_string(),
        ])),
        MeasureConfig::CondenserLoopOverride(CondenserLoopOverride::new(vec![CondenserLoop::new(
            "Condenser Water Loop",
            "Cond Pump",
        )])),
        MeasureConfig::ThermochromicWindow(ThermochromicWindow::default()),
        MeasureConfig::DiscretePackageSizing(DiscretePackageSizing::new(vec![
            "PSZ-AC:1".to_string(),
        ])),
    ]
}

#[test]
fn batch_matches_sequential_application() {
    let measures = batch();

    let mut sequential = EmsModel::new();
    let mut names = NameAllocator::new();
    for measure in &measures {
        names = measure.apply(&mut sequential, names).unwrap();
    }

    let mut parallel = EmsModel::new();
    let next = apply_batch(&mut parallel, &measures, NameAllocator::new()).unwrap();

    assert_eq!(next, names);
    assert_eq!(next.peek(), 4);
    assert_eq!(to_idf(&parallel), to_idf(&sequential));
    parallel.validate().unwrap();

    // comfort zones take indices 1 and 2, the condenser loop gets 3
    assert!(parallel.contains("PMV2runningAvg"));
    assert!(parallel.contains("PumpFlowOverrideReport3"));
}

#[test]
fn failing_batch_leaves_model_untouched() {
    let mut measures = batch();
    measures.push(MeasureConfig::ComfortHalt(ComfortHalt {
        min_pmv: 3.0,
        max_pmv: 1.0,
        ..ComfortHalt::new(vec!["Core_ZN".to_string()])
    }));

    let mut model = EmsModel::new();
    let err = apply_batch(&mut model, &measures, NameAllocator::new()).unwrap_err();
    assert!(matches!(err, MeasureError::InvalidArgument { .. }));
    assert_eq!(model.summary(), EmsModel::new().summary());
}

#[test]
fn same_measure_twice_collides() {
    let measure = ThermochromicWindow::default();
    let mut model = EmsModel::new();
    let names = measure.apply(&mut model, NameAllocator::new()).unwrap();
    let err = measure.apply(&mut model, names).unwrap_err();
    assert!(matches!(
        err,
        MeasureError::Program(ProgramError::DuplicateName { .. })
    ));
}

#[test]
fn configs_deserialize_from_yaml() {
    let yaml = r#"
- measure: condenser_loop_override
  threshold: 40 F
  loops:
    - name: Condenser Water Loop
      pump: Cond Pump
      pump_speed: variable
- measure: comfort_halt
  zones: [Core_ZN]
  max_pmv: 2.0
- measure: thermochromic_window
  window: South Window
"#;
    let configs: Vec<MeasureConfig> = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(configs.len(), 3);
    match &configs[1] {
        MeasureConfig::ComfortHalt(m) => {
            assert_eq!(m.max_pmv, 2.0);
            assert_eq!(m.min_pmv, 1.3);
        }
        other => panic!("unexpected config: {other:?}"),
    }
    match &configs[2] {
        MeasureConfig::ThermochromicWindow(m) => assert_eq!(m.states.len(), 18),
        other => panic!("unexpected config: {other:?}"),
    }

    let mut model = EmsModel::new();
    apply_batch(&mut model, &configs, NameAllocator::new()).unwrap();
    let program = model.find_program("TowerControl").unwrap();
    assert_eq!(program.body.lines()[0], "IF OutdoorTemp < 4.444444");
}

#[test]
fn reporting_and_override_measures_share_numbering() {
    let yaml = r#"
- measure: zone_average_temperature
  zones: [Core_ZN, Perimeter_ZN_1]
- measure: curve_result_override
  threshold: "30"
  units:
    - heat_pump: PTHP 1
      curve: Cool-Cap-fT 1
      coefficients: [0.9, 0.01, 0.0001, -0.005, 0.00002, -0.0001]
- measure: vrf_mode_override
  part_load_ratio: 0.75
  units:
    - name: VRF Heat Pump
      terminals: [TU Core]
"#;
    let configs: Vec<MeasureConfig> = serde_yaml::from_str(yaml).unwrap();
    let allocations: Vec<u32> = configs.iter().map(Measure::allocations).collect();
    assert_eq!(allocations, [2, 1, 1]);

    let mut model = EmsModel::new();
    let next = apply_batch(&mut model, &configs, NameAllocator::new()).unwrap();
    assert_eq!(next.peek(), 5);
    model.validate().unwrap();

    assert!(model.contains("Zn2vol"));
    assert!(model.contains("CurveOverwrite3"));
    assert!(model.contains("VRF_Actuator_OnOff4"));
    let curve = model.find_program("CurveOverwriteMGR").unwrap();
    assert!(curve.body.lines().iter().any(|l| l == "IF OAT3 > 30.0"));
    let vrf = model.find_program("VRFControl").unwrap();
    assert_eq!(vrf.body.lines()[1], "SET TU_Core_VRF4 = 0.75");

    assert_eq!(model.output_requests().len(), 5);
    let idf = to_idf(&model);
    assert!(idf.contains("    Weighted Average Building Zone Air Temperature,"));
    assert!(idf.contains("Output:Variable,\n    *,"));
}
