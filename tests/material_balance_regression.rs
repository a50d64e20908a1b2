//! Material Balance Regression Tests
//!
//! Synthetic reservoirs whose withdrawal is built from a known OOIP, so the
//! Havlena-Odeh fit must hand that OOIP back for each plot type.

use std::fs;

use reservoir_optimizer::physics_engine::{
    DataPoint, DriveMechanism, FitQuality, MaterialBalanceStudy, PlotType,
};
use reservoir_optimizer::CalcError;

const RSI: f64 = 650.0;

/// (pressure, Bo, Bg) steps below an initial 4200 psi.
const HISTORY: [(f64, f64, f64); 4] = [
    (4000.0, 1.324, 0.00082),
    (3800.0, 1.329, 0.00085),
    (3600.0, 1.332, 0.00089),
    (3400.0, 1.340, 0.00094),
];

fn make_study(name: &str) -> MaterialBalanceStudy {
    let mut study = MaterialBalanceStudy::new(name);
    study.initial_pressure = Some(4200.0);
    study.initial_bo = Some(1.32);
    study.initial_rs = Some(RSI);
    study.initial_bg = Some(0.0008);
    study
}

/// Add the history with Np chosen so F = N·(Eo + m·Eg + Efw) exactly.
/// Rs stays at Rsi and Gp = Np·Rsi, which reduces F to Np·Bo.
fn populate(study: &mut MaterialBalanceStudy, n: f64) {
    let initial = study.initial_conditions().unwrap();
    for (pressure, bo, bg) in HISTORY {
        let mut point = DataPoint::new(pressure, 0.0, 0.0, bo, bg, RSI);
        let expansion = initial.oil_expansion(&point)
            + initial.m * initial.gas_cap_expansion(&point)
            + initial.formation_water_expansion(&point);
        point.np = n * expansion / bo;
        point.gp = point.np * RSI;
        study.add_data_point(point);
    }
}

fn assert_close(actual: f64, expected: f64, rel: f64) {
    assert!(
        ((actual - expected) / expected).abs() < rel,
        "expected {expected}, got {actual}"
    );
}

// ============================================================================
// Plot types
// ============================================================================

#[test]
fn volumetric_reservoir_returns_its_ooip() {
    let mut study = make_study("volumetric");
    populate(&mut study, 8.0e6);

    let result = study.havlena_odeh_analysis().unwrap();
    assert_eq!(result.plot_type, PlotType::FVsEo);
    assert_eq!(result.points_used, 4);
    assert_close(result.ooip, 8.0e6, 1e-4);
    assert_eq!(result.quality, FitQuality::Excellent);
    assert_eq!(result.primary_drive, DriveMechanism::SolutionGas);
    assert!(result.drive_indices.ddi > 0.999);
}

#[test]
fn gas_cap_reservoir_splits_depletion_and_segregation() {
    let mut study = make_study("gas-cap");
    study.has_gas_cap = true;
    study.gas_cap_ratio = 0.3;
    populate(&mut study, 5.0e6);

    let result = study.havlena_odeh_analysis().unwrap();
    assert_eq!(result.plot_type, PlotType::FVsEoEg);
    assert_close(result.ooip, 5.0e6, 1e-4);

    let idx = result.drive_indices;
    assert!(idx.sdi > 0.0, "gas cap should contribute: {idx:?}");
    assert!((idx.ddi + idx.sdi - 1.0).abs() < 1e-3, "{idx:?}");
    assert!(idx.wdi < 1e-3);
}

#[test]
fn aquifer_plot_reads_ooip_from_the_intercept() {
    let mut study = make_study("aquifer");
    study.has_aquifer_support = true;
    study.initial_water_saturation = Some(0.25);
    study.water_compressibility = Some(3e-6);
    study.rock_compressibility = Some(5e-6);
    populate(&mut study, 6.0e6);

    let result = study.havlena_odeh_analysis().unwrap();
    assert_eq!(result.plot_type, PlotType::FEoVsEfwEo);
    assert_close(result.ooip, 6.0e6, 1e-3);
    // F/Eo = N + N·Efw/Eo when there is no influx
    assert_close(result.slope, 6.0e6, 1e-3);
    assert!(result.drive_indices.cdi > 0.0);
}

// ============================================================================
// Study files
// ============================================================================

#[test]
fn study_file_round_trip_keeps_terms_and_result() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("study.json");

    let mut study = make_study("from-file");
    populate(&mut study, 8.0e6);
    fs::write(&path, serde_json::to_string_pretty(&study).unwrap()).unwrap();

    let mut loaded: MaterialBalanceStudy =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert!(loaded.data_points.iter().all(|p| p.terms.is_none()));

    let result = loaded.havlena_odeh_analysis().unwrap();
    assert!(loaded.data_points.iter().all(|p| p.terms.is_some()));

    let saved = serde_json::to_string(&loaded).unwrap();
    let reloaded: MaterialBalanceStudy = serde_json::from_str(&saved).unwrap();
    assert_eq!(reloaded.result, Some(result));
}

#[test]
fn minimal_study_json_uses_defaults() {
    let json = r#"{
        "name": "sparse",
        "initial_pressure": 3000.0,
        "initial_bo": 1.25,
        "initial_rs": 500.0,
        "data_points": [
            {"pressure": 2800.0, "np": 10000.0, "gp": 5000000.0, "bo": 1.255, "bg": 0.001, "rs": 500.0}
        ]
    }"#;
    let mut study: MaterialBalanceStudy = serde_json::from_str(json).unwrap();
    assert_eq!(study.data_points[0].bw, 1.0);
    assert_eq!(study.plot_type(), PlotType::FVsEo);

    // One point is enough for terms but not for a fit
    study.calculate_terms().unwrap();
    let terms = study.data_points[0].terms.unwrap();
    assert!((terms.f - 12_550.0).abs() < 1e-6);
    assert!(matches!(
        study.havlena_odeh_analysis(),
        Err(CalcError::InsufficientData { have: 1, .. })
    ));
}

#[test]
fn missing_initial_rs_is_reported() {
    let mut study = make_study("incomplete");
    study.initial_rs = None;
    study.add_data_point(DataPoint::new(3000.0, 1.0, 1.0, 1.3, 0.001, 600.0));

    let err = study.calculate_terms().unwrap_err();
    assert_eq!(err.to_string(), "Initial solution GOR (Rsi) is required");
}

#[test]
fn out_of_domain_saturation_or_pressure_fails_the_analysis() {
    let mut study = make_study("bad-swi");
    populate(&mut study, 8.0e6);
    study.initial_water_saturation = Some(1.5);
    study.water_compressibility = Some(3e-6);
    study.rock_compressibility = Some(5e-6);
    let err = study.havlena_odeh_analysis().unwrap_err();
    assert_eq!(
        err.to_string(),
        "Initial Water Saturation must be between 0 and 1, got 1.5"
    );
    assert!(study.result.is_none());

    let mut study = make_study("bad-pi");
    populate(&mut study, 8.0e6);
    study.initial_pressure = Some(-4200.0);
    assert!(matches!(
        study.calculate_terms(),
        Err(CalcError::NonPositive { .. })
    ));
}
