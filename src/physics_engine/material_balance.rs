//! Havlena-Odeh Material Balance
//!
//! General material balance for oil reservoirs written as a straight line:
//!
//! F = N·(Eo + m·Eg + Efw) + We
//!
//! ## Terms
//!
//! - **F**: underground withdrawal, rb
//! - **Eo**: oil and dissolved-gas expansion, rb/STB
//! - **Eg**: gas-cap expansion, rb/STB
//! - **Efw**: connate water and formation compaction, rb/STB
//!
//! A [`MaterialBalanceStudy`] owns the pressure history, computes the terms
//! for each point, regresses the Havlena-Odeh plot for OOIP, and splits the
//! last withdrawal into drive indices.
//!
//! Terms are rounded half-up to 8 decimals; OOIP, R² and indices to 4.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::{debug, info};

use super::round_half_up;
use crate::error::{ensure_positive, ensure_range, CalcError};

/// Scale for F, Eo, Eg, Efw and regression coefficients.
pub const TERM_SCALE: u32 = 8;
/// Scale for OOIP, R² and drive indices.
pub const RESULT_SCALE: u32 = 4;
/// Minimum number of points for a Havlena-Odeh fit.
pub const MIN_REGRESSION_POINTS: usize = 3;

// ============================================================================
// Data Point / Terms
// ============================================================================

/// One pressure step of production history with PVT at that pressure.
///
/// Production, injection and FVFs follow field units (STB, scf, rb/STB,
/// rb/scf); `F` comes out in reservoir barrels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub pressure: f64,
    /// Cumulative oil produced (Np)
    #[serde(default)]
    pub np: f64,
    /// Cumulative gas produced (Gp)
    #[serde(default)]
    pub gp: f64,
    /// Cumulative water produced (Wp)
    #[serde(default)]
    pub wp: f64,
    /// Cumulative water injected (Wi)
    #[serde(default)]
    pub wi: f64,
    /// Cumulative gas injected (Gi)
    #[serde(default)]
    pub gi: f64,
    pub bo: f64,
    pub bg: f64,
    pub rs: f64,
    #[serde(default = "default_bw")]
    pub bw: f64,
    /// Filled in by [`MaterialBalanceStudy::calculate_terms`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms: Option<MbeTerms>,
}

fn default_bw() -> f64 {
    1.0
}

impl DataPoint {
    pub fn new(pressure: f64, np: f64, gp: f64, bo: f64, bg: f64, rs: f64) -> Self {
        Self {
            pressure,
            np,
            gp,
            wp: 0.0,
            wi: 0.0,
            gi: 0.0,
            bo,
            bg,
            rs,
            bw: default_bw(),
            terms: None,
        }
    }

    /// Reject a non-positive pressure, Bo or Bg.
    pub fn validate(&self) -> Result<(), CalcError> {
        ensure_positive("Pressure", self.pressure)?;
        ensure_positive("Bo", self.bo)?;
        ensure_positive("Bg", self.bg)?;
        Ok(())
    }

    /// Underground withdrawal.
    ///
    /// Formula: F = Np·Bo + (Gp − Np·Rs)·Bg + Wp·Bw − Wi·Bw − Gi·Bg
    pub fn underground_withdrawal(&self) -> f64 {
        let f = self.np * self.bo + (self.gp - self.np * self.rs) * self.bg + self.wp * self.bw
            - self.wi * self.bw
            - self.gi * self.bg;
        round_half_up(f, TERM_SCALE)
    }
}

/// Expansion and withdrawal terms for one data point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MbeTerms {
    pub f: f64,
    pub eo: f64,
    pub eg: f64,
    pub efw: f64,
}

/// Initial reservoir state shared by every data point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialConditions {
    pub pi: f64,
    pub boi: f64,
    pub rsi: f64,
    pub bgi: Option<f64>,
    pub swi: Option<f64>,
    pub cw: Option<f64>,
    pub cf: Option<f64>,
    /// Gas-cap to oil-zone volume ratio
    pub m: f64,
}

impl InitialConditions {
    /// Formula: Eo = (Bo − Boi) + (Rsi − Rs)·Bg
    pub fn oil_expansion(&self, point: &DataPoint) -> f64 {
        let eo = (point.bo - self.boi) + (self.rsi - point.rs) * point.bg;
        round_half_up(eo, TERM_SCALE)
    }

    /// Formula: Eg = Boi·(Bg/Bgi − 1), 0 without a positive Bgi
    pub fn gas_cap_expansion(&self, point: &DataPoint) -> f64 {
        match self.bgi {
            Some(bgi) if bgi > 0.0 => round_half_up(self.boi * (point.bg / bgi - 1.0), TERM_SCALE),
            _ => 0.0,
        }
    }

    /// Formula: Efw = (1 + m)·Boi·[(cw·Swi + cf)/(1 − Swi)]·(Pi − P)
    ///
    /// 0 unless cw, cf and Swi are all known and Swi < 1.
    pub fn formation_water_expansion(&self, point: &DataPoint) -> f64 {
        let (Some(cw), Some(cf), Some(swi)) = (self.cw, self.cf, self.swi) else {
            return 0.0;
        };
        let denominator = 1.0 - swi;
        if denominator <= 0.0 {
            return 0.0;
        }
        let efw = (1.0 + self.m) * self.boi * ((cw * swi + cf) / denominator)
            * (self.pi - point.pressure);
        round_half_up(efw, TERM_SCALE)
    }

    /// Reject non-positive Pi or Boi and a Swi outside [0, 1].
    pub fn validate(&self) -> Result<(), CalcError> {
        ensure_positive("Initial Pressure", self.pi)?;
        ensure_positive("Initial Oil FVF", self.boi)?;
        if let Some(swi) = self.swi {
            ensure_range("Initial Water Saturation", swi, 0.0, 1.0)?;
        }
        Ok(())
    }

    pub fn terms(&self, point: &DataPoint) -> MbeTerms {
        MbeTerms {
            f: point.underground_withdrawal(),
            eo: self.oil_expansion(point),
            eg: self.gas_cap_expansion(point),
            efw: self.formation_water_expansion(point),
        }
    }
}

/// Single-point OOIP for a volumetric reservoir.
///
/// Formula: N = F / (Eo + Efw)
pub fn simple_ooip(terms: &MbeTerms) -> Result<f64, CalcError> {
    let denominator = terms.eo + terms.efw;
    if denominator == 0.0 {
        return Err(CalcError::ZeroDenominator {
            quantity: "OOIP".into(),
            term: "(Eo + Efw)".into(),
        });
    }
    Ok(round_half_up(terms.f / denominator, RESULT_SCALE))
}

// ============================================================================
// Drive Indices
// ============================================================================

/// Dominant reservoir energy source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriveMechanism {
    SolutionGas,
    GasCap,
    WaterDrive,
    Compaction,
    /// No single index reaches 0.5
    Combination,
}

impl std::fmt::Display for DriveMechanism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SolutionGas => write!(f, "SOLUTION_GAS"),
            Self::GasCap => write!(f, "GAS_CAP"),
            Self::WaterDrive => write!(f, "WATER_DRIVE"),
            Self::Compaction => write!(f, "COMPACTION"),
            Self::Combination => write!(f, "COMBINATION"),
        }
    }
}

/// Fraction of withdrawal supplied by each mechanism.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DriveIndices {
    /// Depletion (solution gas) drive
    pub ddi: f64,
    /// Segregation (gas cap) drive
    pub sdi: f64,
    /// Water drive, the remainder
    pub wdi: f64,
    /// Compaction drive
    pub cdi: f64,
}

impl DriveIndices {
    /// Formula:
    /// - DDI = N·Eo/F, SDI = N·m·Eg/F, CDI = N·Efw/F, each clamped to [0, 1]
    /// - WDI = max(0, 1 − DDI − SDI − CDI)
    ///
    /// All zero when F ≤ 0 or N ≤ 0.
    pub fn compute(n: f64, m: f64, terms: &MbeTerms) -> Self {
        let f = terms.f;
        if f <= 0.0 || n <= 0.0 {
            return Self::default();
        }
        let clamp = |v: f64| v.clamp(0.0, 1.0);

        let ddi = clamp(n * terms.eo / f);
        let sdi = if m > 0.0 { clamp(n * m * terms.eg / f) } else { 0.0 };
        let cdi = clamp(n * terms.efw / f);
        let wdi = (1.0 - ddi - sdi - cdi).max(0.0);

        Self {
            ddi: round_half_up(ddi, RESULT_SCALE),
            sdi: round_half_up(sdi, RESULT_SCALE),
            wdi: round_half_up(wdi, RESULT_SCALE),
            cdi: round_half_up(cdi, RESULT_SCALE),
        }
    }

    /// Largest index, or `Combination` when none reaches 0.5.
    pub fn primary_mechanism(&self) -> DriveMechanism {
        let candidates = [
            (DriveMechanism::SolutionGas, self.ddi),
            (DriveMechanism::GasCap, self.sdi),
            (DriveMechanism::WaterDrive, self.wdi),
            (DriveMechanism::Compaction, self.cdi),
        ];
        let (mut best, mut max) = candidates[0];
        for &(mechanism, value) in &candidates[1..] {
            if value > max {
                best = mechanism;
                max = value;
            }
        }
        if max < 0.5 {
            DriveMechanism::Combination
        } else {
            best
        }
    }
}

// ============================================================================
// Water Influx
// ============================================================================

/// Fetkovich pseudo-steady-state aquifer.
///
/// Formula: We = J·(Pi − P)·Δt
pub fn fetkovich_water_influx(
    aquifer_productivity_index: f64,
    initial_pressure: f64,
    current_pressure: f64,
    time_step_days: f64,
) -> f64 {
    aquifer_productivity_index * (initial_pressure - current_pressure) * time_step_days
}

/// Simplified single-step Carter-Tracy influx.
///
/// Formula: We = B·ΔP·pD, 0 when pD' = 0
pub fn carter_tracy_water_influx(
    aquifer_constant: f64,
    delta_pressure: f64,
    pd: f64,
    pd_prime: f64,
) -> f64 {
    if pd_prime == 0.0 {
        return 0.0;
    }
    aquifer_constant * delta_pressure * pd
}

// ============================================================================
// Havlena-Odeh Regression
// ============================================================================

/// Axes of the Havlena-Odeh straight line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlotType {
    /// F vs (Eo + Efw), volumetric
    FVsEo,
    /// F vs (Eo + m·Eg + Efw), gas cap
    FVsEoEg,
    /// F/Eo vs Efw/Eo, water drive; N is the intercept
    FEoVsEfwEo,
}

impl PlotType {
    /// Axis values for one point, or None when the point cannot be plotted.
    fn axes(self, m: f64, t: &MbeTerms) -> Option<(f64, f64)> {
        match self {
            Self::FVsEo => Some((t.eo + t.efw, t.f)),
            Self::FVsEoEg => Some((t.eo + m * t.eg + t.efw, t.f)),
            Self::FEoVsEfwEo => (t.eo > 0.0).then(|| (t.efw / t.eo, t.f / t.eo)),
        }
    }
}

/// Regression quality bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FitQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl FitQuality {
    pub fn from_r_squared(r2: f64) -> Self {
        if r2 >= 0.95 {
            Self::Excellent
        } else if r2 >= 0.85 {
            Self::Good
        } else if r2 >= 0.70 {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

/// Outcome of a Havlena-Odeh analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HavlenaOdehResult {
    pub plot_type: PlotType,
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Two-tailed significance of the linear fit
    pub p_value: f64,
    pub points_used: usize,
    /// N, in the units of F divided by the units of the expansion term
    pub ooip: f64,
    pub quality: FitQuality,
    pub drive_indices: DriveIndices,
    pub primary_drive: DriveMechanism,
}

struct LinearFit {
    slope: f64,
    intercept: f64,
    r_squared: f64,
    r: f64,
}

/// Ordinary least squares on paired samples.
fn linear_regression(xs: &[f64], ys: &[f64]) -> Result<LinearFit, CalcError> {
    let n = xs.len() as f64;
    let sum_x: f64 = xs.iter().sum();
    let sum_y: f64 = ys.iter().sum();
    let sum_xy: f64 = xs.iter().zip(ys).map(|(x, y)| x * y).sum();
    let sum_x2: f64 = xs.iter().map(|x| x * x).sum();
    let sum_y2: f64 = ys.iter().map(|y| y * y).sum();

    let sxy = n * sum_xy - sum_x * sum_y;
    let sxx = n * sum_x2 - sum_x * sum_x;
    let syy = n * sum_y2 - sum_y * sum_y;

    if sxx == 0.0 {
        return Err(CalcError::ZeroDenominator {
            quantity: "regression slope".into(),
            term: "n·Σx² − (Σx)²".into(),
        });
    }

    let slope = sxy / sxx;
    let intercept = (sum_y - slope * sum_x) / n;
    let (r_squared, r) = if sxx > 0.0 && syy > 0.0 {
        (sxy * sxy / (sxx * syy), sxy / (sxx * syy).sqrt())
    } else {
        (0.0, 0.0)
    };

    Ok(LinearFit {
        slope,
        intercept,
        r_squared,
        r,
    })
}

/// Two-tailed p-value for a correlation coefficient over `n` samples.
///
/// Formula: t = r·√(n−2) / √(1−r²), Student's t with n−2 degrees of freedom
fn p_value_for_r(r: f64, n: usize) -> f64 {
    if n < 3 {
        return 1.0;
    }
    if r.abs() >= 0.9999 {
        return 0.0;
    }
    let df = (n - 2) as f64;
    let t_stat = r * df.sqrt() / (1.0 - r * r).sqrt();
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => 2.0 * (1.0 - dist.cdf(t_stat.abs())),
        Err(_) => 1.0,
    }
}

// ============================================================================
// Study
// ============================================================================

/// A reservoir's material balance history and analysis state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialBalanceStudy {
    pub name: String,
    pub initial_pressure: Option<f64>,
    pub initial_bo: Option<f64>,
    pub initial_bg: Option<f64>,
    pub initial_rs: Option<f64>,
    pub initial_water_saturation: Option<f64>,
    pub water_compressibility: Option<f64>,
    pub rock_compressibility: Option<f64>,
    pub gas_cap_ratio: f64,
    pub has_gas_cap: bool,
    pub has_aquifer_support: bool,
    pub data_points: Vec<DataPoint>,
    pub result: Option<HavlenaOdehResult>,
}

impl MaterialBalanceStudy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append a pressure step. Computed terms are cleared on the new point.
    pub fn add_data_point(&mut self, mut point: DataPoint) {
        point.terms = None;
        self.data_points.push(point);
    }

    pub fn initial_conditions(&self) -> Result<InitialConditions, CalcError> {
        let pi = self
            .initial_pressure
            .ok_or_else(|| CalcError::Invalid("Initial pressure (Pi) is required".into()))?;
        let boi = self
            .initial_bo
            .ok_or_else(|| CalcError::Invalid("Initial oil FVF (Boi) is required".into()))?;
        let rsi = self
            .initial_rs
            .ok_or_else(|| CalcError::Invalid("Initial solution GOR (Rsi) is required".into()))?;

        let initial = InitialConditions {
            pi,
            boi,
            rsi,
            bgi: self.initial_bg,
            swi: self.initial_water_saturation,
            cw: self.water_compressibility,
            cf: self.rock_compressibility,
            m: self.gas_cap_ratio,
        };
        initial.validate()?;
        Ok(initial)
    }

    /// Plot chosen from the reservoir description.
    pub fn plot_type(&self) -> PlotType {
        match (self.has_gas_cap, self.has_aquifer_support) {
            (_, true) => PlotType::FEoVsEfwEo,
            (true, false) => PlotType::FVsEoEg,
            (false, false) => PlotType::FVsEo,
        }
    }

    /// Compute F, Eo, Eg and Efw for every data point.
    pub fn calculate_terms(&mut self) -> Result<(), CalcError> {
        if self.data_points.is_empty() {
            return Err(CalcError::Invalid(
                "No data points provided for material balance calculation".into(),
            ));
        }
        let initial = self.initial_conditions()?;

        for point in &self.data_points {
            point.validate()?;
        }

        for point in &mut self.data_points {
            let terms = initial.terms(point);
            debug!(
                pressure = point.pressure,
                f = terms.f,
                eo = terms.eo,
                eg = terms.eg,
                efw = terms.efw,
                "MBE terms"
            );
            point.terms = Some(terms);
        }
        Ok(())
    }

    /// Regress the Havlena-Odeh plot, derive OOIP and drive indices.
    pub fn havlena_odeh_analysis(&mut self) -> Result<HavlenaOdehResult, CalcError> {
        self.calculate_terms()?;

        if self.data_points.len() < MIN_REGRESSION_POINTS {
            return Err(CalcError::InsufficientData {
                what: "Havlena-Odeh analysis".into(),
                have: self.data_points.len(),
                need: MIN_REGRESSION_POINTS,
            });
        }

        let plot_type = self.plot_type();
        let m = self.gas_cap_ratio;
        let (xs, ys): (Vec<f64>, Vec<f64>) = self
            .data_points
            .iter()
            .filter_map(|p| p.terms.as_ref())
            .filter_map(|t| plot_type.axes(m, t))
            .filter(|(x, _)| *x > 0.0)
            .unzip();

        if xs.is_empty() {
            return Err(CalcError::InsufficientData {
                what: "Havlena-Odeh regression".into(),
                have: 0,
                need: 1,
            });
        }

        let fit = linear_regression(&xs, &ys)?;
        let ooip_raw = match plot_type {
            PlotType::FVsEo | PlotType::FVsEoEg => fit.slope,
            PlotType::FEoVsEfwEo => fit.intercept,
        };
        let ooip = round_half_up(ooip_raw, RESULT_SCALE);
        let r_squared = round_half_up(fit.r_squared, RESULT_SCALE);

        let last_terms = self
            .data_points
            .last()
            .and_then(|p| p.terms)
            .unwrap_or_default();
        let drive_indices = DriveIndices::compute(ooip, m, &last_terms);

        let result = HavlenaOdehResult {
            plot_type,
            slope: round_half_up(fit.slope, TERM_SCALE),
            intercept: round_half_up(fit.intercept, TERM_SCALE),
            r_squared,
            p_value: p_value_for_r(fit.r, xs.len()),
            points_used: xs.len(),
            ooip,
            quality: FitQuality::from_r_squared(r_squared),
            drive_indices,
            primary_drive: drive_indices.primary_mechanism(),
        };

        info!(
            study = %self.name,
            ooip = result.ooip,
            r_squared = result.r_squared,
            quality = ?result.quality,
            primary_drive = %result.primary_drive,
            "Havlena-Odeh analysis complete"
        );

        self.result = Some(result.clone());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Volumetric undersaturated reservoir built so F = N·(Eo + Efw) exactly.
    fn make_volumetric_study(n: f64) -> MaterialBalanceStudy {
        let mut study = MaterialBalanceStudy::new("synthetic");
        study.initial_pressure = Some(4000.0);
        study.initial_bo = Some(1.30);
        study.initial_rs = Some(600.0);
        study.initial_bg = Some(0.0008);

        for (i, pressure) in [3800.0, 3600.0, 3400.0, 3200.0].into_iter().enumerate() {
            // Rs constant above Pb so Eo = Bo - Boi and F = Np·Bo
            let bo = 1.30 + 0.005 * (i as f64 + 1.0);
            let eo = bo - 1.30;
            let np = n * eo / bo;
            let mut point = DataPoint::new(pressure, np, np * 600.0, bo, 0.0009, 600.0);
            point.bw = 1.0;
            study.add_data_point(point);
        }
        study
    }

    #[test]
    fn test_terms_formulas() {
        let initial = InitialConditions {
            pi: 3000.0,
            boi: 1.2,
            rsi: 500.0,
            bgi: Some(0.001),
            swi: Some(0.2),
            cw: Some(3e-6),
            cf: Some(4e-6),
            m: 0.5,
        };
        let mut point = DataPoint::new(2500.0, 1000.0, 700_000.0, 1.15, 0.0012, 400.0);
        point.wp = 100.0;

        let t = initial.terms(&point);
        // F = 1150 + (700000 - 400000)·0.0012 + 100
        assert!((t.f - 1610.0).abs() < 1e-8);
        // Eo = -0.05 + 100·0.0012
        assert!((t.eo - 0.07).abs() < 1e-8);
        // Eg = 1.2·(1.2 - 1)
        assert!((t.eg - 0.24).abs() < 1e-8);
        // Efw = 1.5·1.2·(4.6e-6/0.8)·500
        assert!((t.efw - 0.005175).abs() < 1e-8);
    }

    #[test]
    fn test_efw_zero_without_compressibility() {
        let initial = InitialConditions {
            pi: 3000.0,
            boi: 1.2,
            rsi: 500.0,
            bgi: None,
            swi: Some(0.2),
            cw: None,
            cf: Some(4e-6),
            m: 0.0,
        };
        let point = DataPoint::new(2500.0, 0.0, 0.0, 1.2, 0.001, 500.0);
        assert_eq!(initial.formation_water_expansion(&point), 0.0);
        assert_eq!(initial.gas_cap_expansion(&point), 0.0);
    }

    #[test]
    fn test_efw_zero_at_full_water_saturation() {
        let initial = InitialConditions {
            pi: 3000.0,
            boi: 1.2,
            rsi: 500.0,
            bgi: None,
            swi: Some(1.0),
            cw: Some(3e-6),
            cf: Some(4e-6),
            m: 0.0,
        };
        assert!(initial.validate().is_ok());
        let point = DataPoint::new(2500.0, 0.0, 0.0, 1.2, 0.001, 500.0);
        assert_eq!(initial.formation_water_expansion(&point), 0.0);
    }

    #[test]
    fn test_calculate_terms_rejects_out_of_domain_inputs() {
        for swi in [-0.1, 1.5] {
            let mut study = make_volumetric_study(1e6);
            study.initial_water_saturation = Some(swi);
            let err = study.calculate_terms().unwrap_err();
            assert!(matches!(err, CalcError::OutOfRange { .. }), "Swi {swi}: {err}");
            assert!(study.data_points.iter().all(|p| p.terms.is_none()));
        }

        for pi in [0.0, -3000.0] {
            let mut study = make_volumetric_study(1e6);
            study.initial_pressure = Some(pi);
            let err = study.calculate_terms().unwrap_err();
            assert_eq!(err, CalcError::non_positive("Initial Pressure", pi));
        }

        let mut study = make_volumetric_study(1e6);
        study.data_points[2].bg = -0.0009;
        let err = study.calculate_terms().unwrap_err();
        assert_eq!(err.to_string(), "Bg must be positive, got -0.0009");
        assert!(study.data_points.iter().all(|p| p.terms.is_none()));
    }

    #[test]
    fn test_simple_ooip_zero_denominator() {
        let err = simple_ooip(&MbeTerms {
            f: 10.0,
            ..MbeTerms::default()
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "Cannot calculate OOIP: (Eo + Efw) = 0");
    }

    #[test]
    fn test_calculate_terms_requires_initial_conditions() {
        let mut study = make_volumetric_study(1e6);
        study.initial_pressure = None;
        let err = study.calculate_terms().unwrap_err();
        assert_eq!(err.to_string(), "Initial pressure (Pi) is required");

        let mut empty = MaterialBalanceStudy::new("empty");
        empty.initial_pressure = Some(1.0);
        assert!(empty.calculate_terms().is_err());
    }

    #[test]
    fn test_havlena_odeh_recovers_ooip() {
        let mut study = make_volumetric_study(2.5e6);
        let result = study.havlena_odeh_analysis().unwrap();

        assert_eq!(result.plot_type, PlotType::FVsEo);
        assert_eq!(result.points_used, 4);
        assert!((result.ooip - 2.5e6).abs() / 2.5e6 < 1e-4, "N = {}", result.ooip);
        assert!(result.r_squared > 0.999);
        assert_eq!(result.quality, FitQuality::Excellent);
        assert!(result.p_value < 0.01);
        assert_eq!(result.primary_drive, DriveMechanism::SolutionGas);
        assert!(study.result.is_some());
    }

    #[test]
    fn test_havlena_odeh_needs_three_points() {
        let mut study = make_volumetric_study(1e6);
        study.data_points.truncate(2);
        assert!(matches!(
            study.havlena_odeh_analysis(),
            Err(CalcError::InsufficientData { have: 2, need: 3, .. })
        ));
    }

    #[test]
    fn test_plot_type_selection() {
        let mut study = MaterialBalanceStudy::new("s");
        assert_eq!(study.plot_type(), PlotType::FVsEo);
        study.has_gas_cap = true;
        assert_eq!(study.plot_type(), PlotType::FVsEoEg);
        study.has_aquifer_support = true;
        assert_eq!(study.plot_type(), PlotType::FEoVsEfwEo);
    }

    #[test]
    fn test_drive_indices_remainder_is_water() {
        let terms = MbeTerms {
            f: 100.0,
            eo: 0.00003,
            eg: 0.0,
            efw: 0.00001,
        };
        let idx = DriveIndices::compute(1e6, 0.0, &terms);
        assert!((idx.ddi - 0.3).abs() < 1e-9);
        assert!((idx.cdi - 0.1).abs() < 1e-9);
        assert!((idx.wdi - 0.6).abs() < 1e-9);
        assert_eq!(idx.sdi, 0.0);
        assert_eq!(idx.primary_mechanism(), DriveMechanism::WaterDrive);
    }

    #[test]
    fn test_drive_indices_zero_withdrawal() {
        let idx = DriveIndices::compute(1e6, 0.2, &MbeTerms::default());
        assert_eq!(idx, DriveIndices::default());
        assert_eq!(idx.primary_mechanism(), DriveMechanism::Combination);
    }

    #[test]
    fn test_fit_quality_thresholds() {
        assert_eq!(FitQuality::from_r_squared(0.95), FitQuality::Excellent);
        assert_eq!(FitQuality::from_r_squared(0.85), FitQuality::Good);
        assert_eq!(FitQuality::from_r_squared(0.70), FitQuality::Fair);
        assert_eq!(FitQuality::from_r_squared(0.69), FitQuality::Poor);
    }

    #[test]
    fn test_water_influx_helpers() {
        assert_eq!(fetkovich_water_influx(2.0, 3000.0, 2900.0, 30.0), 6000.0);
        assert_eq!(carter_tracy_water_influx(10.0, 50.0, 1.5, 0.0), 0.0);
        assert_eq!(carter_tracy_water_influx(10.0, 50.0, 1.5, 0.2), 750.0);
    }

    #[test]
    fn test_p_value_for_strong_correlation() {
        assert!(p_value_for_r(0.95, 10) < 0.001);
        assert!(p_value_for_r(0.1, 10) > 0.5);
        assert_eq!(p_value_for_r(0.5, 2), 1.0);
    }
}
