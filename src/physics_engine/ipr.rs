//! Inflow Performance Relationships
//!
//! Rate as a function of flowing bottomhole pressure:
//!
//! ## Equations
//!
//! - **Vogel**: saturated oil, q = qmax·(1 − 0.2x − 0.8x²) with x = Pwf/Pr
//! - **Darcy**: undersaturated oil, q = J·(Pr − Pwf)
//! - **Fetkovich**: gas back-pressure, q = C·(Pr² − Pwf²)^n
//! - **Jones**: turbulent flow, (Pr − Pwf) = a·q + b·q²
//!
//! [`IprModel`] fits a Vogel or composite (Darcy above Pb, Vogel below)
//! relationship to a single well test and evaluates it along the curve.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::round_half_up;
use crate::error::CalcError;

/// Vogel's denominator for the straight-line portion of a composite IPR.
const VOGEL_SLOPE_FACTOR: f64 = 1.8;

/// Dimensionless Vogel factor 1 − 0.2x − 0.8x².
fn vogel_factor(x: f64) -> f64 {
    1.0 - 0.2 * x - 0.8 * x * x
}

/// Reject pressures outside 0 ≤ Pwf ≤ Pr, Pr > 0.
pub fn validate_pressures(pr: f64, pwf: f64) -> Result<(), CalcError> {
    if pr <= 0.0 {
        return Err(CalcError::Invalid("Reservoir pressure must be positive".into()));
    }
    if pwf < 0.0 {
        return Err(CalcError::Invalid("Flowing pressure cannot be negative".into()));
    }
    if pwf > pr {
        return Err(CalcError::Invalid(
            "Flowing pressure cannot exceed reservoir pressure".into(),
        ));
    }
    Ok(())
}

// ============================================================================
// Single-equation evaluation
// ============================================================================

/// IPR family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IprMethod {
    Vogel,
    Darcy,
    Fetkovich,
    Jones,
}

impl std::fmt::Display for IprMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vogel => write!(f, "VOGEL"),
            Self::Darcy => write!(f, "DARCY"),
            Self::Fetkovich => write!(f, "FETKOVICH"),
            Self::Jones => write!(f, "JONES"),
        }
    }
}

/// An IPR equation with its coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IprEquation {
    Vogel { qmax: f64 },
    Darcy { productivity_index: f64 },
    Fetkovich { c: f64, n: f64 },
    Jones { a: f64, b: f64 },
}

impl IprEquation {
    pub fn method(&self) -> IprMethod {
        match self {
            Self::Vogel { .. } => IprMethod::Vogel,
            Self::Darcy { .. } => IprMethod::Darcy,
            Self::Fetkovich { .. } => IprMethod::Fetkovich,
            Self::Jones { .. } => IprMethod::Jones,
        }
    }

    /// Flow rate at `pwf` for a reservoir at `pr`.
    pub fn flow_rate(&self, pr: f64, pwf: f64) -> Result<f64, CalcError> {
        validate_pressures(pr, pwf)?;

        match *self {
            Self::Vogel { qmax } => {
                if qmax <= 0.0 {
                    return Err(CalcError::Invalid("Qmax must be positive".into()));
                }
                Ok(qmax * vogel_factor(pwf / pr))
            }
            Self::Darcy { productivity_index } => {
                if productivity_index <= 0.0 {
                    return Err(CalcError::Invalid(
                        "Productivity Index must be positive".into(),
                    ));
                }
                Ok(productivity_index * (pr - pwf))
            }
            Self::Fetkovich { c, n } => {
                if c <= 0.0 {
                    return Err(CalcError::Invalid("C coefficient must be positive".into()));
                }
                if !(0.5..=1.0).contains(&n) {
                    warn!(n, "Fetkovich n exponent is outside typical range (0.5-1.0)");
                }
                Ok(c * (pr * pr - pwf * pwf).powf(n))
            }
            Self::Jones { a, b } => {
                if b <= 0.0 {
                    return Err(CalcError::Invalid("b coefficient must be positive".into()));
                }
                let discriminant = a * a + 4.0 * b * (pr - pwf);
                if discriminant < 0.0 {
                    return Err(CalcError::NegativeDiscriminant { discriminant });
                }
                Ok(((-a + discriminant.sqrt()) / (2.0 * b)).max(0.0))
            }
        }
    }
}

/// Productivity index J = q / (Pr − Pwf).
pub fn productivity_index(rate: f64, pr: f64, pwf: f64) -> Result<f64, CalcError> {
    let drawdown = pr - pwf;
    if drawdown <= 0.0 {
        return Err(CalcError::Invalid("Drawdown must be positive".into()));
    }
    Ok(rate / drawdown)
}

// ============================================================================
// Fitted model
// ============================================================================

/// One point of a generated IPR curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub pwf: f64,
    pub rate: f64,
}

/// Well performance at a chosen flowing pressure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperatingPoint {
    pub pwf: f64,
    pub rate: f64,
    pub qmax: f64,
    pub drawdown: f64,
    /// rate / qmax × 100
    pub efficiency_percent: f64,
}

/// IPR fitted to a single well test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IprModel {
    pub method: IprMethod,
    pub reservoir_pressure: f64,
    pub bubble_point: Option<f64>,
    pub test_rate: f64,
    pub test_pwf: f64,
    /// Absolute open flow (bopd)
    pub qmax: f64,
    /// J (bpd/psi); above Pb for a composite fit
    pub productivity_index: f64,
    /// Rate at the bubble point; None unless undersaturated
    pub bubble_point_rate: Option<f64>,
    pub is_below_bubble_point: bool,
    pub skin: Option<f64>,
    pub flow_efficiency: Option<f64>,
    pub ideal_qmax: Option<f64>,
}

impl IprModel {
    /// Fit from one test point.
    ///
    /// `Vogel` handles both saturated (Pr ≤ Pb, or no Pb) and composite
    /// undersaturated reservoirs. `Darcy` fits a straight line.
    pub fn fit_from_test(
        method: IprMethod,
        pr: f64,
        pb: Option<f64>,
        test_rate: f64,
        test_pwf: f64,
    ) -> Result<Self, CalcError> {
        validate_pressures(pr, test_pwf)?;
        if test_rate <= 0.0 {
            return Err(CalcError::non_positive("Test rate", test_rate));
        }
        if let Some(pb) = pb {
            if pb <= 0.0 {
                return Err(CalcError::non_positive("Bubble point pressure", pb));
            }
        }

        let mut model = Self {
            method,
            reservoir_pressure: pr,
            bubble_point: pb,
            test_rate,
            test_pwf,
            qmax: 0.0,
            productivity_index: 0.0,
            bubble_point_rate: None,
            is_below_bubble_point: false,
            skin: None,
            flow_efficiency: None,
            ideal_qmax: None,
        };

        match method {
            IprMethod::Darcy => {
                let j = productivity_index(test_rate, pr, test_pwf)?;
                model.productivity_index = j;
                model.qmax = j * pr;
            }
            IprMethod::Vogel => model.fit_vogel()?,
            IprMethod::Fetkovich | IprMethod::Jones => {
                return Err(CalcError::Invalid(format!(
                    "{method} coefficients cannot be fitted from a single test"
                )));
            }
        }

        debug!(
            method = %method,
            qmax = model.qmax,
            j = model.productivity_index,
            "IPR fitted from test"
        );
        Ok(model)
    }

    fn fit_vogel(&mut self) -> Result<(), CalcError> {
        let pr = self.reservoir_pressure;
        let q = self.test_rate;
        let pwf = self.test_pwf;

        match self.bubble_point {
            Some(pb) if pr > pb => {
                let j = if pwf >= pb {
                    productivity_index(q, pr, pwf)?
                } else {
                    let y = pwf / pb;
                    q / ((pr - pb) + (pb / VOGEL_SLOPE_FACTOR) * vogel_factor(y))
                };
                let qb = j * (pr - pb);
                self.productivity_index = j;
                self.bubble_point_rate = Some(qb);
                self.qmax = qb + j * pb / VOGEL_SLOPE_FACTOR;
            }
            _ => {
                let factor = vogel_factor(pwf / pr);
                if factor <= 0.0 {
                    return Err(CalcError::ZeroDenominator {
                        quantity: "Qmax".into(),
                        term: "Vogel factor".into(),
                    });
                }
                self.is_below_bubble_point = true;
                self.qmax = q / factor;
                self.productivity_index = VOGEL_SLOPE_FACTOR * self.qmax / pr;
            }
        }
        Ok(())
    }

    /// Rate predicted by the fitted model at `pwf`.
    pub fn rate_at(&self, pwf: f64) -> Result<f64, CalcError> {
        let pr = self.reservoir_pressure;
        validate_pressures(pr, pwf)?;

        let rate = match (self.method, self.bubble_point, self.bubble_point_rate) {
            (IprMethod::Darcy, _, _) => self.productivity_index * (pr - pwf),
            (_, Some(pb), Some(qb)) => {
                if pwf >= pb {
                    self.productivity_index * (pr - pwf)
                } else {
                    qb + (self.qmax - qb) * vogel_factor(pwf / pb)
                }
            }
            _ => self.qmax * vogel_factor(pwf / pr),
        };
        Ok(rate.max(0.0))
    }

    /// `points + 1` samples from Pwf = Pr down to 0.
    pub fn generate_curve(&self, points: usize) -> Result<Vec<CurvePoint>, CalcError> {
        if points == 0 {
            return Err(CalcError::Invalid("Number of curve points must be positive".into()));
        }
        let step = self.reservoir_pressure / points as f64;

        (0..=points)
            .map(|i| {
                let pwf = (self.reservoir_pressure - step * i as f64).max(0.0);
                Ok(CurvePoint {
                    pwf: round_half_up(pwf, 2),
                    rate: round_half_up(self.rate_at(pwf)?, 2),
                })
            })
            .collect()
    }

    pub fn operating_point(&self, pwf: f64) -> Result<OperatingPoint, CalcError> {
        let rate = self.rate_at(pwf)?;
        let efficiency = if self.qmax > 0.0 {
            round_half_up(rate / self.qmax * 100.0, 2)
        } else {
            0.0
        };
        Ok(OperatingPoint {
            pwf,
            rate: round_half_up(rate, 2),
            qmax: round_half_up(self.qmax, 2),
            drawdown: self.reservoir_pressure - pwf,
            efficiency_percent: efficiency,
        })
    }

    /// Apply a skin factor at the test drawdown.
    ///
    /// Formula: FE = (Δp − S·Δp/7) / Δp, ideal qmax = qmax / FE
    pub fn flow_efficiency(&mut self, skin: f64) -> Result<f64, CalcError> {
        let drawdown = self.reservoir_pressure - self.test_pwf;
        if drawdown <= 0.0 {
            return Err(CalcError::Invalid("Drawdown must be positive".into()));
        }
        let delta_p_skin = skin * drawdown / 7.0;
        let fe = round_half_up((drawdown - delta_p_skin) / drawdown, 4);
        if fe <= 0.0 {
            return Err(CalcError::non_positive("Flow efficiency", fe));
        }

        self.skin = Some(skin);
        self.flow_efficiency = Some(fe);
        self.ideal_qmax = Some(round_half_up(self.qmax / fe, 2));
        Ok(fe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pressure_validation_messages() {
        let eq = IprEquation::Darcy {
            productivity_index: 1.0,
        };
        assert_eq!(
            eq.flow_rate(0.0, 0.0).unwrap_err().to_string(),
            "Reservoir pressure must be positive"
        );
        assert_eq!(
            eq.flow_rate(3000.0, -1.0).unwrap_err().to_string(),
            "Flowing pressure cannot be negative"
        );
        assert_eq!(
            eq.flow_rate(3000.0, 3500.0).unwrap_err().to_string(),
            "Flowing pressure cannot exceed reservoir pressure"
        );
    }

    #[test]
    fn test_vogel_equation() {
        let q = IprEquation::Vogel { qmax: 1000.0 }
            .flow_rate(3000.0, 1500.0)
            .unwrap();
        // x = 0.5: 1 - 0.1 - 0.2 = 0.7
        assert!((q - 700.0).abs() < 1e-9);
    }

    #[test]
    fn test_fetkovich_and_jones() {
        let q = IprEquation::Fetkovich { c: 0.001, n: 1.0 }
            .flow_rate(2000.0, 1000.0)
            .unwrap();
        assert!((q - 3000.0).abs() < 1e-6);

        // a = 0 reduces Jones to q = sqrt(dp / b)
        let q = IprEquation::Jones { a: 0.0, b: 0.01 }
            .flow_rate(2000.0, 1000.0)
            .unwrap();
        assert!((q - (1000.0f64 / 0.01).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_jones_zero_drawdown_and_non_negative() {
        let q = IprEquation::Jones { a: 0.0, b: 0.01 }
            .flow_rate(1000.0, 1000.0)
            .unwrap();
        assert_eq!(q, 0.0);

        let eq = IprEquation::Jones { a: 1.0, b: 1e-6 };
        assert!(eq.flow_rate(1000.0, 500.0).unwrap() >= 0.0);
    }

    #[test]
    fn test_saturated_fit_round_trip() {
        let model = IprModel::fit_from_test(IprMethod::Vogel, 2500.0, None, 800.0, 1500.0).unwrap();
        assert!(model.is_below_bubble_point);
        assert!((model.productivity_index - 1.8 * model.qmax / 2500.0).abs() < 1e-9);
        assert!((model.rate_at(1500.0).unwrap() - 800.0).abs() < 1e-6);
        assert!((model.rate_at(0.0).unwrap() - model.qmax).abs() < 1e-9);
    }

    #[test]
    fn test_composite_fit_test_above_bubble_point() {
        let model =
            IprModel::fit_from_test(IprMethod::Vogel, 4000.0, Some(2000.0), 1000.0, 3000.0).unwrap();
        assert!((model.productivity_index - 1.0).abs() < 1e-12);
        assert_eq!(model.bubble_point_rate, Some(2000.0));
        assert!((model.qmax - (2000.0 + 2000.0 / 1.8)).abs() < 1e-9);
        assert!((model.rate_at(3000.0).unwrap() - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_composite_fit_test_below_bubble_point_round_trip() {
        let model =
            IprModel::fit_from_test(IprMethod::Vogel, 4000.0, Some(2500.0), 1800.0, 1200.0).unwrap();
        assert!(!model.is_below_bubble_point);
        assert!((model.rate_at(1200.0).unwrap() - 1800.0).abs() < 1e-6);
        // Continuous at Pb
        let qb = model.bubble_point_rate.unwrap();
        assert!((model.rate_at(2500.0).unwrap() - qb).abs() < 1e-9);
    }

    #[test]
    fn test_darcy_fit_requires_drawdown() {
        let err = IprModel::fit_from_test(IprMethod::Darcy, 3000.0, None, 500.0, 3000.0).unwrap_err();
        assert_eq!(err.to_string(), "Drawdown must be positive");
    }

    #[test]
    fn test_generate_curve_spans_pressure_range() {
        let model = IprModel::fit_from_test(IprMethod::Vogel, 3000.0, None, 600.0, 2000.0).unwrap();
        let curve = model.generate_curve(10).unwrap();
        assert_eq!(curve.len(), 11);
        assert_eq!(curve[0].pwf, 3000.0);
        assert_eq!(curve[0].rate, 0.0);
        assert_eq!(curve[10].pwf, 0.0);
        assert!(curve.windows(2).all(|w| w[1].rate >= w[0].rate));
        assert!(model.generate_curve(0).is_err());
    }

    #[test]
    fn test_operating_point_efficiency() {
        let model = IprModel::fit_from_test(IprMethod::Vogel, 3000.0, None, 700.0, 1500.0).unwrap();
        let op = model.operating_point(1500.0).unwrap();
        assert!((op.efficiency_percent - 70.0).abs() < 1e-9);
        assert_eq!(op.drawdown, 1500.0);
    }

    #[test]
    fn test_flow_efficiency_with_skin() {
        let mut model =
            IprModel::fit_from_test(IprMethod::Vogel, 3000.0, None, 700.0, 1500.0).unwrap();
        let fe = model.flow_efficiency(3.5).unwrap();
        assert!((fe - 0.5).abs() < 1e-12);
        assert!((model.ideal_qmax.unwrap() - round_half_up(model.qmax * 2.0, 2)).abs() < 1e-9);
        assert!(model.flow_efficiency(7.0).is_err());
    }
}
