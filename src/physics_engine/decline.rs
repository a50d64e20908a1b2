//! Arps decline-curve analysis
//!
//! Rate, cumulative, time-to-rate and EUR forecasting for the three Arps
//! decline families:
//! - Exponential (b = 0)
//! - Hyperbolic (0 < b < 1)
//! - Harmonic (b = 1)

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ensure_non_negative, ensure_positive, CalcError};

// ============================================================================
// Decline Type
// ============================================================================

/// Arps decline family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeclineType {
    Exponential,
    Hyperbolic,
    Harmonic,
}

impl DeclineType {
    /// Resolve the b-exponent for this family.
    ///
    /// Exponential and harmonic ignore `supplied`. Hyperbolic accepts a
    /// supplied b strictly inside (0, 1) and otherwise falls back to
    /// `default_b` with a warning.
    pub fn b_exponent(self, supplied: Option<f64>, default_b: f64) -> f64 {
        match self {
            Self::Exponential => 0.0,
            Self::Harmonic => 1.0,
            Self::Hyperbolic => match supplied {
                Some(b) if b > 0.0 && b < 1.0 => b,
                Some(b) => {
                    warn!(b, default_b, "Hyperbolic b outside range (0,1), using default");
                    default_b
                }
                None => default_b,
            },
        }
    }
}

impl std::fmt::Display for DeclineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exponential => write!(f, "EXPONENTIAL"),
            Self::Hyperbolic => write!(f, "HYPERBOLIC"),
            Self::Harmonic => write!(f, "HARMONIC"),
        }
    }
}

/// Which decline quantity to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeclineCalculation {
    /// q(t)
    RateAtTime,
    /// Np(t)
    CumulativeAtTime,
    /// t at which q reaches the target rate
    TimeToRate,
    /// Np at the economic-limit rate
    Eur,
}

// ============================================================================
// Parameters
// ============================================================================

/// Validated Arps parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeclineParameters {
    /// Initial rate (bbl/d or Mscf/d)
    pub qi: f64,
    /// Nominal initial decline rate (1/time)
    pub di: f64,
    /// Arps exponent in [0, 1]
    pub b: f64,
}

impl DeclineParameters {
    /// Build parameters, rejecting non-positive qi/Di and b outside [0, 1].
    pub fn new(qi: f64, di: f64, b: f64) -> Result<Self, CalcError> {
        if qi <= 0.0 {
            return Err(CalcError::non_positive("Initial rate", qi));
        }
        if di <= 0.0 {
            return Err(CalcError::non_positive("Decline rate", di));
        }
        if !(0.0..=1.0).contains(&b) {
            return Err(CalcError::out_of_range("b exponent", 0.0, 1.0, b));
        }
        Ok(Self { qi, di, b })
    }

    /// Build parameters for a decline family, resolving b from `supplied_b`.
    pub fn for_type(
        decline: DeclineType,
        qi: f64,
        di: f64,
        supplied_b: Option<f64>,
        default_b: f64,
    ) -> Result<Self, CalcError> {
        Self::new(qi, di, decline.b_exponent(supplied_b, default_b))
    }

    pub fn decline_type(&self) -> DeclineType {
        if self.b == 0.0 {
            DeclineType::Exponential
        } else if self.b == 1.0 {
            DeclineType::Harmonic
        } else {
            DeclineType::Hyperbolic
        }
    }

    /// Evaluate one decline quantity. For `TimeToRate` and `Eur` the
    /// `input` argument is the target / economic-limit rate, otherwise time.
    pub fn evaluate(&self, calculation: DeclineCalculation, input: f64) -> Result<f64, CalcError> {
        match calculation {
            DeclineCalculation::RateAtTime => self.rate_at_time(input),
            DeclineCalculation::CumulativeAtTime => self.cumulative_at_time(input),
            DeclineCalculation::TimeToRate => self.time_to_rate(input),
            DeclineCalculation::Eur => self.eur(input),
        }
    }

    /// Rate at time t.
    ///
    /// Formula:
    /// - Exponential: q = qi × e^(−Di·t)
    /// - Harmonic: q = qi / (1 + Di·t)
    /// - Hyperbolic: q = qi / (1 + b·Di·t)^(1/b)
    pub fn rate_at_time(&self, t: f64) -> Result<f64, CalcError> {
        ensure_non_negative("Time", t)?;
        Ok(self.rate_unchecked(t))
    }

    fn rate_unchecked(&self, t: f64) -> f64 {
        let Self { qi, di, b } = *self;
        match self.decline_type() {
            DeclineType::Exponential => qi * (-di * t).exp(),
            DeclineType::Harmonic => qi / (1.0 + di * t),
            DeclineType::Hyperbolic => qi / (1.0 + b * di * t).powf(1.0 / b),
        }
    }

    /// Cumulative production at time t.
    ///
    /// Formula:
    /// - Exponential: Np = (qi/Di) × (1 − e^(−Di·t))
    /// - Harmonic: Np = (qi/Di) × ln(1 + Di·t)
    /// - Hyperbolic: Np = qi / ((1−b)·Di) × (1 − (q/qi)^(1−b))
    pub fn cumulative_at_time(&self, t: f64) -> Result<f64, CalcError> {
        ensure_non_negative("Time", t)?;
        Ok(self.cumulative_unchecked(t))
    }

    fn cumulative_unchecked(&self, t: f64) -> f64 {
        let Self { qi, di, b } = *self;
        match self.decline_type() {
            DeclineType::Exponential => (qi / di) * (1.0 - (-di * t).exp()),
            DeclineType::Harmonic => (qi / di) * (1.0 + di * t).ln(),
            DeclineType::Hyperbolic => {
                let q = self.rate_unchecked(t);
                (qi / ((1.0 - b) * di)) * (1.0 - (q / qi).powf(1.0 - b))
            }
        }
    }

    /// Time at which the rate declines to `target_rate`.
    ///
    /// Fails unless 0 < target_rate < qi.
    ///
    /// Formula:
    /// - Exponential: t = −ln(q/qi) / Di
    /// - Harmonic: t = (qi/q − 1) / Di
    /// - Hyperbolic: t = ((qi/q)^b − 1) / (b·Di)
    pub fn time_to_rate(&self, target_rate: f64) -> Result<f64, CalcError> {
        let Self { qi, di, b } = *self;
        if !(target_rate > 0.0 && target_rate < qi) {
            return Err(CalcError::InvalidTargetRate {
                target: target_rate,
                initial: qi,
            });
        }
        Ok(match self.decline_type() {
            DeclineType::Exponential => -(target_rate / qi).ln() / di,
            DeclineType::Harmonic => (qi / target_rate - 1.0) / di,
            DeclineType::Hyperbolic => ((qi / target_rate).powf(b) - 1.0) / (b * di),
        })
    }

    /// Estimated ultimate recovery down to `economic_limit`.
    pub fn eur(&self, economic_limit: f64) -> Result<f64, CalcError> {
        let t_limit = self.time_to_rate(economic_limit)?;
        Ok(self.cumulative_unchecked(t_limit))
    }

    /// Tabulate rate and cumulative from t = 0 to `horizon` every `step`.
    pub fn forecast(&self, horizon: f64, step: f64) -> Result<Vec<ForecastPoint>, CalcError> {
        ensure_non_negative("Forecast horizon", horizon)?;
        ensure_positive("Forecast step", step)?;

        let steps = (horizon / step).floor() as usize;
        Ok((0..=steps)
            .map(|i| {
                let t = step * i as f64;
                ForecastPoint {
                    time: t,
                    rate: self.rate_unchecked(t),
                    cumulative: self.cumulative_unchecked(t),
                }
            })
            .collect())
    }
}

/// One row of a decline forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub time: f64,
    pub rate: f64,
    pub cumulative: f64,
}

// ============================================================================
// Tests
// ============================================================================
