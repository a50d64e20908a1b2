//! PVT fluid-property correlations
//!
//! Black-oil correlations dispatched on a (property, correlation) pair:
//! - Bubble point: Standing, Vazquez-Beggs, Glasø
//! - Oil formation volume factor: Standing, Vazquez-Beggs, Glasø
//! - Dead-oil viscosity: Beggs-Robinson, Egbogah
//! - Solution gas-oil ratio: Standing, Vazquez-Beggs
//!
//! Units: temperature °F, pressure psia, Rs scf/STB, gas gravity air = 1.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, ensure_positive, CalcError};

// ============================================================================
// Property / Correlation / Input enums
// ============================================================================

/// Fluid property to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PvtProperty {
    /// Pb (psia)
    BubblePoint,
    /// Bo (rb/STB)
    OilFvf,
    /// μod (cp)
    DeadOilViscosity,
    /// Rs (scf/STB)
    SolutionGor,
}

impl std::fmt::Display for PvtProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BubblePoint => write!(f, "Bubble point"),
            Self::OilFvf => write!(f, "Oil FVF"),
            Self::DeadOilViscosity => write!(f, "Dead-oil viscosity"),
            Self::SolutionGor => write!(f, "Solution GOR"),
        }
    }
}

/// Published correlation family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PvtCorrelation {
    Standing,
    VazquezBeggs,
    Glaso,
    BeggsRobinson,
    Egbogah,
}

impl std::fmt::Display for PvtCorrelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standing => write!(f, "Standing"),
            Self::VazquezBeggs => write!(f, "Vazquez-Beggs"),
            Self::Glaso => write!(f, "Glasø"),
            Self::BeggsRobinson => write!(f, "Beggs-Robinson"),
            Self::Egbogah => write!(f, "Egbogah"),
        }
    }
}

/// A single correlation input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PvtInput {
    Rs,
    GasGravity,
    OilGravity,
    ApiGravity,
    Temperature,
    Pressure,
}

impl PvtInput {
    /// Human-readable name used in error messages.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Rs => "Solution GOR",
            Self::GasGravity => "Gas Gravity",
            Self::OilGravity => "Oil Gravity",
            Self::ApiGravity => "API Gravity",
            Self::Temperature => "Temperature",
            Self::Pressure => "Pressure",
        }
    }

    /// Default message-body key.
    pub fn default_key(self) -> &'static str {
        match self {
            Self::Rs => "rs",
            Self::GasGravity => "gasGravity",
            Self::OilGravity => "oilGravity",
            Self::ApiGravity => "apiGravity",
            Self::Temperature => "temperature",
            Self::Pressure => "pressure",
        }
    }
}

/// Correlation inputs. Only the inputs a correlation needs must be present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PvtInputs {
    pub rs: Option<f64>,
    pub gas_gravity: Option<f64>,
    pub oil_gravity: Option<f64>,
    pub api_gravity: Option<f64>,
    pub temperature: Option<f64>,
    pub pressure: Option<f64>,
}

impl PvtInputs {
    pub fn get(&self, input: PvtInput) -> Option<f64> {
        match input {
            PvtInput::Rs => self.rs,
            PvtInput::GasGravity => self.gas_gravity,
            PvtInput::OilGravity => self.oil_gravity,
            PvtInput::ApiGravity => self.api_gravity,
            PvtInput::Temperature => self.temperature,
            PvtInput::Pressure => self.pressure,
        }
    }

    pub fn set(&mut self, input: PvtInput, value: f64) {
        let slot = match input {
            PvtInput::Rs => &mut self.rs,
            PvtInput::GasGravity => &mut self.gas_gravity,
            PvtInput::OilGravity => &mut self.oil_gravity,
            PvtInput::ApiGravity => &mut self.api_gravity,
            PvtInput::Temperature => &mut self.temperature,
            PvtInput::Pressure => &mut self.pressure,
        };
        *slot = Some(value);
    }

    fn require(&self, input: PvtInput) -> Result<f64, CalcError> {
        self.get(input)
            .ok_or_else(|| CalcError::missing(input.display_name(), input.default_key()))
    }

    fn rs(&self) -> Result<f64, CalcError> {
        ensure_non_negative("Solution GOR", self.require(PvtInput::Rs)?)
    }

    fn gas_gravity(&self) -> Result<f64, CalcError> {
        ensure_positive("Gas gravity", self.require(PvtInput::GasGravity)?)
    }

    fn oil_gravity(&self) -> Result<f64, CalcError> {
        ensure_positive("Oil gravity", self.require(PvtInput::OilGravity)?)
    }

    fn api(&self) -> Result<f64, CalcError> {
        ensure_positive("API gravity", self.require(PvtInput::ApiGravity)?)
    }

    fn temperature(&self) -> Result<f64, CalcError> {
        ensure_positive("Temperature", self.require(PvtInput::Temperature)?)
    }

    fn pressure(&self) -> Result<f64, CalcError> {
        ensure_positive("Pressure", self.require(PvtInput::Pressure)?)
    }
}

/// Inputs a (property, correlation) pair reads, or `Unsupported`.
pub fn required_inputs(
    property: PvtProperty,
    correlation: PvtCorrelation,
) -> Result<&'static [PvtInput], CalcError> {
    use PvtCorrelation as C;
    use PvtInput as I;
    use PvtProperty as P;

    const SATURATED: &[PvtInput] = &[I::Rs, I::GasGravity, I::Temperature, I::ApiGravity];
    const DEAD_OIL: &[PvtInput] = &[I::ApiGravity, I::Temperature];
    const GOR: &[PvtInput] = &[I::GasGravity, I::Pressure, I::ApiGravity, I::Temperature];

    match (property, correlation) {
        (P::BubblePoint, C::Standing | C::VazquezBeggs | C::Glaso) => Ok(SATURATED),
        (P::OilFvf, C::Standing) => Ok(&[I::Rs, I::GasGravity, I::OilGravity, I::Temperature]),
        (P::OilFvf, C::VazquezBeggs | C::Glaso) => Ok(SATURATED),
        (P::DeadOilViscosity, C::BeggsRobinson | C::Egbogah) => Ok(DEAD_OIL),
        (P::SolutionGor, C::Standing | C::VazquezBeggs) => Ok(GOR),
        _ => Err(CalcError::Unsupported {
            property: property.to_string(),
            correlation: correlation.to_string(),
        }),
    }
}

/// Evaluate a property with the chosen correlation.
pub fn calculate(
    property: PvtProperty,
    correlation: PvtCorrelation,
    inputs: &PvtInputs,
) -> Result<f64, CalcError> {
    use PvtCorrelation as C;
    use PvtProperty as P;

    match (property, correlation) {
        (P::BubblePoint, C::Standing) => bubble_point_standing(inputs),
        (P::BubblePoint, C::VazquezBeggs) => bubble_point_vazquez_beggs(inputs),
        (P::BubblePoint, C::Glaso) => bubble_point_glaso(inputs),
        (P::OilFvf, C::Standing) => oil_fvf_standing(inputs),
        (P::OilFvf, C::VazquezBeggs) => oil_fvf_vazquez_beggs(inputs),
        (P::OilFvf, C::Glaso) => oil_fvf_glaso(inputs),
        (P::DeadOilViscosity, C::BeggsRobinson) => dead_oil_viscosity_beggs_robinson(inputs),
        (P::DeadOilViscosity, C::Egbogah) => dead_oil_viscosity_egbogah(inputs),
        (P::SolutionGor, C::Standing) => solution_gor_standing(inputs),
        (P::SolutionGor, C::VazquezBeggs) => solution_gor_vazquez_beggs(inputs),
        _ => Err(CalcError::Unsupported {
            property: property.to_string(),
            correlation: correlation.to_string(),
        }),
    }
}

// ============================================================================
// Vazquez-Beggs coefficient tables
// ============================================================================

/// (C1, C2, C3) for bubble point / solution GOR, split at 30 °API.
fn vazquez_beggs_rs_coefficients(api: f64) -> (f64, f64, f64) {
    if api <= 30.0 {
        (0.0362, 1.0937, 25.7240)
    } else {
        (0.0178, 1.187, 23.931)
    }
}

/// (C1, C2, C3) for oil FVF, split at 30 °API.
fn vazquez_beggs_bo_coefficients(api: f64) -> (f64, f64, f64) {
    if api <= 30.0 {
        (4.677e-4, 1.751e-5, -1.811e-8)
    } else {
        (4.670e-4, 1.100e-5, 1.337e-9)
    }
}

// ============================================================================
// Bubble Point
// ============================================================================

/// Standing bubble point.
///
/// Formula: Pb = 18.2 × ((Rs/γg)^0.83 × 10^(0.00091·T − 0.0125·API) − 1.4)
pub fn bubble_point_standing(inputs: &PvtInputs) -> Result<f64, CalcError> {
    let rs = inputs.rs()?;
    let gg = inputs.gas_gravity()?;
    let t = inputs.temperature()?;
    let api = inputs.api()?;

    let exponent = 0.00091 * t - 0.0125 * api;
    Ok(18.2 * ((rs / gg).powf(0.83) * 10f64.powf(exponent) - 1.4))
}

/// Vazquez-Beggs bubble point, separator gravity taken at reference conditions.
///
/// Formula: Pb = (Rs / (C1 × γg × e^(C3·API/(T+460))))^(1/C2)
pub fn bubble_point_vazquez_beggs(inputs: &PvtInputs) -> Result<f64, CalcError> {
    let rs = inputs.rs()?;
    let gg = inputs.gas_gravity()?;
    let t = inputs.temperature()?;
    let api = inputs.api()?;

    let (c1, c2, c3) = vazquez_beggs_rs_coefficients(api);
    let denominator = c1 * gg * (c3 * api / (t + 460.0)).exp();
    Ok((rs / denominator).powf(1.0 / c2))
}

/// Glasø bubble point.
///
/// Formula:
/// - pb* = (Rs/γg)^0.816 × T^0.172 / API^0.989
/// - log Pb = 1.7669 + 1.7447·log pb* − 0.30218·(log pb*)²
pub fn bubble_point_glaso(inputs: &PvtInputs) -> Result<f64, CalcError> {
    let rs = ensure_positive("Solution GOR", inputs.rs()?)?;
    let gg = inputs.gas_gravity()?;
    let t = inputs.temperature()?;
    let api = inputs.api()?;

    let pb_star = (rs / gg).powf(0.816) * t.powf(0.172) / api.powf(0.989);
    let log_star = pb_star.log10();
    let log_pb = 1.7669 + 1.7447 * log_star - 0.30218 * log_star.powi(2);
    Ok(10f64.powf(log_pb))
}

// ============================================================================
// Oil Formation Volume Factor
// ============================================================================

/// Standing oil FVF at or below the bubble point.
///
/// Formula: Bo = 0.9759 + 0.00012 × (Rs·√(γg/γo) + 1.25·T)^1.2
pub fn oil_fvf_standing(inputs: &PvtInputs) -> Result<f64, CalcError> {
    let rs = inputs.rs()?;
    let gg = inputs.gas_gravity()?;
    let go = inputs.oil_gravity()?;
    let t = inputs.temperature()?;

    let f = rs * (gg / go).sqrt() + 1.25 * t;
    Ok(0.9759 + 0.00012 * f.powf(1.2))
}

/// Vazquez-Beggs oil FVF.
///
/// Formula: Bo = 1 + C1·Rs + (T − 60)·(API/γg)·(C2 + C3·Rs)
pub fn oil_fvf_vazquez_beggs(inputs: &PvtInputs) -> Result<f64, CalcError> {
    let rs = inputs.rs()?;
    let gg = inputs.gas_gravity()?;
    let t = inputs.temperature()?;
    let api = inputs.api()?;

    let (c1, c2, c3) = vazquez_beggs_bo_coefficients(api);
    Ok(1.0 + c1 * rs + (t - 60.0) * (api / gg) * (c2 + c3 * rs))
}

/// Glasø oil FVF.
///
/// Formula:
/// - γo = 141.5 / (API + 131.5)
/// - Bob* = Rs·(γg/γo)^0.526 + 0.968·T
/// - log(Bo − 1) = −6.58511 + 2.91329·log Bob* − 0.27683·(log Bob*)²
pub fn oil_fvf_glaso(inputs: &PvtInputs) -> Result<f64, CalcError> {
    let rs = inputs.rs()?;
    let gg = inputs.gas_gravity()?;
    let t = inputs.temperature()?;
    let api = inputs.api()?;

    let go = 141.5 / (api + 131.5);
    let bob_star = rs * (gg / go).powf(0.526) + 0.968 * t;
    let log_bob = bob_star.log10();
    let a = -6.58511 + 2.91329 * log_bob - 0.27683 * log_bob.powi(2);
    Ok(1.0 + 10f64.powf(a))
}

// ============================================================================
// Dead-Oil Viscosity
// ============================================================================

/// Beggs-Robinson dead-oil viscosity.
///
/// Formula: μod = 10^(10^(3.0324 − 0.02023·API) × T^−1.163) − 1
pub fn dead_oil_viscosity_beggs_robinson(inputs: &PvtInputs) -> Result<f64, CalcError> {
    let api = inputs.api()?;
    let t = inputs.temperature()?;

    let y = 10f64.powf(3.0324 - 0.02023 * api);
    let x = t.powf(-1.163);
    Ok(10f64.powf(y * x) - 1.0)
}

/// Egbogah dead-oil viscosity.
///
/// Formula: log(log(μod + 1)) = 1.8653 − 0.025086·API − 0.5644·log T
pub fn dead_oil_viscosity_egbogah(inputs: &PvtInputs) -> Result<f64, CalcError> {
    let api = inputs.api()?;
    let t = inputs.temperature()?;

    let a = 1.8653 - 0.025086 * api - 0.5644 * t.log10();
    Ok(10f64.powf(10f64.powf(a)) - 1.0)
}

// ============================================================================
// Solution GOR
// ============================================================================

/// Standing solution GOR at pressure P.
///
/// Formula: Rs = γg × ((P/18.2 + 1.4) × 10^(0.0125·API − 0.00091·T))^1.2048
pub fn solution_gor_standing(inputs: &PvtInputs) -> Result<f64, CalcError> {
    let gg = inputs.gas_gravity()?;
    let p = inputs.pressure()?;
    let api = inputs.api()?;
    let t = inputs.temperature()?;

    let exponent = 0.0125 * api - 0.00091 * t;
    let term = (p / 18.2 + 1.4) * 10f64.powf(exponent);
    Ok(gg * term.powf(1.2048))
}

/// Vazquez-Beggs solution GOR at pressure P.
///
/// Formula: Rs = C1 × γg × P^C2 × e^(C3·API/(T+460))
pub fn solution_gor_vazquez_beggs(inputs: &PvtInputs) -> Result<f64, CalcError> {
    let gg = inputs.gas_gravity()?;
    let p = inputs.pressure()?;
    let api = inputs.api()?;
    let t = inputs.temperature()?;

    let (c1, c2, c3) = vazquez_beggs_rs_coefficients(api);
    Ok(c1 * gg * p.powf(c2) * (c3 * api / (t + 460.0)).exp())
}

// ============================================================================
// Tests
// ============================================================================
