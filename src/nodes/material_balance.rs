//! Material balance node
//!
//! Evaluates one Havlena-Odeh term or drive index from a single pressure
//! step carried in the message body. Only the fields the chosen calculation
//! needs are read.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{number, optional_number, CalculationNode, OutputOptions};
use crate::error::{ensure_positive, ensure_range, CalcError};
use crate::physics_engine::material_balance::simple_ooip;
use crate::physics_engine::{DataPoint, DriveIndices, InitialConditions, MbeTerms};

/// Quantity written by [`MaterialBalanceNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MbeCalculation {
    /// Underground withdrawal
    F,
    /// Oil and dissolved-gas expansion
    Eo,
    /// Gas-cap expansion
    Eg,
    /// Formation and connate-water expansion
    Efw,
    /// N = F / (Eo + Efw)
    #[serde(rename = "OOIP_SIMPLE")]
    OoipSimple,
    #[serde(rename = "DDI")]
    Ddi,
    #[serde(rename = "SDI")]
    Sdi,
    #[serde(rename = "WDI")]
    Wdi,
    #[serde(rename = "CDI")]
    Cdi,
}

/// Single-step material balance over body fields.
///
/// Output options are nested under `output`. Unlike the other nodes the
/// result is only written to the body by default, at the model's 8-place
/// term precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MaterialBalanceNode {
    pub calculation_type: MbeCalculation,
    pub result_key: String,
    pub np_key: String,
    pub gp_key: String,
    pub wp_key: String,
    pub wi_key: String,
    pub gi_key: String,
    pub bo_key: String,
    pub bg_key: String,
    pub rs_key: String,
    pub bw_key: String,
    pub boi_key: String,
    pub rsi_key: String,
    pub bgi_key: String,
    pub m_key: String,
    pub cw_key: String,
    pub cf_key: String,
    pub swi_key: String,
    pub pi_key: String,
    pub p_key: String,
    pub n_key: String,
    pub output: OutputOptions,
}

impl Default for MaterialBalanceNode {
    fn default() -> Self {
        Self {
            calculation_type: MbeCalculation::F,
            result_key: "mbeResult".into(),
            np_key: "Np".into(),
            gp_key: "Gp".into(),
            wp_key: "Wp".into(),
            wi_key: "Wi".into(),
            gi_key: "Gi".into(),
            bo_key: "Bo".into(),
            bg_key: "Bg".into(),
            rs_key: "Rs".into(),
            bw_key: "Bw".into(),
            boi_key: "Boi".into(),
            rsi_key: "Rsi".into(),
            bgi_key: "Bgi".into(),
            m_key: "m".into(),
            cw_key: "cw".into(),
            cf_key: "cf".into(),
            swi_key: "Swi".into(),
            pi_key: "Pi".into(),
            p_key: "P".into(),
            n_key: "N".into(),
            output: OutputOptions {
                result_precision: 8,
                ..OutputOptions::transient()
            },
        }
    }
}

impl MaterialBalanceNode {
    fn required(&self, body: &Map<String, Value>, key: &str) -> Result<f64, CalcError> {
        number(body, key, key)
    }

    /// Pressures and formation volume factors.
    fn positive(&self, body: &Map<String, Value>, key: &str) -> Result<f64, CalcError> {
        ensure_positive(key, self.required(body, key)?)
    }

    fn or_default(&self, body: &Map<String, Value>, key: &str, default: f64) -> f64 {
        optional_number(body, Some(key)).unwrap_or(default)
    }

    fn gas_cap_ratio(&self, body: &Map<String, Value>) -> f64 {
        self.or_default(body, &self.m_key, 0.0)
    }

    /// Initial state with only Boi filled; callers add what their term reads.
    fn initial(&self, body: &Map<String, Value>) -> Result<InitialConditions, CalcError> {
        Ok(InitialConditions {
            pi: 0.0,
            boi: self.positive(body, &self.boi_key)?,
            rsi: 0.0,
            bgi: None,
            swi: None,
            cw: None,
            cf: None,
            m: self.gas_cap_ratio(body),
        })
    }

    fn withdrawal(&self, body: &Map<String, Value>) -> Result<f64, CalcError> {
        let mut point = DataPoint::new(
            0.0,
            self.required(body, &self.np_key)?,
            self.required(body, &self.gp_key)?,
            self.positive(body, &self.bo_key)?,
            self.positive(body, &self.bg_key)?,
            self.required(body, &self.rs_key)?,
        );
        point.wp = self.or_default(body, &self.wp_key, 0.0);
        point.wi = self.or_default(body, &self.wi_key, 0.0);
        point.gi = self.or_default(body, &self.gi_key, 0.0);
        point.bw = self.or_default(body, &self.bw_key, 1.0);
        Ok(point.underground_withdrawal())
    }

    fn oil_expansion(&self, body: &Map<String, Value>) -> Result<f64, CalcError> {
        let bo = self.positive(body, &self.bo_key)?;
        let mut initial = self.initial(body)?;
        let rs = self.required(body, &self.rs_key)?;
        initial.rsi = self.required(body, &self.rsi_key)?;
        let bg = self.positive(body, &self.bg_key)?;
        Ok(initial.oil_expansion(&DataPoint::new(0.0, 0.0, 0.0, bo, bg, rs)))
    }

    fn gas_cap_expansion(&self, body: &Map<String, Value>) -> Result<f64, CalcError> {
        let mut initial = self.initial(body)?;
        let bg = self.positive(body, &self.bg_key)?;
        initial.bgi = Some(self.required(body, &self.bgi_key)?);
        Ok(initial.gas_cap_expansion(&DataPoint::new(0.0, 0.0, 0.0, 0.0, bg, 0.0)))
    }

    fn formation_water_expansion(&self, body: &Map<String, Value>) -> Result<f64, CalcError> {
        let mut initial = self.initial(body)?;
        initial.cw = Some(self.required(body, &self.cw_key)?);
        initial.cf = Some(self.required(body, &self.cf_key)?);
        let swi = self.required(body, &self.swi_key)?;
        initial.swi = Some(ensure_range(&self.swi_key, swi, 0.0, 1.0)?);
        initial.pi = self.positive(body, &self.pi_key)?;
        let pressure = self.positive(body, &self.p_key)?;
        Ok(initial.formation_water_expansion(&DataPoint::new(pressure, 0.0, 0.0, 0.0, 0.0, 0.0)))
    }

    /// Drive indices with only the terms `calculation` depends on.
    fn drive_indices(
        &self,
        body: &Map<String, Value>,
        calculation: MbeCalculation,
    ) -> Result<DriveIndices, CalcError> {
        let n = self.required(body, &self.n_key)?;
        let all = calculation == MbeCalculation::Wdi;
        let mut terms = MbeTerms {
            f: self.withdrawal(body)?,
            ..MbeTerms::default()
        };
        if all || calculation == MbeCalculation::Ddi {
            terms.eo = self.oil_expansion(body)?;
        }
        if all || calculation == MbeCalculation::Sdi {
            terms.eg = self.gas_cap_expansion(body)?;
        }
        if all || calculation == MbeCalculation::Cdi {
            terms.efw = self.formation_water_expansion(body)?;
        }
        Ok(DriveIndices::compute(n, self.gas_cap_ratio(body), &terms))
    }
}

impl CalculationNode for MaterialBalanceNode {
    fn label(&self) -> &'static str {
        "material balance"
    }

    fn output_field(&self) -> &str {
        &self.result_key
    }

    fn output_options(&self) -> &OutputOptions {
        &self.output
    }

    fn evaluate(&self, body: &Map<String, Value>) -> Result<f64, CalcError> {
        match self.calculation_type {
            MbeCalculation::F => self.withdrawal(body),
            MbeCalculation::Eo => self.oil_expansion(body),
            MbeCalculation::Eg => self.gas_cap_expansion(body),
            MbeCalculation::Efw => self.formation_water_expansion(body),
            MbeCalculation::OoipSimple => simple_ooip(&MbeTerms {
                f: self.withdrawal(body)?,
                eo: self.oil_expansion(body)?,
                eg: 0.0,
                efw: self.formation_water_expansion(body)?,
            }),
            kind @ (MbeCalculation::Ddi
            | MbeCalculation::Sdi
            | MbeCalculation::Wdi
            | MbeCalculation::Cdi) => {
                let indices = self.drive_indices(body, kind)?;
                Ok(match kind {
                    MbeCalculation::Ddi => indices.ddi,
                    MbeCalculation::Sdi => indices.sdi,
                    MbeCalculation::Cdi => indices.cdi,
                    _ => indices.wdi,
                })
            }
        }
    }
}
