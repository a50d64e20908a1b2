//! Artificial-lift optimization result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Artificial-lift method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LiftType {
    /// Electric submersible pump
    Esp,
    GasLift,
    /// Progressive cavity pump
    Pcp,
    /// Sucker-rod beam pump
    RodPump,
}

impl std::fmt::Display for LiftType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Esp => write!(f, "ESP"),
            Self::GasLift => write!(f, "GAS_LIFT"),
            Self::Pcp => write!(f, "PCP"),
            Self::RodPump => write!(f, "ROD_PUMP"),
        }
    }
}

/// What a recommendation adjusts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationType {
    EspFrequency,
    PcpSpeed,
    RodPumpSpeed,
    RodPumpStroke,
    GasLiftAllocation,
}

impl RecommendationType {
    /// Noun phrase used in recommendation titles.
    pub fn quantity(self) -> &'static str {
        match self {
            Self::EspFrequency => "ESP frequency",
            Self::PcpSpeed => "PCP speed",
            Self::RodPumpSpeed => "pump speed",
            Self::RodPumpStroke => "stroke length",
            Self::GasLiftAllocation => "gas injection",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::EspFrequency => "Hz",
            Self::PcpSpeed => "RPM",
            Self::RodPumpSpeed => "SPM",
            Self::RodPumpStroke => "inches",
            Self::GasLiftAllocation => "MSCF/day",
        }
    }

    /// Decimal places used when printing values of this quantity.
    pub fn display_precision(self) -> usize {
        match self {
            Self::EspFrequency | Self::RodPumpSpeed => 1,
            Self::PcpSpeed | Self::RodPumpStroke | Self::GasLiftAllocation => 0,
        }
    }
}

impl std::fmt::Display for RecommendationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EspFrequency => write!(f, "ESP_FREQUENCY"),
            Self::PcpSpeed => write!(f, "PCP_SPEED"),
            Self::RodPumpSpeed => write!(f, "ROD_PUMP_SPEED"),
            Self::RodPumpStroke => write!(f, "ROD_PUMP_STROKE"),
            Self::GasLiftAllocation => write!(f, "GAS_LIFT_ALLOCATION"),
        }
    }
}

/// The single constraint that bounded a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LimitingConstraint {
    MaxFrequency,
    MinFrequency,
    MotorLoad,
    MotorTemperature,
    MaxRpm,
    MinRpm,
    Torque,
    RodLoad,
    MaxSpm,
    MinSpm,
    RodStress,
    PeakLoad,
    MaxStroke,
}

impl std::fmt::Display for LimitingConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::MaxFrequency => "MAX_FREQUENCY",
            Self::MinFrequency => "MIN_FREQUENCY",
            Self::MotorLoad => "MOTOR_LOAD",
            Self::MotorTemperature => "MOTOR_TEMPERATURE",
            Self::MaxRpm => "MAX_RPM",
            Self::MinRpm => "MIN_RPM",
            Self::Torque => "TORQUE",
            Self::RodLoad => "ROD_LOAD",
            Self::MaxSpm => "MAX_SPM",
            Self::MinSpm => "MIN_SPM",
            Self::RodStress => "ROD_STRESS",
            Self::PeakLoad => "PEAK_LOAD",
            Self::MaxStroke => "MAX_STROKE",
        };
        write!(f, "{s}")
    }
}

/// ESP-specific measurements and projections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EspDetails {
    /// Motor load (% of nameplate)
    pub current_motor_load: f64,
    /// Motor winding temperature (°F)
    pub current_motor_temperature: f64,
    /// Pump intake pressure (psi)
    pub current_pip: f64,
    pub current_discharge_pressure: f64,
    pub current_power_kw: f64,
    pub expected_motor_load: f64,
    pub expected_motor_temperature: f64,
    /// Production per kW with temperature/load penalties
    pub current_efficiency: f64,
    pub bep_frequency: f64,
    /// |recommended − BEP| / BEP × 100
    pub distance_from_bep_percent: f64,
}

/// PCP-specific measurements, projections and wear
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcpDetails {
    /// Torque (% of rated)
    pub current_torque: f64,
    pub current_drive_load: f64,
    /// Rod string load (lbs)
    pub current_rod_load: f64,
    /// Fluid viscosity (cp)
    pub current_viscosity: f64,
    pub current_pump_efficiency: f64,
    pub expected_torque: f64,
    pub expected_drive_load: f64,
    pub expected_pump_efficiency: f64,
    /// Optimal efficiency point speed
    pub oep_rpm: f64,
    pub distance_from_oep_percent: f64,
    pub rod_wear_factor: f64,
    pub stator_wear_factor: f64,
    /// Either wear factor exceeds the configured threshold
    pub high_wear: bool,
}

/// Rod-pump measurements, projections and dynamometer-card reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RodPumpDetails {
    pub current_spm: f64,
    pub recommended_spm: f64,
    /// Surface stroke length (inches)
    pub current_stroke_length: f64,
    pub recommended_stroke_length: f64,
    /// Pump fillage (%)
    pub current_fillage: f64,
    pub expected_fillage: f64,
    pub current_peak_load: f64,
    pub expected_peak_load: f64,
    pub current_rod_stress: f64,
    pub expected_rod_stress: f64,
    /// Counterbalance (% of peak torque)
    pub current_counterbalance: f64,
    pub current_pump_efficiency: f64,
    pub expected_pump_efficiency: f64,
    /// bbl per stroke
    pub pump_displacement: f64,
    /// bbl/day at current SPM and 100% fillage
    pub theoretical_capacity: f64,
    pub volumetric_efficiency: f64,
    /// SPM that would bring fillage to target
    pub optimal_fillage_spm: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterbalance_recommendation: Option<String>,
    pub analysis: String,
}

/// Lift-specific part of an [`OptimizationResult`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "lift", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LiftDetails {
    Esp(EspDetails),
    Pcp(PcpDetails),
    RodPump(RodPumpDetails),
}

/// Bounded setpoint recommendation for one well
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub asset_id: String,
    pub lift_type: LiftType,
    pub recommendation_type: RecommendationType,
    pub current_value: f64,
    pub recommended_value: f64,
    pub change: f64,
    pub change_percent: f64,
    pub min_value: f64,
    pub max_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limiting_constraint: Option<LimitingConstraint>,
    pub current_production_bpd: f64,
    pub expected_production_bpd: f64,
    pub expected_production_increase: f64,
    pub expected_production_increase_percent: f64,
    pub expected_efficiency_improvement: f64,
    pub expected_power_kw: f64,
    pub is_significant: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_significant_reason: Option<String>,
    /// 0.5–1.0
    pub confidence: f64,
    pub details: LiftDetails,
}

/// Gas allocation for one well in a field optimization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellAllocation {
    pub asset_id: String,
    /// MSCF/day
    pub current_gas_rate: f64,
    pub recommended_gas_rate: f64,
    pub gas_rate_change: f64,
    pub current_production_bpd: f64,
    pub expected_production_bpd: f64,
    pub expected_production_increase: f64,
    /// BPD per MSCF/day
    pub marginal_oil_rate: f64,
    pub gas_oil_ratio: f64,
    /// 1 = highest marginal oil rate
    pub priority_rank: usize,
    pub at_minimum: bool,
    pub at_maximum: bool,
}

impl WellAllocation {
    /// |Δgas| / current × 100, or 100 when no gas is injected today.
    pub fn change_percent(&self) -> f64 {
        if self.current_gas_rate > 0.0 {
            self.gas_rate_change.abs() / self.current_gas_rate * 100.0
        } else {
            100.0
        }
    }
}

/// Field-wide gas-lift allocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasLiftAllocationResult {
    pub field_id: String,
    /// Budget actually distributed, after the field cap
    pub total_available_gas: f64,
    pub current_total_gas_rate: f64,
    pub optimized_total_gas_rate: f64,
    pub current_total_production: f64,
    pub expected_total_production: f64,
    pub expected_production_increase: f64,
    pub expected_production_increase_percent: f64,
    /// Change in field BPD per MSCF/day, percent
    pub efficiency_improvement_percent: f64,
    pub confidence: f64,
    /// Ordered by priority rank
    pub allocations: Vec<WellAllocation>,
    pub timestamp: DateTime<Utc>,
}

/// Reasons an optimizer may return no result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizationSkipReason {
    /// Asset id not present in the store
    UnknownAsset,
    /// Measurements below the configured quality floor
    LowDataQuality,
    /// Field id not present in the store
    UnknownField,
    /// Field has no gas-lift wells
    NoGasLiftWells,
}

impl std::fmt::Display for OptimizationSkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownAsset => write!(f, "UnknownAsset"),
            Self::LowDataQuality => write!(f, "LowDataQuality"),
            Self::UnknownField => write!(f, "UnknownField"),
            Self::NoGasLiftWells => write!(f, "NoGasLiftWells"),
        }
    }
}
