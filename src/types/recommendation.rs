//! Operator-facing recommendation and its approval lifecycle

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::optimization::{LiftType, RecommendationType};
use crate::error::CalcError;

/// Approval state of a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationStatus {
    Pending,
    Approved,
    Rejected,
    Executed,
    Failed,
    Cancelled,
    Expired,
}

impl RecommendationStatus {
    /// Whether the recommendation has left the review flow.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Rejected | Self::Executed | Self::Failed | Self::Cancelled | Self::Expired
        )
    }
}

impl std::fmt::Display for RecommendationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Executed => "EXECUTED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
            Self::Expired => "EXPIRED",
        };
        write!(f, "{s}")
    }
}

/// A significant optimization result packaged for operator review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub asset_id: String,
    pub recommendation_type: RecommendationType,
    pub lift_type: LiftType,
    pub current_value: f64,
    pub recommended_value: f64,
    pub unit: String,
    pub title: String,
    pub description: String,
    /// 1 (highest) to 4
    pub priority: u8,
    pub confidence: f64,
    pub expected_production_increase: f64,
    pub expected_production_increase_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_efficiency_improvement: Option<f64>,
    pub status: RecommendationStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Operator note or failure reason from the last transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,
}

impl Recommendation {
    /// Expiry is `created_at + expiry_hours`.
    pub fn expiry_from(created_at: DateTime<Utc>, expiry_hours: u32) -> DateTime<Utc> {
        created_at + Duration::hours(i64::from(expiry_hours))
    }

    fn transition(
        &mut self,
        action: &str,
        allowed: bool,
        next: RecommendationStatus,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), CalcError> {
        if !allowed {
            return Err(CalcError::InvalidTransition {
                action: action.to_string(),
                status: self.status.to_string(),
            });
        }
        self.status = next;
        self.status_reason = reason;
        self.updated_at = now;
        Ok(())
    }

    /// Pending → Approved
    pub fn approve(&mut self, now: DateTime<Utc>) -> Result<(), CalcError> {
        let allowed = self.status == RecommendationStatus::Pending && now <= self.expires_at;
        self.transition("approve", allowed, RecommendationStatus::Approved, None, now)
    }

    /// Pending → Rejected
    pub fn reject(&mut self, reason: &str, now: DateTime<Utc>) -> Result<(), CalcError> {
        let allowed = self.status == RecommendationStatus::Pending;
        self.transition(
            "reject",
            allowed,
            RecommendationStatus::Rejected,
            Some(reason.to_string()),
            now,
        )
    }

    /// Approved → Executed
    pub fn execute(&mut self, now: DateTime<Utc>) -> Result<(), CalcError> {
        let allowed = self.status == RecommendationStatus::Approved;
        self.transition("execute", allowed, RecommendationStatus::Executed, None, now)
    }

    /// Any → Failed
    pub fn fail(&mut self, reason: &str, now: DateTime<Utc>) {
        self.status = RecommendationStatus::Failed;
        self.status_reason = Some(reason.to_string());
        self.updated_at = now;
    }

    /// Anything but Executed → Cancelled
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), CalcError> {
        let allowed = self.status != RecommendationStatus::Executed;
        self.transition("cancel", allowed, RecommendationStatus::Cancelled, None, now)
    }

    /// Pending → Expired once `now` is past `expires_at`. Returns whether it expired.
    pub fn expire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == RecommendationStatus::Pending && now > self.expires_at {
            self.status = RecommendationStatus::Expired;
            self.updated_at = now;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_recommendation(now: DateTime<Utc>) -> Recommendation {
        Recommendation {
            asset_id: "well-1".to_string(),
            recommendation_type: RecommendationType::EspFrequency,
            lift_type: LiftType::Esp,
            current_value: 50.0,
            recommended_value: 52.5,
            unit: "Hz".to_string(),
            title: "Increase ESP frequency from 50.0 to 52.5 Hz".to_string(),
            description: String::new(),
            priority: 2,
            confidence: 0.85,
            expected_production_increase: 25.0,
            expected_production_increase_percent: 5.0,
            expected_efficiency_improvement: None,
            status: RecommendationStatus::Pending,
            created_at: now,
            expires_at: Recommendation::expiry_from(now, 24),
            updated_at: now,
            status_reason: None,
        }
    }

    #[test]
    fn test_approve_then_execute() {
        let now = Utc::now();
        let mut rec = make_recommendation(now);
        rec.approve(now).unwrap();
        assert_eq!(rec.status, RecommendationStatus::Approved);
        rec.execute(now).unwrap();
        assert_eq!(rec.status, RecommendationStatus::Executed);
        assert!(rec.cancel(now).is_err());
    }

    #[test]
    fn test_execute_requires_approval() {
        let now = Utc::now();
        let mut rec = make_recommendation(now);
        let err = rec.execute(now).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot execute a recommendation in status PENDING"
        );
    }

    #[test]
    fn test_reject_records_reason() {
        let now = Utc::now();
        let mut rec = make_recommendation(now);
        rec.reject("pump scheduled for workover", now).unwrap();
        assert_eq!(rec.status, RecommendationStatus::Rejected);
        assert_eq!(rec.status_reason.as_deref(), Some("pump scheduled for workover"));
        assert!(rec.approve(now).is_err());
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let mut rec = make_recommendation(now);
        assert!(!rec.expire_if_due(now + Duration::hours(23)));
        assert!(rec.expire_if_due(now + Duration::hours(25)));
        assert_eq!(rec.status, RecommendationStatus::Expired);
        assert!(rec.status.is_terminal());
    }

    #[test]
    fn test_cannot_approve_after_expiry_time() {
        let now = Utc::now();
        let mut rec = make_recommendation(now);
        assert!(rec.approve(now + Duration::hours(30)).is_err());
    }

    #[test]
    fn test_fail_from_any_status() {
        let now = Utc::now();
        let mut rec = make_recommendation(now);
        rec.approve(now).unwrap();
        rec.execute(now).unwrap();
        rec.fail("controller rejected setpoint", now);
        assert_eq!(rec.status, RecommendationStatus::Failed);
    }
}
