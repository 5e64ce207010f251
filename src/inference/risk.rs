//! Risk tiers and the ROI heuristic derived from a success probability.

use serde::{Deserialize, Serialize};

/// Probability at or above which a movie is low risk.
pub const LOW_RISK_THRESHOLD: f64 = 0.70;
/// Probability at or above which a movie is medium risk.
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn from_probability(p: f64) -> Self {
        if p >= LOW_RISK_THRESHOLD {
            RiskTier::Low
        } else if p >= MEDIUM_RISK_THRESHOLD {
            RiskTier::Medium
        } else {
            RiskTier::High
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskTier::Low => "LOW",
            RiskTier::Medium => "MEDIUM",
            RiskTier::High => "HIGH",
        }
    }

    /// Advisory text shown next to the tier.
    pub fn description(self) -> &'static str {
        match self {
            RiskTier::Low => "Low risk: strong success potential",
            RiskTier::Medium => "Medium risk: average success potential",
            RiskTier::High => "High risk: significant chance of failure",
        }
    }
}

/// Heuristic ROI multiple for a probability; not a model output.
///
/// Zero when the budget is unknown or non-positive.
pub fn estimate_roi(p: f64, budget: f64) -> f64 {
    if budget <= 0.0 {
        return 0.0;
    }
    let roi = match RiskTier::from_probability(p) {
        RiskTier::Low => 2.0 + (p - LOW_RISK_THRESHOLD) * 10.0,
        RiskTier::Medium => 1.0 + (p - MEDIUM_RISK_THRESHOLD) * 5.0,
        RiskTier::High => 0.3 + p * 1.4,
    };
    round_to(roi, 2)
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
