//! Coarse risk classification from fundamentals

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Analysis text used when no fundamentals are available
pub const DEFAULT_ANALYSIS: &str = "Data not available, default risk values applied.";

/// Beta assumed when the payload does not carry one
pub const DEFAULT_BETA: f64 = 1.0;

/// Qualitative risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk levels per category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskRecord {
    pub market_risk: RiskLevel,
    pub operational_risk: RiskLevel,
    pub regulatory_risk: RiskLevel,
    pub esg_risk: RiskLevel,
}

impl RiskRecord {
    /// Record with the given market risk and the fixed levels for the rest
    pub fn with_market_risk(market_risk: RiskLevel) -> Self {
        Self {
            market_risk,
            ..Self::default()
        }
    }
}

impl Default for RiskRecord {
    /// The conservative record used when no data is available
    fn default() -> Self {
        Self {
            market_risk: RiskLevel::High,
            operational_risk: RiskLevel::Medium,
            regulatory_risk: RiskLevel::Low,
            esg_risk: RiskLevel::Medium,
        }
    }
}

/// Risk record plus the rationale behind it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risks: RiskRecord,
    pub analysis: String,
}

impl RiskAssessment {
    /// The assessment used when fundamentals could not be fetched
    pub fn unavailable() -> Self {
        Self {
            risks: RiskRecord::default(),
            analysis: DEFAULT_ANALYSIS.to_string(),
        }
    }

    /// Market risk is `High` above a beta of 1, `Low` otherwise
    pub fn from_beta(beta: f64) -> Self {
        let market_risk = if beta > 1.0 {
            RiskLevel::High
        } else {
            RiskLevel::Low
        };

        Self {
            risks: RiskRecord::with_market_risk(market_risk),
            analysis: format!(
                "Market risk based on beta is {market_risk}. Additional analysis needed for other risks."
            ),
        }
    }

    /// Assess from a Finnhub `stock/metric` payload
    ///
    /// `None` and empty payloads mean the provider had nothing to offer.
    ///
    /// ```
    /// use serde_json::json;
    /// use stock_research::{RiskAssessment, RiskLevel};
    ///
    /// let payload = json!({ "metric": { "beta": 1.27 } });
    /// let assessment = RiskAssessment::from_metrics(Some(&payload));
    /// assert_eq!(assessment.risks.market_risk, RiskLevel::High);
    /// ```
    pub fn from_metrics(payload: Option<&Value>) -> Self {
        match payload {
            Some(payload) if !is_empty(payload) => Self::from_beta(beta(payload)),
            _ => Self::unavailable(),
        }
    }
}

/// `metric.beta`, or [`DEFAULT_BETA`] when missing, null or not a number
pub fn beta(payload: &Value) -> f64 {
    payload
        .get("metric")
        .and_then(|m| m.get("beta"))
        .and_then(Value::as_f64)
        .filter(|b| b.is_finite())
        .unwrap_or(DEFAULT_BETA)
}

fn is_empty(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
