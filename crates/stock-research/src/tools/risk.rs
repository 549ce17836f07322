//! Tool for the coarse risk assessment

use crate::api::MetricsSource;
use crate::risk::RiskAssessment;
use agent_core::Result as AgentResult;
use agent_llm::tools::schema;
use agent_tools::{Tool, required_str};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

/// `risk_assessment`: market, operational, regulatory and ESG risk levels
///
/// Never fails on provider trouble; the default record is returned instead.
pub struct RiskAssessmentTool {
    metrics: Option<Arc<dyn MetricsSource>>,
}

impl RiskAssessmentTool {
    /// Create a tool backed by a fundamentals source
    pub fn new(metrics: Arc<dyn MetricsSource>) -> Self {
        Self {
            metrics: Some(metrics),
        }
    }

    /// Create a tool that always answers with the default record
    pub fn unavailable() -> Self {
        Self { metrics: None }
    }

    /// Assess one ticker
    pub async fn assess(&self, ticker: &str) -> RiskAssessment {
        let Some(metrics) = &self.metrics else {
            warn!(ticker, "No fundamentals source configured, using default risks");
            return RiskAssessment::unavailable();
        };

        let payload = match metrics.basic_metrics(ticker).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(ticker, error = %e, "Error fetching fundamentals");
                None
            }
        };

        let assessment = RiskAssessment::from_metrics(payload.as_ref());
        info!(ticker, market_risk = %assessment.risks.market_risk, "Risk assessment ready");
        assessment
    }
}

#[async_trait]
impl Tool for RiskAssessmentTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        let ticker = required_str(self.name(), &params, "ticker")?
            .trim()
            .to_uppercase();

        let assessment = self.assess(&ticker).await;
        serde_json::to_value(assessment)
            .map_err(|e| agent_core::Error::ProcessingFailed(e.to_string()))
    }

    fn name(&self) -> &str {
        "risk_assessment"
    }

    fn description(&self) -> &str {
        "Evaluates various risks associated with investing in a specific company. Returns \
         market, operational, regulatory and ESG risk levels with a short analysis."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({ "ticker": schema::string("Stock ticker symbol (e.g., AAPL)") }),
            &["ticker"],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockMetricsSource;
    use crate::error::StockError;

    #[tokio::test]
    async fn test_beta_drives_market_risk() {
        let mut metrics = MockMetricsSource::new();
        metrics
            .expect_basic_metrics()
            .withf(|ticker| ticker == "TSLA")
            .times(1)
            .returning(|_| Ok(Some(json!({ "metric": { "beta": 2.3 } }))));

        let tool = RiskAssessmentTool::new(Arc::new(metrics));
        let out = tool.execute(json!({ "ticker": " tsla " })).await.unwrap();

        assert_eq!(out["risks"]["market_risk"], "High");
        assert_eq!(out["risks"]["operational_risk"], "Medium");
        assert_eq!(
            out["analysis"],
            "Market risk based on beta is High. Additional analysis needed for other risks."
        );
    }

    #[tokio::test]
    async fn test_provider_failure_uses_defaults() {
        let mut metrics = MockMetricsSource::new();
        metrics
            .expect_basic_metrics()
            .returning(|_| Err(StockError::ApiError("timeout".to_string())));

        let tool = RiskAssessmentTool::new(Arc::new(metrics));
        let out = tool.execute(json!({ "ticker": "JNJ" })).await.unwrap();

        assert_eq!(out["risks"]["market_risk"], "High");
        assert_eq!(
            out["analysis"],
            "Data not available, default risk values applied."
        );
    }

    #[tokio::test]
    async fn test_no_payload_uses_defaults() {
        let mut metrics = MockMetricsSource::new();
        metrics.expect_basic_metrics().returning(|_| Ok(None));

        let assessment = RiskAssessmentTool::new(Arc::new(metrics)).assess("PG").await;
        assert_eq!(assessment, RiskAssessment::unavailable());
    }

    #[tokio::test]
    async fn test_unconfigured_source() {
        let tool = RiskAssessmentTool::unavailable();
        let out = tool.execute(json!({ "ticker": "KO" })).await.unwrap();
        assert_eq!(out["analysis"], "Data not available, default risk values applied.");
    }

    #[tokio::test]
    async fn test_missing_ticker() {
        let err = RiskAssessmentTool::unavailable()
            .execute(json!({}))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Tool 'risk_assessment' failed: missing string argument 'ticker'"
        );
    }
}
