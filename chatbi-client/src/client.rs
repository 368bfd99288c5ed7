//! HTTP client for the ChatBI backend.

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};
use tracing::warn;

use crate::error::Error;
use crate::types::{
    AnalyzeData, AnalyzeOutcome, AskOutcome, DrillDownDimension, IndicatorCatalog,
    MAX_CONTRIBUTORS, MAX_DRILLDOWN_DIMENSIONS, MAX_FLAT_ROWS,
};
use crate::Result;

/// Client for one ChatBI deployment.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ChatbiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ChatbiClient {
    /// Create a client for `base_url`, with an optional bearer token.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let base_url = base_url.into();
        if base_url.is_empty() || !base_url.starts_with("http") {
            return Err(Error::InvalidBaseUrl(base_url));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &self.token {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        headers
    }

    async fn post_json(&self, endpoint: &'static str, body: Value) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .http
            .post(&url)
            .headers(self.headers())
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::Status {
                endpoint,
                status: response.status(),
            });
        }
        Ok(response.json().await?)
    }

    /// Flat lookup: natural-language query to a bounded list of result rows.
    ///
    /// Transport failures and unanswerable questions both come back as the
    /// failure variant; this method never returns `Err`.
    pub async fn ask(&self, query: &str) -> AskOutcome {
        let body = json!({ "ask": query, "exec_logicform": true });
        match self.post_json("/api/v1/ask", body).await {
            Ok(response) => match response.get("result").and_then(Value::as_array) {
                Some(rows) if !rows.is_empty() => AskOutcome::Success {
                    query: query.to_string(),
                    rows: rows.iter().take(MAX_FLAT_ROWS).cloned().collect(),
                    fetched_at: Utc::now(),
                },
                _ => AskOutcome::Failure {
                    query: query.to_string(),
                    error: "backend did not understand the question".to_string(),
                    fetched_at: Utc::now(),
                },
            },
            Err(e) => {
                warn!(query, error = %e, "chatbi ask failed");
                AskOutcome::Failure {
                    query: query.to_string(),
                    error: e.to_string(),
                    fetched_at: Utc::now(),
                }
            }
        }
    }

    /// Drill-down attribution: two backend calls, first to resolve the
    /// question into a logicform, then to run the analyzer on it.
    ///
    /// Dimension and contributor lists are truncated at ingestion; an empty
    /// drill-down is reported as a failure outcome.
    pub async fn analyze(&self, query: &str) -> AnalyzeOutcome {
        match self.analyze_inner(query).await {
            Ok(data) => AnalyzeOutcome::Success {
                query: query.to_string(),
                data,
                fetched_at: Utc::now(),
            },
            Err(e) => {
                warn!(query, error = %e, "chatbi analyze failed");
                AnalyzeOutcome::Failure {
                    query: query.to_string(),
                    error: e.to_string(),
                    fetched_at: Utc::now(),
                }
            }
        }
    }

    async fn analyze_inner(&self, query: &str) -> Result<AnalyzeData> {
        let ask_response = self.post_json("/api/v1/ask", json!({ "ask": query })).await?;

        // The ask endpoint returns either one logicform or a list; the
        // analyzer takes exactly one.
        let logicform = match ask_response.get("logicform") {
            Some(Value::Array(forms)) => forms.first().cloned(),
            Some(other) => Some(other.clone()),
            None => None,
        }
        .ok_or_else(|| Error::UnexpectedResponse {
            endpoint: "/api/v1/ask",
            detail: "response carries no logicform".to_string(),
        })?;

        let analyze_response = self
            .post_json("/api/v1/analyzer/analyze2", json!({ "logicform": logicform }))
            .await?;

        let drilldown = analyze_response
            .get("drilldown")
            .and_then(Value::as_array)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| Error::UnexpectedResponse {
                endpoint: "/api/v1/analyzer/analyze2",
                detail: format!("{} has no dimension to drill down", query),
            })?;

        let drilldown = drilldown
            .iter()
            .take(MAX_DRILLDOWN_DIMENSIONS)
            .map(normalize_dimension)
            .collect();

        Ok(AnalyzeData {
            total: analyze_response.get("total").cloned().unwrap_or(Value::Null),
            drilldown,
            impact_factor_properties: analyze_response
                .get("impactFactorProperties")
                .cloned()
                .unwrap_or(Value::Null),
        })
    }

    /// Fetch the full indicator/dimension catalog. Consumed once per
    /// planning run to ground the planner prompt.
    pub async fn indicators(&self) -> Result<IndicatorCatalog> {
        let endpoint = "/api/v1/llm/prompts/measurementAndDimension";
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self.http.get(&url).headers(self.headers()).send().await?;
        if !response.status().is_success() {
            return Err(Error::Status {
                endpoint,
                status: response.status(),
            });
        }
        let body: Value = response.json().await?;
        body.get("prompt")
            .cloned()
            .ok_or_else(|| Error::UnexpectedResponse {
                endpoint,
                detail: "response carries no prompt field".to_string(),
            })
    }
}

fn normalize_dimension(raw: &Value) -> DrillDownDimension {
    let contributors = |key: &str| -> Vec<Value> {
        raw.get(key)
            .and_then(Value::as_array)
            .map(|list| list.iter().take(MAX_CONTRIBUTORS).cloned().collect())
            .unwrap_or_default()
    };
    DrillDownDimension {
        dimension: raw.get("dimension").cloned().unwrap_or(Value::Null),
        positive: contributors("positive"),
        negative: contributors("negative"),
        narrative_draft: String::new(),
    }
}
