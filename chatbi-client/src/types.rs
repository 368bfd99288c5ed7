//! Data structures for ChatBI query results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One contributor record inside a drill-down list - flexible JSON structure,
/// the backend decides the fields per dimension.
pub type Contributor = serde_json::Value;

/// The full indicator/dimension catalog - flexible JSON structure keyed by
/// schema name, each entry listing its indicators and dimensions.
pub type IndicatorCatalog = serde_json::Value;

/// Caps applied when ingesting backend responses. The pipeline never holds
/// unbounded per-dimension detail.
pub const MAX_FLAT_ROWS: usize = 10;
pub const MAX_DRILLDOWN_DIMENSIONS: usize = 3;
pub const MAX_CONTRIBUTORS: usize = 10;

/// Outcome of a flat lookup query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AskOutcome {
    Success {
        query: String,
        /// Result records, capped to [`MAX_FLAT_ROWS`].
        rows: Vec<serde_json::Value>,
        fetched_at: DateTime<Utc>,
    },
    Failure {
        query: String,
        error: String,
        fetched_at: DateTime<Utc>,
    },
}

impl AskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AskOutcome::Success { .. })
    }

    pub fn query(&self) -> &str {
        match self {
            AskOutcome::Success { query, .. } | AskOutcome::Failure { query, .. } => query,
        }
    }
}

/// One attribution dimension from a drill-down response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrillDownDimension {
    /// Opaque dimension descriptor as returned by the backend; usually an
    /// object carrying at least a `name` field.
    pub dimension: serde_json::Value,
    /// Contributors pushing the metric up, capped to [`MAX_CONTRIBUTORS`].
    pub positive: Vec<Contributor>,
    /// Contributors pushing the metric down, capped to [`MAX_CONTRIBUTORS`].
    pub negative: Vec<Contributor>,
    /// Narrative written by the insight model after analysis. Empty until
    /// then; written exactly once per run.
    #[serde(default)]
    pub narrative_draft: String,
}

impl DrillDownDimension {
    /// Human-readable dimension name, falling back to the raw descriptor.
    pub fn name(&self) -> String {
        self.dimension
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| self.dimension.to_string())
    }
}

/// Payload of a successful drill-down attribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeData {
    /// Total metric value the drill-down decomposes.
    pub total: serde_json::Value,
    /// Per-dimension breakdowns, capped to [`MAX_DRILLDOWN_DIMENSIONS`].
    pub drilldown: Vec<DrillDownDimension>,
    /// Indicators the backend flagged as impact factors.
    #[serde(default)]
    pub impact_factor_properties: serde_json::Value,
}

/// Outcome of a drill-down attribution query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalyzeOutcome {
    Success {
        query: String,
        data: AnalyzeData,
        fetched_at: DateTime<Utc>,
    },
    Failure {
        query: String,
        error: String,
        fetched_at: DateTime<Utc>,
    },
}

impl AnalyzeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AnalyzeOutcome::Success { .. })
    }

    pub fn query(&self) -> &str {
        match self {
            AnalyzeOutcome::Success { query, .. } | AnalyzeOutcome::Failure { query, .. } => query,
        }
    }
}
