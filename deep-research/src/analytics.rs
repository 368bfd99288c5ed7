//! Analytics backend capability.
//!
//! The workflow only needs three operations from the analytics side; the
//! trait keeps the orchestrator testable against mock backends. The real
//! implementation is [`chatbi_client::ChatbiClient`].

use anyhow::Result;
use async_trait::async_trait;
use chatbi_client::{AnalyzeOutcome, AskOutcome, ChatbiClient, IndicatorCatalog};

/// Analytics query capability: flat lookups, drill-down attribution, and
/// the indicator catalog. Query failures are tagged outcomes; only the
/// catalog fetch can fail hard, because planning cannot proceed without it.
#[async_trait]
pub trait AnalyticsBackend: Send + Sync {
    async fn ask(&self, query: &str) -> AskOutcome;
    async fn analyze(&self, query: &str) -> AnalyzeOutcome;
    async fn indicators(&self) -> Result<IndicatorCatalog>;
}

#[async_trait]
impl AnalyticsBackend for ChatbiClient {
    async fn ask(&self, query: &str) -> AskOutcome {
        ChatbiClient::ask(self, query).await
    }

    async fn analyze(&self, query: &str) -> AnalyzeOutcome {
        ChatbiClient::analyze(self, query).await
    }

    async fn indicators(&self) -> Result<IndicatorCatalog> {
        Ok(ChatbiClient::indicators(self).await?)
    }
}
