//! Common test doubles for the research workflow tests

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chatbi_client::{AnalyzeData, AnalyzeOutcome, AskOutcome, DrillDownDimension, IndicatorCatalog};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use deep_research::analytics::AnalyticsBackend;
use deep_research::chart::{ChartOption, ChartRenderer};
use deep_research::llm::{ChatMessage, ChatModel};
use deep_research::session::SessionStore;

/// The two-row sample table used across the chart tests.
pub const SAMPLE_TABLE: &str = "| 产品 | 销量 |\n|---|---|\n| A | 1200 |\n| B | 850 |\n";

/// A chat model that replays a fixed script. Once the script is exhausted
/// the last entry repeats, so one entry covers any number of calls.
pub struct ScriptedModel {
    script: Mutex<Vec<String>>,
    cursor: AtomicUsize,
    pub calls: AtomicUsize,
}

impl ScriptedModel {
    pub fn new(script: &[&str]) -> Self {
        Self {
            script: Mutex::new(script.iter().map(|s| s.to_string()).collect()),
            cursor: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// A model whose every reply is prose no extractor can parse.
    pub fn never_json() -> Self {
        Self::new(&["这是一段没有任何结构化内容的回答。"])
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock().unwrap();
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        script
            .get(index.min(script.len().saturating_sub(1)))
            .cloned()
            .ok_or_else(|| anyhow!("scripted model has no responses"))
    }
}

/// Analytics backend returning canned successes and counting queries.
#[derive(Default)]
pub struct MockAnalytics {
    pub ask_calls: AtomicUsize,
    pub analyze_calls: AtomicUsize,
}

impl MockAnalytics {
    pub fn query_count(&self) -> usize {
        self.ask_calls.load(Ordering::SeqCst) + self.analyze_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalyticsBackend for MockAnalytics {
    async fn ask(&self, query: &str) -> AskOutcome {
        self.ask_calls.fetch_add(1, Ordering::SeqCst);
        AskOutcome::Success {
            query: query.to_string(),
            rows: vec![json!({ "产品": "A", "销量": 1200 })],
            fetched_at: chrono::Utc::now(),
        }
    }

    async fn analyze(&self, query: &str) -> AnalyzeOutcome {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        AnalyzeOutcome::Success {
            query: query.to_string(),
            data: AnalyzeData {
                total: json!(2050),
                drilldown: vec![DrillDownDimension {
                    dimension: json!({ "name": "渠道" }),
                    positive: vec![json!({ "渠道": "线上", "delta": 300 })],
                    negative: vec![json!({ "渠道": "线下", "delta": -120 })],
                    narrative_draft: String::new(),
                }],
                impact_factor_properties: serde_json::Value::Null,
            },
            fetched_at: chrono::Utc::now(),
        }
    }

    async fn indicators(&self) -> Result<IndicatorCatalog> {
        Ok(json!({
            "销售": { "indicators": ["销量", "销售额"], "dimensions": ["产品", "渠道"] }
        }))
    }
}

/// Renderer returning fixed bytes and remembering the last specification
/// it was asked to draw.
pub struct MockRenderer {
    bytes: Vec<u8>,
    pub last_option: Mutex<Option<ChartOption>>,
    pub calls: AtomicUsize,
}

impl MockRenderer {
    /// A renderer that always yields a structurally valid PNG.
    pub fn valid() -> Self {
        Self::with_bytes(valid_png_bytes())
    }

    /// A renderer yielding bytes below the blank-render size threshold.
    pub fn blank() -> Self {
        Self::with_bytes(valid_png_bytes()[..64].to_vec())
    }

    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            last_option: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ChartRenderer for MockRenderer {
    async fn render(&self, option: &ChartOption, _width: u32, _height: u32) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_option.lock().unwrap() = Some(option.clone());
        Ok(self.bytes.clone())
    }
}

/// Renderer that fails every call.
pub struct FailingRenderer;

#[async_trait]
impl ChartRenderer for FailingRenderer {
    async fn render(&self, _option: &ChartOption, _width: u32, _height: u32) -> Result<Vec<u8>> {
        Err(anyhow!("export service unavailable"))
    }
}

/// PNG-signature bytes padded past the blank-render size threshold.
pub fn valid_png_bytes() -> Vec<u8> {
    let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.resize(4096, 0);
    bytes
}

/// A fresh session store rooted in a temp directory, session not begun.
pub fn temp_store() -> (tempfile::TempDir, SessionStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    (dir, store)
}

/// A fresh session store with an active session.
pub fn temp_session() -> (tempfile::TempDir, SessionStore) {
    let (dir, mut store) = temp_store();
    store.begin_session();
    (dir, store)
}
