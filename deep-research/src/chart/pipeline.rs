//! Bounded-retry table-to-chart conversion.

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::extract::extract_json_object;
use crate::llm::{ChatMessage, ChatModel};
use crate::prompts;
use crate::session::SessionStore;

use super::fallback::default_chart_option;
use super::render::{validate_chart_file, ChartRenderer};
use super::tables::scan_section_tables;
use super::ChartOption;

/// Default number of synthesis attempts per table.
pub const DEFAULT_ATTEMPT_BUDGET: u32 = 3;

/// A chart written into the session folder and validated.
#[derive(Debug, Clone)]
pub struct RenderedChart {
    /// Bare file name, usable as a relative markdown image reference from
    /// the report in the same folder.
    pub file_name: String,
    pub path: PathBuf,
    /// Whether the deterministic fallback specification was used.
    pub used_fallback: bool,
    pub attempts: u32,
}

/// Converts one markdown table into a validated chart artifact, retrying
/// with escalating prompt strictness and falling back to a deterministic
/// specification when the model never yields parseable output.
pub struct ChartPipeline {
    model: Arc<dyn ChatModel>,
    renderer: Arc<dyn ChartRenderer>,
    attempt_budget: u32,
    width: u32,
    height: u32,
    backoff_unit: Duration,
}

impl ChartPipeline {
    pub fn new(model: Arc<dyn ChatModel>, renderer: Arc<dyn ChartRenderer>) -> Self {
        Self {
            model,
            renderer,
            attempt_budget: DEFAULT_ATTEMPT_BUDGET,
            width: 800,
            height: 500,
            backoff_unit: Duration::from_millis(1000),
        }
    }

    pub fn with_attempt_budget(mut self, attempt_budget: u32) -> Self {
        self.attempt_budget = attempt_budget.max(1);
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Backoff unit between attempts; attempt `n` waits `n` units.
    pub fn with_backoff_unit(mut self, backoff_unit: Duration) -> Self {
        self.backoff_unit = backoff_unit;
        self
    }

    /// Convert `table` into a validated chart file named `<file_stem>.png`
    /// in the session folder.
    pub async fn convert_table(
        &self,
        table: &str,
        file_stem: &str,
        session: &SessionStore,
    ) -> Result<RenderedChart> {
        let mut last_error: Option<anyhow::Error> = None;

        for attempt in 1..=self.attempt_budget {
            match self.attempt_once(table, file_stem, session, attempt).await {
                Ok(chart) => return Ok(chart),
                Err(e) => {
                    warn!(attempt, error = %e, "chart conversion attempt failed");
                    last_error = Some(e);
                    if attempt < self.attempt_budget {
                        tokio::time::sleep(self.backoff_unit * attempt).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("chart conversion produced no attempts")))
    }

    async fn attempt_once(
        &self,
        table: &str,
        file_stem: &str,
        session: &SessionStore,
        attempt: u32,
    ) -> Result<RenderedChart> {
        let (option, used_fallback) = self.synthesize_option(table, attempt).await?;

        let bytes = self
            .renderer
            .render(&option, self.width, self.height)
            .await
            .context("chart render failed")?;

        let file_name = format!("{}.png", file_stem);
        let path = session.resolve(&file_name)?;
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("failed to write chart file {}", path.display()))?;

        validate_chart_file(&path).await?;

        Ok(RenderedChart {
            file_name,
            path,
            used_fallback,
            attempts: attempt,
        })
    }

    /// One synthesis call with the escalation appropriate to `attempt`. On
    /// the final attempt an unparseable response falls back to the
    /// deterministic builder instead of failing.
    async fn synthesize_option(&self, table: &str, attempt: u32) -> Result<(ChartOption, bool)> {
        let mut prompt = prompts::chart_option_prompt(table);
        if attempt > 1 {
            prompt.push_str(prompts::CHART_STRICT_JSON_SUFFIX);
        }
        if attempt == self.attempt_budget {
            prompt.push_str(prompts::CHART_SIMPLEST_SUFFIX);
        }

        let messages = [
            ChatMessage::system(prompts::CHART_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ];
        let response = self.model.complete(&messages).await?;

        if let Some(option) = extract_json_object(&response) {
            return Ok((option, false));
        }

        debug!(response = %response, "chart synthesis output not parseable");
        if attempt == self.attempt_budget {
            let option = default_chart_option(table)
                .ok_or_else(|| anyhow!("table has no parseable rows for a fallback chart"))?;
            return Ok((option, true));
        }
        Err(anyhow!(
            "no chart specification extracted on attempt {}",
            attempt
        ))
    }
}

/// Convert every table in the report section titled `heading` and insert an
/// image reference right after each converted table.
///
/// Per-table failures are logged and skipped; the table stays unmodified
/// and processing continues. Returns the updated report and the rendered
/// charts.
pub async fn augment_report_with_charts(
    report: &str,
    heading: &str,
    pipeline: &ChartPipeline,
    session: &SessionStore,
) -> (String, Vec<RenderedChart>) {
    let tables = scan_section_tables(report, heading);
    if tables.is_empty() {
        info!(heading, "no tables found for chart augmentation");
        return (report.to_string(), Vec::new());
    }
    info!(count = tables.len(), "converting report tables to charts");

    let mut updated = report.to_string();
    let mut charts = Vec::new();

    // Insert back-to-front so earlier byte spans stay valid.
    for (index, table) in tables.iter().enumerate().rev() {
        let file_stem = format!("research_plan_chart_{}", index + 1);
        match pipeline.convert_table(&table.text, &file_stem, session).await {
            Ok(chart) => {
                let image_ref = format!("\n\n![研究计划图表]({})\n\n", chart.file_name);
                updated.insert_str(table.end, &image_ref);
                charts.push(chart);
            }
            Err(e) => {
                warn!(table = index + 1, error = %e, "table left without a chart");
            }
        }
    }

    charts.reverse();
    (updated, charts)
}
