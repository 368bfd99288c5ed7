//! Reporting stage: one writer call turns the populated plan into the
//! final markdown report.

use anyhow::{Context, Result};
use serde_json::json;
use tracing::info;

use crate::llm::{ChatMessage, ChatModel};
use crate::prompts;
use crate::research::types::{ResearchState, Stage};

/// Generate the final report from the accumulated analysis.
///
/// The writer output is taken verbatim - no extraction, no retries. A
/// malformed report is still a report; the augmentation stage simply finds
/// no tables to chart.
pub async fn run_reporting(writer_model: &dyn ChatModel, state: &mut ResearchState) -> Result<()> {
    let material = json!({
        "original_question": state.original_question,
        "plan": state.plan,
        "analysis_results": state.analysis_results,
    });
    let material_json =
        serde_json::to_string_pretty(&material).context("failed to serialize report material")?;

    let messages = [
        ChatMessage::system(prompts::WRITER_PROMPT),
        ChatMessage::user(material_json),
    ];
    let report = writer_model
        .complete(&messages)
        .await
        .context("report writer call failed")?;

    info!(chars = report.chars().count(), "report generated");
    state.final_report = report;
    state.push_assistant_message("报告已生成");
    state.stage = Stage::Augmenting;
    Ok(())
}
