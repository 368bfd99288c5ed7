//! Analyzing stage: execute the plan against the analytics backend and
//! draft a narrative for each drill-down dimension.

use anyhow::Result;
use chatbi_client::AnalyzeOutcome;
use tracing::{info, warn};

use crate::analytics::AnalyticsBackend;
use crate::llm::{ChatMessage, ChatModel};
use crate::prompts;
use crate::research::types::{ResearchState, Stage, StepAnalysis};

/// Run every planned step in plan order.
///
/// Within a step, general questions resolve strictly before the yoy/mom
/// questions begin; the sequential shape bounds load on the backend. A
/// failed question or a failed narrative never aborts the step or the run -
/// the failure is recorded in the outcome and analysis continues.
pub async fn run_analysis(
    insight_model: &dyn ChatModel,
    analytics: &dyn AnalyticsBackend,
    state: &mut ResearchState,
) -> Result<()> {
    let steps: Vec<(String, _)> = state
        .plan
        .steps
        .iter()
        .map(|(name, step)| (name.clone(), step.clone()))
        .collect();

    for (step_name, step) in steps {
        info!(step = %step_name, "analyzing step");

        let mut general_answers = Vec::with_capacity(step.general_questions.len());
        for question in &step.general_questions {
            state.push_assistant_message(format!("正在取数：{}", question));
            general_answers.push(analytics.ask(question).await);
        }

        let mut yoy_mom_answers = Vec::with_capacity(step.yoy_mom_questions.len());
        for question in &step.yoy_mom_questions {
            state.push_assistant_message(format!("正在归因分析：{}", question));
            let mut outcome = analytics.analyze(question).await;
            if let AnalyzeOutcome::Success { query, data, .. } = &mut outcome {
                let total = data.drilldown.len();
                for (index, dimension) in data.drilldown.iter_mut().enumerate() {
                    let progress = format!(
                        "正在分析维度 {} 对 {} 的影响 ({}/{})",
                        dimension.name(),
                        query,
                        index + 1,
                        total
                    );
                    state.push_assistant_message(progress);

                    match draft_dimension_narrative(insight_model, query, dimension).await {
                        Ok(draft) => dimension.narrative_draft = draft,
                        Err(e) => {
                            // Non-fatal: the dimension keeps an empty draft.
                            warn!(
                                dimension = %dimension.name(),
                                error = %e,
                                "dimension narrative failed"
                            );
                        }
                    }
                }
            }
            yoy_mom_answers.push(outcome);
        }

        // Per-step population is atomic: the entry appears fully answered.
        state.analysis_results.insert(
            step_name,
            StepAnalysis {
                reason: step.reason,
                general_answers,
                yoy_mom_answers,
            },
        );
    }

    state.stage = Stage::Reporting;
    Ok(())
}

async fn draft_dimension_narrative(
    model: &dyn ChatModel,
    query: &str,
    dimension: &chatbi_client::DrillDownDimension,
) -> Result<String> {
    let positive = join_contributors(&dimension.positive);
    let negative = join_contributors(&dimension.negative);
    let messages = [
        ChatMessage::system(prompts::DIMENSION_INSIGHT_PROMPT),
        ChatMessage::user(prompts::dimension_insight_user_prompt(
            query,
            &dimension.name(),
            &positive,
            &negative,
        )),
    ];
    model.complete(&messages).await
}

fn join_contributors(contributors: &[serde_json::Value]) -> String {
    contributors
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join("、")
}
