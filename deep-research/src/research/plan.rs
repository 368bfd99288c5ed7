//! Planning stage: turn the user's question into a structured plan, or
//! surface a clarification request.

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info};

use crate::analytics::AnalyticsBackend;
use crate::extract::{extract, Extraction};
use crate::llm::{ChatMessage, ChatModel};
use crate::prompts;
use crate::research::types::{ResearchPlan, ResearchState, Stage};

/// How the planning stage resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanningOutcome {
    /// A non-empty plan was stored on the state.
    Planned,
    /// The model asked the user a question instead; the run halts here.
    Clarification,
    /// A structurally valid plan with zero steps; nothing to analyze.
    EmptyPlan,
}

/// Run the planning stage. Fetches the indicator catalog once to ground the
/// planner prompt, then extracts a plan or a clarification from the model
/// output. Anything else is fatal: no plan exists yet, so there is nothing
/// to salvage.
pub async fn run_planning(
    model: &dyn ChatModel,
    analytics: &dyn AnalyticsBackend,
    state: &mut ResearchState,
) -> Result<PlanningOutcome> {
    info!(question = %state.original_question, "planning research");

    let catalog = analytics
        .indicators()
        .await
        .context("failed to fetch the indicator catalog")?;
    let catalog_json = serde_json::to_string(&catalog)?;
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();

    let messages = [
        ChatMessage::system(prompts::planner_system_prompt(&catalog_json, &today)),
        ChatMessage::user(state.original_question.clone()),
    ];
    let response = model.complete(&messages).await.context("planner call failed")?;

    match extract(&response) {
        Extraction::Object(value) => {
            let plan: ResearchPlan = serde_json::from_value(value)
                .context("planner output parsed but does not match the plan shape")?;
            if plan.is_empty() {
                info!("planner returned an empty plan; nothing to analyze");
                state.stage = Stage::Done;
                return Ok(PlanningOutcome::EmptyPlan);
            }

            let acknowledgement = format!(
                "理解您的研究需求，开始对{}进行深度研究。",
                plan.all_questions().join("、")
            );
            state.plan = plan;
            state.push_assistant_message(acknowledgement);
            state.stage = Stage::Analyzing;
            Ok(PlanningOutcome::Planned)
        }
        Extraction::Clarification(question) => {
            info!("planner asked for clarification");
            state.needs_clarification = true;
            state.clarification_prompts.push(question.clone());
            state.push_assistant_message(question);
            state.stage = Stage::ClarificationNeeded;
            Ok(PlanningOutcome::Clarification)
        }
        Extraction::Failure { raw } => {
            debug!(raw = %raw, "planner output not extractable");
            Err(anyhow!(
                "planner produced neither a plan nor a clarification: {}",
                raw
            ))
        }
    }
}
