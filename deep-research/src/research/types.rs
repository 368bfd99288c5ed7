//! Data structures for the research workflow.

use chatbi_client::{AnalyzeOutcome, AskOutcome};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::llm::ChatMessage;

/// One planned investigative step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSpec {
    /// Rationale for running this step.
    pub reason: String,
    /// Questions answered by flat lookups.
    #[serde(default)]
    pub general_questions: Vec<String>,
    /// Questions answered by drill-down attribution (year-over-year /
    /// month-over-month changes).
    #[serde(default)]
    pub yoy_mom_questions: Vec<String>,
}

/// The structured investigation plan. Steps keep the order the planner
/// emitted them in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchPlan {
    #[serde(default)]
    pub steps: IndexMap<String, StepSpec>,
}

impl ResearchPlan {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Every planned question, in plan order, for the acknowledgement turn.
    pub fn all_questions(&self) -> Vec<&str> {
        self.steps
            .values()
            .flat_map(|step| {
                step.general_questions
                    .iter()
                    .chain(step.yoy_mom_questions.iter())
            })
            .map(String::as_str)
            .collect()
    }
}

/// A step after execution: the same rationale, each question paired with
/// its structured result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepAnalysis {
    pub reason: String,
    pub general_answers: Vec<AskOutcome>,
    pub yoy_mom_answers: Vec<AnalyzeOutcome>,
}

/// Stages of one research run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Planning,
    AwaitingHumanReview,
    Analyzing,
    Reporting,
    Augmenting,
    Done,
    /// Terminal; reachable only from Planning.
    ClarificationNeeded,
}

/// Mutable accumulator threaded through every stage.
///
/// Invariant: once `needs_clarification` is set, no stage of the same run
/// populates `analysis_results` or `final_report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchState {
    pub original_question: String,
    pub plan: ResearchPlan,
    pub needs_clarification: bool,
    pub clarification_prompts: Vec<String>,
    /// Populated steps, keyed like the plan.
    pub analysis_results: IndexMap<String, StepAnalysis>,
    pub final_report: String,
    /// Append-only conversation log for audit and debugging.
    pub messages: Vec<ChatMessage>,
    pub stage: Stage,
}

impl ResearchState {
    pub fn new(question: impl Into<String>) -> Self {
        let question = question.into();
        Self {
            original_question: question.clone(),
            plan: ResearchPlan::default(),
            needs_clarification: false,
            clarification_prompts: Vec::new(),
            analysis_results: IndexMap::new(),
            final_report: String::new(),
            messages: vec![ChatMessage::user(question)],
            stage: Stage::Planning,
        }
    }

    pub fn push_assistant_message(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
    }
}
