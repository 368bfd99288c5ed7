//! Stage orchestration for one research run.

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::analytics::AnalyticsBackend;
use crate::chart::{augment_report_with_charts, ChartPipeline};
use crate::llm::ChatModel;
use crate::research::analyze::run_analysis;
use crate::research::plan::{run_planning, PlanningOutcome};
use crate::research::report::run_reporting;
use crate::research::review::{PlanCheckpoint, ResumeDecision, ReviewOutcome};
use crate::research::types::{ResearchState, Stage};
use crate::session::SessionStore;

/// File name of the persisted report inside the session folder.
pub const REPORT_FILE_NAME: &str = "final_report.md";

/// Tunables that do not change between runs of the same workflow instance.
#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    /// Suspend after planning and wait for an external resume decision.
    pub review: bool,
    /// Report section whose tables get chart augmentation.
    pub section_heading: String,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            review: false,
            section_heading: "研究计划回顾".to_string(),
        }
    }
}

/// How a run (or a resumed run) ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// The planner asked the user a question; the run is over.
    ClarificationNeeded { state: ResearchState },
    /// The run is suspended at the review point. The caller persists the
    /// checkpoint and resumes later via [`ResearchWorkflow::resume`].
    AwaitingReview { checkpoint: PlanCheckpoint },
    /// The full pipeline ran; the augmented report is on disk.
    Completed {
        state: ResearchState,
        report_path: PathBuf,
    },
    /// A valid plan with zero steps; nothing was analyzed.
    EmptyPlan { state: ResearchState },
    /// A reviewer chose to ignore the plan.
    Aborted { state: ResearchState },
}

/// Drives a question through planning, optional review, analysis,
/// reporting and chart augmentation.
pub struct ResearchWorkflow {
    planner_model: Arc<dyn ChatModel>,
    insight_model: Arc<dyn ChatModel>,
    writer_model: Arc<dyn ChatModel>,
    analytics: Arc<dyn AnalyticsBackend>,
    chart_pipeline: ChartPipeline,
    options: WorkflowOptions,
}

impl ResearchWorkflow {
    pub fn new(
        planner_model: Arc<dyn ChatModel>,
        insight_model: Arc<dyn ChatModel>,
        writer_model: Arc<dyn ChatModel>,
        analytics: Arc<dyn AnalyticsBackend>,
        chart_pipeline: ChartPipeline,
        options: WorkflowOptions,
    ) -> Self {
        Self {
            planner_model,
            insight_model,
            writer_model,
            analytics,
            chart_pipeline,
            options,
        }
    }

    /// Start a fresh run for `question`. Allocates a new session namespace
    /// on `session`.
    pub async fn run(&self, question: &str, session: &mut SessionStore) -> Result<RunOutcome> {
        let namespace = session.begin_session().to_string();
        info!(%namespace, "starting research session");

        let mut state = ResearchState::new(question);
        match run_planning(self.planner_model.as_ref(), self.analytics.as_ref(), &mut state)
            .await?
        {
            PlanningOutcome::Clarification => Ok(RunOutcome::ClarificationNeeded { state }),
            PlanningOutcome::EmptyPlan => Ok(RunOutcome::EmptyPlan { state }),
            PlanningOutcome::Planned => {
                if self.options.review {
                    let checkpoint = PlanCheckpoint::new(state, namespace);
                    return Ok(RunOutcome::AwaitingReview { checkpoint });
                }
                self.continue_run(state, session).await
            }
        }
    }

    /// Resume a run suspended at the review point. The checkpoint's
    /// namespace is restored so resumed artifacts land in the original
    /// session folder.
    pub async fn resume(
        &self,
        checkpoint: PlanCheckpoint,
        decision: ResumeDecision,
        session: &mut SessionStore,
    ) -> Result<RunOutcome> {
        session.resume_session(checkpoint.namespace.clone());
        info!(namespace = %checkpoint.namespace, "resuming research session");

        match checkpoint.apply(decision)? {
            ReviewOutcome::Aborted(state) => Ok(RunOutcome::Aborted { state }),
            ReviewOutcome::Proceed(state) => self.continue_run(state, session).await,
        }
    }

    /// Run the post-plan stages: analysis, report, chart augmentation,
    /// persistence.
    async fn continue_run(
        &self,
        mut state: ResearchState,
        session: &SessionStore,
    ) -> Result<RunOutcome> {
        if state.needs_clarification {
            return Err(anyhow!(
                "cannot analyze a run that is waiting for clarification"
            ));
        }

        run_analysis(
            self.insight_model.as_ref(),
            self.analytics.as_ref(),
            &mut state,
        )
        .await?;
        run_reporting(self.writer_model.as_ref(), &mut state).await?;

        let (augmented, charts) = augment_report_with_charts(
            &state.final_report,
            &self.options.section_heading,
            &self.chart_pipeline,
            session,
        )
        .await;
        state.final_report = augmented;
        state.stage = Stage::Done;
        info!(charts = charts.len(), "research run complete");

        let report_path = session.resolve(REPORT_FILE_NAME)?;
        tokio::fs::write(&report_path, &state.final_report)
            .await
            .with_context(|| format!("failed to write report {}", report_path.display()))?;

        Ok(RunOutcome::Completed { state, report_path })
    }
}
