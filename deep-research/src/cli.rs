//! CLI argument parsing and command dispatch.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::analytics::AnalyticsBackend;
use crate::chart::{ChartPipeline, HttpChartRenderer};
use crate::config::Config;
use crate::llm::get_chat_model;
use crate::research::{PlanCheckpoint, ResearchWorkflow, ResumeDecision, RunOutcome};
use crate::research::workflow::WorkflowOptions;
use crate::session::SessionStore;

/// Deep research agent: question in, chart-augmented markdown report out.
#[derive(Parser, Debug, Clone)]
#[command(name = "deep-research", version, about)]
pub struct Args {
    /// Research question to investigate. Required unless resuming.
    pub question: Option<String>,

    /// Model for planning and per-dimension insight drafts
    #[arg(long, default_value = "deepseek-chat")]
    pub model: String,

    /// Model for the final report
    #[arg(long, default_value = "deepseek-reasoner")]
    pub writer_model: String,

    /// Pause after planning and write a checkpoint for human review
    #[arg(long)]
    pub review: bool,

    /// Resume from a review checkpoint file instead of starting a new run
    #[arg(long)]
    pub resume: Option<PathBuf>,

    /// Reviewer decision when resuming
    #[arg(long, value_enum, requires = "resume")]
    pub decision: Option<Decision>,

    /// Replacement plan JSON file, required with `--decision edit`
    #[arg(long, requires = "resume")]
    pub plan_file: Option<PathBuf>,

    /// Chart synthesis attempts per table before the deterministic fallback
    #[arg(long, default_value_t = 3)]
    pub chart_attempts: u32,

    /// Report section whose tables get chart augmentation
    #[arg(long, default_value = "研究计划回顾")]
    pub section: String,

    /// Base directory for per-session report folders (overrides REPORTS_DIR)
    #[arg(long)]
    pub reports_dir: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum Decision {
    Accept,
    Edit,
    Ignore,
}

pub async fn run(args: Args) -> Result<()> {
    let mut config = Config::from_env()?;
    if let Some(dir) = &args.reports_dir {
        config.reports_dir = dir.clone();
    }

    let workflow = build_workflow(&args, &config)?;
    let mut session = SessionStore::new(config.reports_dir.clone());

    let outcome = match &args.resume {
        Some(checkpoint_path) => {
            let checkpoint = PlanCheckpoint::load(checkpoint_path)?;
            let decision = resume_decision(&args)?;
            workflow.resume(checkpoint, decision, &mut session).await?
        }
        None => {
            let question = args
                .question
                .as_deref()
                .ok_or_else(|| anyhow!("a research question is required unless resuming"))?;
            workflow.run(question, &mut session).await?
        }
    };

    report_outcome(outcome, &session)
}

fn build_workflow(args: &Args, config: &Config) -> Result<ResearchWorkflow> {
    let planner = get_chat_model(&args.model, config)?;
    let writer = get_chat_model(&args.writer_model, config)?;

    let client = chatbi_client::ChatbiClient::new(
        config.chatbi_domain.clone(),
        config.chatbi_token.clone(),
    )?;
    let analytics: Arc<dyn AnalyticsBackend> = Arc::new(client);

    let renderer_url = config
        .chart_renderer_url
        .as_deref()
        .context("CHART_RENDERER_URL must be set to render charts")?;
    let pipeline = ChartPipeline::new(
        planner.clone(),
        Arc::new(HttpChartRenderer::new(renderer_url)),
    )
    .with_attempt_budget(args.chart_attempts)
    .with_backoff_unit(Duration::from_millis(1000));

    Ok(ResearchWorkflow::new(
        planner.clone(),
        planner,
        writer,
        analytics,
        pipeline,
        WorkflowOptions {
            review: args.review,
            section_heading: args.section.clone(),
        },
    ))
}

fn resume_decision(args: &Args) -> Result<ResumeDecision> {
    match args
        .decision
        .ok_or_else(|| anyhow!("--decision is required when resuming"))?
    {
        Decision::Accept => Ok(ResumeDecision::Accept),
        Decision::Ignore => Ok(ResumeDecision::Ignore),
        Decision::Edit => {
            let path = args
                .plan_file
                .as_ref()
                .ok_or_else(|| anyhow!("--plan-file is required with --decision edit"))?;
            let plan_json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read plan file {}", path.display()))?;
            Ok(ResumeDecision::Edit { plan_json })
        }
    }
}

fn report_outcome(outcome: RunOutcome, session: &SessionStore) -> Result<()> {
    match outcome {
        RunOutcome::ClarificationNeeded { state } => {
            println!("需要澄清后才能继续研究：");
            for prompt in &state.clarification_prompts {
                println!("  {}", prompt);
            }
        }
        RunOutcome::AwaitingReview { checkpoint } => {
            let path = session.resolve("checkpoint.json")?;
            checkpoint.save(&path)?;
            println!("研究计划已生成，等待人工审核。");
            println!("检查点已保存：{}", path.display());
            println!(
                "审核后执行：deep-research --resume {} --decision accept",
                path.display()
            );
        }
        RunOutcome::Completed { state, report_path } => {
            println!("研究完成，报告已保存：{}", report_path.display());
            println!("共执行 {} 个研究步骤。", state.analysis_results.len());
        }
        RunOutcome::EmptyPlan { .. } => {
            println!("研究计划为空，没有需要分析的内容。");
        }
        RunOutcome::Aborted { .. } => {
            println!("人工审核选择忽略，研究已停止。");
        }
    }
    Ok(())
}
