//! Full stage-machine runs with mocked models, analytics and rendering.

use std::sync::Arc;
use std::time::Duration;

use super::common::{temp_store, MockAnalytics, MockRenderer, ScriptedModel, SAMPLE_TABLE};
use chatbi_client::AnalyzeOutcome;
use deep_research::chart::ChartPipeline;
use deep_research::research::workflow::WorkflowOptions;
use deep_research::research::{
    PlanCheckpoint, ResearchWorkflow, ResumeDecision, RunOutcome, Stage,
};

const PLAN_JSON: &str = r#"{
  "steps": {
    "s1": {
      "reason": "先看整体销量",
      "general_questions": ["今年一季度各产品销量"],
      "yoy_mom_questions": ["今年一季度销量同比"]
    }
  }
}"#;

fn writer_report() -> String {
    format!(
        "# 销量研究报告\n\n结论摘要。\n\n## 研究计划回顾\n\n{}\n## 分析\n\n正文。\n",
        SAMPLE_TABLE
    )
}

struct Harness {
    planner: Arc<ScriptedModel>,
    analytics: Arc<MockAnalytics>,
    workflow: ResearchWorkflow,
}

fn harness(planner_script: &[&str], review: bool) -> Harness {
    let planner = Arc::new(ScriptedModel::new(planner_script));
    let insight = Arc::new(ScriptedModel::new(&["线上渠道拉动，线下渠道拖累。"]));
    let report = writer_report();
    let writer = Arc::new(ScriptedModel::new(&[report.as_str()]));
    let chart_model = Arc::new(ScriptedModel::never_json());
    let analytics = Arc::new(MockAnalytics::default());

    let pipeline = ChartPipeline::new(chart_model, Arc::new(MockRenderer::valid()))
        .with_attempt_budget(2)
        .with_backoff_unit(Duration::from_millis(1));

    let workflow = ResearchWorkflow::new(
        planner.clone(),
        insight,
        writer,
        analytics.clone(),
        pipeline,
        WorkflowOptions {
            review,
            ..WorkflowOptions::default()
        },
    );
    Harness {
        planner,
        analytics,
        workflow,
    }
}

#[tokio::test]
async fn test_full_run_produces_augmented_report() {
    let h = harness(&[PLAN_JSON], false);
    let (_dir, mut session) = temp_store();

    let outcome = h
        .workflow
        .run("一季度销量怎么样", &mut session)
        .await
        .unwrap();

    let (state, report_path) = match outcome {
        RunOutcome::Completed { state, report_path } => (state, report_path),
        other => panic!("expected completed run, got {:?}", other),
    };

    assert_eq!(state.stage, Stage::Done);
    assert_eq!(state.analysis_results.len(), 1);
    let step = &state.analysis_results["s1"];
    assert_eq!(step.general_answers.len(), 1);
    assert_eq!(step.yoy_mom_answers.len(), 1);
    match &step.yoy_mom_answers[0] {
        AnalyzeOutcome::Success { data, .. } => {
            assert_eq!(
                data.drilldown[0].narrative_draft,
                "线上渠道拉动，线下渠道拖累。"
            );
        }
        other => panic!("expected success outcome, got {:?}", other),
    }

    // The persisted report carries exactly one chart reference.
    let on_disk = std::fs::read_to_string(&report_path).unwrap();
    assert_eq!(on_disk, state.final_report);
    assert_eq!(on_disk.matches("![研究计划图表](").count(), 1);

    // The referenced image sits next to the report.
    let image_name = on_disk
        .split("![研究计划图表](")
        .nth(1)
        .and_then(|rest| rest.split(')').next())
        .unwrap();
    assert!(report_path.parent().unwrap().join(image_name).exists());
}

#[tokio::test]
async fn test_clarification_makes_no_analytics_queries() {
    let h = harness(&["你是想问销量还是利润？"], false);
    let (_dir, mut session) = temp_store();

    let outcome = h.workflow.run("最近表现如何", &mut session).await.unwrap();

    match outcome {
        RunOutcome::ClarificationNeeded { state } => {
            assert_eq!(state.stage, Stage::ClarificationNeeded);
            assert!(state.final_report.is_empty());
            assert!(state.analysis_results.is_empty());
        }
        other => panic!("expected clarification, got {:?}", other),
    }
    assert_eq!(h.analytics.query_count(), 0);
}

#[tokio::test]
async fn test_review_checkpoint_resumes_in_same_session() {
    let h = harness(&[PLAN_JSON], true);
    let (_dir, mut session) = temp_store();

    let outcome = h
        .workflow
        .run("一季度销量怎么样", &mut session)
        .await
        .unwrap();
    let checkpoint = match outcome {
        RunOutcome::AwaitingReview { checkpoint } => checkpoint,
        other => panic!("expected review suspension, got {:?}", other),
    };
    assert_eq!(checkpoint.state.stage, Stage::AwaitingHumanReview);
    // Suspension happens before any analysis.
    assert_eq!(h.analytics.query_count(), 0);

    // Round-trip through disk like a real resume would.
    let path = session.base_dir().join("checkpoint.json");
    checkpoint.save(&path).unwrap();
    let loaded = PlanCheckpoint::load(&path).unwrap();
    let namespace = loaded.namespace.clone();

    let outcome = h
        .workflow
        .resume(loaded, ResumeDecision::Accept, &mut session)
        .await
        .unwrap();

    match outcome {
        RunOutcome::Completed { report_path, .. } => {
            assert_eq!(session.namespace(), Some(namespace.as_str()));
            assert!(report_path.starts_with(session.base_dir().join(&namespace)));
        }
        other => panic!("expected completed run, got {:?}", other),
    }
}

#[tokio::test]
async fn test_review_ignore_aborts_without_analysis() {
    let h = harness(&[PLAN_JSON], true);
    let (_dir, mut session) = temp_store();

    let outcome = h
        .workflow
        .run("一季度销量怎么样", &mut session)
        .await
        .unwrap();
    let checkpoint = match outcome {
        RunOutcome::AwaitingReview { checkpoint } => checkpoint,
        other => panic!("expected review suspension, got {:?}", other),
    };

    let outcome = h
        .workflow
        .resume(checkpoint, ResumeDecision::Ignore, &mut session)
        .await
        .unwrap();

    match outcome {
        RunOutcome::Aborted { state } => {
            assert_eq!(state.stage, Stage::Done);
            assert!(state.analysis_results.is_empty());
        }
        other => panic!("expected aborted run, got {:?}", other),
    }
    assert_eq!(h.analytics.query_count(), 0);
}

#[tokio::test]
async fn test_edited_plan_drives_the_resumed_run() {
    let h = harness(&[PLAN_JSON], true);
    let (_dir, mut session) = temp_store();

    let outcome = h
        .workflow
        .run("一季度销量怎么样", &mut session)
        .await
        .unwrap();
    let checkpoint = match outcome {
        RunOutcome::AwaitingReview { checkpoint } => checkpoint,
        other => panic!("expected review suspension, got {:?}", other),
    };

    let replacement = r#"{
      "steps": {
        "r1": { "reason": "改看利润", "general_questions": ["一季度利润"] }
      }
    }"#;
    let outcome = h
        .workflow
        .resume(
            checkpoint,
            ResumeDecision::Edit {
                plan_json: replacement.to_string(),
            },
            &mut session,
        )
        .await
        .unwrap();

    match outcome {
        RunOutcome::Completed { state, .. } => {
            let names: Vec<&String> = state.analysis_results.keys().collect();
            assert_eq!(names, ["r1"]);
        }
        other => panic!("expected completed run, got {:?}", other),
    }
}
