//! Planning stage outcome tests

use super::common::{MockAnalytics, ScriptedModel};
use deep_research::research::plan::{run_planning, PlanningOutcome};
use deep_research::research::{ResearchState, Stage};

const PLAN_JSON: &str = r#"{
  "steps": {
    "s1": {
      "reason": "先看整体销量",
      "general_questions": ["今年一季度各产品销量"],
      "yoy_mom_questions": ["今年一季度销量同比"]
    }
  }
}"#;

#[tokio::test]
async fn test_plan_json_moves_to_analyzing() {
    let model = ScriptedModel::new(&[PLAN_JSON]);
    let analytics = MockAnalytics::default();
    let mut state = ResearchState::new("一季度销量怎么样");

    let outcome = run_planning(&model, &analytics, &mut state).await.unwrap();

    assert_eq!(outcome, PlanningOutcome::Planned);
    assert_eq!(state.stage, Stage::Analyzing);
    assert_eq!(state.plan.steps.len(), 1);
    assert!(state.plan.steps.contains_key("s1"));
    assert!(!state.needs_clarification);
}

#[tokio::test]
async fn test_fenced_plan_also_parses() {
    let fenced = format!("好的，计划如下：\n```json\n{}\n```", PLAN_JSON);
    let model = ScriptedModel::new(&[&fenced]);
    let analytics = MockAnalytics::default();
    let mut state = ResearchState::new("一季度销量怎么样");

    let outcome = run_planning(&model, &analytics, &mut state).await.unwrap();

    assert_eq!(outcome, PlanningOutcome::Planned);
    assert_eq!(state.plan.steps.len(), 1);
}

#[tokio::test]
async fn test_clarification_halts_run() {
    let model = ScriptedModel::new(&["你是想问销量还是利润？"]);
    let analytics = MockAnalytics::default();
    let mut state = ResearchState::new("最近表现如何");

    let outcome = run_planning(&model, &analytics, &mut state).await.unwrap();

    assert_eq!(outcome, PlanningOutcome::Clarification);
    assert_eq!(state.stage, Stage::ClarificationNeeded);
    assert!(state.needs_clarification);
    assert_eq!(state.clarification_prompts, ["你是想问销量还是利润？"]);
    // The catalog fetch happens, but no analysis query may run.
    assert_eq!(analytics.query_count(), 0);
}

#[tokio::test]
async fn test_empty_plan_finishes_immediately() {
    let model = ScriptedModel::new(&[r#"{"steps": {}}"#]);
    let analytics = MockAnalytics::default();
    let mut state = ResearchState::new("一季度销量怎么样");

    let outcome = run_planning(&model, &analytics, &mut state).await.unwrap();

    assert_eq!(outcome, PlanningOutcome::EmptyPlan);
    assert_eq!(state.stage, Stage::Done);
    assert!(state.plan.is_empty());
}

#[tokio::test]
async fn test_unusable_planner_output_is_fatal() {
    let model = ScriptedModel::never_json();
    let analytics = MockAnalytics::default();
    let mut state = ResearchState::new("一季度销量怎么样");

    let result = run_planning(&model, &analytics, &mut state).await;
    assert!(result.is_err());
    assert_eq!(analytics.query_count(), 0);
}
