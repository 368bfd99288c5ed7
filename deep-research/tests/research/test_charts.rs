//! Chart pipeline tests: retry budget, fallback specification, report
//! augmentation.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use super::common::{
    temp_session, FailingRenderer, MockRenderer, ScriptedModel, SAMPLE_TABLE,
};
use deep_research::chart::{augment_report_with_charts, ChartPipeline};

fn report_with_table() -> String {
    format!(
        "# 销量研究报告\n\n结论摘要。\n\n## 研究计划回顾\n\n{}\n## 分析\n\n正文。\n",
        SAMPLE_TABLE
    )
}

fn pipeline(model: Arc<ScriptedModel>, renderer: Arc<MockRenderer>) -> ChartPipeline {
    ChartPipeline::new(model, renderer)
        .with_attempt_budget(3)
        .with_backoff_unit(Duration::from_millis(1))
}

#[tokio::test]
async fn test_exhausted_synthesis_falls_back_to_bar_chart() {
    let model = Arc::new(ScriptedModel::never_json());
    let renderer = Arc::new(MockRenderer::valid());
    let pipeline = pipeline(model.clone(), renderer.clone());
    let (_dir, session) = temp_session();

    let chart = pipeline
        .convert_table(SAMPLE_TABLE, "chart_1", &session)
        .await
        .unwrap();

    // Exactly the attempt budget, no more.
    assert_eq!(model.call_count(), 3);
    assert_eq!(chart.attempts, 3);
    assert!(chart.used_fallback);
    assert!(chart.path.exists());

    let option = renderer.last_option.lock().unwrap().clone().unwrap();
    assert_eq!(option["xAxis"]["data"], json!(["A", "B"]));
    assert_eq!(option["series"][0]["data"][0]["value"], 1200);
    assert_eq!(option["series"][0]["data"][1]["value"], 850);
    assert_eq!(option["series"][0]["type"], "bar");
}

#[tokio::test]
async fn test_parseable_synthesis_skips_retries() {
    let option_json = r#"{"xAxis": {"type": "category", "data": ["A", "B"]},
        "yAxis": {"type": "value"},
        "series": [{"type": "bar", "data": [1200, 850]}]}"#;
    let model = Arc::new(ScriptedModel::new(&[option_json]));
    let renderer = Arc::new(MockRenderer::valid());
    let pipeline = pipeline(model.clone(), renderer);
    let (_dir, session) = temp_session();

    let chart = pipeline
        .convert_table(SAMPLE_TABLE, "chart_1", &session)
        .await
        .unwrap();

    assert_eq!(model.call_count(), 1);
    assert_eq!(chart.attempts, 1);
    assert!(!chart.used_fallback);
}

#[tokio::test]
async fn test_blank_render_fails_validation() {
    let model = Arc::new(ScriptedModel::never_json());
    let renderer = Arc::new(MockRenderer::blank());
    let pipeline = ChartPipeline::new(model, renderer)
        .with_attempt_budget(1)
        .with_backoff_unit(Duration::from_millis(1));
    let (_dir, session) = temp_session();

    let result = pipeline.convert_table(SAMPLE_TABLE, "chart_1", &session).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_augment_inserts_one_image_ref_after_table() {
    let report = report_with_table();
    let model = Arc::new(ScriptedModel::never_json());
    let renderer = Arc::new(MockRenderer::valid());
    let pipeline = pipeline(model, renderer);
    let (_dir, session) = temp_session();

    let (updated, charts) =
        augment_report_with_charts(&report, "研究计划回顾", &pipeline, &session).await;

    assert_eq!(charts.len(), 1);
    assert_eq!(updated.matches("![研究计划图表](").count(), 1);

    // The image reference follows the table; everything else is unchanged.
    let inserted = format!("\n\n![研究计划图表]({})\n\n", charts[0].file_name);
    assert_eq!(updated.replacen(&inserted, "", 1), report);
    let table_pos = updated.find("| B | 850 |").unwrap();
    let image_pos = updated.find("![研究计划图表](").unwrap();
    assert!(image_pos > table_pos);
}

#[tokio::test]
async fn test_tables_outside_section_are_ignored() {
    let report = format!("# 报告\n\n## 附录\n\n{}\n", SAMPLE_TABLE);
    let model = Arc::new(ScriptedModel::never_json());
    let renderer = Arc::new(MockRenderer::valid());
    let pipeline = pipeline(model.clone(), renderer);
    let (_dir, session) = temp_session();

    let (updated, charts) =
        augment_report_with_charts(&report, "研究计划回顾", &pipeline, &session).await;

    assert!(charts.is_empty());
    assert_eq!(updated, report);
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_render_failure_leaves_report_unmodified() {
    let report = report_with_table();
    let model = Arc::new(ScriptedModel::never_json());
    let pipeline = ChartPipeline::new(model, Arc::new(FailingRenderer))
        .with_attempt_budget(2)
        .with_backoff_unit(Duration::from_millis(1));
    let (_dir, session) = temp_session();

    let (updated, charts) =
        augment_report_with_charts(&report, "研究计划回顾", &pipeline, &session).await;

    assert!(charts.is_empty());
    assert_eq!(updated, report);
}
