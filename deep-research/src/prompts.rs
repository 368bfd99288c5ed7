//! Prompt text for every model call in the workflow.
//!
//! The research domain is Chinese business analytics, so the prompts address
//! the model in Chinese. Keeping them in one module keeps the workflow code
//! free of large string literals.

/// System prompt for the planning stage. Embeds the full indicator catalog
/// so the planner only proposes questions the backend can answer.
pub fn planner_system_prompt(catalog_json: &str, today: &str) -> String {
    format!(
        r#"你是一名资深的商业分析研究规划师。今天的日期是 {today}。

用户会提出一个业务问题。请基于下方可查询的指标和维度目录，把问题拆解为一个结构化的研究计划。

可查询的指标与维度目录：
{catalog_json}

输出要求：只输出一个 JSON 对象，不要输出任何其他文字。格式如下：
{{
  "steps": {{
    "步骤名": {{
      "reason": "为什么需要这个步骤",
      "general_questions": ["可以直接取数回答的问题"],
      "yoy_mom_questions": ["需要同比/环比归因分析的问题"]
    }}
  }}
}}

规则：
- 每个问题必须能用目录中的指标和维度表述。
- general_questions 放普通取数问题；yoy_mom_questions 放需要归因下钻的同比环比问题。
- 如果用户的问题过于模糊、缺少指标或时间范围，不要输出 JSON，直接用中文向用户提出澄清问题。"#
    )
}

/// System prompt for per-dimension narrative drafting.
pub const DIMENSION_INSIGHT_PROMPT: &str = r#"你是一名数据分析师。给定一个业务问题、一个归因维度以及该维度下的积极与消极影响项，写一段简明的中文分析草稿：指出哪些项目拉动了指标、哪些拖累了指标，并给出幅度对比。不超过 200 字，直接输出正文。"#;

/// User message for one dimension's narrative call.
pub fn dimension_insight_user_prompt(
    query: &str,
    dimension_name: &str,
    positive: &str,
    negative: &str,
) -> String {
    format!(
        "问题：{query}\n维度：{dimension_name}\n积极影响项：{positive}\n消极影响项：{negative}"
    )
}

/// System prompt for the final report writer.
pub const WRITER_PROMPT: &str = r#"你是一名商业研究报告撰写专家。输入是一份研究计划及其逐步分析结果（JSON）。请写一份结构完整的中文 markdown 研究报告：

- 以一级标题开头，给出结论摘要。
- 必须包含一个名为「研究计划回顾」的二级章节（## 研究计划回顾），用 markdown 表格逐步列出研究步骤、关键数据和结论。
- 随后按步骤展开分析，引用归因草稿中的发现。
- 结尾给出行动建议。

直接输出 markdown 正文，不要使用代码块包裹。"#;

/// System prompt for the chart specification synthesizer.
pub const CHART_SYSTEM_PROMPT: &str =
    "你是一个数据可视化专家，擅长将表格数据转换为美观的 ECharts 图表配置。";

/// User message asking the model to turn one markdown table into a chart
/// specification.
pub fn chart_option_prompt(table: &str) -> String {
    format!(
        r#"请将下面的 markdown 表格转换为一个 ECharts option 配置，选择最适合数据的图表类型。

{table}

要求：
- 只输出一个 JSON 对象（ECharts option），不要输出解释文字。
- 不要在 JSON 中使用函数、注释或尾随逗号。
- 坐标轴与系列必须与表格数据一一对应。"#
    )
}

/// Escalation appended from the second attempt on: demand strict JSON.
pub const CHART_STRICT_JSON_SUFFIX: &str =
    "\n\n注意：上一次输出无法解析。请输出严格合法的 JSON：双引号键名、无注释、无尾随逗号、无任何 JSON 之外的文字。";

/// Escalation appended on the final attempt: demand the simplest structure.
pub const CHART_SIMPLEST_SUFFIX: &str =
    "\n\n请使用最简单的图表结构：单个 bar 系列、category 型 x 轴、value 型 y 轴，不要任何可选样式字段。";
