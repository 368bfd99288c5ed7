//! Table-to-chart conversion.
//!
//! The final report embeds markdown tables; this module finds them inside a
//! named section, asks a model to turn each into a declarative chart
//! specification, renders the specification to a PNG through an external
//! export service, and validates the artifact. A deterministic fallback
//! builder covers the case where the model never produces parseable output.

pub mod fallback;
pub mod pipeline;
pub mod render;
pub mod tables;

// Declarative chart specification - flexible JSON structure consumed by the
// export service (ECharts option shape).
pub type ChartOption = serde_json::Value;

pub use pipeline::{augment_report_with_charts, ChartPipeline, RenderedChart};
pub use render::{ChartRenderer, HttpChartRenderer};
pub use tables::{scan_section_tables, TableBlock};
