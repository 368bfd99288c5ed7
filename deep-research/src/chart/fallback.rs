//! Deterministic fallback chart construction.
//!
//! When every synthesis attempt fails to yield a parseable specification,
//! the table itself is enough for a plain bar chart: column 0 becomes the
//! categories, column 1 the values. The result is intentionally fixed and
//! unstyled; it exists so a report never loses a chart to model noise.

use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

use super::ChartOption;

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\d,]+").expect("digit run regex must compile"));

/// Build a fixed bar-chart specification from a markdown table.
///
/// Returns `None` when the table has no parseable header or data rows.
/// Numeric values come from the first digit run in column 1, with thousands
/// separators stripped; non-numeric cells count as zero. Per-bar labels are
/// precomputed abbreviated strings; the y axis uses the export service's
/// `abbreviated` formatter keyword for the same thousands/millions/billions
/// suffixing.
pub fn default_chart_option(table: &str) -> Option<ChartOption> {
    let (headers, rows) = parse_table(table)?;

    let categories: Vec<&str> = rows.iter().map(|row| row[0].as_str()).collect();
    let values: Vec<i64> = rows
        .iter()
        .map(|row| row.get(1).map(|cell| extract_number(cell)).unwrap_or(0))
        .collect();

    let bars: Vec<serde_json::Value> = values
        .iter()
        .map(|&value| {
            json!({
                "value": value,
                "label": {
                    "show": true,
                    "position": "top",
                    "formatter": abbreviate_number(value),
                }
            })
        })
        .collect();

    Some(json!({
        "title": {
            "text": headers.join(" vs "),
            "left": "center",
            "textStyle": { "fontSize": 16, "fontWeight": "bold" }
        },
        "tooltip": {
            "trigger": "axis",
            "axisPointer": { "type": "shadow" }
        },
        "grid": { "left": "3%", "right": "4%", "bottom": "3%", "containLabel": true },
        "xAxis": {
            "type": "category",
            "data": categories,
            "axisLabel": { "rotate": 45, "interval": 0 }
        },
        "yAxis": {
            "type": "value",
            "axisLabel": { "formatter": "abbreviated" }
        },
        "series": [{
            "name": headers.get(1).cloned().unwrap_or_else(|| "数值".to_string()),
            "type": "bar",
            "data": bars,
            "itemStyle": { "color": "#5470c6" }
        }]
    }))
}

/// Split a markdown table into trimmed header cells and data-row cells.
/// Row 1 (the separator) is skipped; rows without cells are dropped.
pub fn parse_table(table: &str) -> Option<(Vec<String>, Vec<Vec<String>>)> {
    let lines: Vec<&str> = table.trim().lines().collect();
    if lines.len() < 3 {
        return None;
    }

    let split_cells = |line: &str| -> Vec<String> {
        line.split('|')
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .map(str::to_string)
            .collect()
    };

    let headers = split_cells(lines[0]);
    let rows: Vec<Vec<String>> = lines[2..]
        .iter()
        .map(|line| split_cells(line))
        .filter(|cells| !cells.is_empty())
        .collect();

    if headers.is_empty() || rows.is_empty() {
        return None;
    }
    Some((headers, rows))
}

/// First digit run in a cell, thousands separators stripped; 0 when absent.
fn extract_number(cell: &str) -> i64 {
    DIGIT_RUN
        .find(cell)
        .and_then(|m| m.as_str().replace(',', "").parse().ok())
        .unwrap_or(0)
}

/// Human-readable large-number abbreviation: 1.2K, 3.4M, 5.6B.
pub fn abbreviate_number(value: i64) -> String {
    let value = value as f64;
    if value >= 1_000_000_000.0 {
        format!("{:.1}B", value / 1_000_000_000.0)
    } else if value >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else {
        format!("{}", value as i64)
    }
}
