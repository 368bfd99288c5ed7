//! Locating markdown tables inside a named report section.

use regex::Regex;
use std::sync::LazyLock;

// A well-formed markdown table: header row, separator row, one or more
// contiguous data rows. The last row's newline is optional so a table at
// end-of-document is still matched.
static TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\|[^\n]*\|[^\n]*\n\|[-\s|:]+\|[^\n]*\n(?:\|[^\n]*\|[^\n]*(?:\n|$))+")
        .expect("table regex must compile")
});

/// One table found in the report, with its exact byte span so the caller
/// can insert text right after it without disturbing anything else.
#[derive(Debug, Clone, PartialEq)]
pub struct TableBlock {
    pub text: String,
    /// Byte offset of the table's first character in the full report.
    pub start: usize,
    /// Byte offset one past the table's last character.
    pub end: usize,
}

/// Find every well-formed markdown table inside the section titled
/// `heading`.
///
/// The section starts at a `##` heading whose text matches `heading`
/// (case-insensitive) and spans until the next same-or-higher-level heading
/// or end of document. A missing section or a section without tables yields
/// an empty sequence; neither is an error.
pub fn scan_section_tables(report: &str, heading: &str) -> Vec<TableBlock> {
    let Some((section_start, section_end)) = find_section(report, heading) else {
        return Vec::new();
    };

    TABLE
        .find_iter(&report[section_start..section_end])
        .map(|m| TableBlock {
            text: m.as_str().to_string(),
            start: section_start + m.start(),
            end: section_start + m.end(),
        })
        .collect()
}

fn find_section(report: &str, heading: &str) -> Option<(usize, usize)> {
    let pattern = format!(
        r"(?im)^(\#{{1,2}})\s*{}[^\n]*$",
        regex::escape(heading.trim())
    );
    let heading_re = Regex::new(&pattern).ok()?;
    let captures = heading_re.captures(report)?;
    let heading_match = captures.get(0)?;
    let level = captures.get(1)?.as_str().len();

    // Section runs until the next same-or-higher-level heading, or end of
    // text. A `##` subheading inside a `#` section stays in the section.
    let terminator = Regex::new(&format!(r"(?m)^\#{{1,{}}}\s", level)).ok()?;
    let rest_start = heading_match.end();
    let section_end = terminator
        .find(&report[rest_start..])
        .map(|m| rest_start + m.start())
        .unwrap_or(report.len());

    Some((heading_match.start(), section_end))
}
