//! Text of the tables in generated HTML reports.
//!
//! Coverage tools write simple, regular HTML, so a few patterns find the
//! cells without a full HTML parser.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Result, SourceError};

struct Patterns {
    row: Regex,
    cell: Regex,
    tag: Regex,
}

fn patterns() -> Result<&'static Patterns> {
    static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            Some(Patterns {
                row: Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr>").ok()?,
                cell: Regex::new(r"(?is)<td\b[^>]*>(.*?)</td>").ok()?,
                tag: Regex::new(r"<[^>]*>").ok()?,
            })
        })
        .as_ref()
        .ok_or_else(|| SourceError::Parse("invalid HTML table patterns".to_string()))
}

/// Inner HTML of the first `name` element, if any.
pub fn element<'a>(html: &'a str, name: &str) -> Option<&'a str> {
    // ASCII lowercasing keeps byte offsets valid for `html`.
    let lower = html.to_ascii_lowercase();
    let open = lower.find(&format!("<{name}"))?;
    let start = open + lower[open..].find('>')? + 1;
    let end = start + lower[start..].find(&format!("</{name}>"))?;
    Some(&html[start..end])
}

fn text(tag: &Regex, html: &str) -> String {
    tag.replace_all(html, "")
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

/// Text of every `td` cell, in document order.
pub fn cells(html: &str) -> Result<Vec<String>> {
    let patterns = patterns()?;
    Ok(patterns
        .cell
        .captures_iter(html)
        .map(|captures| text(&patterns.tag, &captures[1]))
        .collect())
}

/// Cell texts per table row.
pub fn rows(html: &str) -> Result<Vec<Vec<String>>> {
    let patterns = patterns()?;
    patterns
        .row
        .captures_iter(html)
        .map(|captures| cells(&captures[1]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"<table><TBODY>
      <tr class="a"><td>Lines:</td><td class="n"><b>12</b></td></tr>
      <tr><td>R&amp;D</td><td>&nbsp;3 </td></tr>
    </TBODY></table>"#;

    #[test]
    fn finds_elements_case_insensitively() {
        let body = element(TABLE, "tbody").expect("tbody");
        assert!(body.trim_start().starts_with("<tr"));
        assert!(element(TABLE, "tfoot").is_none());
    }

    #[test]
    fn cell_text_without_markup() {
        assert_eq!(cells(TABLE).expect("cells"), vec!["Lines:", "12", "R&D", "3"]);
        let rows = rows(TABLE).expect("rows");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["R&D", "3"]);
    }
}
