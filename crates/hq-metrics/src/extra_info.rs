//! Detail tables shown below a metric.
//!
//! Header keys keep their insertion order in the JSON output. A header text
//! may carry a layout hint after `__`, e.g. `"Aantal__detail-column-number"`.

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

/// One cell of a detail table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Link { href: String, text: String },
    Text(String),
    Integer(i64),
    Decimal(f64),
    Flag(bool),
}

impl Cell {
    pub fn link(href: impl Into<String>, text: impl Into<String>) -> Self {
        Cell::Link {
            href: href.into(),
            text: text.into(),
        }
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Cell::Text(text.to_string())
    }
}

impl From<String> for Cell {
    fn from(text: String) -> Self {
        Cell::Text(text)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Integer(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Decimal(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Flag(value)
    }
}

/// A titled table with fixed columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtraInfo {
    pub title: String,
    headers: Vec<(&'static str, &'static str)>,
    rows: Vec<Vec<Cell>>,
}

impl ExtraInfo {
    pub fn new(title: impl Into<String>, headers: &[(&'static str, &'static str)]) -> Self {
        Self {
            title: title.into(),
            headers: headers.to_vec(),
            rows: Vec::new(),
        }
    }

    /// Appends a row. Cells are matched to the headers by position; missing
    /// cells are left out of the row.
    pub fn push(&mut self, cells: Vec<Cell>) {
        self.rows.push(cells);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn headers(&self) -> &[(&'static str, &'static str)] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }
}

struct Ordered<'a, V>(&'a [(&'static str, V)]);

impl<V: Serialize> Serialize for Ordered<'_, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct Row<'a> {
    headers: &'a [(&'static str, &'static str)],
    cells: &'a [Cell],
}

impl Serialize for Row<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len().min(self.headers.len())))?;
        for ((key, _), cell) in self.headers.iter().zip(self.cells) {
            map.serialize_entry(key, cell)?;
        }
        map.end()
    }
}

impl Serialize for ExtraInfo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let rows: Vec<Row<'_>> = self
            .rows
            .iter()
            .map(|cells| Row {
                headers: &self.headers,
                cells,
            })
            .collect();
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("headers", &Ordered(&self.headers))?;
        map.serialize_entry("title", &self.title)?;
        map.serialize_entry("data", &rows)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_headers_in_order() {
        let mut info = ExtraInfo::new(
            "Blocker violations per soort",
            &[
                ("violation_type", "Violation type"),
                ("number", "Aantal__detail-column-number"),
                ("debt", "Geschatte oplostijd__detail-column-number"),
            ],
        );
        info.push(vec![
            Cell::link("http://sonar/issues", "Bugs"),
            Cell::from(3),
            Cell::from("2h 5min"),
        ]);
        insta::assert_json_snapshot!(info, @r#"
        {
          "headers": {
            "violation_type": "Violation type",
            "number": "Aantal__detail-column-number",
            "debt": "Geschatte oplostijd__detail-column-number"
          },
          "title": "Blocker violations per soort",
          "data": [
            {
              "violation_type": {
                "href": "http://sonar/issues",
                "text": "Bugs"
              },
              "number": 3,
              "debt": "2h 5min"
            }
          ]
        }
        "#);
    }
}
