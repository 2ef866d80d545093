//! Small SVG charts of the recent values of a metric.

use std::io::Cursor;

use hq_metrics::Metric;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};

use crate::error::Result;

pub const WIDTH: f64 = 100.0;
pub const HEIGHT: f64 = 25.0;
const MARGIN: f64 = 2.0;

/// Points of the chart, skipping runs where the metric had no value.
pub fn points(history: &[f64], (min, max): (f64, f64)) -> Vec<(f64, f64)> {
    let step = if history.len() > 1 {
        (WIDTH - 2.0 * MARGIN) / (history.len() - 1) as f64
    } else {
        0.0
    };
    let range = if max > min { max - min } else { 1.0 };
    history
        .iter()
        .enumerate()
        .filter(|(_, value)| **value >= 0.0)
        .map(|(index, value)| {
            let fraction = ((value - min) / range).clamp(0.0, 1.0);
            let x = MARGIN + step * index as f64;
            let y = HEIGHT - MARGIN - fraction * (HEIGHT - 2.0 * MARGIN);
            (round(x), round(y))
        })
        .collect()
}

fn round(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Renders the sparkline of the metric's recent history.
///
/// # Errors
///
/// Returns an error when writing the SVG fails.
pub fn render(metric: &Metric) -> Result<String> {
    let points = points(&metric.recent_history, metric.y_axis_range());
    let mut xml = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let width = WIDTH.to_string();
    let height = HEIGHT.to_string();
    let view_box = format!("0 0 {WIDTH} {HEIGHT}");
    let mut svg = BytesStart::new("svg");
    svg.push_attribute(("xmlns", "http://www.w3.org/2000/svg"));
    svg.push_attribute(("width", width.as_str()));
    svg.push_attribute(("height", height.as_str()));
    svg.push_attribute(("viewBox", view_box.as_str()));
    xml.write_event(Event::Start(svg))?;

    if !points.is_empty() {
        let coordinates = points
            .iter()
            .map(|(x, y)| format!("{x},{y}"))
            .collect::<Vec<_>>()
            .join(" ");
        let mut line = BytesStart::new("polyline");
        line.push_attribute(("points", coordinates.as_str()));
        line.push_attribute(("fill", "none"));
        line.push_attribute(("stroke", "#4169e1"));
        line.push_attribute(("stroke-width", "1.5"));
        xml.write_event(Event::Empty(line))?;
    }
    if let Some((x, y)) = points.last() {
        let (cx, cy) = (x.to_string(), y.to_string());
        let mut dot = BytesStart::new("circle");
        dot.push_attribute(("cx", cx.as_str()));
        dot.push_attribute(("cy", cy.as_str()));
        dot.push_attribute(("r", "1.5"));
        dot.push_attribute(("fill", "#4169e1"));
        xml.write_event(Event::Empty(dot))?;
    }

    xml.write_event(Event::End(BytesEnd::new("svg")))?;
    Ok(String::from_utf8_lossy(&xml.into_inner().into_inner()).into_owned())
}
