//! `{key}` placeholders in report and norm texts.

use std::collections::BTreeMap;

use tracing::warn;

/// Replaces every `{key}` in `template` with its parameter. Unknown keys are
/// left in place.
pub fn render(template: &str, params: &BTreeMap<&str, String>) -> String {
    let mut rendered = String::with_capacity(template.len() + 32);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            rendered.push_str(&rest[open..]);
            return rendered;
        };
        let key = &after[..close];
        if let Some(value) = params.get(key) {
            rendered.push_str(value);
        } else {
            warn!(key, template, "Template parameter not available");
            rendered.push('{');
            rendered.push_str(key);
            rendered.push('}');
        }
        rest = &after[close + 1..];
    }
    rendered.push_str(rest);
    rendered
}
