//! Tool calls written inline as `<tool_call>{...}</tool_call>` by models
//! without native function calling.

use crate::traits::ToolCallRequest;

const OPEN_TAG: &str = "<tool_call>";
const CLOSE_TAG: &str = "</tool_call>";

/// Splits a text reply into its prose and the first inline tool call, if any.
pub fn parse_tool_call(response: &str) -> (String, Option<ToolCallRequest>) {
    let mut text_parts = Vec::new();
    let mut call = None;
    let mut remaining = response;

    while let Some(start) = remaining.find(OPEN_TAG) {
        let before = &remaining[..start];
        if !before.trim().is_empty() {
            text_parts.push(before.trim().to_string());
        }

        let after_open = &remaining[start + OPEN_TAG.len()..];
        let Some(close_idx) = after_open.find(CLOSE_TAG) else {
            remaining = after_open;
            break;
        };

        if call.is_none() {
            call = extract_json_values(&after_open[..close_idx])
                .iter()
                .find_map(parse_tool_call_value);
        }
        remaining = &after_open[close_idx + CLOSE_TAG.len()..];
    }

    if !remaining.trim().is_empty() {
        text_parts.push(remaining.trim().to_string());
    }

    (text_parts.join("\n"), call)
}

fn extract_json_values(text: &str) -> Vec<serde_json::Value> {
    let mut values = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if !in_string && depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start
                        && let Ok(value) = serde_json::from_str::<serde_json::Value>(&text[s..=i])
                    {
                        values.push(value);
                    }
                    start = None;
                }
            }
            _ => {}
        }
    }

    values
}

fn parse_tool_call_value(value: &serde_json::Value) -> Option<ToolCallRequest> {
    let name = value.get("name")?.as_str()?.to_string();
    let argument = match value.get("input").or_else(|| value.get("arguments")) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Object(map)) => match map.get("input") {
            Some(serde_json::Value::String(s)) => s.clone(),
            _ => serde_json::to_string(map).ok()?,
        },
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    Some(ToolCallRequest::new(name, argument))
}
