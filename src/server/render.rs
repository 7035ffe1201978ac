//! HTML rendering for the annotation page

use crate::config::{ItemType, Settings};
use crate::record::Record;
use crate::storage::Status;

pub const NO_UNLABELLED: &str = "No Unlabelled Record Found.";

/// Percent-encode a value for use inside a query string
pub fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Link that re-opens a record in the annotation page
pub fn record_location(identifier: &str) -> String {
    format!("/?url={}", encode_query_value(identifier))
}

/// Where the browser fetches the item's bytes from.
///
/// Remote items are loaded directly, local paths go through `/proxy`.
pub fn data_url(record: &Record) -> String {
    if record.is_remote() {
        record.identifier.clone()
    } else {
        format!("/proxy?url={}", encode_query_value(&record.identifier))
    }
}

/// Fragment presenting one item and the labelling form
pub fn item(settings: &Settings, record: &Record) -> String {
    let src = escape_html(&data_url(record));
    let viewer = match settings.item_type {
        ItemType::Image => format!(r#"<img class="item" src="{src}" alt="item">"#),
        ItemType::Video => format!(r#"<video class="item" src="{src}" controls></video>"#),
        ItemType::Audio => format!(r#"<audio class="item" src="{src}" controls></audio>"#),
        ItemType::Text => format!(r#"<iframe class="item" src="{src}"></iframe>"#),
        ItemType::Webpage => format!(
            r#"<iframe class="item" src="{src}"></iframe><p><a href="{src}" target="_blank">open in new tab</a></p>"#
        ),
    };

    let current = record.labels();
    let choices = if settings.labels.is_empty() {
        // One text box per stored token; a single token never holds the delimiter
        let values = if current.is_empty() { vec![""] } else { current.clone() };
        values
            .iter()
            .map(|value| {
                let value = escape_html(value);
                format!(r#"<input type="text" name="label" value="{value}">"#)
            })
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        settings
            .labels
            .iter()
            .map(|label| {
                let checked = if current.contains(&label.as_str()) { " checked" } else { "" };
                let label = escape_html(label);
                format!(r#"<label><input type="checkbox" name="label" value="{label}"{checked}> {label}</label>"#)
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"<h2>{task}</h2>
<p class="identifier">{identifier}</p>
{viewer}
<form method="post" action="/update">
<input type="hidden" name="url" value="{identifier}">
{choices}
<button type="submit">Save</button>
</form>"#,
        task = escape_html(&settings.task),
        identifier = escape_html(&record.identifier),
    )
}

/// Full page around the featured content
pub fn page(featured: &str, status: &Status) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Labeller</title></head>
<body>
<div class="status">Total: {total} | Pending: {pending} | Done: {done} ({percent:.1}%)</div>
<div class="featured">
{featured}
</div>
<p><a href="/classifications.csv">Download labels</a></p>
</body>
</html>"#,
        total = status.total,
        pending = status.pending,
        done = status.done,
        percent = status.percent_done(),
    )
}
