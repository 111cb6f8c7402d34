//! HTML rendering of structured documents
//!
//! One layout per document type; the result is the input of PDF generation.

use documind_common::StructuredPayload;
use serde_json::{Map, Value};

use crate::services::StructuredContent;

const STYLE: &str = "body{font-family:Helvetica,Arial,sans-serif;margin:48px;color:#1f2933}\
h1{font-size:26px;margin-bottom:4px}.type{color:#52606d;text-transform:uppercase;font-size:12px}\
table{border-collapse:collapse;width:100%}th,td{border:1px solid #cbd2d9;padding:6px;text-align:left}\
pre{white-space:pre-wrap}";

/// Render the document as a standalone HTML page
pub fn render_html(content: &StructuredContent) -> String {
    let mut body = String::new();

    if !content.summary.is_empty() {
        body.push_str("<h2>Summary</h2>\n");
        body.push_str(&format!("<p>{}</p>\n", escape_html(&content.summary)));
    }

    match &content.payload {
        StructuredPayload::MeetingNotes { action_items } => {
            body.push_str("<h2>Action Items</h2>\n");
            if action_items.is_empty() {
                body.push_str("<p>No action items.</p>\n");
            } else {
                body.push_str(
                    "<table><tr><th>Task</th><th>Owner</th><th>Due</th><th>Status</th></tr>\n",
                );
                for item in action_items {
                    let status = match item.status {
                        documind_common::TaskStatus::Open => "open",
                        documind_common::TaskStatus::Done => "done",
                    };
                    body.push_str(&format!(
                        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                        escape_html(&item.task),
                        escape_html(&item.owner),
                        escape_html(&item.due_date),
                        status
                    ));
                }
                body.push_str("</table>\n");
            }
        }
        StructuredPayload::Prd { requirements } => {
            body.push_str("<h2>Requirements</h2>\n<ol>\n");
            for requirement in requirements {
                body.push_str(&format!("<li>{}</li>\n", escape_html(requirement)));
            }
            body.push_str("</ol>\n");
        }
        StructuredPayload::CodeDocs(map) | StructuredPayload::General(map) => {
            render_sections(&mut body, map);
        }
    }

    render_sections(&mut body, &content.extra_sections);

    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title>\
<style>{style}</style></head>\n<body>\n<h1>{title}</h1>\n<div class=\"type\">{label}</div>\n{body}</body></html>\n",
        title = escape_html(&content.title),
        style = STYLE,
        label = content.doc_type().label(),
        body = body
    )
}

fn render_sections(body: &mut String, sections: &Map<String, Value>) {
    for (key, value) in sections {
        body.push_str(&format!("<h2>{}</h2>\n", escape_html(&heading(key))));
        body.push_str(&render_value(value));
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("<p>{}</p>\n", escape_html(s)),
        Value::Array(items) => {
            let mut list = String::from("<ul>\n");
            for item in items {
                let text = match item {
                    Value::String(s) => escape_html(s),
                    other => format!("<pre>{}</pre>", escape_html(&pretty(other))),
                };
                list.push_str(&format!("<li>{}</li>\n", text));
            }
            list.push_str("</ul>\n");
            list
        }
        Value::Null => String::new(),
        other => format!("<pre>{}</pre>\n", escape_html(&pretty(other))),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// `key_decisions` → `Key Decisions`
fn heading(key: &str) -> String {
    key.split(|c: char| c == '_' || c == '-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
