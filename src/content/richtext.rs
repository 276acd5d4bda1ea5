//! Rich text blocks as stored by the content API
//!
//! A rich text field is an ordered list of blocks, each holding plain text
//! plus style spans addressed by character offsets.

use serde::{Deserialize, Serialize};

use crate::helpers::escape_html;

/// A single block of rich text (paragraph, heading, list item, ...)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RichTextBlock {
    #[serde(rename = "type", default = "paragraph")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
    /// Image blocks only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

fn paragraph() -> String {
    "paragraph".to_string()
}

impl RichTextBlock {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            kind: paragraph(),
            text: text.into(),
            ..Default::default()
        }
    }
}

/// An inline style over `text[start..end]`, counted in characters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Plain text of all blocks joined by a single space
pub fn as_text(blocks: &[RichTextBlock]) -> String {
    blocks
        .iter()
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render blocks to HTML; consecutive list items share one list element
pub fn as_html(blocks: &[RichTextBlock]) -> String {
    let mut html = String::new();
    let mut list: Option<&'static str> = None;

    for block in blocks {
        let wanted = match block.kind.as_str() {
            "list-item" => Some("ul"),
            "o-list-item" => Some("ol"),
            _ => None,
        };
        if list != wanted {
            if let Some(tag) = list {
                html.push_str(&format!("</{}>", tag));
            }
            if let Some(tag) = wanted {
                html.push_str(&format!("<{}>", tag));
            }
            list = wanted;
        }

        let kind = block.kind.as_str();
        match kind {
            "heading1" | "heading2" | "heading3" | "heading4" | "heading5" | "heading6" => {
                let level = &kind["heading".len()..];
                html.push_str(&format!(
                    "<h{}>{}</h{}>",
                    level,
                    render_spans(&block.text, &block.spans, true),
                    level
                ));
            }
            "preformatted" => {
                html.push_str(&format!(
                    "<pre>{}</pre>",
                    render_spans(&block.text, &block.spans, false)
                ));
            }
            "list-item" | "o-list-item" => {
                html.push_str(&format!(
                    "<li>{}</li>",
                    render_spans(&block.text, &block.spans, true)
                ));
            }
            "image" => {
                if let Some(ref url) = block.url {
                    html.push_str(&format!(
                        r#"<p class="block-img"><img src="{}" alt="{}"></p>"#,
                        escape_html(url),
                        escape_html(block.alt.as_deref().unwrap_or(""))
                    ));
                }
            }
            _ => {
                html.push_str(&format!(
                    "<p>{}</p>",
                    render_spans(&block.text, &block.spans, true)
                ));
            }
        }
    }

    if let Some(tag) = list {
        html.push_str(&format!("</{}>", tag));
    }
    html
}

/// Render text with its spans; overlapping spans are closed and reopened
/// so the output stays well nested
fn render_spans(text: &str, spans: &[Span], line_breaks: bool) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut sorted: Vec<&Span> = spans
        .iter()
        .filter(|s| s.start < s.end && s.end <= chars.len())
        .collect();
    sorted.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut out = String::with_capacity(text.len());
    let mut open: Vec<&Span> = Vec::new();
    let mut pending = sorted.into_iter().peekable();

    for (i, c) in chars.iter().enumerate() {
        close_ended(&mut out, &mut open, i);
        while let Some(span) = pending.next_if(|s| s.start == i) {
            out.push_str(&open_tag(span));
            open.push(span);
        }
        match c {
            '\n' if line_breaks => out.push_str("<br />"),
            _ => out.push_str(&escape_html(c.encode_utf8(&mut [0; 4]))),
        }
    }
    close_ended(&mut out, &mut open, chars.len());
    out
}

fn close_ended<'a>(out: &mut String, open: &mut Vec<&'a Span>, pos: usize) {
    let Some(idx) = open.iter().position(|s| s.end <= pos) else {
        return;
    };
    let tail: Vec<&Span> = open.drain(idx..).collect();
    for span in tail.iter().rev() {
        out.push_str(close_tag(span));
    }
    for span in tail {
        if span.end > pos {
            out.push_str(&open_tag(span));
            open.push(span);
        }
    }
}

fn open_tag(span: &Span) -> String {
    let data = |key: &str| {
        span.data
            .as_ref()
            .and_then(|d| d.get(key))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };
    match span.kind.as_str() {
        "strong" => "<strong>".to_string(),
        "em" => "<em>".to_string(),
        "hyperlink" => {
            let href = data("url").unwrap_or_default();
            match data("target") {
                Some(target) => format!(
                    r#"<a href="{}" target="{}" rel="noopener">"#,
                    escape_html(&href),
                    escape_html(&target)
                ),
                None => format!(r#"<a href="{}">"#, escape_html(&href)),
            }
        }
        "label" => format!(
            r#"<span class="{}">"#,
            escape_html(&data("label").unwrap_or_default())
        ),
        _ => "<span>".to_string(),
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind.as_str() {
        "strong" => "</strong>",
        "em" => "</em>",
        "hyperlink" => "</a>",
        _ => "</span>",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn blocks(value: serde_json::Value) -> Vec<RichTextBlock> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_as_text_joins_with_space() {
        let body = blocks(json!([{"text": "Hello world."}, {"text": "Second block"}]));
        assert_eq!(as_text(&body), "Hello world. Second block");
        assert_eq!(as_text(&[]), "");
    }

    #[test]
    fn test_block_without_type_is_paragraph() {
        let body = blocks(json!([{"text": "plain"}]));
        assert_eq!(body[0].kind, "paragraph");
        assert_eq!(as_html(&body), "<p>plain</p>");
    }

    #[test]
    fn test_headings_lists_and_escaping() {
        let body = blocks(json!([
            {"type": "heading2", "text": "Title", "spans": []},
            {"type": "list-item", "text": "one", "spans": []},
            {"type": "list-item", "text": "two", "spans": []},
            {"type": "o-list-item", "text": "first", "spans": []},
            {"type": "paragraph", "text": "a < b & c", "spans": []}
        ]));
        assert_eq!(
            as_html(&body),
            "<h2>Title</h2><ul><li>one</li><li>two</li></ul><ol><li>first</li></ol><p>a &lt; b &amp; c</p>"
        );
    }

    #[test]
    fn test_spans() {
        let body = blocks(json!([{
            "type": "paragraph",
            "text": "Read the docs now",
            "spans": [
                {"start": 0, "end": 4, "type": "strong"},
                {"start": 5, "end": 13, "type": "hyperlink", "data": {"url": "https://docs.rs"}}
            ]
        }]));
        assert_eq!(
            as_html(&body),
            r#"<p><strong>Read</strong> <a href="https://docs.rs">the docs</a> now</p>"#
        );
    }

    #[test]
    fn test_overlapping_spans_stay_nested() {
        let body = blocks(json!([{
            "type": "paragraph",
            "text": "abcdef",
            "spans": [
                {"start": 0, "end": 4, "type": "strong"},
                {"start": 2, "end": 6, "type": "em"}
            ]
        }]));
        assert_eq!(
            as_html(&body),
            "<p><strong>ab<em>cd</em></strong><em>ef</em></p>"
        );
    }

    #[test]
    fn test_line_breaks_and_preformatted() {
        let body = blocks(json!([
            {"type": "paragraph", "text": "a\nb"},
            {"type": "preformatted", "text": "x\ny"}
        ]));
        assert_eq!(as_html(&body), "<p>a<br />b</p><pre>x\ny</pre>");
    }

    #[test]
    fn test_image_block() {
        let body = blocks(json!([{"type": "image", "url": "https://img/x.png", "alt": "X"}]));
        assert_eq!(
            as_html(&body),
            r#"<p class="block-img"><img src="https://img/x.png" alt="X"></p>"#
        );
    }
}
