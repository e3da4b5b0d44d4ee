use chroma_assets::{AssetId, HANDLE_SCHEME};
use regex::{Captures, Regex};
use std::ops::Range;
use std::sync::OnceLock;

/// Scheme of asset references in storage-form markdown (`image:<id>`)
pub const IMAGE_SCHEME: &str = "image:";

fn link_target_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\]\(([^)\s]+)\)").expect("valid link regex"))
}

fn html_source_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\b(src|href)="([^"]*)""#).expect("valid attribute regex"))
}

fn handle_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"{}[0-9]+/[0-9a-f]+", regex::escape(HANDLE_SCHEME)))
            .expect("valid handle regex")
    })
}

/// Byte ranges of inline code spans, backticks included.
///
/// Spans never cross a blank line, matching how paragraphs are rendered.
fn code_spans(markdown: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = 0;

    while let Some(open) = markdown[start..].find('`').map(|i| start + i) {
        let Some(close) = markdown[open + 1..].find('`').map(|i| open + 1 + i) else {
            break;
        };
        if crosses_blank_line(&markdown[open..=close]) {
            start = open + 1;
            continue;
        }
        spans.push(open..close + 1);
        start = close + 1;
    }

    spans
}

fn crosses_blank_line(text: &str) -> bool {
    let lines: Vec<&str> = text.split('\n').collect();
    lines.len() > 2 && lines[1..lines.len() - 1].iter().any(|l| l.trim().is_empty())
}

fn in_code_span(spans: &[Range<usize>], offset: usize) -> bool {
    spans.iter().any(|span| span.contains(&offset))
}

pub fn image_reference(id: &AssetId) -> String {
    format!("{}{}", IMAGE_SCHEME, id)
}

/// Id behind an `image:<id>` target, if it is one
pub fn parse_image_reference(target: &str) -> Option<AssetId> {
    target
        .strip_prefix(IMAGE_SCHEME)
        .and_then(|id| AssetId::parse(id).ok())
}

/// Every distinct asset id referenced by `markdown`, in first-seen order.
/// Text inside code spans is not a reference.
pub fn storage_references(markdown: &str) -> Vec<AssetId> {
    let spans = code_spans(markdown);
    let mut ids: Vec<AssetId> = Vec::new();
    for caps in link_target_regex().captures_iter(markdown) {
        if in_code_span(&spans, caps.get(0).map_or(0, |m| m.start())) {
            continue;
        }
        if let Some(id) = parse_image_reference(&caps[1]) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    ids
}

/// Rewrites markdown link/image targets outside code spans. `rewrite`
/// returns `None` to keep a target as written.
pub fn rewrite_link_targets<F>(markdown: &str, mut rewrite: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let spans = code_spans(markdown);
    link_target_regex()
        .replace_all(markdown, |caps: &Captures| {
            if in_code_span(&spans, caps.get(0).map_or(0, |m| m.start())) {
                return caps[0].to_string();
            }
            match rewrite(&caps[1]) {
                Some(target) => format!("]({})", target),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Handle-shaped strings anywhere in `text`, in order of appearance
pub fn find_handles(text: &str) -> Vec<&str> {
    handle_regex().find_iter(text).map(|m| m.as_str()).collect()
}

/// Rewrites `src="…"` and `href="…"` attribute values in HTML
pub fn rewrite_html_sources<F>(html: &str, mut rewrite: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    html_source_regex()
        .replace_all(html, |caps: &Captures| match rewrite(&caps[2]) {
            Some(value) => format!("{}=\"{}\"", &caps[1], value),
            None => caps[0].to_string(),
        })
        .into_owned()
}
