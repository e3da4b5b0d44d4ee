//! Minimal HTML reading for the converter's own output and the editor's
//! rich-text view. Not a general-purpose parser.

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HtmlToken {
    Open {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Close(String),
    Text(String),
}

pub(crate) fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub(crate) fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Splits `html` into tags and text. Comments and doctypes are skipped.
/// Tag and attribute names are lower-cased; values are entity-decoded.
pub(crate) fn tokenize(html: &str) -> Vec<HtmlToken> {
    let mut tokens = Vec::new();
    let mut rest = html;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("<!--") {
            rest = match after.find("-->") {
                Some(end) => &after[end + 3..],
                None => "",
            };
            continue;
        }

        if rest.starts_with('<') {
            if let Some(end) = rest.find('>') {
                let tag = &rest[1..end];
                rest = &rest[end + 1..];
                if let Some(token) = parse_tag(tag) {
                    tokens.push(token);
                }
                continue;
            }
        }

        let end = rest
            .char_indices()
            .skip(1)
            .find(|(_, c)| *c == '<')
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        tokens.push(HtmlToken::Text(decode_entities(&rest[..end])));
        rest = &rest[end..];
    }

    tokens
}

fn parse_tag(tag: &str) -> Option<HtmlToken> {
    if tag.starts_with('!') || tag.starts_with('?') {
        return None;
    }
    if let Some(name) = tag.strip_prefix('/') {
        return Some(HtmlToken::Close(name.trim().to_ascii_lowercase()));
    }

    let tag = tag.trim_end_matches('/').trim();
    let name_end = tag.find(char::is_whitespace).unwrap_or(tag.len());
    let name = tag[..name_end].to_ascii_lowercase();
    if name.is_empty() {
        return None;
    }

    Some(HtmlToken::Open {
        name,
        attrs: parse_attrs(&tag[name_end..]),
    })
}

fn parse_attrs(mut rest: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        let key_end = rest
            .find(|c: char| c == '=' || c.is_whitespace())
            .unwrap_or(rest.len());
        let key = rest[..key_end].to_ascii_lowercase();
        rest = rest[key_end..].trim_start();

        let value = match rest.strip_prefix('=') {
            Some(after) => {
                let after = after.trim_start();
                match after.chars().next() {
                    Some(quote @ ('"' | '\'')) => {
                        let body = &after[1..];
                        let end = body.find(quote).unwrap_or(body.len());
                        rest = body.get(end + 1..).unwrap_or("");
                        decode_entities(&body[..end])
                    }
                    _ => {
                        let end = after.find(char::is_whitespace).unwrap_or(after.len());
                        rest = &after[end..];
                        decode_entities(&after[..end])
                    }
                }
            }
            None => String::new(),
        };

        if !key.is_empty() {
            attrs.push((key, value));
        }
    }

    attrs
}
