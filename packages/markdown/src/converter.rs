use crate::html::{escape_html, tokenize, HtmlToken};

/// Markdown ⇄ HTML engine used by the bridge.
///
/// Implementations are free to normalise whitespace, but converting the
/// output of one direction back must reproduce the same document.
pub trait Converter {
    fn markdown_to_html(&self, markdown: &str) -> String;
    fn html_to_markdown(&self, html: &str) -> String;
}

/// Built-in converter for headings, paragraphs, images, links, strong,
/// emphasis and inline code.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicConverter;

struct Context {
    buffer: String,
}

impl Context {
    fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    fn add(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn add_escaped(&mut self, text: &str) {
        self.buffer.push_str(&escape_html(text));
    }

    fn end_block(&mut self) {
        self.buffer.push('\n');
    }

    fn get_output(mut self) -> String {
        while self.buffer.ends_with('\n') {
            self.buffer.pop();
        }
        self.buffer
    }
}

impl Converter for BasicConverter {
    fn markdown_to_html(&self, markdown: &str) -> String {
        let mut ctx = Context::new();

        for block in split_blocks(markdown) {
            let mut paragraph: Vec<&str> = Vec::new();
            for line in block {
                match heading(line) {
                    Some((level, text)) => {
                        flush_paragraph(&mut paragraph, &mut ctx);
                        ctx.add(&format!("<h{}>", level));
                        render_inline(text, &mut ctx);
                        ctx.add(&format!("</h{}>", level));
                        ctx.end_block();
                    }
                    None => paragraph.push(line),
                }
            }
            flush_paragraph(&mut paragraph, &mut ctx);
        }

        ctx.get_output()
    }

    fn html_to_markdown(&self, html: &str) -> String {
        let mut blocks: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut prefix = String::new();
        let mut in_block = false;
        let mut hrefs: Vec<String> = Vec::new();

        let flush = |current: &mut String, prefix: &mut String, blocks: &mut Vec<String>| {
            if !current.trim().is_empty() {
                blocks.push(format!("{}{}", prefix, current));
            }
            current.clear();
            prefix.clear();
        };

        for token in tokenize(html) {
            match token {
                HtmlToken::Open { name, attrs } => match name.as_str() {
                    "p" => {
                        flush(&mut current, &mut prefix, &mut blocks);
                        in_block = true;
                    }
                    "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                        flush(&mut current, &mut prefix, &mut blocks);
                        let level = name[1..].parse::<usize>().unwrap_or(1);
                        prefix = format!("{} ", "#".repeat(level));
                        in_block = true;
                    }
                    "strong" | "b" => current.push_str("**"),
                    "em" | "i" => current.push('*'),
                    "code" => current.push('`'),
                    "br" => current.push('\n'),
                    "a" => {
                        hrefs.push(attr(&attrs, "href").unwrap_or_default());
                        current.push('[');
                    }
                    "img" => {
                        let alt = attr(&attrs, "alt").unwrap_or_default();
                        let src = attr(&attrs, "src").unwrap_or_default();
                        current.push_str(&format!("![{}]({})", alt, src));
                    }
                    _ => {}
                },
                HtmlToken::Close(name) => match name.as_str() {
                    "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                        flush(&mut current, &mut prefix, &mut blocks);
                        in_block = false;
                    }
                    "strong" | "b" => current.push_str("**"),
                    "em" | "i" => current.push('*'),
                    "code" => current.push('`'),
                    "a" => {
                        let href = hrefs.pop().unwrap_or_default();
                        current.push_str(&format!("]({})", href));
                    }
                    _ => {}
                },
                HtmlToken::Text(text) => {
                    if !in_block && text.trim().is_empty() {
                        continue;
                    }
                    current.push_str(&text);
                }
            }
        }
        flush(&mut current, &mut prefix, &mut blocks);

        blocks.join("\n\n")
    }
}

fn attr(attrs: &[(String, String)], key: &str) -> Option<String> {
    attrs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
}

/// Runs of non-blank lines
fn split_blocks(markdown: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in markdown.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

/// `#`..`######` followed by a space
fn heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    line[level..]
        .strip_prefix(' ')
        .map(|text| (level, text.trim()))
}

fn flush_paragraph(lines: &mut Vec<&str>, ctx: &mut Context) {
    if lines.is_empty() {
        return;
    }
    ctx.add("<p>");
    render_inline(&lines.join("\n"), ctx);
    ctx.add("</p>");
    ctx.end_block();
    lines.clear();
}

/// `[label](target)` at the start of `text`: (label, target, consumed bytes)
fn parse_link(text: &str) -> Option<(&str, &str, usize)> {
    let close = text.find("](")?;
    let label = &text[1..close];
    if label.contains('[') || label.contains('\n') {
        return None;
    }
    let after = &text[close + 2..];
    let end = after.find(')')?;
    let target = &after[..end];
    if target.is_empty() || target.contains(char::is_whitespace) {
        return None;
    }
    Some((label, target, close + 2 + end + 1))
}

fn render_inline(text: &str, ctx: &mut Context) {
    let mut rest = text;

    while let Some(ch) = rest.chars().next() {
        if rest.starts_with("![") {
            if let Some((alt, src, len)) = parse_link(&rest[1..]) {
                ctx.add("<img src=\"");
                ctx.add_escaped(src);
                ctx.add("\" alt=\"");
                ctx.add_escaped(alt);
                ctx.add("\">");
                rest = &rest[1 + len..];
                continue;
            }
        }
        if ch == '[' {
            if let Some((label, href, len)) = parse_link(rest) {
                ctx.add("<a href=\"");
                ctx.add_escaped(href);
                ctx.add("\">");
                render_inline(label, ctx);
                ctx.add("</a>");
                rest = &rest[len..];
                continue;
            }
        }
        if let Some(inner) = rest.strip_prefix("**") {
            if let Some(end) = inner.find("**").filter(|end| *end > 0) {
                ctx.add("<strong>");
                render_inline(&inner[..end], ctx);
                ctx.add("</strong>");
                rest = &inner[end + 2..];
                continue;
            }
        }
        if let Some(inner) = rest.strip_prefix('*') {
            if let Some(end) = inner.find('*').filter(|end| *end > 0) {
                ctx.add("<em>");
                render_inline(&inner[..end], ctx);
                ctx.add("</em>");
                rest = &inner[end + 1..];
                continue;
            }
        }
        if let Some(inner) = rest.strip_prefix('`') {
            if let Some(end) = inner.find('`') {
                ctx.add("<code>");
                ctx.add_escaped(&inner[..end]);
                ctx.add("</code>");
                rest = &inner[end + 1..];
                continue;
            }
        }

        let mut buf = [0u8; 4];
        ctx.add_escaped(ch.encode_utf8(&mut buf));
        rest = &rest[ch.len_utf8()..];
    }
}
