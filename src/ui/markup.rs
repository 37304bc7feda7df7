//! Render stored message markup as styled terminal lines.
//!
//! Assistant replies are stored as the small HTML subset produced by
//! [`crate::core::markup::format_markdown_to_html`]: `<b>` runs, `</br>`
//! breaks, and the `<div role="alert">` wrapper of the server error bubble.
//! Any other tag is dropped and its text kept. Common entities are decoded.

use ratatui::style::Style;
use ratatui::text::{Line, Span};

/// A parsed tag, lowercased and without attributes.
#[derive(Debug, PartialEq, Eq)]
enum Tag<'a> {
    Open(&'a str),
    Close(&'a str),
}

pub fn markup_to_lines(markup: &str, base: Style, bold: Style) -> Vec<Line<'static>> {
    let mut builder = LineBuilder::new(base, bold);
    let mut rest = markup;

    while !rest.is_empty() {
        let Some(lt) = rest.find('<') else {
            builder.push_text(rest);
            break;
        };
        builder.push_text(&rest[..lt]);
        let after = &rest[lt..];
        match parse_tag(after) {
            Some((tag, consumed)) => {
                builder.apply_tag(&tag);
                rest = &after[consumed..];
            }
            None => {
                builder.push_text("<");
                rest = &after[1..];
            }
        }
    }

    builder.finish()
}

/// Plain text with no markup interpretation, split on newlines.
pub fn plain_lines(text: &str, style: Style) -> Vec<Line<'static>> {
    text.split('\n')
        .map(|line| Line::from(Span::styled(line.to_string(), style)))
        .collect()
}

struct LineBuilder {
    base: Style,
    bold: Style,
    bold_depth: usize,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
}

impl LineBuilder {
    fn new(base: Style, bold: Style) -> Self {
        Self {
            base,
            bold,
            bold_depth: 0,
            lines: Vec::new(),
            current: Vec::new(),
        }
    }

    fn style(&self) -> Style {
        if self.bold_depth > 0 {
            self.base.patch(self.bold)
        } else {
            self.base
        }
    }

    fn push_text(&mut self, raw: &str) {
        let decoded = decode_entities(raw);
        let mut parts = decoded.split('\n');
        if let Some(first) = parts.next() {
            self.push_run(first);
        }
        for part in parts {
            self.break_line();
            self.push_run(part);
        }
    }

    fn push_run(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let style = self.style();
        // Merge with the previous span when the style is unchanged.
        if let Some(last) = self.current.last_mut() {
            if last.style == style {
                last.content.to_mut().push_str(text);
                return;
            }
        }
        self.current.push(Span::styled(text.to_string(), style));
    }

    fn break_line(&mut self) {
        let spans = std::mem::take(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    fn apply_tag(&mut self, tag: &Tag<'_>) {
        match tag {
            Tag::Open("b") | Tag::Open("strong") => self.bold_depth += 1,
            Tag::Close("b") | Tag::Close("strong") => {
                self.bold_depth = self.bold_depth.saturating_sub(1)
            }
            Tag::Open("br") | Tag::Close("br") => self.break_line(),
            Tag::Open("div") | Tag::Open("p") | Tag::Close("div") | Tag::Close("p") => {
                if !self.current.is_empty() {
                    self.break_line();
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        if !self.current.is_empty() || self.lines.is_empty() {
            self.break_line();
        }
        self.lines
    }
}

/// Parse a tag at the start of `s`, returning it and the bytes consumed.
fn parse_tag(s: &str) -> Option<(Tag<'_>, usize)> {
    let end = s.find('>')?;
    let inner = s[1..end].trim();
    let (closing, body) = match inner.strip_prefix('/') {
        Some(body) => (true, body.trim_start()),
        None => (false, inner),
    };
    let name_len = body
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(body.len());
    if name_len == 0 || !body.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let name = &body[..name_len];
    let known = ["b", "strong", "br", "div", "p", "span", "i", "em"];
    let name = known.iter().find(|k| k.eq_ignore_ascii_case(name)).copied();
    let tag = match (closing, name) {
        (true, Some(name)) => Tag::Close(name),
        (false, Some(name)) => Tag::Open(name),
        (true, None) => Tag::Close(""),
        (false, None) => Tag::Open(""),
    };
    Some((tag, end + 1))
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').filter(|&semi| semi <= 8).and_then(|semi| {
            let ch = match &tail[1..semi] {
                "amp" => '&',
                "lt" => '<',
                "gt" => '>',
                "quot" => '"',
                "#39" | "apos" => '\'',
                "nbsp" => ' ',
                _ => return None,
            };
            Some((ch, semi + 1))
        });
        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
