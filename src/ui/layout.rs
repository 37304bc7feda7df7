//! Word wrapping for styled lines and cursor placement in the composer.
//!
//! Wrapping is done up front so the renderer knows the exact row count for
//! scrolling, and then drawn with a non-wrapping `Paragraph`.

use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Wrap a styled line to `width` columns, breaking at spaces where possible
/// and splitting words that are wider than a whole row.
pub fn wrap_line(line: &Line<'_>, width: usize) -> Vec<Line<'static>> {
    let width = width.max(1);
    let mut rows: Vec<Vec<Span<'static>>> = vec![Vec::new()];
    let mut row_width = 0usize;

    for span in &line.spans {
        for token in split_keep_spaces(&span.content) {
            let token_width = UnicodeWidthStr::width(token);
            let is_space = token.starts_with(' ');

            if row_width + token_width <= width {
                push_piece(&mut rows, token, span.style);
                row_width += token_width;
                continue;
            }
            if is_space {
                // Spaces at a wrap point are dropped.
                rows.push(Vec::new());
                row_width = 0;
                continue;
            }
            if token_width <= width && row_width > 0 {
                rows.push(Vec::new());
                push_piece(&mut rows, token, span.style);
                row_width = token_width;
                continue;
            }
            // Hard-split a word wider than the remaining row.
            for ch in token.chars() {
                let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
                if row_width + ch_width > width && row_width > 0 {
                    rows.push(Vec::new());
                    row_width = 0;
                }
                let mut buf = [0u8; 4];
                push_piece(&mut rows, ch.encode_utf8(&mut buf), span.style);
                row_width += ch_width;
            }
        }
    }

    rows.into_iter()
        .map(|mut row| {
            trim_row_end(&mut row);
            Line::from(row)
        })
        .collect()
}

pub fn wrap_lines(lines: &[Line<'_>], width: usize) -> Vec<Line<'static>> {
    lines.iter().flat_map(|line| wrap_line(line, width)).collect()
}

fn push_piece(rows: &mut [Vec<Span<'static>>], text: &str, style: ratatui::style::Style) {
    let Some(row) = rows.last_mut() else {
        return;
    };
    if let Some(last) = row.last_mut() {
        if last.style == style {
            last.content.to_mut().push_str(text);
            return;
        }
    }
    row.push(Span::styled(text.to_string(), style));
}

fn trim_row_end(row: &mut Vec<Span<'static>>) {
    while let Some(last) = row.last_mut() {
        let trimmed_len = last.content.trim_end_matches(' ').len();
        if trimmed_len > 0 {
            last.content.to_mut().truncate(trimmed_len);
            return;
        }
        row.pop();
    }
}

/// Split into alternating runs of spaces and non-spaces.
fn split_keep_spaces(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_space = None;
    for (i, ch) in s.char_indices() {
        let space = ch == ' ';
        match in_space {
            Some(prev) if prev != space => {
                out.push(&s[start..i]);
                start = i;
            }
            _ => {}
        }
        in_space = Some(space);
    }
    if start < s.len() {
        out.push(&s[start..]);
    }
    out
}

/// Hard-wrap composer text into rows of at most `width` columns.
pub fn wrap_input(input: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = vec![String::new()];
    let mut row_width = 0;
    for ch in input.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if row_width + ch_width > width && row_width > 0 {
            rows.push(String::new());
            row_width = 0;
        }
        if let Some(row) = rows.last_mut() {
            row.push(ch);
        }
        row_width += ch_width;
    }
    rows
}

/// Row and column of the composer cursor (a character index) after wrapping.
pub fn input_cursor_position(input: &str, cursor: usize, width: usize) -> (u16, u16) {
    let width = width.max(1);
    let (mut row, mut col) = (0usize, 0usize);
    for ch in input.chars().take(cursor) {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if col + ch_width > width && col > 0 {
            row += 1;
            col = 0;
        }
        col += ch_width;
    }
    // A cursor sitting past a full row moves to the start of the next one.
    if col >= width {
        row += 1;
        col = 0;
    }
    (row as u16, col as u16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::{Modifier, Style};

    fn texts(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn wraps_at_word_boundaries() {
        let line = Line::from("the quick brown fox");
        assert_eq!(texts(&wrap_line(&line, 10)), vec!["the quick", "brown fox"]);
    }

    #[test]
    fn splits_words_longer_than_width() {
        let line = Line::from("abcdefghij xy");
        assert_eq!(texts(&wrap_line(&line, 4)), vec!["abcd", "efgh", "ij", "xy"]);
    }

    #[test]
    fn preserves_styles_across_wraps() {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let line = Line::from(vec![Span::raw("one "), Span::styled("two three", bold)]);
        let rows = wrap_line(&line, 8);
        assert_eq!(texts(&rows), vec!["one two", "three"]);
        assert_eq!(rows[1].spans[0].style, bold);
    }

    #[test]
    fn counts_wide_characters() {
        let line = Line::from("日本語 テキスト");
        assert_eq!(texts(&wrap_line(&line, 6)), vec!["日本語", "テキス", "ト"]);
    }

    #[test]
    fn empty_line_stays_one_row() {
        assert_eq!(wrap_line(&Line::default(), 10).len(), 1);
    }

    #[test]
    fn input_wraps_and_cursor_follows() {
        assert_eq!(wrap_input("abcdefg", 3), vec!["abc", "def", "g"]);
        assert_eq!(input_cursor_position("abcdefg", 0, 3), (0, 0));
        assert_eq!(input_cursor_position("abcdefg", 4, 3), (1, 1));
        assert_eq!(input_cursor_position("abc", 3, 3), (1, 0));
        assert_eq!(input_cursor_position("", 0, 3), (0, 0));
    }
}
