//! Fixed-width text layout
//!
//! Receipt lines are measured in character cells (see [`text_width`]).
//! Nothing here knows about the device; the output is plain text.

use crate::encoding::text_width;
use std::str::SplitWhitespace;

/// Lazy word wrapper yielding one line per item (without the trailing newline)
///
/// Words are packed greedily onto a line while it stays within `width`.
/// A word is only broken when it alone is wider than the line; it is then
/// cut into `width`-sized pieces. Cloning the iterator restarts from the
/// clone's position.
#[derive(Debug, Clone)]
pub struct WordWrap<'a> {
    words: SplitWhitespace<'a>,
    pending: Option<&'a str>,
    width: usize,
}

impl<'a> WordWrap<'a> {
    pub fn new(text: &'a str, width: usize) -> Self {
        Self {
            words: text.split_whitespace(),
            pending: None,
            width: width.max(1),
        }
    }
}

impl Iterator for WordWrap<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let mut line = String::new();
        let mut len = 0;

        while let Some(word) = self.pending.take().or_else(|| self.words.next()) {
            let word_len = text_width(word);

            if len == 0 {
                if word_len <= self.width {
                    line.push_str(word);
                    len = word_len;
                    continue;
                }
                // Overlong word: emit a full-width piece, keep the rest
                let split = word
                    .char_indices()
                    .nth(self.width)
                    .map_or(word.len(), |(idx, _)| idx);
                let (head, tail) = word.split_at(split);
                if !tail.is_empty() {
                    self.pending = Some(tail);
                }
                return Some(head.to_string());
            }

            if len + 1 + word_len <= self.width {
                line.push(' ');
                line.push_str(word);
                len += 1 + word_len;
            } else {
                self.pending = Some(word);
                break;
            }
        }

        if line.is_empty() { None } else { Some(line) }
    }
}

/// Wrap text to `width` columns, every line terminated by `\n`
///
/// Text that already fits is returned unchanged with a newline appended.
pub fn wrap(text: &str, width: usize) -> String {
    if text_width(text) <= width {
        return format!("{}\n", text);
    }

    let mut out = String::with_capacity(text.len() + text.len() / width.max(1) + 1);
    for line in WordWrap::new(text, width) {
        out.push_str(&line);
        out.push('\n');
    }
    if out.is_empty() {
        out.push('\n');
    }
    out
}

/// Place `left` and `right` on one line of exactly `width` columns
///
/// When both do not fit (combined width >= `width`), `right` moves to a
/// second line, right-justified to `width`.
pub fn pad_align(left: &str, right: &str, width: usize) -> String {
    let lw = text_width(left);
    let rw = text_width(right);

    if lw + rw < width {
        format!("{}{}{}", left, " ".repeat(width - lw - rw), right)
    } else {
        format!("{}\n{:>width$}", left, right, width = width)
    }
}
