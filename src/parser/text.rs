//! Text helpers shared by the parsers.

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};
use crate::model::{InlineContent, TextRun, TextStyle};

const UTF8_BOM: &str = "\u{feff}";

/// Decode a payload as UTF-8, skipping a leading byte-order mark.
pub fn decode_utf8(bytes: &[u8]) -> Result<&str> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        Error::Parse(format!(
            "input is not valid UTF-8 (invalid byte at offset {})",
            e.valid_up_to()
        ))
    })?;
    Ok(text.strip_prefix(UTF8_BOM).unwrap_or(text))
}

/// Text normalization applied to every text run a parser emits.
pub struct TextNormalizer {
    normalize_unicode: bool,
    whitespace: Regex,
}

impl TextNormalizer {
    /// Create a normalizer. NFC normalization is applied when `normalize_unicode` is set.
    pub fn new(normalize_unicode: bool) -> Self {
        Self {
            normalize_unicode,
            whitespace: Regex::new(r"[ \t\r\n\x0C]+").expect("whitespace pattern is valid"),
        }
    }

    /// Apply Unicode normalization (if enabled).
    pub fn normalize(&self, text: &str) -> String {
        if self.normalize_unicode {
            text.nfc().collect()
        } else {
            text.to_string()
        }
    }

    /// Collapse runs of HTML whitespace into single spaces, then normalize.
    pub fn collapse(&self, text: &str) -> String {
        let collapsed = self.whitespace.replace_all(text, " ");
        self.normalize(&collapsed)
    }
}

/// Push a text run, merging it into the previous run when the styles match.
pub fn push_run(content: &mut Vec<InlineContent>, text: &str, style: TextStyle) {
    if text.is_empty() {
        return;
    }
    if let Some(InlineContent::Text(last)) = content.last_mut() {
        if last.style == style {
            last.text.push_str(text);
            return;
        }
    }
    content.push(InlineContent::Text(TextRun::styled(text, style)));
}

/// Trim leading whitespace of the first run and trailing whitespace of the last,
/// and drop runs left empty. Whitespace around line breaks is removed too.
pub fn trim_inline(content: &mut Vec<InlineContent>) {
    let len = content.len();
    for i in 0..len {
        let after_break = i == 0 || matches!(content[i - 1], InlineContent::LineBreak);
        let before_break = i + 1 == len || matches!(content[i + 1], InlineContent::LineBreak);
        if let InlineContent::Text(run) = &mut content[i] {
            if after_break {
                run.text = run.text.trim_start().to_string();
            }
            if before_break {
                run.text = run.text.trim_end().to_string();
            }
        }
    }
    content.retain(|c| !matches!(c, InlineContent::Text(run) if run.text.is_empty()));

    // Runs emptied above may have exposed new edges.
    loop {
        let drop_last = match content.last() {
            Some(InlineContent::LineBreak) => true,
            Some(InlineContent::Text(run)) => run.text.trim_end().is_empty(),
            _ => false,
        };
        if !drop_last {
            break;
        }
        content.pop();
    }
    if let Some(InlineContent::Text(run)) = content.last_mut() {
        let trimmed = run.text.trim_end().len();
        run.text.truncate(trimmed);
    }
    while matches!(content.first(), Some(InlineContent::LineBreak)) {
        content.remove(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode_utf8(b"\xEF\xBB\xBFhello").unwrap(), "hello");
        assert!(matches!(decode_utf8(&[0x61, 0xFF]), Err(Error::Parse(_))));
    }

    #[test]
    fn test_collapse_whitespace() {
        let normalizer = TextNormalizer::new(true);
        assert_eq!(normalizer.collapse("a \n\t  b"), "a b");
        // NFC composes e + combining acute
        assert_eq!(normalizer.normalize("e\u{301}"), "\u{e9}");
        assert_eq!(TextNormalizer::new(false).normalize("e\u{301}"), "e\u{301}");
    }

    #[test]
    fn test_push_run_merges() {
        let mut content = Vec::new();
        push_run(&mut content, "a", TextStyle::default());
        push_run(&mut content, "b", TextStyle::default());
        push_run(
            &mut content,
            "c",
            TextStyle {
                bold: true,
                ..Default::default()
            },
        );
        assert_eq!(content.len(), 2);
        assert!(matches!(&content[0], InlineContent::Text(run) if run.text == "ab"));
    }

    #[test]
    fn test_trim_inline() {
        let mut content = vec![
            InlineContent::Text(TextRun::new("  hello ")),
            InlineContent::LineBreak,
            InlineContent::Text(TextRun::new(" world  ")),
            InlineContent::Text(TextRun::bold(" ")),
        ];
        trim_inline(&mut content);
        assert_eq!(crate::model::plain_text(&content), "hello\nworld");
    }
}
