//! Parsing options and configuration.

/// Default nesting limit for parsed documents.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Options for parsing source documents.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Apply Unicode NFC normalization to text
    pub normalize_unicode: bool,

    /// Deepest accepted nesting of HTML elements or Markdown containers
    /// (block quotes, lists, list items)
    pub max_depth: usize,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable strict mode (reject markup the HTML tokenizer had to repair).
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Enable lenient mode (repair malformed markup and continue).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Enable or disable Unicode normalization.
    pub fn with_unicode_normalization(mut self, normalize: bool) -> Self {
        self.normalize_unicode = normalize;
        self
    }

    /// Set the nesting limit. Deeper input fails to parse.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Lenient,
            normalize_unicode: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Error handling mode during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any markup error
    Strict,
    /// Repair what can be repaired and continue
    #[default]
    Lenient,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_builder() {
        let options = ParseOptions::new()
            .strict()
            .with_unicode_normalization(false)
            .with_max_depth(8);

        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert!(!options.normalize_unicode);
        assert_eq!(options.max_depth, 8);
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert!(options.normalize_unicode);
        assert_eq!(options.max_depth, 256);
    }
}
