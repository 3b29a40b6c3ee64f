//! Decoder types
//!
//! Options controlling how CSV rows are decoded.

/// What to do with a row that has fewer fields than the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShortRowPolicy {
    /// Only map the columns that are present
    #[default]
    Omit,
    /// Map missing trailing columns to empty strings
    FillEmpty,
}

/// Configuration for decoding CSV
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvOptions {
    /// Field delimiter; sniffed from the header line when unset
    pub delimiter: Option<u8>,
    /// Quote character
    pub quote: u8,
    /// Handling of rows shorter than the header
    pub short_rows: ShortRowPolicy,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            quote: b'"',
            short_rows: ShortRowPolicy::default(),
        }
    }
}

impl CsvOptions {
    /// Create default options (sniffed delimiter, `"` quotes, short rows kept short)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a fixed delimiter
    #[must_use]
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Set the quote character
    #[must_use]
    pub fn quote(mut self, quote: u8) -> Self {
        self.quote = quote;
        self
    }

    /// Set the short row policy
    #[must_use]
    pub fn short_rows(mut self, policy: ShortRowPolicy) -> Self {
        self.short_rows = policy;
        self
    }
}
