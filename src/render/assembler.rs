//! Joining reconciled pages into one document text.

/// Separator placed between pages: a blank line.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Concatenates per-page texts in page order.
#[derive(Debug, Clone)]
pub struct PageAssembler {
    separator: String,
    skip_empty: bool,
}

impl PageAssembler {
    /// Create an assembler using a blank line between pages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page separator.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Leave out pages whose text is blank.
    pub fn skip_empty_pages(mut self, skip: bool) -> Self {
        self.skip_empty = skip;
        self
    }

    /// Page separator.
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Join page texts, given in page order.
    pub fn assemble<I, S>(&self, pages: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut output = String::new();
        let mut first = true;
        for page in pages {
            let text = page.as_ref();
            if self.skip_empty && text.trim().is_empty() {
                continue;
            }
            if !first {
                output.push_str(&self.separator);
            }
            output.push_str(text);
            first = false;
        }
        output
    }
}

impl Default for PageAssembler {
    fn default() -> Self {
        Self {
            separator: PAGE_SEPARATOR.to_string(),
            skip_empty: false,
        }
    }
}
