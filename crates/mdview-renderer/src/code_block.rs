//! Code block processor trait for intercepting fenced code blocks.
//!
//! Processors are registered with the renderer and consulted in order when a
//! fenced code block with a language tag closes. The first processor returning
//! something other than [`ProcessResult::PassThrough`] wins; otherwise the
//! backend's `code_block` rule renders the block.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use mdview_renderer::{CodeBlockProcessor, ExtractedCodeBlock, ProcessResult};
//!
//! struct ChartProcessor {
//!     extracted: Vec<ExtractedCodeBlock>,
//! }
//!
//! impl CodeBlockProcessor for ChartProcessor {
//!     fn process(
//!         &mut self,
//!         language: &str,
//!         attrs: &HashMap<String, String>,
//!         source: &str,
//!         index: usize,
//!     ) -> ProcessResult {
//!         if language != "chart" {
//!             return ProcessResult::PassThrough;
//!         }
//!         self.extracted.push(ExtractedCodeBlock {
//!             index,
//!             language: language.to_owned(),
//!             source: source.to_owned(),
//!             attrs: attrs.clone(),
//!         });
//!         ProcessResult::Inline(format!(r#"<div class="chart">{source}</div>"#))
//!     }
//!
//!     fn extracted(&self) -> &[ExtractedCodeBlock] {
//!         &self.extracted
//!     }
//! }
//! ```

use std::collections::HashMap;

/// Result of processing a code block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessResult {
    /// Replace code block with HTML immediately.
    Inline(String),

    /// Not handled here; render as a regular code block.
    PassThrough,
}

/// Code block captured by a processor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedCodeBlock {
    /// Zero-based index of this code block in the document.
    pub index: usize,
    /// Language identifier from the fence (e.g., "mermaid").
    pub language: String,
    /// Raw source content of the code block.
    pub source: String,
    /// Attributes parsed from the fence (e.g., `theme=dark` → {"theme": "dark"}).
    pub attrs: HashMap<String, String>,
}

/// Trait for processing special code blocks.
pub trait CodeBlockProcessor {
    /// Process a code block and return the result.
    ///
    /// # Arguments
    ///
    /// * `language` - Language identifier from fence info string
    /// * `attrs` - Attributes parsed from fence (key=value pairs)
    /// * `source` - Raw content of the code block, final newline removed
    /// * `index` - Zero-based code block index within the document
    fn process(
        &mut self,
        language: &str,
        attrs: &HashMap<String, String>,
        source: &str,
        index: usize,
    ) -> ProcessResult;

    /// Blocks this processor claimed during rendering.
    fn extracted(&self) -> &[ExtractedCodeBlock] {
        &[]
    }

    /// Warnings generated during processing.
    fn warnings(&self) -> &[String] {
        &[]
    }
}

/// Parse fence info string into language and attributes.
///
/// Format: `language [key=value ...]`
#[must_use]
pub(crate) fn parse_fence_info(info: &str) -> (String, HashMap<String, String>) {
    let mut parts = info.split_whitespace();
    let language = parts.next().unwrap_or("").to_owned();

    let mut attrs = HashMap::new();
    for part in parts {
        if let Some((key, value)) = part.split_once('=') {
            let value = value.trim_matches('"').trim_matches('\'');
            attrs.insert(key.to_owned(), value.to_owned());
        }
    }

    (language, attrs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fence_info_language_only() {
        let (lang, attrs) = parse_fence_info("mermaid");
        assert_eq!(lang, "mermaid");
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_parse_fence_info_with_attrs() {
        let (lang, attrs) = parse_fence_info("js title='app.js' linenos=true");
        assert_eq!(lang, "js");
        assert_eq!(attrs.get("title"), Some(&"app.js".to_owned()));
        assert_eq!(attrs.get("linenos"), Some(&"true".to_owned()));
    }

    #[test]
    fn test_parse_fence_info_ignores_bare_words() {
        let (lang, attrs) = parse_fence_info("python {.numberLines}");
        assert_eq!(lang, "python");
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_parse_fence_info_whitespace_only() {
        let (lang, attrs) = parse_fence_info("   ");
        assert_eq!(lang, "");
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_default_trait_implementations() {
        struct Ignore;

        impl CodeBlockProcessor for Ignore {
            fn process(
                &mut self,
                _language: &str,
                _attrs: &HashMap<String, String>,
                _source: &str,
                _index: usize,
            ) -> ProcessResult {
                ProcessResult::PassThrough
            }
        }

        let processor = Ignore;
        assert!(processor.extracted().is_empty());
        assert!(processor.warnings().is_empty());
    }
}
