//! Code block processor for the diagram language.
//!
//! This module provides [`DiagramProcessor`], which implements the
//! [`CodeBlockProcessor`] trait to turn diagram fences into activation
//! containers during rendering.

use std::collections::HashMap;

use mdview_renderer::{CodeBlockProcessor, ExtractedCodeBlock, ProcessResult};

use crate::consts::{CONTAINER_CLASS, DEFAULT_LANGUAGE, ID_PREFIX};

/// Id of the `ordinal`-th diagram container in a document.
#[must_use]
pub fn container_id(ordinal: usize) -> String {
    format!("{ID_PREFIX}{ordinal}")
}

/// Code block processor for the diagram language.
///
/// Claims fenced blocks whose language equals the reserved identifier and
/// replaces each with
/// `<div class="mermaid my-3" data-diagram-id="diagram-{n}">{raw}</div>`.
/// The source is inserted without escaping: the diagram engine reads it as
/// text after mount and does its own parsing.
///
/// Every other block passes through to the backend's code block rule.
///
/// # Example
///
/// ```
/// use mdview_diagrams::DiagramProcessor;
/// use mdview_renderer::{HtmlBackend, MarkdownRenderer, parse};
///
/// let markdown = "```mermaid\ngraph TD\n A-->B\n```";
/// let mut renderer = MarkdownRenderer::<HtmlBackend>::new()
///     .with_processor(DiagramProcessor::new());
/// let result = renderer.render(parse(markdown, true));
/// assert_eq!(
///     result.html,
///     "<div class=\"mermaid my-3\" data-diagram-id=\"diagram-0\">graph TD\n A-->B</div>"
/// );
/// ```
pub struct DiagramProcessor {
    /// Fence language that marks a diagram.
    language: String,
    /// Diagram blocks in document order.
    extracted: Vec<ExtractedCodeBlock>,
    warnings: Vec<String>,
}

impl Default for DiagramProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagramProcessor {
    /// Create a processor for the default `mermaid` language.
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_owned(),
            extracted: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Reserve a different fence language for diagrams.
    ///
    /// Matching is exact and case-sensitive.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

impl CodeBlockProcessor for DiagramProcessor {
    fn process(
        &mut self,
        language: &str,
        attrs: &HashMap<String, String>,
        source: &str,
        index: usize,
    ) -> ProcessResult {
        if language != self.language {
            return ProcessResult::PassThrough;
        }

        let id = container_id(self.extracted.len());
        if !attrs.is_empty() {
            let mut keys: Vec<&str> = attrs.keys().map(String::as_str).collect();
            keys.sort_unstable();
            self.warnings.push(format!(
                "{id}: fence attributes are not supported on diagrams and were ignored: {}",
                keys.join(", ")
            ));
        }

        self.extracted.push(ExtractedCodeBlock {
            index,
            language: language.to_owned(),
            source: source.to_owned(),
            attrs: attrs.clone(),
        });

        ProcessResult::Inline(format!(
            r#"<div class="{CONTAINER_CLASS}" data-diagram-id="{id}">{source}</div>"#
        ))
    }

    fn extracted(&self) -> &[ExtractedCodeBlock] {
        &self.extracted
    }

    fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdview_renderer::{HtmlBackend, MarkdownRenderer, parse};
    use pretty_assertions::assert_eq;

    fn render(markdown: &str, processor: DiagramProcessor) -> (String, Vec<ExtractedCodeBlock>, Vec<String>) {
        let mut renderer = MarkdownRenderer::<HtmlBackend>::new().with_processor(processor);
        let html = renderer.render(parse(markdown, true)).html;
        (html, renderer.extracted_code_blocks(), renderer.processor_warnings())
    }

    #[test]
    fn test_mermaid_block_becomes_container() {
        let (html, extracted, warnings) =
            render("```mermaid\ngraph TD\n A-->B\n```", DiagramProcessor::new());

        assert_eq!(
            html,
            "<div class=\"mermaid my-3\" data-diagram-id=\"diagram-0\">graph TD\n A-->B</div>"
        );
        assert!(!html.contains("<pre"));
        assert!(!html.contains("<code"));
        assert_eq!(extracted.len(), 1);
        assert_eq!(extracted[0].source, "graph TD\n A-->B");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_source_is_not_escaped() {
        let (html, _, _) = render(
            "```mermaid\nA[\"x & y\"] --> B\n```",
            DiagramProcessor::new(),
        );
        assert!(html.contains(r#"A["x & y"] --> B"#));
    }

    #[test]
    fn test_other_languages_pass_through() {
        let (html, extracted, _) = render("```js\nconst a = 1 < 2;\n```", DiagramProcessor::new());

        assert!(html.contains("const a = 1 &lt; 2;"));
        assert!(html.contains(r#"<code class="language-js">"#));
        assert!(!html.contains("data-diagram-id"));
        assert!(extracted.is_empty());
    }

    #[test]
    fn test_language_match_is_exact() {
        let (html, extracted, _) = render(
            "```Mermaid\ngraph TD\n```\n\n```mermaid-js\ngraph TD\n```",
            DiagramProcessor::new(),
        );
        assert!(!html.contains("data-diagram-id"));
        assert!(extracted.is_empty());
    }

    #[test]
    fn test_ids_follow_diagram_order() {
        let markdown = "```mermaid\ngraph A\n```\n\n```rust\nfn main() {}\n```\n\n```mermaid\ngraph B\n```";
        let (html, extracted, _) = render(markdown, DiagramProcessor::new());

        assert!(html.contains(r#"data-diagram-id="diagram-0">graph A</div>"#));
        assert!(html.contains(r#"data-diagram-id="diagram-1">graph B</div>"#));
        let indexes: Vec<usize> = extracted.iter().map(|b| b.index).collect();
        assert_eq!(indexes, vec![0, 2]);
    }

    #[test]
    fn test_custom_language() {
        let (html, _, _) = render(
            "```diagram\ngraph TD\n```\n\n```mermaid\ngraph TD\n```",
            DiagramProcessor::new().language("diagram"),
        );
        assert!(html.contains(r#"data-diagram-id="diagram-0">graph TD</div>"#));
        assert!(html.contains(r#"<code class="language-mermaid">"#));
    }

    #[test]
    fn test_fence_attributes_warn() {
        let (html, extracted, warnings) = render(
            "```mermaid theme=dark scale=2\ngraph TD\n```",
            DiagramProcessor::new(),
        );

        assert!(html.contains("data-diagram-id=\"diagram-0\""));
        assert_eq!(extracted[0].attrs.len(), 2);
        assert_eq!(
            warnings,
            vec!["diagram-0: fence attributes are not supported on diagrams and were ignored: scale, theme".to_owned()]
        );
    }

    #[test]
    fn test_container_id() {
        assert_eq!(container_id(0), "diagram-0");
        assert_eq!(container_id(12), "diagram-12");
    }
}
