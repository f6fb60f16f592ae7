//! The render operation: markdown in, HTML plus pending diagrams out.

use mdview_diagrams::{DEFAULT_LANGUAGE, DiagramProcessor, container_id, content_hash};
use mdview_renderer::{HtmlBackend, MarkdownRenderer, RawHtml, parse};
use serde::{Deserialize, Serialize};

/// Options controlling [`render`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// GitHub-flavored extensions: tables, strikethrough, task lists and
    /// bare-URL autolinks.
    pub gfm: bool,
    /// Line breaks inside paragraphs become `<br>`.
    pub hard_breaks: bool,
    /// Handling of raw HTML in the source.
    pub raw_html: RawHtml,
    /// Fence language reserved for diagrams.
    pub diagram_language: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            gfm: true,
            hard_breaks: true,
            raw_html: RawHtml::Allow,
            diagram_language: DEFAULT_LANGUAGE.to_owned(),
        }
    }
}

impl RenderOptions {
    /// Stable single-line summary of the options, used as a cache etag.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let raw_html = match self.raw_html {
            RawHtml::Allow => "allow",
            RawHtml::Escape => "escape",
        };
        format!(
            "gfm={};breaks={};raw={raw_html};diagram={}",
            self.gfm,
            self.hard_breaks,
            self.diagram_language.escape_default()
        )
    }
}

/// A diagram container awaiting activation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDiagram {
    /// Container id (`data-diagram-id`).
    pub id: String,
    /// Raw diagram source.
    pub source: String,
}

/// Output of [`render`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedMarkdown {
    /// HTML fragment ready to mount.
    pub html: String,
    /// Diagram containers in `html`, in document order.
    pub diagrams: Vec<PendingDiagram>,
    /// Non-fatal issues found while rendering.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl RenderedMarkdown {
    /// Identity of `html`, matching [`ViewRoot::content_key`] once mounted.
    ///
    /// [`ViewRoot::content_key`]: mdview_diagrams::ViewRoot::content_key
    #[must_use]
    pub fn content_key(&self) -> String {
        content_hash(&self.html)
    }
}

/// Render `markdown` to an HTML fragment.
///
/// Pure: the same input and options always give byte-identical output. Never
/// fails, since any markdown input renders to some HTML.
///
/// # Example
///
/// ```
/// use mdview_viewer::{RenderOptions, render};
///
/// let out = render("```mermaid\ngraph TD\n A-->B\n```", &RenderOptions::default());
/// assert_eq!(out.diagrams.len(), 1);
/// assert_eq!(out.diagrams[0].id, "diagram-0");
/// assert!(out.html.starts_with(r#"<div class="mermaid my-3""#));
/// ```
#[must_use]
pub fn render(markdown: &str, options: &RenderOptions) -> RenderedMarkdown {
    let mut renderer = MarkdownRenderer::<HtmlBackend>::new()
        .with_raw_html(options.raw_html)
        .with_processor(DiagramProcessor::new().language(&options.diagram_language));
    if options.hard_breaks {
        renderer = renderer.with_hard_breaks();
    }
    if options.gfm {
        renderer = renderer.with_autolinks();
    }

    let html = renderer.render(parse(markdown, options.gfm)).html;

    let diagrams = renderer
        .extracted_code_blocks()
        .into_iter()
        .enumerate()
        .map(|(ordinal, block)| PendingDiagram {
            id: container_id(ordinal),
            source: block.source,
        })
        .collect();

    RenderedMarkdown {
        html,
        diagrams,
        warnings: renderer.processor_warnings(),
    }
}
