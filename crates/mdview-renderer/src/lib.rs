//! Trait-based markdown renderer with pluggable render rules.
//!
//! This crate provides a generic [`MarkdownRenderer`] that produces HTML
//! fragments from pulldown-cmark events using the [`RenderBackend`] trait.
//!
//! # Architecture
//!
//! The backend is a small strategy table: it must say how fenced code blocks
//! and images are written, and inherits default rendering for everything else
//! (blockquotes, rules, hard breaks, task list markers). [`HtmlBackend`] is the
//! styled HTML5 implementation.
//!
//! Code blocks can additionally be intercepted by [`CodeBlockProcessor`]s,
//! which is how diagram blocks are turned into activation containers without
//! coupling the renderer to any diagram engine.
//!
//! # Example
//!
//! ```
//! use mdview_renderer::{HtmlBackend, MarkdownRenderer, parse};
//!
//! let markdown = "# Hello\nline one\nline two";
//! let result = MarkdownRenderer::<HtmlBackend>::new()
//!     .with_hard_breaks()
//!     .render(parse(markdown, true));
//! assert!(result.html.contains("line one<br>"));
//! ```

mod autolink;
mod backend;
mod code_block;
mod html;
mod renderer;
mod state;
mod util;

pub use backend::RenderBackend;
pub use code_block::{CodeBlockProcessor, ExtractedCodeBlock, ProcessResult};
pub use html::{CODE_BLOCK_CLASS, HtmlBackend, IMAGE_CLASS};
pub use renderer::{MarkdownRenderer, RawHtml, RenderResult};
pub use state::escape_html;
pub use util::{parse, parser_options};
