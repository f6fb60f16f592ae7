//! Markdown viewer for chat messages.
//!
//! Ties the renderer and the diagram pipeline together:
//!
//! - [`render`] turns a markdown string into an HTML fragment plus the list of
//!   diagram containers it holds.
//! - [`MarkdownViewer`] keeps the current output of one view, re-rendering
//!   only when the input changes, and runs the diagram activation owed to the
//!   latest output once it is mounted.
//!
//! # Example
//!
//! ```
//! use mdview_diagrams::{DiagramEngine, DiagramError, DiagramRuntime, EngineConfig, HtmlView};
//! use mdview_viewer::{ActivationOutcome, MarkdownViewer, RenderOptions};
//!
//! struct Boxes;
//!
//! impl DiagramEngine for Boxes {
//!     fn initialize(&self, _config: &EngineConfig) -> Result<(), DiagramError> {
//!         Ok(())
//!     }
//!
//!     fn render(&self, _source: &str) -> Result<String, DiagramError> {
//!         Ok("<svg></svg>".to_owned())
//!     }
//! }
//!
//! let runtime = DiagramRuntime::new(Boxes);
//! let mut viewer = MarkdownViewer::new(RenderOptions::default());
//! let mut view = HtmlView::new();
//!
//! viewer.set_markdown("```mermaid\ngraph TD\n A-->B\n```");
//! viewer.mount(&mut view);
//! let outcome = viewer.activate(&runtime, &mut view);
//! assert!(matches!(outcome, ActivationOutcome::Activated(report) if report.drawn == 1));
//! ```

mod render;
mod viewer;

pub use mdview_renderer::RawHtml;
pub use render::{PendingDiagram, RenderOptions, RenderedMarkdown, render};
pub use viewer::{ActivationOutcome, MarkdownViewer, PendingActivation};
