//! Diagram blocks for rendered markdown.
//!
//! Diagrams are handled in two phases:
//!
//! 1. While rendering, [`DiagramProcessor`] turns every fence tagged with the
//!    diagram language into a container holding the raw source.
//! 2. Once the HTML is mounted, [`activate_diagrams`] finds the containers in
//!    the [`ViewRoot`] and hands them to the [`DiagramEngine`] in one call.
//!    [`activate_diagram_ids`] does the same for the ids recorded in phase 1.
//!
//! The engine lives in a [`DiagramRuntime`], which initializes it exactly once.
//! [`KrokiEngine`] draws diagrams through a Kroki server.
//!
//! # Example
//!
//! ```
//! use mdview_diagrams::{DiagramProcessor, HtmlView, ViewRoot};
//! use mdview_renderer::{HtmlBackend, MarkdownRenderer, parse};
//!
//! let html = MarkdownRenderer::<HtmlBackend>::new()
//!     .with_processor(DiagramProcessor::new())
//!     .render(parse("```mermaid\ngraph TD\n A-->B\n```", true))
//!     .html;
//!
//! let mut view = HtmlView::new();
//! view.mount(html);
//! let nodes = view.diagram_nodes();
//! assert_eq!(nodes.len(), 1);
//! assert_eq!(nodes[0].source, "graph TD\n A-->B");
//! ```

mod activate;
mod cache;
mod consts;
mod engine;
mod kroki;
mod processor;
mod view;

pub use activate::{ActivationReport, activate_diagram_ids, activate_diagrams};
pub use cache::{DiagramKey, content_hash};
pub use consts::{CONTAINER_CLASS, DEFAULT_LANGUAGE, DEFAULT_THEME};
pub use engine::{DiagramEngine, DiagramError, DiagramNode, DiagramRuntime, EngineConfig, NodeState};
pub use kroki::KrokiEngine;
pub use processor::{DiagramProcessor, container_id};
pub use view::{HtmlView, ViewRoot};
