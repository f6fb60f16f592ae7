//! Live views that diagram activation operates on.
//!
//! A [`ViewRoot`] is whatever holds the mounted HTML: a browser container, a
//! headless document, or the [`HtmlView`] string buffer used by the CLI and
//! tests.

use std::collections::HashMap;
use std::fmt::Write;
use std::ops::Range;
use std::sync::LazyLock;

use mdview_renderer::escape_html;
use regex::Regex;

use crate::cache::content_hash;
use crate::consts::ERROR_CLASS;
use crate::engine::{DiagramNode, NodeState};

/// Opening tag of an unprocessed diagram container.
///
/// Processed containers carry `data-processed` and no longer match.
static CONTAINER_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<div class="(mermaid(?: [^"]*)?)" data-diagram-id="([^"]+)">"#).unwrap()
});

/// Any `<div ...>` or `</div>` tag, for depth tracking.
static DIV_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<(/?)div\b[^>]*>").unwrap());

const UNCLOSED_CONTAINER: &str = "Diagram container is not closed";

/// A mounted view holding rendered markdown.
pub trait ViewRoot {
    /// Identity of the currently mounted content, `None` when nothing is
    /// mounted.
    ///
    /// Stays the same while diagrams are drawn into the content; changes when
    /// different content is mounted.
    fn content_key(&self) -> Option<&str>;

    /// Every diagram container currently attached that has not been drawn.
    ///
    /// Containers that cannot be read come back already `Failed`; the rest
    /// are `Pending`.
    fn diagram_nodes(&self) -> Vec<DiagramNode>;

    /// Replace the containers of settled nodes with their drawing or error
    /// indicator. Pending nodes and unknown ids are left alone.
    fn apply(&mut self, nodes: &[DiagramNode]);
}

/// [`ViewRoot`] over a mounted HTML string.
#[derive(Debug, Default)]
pub struct HtmlView {
    html: String,
    content_key: Option<String>,
}

/// Location of one container inside the mounted HTML.
struct Container<'h> {
    class: &'h str,
    id: &'h str,
    /// Whole element, open tag to closing tag.
    outer: Range<usize>,
    /// Container body, `None` when the closing tag is missing. The element
    /// then runs up to the next container.
    inner: Option<Range<usize>>,
}

impl HtmlView {
    /// Create an empty view.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `html`, replacing whatever was mounted.
    pub fn mount(&mut self, html: impl Into<String>) {
        let html = html.into();
        self.content_key = Some(content_hash(&html));
        self.html = html;
    }

    /// Detach the current content.
    pub fn unmount(&mut self) {
        self.html.clear();
        self.content_key = None;
    }

    /// Current HTML, including any drawn diagrams.
    #[must_use]
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Consume the view and return its HTML.
    #[must_use]
    pub fn into_html(self) -> String {
        self.html
    }

    /// Containers in document order.
    ///
    /// Each container's body is searched for only up to the next container's
    /// opening tag, so one malformed body cannot hide its siblings.
    fn containers(&self) -> Vec<Container<'_>> {
        let html = self.html.as_str();
        let opens: Vec<_> = CONTAINER_OPEN
            .captures_iter(html)
            .filter_map(|caps| Some((caps.get(0)?, caps.get(1)?, caps.get(2)?)))
            .collect();

        opens
            .iter()
            .enumerate()
            .map(|(i, (open, class, id))| {
                let limit = opens.get(i + 1).map_or(html.len(), |(next, _, _)| next.start());
                let close = find_closing_div(html, open.end(), limit);
                if close.is_none() {
                    tracing::debug!(id = id.as_str(), "Diagram container is not closed");
                }
                Container {
                    class: class.as_str(),
                    id: id.as_str(),
                    outer: open.start()..close.map_or(limit, |close| close + "</div>".len()),
                    inner: close.map(|close| open.end()..close),
                }
            })
            .collect()
    }
}

/// Byte offset of the `</div>` closing an element whose body spans
/// `from..limit`.
///
/// Unbalanced `<div>` tags inside the body fall back to the last `</div>`
/// before `limit`. `None` when the body has no closing tag at all.
fn find_closing_div(html: &str, from: usize, limit: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut last_close = None;
    for tag in DIV_TAG.captures_iter(&html[from..limit]) {
        let whole = tag.get(0)?;
        if tag.get(1).is_some_and(|slash| !slash.is_empty()) {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(from + whole.start());
            }
            last_close = Some(from + whole.start());
        } else {
            depth += 1;
        }
    }
    last_close
}

impl ViewRoot for HtmlView {
    fn content_key(&self) -> Option<&str> {
        self.content_key.as_deref()
    }

    fn diagram_nodes(&self) -> Vec<DiagramNode> {
        self.containers()
            .into_iter()
            .map(|c| match c.inner {
                Some(inner) => DiagramNode::new(c.id, &self.html[inner]),
                None => DiagramNode {
                    state: NodeState::Failed(UNCLOSED_CONTAINER.to_owned()),
                    ..DiagramNode::new(c.id, "")
                },
            })
            .collect()
    }

    fn apply(&mut self, nodes: &[DiagramNode]) {
        let settled: HashMap<&str, &NodeState> = nodes
            .iter()
            .filter(|n| n.state != NodeState::Pending)
            .map(|n| (n.id.as_str(), &n.state))
            .collect();
        if settled.is_empty() {
            return;
        }

        let mut out = String::with_capacity(self.html.len());
        let mut last = 0;
        for container in self.containers() {
            let Some(state) = settled.get(container.id) else {
                continue;
            };
            out.push_str(&self.html[last..container.outer.start]);
            write_settled(&mut out, container.class, container.id, state);
            last = container.outer.end;
        }
        out.push_str(&self.html[last..]);
        self.html = out;
    }
}

fn write_settled(out: &mut String, class: &str, id: &str, state: &NodeState) {
    match state {
        NodeState::Drawn(svg) => write!(
            out,
            r#"<div class="{class}" data-diagram-id="{id}" data-processed="true">{svg}</div>"#
        ),
        NodeState::Failed(message) => write!(
            out,
            r#"<div class="{class} {ERROR_CLASS}" data-diagram-id="{id}" data-processed="true" role="alert"><span aria-hidden="true">⚠</span> {}</div>"#,
            escape_html(message)
        ),
        NodeState::Pending => Ok(()),
    }
    .unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TWO_DIAGRAMS: &str = concat!(
        "<p>intro</p>",
        r#"<div class="mermaid my-3" data-diagram-id="diagram-0">graph TD
A-->B</div>"#,
        r#"<pre class="x"><code>not a diagram</code></pre>"#,
        r#"<div class="mermaid my-3" data-diagram-id="diagram-1">graph LR
C-->D</div>"#,
    );

    fn mounted(html: &str) -> HtmlView {
        let mut view = HtmlView::new();
        view.mount(html);
        view
    }

    #[test]
    fn test_empty_view() {
        let view = HtmlView::new();
        assert_eq!(view.content_key(), None);
        assert!(view.diagram_nodes().is_empty());
    }

    #[test]
    fn test_finds_containers_in_order() {
        let nodes = mounted(TWO_DIAGRAMS).diagram_nodes();
        assert_eq!(
            nodes,
            vec![
                DiagramNode::new("diagram-0", "graph TD\nA-->B"),
                DiagramNode::new("diagram-1", "graph LR\nC-->D"),
            ]
        );
    }

    #[test]
    fn test_nested_div_in_source() {
        let view = mounted(
            r#"<div class="mermaid my-3" data-diagram-id="diagram-0">A["<div>x</div>"]</div><p>after</p>"#,
        );
        let nodes = view.diagram_nodes();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].source, r#"A["<div>x</div>"]"#);
    }

    #[test]
    fn test_unclosed_container_fails_alone() {
        let mut view = mounted(concat!(
            r#"<div class="mermaid my-3" data-diagram-id="diagram-0">graph TD"#,
            r#"<div class="mermaid my-3" data-diagram-id="diagram-1">graph LR</div>"#,
        ));
        let nodes = view.diagram_nodes();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].state, NodeState::Failed(UNCLOSED_CONTAINER.to_owned()));
        assert_eq!(nodes[1], DiagramNode::new("diagram-1", "graph LR"));

        view.apply(&nodes);
        assert_eq!(
            view.html(),
            concat!(
                r#"<div class="mermaid my-3 mermaid-error" data-diagram-id="diagram-0" data-processed="true" role="alert"><span aria-hidden="true">⚠</span> Diagram container is not closed</div>"#,
                r#"<div class="mermaid my-3" data-diagram-id="diagram-1">graph LR</div>"#,
            )
        );
        assert_eq!(view.diagram_nodes(), vec![DiagramNode::new("diagram-1", "graph LR")]);
    }

    #[test]
    fn test_unbalanced_div_in_source() {
        let view = mounted(concat!(
            r#"<div class="mermaid my-3" data-diagram-id="diagram-0">A["<div>"] --> B</div>"#,
            "<p>between</p>",
            r#"<div class="mermaid my-3" data-diagram-id="diagram-1">graph LR
C-->D</div>"#,
        ));
        assert_eq!(
            view.diagram_nodes(),
            vec![
                DiagramNode::new("diagram-0", r#"A["<div>"] --> B"#),
                DiagramNode::new("diagram-1", "graph LR\nC-->D"),
            ]
        );
    }

    #[test]
    fn test_apply_drawn_and_failed() {
        let mut view = mounted(TWO_DIAGRAMS);
        let key = view.content_key().map(str::to_owned);

        let mut nodes = view.diagram_nodes();
        nodes[0].state = NodeState::Drawn("<svg>ok</svg>".to_owned());
        nodes[1].state = NodeState::Failed("Parse error on line 2: <bad>".to_owned());
        view.apply(&nodes);

        assert_eq!(
            view.html(),
            concat!(
                "<p>intro</p>",
                r#"<div class="mermaid my-3" data-diagram-id="diagram-0" data-processed="true"><svg>ok</svg></div>"#,
                r#"<pre class="x"><code>not a diagram</code></pre>"#,
                r#"<div class="mermaid my-3 mermaid-error" data-diagram-id="diagram-1" data-processed="true" role="alert"><span aria-hidden="true">⚠</span> Parse error on line 2: &lt;bad&gt;</div>"#,
            )
        );
        assert!(view.diagram_nodes().is_empty());
        assert_eq!(view.content_key().map(str::to_owned), key);
    }

    #[test]
    fn test_apply_skips_pending_and_unknown() {
        let mut view = mounted(TWO_DIAGRAMS);
        let mut stranger = DiagramNode::new("diagram-9", "graph");
        stranger.state = NodeState::Drawn("<svg/>".to_owned());
        view.apply(&[DiagramNode::new("diagram-0", "graph TD\nA-->B"), stranger]);

        assert_eq!(view.html(), TWO_DIAGRAMS);
        assert_eq!(view.diagram_nodes().len(), 2);
    }

    #[test]
    fn test_mount_changes_content_key() {
        let mut view = mounted("<p>a</p>");
        let first = view.content_key().map(str::to_owned);
        view.mount("<p>b</p>");
        assert_ne!(view.content_key().map(str::to_owned), first);
        view.unmount();
        assert_eq!(view.content_key(), None);
        assert_eq!(view.html(), "");
    }
}
