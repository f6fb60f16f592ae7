//! Post-mount diagram activation.

use std::collections::HashMap;

use crate::engine::{DiagramNode, DiagramRuntime, NodeState};
use crate::view::ViewRoot;

const MISSING_CONTAINER: &str = "Diagram container not found in view";

/// Outcome of one activation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActivationReport {
    /// Containers the pass was asked to draw.
    pub found: usize,
    /// Containers now holding a drawing.
    pub drawn: usize,
    /// Containers now holding an error indicator.
    pub failed: usize,
}

impl ActivationReport {
    /// Whether the pass had nothing to do.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.found == 0
    }
}

/// Draw every unprocessed diagram container attached to `root`.
///
/// Must be called after the HTML is mounted. The engine is initialized on
/// first use, then asked to run exactly once over exactly the pending
/// containers found; a view without containers causes no engine call at all.
/// Results are applied to the view in one step.
///
/// Never fails: drawing errors end up as error indicators in the view and in
/// [`ActivationReport::failed`]. When the engine could not be initialized,
/// every container gets an error indicator and `run` is not called.
pub fn activate_diagrams(runtime: &DiagramRuntime, root: &mut dyn ViewRoot) -> ActivationReport {
    let nodes = root.diagram_nodes();
    activate_nodes(runtime, root, nodes)
}

/// Draw the containers with the given ids, in that order.
///
/// Like [`activate_diagrams`], but driven by the ids recorded when the
/// markdown was rendered. An id with no unprocessed container in `root` is
/// reported as failed; containers not listed are left alone.
pub fn activate_diagram_ids(
    runtime: &DiagramRuntime,
    root: &mut dyn ViewRoot,
    ids: &[String],
) -> ActivationReport {
    let mut attached: HashMap<String, DiagramNode> = root
        .diagram_nodes()
        .into_iter()
        .map(|node| (node.id.clone(), node))
        .collect();

    let nodes = ids
        .iter()
        .map(|id| {
            attached.remove(id).unwrap_or_else(|| {
                tracing::debug!(id = id.as_str(), "Diagram container not found in view");
                DiagramNode {
                    state: NodeState::Failed(MISSING_CONTAINER.to_owned()),
                    ..DiagramNode::new(id.as_str(), "")
                }
            })
        })
        .collect();
    activate_nodes(runtime, root, nodes)
}

fn activate_nodes(
    runtime: &DiagramRuntime,
    root: &mut dyn ViewRoot,
    mut nodes: Vec<DiagramNode>,
) -> ActivationReport {
    if nodes.is_empty() {
        return ActivationReport::default();
    }

    let pending: Vec<usize> = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.state == NodeState::Pending)
        .map(|(i, _)| i)
        .collect();
    if !pending.is_empty() {
        match runtime.init_once() {
            Ok(()) => {
                let mut batch: Vec<DiagramNode> =
                    pending.iter().map(|&i| nodes[i].clone()).collect();
                runtime.engine().run(&mut batch);
                for (i, node) in pending.into_iter().zip(batch) {
                    nodes[i] = node;
                }
            }
            Err(e) => {
                let message = e.to_string();
                for i in pending {
                    nodes[i].state = NodeState::Failed(message.clone());
                }
            }
        }
    }

    root.apply(&nodes);

    let mut report = ActivationReport {
        found: nodes.len(),
        ..ActivationReport::default()
    };
    for node in &nodes {
        match node.state {
            NodeState::Drawn(_) => report.drawn += 1,
            NodeState::Failed(_) => report.failed += 1,
            NodeState::Pending => {}
        }
    }

    if report.failed > 0 {
        tracing::warn!(
            found = report.found,
            failed = report.failed,
            "Some diagrams failed to draw"
        );
    } else {
        tracing::debug!(drawn = report.drawn, "Diagrams activated");
    }

    report
}
