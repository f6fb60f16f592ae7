//! Host-side viewer state.
//!
//! [`MarkdownViewer`] owns the current markdown of one view, re-renders only
//! when it changes, and tracks the single diagram activation pass owed to
//! the latest output.

use std::sync::Arc;

use mdview_cache::{CacheBucket, CacheBucketExt, NullCacheBucket};
use mdview_diagrams::{
    ActivationReport, DiagramRuntime, HtmlView, ViewRoot, activate_diagram_ids, content_hash,
};

use crate::render::{RenderOptions, RenderedMarkdown, render};

/// Activation owed to one rendered output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingActivation {
    /// Render generation that produced the output.
    pub generation: u64,
    /// Identity of the output's HTML.
    pub content_key: String,
    /// Containers to draw.
    pub diagram_ids: Vec<String>,
}

/// What [`MarkdownViewer::activate`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// No activation was pending.
    Idle,
    /// The view holds content older than the pending output; nothing was
    /// touched and the pass stays pending until the output is mounted.
    Stale {
        /// Generation still waiting for its mount.
        pending_generation: u64,
    },
    /// The pending pass ran against the view.
    Activated(ActivationReport),
}

/// Markdown view state with memoized rendering.
///
/// # Example
///
/// ```
/// use mdview_viewer::{MarkdownViewer, RenderOptions};
/// use mdview_diagrams::HtmlView;
///
/// let mut viewer = MarkdownViewer::new(RenderOptions::default());
/// let first = viewer.set_markdown("```mermaid\ngraph TD\n```");
/// let again = viewer.set_markdown("```mermaid\ngraph TD\n```");
/// assert!(std::sync::Arc::ptr_eq(&first, &again));
/// assert_eq!(viewer.generation(), 1);
///
/// let mut view = HtmlView::new();
/// assert!(viewer.mount(&mut view));
/// ```
pub struct MarkdownViewer {
    options: RenderOptions,
    /// Rendered output by input hash, shared across viewers.
    cache: Box<dyn CacheBucket>,
    /// Last input and its output.
    memo: Option<(String, Arc<RenderedMarkdown>)>,
    generation: u64,
    pending: Option<PendingActivation>,
}

impl MarkdownViewer {
    /// Create a viewer without a render cache.
    #[must_use]
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            cache: Box::new(NullCacheBucket),
            memo: None,
            generation: 0,
            pending: None,
        }
    }

    /// Consult `cache` before rendering and store fresh output in it.
    ///
    /// Entries are keyed by the SHA-256 of the input and validated against
    /// [`RenderOptions::fingerprint`].
    #[must_use]
    pub fn with_cache(mut self, cache: Box<dyn CacheBucket>) -> Self {
        self.cache = cache;
        self
    }

    /// Render options of this viewer.
    #[must_use]
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Set the markdown shown by the view and return its rendered output.
    ///
    /// Output is re-derived only when `markdown` differs from the previous
    /// input; otherwise the memoized output is returned and no new activation
    /// is scheduled. A new output replaces any activation still pending for
    /// an older one.
    pub fn set_markdown(&mut self, markdown: &str) -> Arc<RenderedMarkdown> {
        if let Some((input, output)) = &self.memo
            && input == markdown
        {
            return Arc::clone(output);
        }

        let output = Arc::new(self.render_cached(markdown));
        self.generation += 1;

        if let Some(stale) = &self.pending {
            tracing::debug!(
                superseded = stale.generation,
                generation = self.generation,
                "Superseding pending diagram activation"
            );
        }
        self.pending = Some(PendingActivation {
            generation: self.generation,
            content_key: output.content_key(),
            diagram_ids: output.diagrams.iter().map(|d| d.id.clone()).collect(),
        });
        self.memo = Some((markdown.to_owned(), Arc::clone(&output)));

        output
    }

    /// Latest rendered output.
    #[must_use]
    pub fn current(&self) -> Option<Arc<RenderedMarkdown>> {
        self.memo.as_ref().map(|(_, output)| Arc::clone(output))
    }

    /// Number of outputs rendered so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Activation owed to the latest output, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&PendingActivation> {
        self.pending.as_ref()
    }

    /// Attach the latest output to `view`.
    ///
    /// Returns `false` when nothing has been rendered yet.
    pub fn mount(&self, view: &mut HtmlView) -> bool {
        let Some((_, output)) = &self.memo else {
            return false;
        };
        view.mount(output.html.as_str());
        true
    }

    /// Run the pending activation pass against `root`.
    ///
    /// Call after the latest output has been mounted. The pass only runs when
    /// `root` shows exactly the output it was scheduled for; a view still
    /// showing older content is left untouched. The containers recorded at
    /// render time are looked up in `root`, and any that cannot be found are
    /// reported as failed. Never fails.
    pub fn activate(&mut self, runtime: &DiagramRuntime, root: &mut dyn ViewRoot) -> ActivationOutcome {
        let Some(pending) = &self.pending else {
            return ActivationOutcome::Idle;
        };

        if root.content_key() != Some(pending.content_key.as_str()) {
            tracing::debug!(
                generation = pending.generation,
                "View does not show the pending output, skipping activation"
            );
            return ActivationOutcome::Stale {
                pending_generation: pending.generation,
            };
        }

        let ids = self.pending.take().map(|p| p.diagram_ids).unwrap_or_default();
        ActivationOutcome::Activated(activate_diagram_ids(runtime, root, &ids))
    }

    fn render_cached(&self, markdown: &str) -> RenderedMarkdown {
        let key = content_hash(markdown);
        let etag = self.options.fingerprint();

        if let Some(hit) = self.cache.get_json::<RenderedMarkdown>(&key, &etag) {
            tracing::debug!(key = %key, "Render cache hit");
            return hit;
        }

        let output = render(markdown, &self.options);
        for warning in &output.warnings {
            tracing::warn!(warning = %warning, "Render warning");
        }
        self.cache.set_json(&key, &etag, &output);
        output
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use mdview_cache::{Cache, MemoryCache};
    use mdview_diagrams::{DiagramEngine, DiagramError, DiagramNode, EngineConfig};
    use pretty_assertions::assert_eq;

    /// Engine recording the node ids of every `run` call.
    #[derive(Default)]
    struct RecordingEngine {
        runs: Mutex<Vec<Vec<String>>>,
    }

    impl DiagramEngine for RecordingEngine {
        fn initialize(&self, _config: &EngineConfig) -> Result<(), DiagramError> {
            Ok(())
        }

        fn render(&self, source: &str) -> Result<String, DiagramError> {
            Ok(format!("<svg>{source}</svg>"))
        }

        fn run(&self, nodes: &mut [DiagramNode]) {
            self.runs
                .lock()
                .unwrap()
                .push(nodes.iter().map(|n| n.id.clone()).collect());
            for node in nodes.iter_mut() {
                let result = self.render(&node.source);
                node.settle(result);
            }
        }
    }

    fn runtime() -> (Arc<RecordingEngine>, DiagramRuntime) {
        let engine = Arc::new(RecordingEngine::default());
        (Arc::clone(&engine), DiagramRuntime::new(engine))
    }

    const DIAGRAM: &str = "```mermaid\ngraph TD\n A-->B\n```";

    #[test]
    fn test_memoizes_on_exact_input() {
        let mut viewer = MarkdownViewer::new(RenderOptions::default());

        let a = viewer.set_markdown("hello");
        let b = viewer.set_markdown("hello");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(viewer.generation(), 1);

        let c = viewer.set_markdown("hello ");
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(viewer.generation(), 2);
    }

    #[test]
    fn test_pending_tracks_latest_output() {
        let mut viewer = MarkdownViewer::new(RenderOptions::default());
        assert_eq!(viewer.pending(), None);

        let output = viewer.set_markdown(DIAGRAM);
        assert_eq!(
            viewer.pending(),
            Some(&PendingActivation {
                generation: 1,
                content_key: output.content_key(),
                diagram_ids: vec!["diagram-0".to_owned()],
            })
        );
    }

    #[test]
    fn test_mount_then_activate_runs_once() {
        let (engine, runtime) = runtime();
        let mut viewer = MarkdownViewer::new(RenderOptions::default());
        let mut view = HtmlView::new();

        viewer.set_markdown(DIAGRAM);
        assert!(viewer.mount(&mut view));
        let outcome = viewer.activate(&runtime, &mut view);

        assert_eq!(
            outcome,
            ActivationOutcome::Activated(ActivationReport {
                found: 1,
                drawn: 1,
                failed: 0
            })
        );
        assert_eq!(*engine.runs.lock().unwrap(), vec![vec!["diagram-0".to_owned()]]);
        assert!(view.html().contains("<svg>graph TD\n A-->B</svg>"));

        // The pass is consumed
        assert_eq!(viewer.activate(&runtime, &mut view), ActivationOutcome::Idle);
        assert_eq!(engine.runs.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_unchanged_input_schedules_nothing() {
        let (engine, runtime) = runtime();
        let mut viewer = MarkdownViewer::new(RenderOptions::default());
        let mut view = HtmlView::new();

        viewer.set_markdown(DIAGRAM);
        viewer.mount(&mut view);
        viewer.activate(&runtime, &mut view);

        viewer.set_markdown(DIAGRAM);
        assert_eq!(viewer.pending(), None);
        assert_eq!(viewer.activate(&runtime, &mut view), ActivationOutcome::Idle);
        assert_eq!(engine.runs.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_stale_view_is_not_touched() {
        let (engine, runtime) = runtime();
        let mut viewer = MarkdownViewer::new(RenderOptions::default());
        let mut view = HtmlView::new();

        viewer.set_markdown("```mermaid\ngraph OLD\n```");
        viewer.mount(&mut view);
        let old_html = view.html().to_owned();

        // Input changes before the first pass ran
        viewer.set_markdown("```mermaid\ngraph NEW\n```");
        assert_eq!(viewer.pending().map(|p| p.generation), Some(2));

        let outcome = viewer.activate(&runtime, &mut view);
        assert_eq!(outcome, ActivationOutcome::Stale { pending_generation: 2 });
        assert_eq!(view.html(), old_html);
        assert!(engine.runs.lock().unwrap().is_empty());

        // Mounting the new output lets its pass run
        viewer.mount(&mut view);
        let outcome = viewer.activate(&runtime, &mut view);
        assert!(matches!(outcome, ActivationOutcome::Activated(r) if r.drawn == 1));
        assert!(view.html().contains("<svg>graph NEW</svg>"));
        assert_eq!(engine.runs.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_output_without_diagrams_never_calls_engine() {
        let (engine, runtime) = runtime();
        let mut viewer = MarkdownViewer::new(RenderOptions::default());
        let mut view = HtmlView::new();

        viewer.set_markdown("just *text*");
        viewer.mount(&mut view);
        let outcome = viewer.activate(&runtime, &mut view);

        assert_eq!(outcome, ActivationOutcome::Activated(ActivationReport::default()));
        assert!(engine.runs.lock().unwrap().is_empty());
    }

    /// View showing the right content whose containers went missing.
    struct EmptiedView(Option<String>);

    impl ViewRoot for EmptiedView {
        fn content_key(&self) -> Option<&str> {
            self.0.as_deref()
        }

        fn diagram_nodes(&self) -> Vec<DiagramNode> {
            Vec::new()
        }

        fn apply(&mut self, _nodes: &[DiagramNode]) {}
    }

    #[test]
    fn test_missing_containers_reported_failed() {
        let (engine, runtime) = runtime();
        let mut viewer = MarkdownViewer::new(RenderOptions::default());

        let output = viewer.set_markdown(DIAGRAM);
        let mut view = EmptiedView(Some(output.content_key()));
        let outcome = viewer.activate(&runtime, &mut view);

        assert_eq!(
            outcome,
            ActivationOutcome::Activated(ActivationReport {
                found: 1,
                drawn: 0,
                failed: 1
            })
        );
        assert!(engine.runs.lock().unwrap().is_empty());
    }

    #[test]
    fn test_mount_before_render() {
        let viewer = MarkdownViewer::new(RenderOptions::default());
        let mut view = HtmlView::new();
        assert!(!viewer.mount(&mut view));
        assert_eq!(view.content_key(), None);
    }

    #[test]
    fn test_render_cache_shared_between_viewers() {
        let cache = MemoryCache::default();
        let mut first = MarkdownViewer::new(RenderOptions::default()).with_cache(cache.bucket("renders"));
        let rendered = first.set_markdown(DIAGRAM);

        let key = content_hash(DIAGRAM);
        let etag = RenderOptions::default().fingerprint();
        let stored: Option<RenderedMarkdown> = cache.bucket("renders").get_json(&key, &etag);
        assert_eq!(stored.as_ref(), Some(rendered.as_ref()));

        // A poisoned entry proves the second viewer reads from the cache
        let mut poisoned = rendered.as_ref().clone();
        poisoned.html = "<p>from cache</p>".to_owned();
        cache.bucket("renders").set_json(&key, &etag, &poisoned);

        let mut second = MarkdownViewer::new(RenderOptions::default()).with_cache(cache.bucket("renders"));
        assert_eq!(second.set_markdown(DIAGRAM).html, "<p>from cache</p>");
    }

    #[test]
    fn test_render_cache_respects_options() {
        let cache = MemoryCache::default();
        let mut gfm = MarkdownViewer::new(RenderOptions::default()).with_cache(cache.bucket("renders"));
        gfm.set_markdown("a\nb");

        let mut plain = MarkdownViewer::new(RenderOptions {
            hard_breaks: false,
            ..RenderOptions::default()
        })
        .with_cache(cache.bucket("renders"));
        assert_eq!(plain.set_markdown("a\nb").html, "<p>a\nb</p>");
    }
}
