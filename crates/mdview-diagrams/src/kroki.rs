//! Server-side diagram engine backed by Kroki.
//!
//! Sources are posted to `{server}/mermaid/svg`; nodes of one activation pass
//! are rendered in parallel on the rayon thread pool. Drawn SVG is cached by
//! [`DiagramKey`], so unchanged diagrams never hit the network twice.

use std::sync::OnceLock;
use std::time::Duration;

use mdview_cache::{CacheBucket, CacheBucketExt, NullCacheBucket};
use rayon::prelude::*;
use ureq::Agent;

use crate::cache::DiagramKey;
use crate::consts::{DEFAULT_THEME, DEFAULT_TIMEOUT, KROKI_ENDPOINT};
use crate::engine::{DiagramEngine, DiagramError, DiagramNode, EngineConfig};

/// Output format requested from Kroki.
const FORMAT: &str = "svg";

/// Create HTTP agent with the specified timeout.
fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Prefix `source` with an init directive selecting `theme`.
///
/// Sources that carry their own directive win.
fn with_theme(source: &str, theme: &str) -> String {
    if theme == DEFAULT_THEME || source.trim_start().starts_with("%%{init") {
        return source.to_owned();
    }
    format!("%%{{init: {{\"theme\": \"{theme}\"}}}}%%\n{source}")
}

/// Send a diagram to Kroki and return the SVG.
///
/// Handles HTTP errors by reading the response body for error details; Kroki
/// answers unparsable sources with 400.
fn send_diagram_request(agent: &Agent, server_url: &str, source: &str) -> Result<String, DiagramError> {
    let url = format!("{server_url}/{KROKI_ENDPOINT}/{FORMAT}");

    let response = agent
        .post(&url)
        .header("Content-Type", "text/plain")
        .send(source.as_bytes())
        .map_err(|e| DiagramError::Http(e.to_string()))?;

    let status = response.status().as_u16();
    let mut body = response.into_body();

    if status >= 400 {
        let error_body = body
            .read_to_string()
            .unwrap_or_else(|_| String::from("(unable to read error body)"));
        let error_body = error_body.trim().to_owned();
        if status == 400 {
            return Err(DiagramError::Syntax(error_body));
        }
        return Err(DiagramError::Http(format!("HTTP {status}: {error_body}")));
    }

    body.read_to_string()
        .map_err(|e| DiagramError::Io(e.to_string()))
}

/// [`DiagramEngine`] that draws mermaid diagrams through a Kroki server.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use mdview_diagrams::{DiagramRuntime, HtmlView, KrokiEngine, activate_diagrams};
///
/// let runtime = DiagramRuntime::new(
///     KrokiEngine::new("https://kroki.io").timeout(Duration::from_secs(10)),
/// );
/// let mut view = HtmlView::new();
/// view.mount(r#"<div class="mermaid my-3" data-diagram-id="diagram-0">graph TD
/// A-->B</div>"#);
/// let report = activate_diagrams(&runtime, &mut view);
/// assert_eq!(report.found, 1);
/// ```
pub struct KrokiEngine {
    /// Kroki server URL without trailing slash.
    server_url: String,
    /// HTTP agent for connection pooling (reused across passes).
    agent: Agent,
    /// Drawn SVG by diagram key.
    cache: Box<dyn CacheBucket>,
    /// Theme from the one-time initialization.
    theme: OnceLock<String>,
}

impl KrokiEngine {
    /// Create an engine for the given Kroki server URL.
    #[must_use]
    pub fn new(server_url: impl Into<String>) -> Self {
        let server_url: String = server_url.into();
        Self {
            server_url: server_url.trim_end_matches('/').to_owned(),
            agent: create_agent(DEFAULT_TIMEOUT),
            cache: Box::new(NullCacheBucket),
            theme: OnceLock::new(),
        }
    }

    /// Set HTTP timeout for Kroki requests (default: 30 seconds).
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.agent = create_agent(timeout);
        self
    }

    /// Set the bucket drawn diagrams are cached in.
    #[must_use]
    pub fn with_cache(mut self, cache: Box<dyn CacheBucket>) -> Self {
        self.cache = cache;
        self
    }

    /// Kroki server URL.
    #[must_use]
    pub fn server_url(&self) -> &str {
        &self.server_url
    }
}

impl DiagramEngine for KrokiEngine {
    fn initialize(&self, config: &EngineConfig) -> Result<(), DiagramError> {
        if config.start_on_load {
            return Err(DiagramError::Init(
                "start_on_load is not supported, diagrams are drawn on activation".to_owned(),
            ));
        }
        self.theme
            .set(config.theme.clone())
            .map_err(|_| DiagramError::Init("engine is already initialized".to_owned()))
    }

    fn render(&self, source: &str) -> Result<String, DiagramError> {
        let theme = self.theme.get().ok_or(DiagramError::NotInitialized)?;
        let key = DiagramKey {
            source,
            endpoint: KROKI_ENDPOINT,
            format: FORMAT,
            theme,
        }
        .compute_hash();

        if let Some(svg) = self.cache.get_string(&key, FORMAT) {
            tracing::debug!(key = %key, "Diagram cache hit");
            return Ok(svg);
        }

        let svg = send_diagram_request(&self.agent, &self.server_url, &with_theme(source, theme))?;
        self.cache.set_string(&key, FORMAT, &svg);
        Ok(svg)
    }

    fn run(&self, nodes: &mut [DiagramNode]) {
        tracing::debug!(count = nodes.len(), server = %self.server_url, "Rendering diagrams via Kroki");
        nodes.par_iter_mut().for_each(|node| {
            let result = self.render(&node.source);
            node.settle(result);
        });
    }
}
