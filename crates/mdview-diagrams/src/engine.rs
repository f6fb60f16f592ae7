//! Diagram engine boundary and its process-wide runtime.
//!
//! A [`DiagramEngine`] turns diagram source into a drawing. Engines are
//! configured exactly once through [`DiagramRuntime::init_once`] and then
//! asked to [`run`](DiagramEngine::run) over the nodes of each activation pass.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::consts::DEFAULT_THEME;

/// Engine configuration passed to [`DiagramEngine::initialize`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Draw diagrams automatically when the page loads.
    ///
    /// Always `false` for hosts that activate after mount.
    pub start_on_load: bool,
    /// Engine theme (e.g., "default", "dark").
    pub theme: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start_on_load: false,
            theme: DEFAULT_THEME.to_owned(),
        }
    }
}

/// Diagram engine error.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DiagramError {
    /// The engine could not be configured.
    #[error("engine initialization failed: {0}")]
    Init(String),
    /// The engine was used before a successful initialization.
    #[error("engine is not initialized")]
    NotInitialized,
    /// The diagram source was rejected.
    #[error("invalid diagram: {0}")]
    Syntax(String),
    /// HTTP transport or status failure.
    #[error("HTTP error: {0}")]
    Http(String),
    /// Reading a response failed.
    #[error("I/O error: {0}")]
    Io(String),
}

/// Activation state of a [`DiagramNode`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeState {
    /// Not drawn yet.
    Pending,
    /// Drawn; holds the SVG markup.
    Drawn(String),
    /// Drawing failed; holds a message for the error indicator.
    Failed(String),
}

/// A diagram container resolved from a live view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagramNode {
    /// Container id (`data-diagram-id`).
    pub id: String,
    /// Diagram source held by the container.
    pub source: String,
    pub state: NodeState,
}

impl DiagramNode {
    /// Create a pending node.
    #[must_use]
    pub fn new(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            state: NodeState::Pending,
        }
    }

    /// Record the outcome of drawing this node.
    pub fn settle(&mut self, result: Result<String, DiagramError>) {
        self.state = match result {
            Ok(svg) => NodeState::Drawn(svg),
            Err(e) => {
                tracing::warn!(id = %self.id, error = %e, "Diagram failed to draw");
                NodeState::Failed(e.to_string())
            }
        };
    }
}

/// A diagram drawing capability.
///
/// Implementations must be shareable across threads: one engine serves every
/// view of the process.
pub trait DiagramEngine: Send + Sync {
    /// Apply process-wide configuration.
    ///
    /// Called at most once, by [`DiagramRuntime::init_once`].
    fn initialize(&self, config: &EngineConfig) -> Result<(), DiagramError>;

    /// Draw one diagram and return its SVG.
    fn render(&self, source: &str) -> Result<String, DiagramError>;

    /// Draw every node of one activation pass in place.
    ///
    /// Each node is settled independently, so a failing node never prevents
    /// its siblings from drawing.
    fn run(&self, nodes: &mut [DiagramNode]) {
        for node in nodes.iter_mut() {
            let result = self.render(&node.source);
            node.settle(result);
        }
    }
}

impl<E: DiagramEngine + ?Sized> DiagramEngine for Arc<E> {
    fn initialize(&self, config: &EngineConfig) -> Result<(), DiagramError> {
        (**self).initialize(config)
    }

    fn render(&self, source: &str) -> Result<String, DiagramError> {
        (**self).render(source)
    }

    fn run(&self, nodes: &mut [DiagramNode]) {
        (**self).run(nodes);
    }
}

/// Owner of a [`DiagramEngine`] and its one-time initialization.
///
/// Hosts keep one runtime for the lifetime of the process and share it
/// between views.
pub struct DiagramRuntime {
    engine: Box<dyn DiagramEngine>,
    config: EngineConfig,
    /// Outcome of the single `initialize` call.
    init: OnceLock<Result<(), DiagramError>>,
}

impl fmt::Debug for DiagramRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagramRuntime")
            .field("config", &self.config)
            .field("init", &self.init.get())
            .finish_non_exhaustive()
    }
}

impl DiagramRuntime {
    /// Create a runtime with the default [`EngineConfig`].
    #[must_use]
    pub fn new(engine: impl DiagramEngine + 'static) -> Self {
        Self {
            engine: Box::new(engine),
            config: EngineConfig::default(),
            init: OnceLock::new(),
        }
    }

    /// Replace the configuration used for initialization.
    ///
    /// Has no effect on the engine until [`init_once`](Self::init_once) runs.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Initialize the engine unless that already happened.
    ///
    /// The first caller runs [`DiagramEngine::initialize`]; everyone after
    /// that, including concurrent callers, observes the stored outcome. A
    /// failed initialization is never retried.
    pub fn init_once(&self) -> Result<(), DiagramError> {
        self.init
            .get_or_init(|| {
                tracing::debug!(theme = %self.config.theme, "Initializing diagram engine");
                self.engine.initialize(&self.config).inspect_err(|e| {
                    tracing::warn!(error = %e, "Diagram engine initialization failed");
                })
            })
            .clone()
    }

    /// Whether initialization has been attempted.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.init.get().is_some()
    }

    /// The configuration used for initialization.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The wrapped engine.
    #[must_use]
    pub fn engine(&self) -> &dyn DiagramEngine {
        self.engine.as_ref()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording engine shared by the crate's tests.

    use std::sync::Mutex;

    use super::*;

    /// Engine that records calls and fails sources containing `fail`.
    #[derive(Default)]
    pub(crate) struct RecordingEngine {
        pub(crate) init_calls: Mutex<Vec<EngineConfig>>,
        /// Node ids of every `run` call, one entry per call.
        pub(crate) runs: Mutex<Vec<Vec<String>>>,
        pub(crate) fail_init: bool,
    }

    impl RecordingEngine {
        pub(crate) fn failing_init() -> Self {
            Self {
                fail_init: true,
                ..Self::default()
            }
        }
    }

    impl DiagramEngine for RecordingEngine {
        fn initialize(&self, config: &EngineConfig) -> Result<(), DiagramError> {
            self.init_calls.lock().unwrap().push(config.clone());
            if self.fail_init {
                return Err(DiagramError::Init("no renderer available".to_owned()));
            }
            Ok(())
        }

        fn render(&self, source: &str) -> Result<String, DiagramError> {
            if source.contains("fail") {
                return Err(DiagramError::Syntax(format!("cannot parse {source:?}")));
            }
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

}
