//! Internal constants for diagram containers and engines.

use std::time::Duration;

/// Fence language reserved for diagrams unless configured otherwise.
pub const DEFAULT_LANGUAGE: &str = "mermaid";

/// Class list of a diagram container.
///
/// The first class is the engine's marker class; the rest is spacing.
pub const CONTAINER_CLASS: &str = "mermaid my-3";

/// Extra class added to containers whose diagram failed to draw.
pub const ERROR_CLASS: &str = "mermaid-error";

/// Prefix of container ids (`diagram-0`, `diagram-1`, ...).
pub const ID_PREFIX: &str = "diagram-";

/// Default engine theme.
pub const DEFAULT_THEME: &str = "default";

/// Default HTTP timeout for Kroki requests (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Kroki endpoint for mermaid sources.
pub const KROKI_ENDPOINT: &str = "mermaid";
