//! `mdview render` command implementation.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use mdview_cache::{Cache, FileCache, NullCache};
use mdview_config::{CliSettings, Config};
use mdview_diagrams::{DiagramRuntime, EngineConfig, HtmlView, KrokiEngine};
use mdview_viewer::{ActivationOutcome, MarkdownViewer, RawHtml, RenderOptions, RenderedMarkdown};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Markdown file to render (default: stdin, `-` also reads stdin).
    input: Option<PathBuf>,

    /// Write output to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover mdview.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Kroki server URL for drawing diagrams (overrides config).
    #[arg(long, env = "MDVIEW_KROKI_URL")]
    kroki_url: Option<String>,

    /// Diagram theme (overrides config).
    #[arg(long)]
    theme: Option<String>,

    /// Escape raw HTML in the markdown instead of passing it through.
    #[arg(long)]
    escape_html: bool,

    /// Disable caching.
    #[arg(long)]
    no_cache: bool,

    /// Write the rendered result as JSON (HTML, diagrams, warnings).
    #[arg(long)]
    json: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl RenderArgs {
    pub(crate) fn execute(self, version: &str) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            kroki_url: self.kroki_url.clone(),
            cache_enabled: self.no_cache.then_some(false),
            theme: self.theme.clone(),
            allow_raw_html: self.escape_html.then_some(false),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            tracing::info!(path = %path.display(), "Loaded configuration");
        }

        let markdown = read_input(self.input.as_deref())?;

        let cache: Box<dyn Cache> = if config.cache_resolved.enabled {
            Box::new(FileCache::new(config.cache_resolved.dir.clone(), version))
        } else {
            Box::new(NullCache)
        };

        let mut viewer = MarkdownViewer::new(render_options(&config)).with_cache(cache.bucket("renders"));
        let rendered = viewer.set_markdown(&markdown);
        for warning in &rendered.warnings {
            output.warning(&format!("Warning: {warning}"));
        }

        let mut result = RenderedMarkdown::clone(&rendered);
        if let Some(kroki_url) = &config.diagrams.kroki_url
            && !result.diagrams.is_empty()
        {
            let engine = KrokiEngine::new(kroki_url.as_str())
                .timeout(config.diagrams.timeout())
                .with_cache(cache.bucket("diagrams"));
            let runtime = DiagramRuntime::new(engine).with_config(EngineConfig {
                start_on_load: false,
                theme: config.diagrams.theme.clone(),
            });

            let mut view = HtmlView::new();
            viewer.mount(&mut view);
            if let ActivationOutcome::Activated(report) = viewer.activate(&runtime, &mut view) {
                if report.failed > 0 {
                    output.warning(&format!(
                        "Warning: {} of {} diagrams failed to draw",
                        report.failed, report.found
                    ));
                }
                result.html = view.into_html();
            }
        }

        let text = if self.json {
            serde_json::to_string_pretty(&result)?
        } else {
            result.html
        };
        write_output(self.output.as_deref(), &text)?;

        if let Some(path) = &self.output {
            output.success(&format!("Rendered to {}", path.display()));
        }
        Ok(())
    }
}

/// Map configuration to viewer render options.
fn render_options(config: &Config) -> RenderOptions {
    RenderOptions {
        gfm: config.render.gfm,
        hard_breaks: config.render.hard_breaks,
        raw_html: if config.render.allow_raw_html {
            RawHtml::Allow
        } else {
            RawHtml::Escape
        },
        diagram_language: config.diagrams.language.clone(),
    }
}

/// Read markdown from `path`, or from stdin when absent or `-`.
fn read_input(path: Option<&Path>) -> Result<String, CliError> {
    match path {
        Some(path) if path != Path::new("-") => Ok(std::fs::read_to_string(path)?),
        _ => {
            let mut markdown = String::new();
            std::io::stdin().lock().read_to_string(&mut markdown)?;
            Ok(markdown)
        }
    }
}

/// Write `text` to `path`, or to stdout when absent.
fn write_output(path: Option<&Path>, text: &str) -> Result<(), CliError> {
    match path {
        Some(path) => std::fs::write(path, text)?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            if !text.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
            stdout.flush()?;
        }
    }
    Ok(())
}
