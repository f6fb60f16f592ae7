//! HTML backend for markdown rendering.
//!
//! Produces Tailwind-friendly HTML5 fragments for chat message display.

use std::fmt::Write;

use crate::backend::RenderBackend;
use crate::state::escape_html;

/// Classes applied to the `<pre>` wrapper of every plain code block.
pub const CODE_BLOCK_CLASS: &str = "my-3 overflow-x-auto rounded-md bg-zinc-900 text-zinc-100 text-xs p-3";

/// Classes applied to every rendered `<img>`.
pub const IMAGE_CLASS: &str = "my-3 max-w-full rounded-md border";

/// HTML render backend.
///
/// Produces:
/// - `<pre><code class="language-..">` with escaped content for code blocks
/// - `<img loading="lazy">` for images, or nothing when the source is empty
pub struct HtmlBackend;

impl RenderBackend for HtmlBackend {
    fn code_block(lang: Option<&str>, content: &str, out: &mut String) {
        match lang {
            Some(lang) => write!(
                out,
                r#"<pre class="{CODE_BLOCK_CLASS}"><code class="language-{}">{}</code></pre>"#,
                escape_html(lang),
                escape_html(content)
            ),
            None => write!(
                out,
                r#"<pre class="{CODE_BLOCK_CLASS}"><code>{}</code></pre>"#,
                escape_html(content)
            ),
        }
        .unwrap();
    }

    fn image(src: &str, alt: &str, title: &str, out: &mut String) {
        if src.is_empty() {
            return;
        }
        let title_attr = if title.is_empty() {
            String::new()
        } else {
            format!(r#" title="{}""#, escape_html(title))
        };
        write!(
            out,
            r#"<img src="{}" alt="{}"{title_attr} loading="lazy" class="{IMAGE_CLASS}">"#,
            escape_html(src),
            escape_html(alt)
        )
        .unwrap();
    }
}
