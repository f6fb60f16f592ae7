//! Render backend trait for overridable render rules.
//!
//! A backend decides how the two customizable block kinds are written. All
//! other constructs fall back to the default methods below or to the generic
//! renderer.

/// Backend trait for format-specific rendering operations.
///
/// Implementations provide:
/// - Code blocks (HTML uses a styled `<pre><code>`)
/// - Images (HTML uses a lazily loaded `<img>`)
///
/// Everything else has a default.
pub trait RenderBackend {
    /// Render a code block that no processor claimed.
    ///
    /// # Arguments
    ///
    /// * `lang` - Optional language identifier (e.g., "rust", "python")
    /// * `content` - The raw code content, unescaped
    /// * `out` - Output buffer to write to
    fn code_block(lang: Option<&str>, content: &str, out: &mut String);

    /// Render an image.
    ///
    /// # Arguments
    ///
    /// * `src` - Image source URL, possibly empty
    /// * `alt` - Alt text collected from the image label
    /// * `title` - Title attribute, empty when absent
    /// * `out` - Output buffer to write to
    fn image(src: &str, alt: &str, title: &str, out: &mut String);

    /// Render blockquote start tag.
    fn blockquote_start(out: &mut String) {
        out.push_str("<blockquote>");
    }

    /// Render blockquote end tag.
    fn blockquote_end(out: &mut String) {
        out.push_str("</blockquote>");
    }

    /// Render a hard break.
    ///
    /// Default uses `<br>`.
    fn hard_break(out: &mut String) {
        out.push_str("<br>");
    }

    /// Render a horizontal rule.
    ///
    /// Default uses `<hr>`.
    fn horizontal_rule(out: &mut String) {
        out.push_str("<hr>");
    }

    /// Render a task list marker.
    ///
    /// Default uses a disabled HTML checkbox.
    fn task_list_marker(checked: bool, out: &mut String) {
        if checked {
            out.push_str(r#"<input type="checkbox" checked disabled> "#);
        } else {
            out.push_str(r#"<input type="checkbox" disabled> "#);
        }
    }
}
