//! State structs for markdown rendering.
//!
//! These track context while events stream through the renderer.

use pulldown_cmark::Alignment;

/// State for tracking code block rendering.
#[derive(Default)]
pub struct CodeBlockState {
    /// Whether we're inside a code block.
    active: bool,
    /// Language of current code block (e.g., "rust", "mermaid").
    language: Option<String>,
    /// Buffer for code block content.
    buffer: String,
}

impl CodeBlockState {
    /// Start a new code block with optional language.
    pub fn start(&mut self, language: Option<String>) {
        self.active = true;
        self.language = language;
        self.buffer.clear();
    }

    /// End the current code block and return (language, content).
    ///
    /// The newline that terminates the last line is dropped.
    pub fn end(&mut self) -> (Option<String>, String) {
        self.active = false;
        let mut content = std::mem::take(&mut self.buffer);
        if content.ends_with('\n') {
            content.pop();
        }
        (self.language.take(), content)
    }

    /// Check if we're inside a code block.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Append text to the code block buffer.
    pub fn push_str(&mut self, text: &str) {
        self.buffer.push_str(text);
    }
}

/// State for tracking table rendering.
#[derive(Default)]
pub struct TableState {
    /// Whether we're inside the table header row.
    in_head: bool,
    /// Column alignments for current table.
    alignments: Vec<Alignment>,
    /// Current column index in table row.
    cell_index: usize,
}

impl TableState {
    /// Start a new table with column alignments.
    pub fn start(&mut self, alignments: Vec<Alignment>) {
        self.alignments = alignments;
        self.in_head = false;
        self.cell_index = 0;
    }

    pub fn start_head(&mut self) {
        self.in_head = true;
        self.cell_index = 0;
    }

    pub fn end_head(&mut self) {
        self.in_head = false;
    }

    pub fn start_row(&mut self) {
        self.cell_index = 0;
    }

    pub fn next_cell(&mut self) {
        self.cell_index += 1;
    }

    pub fn is_in_head(&self) -> bool {
        self.in_head
    }

    /// Get the alignment style for the current cell.
    pub fn current_alignment_style(&self) -> &'static str {
        match self.alignments.get(self.cell_index) {
            Some(Alignment::Left) => r#" style="text-align:left""#,
            Some(Alignment::Center) => r#" style="text-align:center""#,
            Some(Alignment::Right) => r#" style="text-align:right""#,
            Some(Alignment::None) | None => "",
        }
    }
}

/// State for tracking image alt text capture.
///
/// Images can nest inside link labels and vice versa, so only the outermost
/// image collects alt text; nested images contribute their label text.
#[derive(Default)]
pub struct ImageState {
    /// Nesting depth of open images.
    depth: usize,
    /// Buffer for alt text.
    alt_text: String,
    /// Pending (src, title) per open image.
    pending: Vec<(String, String)>,
}

impl ImageState {
    /// Start capturing an image.
    pub fn start(&mut self, src: String, title: String) {
        if self.depth == 0 {
            self.alt_text.clear();
        }
        self.depth += 1;
        self.pending.push((src, title));
    }

    /// End image capture.
    ///
    /// Returns `(src, title, alt)` for the outermost image, `None` for nested ones.
    pub fn end(&mut self) -> Option<(String, String, String)> {
        let (src, title) = self.pending.pop()?;
        self.depth = self.depth.saturating_sub(1);
        if self.depth > 0 {
            return None;
        }
        Some((src, title, std::mem::take(&mut self.alt_text)))
    }

    /// Check if we're inside an image.
    pub fn is_active(&self) -> bool {
        self.depth > 0
    }

    /// Append text to the alt text buffer.
    pub fn push_str(&mut self, text: &str) {
        self.alt_text.push_str(text);
    }
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html(r#""quoted""#), "&quot;quoted&quot;");
        assert_eq!(escape_html("it's"), "it&#x27;s");
    }

    #[test]
    fn test_code_block_state_drops_final_newline() {
        let mut state = CodeBlockState::default();
        state.start(Some("mermaid".to_owned()));
        assert!(state.is_active());

        state.push_str("graph TD\n");
        state.push_str("  A-->B\n");
        let (lang, content) = state.end();
        assert_eq!(lang.as_deref(), Some("mermaid"));
        assert_eq!(content, "graph TD\n  A-->B");
        assert!(!state.is_active());
    }

    #[test]
    fn test_code_block_state_keeps_inner_blank_lines() {
        let mut state = CodeBlockState::default();
        state.start(None);
        state.push_str("a\n\n\n");
        let (_, content) = state.end();
        assert_eq!(content, "a\n\n");
    }

    #[test]
    fn test_table_state_alignment() {
        let mut state = TableState::default();
        state.start(vec![Alignment::None, Alignment::Center]);

        state.start_head();
        assert!(state.is_in_head());
        assert_eq!(state.current_alignment_style(), "");

        state.next_cell();
        assert_eq!(
            state.current_alignment_style(),
            r#" style="text-align:center""#
        );

        state.end_head();
        assert!(!state.is_in_head());
    }

    #[test]
    fn test_image_state_nested() {
        let mut state = ImageState::default();
        state.start("outer.png".to_owned(), String::new());
        state.push_str("a ");
        state.start("inner.png".to_owned(), String::new());
        state.push_str("b");
        assert_eq!(state.end(), None);
        assert!(state.is_active());

        let (src, title, alt) = state.end().unwrap();
        assert_eq!(src, "outer.png");
        assert_eq!(title, "");
        assert_eq!(alt, "a b");
        assert!(!state.is_active());
    }
}
