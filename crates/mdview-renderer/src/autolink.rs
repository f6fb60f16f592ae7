//! Bare URL autolinking (GFM extended autolinks).
//!
//! pulldown-cmark only links `<https://...>` style autolinks, so bare
//! `https://`, `http://` and `www.` URLs in text are linked here.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

use crate::state::escape_html;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:https?://|www\.)[^\s<]+").unwrap());

/// Characters that end a sentence rather than a URL.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ':', ';', '!', '?', '\'', '"', '*', '_', '~'];

/// Write `text` escaped, wrapping bare URLs in `<a>` elements.
pub(crate) fn push_autolinked(text: &str, out: &mut String) {
    let mut last = 0;

    for found in URL_PATTERN.find_iter(text) {
        if !starts_at_boundary(text, found.start()) {
            continue;
        }
        let url = trim_url(found.as_str());
        if !has_host(url) {
            continue;
        }

        out.push_str(&escape_html(&text[last..found.start()]));
        let href = if url.len() >= 4 && url[..4].eq_ignore_ascii_case("www.") {
            format!("http://{url}")
        } else {
            url.to_owned()
        };
        write!(
            out,
            r#"<a href="{}">{}</a>"#,
            escape_html(&href),
            escape_html(url)
        )
        .unwrap();
        last = found.start() + url.len();
    }

    out.push_str(&escape_html(&text[last..]));
}

/// Autolinks only start at the beginning of text, after whitespace, or after
/// an opening delimiter.
fn starts_at_boundary(text: &str, start: usize) -> bool {
    text[..start]
        .chars()
        .next_back()
        .is_none_or(|c| c.is_whitespace() || matches!(c, '*' | '_' | '~' | '('))
}

/// Strip trailing punctuation and unbalanced closing parentheses.
fn trim_url(url: &str) -> &str {
    let mut end = url.len();
    loop {
        let candidate = &url[..end];
        if let Some(stripped) = candidate.strip_suffix(TRAILING_PUNCTUATION) {
            end = stripped.len();
        } else if candidate.ends_with(')')
            && candidate.matches(')').count() > candidate.matches('(').count()
        {
            end -= 1;
        } else {
            return candidate;
        }
    }
}

fn has_host(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    let rest = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .or_else(|| lower.strip_prefix("www."))
        .unwrap_or("");
    rest.chars().next().is_some_and(char::is_alphanumeric)
}
