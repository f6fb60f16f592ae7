//! Shared utility functions for markdown rendering.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, TextMergeStream};

/// Parser options for the supported dialect.
///
/// CommonMark is always on. With `gfm`, tables, strikethrough and task lists
/// are enabled as well (bare-URL autolinks are handled by the renderer).
#[must_use]
pub fn parser_options(gfm: bool) -> Options {
    if gfm {
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
    } else {
        Options::empty()
    }
}

/// Parse markdown into an event stream with adjacent text events merged.
///
/// Merging matters for autolink detection, which must see a URL as one run
/// of text.
pub fn parse(markdown: &str, gfm: bool) -> impl Iterator<Item = Event<'_>> {
    TextMergeStream::new(Parser::new_ext(markdown, parser_options(gfm)))
}

/// Convert heading level enum to number (1-6).
#[must_use]
pub(crate) fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_options_gfm() {
        let options = parser_options(true);
        assert!(options.contains(Options::ENABLE_TABLES));
        assert!(options.contains(Options::ENABLE_STRIKETHROUGH));
        assert!(options.contains(Options::ENABLE_TASKLISTS));
    }

    #[test]
    fn test_parser_options_commonmark() {
        assert!(parser_options(false).is_empty());
    }

    #[test]
    fn test_parse_merges_text() {
        let texts: Vec<_> = parse("a &amp; b", false)
            .filter_map(|event| match event {
                Event::Text(text) => Some(text.into_string()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["a & b".to_owned()]);
    }
}
