//! Display rendering: what the viewer reads on screen.

use std::sync::LazyLock;

use regex::Regex;

static ORIGINAL_POST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)original post here:\s*\\{0,2}\[[^\]]*\]\([^)]*\)").expect("valid regex")
});

/// An edit or summary marker ends the story; everything after it goes.
static TRAILER_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)\b(?:edit|tl;?dr)\s*:.*").expect("valid regex"));

static MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid regex"));

static BARE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("valid regex"));

static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*|__|\*|_").expect("valid regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Normalize raw narrative text for captions.
///
/// Steps, in order: drop the "Original post here" link, cut at an
/// `edit:`/`tl;dr:` marker, unwrap markdown links, delete bare URLs, strip
/// emphasis markers, straighten quotes (double quotes become single), and
/// collapse whitespace.
#[must_use]
pub fn clean_display(raw: &str) -> String {
    let text = ORIGINAL_POST.replace_all(raw, "");
    let text = TRAILER_MARKER.replace(&text, "");
    let text = MARKDOWN_LINK.replace_all(&text, "$1");
    let text = BARE_URL.replace_all(&text, "");
    let text = EMPHASIS.replace_all(&text, "");
    let text = straighten_quotes(&text);
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

fn straighten_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => '\'',
            '"' | '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => '\'',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_link_markup_url_and_edit_trailer() {
        let out = clean_display("Great story [here](http://x.com). Edit: thanks all");
        assert_eq!(out, "Great story here.");
        assert!(!out.contains("http"));
        assert!(!out.contains('['));
        assert!(!out.to_lowercase().contains("thanks"));
    }

    #[test]
    fn edit_marker_spans_lines() {
        let out = clean_display("First line.\n\nEDIT: update\nmore update\nstill more");
        assert_eq!(out, "First line.");
    }

    #[test]
    fn tldr_marker_is_case_insensitive() {
        assert_eq!(clean_display("The story. tl;dr: short version"), "The story.");
        assert_eq!(clean_display("The story. TLDR: short"), "The story.");
    }

    #[test]
    fn marker_must_be_a_whole_word() {
        assert_eq!(
            clean_display("I needed to reedit: the draft"),
            "I needed to reedit: the draft"
        );
    }

    #[test]
    fn removes_original_post_reference() {
        let out = clean_display("Original post here: [link](https://r.com/abc) So it begins.");
        assert_eq!(out, "So it begins.");
    }

    #[test]
    fn removes_bare_urls_and_emphasis() {
        let out = clean_display("See https://example.com/page for **bold** and _this_ *too*");
        assert_eq!(out, "See for bold and this too");
    }

    #[test]
    fn quotes_become_single() {
        assert_eq!(
            clean_display("She said \u{201C}no\u{201D} and \"left\" it\u{2019}s over"),
            "She said 'no' and 'left' it's over"
        );
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(clean_display("  a\n\n b\t\tc  "), "a b c");
    }
}
