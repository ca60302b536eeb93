//! Text preparation.
//!
//! A narrative is rendered twice: the display rendering goes on screen and
//! the speech rendering goes to the voice engine. The two differ wherever
//! shorthand or contractions were expanded, so [`PreparedText`] keeps a word
//! map from each display word to the speech words it became. Caption timing
//! measured on speech words is collapsed back onto display words through it.

pub mod chunk;
pub mod clean;
pub mod expand;

use std::ops::Range;

pub use chunk::chunk_speech;
pub use clean::clean_display;
pub use expand::{expand_speech, number_to_words};

/// One display word and the speech words it expands to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSpan {
    pub display: String,
    /// Indices into the speech word sequence; never empty
    pub speech: Range<usize>,
}

/// Both renderings of a narrative plus the word map between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedText {
    pub display: String,
    pub speech: String,
    pub words: Vec<WordSpan>,
}

impl PreparedText {
    /// Build from an already-cleaned display string.
    #[must_use]
    pub fn from_display(display: String) -> Self {
        let mut speech_words: Vec<String> = Vec::new();
        let mut words = Vec::new();
        let mut sentence_start = true;
        for token in display.split_whitespace() {
            let expanded = expand::expand_token(token, sentence_start);
            sentence_start = expand::ends_sentence(token);
            let start = speech_words.len();
            speech_words.extend(expanded.split_whitespace().map(str::to_string));
            words.push(WordSpan {
                display: token.to_string(),
                speech: start..speech_words.len(),
            });
        }
        Self {
            speech: speech_words.join(" "),
            display,
            words,
        }
    }

    #[must_use]
    pub fn display_word_count(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn speech_word_count(&self) -> usize {
        self.words.last().map_or(0, |w| w.speech.end)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Clean and expand a title/body pair.
///
/// With `narrate_title` the title is read first, joined to the body with a
/// full stop unless it already ends a sentence.
#[must_use]
pub fn prepare(title: &str, body: &str, narrate_title: bool) -> PreparedText {
    let body = clean_display(body);
    let title = if narrate_title {
        clean_display(title)
    } else {
        String::new()
    };
    let display = match (title.is_empty(), body.is_empty()) {
        (true, _) => body,
        (false, true) => title,
        (false, false) if expand::ends_sentence(&title) => format!("{title} {body}"),
        (false, false) => format!("{title}. {body}"),
    };
    PreparedText::from_display(display)
}

#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Seconds of narration for `words` at `rate` words per second.
#[must_use]
pub fn estimate_narration_secs(words: usize, rate: f64) -> f64 {
    if rate <= 0.0 {
        return 0.0;
    }
    words as f64 / rate
}
