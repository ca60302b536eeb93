//! Grouping timed words into caption phrases.

use serde::{Deserialize, Serialize};

/// A word with its spoken interval, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedWord {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl TimedWord {
    #[must_use]
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }
}

/// A short run of words shown together.
#[derive(Debug, Clone, PartialEq)]
pub struct Phrase {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

/// Phrase length bounds and the punctuation that may end a phrase early.
#[derive(Debug, Clone)]
pub struct PhraseRules {
    pub min_words: usize,
    pub max_words: usize,
    pub break_punctuation: Vec<char>,
}

impl Default for PhraseRules {
    fn default() -> Self {
        Self {
            min_words: 2,
            max_words: 3,
            break_punctuation: ".!?,;:".chars().collect(),
        }
    }
}

impl PhraseRules {
    fn breaks_after(&self, word: &str) -> bool {
        word.trim_end_matches(['\'', ')'])
            .ends_with(self.break_punctuation.as_slice())
    }
}

/// Group words into phrases and close the gaps between them.
///
/// A phrase ends at `max_words`, or earlier once `min_words` is reached and
/// the last word ends with break punctuation. The last phrase keeps its own
/// end; every other phrase ends where the next begins.
#[must_use]
pub fn group_phrases(words: &[TimedWord], rules: &PhraseRules) -> Vec<Phrase> {
    let max = rules.max_words.max(1);
    let mut phrases = Vec::new();
    let mut current: Vec<&TimedWord> = Vec::new();

    for word in words {
        current.push(word);
        let len = current.len();
        if len >= max || (len >= rules.min_words && rules.breaks_after(&word.text)) {
            phrases.push(to_phrase(&current));
            current.clear();
        }
    }
    if !current.is_empty() {
        phrases.push(to_phrase(&current));
    }

    close_gaps(&mut phrases);
    phrases
}

fn to_phrase(words: &[&TimedWord]) -> Phrase {
    Phrase {
        text: words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" "),
        start: words.first().map_or(0.0, |w| w.start),
        end: words.last().map_or(0.0, |w| w.end),
    }
}

/// Extend (or shorten) each phrase to the start of the next.
pub fn close_gaps(phrases: &mut [Phrase]) {
    for i in 1..phrases.len() {
        let next_start = phrases[i].start;
        phrases[i - 1].end = next_start;
    }
}
