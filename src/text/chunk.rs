//! Splitting speech text into synthesis-sized chunks.
//!
//! Voice engines degrade on long inputs, so text over the character budget
//! is broken at the most natural boundary available: sentence, then clause,
//! then word. Chunks never split a word, and joining them with single spaces
//! reproduces the whitespace-normalized input.

use super::expand::ends_sentence;

/// Words that open a new clause.
const CONJUNCTIONS: &[&str] = &[
    "and", "but", "or", "so", "yet", "because", "since", "while", "though", "although", "if",
    "when", "where", "which", "who",
];

/// Split `text` into chunks of at most `max_chars` characters.
///
/// A single word longer than the budget becomes its own chunk.
#[must_use]
pub fn chunk_speech(text: &str, max_chars: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }
    let normalized = words.join(" ");
    if char_len(&normalized) <= max_chars {
        return vec![normalized];
    }

    let mut pieces = Vec::new();
    for sentence in split_at(&words, ends_sentence, |_| false) {
        if char_len(&sentence) <= max_chars {
            pieces.push(sentence);
            continue;
        }
        let sentence_words: Vec<&str> = sentence.split(' ').collect();
        let clauses = split_at(
            &sentence_words,
            |w| w.ends_with([',', ';']) || w == "-",
            |w| CONJUNCTIONS.contains(&w.to_lowercase().as_str()),
        );
        for clause in pack(clauses, max_chars) {
            if char_len(&clause) <= max_chars {
                pieces.push(clause);
            } else {
                pieces.extend(pack(clause.split(' ').map(str::to_string), max_chars));
            }
        }
    }
    pack(pieces, max_chars)
}

/// Group words into runs, ending a run after a word where `ends_after`
/// holds or before a word where `starts_before` holds.
fn split_at(
    words: &[&str],
    ends_after: impl Fn(&str) -> bool,
    starts_before: impl Fn(&str) -> bool,
) -> Vec<String> {
    let mut runs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for &word in words {
        if !current.is_empty() && starts_before(word) {
            runs.push(current.join(" "));
            current.clear();
        }
        current.push(word);
        if ends_after(word) {
            runs.push(current.join(" "));
            current.clear();
        }
    }
    if !current.is_empty() {
        runs.push(current.join(" "));
    }
    runs
}

/// Greedily join adjacent pieces while the result stays within budget.
fn pack(pieces: impl IntoIterator<Item = String>, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for piece in pieces {
        if current.is_empty() {
            current = piece;
        } else if char_len(&current) + 1 + char_len(&piece) <= max_chars {
            current.push(' ');
            current.push_str(&piece);
        } else {
            chunks.push(std::mem::replace(&mut current, piece));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_lossless(text: &str, chunks: &[String]) {
        let rejoined = chunks.join(" ");
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        assert_eq!(rejoined, normalized);
    }

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(chunk_speech("  Hello   there. ", 90), vec!["Hello there."]);
        assert!(chunk_speech("   ", 90).is_empty());
    }

    #[test]
    fn sentences_are_rejoined_under_budget() {
        let text = "One two three. Four five six. Seven eight nine. Ten eleven twelve.";
        let chunks = chunk_speech(text, 30);
        assert_eq!(
            chunks,
            vec!["One two three. Four five six.", "Seven eight nine.", "Ten eleven twelve."]
        );
        assert_lossless(text, &chunks);
    }

    #[test]
    fn long_sentence_splits_at_clauses() {
        let text = "I went to the store to buy milk, but they were out of it \
                    because the truck never came and nobody knew why";
        let chunks = chunk_speech(text, 40);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 40, "over budget: {chunk}");
        }
        assert_eq!(chunks[0], "I went to the store to buy milk,");
        assert!(chunks.iter().any(|c| c.starts_with("but ")));
        assert_lossless(text, &chunks);
    }

    #[test]
    fn clause_without_boundaries_splits_between_words() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu";
        let chunks = chunk_speech(text, 20);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 20);
        }
        assert_lossless(text, &chunks);
    }

    #[test]
    fn oversized_word_stands_alone() {
        let text = "a supercalifragilisticexpialidocious b";
        let chunks = chunk_speech(text, 10);
        assert!(chunks.contains(&"supercalifragilisticexpialidocious".to_string()));
        assert_lossless(text, &chunks);
    }

    #[test]
    fn no_chunk_splits_a_word() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(10);
        let words: Vec<&str> = text.split_whitespace().collect();
        for chunk in chunk_speech(&text, 90) {
            for w in chunk.split(' ') {
                assert!(words.contains(&w));
            }
        }
    }
}
