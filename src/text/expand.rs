//! Speech rendering: forum shorthand and contractions spelled out so the
//! voice engine pronounces them unambiguously.

use std::sync::LazyLock;

use regex::Regex;

static AGE_GENDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,3})([MF])$").expect("valid regex"));

/// Upper-case forum acronyms and their spoken form.
const ACRONYMS: &[(&str, &str)] = &[
    ("AITA", "am I the asshole"),
    ("WIBTA", "would I be the asshole"),
    ("TIFU", "today I messed up"),
    ("TBH", "to be honest"),
    ("IMO", "in my opinion"),
    ("IMHO", "in my humble opinion"),
    ("BTW", "by the way"),
    ("IRL", "in real life"),
    ("SO", "significant other"),
    ("BF", "boyfriend"),
    ("GF", "girlfriend"),
    ("OP", "original poster"),
    ("NTA", "not the asshole"),
    ("YTA", "you are the asshole"),
    ("ESH", "everyone sucks here"),
    ("NAH", "no assholes here"),
    ("MIL", "mother-in-law"),
    ("FIL", "father-in-law"),
    ("SIL", "sister-in-law"),
    ("BIL", "brother-in-law"),
    ("DM", "direct message"),
];

/// Contractions the suffix rules get wrong.
const IRREGULAR: &[(&str, &str)] = &[
    ("can't", "cannot"),
    ("won't", "will not"),
    ("shan't", "shall not"),
    ("ain't", "is not"),
    ("y'all", "you all"),
    ("let's", "let us"),
    ("i'm", "i am"),
];

/// Words whose `'s` reads as "is" rather than a possessive.
const IS_PRONOUNS: &[&str] = &[
    "he", "she", "it", "that", "there", "here", "what", "who", "where", "when", "how", "this",
];

const ONES: [&str; 20] = [
    "zero",
    "one",
    "two",
    "three",
    "four",
    "five",
    "six",
    "seven",
    "eight",
    "nine",
    "ten",
    "eleven",
    "twelve",
    "thirteen",
    "fourteen",
    "fifteen",
    "sixteen",
    "seventeen",
    "eighteen",
    "nineteen",
];

const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

/// Spell out 0..=999. Tens and units are hyphenated so a number stays one
/// word below a hundred.
#[must_use]
pub fn number_to_words(n: u32) -> Option<String> {
    match n {
        0..=19 => Some(ONES[n as usize].to_string()),
        20..=99 => {
            let tens = TENS[(n / 10) as usize];
            Some(match n % 10 {
                0 => tens.to_string(),
                unit => format!("{tens}-{}", ONES[unit as usize]),
            })
        }
        100..=999 => {
            let hundreds = format!("{} hundred", ONES[(n / 100) as usize]);
            match n % 100 {
                0 => Some(hundreds),
                rest => Some(format!("{hundreds} {}", number_to_words(rest)?)),
            }
        }
        _ => None,
    }
}

/// Expand a whole display string, token by token.
#[must_use]
pub fn expand_speech(display: &str) -> String {
    let mut out = Vec::new();
    let mut sentence_start = true;
    for token in display.split_whitespace() {
        out.push(expand_token(token, sentence_start));
        sentence_start = ends_sentence(token);
    }
    out.join(" ")
}

pub(crate) fn ends_sentence(token: &str) -> bool {
    token
        .trim_end_matches(|c: char| c == '\'' || c == ')')
        .ends_with(['.', '!', '?'])
}

/// Expand one whitespace-delimited token, keeping its surrounding
/// punctuation. The result may hold several words.
#[must_use]
pub fn expand_token(token: &str, sentence_start: bool) -> String {
    let start = token
        .find(char::is_alphanumeric)
        .unwrap_or(token.len());
    let end = token
        .rfind(char::is_alphanumeric)
        .map_or(start, |i| i + token[i..].chars().next().map_or(1, char::len_utf8));
    if start >= end {
        return token.to_string();
    }
    let (lead, rest) = token.split_at(start);
    let (core, trail) = rest.split_at(end - start);

    let expanded = expand_age_gender(core)
        .or_else(|| expand_acronym(core, sentence_start))
        .or_else(|| expand_contraction(core));

    match expanded {
        Some(words) => format!("{lead}{words}{trail}"),
        None => token.to_string(),
    }
}

fn expand_age_gender(core: &str) -> Option<String> {
    let caps = AGE_GENDER.captures(core)?;
    let n: u32 = caps[1].parse().ok()?;
    Some(format!("{} {}", number_to_words(n)?, &caps[2]))
}

fn expand_acronym(core: &str, sentence_start: bool) -> Option<String> {
    let (_, spoken) = ACRONYMS.iter().find(|(short, _)| *short == core)?;
    Some(if sentence_start {
        capitalize(spoken)
    } else {
        (*spoken).to_string()
    })
}

fn expand_contraction(core: &str) -> Option<String> {
    if !core.contains('\'') {
        return None;
    }
    let lower = core.to_lowercase();
    let expanded = expand_lower(&lower)?;
    let capitalized = core.chars().next().is_some_and(char::is_uppercase);
    Some(if capitalized {
        capitalize(&expanded)
    } else {
        expanded
    })
}

fn expand_lower(lower: &str) -> Option<String> {
    if let Some((_, full)) = IRREGULAR.iter().find(|(short, _)| *short == lower) {
        return Some(fix_pronoun_i(full));
    }
    // shouldn't've, could've, I'd've
    if let Some(stem) = lower.strip_suffix("'ve") {
        let head = expand_lower(stem).unwrap_or_else(|| stem.to_string());
        return Some(fix_pronoun_i(&format!("{head} have")));
    }
    let rules: [(&str, &str); 5] = [
        ("n't", " not"),
        ("'re", " are"),
        ("'ll", " will"),
        ("'d", " would"),
        ("'m", " am"),
    ];
    for (suffix, replacement) in rules {
        if let Some(stem) = lower.strip_suffix(suffix) {
            if stem.is_empty() {
                return None;
            }
            return Some(fix_pronoun_i(&format!("{stem}{replacement}")));
        }
    }
    if let Some(stem) = lower.strip_suffix("'s") {
        if IS_PRONOUNS.contains(&stem) {
            return Some(format!("{stem} is"));
        }
    }
    None
}

fn fix_pronoun_i(words: &str) -> String {
    words
        .split(' ')
        .map(|w| if w == "i" { "I" } else { w })
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_sentence() {
        assert_eq!(
            expand_speech("I'm 17M and can't believe it"),
            "I am seventeen M and cannot believe it"
        );
    }

    #[test]
    fn age_gender_keeps_parentheses() {
        assert_eq!(
            expand_speech("My SO (28M) and I (25F)"),
            "My significant other (twenty-eight M) and I (twenty-five F)"
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(number_to_words(0).unwrap(), "zero");
        assert_eq!(number_to_words(17).unwrap(), "seventeen");
        assert_eq!(number_to_words(40).unwrap(), "forty");
        assert_eq!(number_to_words(105).unwrap(), "one hundred five");
        assert_eq!(number_to_words(999).unwrap(), "nine hundred ninety-nine");
        assert!(number_to_words(1000).is_none());
    }

    #[test]
    fn acronyms_upper_case_only() {
        assert_eq!(expand_speech("AITA for this?"), "Am I the asshole for this?");
        assert_eq!(expand_speech("it was so good"), "it was so good");
        assert_eq!(expand_speech("TBH, it's fine"), "To be honest, it is fine");
    }

    #[test]
    fn compound_and_irregular_contractions() {
        assert_eq!(
            expand_speech("won't, can't, shouldn't've"),
            "will not, cannot, should not have"
        );
        assert_eq!(expand_speech("Y'all are wild"), "You all are wild");
    }

    #[test]
    fn generic_contractions_keep_capitalization() {
        assert_eq!(
            expand_speech("You're right, we're leaving, they've gone"),
            "You are right, we are leaving, they have gone"
        );
        assert_eq!(
            expand_speech("He's not going, wasn't caught"),
            "He is not going, was not caught"
        );
        assert_eq!(expand_speech("I'd say I'll go"), "I would say I will go");
    }

    #[test]
    fn possessive_is_left_alone() {
        assert_eq!(expand_speech("my mom's car"), "my mom's car");
    }

    #[test]
    fn punctuation_only_token_is_unchanged() {
        assert_eq!(expand_token("-", false), "-");
        assert_eq!(expand_token("...", true), "...");
    }

    #[test]
    fn quoted_contraction() {
        assert_eq!(expand_speech("'I'm done.'"), "'I am done.'");
    }
}
