//! Word-list profanity masking.

use std::collections::BTreeSet;

use regex::{Captures, Regex, RegexBuilder};

/// Stand-in for empty input; the matcher never sees an empty string.
const EMPTY_SENTINEL: &str = "_";

const DEFAULT_WORDS: &[&str] = &[
    "arse", "arsehole", "asshole", "bastard", "bitch", "bollocks", "bullshit", "cock", "crap",
    "cunt", "damn", "dick", "dickhead", "fag", "faggot", "fuck", "fucked", "fucker", "fucking",
    "goddamn", "motherfucker", "nigger", "piss", "prick", "pussy", "shit", "shitty", "slut",
    "twat", "wanker", "whore",
];

/// Masks denylisted words with a placeholder character.
///
/// Matching is case-insensitive and only hits whole words, so `class` is
/// left alone even though it contains a denylisted word. Every character of
/// a match is replaced, keeping the text length stable.
///
/// # Example
///
/// ```
/// use post_parser::ProfanityFilter;
///
/// let filter = ProfanityFilter::with_words(["heck"]);
/// assert_eq!(filter.mask("what the Heck"), "what the ****");
/// assert_eq!(filter.mask(""), "");
/// ```
#[derive(Debug, Clone)]
pub struct ProfanityFilter {
    words: BTreeSet<String>,
    placeholder: char,
    pattern: Option<Regex>,
}

impl ProfanityFilter {
    /// Filter using only the given words.
    pub fn with_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words = words
            .into_iter()
            .map(Into::into)
            .filter(|w: &String| !w.trim().is_empty())
            .map(|w| w.to_lowercase())
            .collect();
        Self::compile(words, '*')
    }

    /// Add words to the denylist.
    pub fn add_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.words.extend(
            words
                .into_iter()
                .map(Into::into)
                .filter(|w: &String| !w.trim().is_empty())
                .map(|w| w.to_lowercase()),
        );
        Self::compile(self.words, self.placeholder)
    }

    /// Remove words from the denylist.
    pub fn remove_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            self.words.remove(&word.as_ref().to_lowercase());
        }
        Self::compile(self.words, self.placeholder)
    }

    /// Character substituted for each masked character.
    pub fn placeholder(mut self, placeholder: char) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    fn compile(words: BTreeSet<String>, placeholder: char) -> Self {
        let pattern = if words.is_empty() {
            None
        } else {
            let alternation = words
                .iter()
                .map(|w| regex::escape(w))
                .collect::<Vec<_>>()
                .join("|");
            match RegexBuilder::new(&format!(r"\b(?:{alternation})\b"))
                .case_insensitive(true)
                .build()
            {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::warn!("Profanity word list rejected, masking disabled: {e}");
                    None
                }
            }
        };
        Self {
            words,
            placeholder,
            pattern,
        }
    }

    /// Mask every denylisted word in `text`.
    pub fn mask(&self, text: &str) -> String {
        let input = if text.is_empty() { EMPTY_SENTINEL } else { text };

        let cleaned = match &self.pattern {
            Some(re) => re
                .replace_all(input, |caps: &Captures| {
                    self.placeholder
                        .to_string()
                        .repeat(caps[0].chars().count())
                })
                .into_owned(),
            None => input.to_string(),
        };

        if cleaned == EMPTY_SENTINEL {
            String::new()
        } else {
            cleaned
        }
    }
}

impl Default for ProfanityFilter {
    fn default() -> Self {
        Self::with_words(DEFAULT_WORDS.iter().copied())
    }
}
