// Text normalization — raw review text to a space-joined lemma string.
//
// Lowercases the input, splits it into word tokens, drops stopwords and
// anything that isn't purely alphabetic, and lemmatizes what's left.
// "The login FAILED!!" becomes "login fail".
//
// Stopwords are the NLTK English list, checked on the surface form and again
// on the lemma, so a contraction can't sneak a stopword into the output
// ("can't" -> "ca" -> "can"). Words a theme dictionary triggers on can be
// exempted with `keep_words`.

use std::collections::HashSet;

use stop_words::{get, LANGUAGE};

use super::lemma::Lemmatizer;

/// Normalizes review text into lowercase alphabetic lemma tokens.
#[derive(Debug, Clone)]
pub struct Normalizer {
    stop_words: HashSet<String>,
    lemmatizer: Lemmatizer,
}

impl Normalizer {
    /// English stopwords from the stop-words crate and the built-in lemmatizer.
    pub fn english() -> Self {
        Self::with_lemmatizer(Lemmatizer::english())
    }

    /// English stopwords with a caller-supplied lemmatizer.
    pub fn with_lemmatizer(lemmatizer: Lemmatizer) -> Self {
        let stop_words: Vec<String> = get(LANGUAGE::English);
        Self {
            stop_words: stop_words.into_iter().collect(),
            lemmatizer,
        }
    }

    /// Never drop these words as stopwords. Multi-word entries exempt each
    /// of their words.
    pub fn keep_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for entry in words {
            for word in entry.as_ref().split_whitespace() {
                self.stop_words.remove(&word.to_lowercase());
            }
        }
        self
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    /// Normalize a text field. Missing text normalizes to the empty string.
    pub fn normalize(&self, text: Option<&str>) -> String {
        let lower = text.unwrap_or_default().to_lowercase();

        tokenize(&lower)
            .into_iter()
            .filter(|token| is_alphabetic(token) && !self.is_stop_word(token))
            .map(|token| self.lemmatizer.lemmatize(token))
            .filter(|lemma| is_alphabetic(lemma) && !self.is_stop_word(lemma))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::english()
    }
}

fn is_alphabetic(token: &str) -> bool {
    !token.is_empty() && token.chars().all(char::is_alphabetic)
}

fn is_apostrophe(c: char) -> bool {
    c == '\'' || c == '\u{2019}'
}

/// Split text into word tokens.
///
/// Runs of letters and digits form words; whitespace and punctuation are
/// separators. A word with an apostrophe has its contraction split off:
/// "don't" -> ["do", "n't"], "app's" -> ["app", "'s"]. Split-off clitics and
/// tokens with digits stay in the output so the caller's alphabetic filter
/// decides what survives.
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();

    for chunk in text.split(|c: char| !(c.is_alphanumeric() || is_apostrophe(c))) {
        let Some((apos_at, apos)) = chunk.char_indices().find(|(_, c)| is_apostrophe(*c)) else {
            if !chunk.is_empty() {
                tokens.push(chunk);
            }
            continue;
        };

        let head = &chunk[..apos_at];
        let tail = &chunk[apos_at + apos.len_utf8()..];

        if tail == "t" && head.len() > 1 && head.ends_with('n') {
            // don't -> do + n't
            let base = &head[..head.len() - 1];
            tokens.push(base);
            tokens.push(&chunk[head.len() - 1..]);
        } else {
            if !head.is_empty() {
                tokens.push(head);
            }
            if !tail.is_empty() {
                tokens.push(&chunk[apos_at..]);
            }
        }
    }

    tokens
}
