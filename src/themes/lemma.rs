// Rule-based English lemmatizer.
//
// Reduces inflected words to a dictionary base form: "failed" -> "fail",
// "transactions" -> "transaction", "was" -> "be". Irregular forms come from
// an exception table; everything else goes through a small set of suffix
// rules that try to land on a real word rather than a stem ("updated" ->
// "update", not "updat").
//
// Extra exceptions can be loaded from a tab-separated file so that domain
// vocabulary (app names, local terms) can be pinned without code changes.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

/// Irregular inflections and words the suffix rules would otherwise mangle.
const EXCEPTIONS: &[(&str, &str)] = &[
    // be / have / do / go
    ("am", "be"),
    ("is", "be"),
    ("are", "be"),
    ("was", "be"),
    ("were", "be"),
    ("been", "be"),
    ("being", "be"),
    ("has", "have"),
    ("had", "have"),
    ("having", "have"),
    ("does", "do"),
    ("did", "do"),
    ("done", "do"),
    ("doing", "do"),
    ("goes", "go"),
    ("went", "go"),
    ("gone", "go"),
    // irregular verbs
    ("began", "begin"),
    ("begun", "begin"),
    ("bought", "buy"),
    ("brought", "bring"),
    ("broke", "break"),
    ("broken", "break"),
    ("built", "build"),
    ("came", "come"),
    ("chose", "choose"),
    ("chosen", "choose"),
    ("felt", "feel"),
    ("found", "find"),
    ("froze", "freeze"),
    ("frozen", "freeze"),
    ("gave", "give"),
    ("given", "give"),
    ("got", "get"),
    ("gotten", "get"),
    ("held", "hold"),
    ("kept", "keep"),
    ("knew", "know"),
    ("known", "know"),
    ("left", "leave"),
    ("lost", "lose"),
    ("made", "make"),
    ("paid", "pay"),
    ("ran", "run"),
    ("said", "say"),
    ("saw", "see"),
    ("seen", "see"),
    ("sent", "send"),
    ("shown", "show"),
    ("spent", "spend"),
    ("stuck", "stick"),
    ("taken", "take"),
    ("took", "take"),
    ("thought", "think"),
    ("told", "tell"),
    ("understood", "understand"),
    ("won", "win"),
    ("wrote", "write"),
    ("written", "write"),
    ("agreed", "agree"),
    ("created", "create"),
    ("creating", "create"),
    ("ca", "can"),
    ("wo", "will"),
    // irregular plurals
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("mice", "mouse"),
    // comparatives that reviews use constantly
    ("better", "well"),
    ("best", "well"),
    ("worse", "bad"),
    ("worst", "bad"),
    ("faster", "fast"),
    ("fastest", "fast"),
    ("slower", "slow"),
    ("slowest", "slow"),
    ("easier", "easy"),
    ("easiest", "easy"),
    ("harder", "hard"),
    ("simpler", "simple"),
    // words that look inflected but are not
    ("always", "always"),
    ("news", "news"),
    ("series", "series"),
    ("species", "species"),
    ("thing", "thing"),
    ("nothing", "nothing"),
    ("something", "something"),
    ("everything", "everything"),
    ("morning", "morning"),
    ("evening", "evening"),
    ("need", "need"),
    ("speed", "speed"),
    ("feed", "feed"),
    ("seed", "seed"),
    ("bed", "bed"),
    ("red", "red"),
    ("hundred", "hundred"),
    ("processing", "processing"),
    ("missing", "missing"),
];

/// Dictionary-plus-rules lemmatizer for lowercase English tokens.
#[derive(Debug, Clone)]
pub struct Lemmatizer {
    exceptions: HashMap<String, String>,
}

impl Lemmatizer {
    /// Lemmatizer with the built-in English exception table.
    pub fn english() -> Self {
        let exceptions = EXCEPTIONS
            .iter()
            .map(|(form, lemma)| (form.to_string(), lemma.to_string()))
            .collect();
        Self { exceptions }
    }

    /// Add exceptions from a `form<TAB>lemma` file. Blank lines and lines
    /// starting with `#` are skipped. File entries override built-ins.
    ///
    /// A missing or unreadable file is an error: the caller asked for these
    /// lemmas explicitly and running without them would silently change
    /// every keyword downstream.
    pub fn with_exceptions_file(mut self, path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read lemma exceptions from {}", path.display()))?;

        let mut added = 0usize;
        for (line_no, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((form, lemma)) = line.split_once('\t') else {
                anyhow::bail!(
                    "{}:{}: expected `form<TAB>lemma`, got {:?}",
                    path.display(),
                    line_no + 1,
                    line
                );
            };
            self.exceptions
                .insert(form.trim().to_lowercase(), lemma.trim().to_lowercase());
            added += 1;
        }

        debug!(path = %path.display(), added, "Loaded lemma exceptions");
        Ok(self)
    }

    /// Reduce a lowercase word to its lemma.
    pub fn lemmatize(&self, word: &str) -> String {
        if let Some(lemma) = self.exceptions.get(word) {
            return lemma.clone();
        }
        if word.chars().count() <= 3 {
            return word.to_string();
        }

        if let Some(stem) = word.strip_suffix("ies") {
            if stem.len() >= 2 {
                return format!("{stem}y");
            }
        }
        if let Some(stem) = word.strip_suffix("sses") {
            return format!("{stem}ss");
        }
        for suffix in ["shes", "ches", "xes", "zzes"] {
            if word.ends_with(suffix) {
                return word[..word.len() - 2].to_string();
            }
        }
        if word.ends_with('s') && !(word.ends_with("ss") || word.ends_with("us") || word.ends_with("is")) {
            return word[..word.len() - 1].to_string();
        }

        if let Some(stem) = word.strip_suffix("ied") {
            return format!("{stem}y");
        }
        if let Some(stem) = word.strip_suffix("ed") {
            if has_vowel(stem) {
                return restore_base(stem);
            }
        }
        if let Some(stem) = word.strip_suffix("ing") {
            if has_vowel(stem) {
                return restore_base(stem);
            }
        }

        word.to_string()
    }
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self::english()
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

fn has_vowel(s: &str) -> bool {
    s.chars().any(|c| is_vowel(c) || c == 'y')
}

/// Turn a bare `-ed` / `-ing` stem back into a base form: undouble final
/// consonants ("stopp" -> "stop") and restore a silent `e` where English
/// spelling dropped it ("updat" -> "update", "us" -> "use"). Three-letter
/// stems keep their double letter ("add", "err").
fn restore_base(stem: &str) -> String {
    let chars: Vec<char> = stem.chars().collect();
    let n = chars.len();

    if n > 3 {
        let last = chars[n - 1];
        if last == chars[n - 2] && !is_vowel(last) && !matches!(last, 'l' | 's' | 'z') {
            return chars[..n - 1].iter().collect();
        }
    }

    if needs_silent_e(&chars) {
        format!("{stem}e")
    } else {
        stem.to_string()
    }
}

fn needs_silent_e(chars: &[char]) -> bool {
    let n = chars.len();
    let Some(&last) = chars.last() else {
        return false;
    };
    let prev = if n >= 2 { Some(chars[n - 2]) } else { None };
    let prev2 = if n >= 3 { Some(chars[n - 3]) } else { None };

    match (prev2, prev, last) {
        // activat-, updat-, creat-
        (Some(p2), Some('a'), 't') => !is_vowel(p2),
        // organiz-, amaz-, freez-
        (_, Some(p), 'z') => is_vowel(p),
        // enabl-, troubl-
        (_, Some('b'), 'l') => true,
        // lov-, improv-, receiv-
        (_, _, 'v') => true,
        // reduc-, forc-
        (_, _, 'c') => true,
        // charg-, judg-, chang-
        (_, Some('r' | 'd'), 'g') => true,
        (Some('a'), Some('n'), 'g') => true,
        // us-, clos-, caus-, pleas-
        (_, Some(p), 's') => is_vowel(p),
        // secur-, requir-
        (_, Some('u'), 'r') => true,
        (Some('u'), Some('i'), 'r') => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_verbs() {
        let l = Lemmatizer::english();
        assert_eq!(l.lemmatize("failed"), "fail");
        assert_eq!(l.lemmatize("crashing"), "crash");
        assert_eq!(l.lemmatize("updated"), "update");
        assert_eq!(l.lemmatize("using"), "use");
        assert_eq!(l.lemmatize("stopped"), "stop");
        assert_eq!(l.lemmatize("transferred"), "transfer");
        assert_eq!(l.lemmatize("loved"), "love");
    }

    #[test]
    fn plurals() {
        let l = Lemmatizer::english();
        assert_eq!(l.lemmatize("transactions"), "transaction");
        assert_eq!(l.lemmatize("replies"), "reply");
        assert_eq!(l.lemmatize("crashes"), "crash");
        assert_eq!(l.lemmatize("access"), "access");
        assert_eq!(l.lemmatize("status"), "status");
    }

    #[test]
    fn irregular_forms() {
        let l = Lemmatizer::english();
        assert_eq!(l.lemmatize("was"), "be");
        assert_eq!(l.lemmatize("took"), "take");
        assert_eq!(l.lemmatize("children"), "child");
        assert_eq!(l.lemmatize("need"), "need");
    }

    #[test]
    fn short_double_consonant_stems() {
        let l = Lemmatizer::english();
        assert_eq!(l.lemmatize("added"), "add");
        assert_eq!(l.lemmatize("adding"), "add");
        assert_eq!(l.lemmatize("erred"), "err");
        assert_eq!(l.lemmatize("planned"), "plan");
    }

    #[test]
    fn gerunds_used_as_nouns() {
        let l = Lemmatizer::english();
        assert_eq!(l.lemmatize("processing"), "processing");
        assert_eq!(l.lemmatize("missing"), "missing");
        assert_eq!(l.lemmatize("requested"), "request");
    }

    #[test]
    fn exceptions_file_overrides_builtins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lemmas.tsv");
        std::fs::write(&path, "# custom\nbirr\tbirr\nwas\twas\n\n").unwrap();

        let l = Lemmatizer::english().with_exceptions_file(&path).unwrap();
        assert_eq!(l.lemmatize("was"), "was");
        assert_eq!(l.lemmatize("birr"), "birr");
    }

    #[test]
    fn exceptions_file_missing_is_error() {
        let result = Lemmatizer::english().with_exceptions_file(Path::new("/nonexistent/lemmas.tsv"));
        assert!(result.is_err());
    }

    #[test]
    fn exceptions_file_malformed_line_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lemmas.tsv");
        std::fs::write(&path, "no tab here\n").unwrap();
        assert!(Lemmatizer::english().with_exceptions_file(&path).is_err());
    }
}
