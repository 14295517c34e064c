// TF-IDF keyword extraction.
//
// Fits a unigram + bigram vocabulary over the whole normalized corpus, then
// picks the highest-weighted terms of each document as its keywords.
//
// Each review is a separate document for IDF. Words that appear in every
// review get downweighted, words distinctive to a few reviews get boosted.
// Fitting needs global corpus statistics, so it's a hard barrier: `fit`
// returns a `FittedVocabulary` and only that value can score documents.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use tracing::{debug, info};

use super::traits::KeywordExtractor;

/// A keyword picked for a document, with its TF-IDF weight in that document.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredKeyword {
    pub term: String,
    /// Column index in the fitted vocabulary
    pub index: usize,
    pub weight: f64,
}

/// One document's row of the document-term matrix: `(column, weight)` pairs
/// for the terms present, ordered by column.
pub type SparseRow = Vec<(usize, f64)>;

/// TF-IDF keyword extractor over unigrams and bigrams with a capped vocabulary.
#[derive(Debug, Clone)]
pub struct TfIdfExtractor {
    /// How many keywords to keep per document
    pub top_n_keywords: usize,
    /// Vocabulary cap, by descending corpus-wide term frequency
    pub max_features: usize,
}

impl Default for TfIdfExtractor {
    fn default() -> Self {
        Self {
            top_n_keywords: 3,
            max_features: 1000,
        }
    }
}

impl TfIdfExtractor {
    /// Build the vocabulary and IDF statistics from the full corpus.
    ///
    /// An empty corpus (or one with no usable terms) yields an empty
    /// vocabulary, which scores every document as empty.
    pub fn fit(&self, corpus: &[String]) -> FittedVocabulary {
        let mut term_freq: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for doc in corpus {
            let counts = count_terms(doc);
            for (term, count) in counts {
                *term_freq.entry(term.clone()).or_insert(0) += count;
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let distinct = term_freq.len();

        // Keep the most frequent terms; ties go to the alphabetically first.
        let mut ranked: Vec<(String, usize)> = term_freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.max_features);

        // Column order is alphabetical so it doesn't depend on hash order.
        let mut terms: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        terms.sort();

        let n_docs = corpus.len() as f64;
        let idf: Vec<f64> = terms
            .iter()
            .map(|term| {
                let df = doc_freq.get(term).copied().unwrap_or(0) as f64;
                ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        let index: HashMap<String, usize> = terms
            .iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i))
            .collect();

        info!(
            documents = corpus.len(),
            distinct_terms = distinct,
            vocabulary = terms.len(),
            "Fitted TF-IDF vocabulary"
        );

        FittedVocabulary {
            terms,
            index,
            idf,
            top_n: self.top_n_keywords,
        }
    }
}

impl KeywordExtractor for TfIdfExtractor {
    fn extract(&self, corpus: &[String]) -> Result<Vec<Vec<String>>> {
        let fitted = self.fit(corpus);
        let matrix = fitted.transform(corpus);

        let keywords: Vec<Vec<String>> = matrix
            .iter()
            .map(|row| {
                fitted
                    .top_keywords(row)
                    .into_iter()
                    .map(|k| k.term)
                    .collect()
            })
            .collect();

        let empty = keywords.iter().filter(|k| k.is_empty()).count();
        debug!(documents = keywords.len(), empty, "Extracted per-document keywords");

        Ok(keywords)
    }
}

/// Vocabulary and IDF statistics fitted over one corpus.
///
/// Read-only once built; every row lookup shares the same column order.
#[derive(Debug, Clone)]
pub struct FittedVocabulary {
    terms: Vec<String>,
    index: HashMap<String, usize>,
    idf: Vec<f64>,
    top_n: usize,
}

impl FittedVocabulary {
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Vocabulary terms in column order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn contains(&self, term: &str) -> bool {
        self.index.contains_key(term)
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.index.get(term).map(|&i| self.idf[i])
    }

    /// L2-normalized TF-IDF row for one normalized document. Terms outside
    /// the vocabulary are ignored.
    pub fn transform_one(&self, doc: &str) -> SparseRow {
        let mut row: SparseRow = count_terms(doc)
            .into_iter()
            .filter_map(|(term, count)| {
                self.index
                    .get(&term)
                    .map(|&i| (i, count as f64 * self.idf[i]))
            })
            .collect();

        let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut row {
                *w /= norm;
            }
        }

        row.sort_by_key(|(i, _)| *i);
        row
    }

    /// Document-term matrix for a corpus, one row per document in input order.
    pub fn transform(&self, corpus: &[String]) -> Vec<SparseRow> {
        corpus.iter().map(|doc| self.transform_one(doc)).collect()
    }

    /// The top-N terms of a row: descending weight, ties to the lower
    /// column index, zero weights dropped.
    pub fn top_keywords(&self, row: &[(usize, f64)]) -> Vec<ScoredKeyword> {
        let mut candidates: Vec<(usize, f64)> =
            row.iter().copied().filter(|(_, w)| *w > 0.0).collect();

        candidates.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });

        candidates
            .into_iter()
            .take(self.top_n)
            .map(|(index, weight)| ScoredKeyword {
                term: self.terms[index].clone(),
                index,
                weight,
            })
            .collect()
    }
}

/// Word tokens the vectorizer considers: at least two characters long.
fn analyzer_tokens(doc: &str) -> Vec<&str> {
    doc.split_whitespace()
        .filter(|t| t.chars().count() >= 2)
        .collect()
}

/// Unigram and bigram counts for one document.
fn count_terms(doc: &str) -> BTreeMap<String, usize> {
    let tokens = analyzer_tokens(doc);
    let mut counts = BTreeMap::new();

    for token in &tokens {
        *counts.entry((*token).to_string()).or_insert(0) += 1;
    }
    for pair in tokens.windows(2) {
        *counts.entry(format!("{} {}", pair[0], pair[1])).or_insert(0) += 1;
    }

    counts
}
