// Keyword extractor trait — swap-ready abstraction.
//
// The pipeline only needs "one keyword list per document, in corpus order".
// The default implementation is TF-IDF, but a different scorer (TextRank,
// embeddings) can slot in without touching the driver or the theme assigner.

use anyhow::Result;

/// Trait for extracting per-document keywords from a normalized corpus.
pub trait KeywordExtractor {
    /// Analyze the whole corpus and return one keyword list per document,
    /// in the same order as the input.
    fn extract(&self, corpus: &[String]) -> Result<Vec<Vec<String>>>;
}
