// Thematic analysis — normalization, TF-IDF keywords, theme assignment.

pub mod assign;
pub mod lemma;
pub mod normalize;
pub mod tfidf;
pub mod traits;
