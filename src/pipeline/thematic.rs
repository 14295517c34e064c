// Thematic analysis pipeline: reviews -> normalized text -> keywords -> themes.
//
// One batch pass over the whole table:
// 1. Normalize every review's text
// 2. Fit TF-IDF over the full normalized corpus (barrier: needs every row)
// 3. Pick each review's top keywords against the fitted model
// 4. Match keywords against the theme dictionary
// 5. Write the enriched table (all-or-nothing), upstream columns intact
//
// Any error aborts the run before the output file is touched.

use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::records::models::{EnrichedRecord, ReviewRecord};
use crate::records::table;
use crate::themes::assign::ThemeAssigner;
use crate::themes::normalize::Normalizer;
use crate::themes::traits::KeywordExtractor;

/// What a pipeline run produced, for the closing summary.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub records: usize,
    /// Reviews whose normalized text came out empty
    pub empty_texts: usize,
    /// Reviews that fell back to `Other`
    pub unthemed: usize,
    /// Per-theme review counts, in dictionary order
    pub theme_counts: Vec<(String, usize)>,
}

/// Enrich reviews in memory. Row order is preserved.
pub fn enrich(
    reviews: Vec<ReviewRecord>,
    normalizer: &Normalizer,
    extractor: &dyn KeywordExtractor,
    assigner: &ThemeAssigner,
    progress: &ProgressBar,
) -> Result<(Vec<EnrichedRecord>, RunSummary)> {
    // Step 1: normalize
    progress.set_length(reviews.len() as u64);
    let corpus: Vec<String> = reviews
        .iter()
        .map(|review| {
            let normalized = normalizer.normalize(review.text.as_deref());
            progress.inc(1);
            normalized
        })
        .collect();
    progress.finish_and_clear();

    let empty_texts = corpus.iter().filter(|doc| doc.is_empty()).count();
    info!(records = corpus.len(), empty_texts, "Normalized review text");

    // Steps 2 + 3: fit over the whole corpus, then per-row keywords
    let keyword_lists = extractor.extract(&corpus)?;
    if keyword_lists.len() != corpus.len() {
        anyhow::bail!(
            "Keyword extractor returned {} keyword lists for {} reviews",
            keyword_lists.len(),
            corpus.len()
        );
    }

    // Step 4: themes
    let mut theme_counts: Vec<(String, usize)> =
        assigner.labels().map(|label| (label.to_string(), 0)).collect();
    let mut unthemed = 0;

    let enriched: Vec<EnrichedRecord> = reviews
        .into_iter()
        .zip(corpus)
        .zip(keyword_lists)
        .map(|((review, processed_review), keywords)| {
            let themes = assigner.assign(&keywords);

            if themes.is_fallback() {
                unthemed += 1;
            }
            for label in themes.labels() {
                if let Some((_, count)) = theme_counts.iter_mut().find(|(l, _)| l == label) {
                    *count += 1;
                }
            }

            EnrichedRecord {
                review,
                processed_review,
                keywords,
                themes,
            }
        })
        .collect();

    let summary = RunSummary {
        records: enriched.len(),
        empty_texts,
        unthemed,
        theme_counts,
    };

    info!(
        records = summary.records,
        unthemed = summary.unthemed,
        "Assigned themes"
    );

    Ok((enriched, summary))
}

/// Run the full pipeline: read `input`, enrich, write `output`.
pub fn run(
    input: &Path,
    output: &Path,
    normalizer: &Normalizer,
    extractor: &dyn KeywordExtractor,
    assigner: &ThemeAssigner,
) -> Result<RunSummary> {
    let source = table::read_reviews(input)
        .with_context(|| format!("Failed to load reviews from {}", input.display()))?;

    println!("Analyzing {} reviews...", source.reviews.len());

    let pb = ProgressBar::new(source.reviews.len() as u64);
    pb.set_style(ProgressStyle::default_bar().template("  Normalizing [{bar:30}] {pos}/{len} ({eta})")?);

    let (enriched, summary) = enrich(source.reviews, normalizer, extractor, assigner, &pb)?;

    table::write_enriched(output, &source.headers, &enriched)?;
    info!(output = %output.display(), "Thematic analysis complete");

    Ok(summary)
}
