// Insights report — per-bank aggregates over the enriched review table.
//
// Everything here is derived from `EnrichedRecord`s already on disk; the
// report never re-runs the thematic pipeline. The JSON written by
// `save_report` is the same struct the terminal display reads.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::records::models::{bank_display_name, find_bank, EnrichedRecord, KNOWN_BANKS};

/// How many entries each per-bank ranking keeps.
pub const TOP_K: usize = 3;

pub const POSITIVE_LABEL: &str = "POSITIVE";
pub const NEGATIVE_LABEL: &str = "NEGATIVE";

/// A ranked item and how often it occurred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranked {
    pub name: String,
    pub count: usize,
}

/// One sentiment label's share of all reviews.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentShare {
    pub label: String,
    pub count: usize,
    pub percentage: f64,
}

/// Aggregates for a single bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankInsights {
    pub code: String,
    pub name: String,
    pub reviews: usize,
    /// Mean star rating over reviews that have one
    pub average_rating: Option<f64>,
    /// Mean upstream sentiment score over reviews that have one
    pub average_sentiment_score: Option<f64>,
    pub positive_pct: f64,
    pub top_themes: Vec<Ranked>,
    /// Most common keywords in POSITIVE reviews
    pub top_drivers: Vec<Ranked>,
    /// Most common keywords in NEGATIVE reviews
    pub top_pain_points: Vec<Ranked>,
    pub recommendations: Vec<String>,
}

/// Which bank leads on each headline measure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Highlights {
    pub highest_rated: Option<String>,
    pub most_positive_sentiment: Option<String>,
    pub highest_positive_pct: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsReport {
    pub generated_at: DateTime<Utc>,
    pub total_reviews: usize,
    /// Ordered by count descending
    pub sentiment_distribution: Vec<SentimentShare>,
    pub banks: Vec<BankInsights>,
    pub highlights: Highlights,
}

/// Build the report from an enriched table.
///
/// Banks appear in the order of the known-bank list, followed by any other
/// bank codes alphabetically. Rows with no bank code only count toward the
/// totals.
pub fn build_report(records: &[EnrichedRecord]) -> InsightsReport {
    let total_reviews = records.len();

    let mut sentiment_counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        let label = record.review.sentiment_label.trim();
        if !label.is_empty() {
            *sentiment_counts.entry(label).or_insert(0) += 1;
        }
    }
    let sentiment_distribution = rank(sentiment_counts, usize::MAX)
        .into_iter()
        .map(|r| SentimentShare {
            percentage: percentage(r.count, total_reviews),
            label: r.name,
            count: r.count,
        })
        .collect();

    // Group by canonical bank code
    let mut by_bank: BTreeMap<String, Vec<&EnrichedRecord>> = BTreeMap::new();
    for record in records {
        let raw = record.review.bank.trim();
        if raw.is_empty() {
            continue;
        }
        let code = find_bank(raw).map(|b| b.code).unwrap_or(raw);
        by_bank.entry(code.to_string()).or_default().push(record);
    }

    let mut banks: Vec<BankInsights> = Vec::new();
    for known in KNOWN_BANKS {
        if let Some(rows) = by_bank.remove(known.code) {
            banks.push(analyze_bank(known.code, &rows));
        }
    }
    for (code, rows) in &by_bank {
        banks.push(analyze_bank(code, rows));
    }

    let highlights = Highlights {
        highest_rated: leader(&banks, |b| b.average_rating),
        most_positive_sentiment: leader(&banks, |b| b.average_sentiment_score),
        highest_positive_pct: leader(&banks, |b| Some(b.positive_pct)),
    };

    info!(
        total_reviews,
        banks = banks.len(),
        "Built insights report"
    );

    InsightsReport {
        generated_at: Utc::now(),
        total_reviews,
        sentiment_distribution,
        banks,
        highlights,
    }
}

fn analyze_bank(code: &str, rows: &[&EnrichedRecord]) -> BankInsights {
    let average_rating = mean(rows.iter().filter_map(|r| r.review.rating.map(|v| v as f64)));
    let average_sentiment_score = mean(rows.iter().filter_map(|r| r.review.sentiment_score));

    let positive = rows
        .iter()
        .filter(|r| is_label(r, POSITIVE_LABEL))
        .count();

    let mut themes: HashMap<&str, usize> = HashMap::new();
    let mut drivers: HashMap<&str, usize> = HashMap::new();
    let mut pain_points: HashMap<&str, usize> = HashMap::new();

    for row in rows {
        for label in row.themes.display_labels() {
            *themes.entry(label).or_insert(0) += 1;
        }

        let bucket = if is_label(row, POSITIVE_LABEL) {
            Some(&mut drivers)
        } else if is_label(row, NEGATIVE_LABEL) {
            Some(&mut pain_points)
        } else {
            None
        };
        if let Some(bucket) = bucket {
            for keyword in &row.keywords {
                *bucket.entry(keyword.as_str()).or_insert(0) += 1;
            }
        }
    }

    let top_themes = rank(themes, TOP_K);
    let recommendations = recommend(average_rating, &top_themes);

    BankInsights {
        code: code.to_string(),
        name: bank_display_name(code).to_string(),
        reviews: rows.len(),
        average_rating,
        average_sentiment_score,
        positive_pct: percentage(positive, rows.len()),
        top_themes,
        top_drivers: rank(drivers, TOP_K),
        top_pain_points: rank(pain_points, TOP_K),
        recommendations,
    }
}

/// Remedies for themes that map to a concrete product action.
const THEME_REMEDIES: &[(&str, &str)] = &[
    ("Account Access Issues", "Fix login and authentication issues"),
    ("Transaction Performance", "Optimize transaction processing speed"),
    ("User Interface & Experience", "Redesign the user interface for better usability"),
    ("Customer Support", "Improve customer support response times"),
    ("Feature Requests", "Consider adding the most requested features"),
];

/// Recommendations for one bank, most urgent first.
pub fn recommend(average_rating: Option<f64>, top_themes: &[Ranked]) -> Vec<String> {
    let mut out = Vec::new();

    match average_rating {
        Some(r) if r < 3.0 => {
            out.push("Critical: major UX overhaul needed, ratings are very low".to_string())
        }
        Some(r) if r < 4.0 => {
            out.push("Priority: address low ratings with user experience improvements".to_string())
        }
        _ => {}
    }

    for theme in top_themes {
        if let Some((_, remedy)) = THEME_REMEDIES.iter().find(|(label, _)| *label == theme.name) {
            out.push(remedy.to_string());
        }
    }

    if out.is_empty() {
        out.push("Maintain current performance".to_string());
    }
    out
}

/// Write the report as pretty JSON, creating parent directories.
pub fn save_report(report: &InsightsReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory for {}", path.display()))?;
        }
    }

    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write insights report to {}", path.display()))?;

    info!(path = %path.display(), "Saved insights report");
    Ok(())
}

fn is_label(record: &EnrichedRecord, label: &str) -> bool {
    record.review.sentiment_label.trim().eq_ignore_ascii_case(label)
}

/// Counts ranked by count descending, ties alphabetical.
fn rank(counts: HashMap<&str, usize>, k: usize) -> Vec<Ranked> {
    let mut ranked: Vec<Ranked> = counts
        .into_iter()
        .map(|(name, count)| Ranked {
            name: name.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(k);
    ranked
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        None
    } else {
        Some(sum / n as f64)
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Name of the bank with the highest value; the earlier bank wins ties.
fn leader(banks: &[BankInsights], value: impl Fn(&BankInsights) -> Option<f64>) -> Option<String> {
    let mut best: Option<(&BankInsights, f64)> = None;
    for bank in banks {
        if let Some(v) = value(bank) {
            if best.map_or(true, |(_, b)| v > b) {
                best = Some((bank, v));
            }
        }
    }
    best.map(|(bank, _)| bank.name.clone())
}
