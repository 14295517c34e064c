use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::themes::assign::ThemeDictionary;
use crate::themes::lemma::Lemmatizer;
use crate::themes::normalize::Normalizer;
use crate::themes::tfidf::TfIdfExtractor;

pub const DEFAULT_INPUT: &str = "data/processed/reviews_with_sentiment.csv";
pub const DEFAULT_OUTPUT: &str = "data/processed/reviews_with_themes.csv";
pub const DEFAULT_REPORT: &str = "reports/insights_report.json";

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. CLI flags
/// override individual fields after loading.
#[derive(Debug, Clone)]
pub struct Config {
    /// Sentiment-enriched review table read by `run`
    pub input_path: PathBuf,
    /// Theme-enriched table written by `run`, read by `report` and `load`
    pub output_path: PathBuf,
    /// Theme dictionary JSON; the built-in banking themes when unset
    pub themes_path: Option<PathBuf>,
    /// Extra lemma exceptions (`form<TAB>lemma` per line)
    pub lemmas_path: Option<PathBuf>,
    pub top_n_keywords: usize,
    pub max_features: usize,
    pub db_path: String,
    pub report_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT),
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            themes_path: None,
            lemmas_path: None,
            top_n_keywords: 3,
            max_features: 1000,
            db_path: "./themescope.db".to_string(),
            report_path: PathBuf::from(DEFAULT_REPORT),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default. Numeric settings that are set but don't
    /// parse are an error rather than silently ignored.
    pub fn load() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            input_path: env_path("THEMESCOPE_INPUT").unwrap_or(defaults.input_path),
            output_path: env_path("THEMESCOPE_OUTPUT").unwrap_or(defaults.output_path),
            themes_path: env_path("THEMESCOPE_THEMES"),
            lemmas_path: env_path("THEMESCOPE_LEMMAS"),
            top_n_keywords: env_usize("THEMESCOPE_TOP_N")?.unwrap_or(defaults.top_n_keywords),
            max_features: env_usize("THEMESCOPE_MAX_FEATURES")?
                .unwrap_or(defaults.max_features),
            db_path: env::var("THEMESCOPE_DB_PATH").unwrap_or(defaults.db_path),
            report_path: env_path("THEMESCOPE_REPORT_PATH").unwrap_or(defaults.report_path),
        })
    }

    /// Check the extractor settings are usable.
    /// Call this before any command that fits TF-IDF.
    pub fn require_extractor(&self) -> Result<()> {
        if self.top_n_keywords == 0 {
            anyhow::bail!(
                "THEMESCOPE_TOP_N must be at least 1.\n\
                 Set it in your .env file or pass --top-n."
            );
        }
        if self.max_features == 0 {
            anyhow::bail!(
                "THEMESCOPE_MAX_FEATURES must be at least 1.\n\
                 Set it in your .env file or pass --max-features."
            );
        }
        Ok(())
    }

    /// Check that the review table to analyze exists.
    pub fn require_input(&self) -> Result<()> {
        if !self.input_path.exists() {
            anyhow::bail!(
                "Review table not found at {}\n\
                 Set THEMESCOPE_INPUT or pass --input.",
                self.input_path.display()
            );
        }
        Ok(())
    }

    /// Check that the enriched table exists (for `report` and `load`).
    pub fn require_enriched(&self) -> Result<()> {
        if !self.output_path.exists() {
            anyhow::bail!(
                "Enriched table not found at {}\n\
                 Run `themescope run` first.",
                self.output_path.display()
            );
        }
        Ok(())
    }

    /// The active theme dictionary. A configured file that can't be loaded
    /// is an error, never a silent fallback to the defaults.
    pub fn theme_dictionary(&self) -> Result<ThemeDictionary> {
        match &self.themes_path {
            Some(path) => ThemeDictionary::from_file(path)
                .with_context(|| format!("THEMESCOPE_THEMES points at {}", path.display())),
            None => Ok(ThemeDictionary::banking_default()),
        }
    }

    /// The text normalizer, with any configured lemma exceptions applied.
    /// Words the dictionary triggers on are never dropped as stopwords.
    pub fn normalizer(&self, dictionary: &ThemeDictionary) -> Result<Normalizer> {
        let mut lemmatizer = Lemmatizer::english();
        if let Some(path) = &self.lemmas_path {
            lemmatizer = lemmatizer
                .with_exceptions_file(path)
                .with_context(|| format!("THEMESCOPE_LEMMAS points at {}", path.display()))?;
        }
        Ok(Normalizer::with_lemmatizer(lemmatizer).keep_words(dictionary.triggers()))
    }

    pub fn extractor(&self) -> TfIdfExtractor {
        TfIdfExtractor {
            top_n_keywords: self.top_n_keywords,
            max_features: self.max_features,
        }
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

fn env_usize(key: &str) -> Result<Option<usize>> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            let value = raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("{key} must be a whole number, got {raw:?}"))?;
            Ok(Some(value))
        }
        _ => Ok(None),
    }
}
