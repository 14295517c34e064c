// Data models — review records as they flow through the pipeline.
//
// `ReviewRecord` is what the upstream scrape + sentiment stages produce.
// `EnrichedRecord` is the same review plus the columns thematic analysis
// appends. Both are plain data; CSV specifics live in `records::table`.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::themes::assign::ThemeSet;

/// A single app review with its upstream sentiment scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Free-text review body
    #[serde(rename = "review", default)]
    pub text: Option<String>,
    /// Star rating (1-5). Pandas writes integer columns with gaps as floats,
    /// so "4.0" is accepted too.
    #[serde(default, deserialize_with = "lenient_int")]
    pub rating: Option<i64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub date: Option<NaiveDate>,
    /// Bank code, e.g. "CBE"
    #[serde(default)]
    pub bank: String,
    /// Where the review came from, e.g. "Google Play"
    #[serde(default)]
    pub source: String,
    /// Upstream classifier label, e.g. "POSITIVE" / "NEGATIVE"
    #[serde(default)]
    pub sentiment_label: String,
    /// Upstream classifier confidence (0.0 to 1.0)
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub sentiment_score: Option<f64>,
    /// Every field of the source row, verbatim and in header order. Empty
    /// for records built in memory.
    #[serde(skip)]
    pub columns: Vec<String>,
}

impl ReviewRecord {
    /// Review text with missing values coerced to the empty string.
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}

/// A review plus the derived thematic-analysis fields.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub review: ReviewRecord,
    /// Lowercase lemma tokens, stopwords removed
    pub processed_review: String,
    /// Top TF-IDF keywords, highest weight first
    pub keywords: Vec<String>,
    pub themes: ThemeSet,
}

/// Static info about a bank whose app reviews we analyze.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub app_package: &'static str,
}

/// Banks the scraper collects reviews for.
pub const KNOWN_BANKS: &[BankInfo] = &[
    BankInfo {
        code: "CBE",
        name: "Commercial Bank of Ethiopia",
        app_package: "com.combanketh",
    },
    BankInfo {
        code: "BOA",
        name: "Bank of Abyssinia",
        app_package: "com.bankofabyssinia.boaapp",
    },
    BankInfo {
        code: "Dashen",
        name: "Dashen Bank",
        app_package: "com.tekln.dashentab",
    },
];

/// Look up a bank by code, case-insensitively.
pub fn find_bank(code: &str) -> Option<&'static BankInfo> {
    KNOWN_BANKS
        .iter()
        .find(|b| b.code.eq_ignore_ascii_case(code.trim()))
}

/// Display name for a bank code; unknown codes display as themselves.
pub fn bank_display_name(code: &str) -> &str {
    match find_bank(code) {
        Some(bank) => bank.name,
        None => code,
    }
}

/// Accept "4", "4.0", " 4 " as 4; anything else (including blanks) as None.
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        let s = s.trim();
        s.parse::<i64>().ok().or_else(|| {
            s.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        })
    }))
}
