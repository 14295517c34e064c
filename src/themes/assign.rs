// Rule-based theme assignment.
//
// Each theme has a list of trigger words. A review gets a theme when any of
// its extracted keywords contains one of that theme's triggers as a whole
// word. Themes aren't exclusive: "cannot login, support never answers" can
// land in both "Account Access Issues" and "Customer Support".
//
// The dictionary is plain data (a JSON file) so themes can be retuned
// without a rebuild; the built-in default covers the banking-app themes.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Label used when no theme matches.
pub const FALLBACK_THEME: &str = "Other";

/// One theme and the words that trigger it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub label: String,
    pub triggers: Vec<String>,
}

/// Ordered theme → trigger-word mapping. Declaration order is the order
/// matched themes are rendered in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThemeDictionary {
    themes: Vec<Theme>,
}

impl ThemeDictionary {
    pub fn new(themes: Vec<Theme>) -> Result<Self> {
        let mut seen = HashSet::new();
        for theme in &themes {
            if theme.label.trim().is_empty() {
                anyhow::bail!("Theme dictionary contains a theme with an empty label");
            }
            if !seen.insert(theme.label.as_str()) {
                anyhow::bail!("Theme dictionary lists {:?} more than once", theme.label);
            }
        }

        // Keywords are lowercase; triggers must be too or they can never match.
        let themes = themes
            .into_iter()
            .map(|t| Theme {
                label: t.label,
                triggers: t
                    .triggers
                    .iter()
                    .map(|w| w.trim().to_lowercase())
                    .filter(|w| !w.is_empty())
                    .collect(),
            })
            .collect();

        Ok(Self { themes })
    }

    /// The banking-app themes used when no dictionary file is configured.
    pub fn banking_default() -> Self {
        let theme = |label: &str, triggers: &[&str]| Theme {
            label: label.to_string(),
            triggers: triggers.iter().map(|t| t.to_string()).collect(),
        };

        Self {
            themes: vec![
                theme(
                    "Account Access Issues",
                    &["login", "password", "access", "authentication", "error"],
                ),
                theme(
                    "Transaction Performance",
                    &["transfer", "transaction", "delay", "slow", "fast", "processing"],
                ),
                theme(
                    "User Interface & Experience",
                    &["ui", "design", "navigation", "easy", "difficult", "layout"],
                ),
                theme(
                    "Customer Support",
                    &["support", "help", "service", "response", "contact"],
                ),
                theme(
                    "Feature Requests",
                    &["feature", "add", "request", "missing", "new", "update"],
                ),
            ],
        }
    }

    /// Load a dictionary from a JSON file: an array of
    /// `{"label": ..., "triggers": [...]}` objects.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read theme dictionary from {}", path.display()))?;
        let themes: Vec<Theme> = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid theme dictionary JSON in {}", path.display()))?;
        let dictionary = Self::new(themes)?;
        debug!(path = %path.display(), themes = dictionary.len(), "Loaded theme dictionary");
        Ok(dictionary)
    }

    pub fn themes(&self) -> &[Theme] {
        &self.themes
    }

    /// Every trigger of every theme, in declaration order.
    pub fn triggers(&self) -> impl Iterator<Item = &str> {
        self.themes
            .iter()
            .flat_map(|t| t.triggers.iter().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.themes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }
}

impl Default for ThemeDictionary {
    fn default() -> Self {
        Self::banking_default()
    }
}

/// The themes assigned to one review, in dictionary order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ThemeSet {
    labels: Vec<String>,
}

impl ThemeSet {
    pub fn from_labels(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// Parse a rendered theme string back into labels. `Other` and blank
    /// strings become the empty set.
    pub fn parse(rendered: &str) -> Self {
        let labels = rendered
            .split(',')
            .map(str::trim)
            .filter(|l| !l.is_empty() && *l != FALLBACK_THEME)
            .map(str::to_string)
            .collect();
        Self { labels }
    }

    /// Matched labels; empty when the review falls back to `Other`.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn is_fallback(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels as displayed: the matches, or `["Other"]`.
    pub fn display_labels(&self) -> Vec<&str> {
        if self.labels.is_empty() {
            vec![FALLBACK_THEME]
        } else {
            self.labels.iter().map(String::as_str).collect()
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.display_labels().contains(&label)
    }
}

impl fmt::Display for ThemeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_labels().join(", "))
    }
}

/// A theme with its triggers compiled to word-boundary patterns.
struct CompiledTheme {
    label: String,
    patterns: Vec<Regex>,
}

/// Assigns themes to keyword lists using a compiled theme dictionary.
pub struct ThemeAssigner {
    themes: Vec<CompiledTheme>,
}

impl ThemeAssigner {
    pub fn new(dictionary: &ThemeDictionary) -> Result<Self> {
        let themes = dictionary
            .themes()
            .iter()
            .map(|theme| {
                let patterns = theme
                    .triggers
                    .iter()
                    .map(|trigger| {
                        let pattern = format!(r"\b{}\b", regex_lite::escape(trigger));
                        Regex::new(&pattern).with_context(|| {
                            format!("Bad trigger {trigger:?} in theme {:?}", theme.label)
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok::<_, anyhow::Error>(CompiledTheme {
                    label: theme.label.clone(),
                    patterns,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { themes })
    }

    /// Theme labels in dictionary order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.themes.iter().map(|t| t.label.as_str())
    }

    /// Every theme with a trigger that whole-word matches any keyword.
    pub fn assign<S: AsRef<str>>(&self, keywords: &[S]) -> ThemeSet {
        let labels = self
            .themes
            .iter()
            .filter(|theme| {
                theme.patterns.iter().any(|pattern| {
                    keywords
                        .iter()
                        .any(|keyword| pattern.is_match(keyword.as_ref()))
                })
            })
            .map(|theme| theme.label.clone())
            .collect();

        ThemeSet { labels }
    }
}
