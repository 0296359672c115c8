//! Movie corpus loading and normalization.
//!
//! The corpus is a single JSON file mapping movie ids to records scraped from
//! an encyclopedia. Source fields are duck-typed (sometimes a string, sometimes
//! a list of strings) and carry placeholder sentinels for missing data. Loading
//! normalizes every record into a well-typed [`Movie`] before indexing.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading a corpus.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Corpus file not found at {0}")]
    NotFound(PathBuf),

    #[error("Failed to read corpus: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse corpus: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Placeholder values the scrape emits for missing data.
const SENTINELS: &[&str] = &["[]", "TBA", "? minutes", "minutes"];

/// A source field that is either a single string or a list of strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    /// Flatten to a list, dropping sentinel placeholders and empty entries.
    fn into_values(self) -> Vec<String> {
        let raw = match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        };
        raw.into_iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty() && !SENTINELS.contains(&v.as_str()))
            .collect()
    }
}

/// A movie record as it appears in the source JSON.
#[derive(Debug, Deserialize)]
struct RawMovie {
    #[serde(rename = "Title", default)]
    title: Option<OneOrMany>,
    #[serde(rename = "Text", default)]
    text: String,
    #[serde(rename = "Starring", default)]
    starring: Option<OneOrMany>,
    #[serde(rename = "Running Time", default)]
    running_time: Option<OneOrMany>,
    #[serde(rename = "Director", default)]
    director: Option<OneOrMany>,
    #[serde(rename = "Location", default)]
    location: Option<OneOrMany>,
    #[serde(rename = "Time", default)]
    time: Option<OneOrMany>,
    #[serde(rename = "Language", default)]
    language: Option<OneOrMany>,
    #[serde(rename = "Categories", default)]
    categories: Option<OneOrMany>,
    #[serde(rename = "Country", default)]
    country: Option<OneOrMany>,
}

/// A normalized movie ready for indexing.
///
/// List-valued fields keep their source order. Runtime is integer minutes,
/// absent when the source carried a sentinel or nothing parseable.
#[derive(Debug, Clone, Default)]
pub struct Movie {
    pub id: String,
    pub title: String,
    pub text: String,
    pub starring: Vec<String>,
    pub director: Vec<String>,
    pub location: Vec<String>,
    pub time: Vec<String>,
    pub language: Vec<String>,
    pub categories: Vec<String>,
    pub country: Vec<String>,
    pub runtime: Option<u64>,
}

/// A loaded movie corpus.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    movies: Vec<Movie>,
}

impl Corpus {
    /// Load a corpus from a JSON file mapping movie ids to records.
    ///
    /// Movies are ordered by numeric id so that index insertion order is
    /// stable across runs.
    ///
    /// # Errors
    ///
    /// Returns `CorpusError::NotFound` if the file doesn't exist.
    /// Returns `CorpusError::ReadError` if the file cannot be read.
    /// Returns `CorpusError::ParseError` if the JSON is invalid.
    pub fn load(path: &Path) -> Result<Self, CorpusError> {
        if !path.exists() {
            return Err(CorpusError::NotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path)?;
        let raw: std::collections::BTreeMap<String, RawMovie> = serde_json::from_str(&contents)?;

        let mut entries: Vec<(String, RawMovie)> = raw.into_iter().collect();
        entries.sort_by_key(|(id, _)| id.parse::<u64>().unwrap_or(u64::MAX));

        let movies = entries
            .into_iter()
            .map(|(id, raw)| normalize(id, raw))
            .collect();

        Ok(Self { movies })
    }

    /// Build a corpus directly from movies. Used by tests and tools.
    #[must_use]
    pub fn from_movies(movies: Vec<Movie>) -> Self {
        Self { movies }
    }

    #[must_use]
    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.movies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}

/// Normalize a raw record into a typed movie.
fn normalize(id: String, raw: RawMovie) -> Movie {
    let values = |field: Option<OneOrMany>| field.map(OneOrMany::into_values).unwrap_or_default();

    let runtime = values(raw.running_time)
        .first()
        .and_then(|v| parse_runtime(v));

    Movie {
        id,
        title: values(raw.title).join(", "),
        text: raw.text,
        starring: values(raw.starring),
        director: values(raw.director),
        location: values(raw.location),
        time: values(raw.time),
        language: values(raw.language),
        categories: values(raw.categories),
        country: values(raw.country),
        runtime,
    }
}

/// Extract integer minutes from a running-time string such as "109 minutes".
///
/// Takes the first run of digits; returns `None` when there is none.
fn parse_runtime(value: &str) -> Option<u64> {
    let digits: String = value
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}
