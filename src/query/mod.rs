//! Query model: the validated in-memory form of a search request.
//!
//! A [`SearchForm`] carries the raw strings a search form submits. Parsing it
//! yields a [`QueryModel`] with typed runtime bounds, or a [`QueryError`] when
//! a numeric filter doesn't parse; no backend call is made for invalid input.

pub mod compiler;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while validating a search form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid {field} filter: {value:?} is not a non-negative whole number")]
    InvalidRuntime {
        field: &'static str,
        value: String,
    },
}

/// Raw search form fields, exactly as submitted.
///
/// Empty strings mean "no constraint". Runtime bounds stay strings here so
/// that validation happens in one place, whichever surface the form came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchForm {
    pub text: String,
    pub starring: String,
    pub director: String,
    pub language: String,
    pub location: String,
    pub time: String,
    pub categories: String,
    pub country: String,
    pub min_runtime: String,
    pub max_runtime: String,
    pub page: usize,
}

impl SearchForm {
    /// Validate the form into a query model.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidRuntime` when a non-empty runtime bound is
    /// not a non-negative whole number of minutes.
    pub fn parse(&self) -> Result<QueryModel, QueryError> {
        let min_runtime = parse_bound(&self.min_runtime, "minimum runtime")?;
        let max_runtime = parse_bound(&self.max_runtime, "maximum runtime")?;

        Ok(QueryModel {
            text: self.text.trim().to_string(),
            starring: self.starring.trim().to_string(),
            director: self.director.trim().to_string(),
            language: self.language.trim().to_string(),
            location: self.location.trim().to_string(),
            time: self.time.trim().to_string(),
            categories: self.categories.trim().to_string(),
            country: self.country.trim().to_string(),
            min_runtime,
            max_runtime,
            page: self.page.max(1),
        })
    }
}

/// A validated search request.
///
/// Runtime bounds are explicit options: `None` means unbounded, there is no
/// numeric sentinel. `page` is 1-based.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryModel {
    pub text: String,
    pub starring: String,
    pub director: String,
    pub language: String,
    pub location: String,
    pub time: String,
    pub categories: String,
    pub country: String,
    pub min_runtime: Option<u64>,
    pub max_runtime: Option<u64>,
    pub page: usize,
}

impl QueryModel {
    /// Render the model back into form fields, for re-displaying the search
    /// form alongside results. Absent bounds render as empty strings.
    #[must_use]
    pub fn to_form(&self) -> SearchForm {
        SearchForm {
            text: self.text.clone(),
            starring: self.starring.clone(),
            director: self.director.clone(),
            language: self.language.clone(),
            location: self.location.clone(),
            time: self.time.clone(),
            categories: self.categories.clone(),
            country: self.country.clone(),
            min_runtime: self.min_runtime.map(|v| v.to_string()).unwrap_or_default(),
            max_runtime: self.max_runtime.map(|v| v.to_string()).unwrap_or_default(),
            page: self.page,
        }
    }

    /// The first double-quoted substring of the free text, if any.
    ///
    /// Quoting narrows a text search: the phrase must appear verbatim in the
    /// body text, in addition to whatever the surrounding terms match.
    #[must_use]
    pub fn quoted_phrase(&self) -> Option<&str> {
        let start = self.text.find('"')?;
        let rest = &self.text[start + 1..];
        let end = rest.find('"')?;
        let phrase = &rest[..end];
        if phrase.trim().is_empty() {
            None
        } else {
            Some(phrase)
        }
    }
}

fn parse_bound(value: &str, field: &'static str) -> Result<Option<u64>, QueryError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<u64>()
        .map(Some)
        .map_err(|_| QueryError::InvalidRuntime {
            field,
            value: value.to_string(),
        })
}

/// Build the human-readable explanation for a search that matched nothing:
/// one line per submitted filter, plus a sentence for the runtime bound in
/// effect.
#[must_use]
pub fn no_match_messages(model: &QueryModel) -> Vec<String> {
    let mut messages = Vec::new();

    if !model.text.is_empty() {
        messages.push(format!("Unknown search term: {}", model.text));
    }
    if !model.starring.is_empty() {
        messages.push(format!("Cannot find star: {}", model.starring));
    }
    if !model.time.is_empty() {
        messages.push(format!("Cannot find time: {}", model.time));
    }
    if !model.director.is_empty() {
        messages.push(format!("Cannot find director: {}", model.director));
    }
    if !model.location.is_empty() {
        messages.push(format!("Cannot find location: {}", model.location));
    }
    if !model.language.is_empty() {
        messages.push(format!("Cannot find language: {}", model.language));
    }
    if !model.categories.is_empty() {
        messages.push(format!("Cannot find categories: {}", model.categories));
    }
    if !model.country.is_empty() {
        messages.push(format!("Cannot find country: {}", model.country));
    }

    messages.push(match (model.min_runtime, model.max_runtime) {
        (Some(min), Some(max)) => {
            format!("Cannot find running time between {min} mins and {max} mins")
        }
        (Some(min), None) => format!("Cannot find running time greater than {min} mins"),
        (None, Some(max)) => format!("Cannot find running time less than {max} mins"),
        (None, None) => "No running time limit was given".to_string(),
    });

    messages
}
