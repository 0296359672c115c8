//! Projection of raw backend hits into display records.
//!
//! For every displayable field the projector prefers the highlight fragment
//! when the backend produced one, and falls back to the raw stored value.
//! Multi-valued stored fields are joined with ", " here, exactly once; no
//! record ever carries an un-joined sequence.

use crate::query::QueryModel;
use crate::search::{DisplayField, Hit};

/// A hit flattened to one display string per field.
///
/// `runtime` stays numeric: the list view shows bare minutes, only the detail
/// view attaches a unit label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayRecord {
    pub id: String,
    pub score: f32,
    pub title: String,
    pub text: String,
    pub starring: String,
    pub director: String,
    pub location: String,
    pub time: String,
    pub language: String,
    pub country: String,
    pub categories: String,
    pub runtime: Option<u64>,
}

/// Project a hit into a display record.
#[must_use]
pub fn project(hit: &Hit) -> DisplayRecord {
    let field = |display: DisplayField| -> String {
        if let Some(fragment) = hit.highlights.get(&display) {
            return fragment.clone();
        }
        hit.stored
            .get(&display)
            .map(|values| values.join(", "))
            .unwrap_or_default()
    };

    DisplayRecord {
        id: hit.id.clone(),
        score: hit.score,
        title: field(DisplayField::Title),
        text: field(DisplayField::Text),
        starring: field(DisplayField::Starring),
        director: field(DisplayField::Director),
        location: field(DisplayField::Location),
        time: field(DisplayField::Time),
        language: field(DisplayField::Language),
        country: field(DisplayField::Country),
        categories: field(DisplayField::Categories),
        runtime: hit.runtime,
    }
}

/// One page of projected results.
#[derive(Debug, Clone, Default)]
pub struct ResultPage {
    pub records: Vec<DisplayRecord>,
    /// Total matches across all pages.
    pub total: usize,
    /// 1-based page number this page covers.
    pub page: usize,
    /// The query that produced this page, for re-rendering form state.
    pub query: QueryModel,
    /// Per-filter explanations, populated only when `total` is zero.
    pub messages: Vec<String>,
}

/// The single-document detail view. Field values come from the (possibly
/// highlighted) display record; runtime is rendered with its unit label.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub record: DisplayRecord,
    pub runtime: Option<String>,
}

impl DetailView {
    /// Build a detail view from a projected record and the raw runtime
    /// minutes fetched from storage.
    #[must_use]
    pub fn new(record: DisplayRecord, runtime_minutes: Option<u64>) -> Self {
        Self {
            record,
            runtime: runtime_minutes.map(|m| format!("{m} min")),
        }
    }
}
