//! Search backend trait, hit types, and two-stage query execution.

pub mod tantivy;

use std::collections::HashMap;

use tracing::debug;

use crate::query::QueryModel;
use crate::query::compiler::{self, CompiledQuery, TextMode};

/// Default number of hits per result page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Marker strings wrapped around matched terms in highlight fragments.
/// The presentation layer picks these; `<mark>` tags are the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightMarkers {
    pub pre: String,
    pub post: String,
}

impl Default for HighlightMarkers {
    fn default() -> Self {
        Self {
            pre: "<mark>".to_string(),
            post: "</mark>".to_string(),
        }
    }
}

/// A pagination window: 1-based page number and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: usize,
    pub size: usize,
}

impl Page {
    #[must_use]
    pub fn new(number: usize, size: usize) -> Self {
        Self {
            number: number.max(1),
            size: size.max(1),
        }
    }

    /// The window used by the eager fallback probe. Only the total matters,
    /// so it asks for a single hit.
    #[must_use]
    pub fn probe() -> Self {
        Self { number: 1, size: 1 }
    }

    /// Number of leading hits to skip.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.number.saturating_sub(1) * self.size
    }
}

/// The fields a result record can display. Runtime is carried separately as a
/// number; everything here is text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayField {
    Title,
    Text,
    Starring,
    Director,
    Location,
    Time,
    Language,
    Country,
    Categories,
}

impl DisplayField {
    pub const ALL: [DisplayField; 9] = [
        DisplayField::Title,
        DisplayField::Text,
        DisplayField::Starring,
        DisplayField::Director,
        DisplayField::Location,
        DisplayField::Time,
        DisplayField::Language,
        DisplayField::Country,
        DisplayField::Categories,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            DisplayField::Title => "title",
            DisplayField::Text => "text",
            DisplayField::Starring => "starring",
            DisplayField::Director => "director",
            DisplayField::Location => "location",
            DisplayField::Time => "time",
            DisplayField::Language => "language",
            DisplayField::Country => "country",
            DisplayField::Categories => "categories",
        }
    }
}

/// One scored hit from the backend.
///
/// `stored` holds raw field values (possibly several per field for
/// multi-valued sources); `highlights` holds the marked-up fragment for the
/// fields the query matched in.
#[derive(Debug, Clone, Default)]
pub struct Hit {
    pub id: String,
    pub score: f32,
    pub runtime: Option<u64>,
    pub stored: HashMap<DisplayField, Vec<String>>,
    pub highlights: HashMap<DisplayField, String>,
}

/// One page of backend results, before projection.
#[derive(Debug, Clone, Default)]
pub struct RawPage {
    pub hits: Vec<Hit>,
    pub total: usize,
}

/// The text-search service the query pipeline talks to.
pub trait SearchBackend: Send + Sync {
    /// Execute a compiled query, returning the requested page of hits and the
    /// total match count.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unavailable or the query fails.
    fn execute(&self, query: &CompiledQuery) -> anyhow::Result<RawPage>;

    /// Fetch a single document by id, without highlighting.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unavailable. An unknown id is
    /// `Ok(None)`, not an error.
    fn fetch(&self, id: &str) -> anyhow::Result<Option<Hit>>;
}

/// Execute a query model with the precision-then-recall fallback.
///
/// With no free text this is a single backend call. With free text, the
/// conjunctive form is probed first; if it matches nothing, the final query is
/// recompiled with disjunctive semantics and a boosted title field. The probe
/// is a deliberate extra round trip, not an error path: it buys recall
/// without asking the user to resubmit.
///
/// # Errors
///
/// Propagates backend errors unchanged; no retry.
pub fn execute_with_fallback(
    backend: &dyn SearchBackend,
    model: &QueryModel,
    markers: &HighlightMarkers,
    page_size: usize,
) -> anyhow::Result<RawPage> {
    let page = Page::new(model.page, page_size);

    if model.text.is_empty() {
        let compiled = compiler::compile(model, TextMode::Conjunctive, markers, page);
        return backend.execute(&compiled);
    }

    let strict = compiler::compile(model, TextMode::Conjunctive, markers, Page::probe());
    let probe = backend.execute(&strict)?;

    let mode = if probe.total == 0 {
        debug!(text = %model.text, "conjunctive query matched nothing, widening");
        TextMode::DisjunctiveBoosted
    } else {
        TextMode::Conjunctive
    };

    let compiled = compiler::compile(model, mode, markers, page);
    backend.execute(&compiled)
}
