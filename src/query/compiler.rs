//! Lowers a [`QueryModel`](super::QueryModel) into a backend-agnostic
//! [`CompiledQuery`].
//!
//! Compilation is deterministic and pure; the precision-then-recall fallback
//! lives in [`crate::search::execute_with_fallback`], which compiles the same
//! model twice with different [`TextMode`]s when the strict form comes up
//! empty.

use crate::query::QueryModel;
use crate::search::{DisplayField, HighlightMarkers, Page};

/// How free-text terms combine across the title and body-text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMode {
    /// Every term must match in at least one of the two fields.
    Conjunctive,
    /// Any term suffices; title matches are boosted over body-text matches.
    DisjunctiveBoosted,
}

/// The free-text constraint of a compiled query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextConstraint {
    pub query: String,
    pub mode: TextMode,
}

/// Fields an exact-field filter can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Starring,
    Director,
    Language,
    Location,
    Time,
    Categories,
}

/// One exact-field match constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch {
    pub field: FilterField,
    pub value: String,
}

/// Inclusive runtime bounds in minutes. An absent bound is open-ended; with
/// both absent the range constrains nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeRange {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

/// Which fields to highlight and how to mark matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightDirective {
    pub fields: Vec<DisplayField>,
    pub markers: HighlightMarkers,
}

/// An ordered composition of constraints ready for a search backend.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub runtime: RuntimeRange,
    pub text: Option<TextConstraint>,
    pub phrase: Option<String>,
    pub fields: Vec<FieldMatch>,
    pub highlight: HighlightDirective,
    pub page: Page,
}

/// Compile a query model.
///
/// The constraints, in order:
/// 1. the runtime range (always present, possibly open on both ends);
/// 2. the free-text constraint in the requested mode, when text was given;
/// 3. a verbatim phrase against the body text, when the text contains a
///    double-quoted substring — additive, it narrows rather than replaces;
/// 4. an exact-field match per non-empty filter. The country filter matches
///    the categories field (a pinned policy choice, see DESIGN.md);
/// 5. a highlight directive naming every displayable field, with a single
///    fragment sized to never truncate;
/// 6. the pagination window.
#[must_use]
pub fn compile(
    model: &QueryModel,
    mode: TextMode,
    markers: &HighlightMarkers,
    page: Page,
) -> CompiledQuery {
    let text = (!model.text.is_empty()).then(|| TextConstraint {
        query: model.text.clone(),
        mode,
    });

    let phrase = model.quoted_phrase().map(str::to_string);

    let mut fields = Vec::new();
    let mut field_match = |field: FilterField, value: &str| {
        if !value.is_empty() {
            fields.push(FieldMatch {
                field,
                value: value.to_string(),
            });
        }
    };
    field_match(FilterField::Starring, &model.starring);
    field_match(FilterField::Director, &model.director);
    field_match(FilterField::Language, &model.language);
    field_match(FilterField::Location, &model.location);
    field_match(FilterField::Time, &model.time);
    field_match(FilterField::Categories, &model.categories);
    // Country submissions deliberately hit the categories field. See DESIGN.md.
    field_match(FilterField::Categories, &model.country);

    CompiledQuery {
        runtime: RuntimeRange {
            min: model.min_runtime,
            max: model.max_runtime,
        },
        text,
        phrase,
        fields,
        highlight: HighlightDirective {
            fields: DisplayField::ALL.to_vec(),
            markers: markers.clone(),
        },
        page,
    }
}
