//! The search service: the contract a presentation layer calls.
//!
//! Three operations: submit a search form, request another page of a cached
//! session's query, and look up a single document by id. The service owns the
//! backend, the session store, and the highlight markers the presentation
//! layer chose.

use thiserror::Error;
use tracing::debug;

use crate::query::{QueryError, QueryModel, SearchForm, no_match_messages};
use crate::results::{DetailView, DisplayRecord, ResultPage, project};
use crate::search::{DEFAULT_PAGE_SIZE, HighlightMarkers, SearchBackend, execute_with_fallback};
use crate::session::SessionStore;

/// Errors surfaced by the service contract.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The submitted form failed validation; no search was run.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// A pagination request for a session with no cached query.
    #[error("no cached search for session token {0:?}")]
    UnknownSession(String),

    /// A detail lookup for an id the index doesn't hold. Distinct from a
    /// query that matched nothing.
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    /// The search backend failed; not retried, no partial results.
    #[error("search backend error")]
    Backend(#[from] anyhow::Error),
}

/// Search service over a backend, with session-keyed pagination state.
pub struct SearchService<B> {
    backend: B,
    sessions: SessionStore,
    page_size: usize,
    markers: HighlightMarkers,
}

impl<B: SearchBackend> SearchService<B> {
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            sessions: SessionStore::default(),
            page_size: DEFAULT_PAGE_SIZE,
            markers: HighlightMarkers::default(),
        }
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Replace the highlight markers wrapped around matched terms.
    #[must_use]
    pub fn with_markers(mut self, markers: HighlightMarkers) -> Self {
        self.markers = markers;
        self
    }

    #[must_use]
    pub fn with_sessions(mut self, sessions: SessionStore) -> Self {
        self.sessions = sessions;
        self
    }

    /// Run a new search from submitted form fields.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Query` on invalid input (no backend call is
    /// made) and `ServiceError::Backend` if the search fails.
    pub fn submit(&self, token: &str, form: &SearchForm) -> Result<ResultPage, ServiceError> {
        let model = form.parse()?;
        self.run(token, model)
    }

    /// Re-run the session's cached query for another page.
    ///
    /// Every filter value is reused verbatim; only the page number changes.
    /// The backend is queried again rather than slicing cached results.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::UnknownSession` if the token has no live cached
    /// query, and `ServiceError::Backend` if the search fails.
    pub fn page(&self, token: &str, page: usize) -> Result<ResultPage, ServiceError> {
        let mut model = self
            .sessions
            .model(token)
            .ok_or_else(|| ServiceError::UnknownSession(token.to_string()))?;
        model.page = page.max(1);
        self.run(token, model)
    }

    /// Look up a single document for the detail view.
    ///
    /// Field values come from the session's cached (highlighted) record when
    /// available, falling back to the raw stored document; runtime always
    /// comes from raw storage and is rendered with its unit label.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::DocumentNotFound` for an unknown id and
    /// `ServiceError::Backend` if the lookup fails.
    pub fn document(&self, token: &str, id: &str) -> Result<DetailView, ServiceError> {
        let raw = self
            .backend
            .fetch(id)?
            .ok_or_else(|| ServiceError::DocumentNotFound(id.to_string()))?;

        let record = self
            .sessions
            .record(token, id)
            .unwrap_or_else(|| project(&raw));

        Ok(DetailView::new(record, raw.runtime))
    }

    fn run(&self, token: &str, model: QueryModel) -> Result<ResultPage, ServiceError> {
        let raw = execute_with_fallback(&self.backend, &model, &self.markers, self.page_size)?;

        let records: Vec<DisplayRecord> = raw.hits.iter().map(project).collect();
        let messages = if raw.total == 0 {
            no_match_messages(&model)
        } else {
            Vec::new()
        };

        debug!(token, total = raw.total, page = model.page, "search served");
        self.sessions.put(token, model.clone(), records.clone());

        Ok(ResultPage {
            records,
            total: raw.total,
            page: model.page,
            query: model,
            messages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{DisplayField, Hit, RawPage};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Stub backend serving a fixed corpus of hits, counting execute calls.
    struct StubBackend {
        hits: Vec<Hit>,
        calls: AtomicUsize,
    }

    impl StubBackend {
        fn new(hits: Vec<Hit>) -> Self {
            Self {
                hits,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SearchBackend for StubBackend {
        fn execute(
            &self,
            query: &crate::query::compiler::CompiledQuery,
        ) -> anyhow::Result<RawPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let start = query.page.offset().min(self.hits.len());
            let end = (start + query.page.size).min(self.hits.len());
            Ok(RawPage {
                hits: self.hits[start..end].to_vec(),
                total: self.hits.len(),
            })
        }

        fn fetch(&self, id: &str) -> anyhow::Result<Option<Hit>> {
            Ok(self.hits.iter().find(|h| h.id == id).cloned())
        }
    }

    fn hit(id: &str, title: &str) -> Hit {
        let mut stored = HashMap::new();
        stored.insert(DisplayField::Title, vec![title.to_string()]);
        Hit {
            id: id.to_string(),
            score: 1.0,
            runtime: Some(100),
            stored,
            highlights: HashMap::new(),
        }
    }

    fn service_with(hits: Vec<Hit>) -> SearchService<StubBackend> {
        SearchService::new(StubBackend::new(hits))
    }

    #[test]
    fn invalid_input_makes_no_backend_call() {
        let service = service_with(vec![hit("1", "Big")]);
        let form = SearchForm {
            min_runtime: "abc".to_string(),
            ..SearchForm::default()
        };

        let err = service.submit("tok", &form).unwrap_err();
        assert!(matches!(err, ServiceError::Query(_)));
        assert_eq!(service.backend.calls(), 0);
    }

    #[test]
    fn submit_projects_and_caches() {
        let service = service_with(vec![hit("1", "Big"), hit("2", "Alien")]);
        let page = service.submit("tok", &SearchForm::default()).unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(page.records[0].title, "Big");
        assert!(page.messages.is_empty());
        // Cached for the detail view.
        assert_eq!(service.sessions.record("tok", "2").unwrap().id, "2");
    }

    #[test]
    fn zero_total_synthesizes_messages() {
        let service = service_with(Vec::new());
        let form = SearchForm {
            starring: "Nobody".to_string(),
            ..SearchForm::default()
        };

        let page = service.submit("tok", &form).unwrap();
        assert_eq!(page.total, 0);
        assert!(
            page.messages
                .contains(&"Cannot find star: Nobody".to_string())
        );
    }

    #[test]
    fn page_reuses_cached_filters_verbatim() {
        let hits: Vec<Hit> = (1..=25).map(|i| hit(&i.to_string(), "Movie")).collect();
        let service = service_with(hits);

        let form = SearchForm {
            starring: "Tom Hanks".to_string(),
            max_runtime: "120".to_string(),
            ..SearchForm::default()
        };
        service.submit("tok", &form).unwrap();

        let second = service.page("tok", 2).unwrap();
        assert_eq!(second.page, 2);
        assert_eq!(second.query.starring, "Tom Hanks");
        assert_eq!(second.query.max_runtime, Some(120));
        assert_eq!(second.records[0].id, "11");
        // Each page request re-queries the backend.
        assert_eq!(service.backend.calls(), 2);
    }

    #[test]
    fn page_without_session_is_an_error() {
        let service = service_with(Vec::new());
        let err = service.page("nobody", 2).unwrap_err();
        assert!(matches!(err, ServiceError::UnknownSession(_)));
    }

    #[test]
    fn document_not_found_is_distinct_from_empty_results() {
        let service = service_with(vec![hit("1", "Big")]);
        service.submit("tok", &SearchForm::default()).unwrap();

        let err = service.document("tok", "999").unwrap_err();
        assert!(matches!(err, ServiceError::DocumentNotFound(_)));

        let view = service.document("tok", "1").unwrap();
        assert_eq!(view.record.title, "Big");
        assert_eq!(view.runtime.as_deref(), Some("100 min"));
    }

    #[test]
    fn document_works_without_a_session() {
        let service = service_with(vec![hit("1", "Big")]);
        let view = service.document("fresh", "1").unwrap();
        assert_eq!(view.record.title, "Big");
    }
}
