//! Tantivy-based search backend with BM25 ranking.
//!
//! Owns the index schema, bulk-loads a normalized movie corpus, translates
//! [`CompiledQuery`] constraints into tantivy query trees, and produces
//! per-field highlight fragments with the caller's marker strings.

use std::collections::HashMap;
use std::ops::Bound;
use std::path::{Path, PathBuf};

use tantivy::collector::{Count, TopDocs};
use tantivy::directory::MmapDirectory;
use tantivy::query::{
    AllQuery, BooleanQuery, BoostQuery, Occur, PhraseQuery, Query, RangeQuery, TermQuery,
};
use tantivy::schema::{
    FAST, Field, INDEXED, IndexRecordOption, STORED, STRING, Schema, TEXT, Value,
};
use tantivy::snippet::SnippetGenerator;
use tantivy::{Index, IndexReader, IndexSettings, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tracing::debug;

use crate::corpus::{Corpus, Movie};
use crate::query::compiler::{CompiledQuery, FilterField, TextMode};
use crate::search::{DisplayField, Hit, RawPage, SearchBackend};

/// Default heap size for index writer (50MB).
const WRITER_HEAP_SIZE: usize = 50_000_000;

/// Multiplier applied to title matches in the disjunctive fallback form.
const TITLE_BOOST: f32 = 4.0;

/// Fragment size cap large enough that a highlight always covers the whole
/// stored value rather than a truncated window.
const HIGHLIGHT_FRAGMENT_CHARS: usize = 999_999_999;

/// Index mode controls whether the backend can write to the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMode {
    /// Index is writable (batch indexer).
    ReadWrite,
    /// Index is read-only (query side).
    ReadOnly,
}

/// Schema field handles for the tantivy index.
#[derive(Debug, Clone)]
struct SchemaFields {
    id: Field,
    title: Field,
    text: Field,
    starring: Field,
    runtime: Field,
    director: Field,
    location: Field,
    time: Field,
    language: Field,
    country: Field,
    categories: Field,
}

impl SchemaFields {
    fn display(&self, field: DisplayField) -> Field {
        match field {
            DisplayField::Title => self.title,
            DisplayField::Text => self.text,
            DisplayField::Starring => self.starring,
            DisplayField::Director => self.director,
            DisplayField::Location => self.location,
            DisplayField::Time => self.time,
            DisplayField::Language => self.language,
            DisplayField::Country => self.country,
            DisplayField::Categories => self.categories,
        }
    }

    fn filter(&self, field: FilterField) -> Field {
        match field {
            FilterField::Starring => self.starring,
            FilterField::Director => self.director,
            FilterField::Language => self.language,
            FilterField::Location => self.location,
            FilterField::Time => self.time,
            FilterField::Categories => self.categories,
        }
    }
}

/// Tantivy-backed movie index.
pub struct MovieIndex {
    index: Index,
    reader: IndexReader,
    fields: SchemaFields,
    mode: IndexMode,
    index_path: PathBuf,
}

impl MovieIndex {
    /// Build the tantivy schema for movie documents.
    ///
    /// Every displayable field is stored; text fields are tokenized for
    /// full-text search, the id is an exact string, and runtime is a fast
    /// integer field for range constraints.
    fn build_schema() -> (Schema, SchemaFields) {
        let mut schema_builder = Schema::builder();

        let id = schema_builder.add_text_field("id", STRING | STORED);
        let title = schema_builder.add_text_field("title", TEXT | STORED);
        let text = schema_builder.add_text_field("text", TEXT | STORED);
        let starring = schema_builder.add_text_field("starring", TEXT | STORED);
        let runtime = schema_builder.add_u64_field("runtime", INDEXED | STORED | FAST);
        let director = schema_builder.add_text_field("director", TEXT | STORED);
        let location = schema_builder.add_text_field("location", TEXT | STORED);
        let time = schema_builder.add_text_field("time", TEXT | STORED);
        let language = schema_builder.add_text_field("language", TEXT | STORED);
        let country = schema_builder.add_text_field("country", TEXT | STORED);
        let categories = schema_builder.add_text_field("categories", TEXT | STORED);

        let schema = schema_builder.build();
        let fields = SchemaFields {
            id,
            title,
            text,
            starring,
            runtime,
            director,
            location,
            time,
            language,
            country,
            categories,
        };

        (schema, fields)
    }

    /// Open or create a tantivy index at the specified path.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be opened or created.
    pub fn open(index_path: &Path, mode: IndexMode) -> anyhow::Result<Self> {
        let index = if index_path.join("meta.json").exists() {
            let directory = MmapDirectory::open(index_path)?;
            Index::open(directory)?
        } else if mode == IndexMode::ReadWrite {
            let (schema, _) = Self::build_schema();
            std::fs::create_dir_all(index_path)?;
            let directory = MmapDirectory::open(index_path)?;
            Index::create(directory, schema, IndexSettings::default())?
        } else {
            anyhow::bail!(
                "Index not found at {} (run `filmdex index` first)",
                index_path.display()
            );
        };

        // Get fields from the actual index schema, not a freshly built one.
        let schema = index.schema();
        let fields = SchemaFields {
            id: schema.get_field("id")?,
            title: schema.get_field("title")?,
            text: schema.get_field("text")?,
            starring: schema.get_field("starring")?,
            runtime: schema.get_field("runtime")?,
            director: schema.get_field("director")?,
            location: schema.get_field("location")?,
            time: schema.get_field("time")?,
            language: schema.get_field("language")?,
            country: schema.get_field("country")?,
            categories: schema.get_field("categories")?,
        };

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()?;

        Ok(Self {
            index,
            reader,
            fields,
            mode,
            index_path: index_path.to_path_buf(),
        })
    }

    /// Get the index path.
    #[must_use]
    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Number of indexed documents.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be read.
    pub fn num_docs(&self) -> anyhow::Result<u64> {
        Ok(self.reader.searcher().num_docs())
    }

    /// Bulk-load a corpus, replacing any previously indexed documents.
    ///
    /// Multi-valued fields are flattened to a single comma-joined string at
    /// index time, so stored values and highlight fragments line up with what
    /// the result list displays.
    ///
    /// # Errors
    ///
    /// Returns an error if indexing fails or the index is read-only.
    pub fn index_corpus(&self, corpus: &Corpus) -> anyhow::Result<()> {
        if self.mode == IndexMode::ReadOnly {
            anyhow::bail!("Cannot index in read-only mode");
        }

        // Single writer thread keeps document order equal to corpus order,
        // which is the ranking an unconstrained query pages through.
        let mut writer: IndexWriter = self.index.writer_with_num_threads(1, WRITER_HEAP_SIZE)?;
        writer.delete_all_documents()?;

        for movie in corpus.movies() {
            writer.add_document(self.movie_to_doc(movie))?;
        }

        writer.commit()?;
        self.reader.reload()?;
        debug!(docs = corpus.len(), "indexed corpus");

        Ok(())
    }

    fn movie_to_doc(&self, movie: &Movie) -> TantivyDocument {
        let mut doc = TantivyDocument::new();
        doc.add_text(self.fields.id, &movie.id);
        doc.add_text(self.fields.title, &movie.title);
        doc.add_text(self.fields.text, &movie.text);

        let mut add_joined = |field: Field, values: &[String]| {
            if !values.is_empty() {
                doc.add_text(field, values.join(", "));
            }
        };
        add_joined(self.fields.starring, &movie.starring);
        add_joined(self.fields.director, &movie.director);
        add_joined(self.fields.location, &movie.location);
        add_joined(self.fields.time, &movie.time);
        add_joined(self.fields.language, &movie.language);
        add_joined(self.fields.country, &movie.country);
        add_joined(self.fields.categories, &movie.categories);

        if let Some(runtime) = movie.runtime {
            doc.add_u64(self.fields.runtime, runtime);
        }

        doc
    }

    /// Translate a compiled query into a tantivy query tree.
    fn build_query(&self, compiled: &CompiledQuery) -> Box<dyn Query> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();

        if compiled.runtime.min.is_some() || compiled.runtime.max.is_some() {
            let lower = compiled
                .runtime
                .min
                .map(|v| Bound::Included(Term::from_field_u64(self.fields.runtime, v)))
                .unwrap_or(Bound::Unbounded);
            let upper = compiled
                .runtime
                .max
                .map(|v| Bound::Included(Term::from_field_u64(self.fields.runtime, v)))
                .unwrap_or(Bound::Unbounded);
            clauses.push((Occur::Must, Box::new(RangeQuery::new(lower, upper))));
        }

        if let Some(text) = &compiled.text {
            let tokens = tokenize(&text.query);
            match text.mode {
                TextMode::Conjunctive => {
                    // Every term must appear in the title or the body text.
                    for token in &tokens {
                        let either = BooleanQuery::new(vec![
                            (Occur::Should, term_query(self.fields.title, token)),
                            (Occur::Should, term_query(self.fields.text, token)),
                        ]);
                        clauses.push((Occur::Must, Box::new(either)));
                    }
                }
                TextMode::DisjunctiveBoosted => {
                    // Any term suffices; title matches count for more.
                    let mut any: Vec<(Occur, Box<dyn Query>)> = Vec::new();
                    for token in &tokens {
                        let title =
                            BoostQuery::new(term_query(self.fields.title, token), TITLE_BOOST);
                        any.push((Occur::Should, Box::new(title)));
                        any.push((Occur::Should, term_query(self.fields.text, token)));
                    }
                    if !any.is_empty() {
                        clauses.push((Occur::Must, Box::new(BooleanQuery::new(any))));
                    }
                }
            }
        }

        if let Some(phrase) = &compiled.phrase {
            let mut terms: Vec<Term> = tokenize(phrase)
                .iter()
                .map(|t| Term::from_field_text(self.fields.text, t))
                .collect();
            if terms.len() > 1 {
                clauses.push((Occur::Must, Box::new(PhraseQuery::new(terms))));
            } else if let Some(term) = terms.pop() {
                clauses.push((
                    Occur::Must,
                    Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs)),
                ));
            }
        }

        for field_match in &compiled.fields {
            let field = self.fields.filter(field_match.field);
            let any: Vec<(Occur, Box<dyn Query>)> = tokenize(&field_match.value)
                .iter()
                .map(|token| (Occur::Should, term_query(field, token)))
                .collect();
            if !any.is_empty() {
                clauses.push((Occur::Must, Box::new(BooleanQuery::new(any))));
            }
        }

        if clauses.is_empty() {
            Box::new(AllQuery)
        } else {
            Box::new(BooleanQuery::new(clauses))
        }
    }

    /// Build one snippet generator per highlighted field. Fields the query
    /// carries no terms for produce empty snippets and fall back to raw
    /// stored values downstream.
    fn snippet_generators(
        &self,
        searcher: &tantivy::Searcher,
        query: &dyn Query,
        fields: &[DisplayField],
    ) -> HashMap<DisplayField, SnippetGenerator> {
        let mut generators = HashMap::new();
        for &display in fields {
            match SnippetGenerator::create(searcher, query, self.fields.display(display)) {
                Ok(mut generator) => {
                    generator.set_max_num_chars(HIGHLIGHT_FRAGMENT_CHARS);
                    generators.insert(display, generator);
                }
                Err(e) => {
                    let field_name = display.name();
                    debug!(field = field_name, error = %e, "no snippet generator");
                }
            }
        }
        generators
    }

    fn doc_to_hit(
        &self,
        doc: &TantivyDocument,
        score: f32,
        generators: &HashMap<DisplayField, SnippetGenerator>,
        markers: Option<(&str, &str)>,
    ) -> Hit {
        let id = doc
            .get_first(self.fields.id)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let runtime = doc.get_first(self.fields.runtime).and_then(|v| v.as_u64());

        let mut stored = HashMap::new();
        for display in DisplayField::ALL {
            let values: Vec<String> = doc
                .get_all(self.fields.display(display))
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect();
            if !values.is_empty() {
                stored.insert(display, values);
            }
        }

        let mut highlights = HashMap::new();
        if let Some((pre, post)) = markers {
            for (&display, generator) in generators {
                let mut snippet = generator.snippet_from_doc(doc);
                snippet.set_snippet_prefix_postfix(pre, post);
                let html = snippet.to_html();
                if !html.is_empty() {
                    highlights.insert(display, html);
                }
            }
        }

        Hit {
            id,
            score,
            runtime,
            stored,
            highlights,
        }
    }
}

impl SearchBackend for MovieIndex {
    fn execute(&self, compiled: &CompiledQuery) -> anyhow::Result<RawPage> {
        let searcher = self.reader.searcher();
        let query = self.build_query(compiled);

        let collector =
            TopDocs::with_limit(compiled.page.size.max(1)).and_offset(compiled.page.offset());
        let (total, top_docs) = searcher.search(&*query, &(Count, collector))?;

        let generators = self.snippet_generators(&searcher, &*query, &compiled.highlight.fields);
        let markers = (
            compiled.highlight.markers.pre.as_str(),
            compiled.highlight.markers.post.as_str(),
        );

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher.doc(doc_address)?;
            hits.push(self.doc_to_hit(&doc, score, &generators, Some(markers)));
        }

        Ok(RawPage { hits, total })
    }

    fn fetch(&self, id: &str) -> anyhow::Result<Option<Hit>> {
        let searcher = self.reader.searcher();
        let query = TermQuery::new(
            Term::from_field_text(self.fields.id, id),
            IndexRecordOption::Basic,
        );

        let top_docs = searcher.search(&query, &TopDocs::with_limit(1))?;
        let Some((score, doc_address)) = top_docs.into_iter().next() else {
            return Ok(None);
        };

        let doc: TantivyDocument = searcher.doc(doc_address)?;
        Ok(Some(self.doc_to_hit(&doc, score, &HashMap::new(), None)))
    }
}

fn term_query(field: Field, token: &str) -> Box<dyn Query> {
    Box::new(TermQuery::new(
        Term::from_field_text(field, token),
        IndexRecordOption::WithFreqs,
    ))
}

/// Split text into lowercase alphanumeric tokens, matching how the default
/// tokenizer indexed the fields.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SearchForm;
    use crate::query::compiler::compile;
    use crate::search::{HighlightMarkers, Page};
    use tempfile::TempDir;

    fn movie(id: &str, title: &str, text: &str) -> Movie {
        Movie {
            id: id.to_string(),
            title: title.to_string(),
            text: text.to_string(),
            ..Movie::default()
        }
    }

    fn test_corpus() -> Corpus {
        let mut big = movie("1", "Big", "A boy wakes up big after a wish of love.");
        big.starring = vec!["Tom Hanks".to_string(), "Elizabeth Perkins".to_string()];
        big.categories = vec!["Comedy".to_string(), "USA".to_string()];
        big.runtime = Some(104);

        let mut alien = movie("2", "Alien Love Story", "Romance aboard a drifting ship.");
        alien.starring = vec!["Sigourney Weaver".to_string()];
        alien.categories = vec!["Drama".to_string()];
        alien.runtime = Some(82);

        let mut silent = movie("3", "The Silent Mountain", "A climber faces the storm alone.");
        silent.runtime = Some(140);

        Corpus::from_movies(vec![big, alien, silent])
    }

    fn open_indexed(temp: &TempDir) -> MovieIndex {
        let backend = MovieIndex::open(&temp.path().join("index"), IndexMode::ReadWrite).unwrap();
        backend.index_corpus(&test_corpus()).unwrap();
        backend
    }

    fn compiled(form: SearchForm) -> CompiledQuery {
        compile(
            &form.parse().unwrap(),
            TextMode::Conjunctive,
            &HighlightMarkers::default(),
            Page::new(1, 10),
        )
    }

    #[test]
    fn schema_has_every_display_field() {
        let (schema, _fields) = MovieIndex::build_schema();
        for display in DisplayField::ALL {
            assert!(schema.get_field(display.name()).is_ok());
        }
        assert!(schema.get_field("id").is_ok());
        assert!(schema.get_field("runtime").is_ok());
    }

    #[test]
    fn open_creates_index_in_write_mode() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index");
        let backend = MovieIndex::open(&path, IndexMode::ReadWrite).unwrap();

        assert!(path.exists());
        assert_eq!(backend.mode, IndexMode::ReadWrite);
    }

    #[test]
    fn read_only_mode_fails_without_index() {
        let temp = TempDir::new().unwrap();
        let result = MovieIndex::open(&temp.path().join("index"), IndexMode::ReadOnly);
        assert!(result.is_err());
    }

    #[test]
    fn empty_query_matches_whole_corpus() {
        let temp = TempDir::new().unwrap();
        let backend = open_indexed(&temp);

        let page = backend.execute(&compiled(SearchForm::default())).unwrap();
        assert_eq!(page.total, 3);
    }

    #[test]
    fn conjunctive_text_requires_every_term() {
        let temp = TempDir::new().unwrap();
        let backend = open_indexed(&temp);

        let page = backend
            .execute(&compiled(SearchForm {
                text: "love story".to_string(),
                ..SearchForm::default()
            }))
            .unwrap();

        // Only "Alien Love Story" carries both terms across title+text.
        assert_eq!(page.total, 1);
        assert_eq!(page.hits[0].id, "2");
    }

    #[test]
    fn runtime_range_is_inclusive() {
        let temp = TempDir::new().unwrap();
        let backend = open_indexed(&temp);

        let page = backend
            .execute(&compiled(SearchForm {
                min_runtime: "82".to_string(),
                max_runtime: "104".to_string(),
                ..SearchForm::default()
            }))
            .unwrap();

        let mut ids: Vec<&str> = page.hits.iter().map(|h| h.id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn matched_field_gets_marked_fragment() {
        let temp = TempDir::new().unwrap();
        let backend = open_indexed(&temp);

        let page = backend
            .execute(&compiled(SearchForm {
                starring: "Hanks".to_string(),
                ..SearchForm::default()
            }))
            .unwrap();

        assert_eq!(page.total, 1);
        let highlight = page.hits[0].highlights.get(&DisplayField::Starring).unwrap();
        assert!(highlight.contains("<mark>Hanks</mark>"), "got: {highlight}");
        // Unmatched fields carry no fragment, only stored values.
        assert!(!page.hits[0].highlights.contains_key(&DisplayField::Title));
    }

    #[test]
    fn stored_multi_values_are_flattened_at_index_time() {
        let temp = TempDir::new().unwrap();
        let backend = open_indexed(&temp);

        let hit = backend.fetch("1").unwrap().unwrap();
        assert_eq!(
            hit.stored.get(&DisplayField::Starring).unwrap(),
            &vec!["Tom Hanks, Elizabeth Perkins".to_string()]
        );
    }

    #[test]
    fn fetch_unknown_id_is_none() {
        let temp = TempDir::new().unwrap();
        let backend = open_indexed(&temp);

        assert!(backend.fetch("999").unwrap().is_none());
        let hit = backend.fetch("3").unwrap().unwrap();
        assert_eq!(hit.runtime, Some(140));
        assert!(hit.highlights.is_empty());
    }

    #[test]
    fn tokenize_lowercases_and_strips_punctuation() {
        assert_eq!(tokenize("Tom Hanks"), vec!["tom", "hanks"]);
        assert_eq!(tokenize("sci-fi, drama!"), vec!["sci", "fi", "drama"]);
        assert!(tokenize("...").is_empty());
    }
}
