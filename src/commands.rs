//! Command implementations behind the CLI.
//!
//! Each command resolves config, opens the index, and drives the search
//! service, printing human-readable output. The CLI acts as the presentation
//! layer: it supplies ANSI markers for highlight fragments.

use std::path::PathBuf;

use crate::config::{Config, expand_tilde};
use crate::corpus::Corpus;
use crate::query::SearchForm;
use crate::results::ResultPage;
use crate::search::HighlightMarkers;
use crate::search::tantivy::{IndexMode, MovieIndex};
use crate::service::SearchService;

/// Session token for the single-user CLI surface.
const CLI_SESSION: &str = "cli";

fn ansi_markers() -> HighlightMarkers {
    HighlightMarkers {
        pre: "\u{1b}[1m".to_string(),
        post: "\u{1b}[0m".to_string(),
    }
}

fn resolve(override_path: Option<PathBuf>, configured: &str) -> PathBuf {
    override_path.unwrap_or_else(|| expand_tilde(configured))
}

/// Build or rebuild the search index from the JSON movie corpus.
///
/// # Errors
///
/// Returns an error if the corpus cannot be loaded or indexing fails.
pub fn index(corpus_path: Option<PathBuf>, index_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let corpus_path = resolve(corpus_path, &config.corpus.path);
    let index_path = resolve(index_path, &config.index.path);

    let corpus = Corpus::load(&corpus_path)?;
    let backend = MovieIndex::open(&index_path, IndexMode::ReadWrite)?;
    backend.index_corpus(&corpus)?;

    println!(
        "Indexed {} movies into {}",
        corpus.len(),
        index_path.display()
    );
    Ok(())
}

/// Run a search and print one line per hit.
///
/// # Errors
///
/// Returns an error on invalid input, a missing index, or a backend failure.
pub fn search(form: &SearchForm, index_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let index_path = resolve(index_path, &config.index.path);

    let backend = MovieIndex::open(&index_path, IndexMode::ReadOnly)?;
    let service = SearchService::new(backend)
        .with_page_size(config.search.page_size)
        .with_markers(ansi_markers());

    let page = service.submit(CLI_SESSION, form)?;
    print_page(&page, config.search.page_size);
    Ok(())
}

fn print_page(page: &ResultPage, page_size: usize) {
    if page.total == 0 {
        println!("No results.");
        for message in &page.messages {
            println!("  {message}");
        }
        return;
    }

    println!("{} results (page {})", page.total, page.page);
    let offset = (page.page - 1) * page_size;
    for (i, record) in page.records.iter().enumerate() {
        println!("{:>3}. [{:.2}] {}", offset + i + 1, record.score, record.title);

        let mut details = Vec::new();
        if !record.starring.is_empty() {
            details.push(record.starring.clone());
        }
        if !record.director.is_empty() {
            details.push(format!("dir. {}", record.director));
        }
        if let Some(runtime) = record.runtime {
            details.push(runtime.to_string());
        }
        if !details.is_empty() {
            println!("     {}  (id {})", details.join(" | "), record.id);
        } else {
            println!("     (id {})", record.id);
        }
    }
}

/// Print the full record of a movie by document id.
///
/// # Errors
///
/// Returns an error if the index cannot be opened or the id is unknown.
pub fn get(id: &str, index_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let index_path = resolve(index_path, &config.index.path);

    let backend = MovieIndex::open(&index_path, IndexMode::ReadOnly)?;
    let service = SearchService::new(backend).with_markers(ansi_markers());

    let view = service.document(CLI_SESSION, id)?;
    let record = &view.record;

    println!("Title: {}", record.title);
    print_field("Starring", &record.starring);
    print_field("Runtime", view.runtime.as_deref().unwrap_or(""));
    print_field("Director", &record.director);
    print_field("Location", &record.location);
    print_field("Time", &record.time);
    print_field("Language", &record.language);
    print_field("Country", &record.country);
    print_field("Categories", &record.categories);
    if !record.text.is_empty() {
        println!();
        println!("{}", record.text);
    }
    Ok(())
}

fn print_field(label: &str, value: &str) {
    if !value.is_empty() {
        println!("{label}: {value}");
    }
}
