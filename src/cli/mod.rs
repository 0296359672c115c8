//! CLI interface for filmdex.
//!
//! Provides command-line argument parsing using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command-line interface for filmdex.
#[derive(Parser)]
#[command(name = "filmdex")]
#[command(author, version, about = "Full-text movie search", long_about = None)]
pub struct Cli {
    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Build or rebuild the search index from the JSON movie corpus.
    Index {
        /// Path to the corpus JSON file (overrides config).
        #[arg(short, long)]
        corpus: Option<PathBuf>,

        /// Path to the index directory (overrides config).
        #[arg(short, long)]
        index: Option<PathBuf>,
    },

    /// Search the movie index.
    ///
    /// Runtime bounds are passed as raw strings and validated like any other
    /// form submission: a non-numeric value is an input error.
    Search {
        /// Free-text query over title and body text. Double-quote a phrase
        /// to require it verbatim, e.g. '"new hope"'.
        #[arg(default_value = "")]
        query: String,

        /// Match an actor name.
        #[arg(long, default_value = "")]
        starring: String,

        /// Match a director name.
        #[arg(long, default_value = "")]
        director: String,

        /// Match a language.
        #[arg(long, default_value = "")]
        language: String,

        /// Match a filming or setting location.
        #[arg(long, default_value = "")]
        location: String,

        /// Match a time period.
        #[arg(long, default_value = "")]
        time: String,

        /// Match a category.
        #[arg(long, default_value = "")]
        categories: String,

        /// Match a country.
        #[arg(long, default_value = "")]
        country: String,

        /// Minimum runtime in minutes.
        #[arg(long, default_value = "")]
        min_runtime: String,

        /// Maximum runtime in minutes.
        #[arg(long, default_value = "")]
        max_runtime: String,

        /// 1-based result page.
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Path to the index directory (overrides config).
        #[arg(short, long)]
        index: Option<PathBuf>,
    },

    /// Show the full record of a movie by its document id.
    Get {
        /// Document id as shown in search results.
        id: String,

        /// Path to the index directory (overrides config).
        #[arg(short, long)]
        index: Option<PathBuf>,
    },
}
