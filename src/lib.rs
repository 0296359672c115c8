//! filmdex - Full-text search over a movie corpus.
//!
//! This library provides a batch indexer that loads a JSON film corpus into a
//! tantivy search index, and a query pipeline that compiles multi-field search
//! requests into ranked, paginated, highlighted result pages.
//!
//! # Modules
//!
//! - [`commands`] - High-level operations behind the CLI (index, search, get)
//! - [`corpus`] - Movie corpus loading and normalization
//! - [`query`] - Query model, validation, and query compilation
//! - [`search`] - Search backend trait, tantivy implementation, fallback execution
//! - [`results`] - Projection of raw hits into display records
//! - [`session`] - Keyed session store for pagination
//! - [`service`] - The search service contract (submit, page, document)
//! - [`config`] - Configuration loading
//! - [`cli`] - Command-line interface definitions

pub mod cli;
pub mod commands;
pub mod config;
pub mod corpus;
pub mod query;
pub mod results;
pub mod search;
pub mod service;
pub mod session;
