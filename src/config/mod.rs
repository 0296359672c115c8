//! Configuration loading for filmdex.

use std::path::PathBuf;

use directories::{BaseDirs, ProjectDirs};
use serde::Deserialize;

use crate::search::DEFAULT_PAGE_SIZE;

/// Top-level configuration loaded from config.toml.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

/// Location of the JSON movie corpus.
#[derive(Debug, Deserialize)]
pub struct CorpusConfig {
    #[serde(default = "default_corpus_path")]
    pub path: String,
}

/// Location of the tantivy index directory.
#[derive(Debug, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_index_path")]
    pub path: String,
}

/// Query-side settings.
#[derive(Debug, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_corpus_path() -> String {
    "./movies.json".to_string()
}

fn default_index_path() -> String {
    "./.film-index".to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: default_corpus_path(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: default_index_path(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

impl Config {
    /// Load config from `FILMDEX_CONFIG` or the platform config directory,
    /// falling back to defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing config file cannot be read or parsed.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = std::env::var_os("FILMDEX_CONFIG")
            .map(PathBuf::from)
            .or_else(Self::config_path);

        if let Some(path) = config_path
            && path.exists()
        {
            let contents = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&contents)?;
            return Ok(config);
        }

        Ok(Config::default())
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "filmdex").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// Expand ~ to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path.starts_with("~/") {
        if let Some(base_dirs) = BaseDirs::new() {
            return base_dirs.home_dir().join(&path[2..]);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_a_file() {
        let config = Config::default();
        assert_eq!(config.corpus.path, "./movies.json");
        assert_eq!(config.index.path, "./.film-index");
        assert_eq!(config.search.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let config: Config = toml::from_str("[search]\npage_size = 25\n").unwrap();
        assert_eq!(config.search.page_size, 25);
        assert_eq!(config.corpus.path, "./movies.json");
    }

    #[test]
    fn expand_tilde_with_home_prefix() {
        let result = expand_tilde("~/films");
        assert!(!result.to_string_lossy().starts_with('~'));
        assert!(result.to_string_lossy().ends_with("films"));
    }

    #[test]
    fn expand_tilde_other_paths_unchanged() {
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        assert_eq!(expand_tilde("rel/path"), PathBuf::from("rel/path"));
    }
}
