//! Runtime settings, read from environment variables.
//!
//! - `FLASHCARDS_DB`: database file (default `flashcards.sqlite3`)
//! - `FLASHCARDS_MODE`: initial quiz order, `random` or `ordered` (default `random`)
//! - `FLASHCARDS_SEED`: `0`/`false` skips sample data on a fresh database
//!
//! Log filtering is left to `RUST_LOG`.

use crate::models::QuizMode;
use log::warn;
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "FLASHCARDS_DB";
pub const MODE_VAR: &str = "FLASHCARDS_MODE";
pub const SEED_VAR: &str = "FLASHCARDS_SEED";

const DEFAULT_DB_PATH: &str = "flashcards.sqlite3";

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub default_mode: QuizMode,
    pub seed_sample_data: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DB_PATH),
            default_mode: QuizMode::Random,
            seed_sample_data: true,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unusable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(DB_PATH_VAR).filter(|p| !p.trim().is_empty()) {
            config.database_path = PathBuf::from(path);
        }

        if let Some(mode) = lookup(MODE_VAR) {
            match mode.parse::<QuizMode>() {
                Ok(mode) => config.default_mode = mode,
                Err(e) => warn!("{}: {}, using {}", MODE_VAR, e, config.default_mode),
            }
        }

        if let Some(seed) = lookup(SEED_VAR) {
            match seed.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => config.seed_sample_data = true,
                "0" | "false" | "no" => config.seed_sample_data = false,
                other => warn!("{}: unrecognised value '{}', ignoring", SEED_VAR, other),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(AppConfig::from_lookup(lookup(&[])), AppConfig::default());
    }

    #[test]
    fn test_reads_all_values() {
        let config = AppConfig::from_lookup(lookup(&[
            (DB_PATH_VAR, "/tmp/cards.db"),
            (MODE_VAR, "ordered"),
            (SEED_VAR, "false"),
        ]));

        assert_eq!(config.database_path, PathBuf::from("/tmp/cards.db"));
        assert_eq!(config.default_mode, QuizMode::Ordered);
        assert!(!config.seed_sample_data);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = AppConfig::from_lookup(lookup(&[
            (DB_PATH_VAR, "  "),
            (MODE_VAR, "backwards"),
            (SEED_VAR, "maybe"),
        ]));

        assert_eq!(config, AppConfig::default());
    }
}
