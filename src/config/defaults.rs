use crate::config::types::*;
use crate::constants::DEFAULT_MIGRATION_FILENAME;

// Config derives Default; the builder resolves against these values

pub fn default_out() -> String {
    DEFAULT_MIGRATION_FILENAME.to_string()
}

pub fn default_breakpoints() -> bool {
    true
}

impl Config {
    pub fn with_defaults() -> Self {
        Self {
            dialect: None,
            out: default_out(),
            breakpoints: default_breakpoints(),
            strict: false,
            filters: Filters::default(),
            database: Database::default(),
        }
    }
}
