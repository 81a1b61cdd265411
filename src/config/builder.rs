use crate::config::{merge::Merge, types::*};
use anyhow::{Result, bail};

pub struct ConfigBuilder {
    config_input: ConfigInput,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config_input: ConfigInput::default(),
        }
    }

    pub fn with_file(mut self, file_input: ConfigInput) -> Self {
        self.config_input = self.config_input.merge(file_input);
        self
    }

    pub fn with_cli_args(mut self, cli_input: ConfigInput) -> Self {
        self.config_input = self.config_input.merge(cli_input);
        self
    }

    pub fn resolve(self) -> Result<Config> {
        let defaults = Config::with_defaults();

        let out = self
            .config_input
            .out
            .clone()
            .unwrap_or_else(|| defaults.out.clone());
        if out.trim().is_empty() {
            bail!("`out` must name a file");
        }

        Ok(Config {
            dialect: self.config_input.dialect.or(defaults.dialect),
            out,
            breakpoints: self.config_input.breakpoints.unwrap_or(defaults.breakpoints),
            strict: self.config_input.strict.unwrap_or(defaults.strict),
            filters: self.resolve_filters(&defaults.filters),
            database: self.resolve_database(&defaults.database),
        })
    }

    fn resolve_filters(&self, defaults: &Filters) -> Filters {
        let filters_input = self.config_input.filters.as_ref();

        Filters {
            tables: filters_input
                .and_then(|f| f.tables.as_ref())
                .cloned()
                .unwrap_or_else(|| defaults.tables.clone()),
            schemas: filters_input
                .and_then(|f| f.schemas.as_ref())
                .cloned()
                .unwrap_or_else(|| defaults.schemas.clone()),
        }
    }

    fn resolve_database(&self, defaults: &Database) -> Database {
        let url = self
            .config_input
            .database
            .as_ref()
            .and_then(|d| d.url.as_ref())
            .cloned()
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .or_else(|| defaults.url.clone());

        Database { url }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
