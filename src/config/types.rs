use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::snapshot::Dialect;

/// Raw configuration input - all fields Optional for merging
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConfigInput {
    pub dialect: Option<Dialect>,
    pub out: Option<String>,
    pub breakpoints: Option<bool>,
    pub strict: Option<bool>,
    pub filters: Option<FiltersInput>,
    pub database: Option<DatabaseInput>,
}

/// Resolved configuration with all defaults applied
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Expected dialect of every snapshot; `None` accepts whatever the files say.
    pub dialect: Option<Dialect>,
    pub out: String,
    pub breakpoints: bool,
    /// Ask for approval on every push, not only destructive ones.
    pub strict: bool,
    pub filters: Filters,
    pub database: Database,
}

// Object filters
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FiltersInput {
    pub tables: Option<Vec<String>>,
    pub schemas: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    /// Glob patterns; a leading `!` excludes.
    pub tables: Vec<String>,
    /// Schema allow-list; empty manages every schema.
    pub schemas: Vec<String>,
}

// Database connection
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatabaseInput {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Database {
    pub url: Option<String>,
}

// CLI argument groups for command-specific options
#[derive(Debug, Clone, Default, Args)]
pub struct DatabaseArgs {
    #[arg(long, help = "Database URL (defaults to DATABASE_URL)")]
    pub database_url: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    #[arg(long = "tables-filter", help = "Manage only matching tables (glob, `!` negates)")]
    pub tables: Option<Vec<String>>,

    #[arg(long = "schema-filter", help = "Manage only these schemas")]
    pub schemas: Option<Vec<String>>,
}

/// Command-line spelling of [`Dialect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DialectArg {
    #[value(alias = "pg")]
    Postgresql,
    Mysql,
    Sqlite,
    Singlestore,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Postgresql => Dialect::Postgresql,
            DialectArg::Mysql => Dialect::Mysql,
            DialectArg::Sqlite => Dialect::Sqlite,
            DialectArg::Singlestore => Dialect::Singlestore,
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct OutputArgs {
    #[arg(long, value_enum, help = "Dialect every snapshot must use")]
    pub dialect: Option<DialectArg>,

    #[arg(long, help = "Separate statements with breakpoint markers")]
    pub breakpoints: bool,

    #[arg(long, help = "Write statements without breakpoint markers")]
    pub no_breakpoints: bool,
}

// Conversion functions from CLI args to config input
impl From<DatabaseArgs> for DatabaseInput {
    fn from(args: DatabaseArgs) -> Self {
        Self {
            url: args.database_url,
        }
    }
}

impl From<FilterArgs> for FiltersInput {
    fn from(args: FilterArgs) -> Self {
        Self {
            tables: args.tables,
            schemas: args.schemas,
        }
    }
}

impl From<OutputArgs> for ConfigInput {
    fn from(args: OutputArgs) -> Self {
        Self {
            dialect: args.dialect.map(Dialect::from),
            breakpoints: if args.no_breakpoints {
                Some(false)
            } else if args.breakpoints {
                Some(true)
            } else {
                None
            },
            ..Self::default()
        }
    }
}
