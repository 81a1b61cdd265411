use crate::config::types::*;

/// Trait for merging optional configuration values
pub trait Merge<T> {
    fn merge(self, other: T) -> T;
}

impl<T> Merge<Option<T>> for Option<T> {
    fn merge(self, other: Option<T>) -> Option<T> {
        other.or(self)
    }
}

impl Merge<ConfigInput> for ConfigInput {
    fn merge(self, other: ConfigInput) -> ConfigInput {
        ConfigInput {
            dialect: self.dialect.merge(other.dialect),
            out: self.out.merge(other.out),
            breakpoints: self.breakpoints.merge(other.breakpoints),
            strict: self.strict.merge(other.strict),
            filters: match (self.filters, other.filters) {
                (Some(a), Some(b)) => Some(a.merge_with(b)),
                (a, b) => b.or(a),
            },
            database: match (self.database, other.database) {
                (Some(a), Some(b)) => Some(a.merge_with(b)),
                (a, b) => b.or(a),
            },
        }
    }
}

// Custom merge implementations for nested sections
impl FiltersInput {
    pub fn merge_with(self, other: FiltersInput) -> FiltersInput {
        FiltersInput {
            tables: other.tables.or(self.tables),
            schemas: other.schemas.or(self.schemas),
        }
    }
}

impl DatabaseInput {
    pub fn merge_with(self, other: DatabaseInput) -> DatabaseInput {
        DatabaseInput {
            url: other.url.or(self.url),
        }
    }
}
