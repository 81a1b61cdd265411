//! Error taxonomy for the diff engine.
//!
//! Every variant names the entity or category that triggered it so a failure can be acted on
//! without re-running the diff with extra logging.

use std::fmt;

use crate::snapshot::Dialect;
use crate::snapshot::id::{Category, EntityId};

/// Boxed error used at collaborator boundaries (resolvers, executors).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T, E = DiffError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// Input failed structural validation before diffing began.
    #[error("malformed snapshot: {entity}: {reason}")]
    MalformedSnapshot { entity: String, reason: String },

    /// Both sides of a diff must target the same database.
    #[error("cannot diff a {prev} snapshot against a {cur} snapshot")]
    DialectMismatch { prev: Dialect, cur: Dialect },

    /// A resolver returned a partial or invented decision set.
    #[error("resolver returned an invalid decision for {category}: {detail}")]
    UnresolvedAmbiguity { category: Category, detail: String },

    #[error(transparent)]
    UnsupportedDialectOperation(#[from] UnsupportedOperation),

    /// The resolver itself failed (prompt aborted, I/O error).
    #[error("resolving {category} failed")]
    Resolver {
        category: Category,
        #[source]
        source: BoxError,
    },

    /// Raised by the executor while applying or probing; never retried.
    #[error("failed to execute `{statement}`")]
    Execution {
        statement: String,
        #[source]
        source: BoxError,
    },

    #[error("could not connect to the database")]
    Connection {
        #[source]
        source: BoxError,
    },

    /// A collaborator the caller asked for is not compiled in or not reachable.
    #[error("{capability} is not available: {hint}")]
    MissingCapability { capability: String, hint: String },

    #[error("invalid snapshot JSON")]
    Json(#[from] serde_json::Error),
}

impl DiffError {
    pub fn malformed(entity: impl fmt::Display, reason: impl Into<String>) -> Self {
        DiffError::MalformedSnapshot {
            entity: entity.to_string(),
            reason: reason.into(),
        }
    }
}

/// An operation the target dialect cannot express.
///
/// Surfaced as a statement-level warning by the compiler; the statement is skipped and the
/// caller decides whether a manual migration is needed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{dialect} cannot {operation} for {entity}: {reason}")]
pub struct UnsupportedOperation {
    pub dialect: Dialect,
    pub operation: String,
    pub entity: EntityId,
    pub reason: String,
}

impl UnsupportedOperation {
    pub fn new(
        dialect: Dialect,
        operation: impl Into<String>,
        entity: EntityId,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            dialect,
            operation: operation.into(),
            entity,
            reason: reason.into(),
        }
    }
}
