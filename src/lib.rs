//! Snapshot differ and migration generator.
//!
//! Two schema snapshots go in; an ordered list of SQL statements comes out. Ambiguous
//! add/remove pairs are settled by a [`resolver::Resolver`], statements are rendered per
//! dialect by a [`render::SqlDialect`], and `push` additionally classifies destructive
//! changes against a live database before applying them.

pub mod classify;
pub mod config;
pub mod constants;
pub mod db;
pub mod diff;
pub mod error;
pub mod migrate;
pub mod prompts;
pub mod render;
pub mod resolver;
pub mod snapshot;
pub mod squash;

pub use error::{DiffError, Result};
