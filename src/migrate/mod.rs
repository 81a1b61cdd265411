//! The `generate` and `push` pipelines and the compiler they share.

pub mod compile;
pub mod generation;
pub mod push;

pub use compile::{CompiledMigration, CompiledStatement, MigrationMeta, compile};
pub use generation::{GeneratedMigration, generate_migration, render_migration_file};
pub use push::{PushPlan, plan_push};
