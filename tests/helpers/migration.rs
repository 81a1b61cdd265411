//! Runs the generate pipeline over in-memory snapshots.

use snapdiff::migrate::{GeneratedMigration, generate_migration};
use snapdiff::resolver::{Resolver, ScriptedResolver};
use snapdiff::snapshot::Snapshot;

pub struct MigrationTestHelper {
    pub prev: Snapshot,
    pub cur: Snapshot,
}

impl MigrationTestHelper {
    pub fn new(prev: Snapshot, cur: Snapshot) -> Self {
        Self { prev, cur }
    }

    /// Generate without any declared renames.
    pub async fn generate(&self) -> GeneratedMigration {
        self.generate_with(ScriptedResolver::new()).await
    }

    pub async fn generate_with<R: Resolver>(&self, mut resolver: R) -> GeneratedMigration {
        generate_migration(&self.prev, &self.cur, &mut resolver)
            .await
            .expect("migration should generate")
    }

    pub async fn statements(&self) -> Vec<String> {
        self.generate().await.migration.sql_statements
    }

    /// Run a migration and hand the statements to `assertions`.
    pub async fn run_migration_test<F>(&self, resolver: ScriptedResolver, assertions: F)
    where
        F: FnOnce(&[String], &GeneratedMigration),
    {
        let generated = self.generate_with(resolver).await;
        assertions(&generated.migration.sql_statements, &generated);
    }
}

/// Position of the first statement containing `needle`.
pub fn position_of(statements: &[String], needle: &str) -> usize {
    statements
        .iter()
        .position(|s| s.contains(needle))
        .unwrap_or_else(|| panic!("no statement contains `{needle}`: {statements:#?}"))
}
