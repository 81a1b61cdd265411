use uuid::Uuid;

// Snapshot chain sentinel: the prevId of the first snapshot in a history
pub const ORIGIN_ID: Uuid = Uuid::nil();

// Separator written between statements in migration files
pub const STATEMENT_BREAKPOINT: &str = "--> statement-breakpoint";

// Configuration file name
pub const CONFIG_FILENAME: &str = "snapdiff.yaml";

// Default output file for `generate`
pub const DEFAULT_MIGRATION_FILENAME: &str = "migration.sql";

// Prefix of the shadow table used while recreating a table
pub const RECREATE_TABLE_PREFIX: &str = "__new_";
