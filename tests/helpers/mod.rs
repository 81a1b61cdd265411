pub mod cli;
pub mod executor;
pub mod migration;
pub mod snapshots;
