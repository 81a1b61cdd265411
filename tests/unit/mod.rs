// Unit-level tests for the public library surface

pub mod config;
pub mod resolver;
pub mod snapshots;
