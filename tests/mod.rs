// Integration tests for snapdiff

pub mod cli;
pub mod helpers;
pub mod migrations;
pub mod unit;
