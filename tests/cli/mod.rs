// CLI tests: run the binary against snapshot files in a temp directory

pub mod check;
pub mod errors;
pub mod generate;
pub mod push;
