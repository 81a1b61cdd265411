// Migration integration tests
// Snapshot pairs in, ordered SQL out, per dialect

pub mod columns;
pub mod ordering;
pub mod push;
pub mod tables;
