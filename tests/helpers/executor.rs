//! In-memory [`Executor`] that answers row-count probes and records statements.

use serde_json::{Value, json};
use snapdiff::db::{Executor, Row};
use snapdiff::error::BoxError;
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct FakeExecutor {
    /// Row counts keyed by the quoted table name that appears in the probe.
    rows: BTreeMap<String, u64>,
    fail_on: Option<String>,
    pub executed: Mutex<Vec<String>>,
    pub queries: Mutex<Vec<String>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, quoted_table: &str, count: u64) -> Self {
        self.rows.insert(quoted_table.to_string(), count);
        self
    }

    /// Fail any statement containing `fragment`.
    pub fn failing_on(mut self, fragment: &str) -> Self {
        self.fail_on = Some(fragment.to_string());
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

impl Executor for FakeExecutor {
    async fn query(&self, sql: &str, _params: &[Value]) -> Result<Vec<Row>, BoxError> {
        self.queries.lock().unwrap().push(sql.to_string());
        let count = self
            .rows
            .iter()
            .find(|(table, _)| sql.ends_with(table.as_str()))
            .map(|(_, count)| *count)
            .unwrap_or(0);

        let mut row = Row::new();
        row.insert("count".to_string(), json!(count));
        Ok(vec![row])
    }

    async fn run(&self, sql: &str) -> Result<(), BoxError> {
        if let Some(fragment) = &self.fail_on
            && sql.contains(fragment.as_str())
        {
            return Err(format!("relation does not exist: {fragment}").into());
        }
        self.executed.lock().unwrap().push(sql.to_string());
        Ok(())
    }
}
