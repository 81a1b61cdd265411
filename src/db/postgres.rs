use std::time::Duration;

use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, info};

use super::{Executor, Row};
use crate::error::{BoxError, DiffError, Result};

/// Mask password in database URL for display
pub fn mask_url_password(url: &str) -> String {
    let Some((protocol, rest)) = url.split_once("://") else {
        return url.to_string();
    };

    // user:pass@host
    if let Some((user_info, host_and_path)) = rest.split_once('@')
        && let Some((username, _)) = user_info.split_once(':')
    {
        return format!("{protocol}://{username}:***@{host_and_path}");
    }

    url.to_string()
}

/// [`Executor`] over a sqlx PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with a 5-second timeout.
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to {}", mask_url_password(url));
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await
            .map_err(|e| DiffError::Connection {
                source: Box::new(e),
            })?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Executor for PgExecutor {
    async fn query(&self, sql: &str, params: &[Value]) -> std::result::Result<Vec<Row>, BoxError> {
        // let the server shape each row as a JSON object
        let wrapped = format!("select row_to_json(t) from ({sql}) t");
        debug!("{wrapped}");

        let mut query = sqlx::query_scalar::<_, Value>(&wrapped);
        for param in params {
            query = match param {
                Value::Null => query.bind(None::<String>),
                Value::Bool(b) => query.bind(*b),
                Value::Number(n) if n.is_i64() => query.bind(n.as_i64()),
                Value::Number(n) => query.bind(n.as_f64()),
                Value::String(s) => query.bind(s.clone()),
                other => query.bind(other.clone()),
            };
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| match row {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect())
    }

    async fn run(&self, sql: &str) -> std::result::Result<(), BoxError> {
        debug!("{sql}");
        sqlx::raw_sql(sql).execute(&self.pool).await?;
        Ok(())
    }
}
