use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use rawstats_core::{ColumnIntrospector, ColumnTypes, Error, Result};

use crate::options::PoolOptions;

mod queries;

/// Column introspector for PostgreSQL databases.
#[derive(Debug, Clone)]
pub struct PostgresIntrospector {
    pool: PgPool,
}

impl PostgresIntrospector {
    /// Create a new introspector using a pre-configured pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a new pool to `url`.
    pub async fn connect(url: &str, opts: &PoolOptions) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(opts.max_connections)
            .acquire_timeout(opts.acquire_timeout)
            .connect(url)
            .await
            .map_err(|err| Error::IntrospectionConnection(err.to_string()))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl ColumnIntrospector for PostgresIntrospector {
    fn engine(&self) -> &'static str {
        "postgres"
    }

    async fn column_types(&self, schema: &str, table: &str) -> Result<ColumnTypes> {
        let columns = queries::list_column_types(&self.pool, schema, table).await?;
        tracing::trace!(
            event = "columns_listed",
            engine = "postgres",
            schema = %schema,
            table = %table,
            columns = columns.len()
        );
        Ok(columns.into_iter().collect())
    }
}
