use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;

use rawstats_core::{ColumnIntrospector, ColumnTypes, Error, Result};

use crate::options::PoolOptions;

mod queries;

/// Column introspector for MySQL and MariaDB data warehouses.
#[derive(Debug, Clone)]
pub struct MySqlIntrospector {
    pool: MySqlPool,
}

impl MySqlIntrospector {
    /// Create a new introspector using a pre-configured pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Connect a new pool to `url`.
    pub async fn connect(url: &str, opts: &PoolOptions) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(opts.max_connections)
            .acquire_timeout(opts.acquire_timeout)
            .connect(url)
            .await
            .map_err(|err| Error::IntrospectionConnection(err.to_string()))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl ColumnIntrospector for MySqlIntrospector {
    fn engine(&self) -> &'static str {
        "mysql"
    }

    async fn column_types(&self, schema: &str, table: &str) -> Result<ColumnTypes> {
        let columns = queries::list_column_types(&self.pool, schema, table).await?;
        tracing::trace!(
            event = "columns_listed",
            engine = "mysql",
            schema = %schema,
            table = %table,
            columns = columns.len()
        );
        Ok(columns.into_iter().collect())
    }
}
