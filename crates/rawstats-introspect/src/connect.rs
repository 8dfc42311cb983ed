use rawstats_core::{ColumnIntrospector, Error, Result};

use crate::mysql::MySqlIntrospector;
use crate::options::PoolOptions;
use crate::postgres::PostgresIntrospector;

/// Database engines with a column introspector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Postgres,
    MySql,
}

impl Engine {
    /// Detect the engine from a connection URL scheme.
    pub fn detect(url: &str) -> Result<Self> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(Self::Postgres)
        } else if url.starts_with("mysql://") || url.starts_with("mariadb://") {
            Ok(Self::MySql)
        } else {
            let scheme = url.split("://").next().unwrap_or(url);
            Err(Error::UnsupportedEngine(scheme.to_string()))
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
        }
    }
}

/// Connect an introspector for the engine named by `url`.
pub async fn connect(url: &str, opts: &PoolOptions) -> Result<Box<dyn ColumnIntrospector>> {
    let introspector: Box<dyn ColumnIntrospector> = match Engine::detect(url)? {
        Engine::Postgres => Box::new(PostgresIntrospector::connect(url, opts).await?),
        Engine::MySql => {
            let url = match url.strip_prefix("mariadb://") {
                Some(rest) => format!("mysql://{rest}"),
                None => url.to_string(),
            };
            Box::new(MySqlIntrospector::connect(&url, opts).await?)
        }
    };
    tracing::info!(event = "introspector_connected", engine = introspector.engine());
    Ok(introspector)
}
