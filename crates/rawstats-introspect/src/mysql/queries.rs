use sqlx::MySqlPool;

use rawstats_core::{Error, Result};

/// `(column name, column type)` pairs of `schema.table` from
/// `information_schema.columns`, e.g. `("cpu_time", "decimal(18,2)")`.
pub async fn list_column_types(
    pool: &MySqlPool,
    schema: &str,
    table: &str,
) -> Result<Vec<(String, String)>> {
    // CAST avoids VARBINARY results on MySQL 8.0+.
    sqlx::query_as::<_, (String, String)>(
        r#"
        SELECT
            CAST(c.COLUMN_NAME AS CHAR) AS column_name,
            CAST(c.COLUMN_TYPE AS CHAR) AS column_type
        FROM information_schema.columns c
        WHERE c.TABLE_SCHEMA = ?
          AND c.TABLE_NAME = ?
        ORDER BY c.ORDINAL_POSITION
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(|err| Error::IntrospectionConnection(err.to_string()))
}
