use sqlx::PgPool;

use rawstats_core::{Error, Result};

/// `(column name, formatted type)` pairs of `schema.table`, excluding
/// system and dropped columns.
pub async fn list_column_types(
    pool: &PgPool,
    schema: &str,
    table: &str,
) -> Result<Vec<(String, String)>> {
    sqlx::query_as::<_, (String, String)>(
        r#"
        select
          a.attname::text as column_name,
          pg_catalog.format_type(a.atttypid, a.atttypmod) as column_type
        from pg_attribute a
        join pg_class c on c.oid = a.attrelid
        join pg_namespace n on n.oid = c.relnamespace
        where n.nspname = $1
          and c.relname = $2
          and a.attnum > 0
          and not a.attisdropped
        order by a.attnum
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(|err| Error::IntrospectionConnection(err.to_string()))
}
