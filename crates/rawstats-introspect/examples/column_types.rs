use anyhow::{Context, Result};

use rawstats_introspect::{PoolOptions, connect};

#[tokio::main]
async fn main() -> Result<()> {
    let db_url = std::env::var("DATABASE_URL").context("set DATABASE_URL")?;
    let mut args = std::env::args().skip(1);
    let schema = args.next().context("usage: column_types <schema> <table>")?;
    let table = args.next().context("usage: column_types <schema> <table>")?;

    let introspector = connect(&db_url, &PoolOptions::default()).await?;
    let mut columns: Vec<_> = introspector
        .column_types(&schema, &table)
        .await?
        .into_iter()
        .collect();
    columns.sort();

    println!("{}", serde_json::to_string_pretty(&columns)?);

    Ok(())
}
