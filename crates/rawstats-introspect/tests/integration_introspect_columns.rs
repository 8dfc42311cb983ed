use std::env;

use anyhow::{Context, Result, anyhow};
use rawstats_core::{
    ColumnIntrospector, ExportCatalogBuilder, RawStatisticsConfig, RealmConfigStore, VariableStore,
};
use rawstats_introspect::{Engine, MySqlIntrospector, PoolOptions, PostgresIntrospector};

const POSTGRES_FIXTURE: &[&str] = &[
    "drop schema if exists rawstats_test cascade",
    "create schema rawstats_test",
    "create table rawstats_test.job_tasks (
        job_id bigint primary key,
        cpu_time numeric(18,2) not null,
        submit_time_ts integer not null
    )",
    "alter table rawstats_test.job_tasks drop column submit_time_ts",
];

const MYSQL_FIXTURE: &[&str] = &[
    "drop database if exists rawstats_test",
    "create database rawstats_test",
    "create table rawstats_test.job_tasks (
        job_id bigint(20) unsigned primary key,
        cpu_time decimal(18,2) not null
    )",
];

fn database_url() -> Result<String> {
    env::var("TEST_DATABASE_URL").context("set TEST_DATABASE_URL for integration tests")
}

async fn connect_with_fixture(url: &str) -> Result<Box<dyn ColumnIntrospector>> {
    let opts = PoolOptions::default();
    match Engine::detect(url)? {
        Engine::Postgres => {
            let introspector = PostgresIntrospector::connect(url, &opts).await?;
            for sql in POSTGRES_FIXTURE {
                sqlx::query(sql)
                    .execute(introspector.pool())
                    .await
                    .with_context(|| format!("executing fixture statement {sql}"))?;
            }
            Ok(Box::new(introspector))
        }
        Engine::MySql => {
            let introspector = MySqlIntrospector::connect(url, &opts).await?;
            for sql in MYSQL_FIXTURE {
                sqlx::query(sql)
                    .execute(introspector.pool())
                    .await
                    .with_context(|| format!("executing fixture statement {sql}"))?;
            }
            Ok(Box::new(introspector))
        }
    }
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn introspects_column_types_of_existing_table() -> Result<()> {
    let url = database_url()?;
    let introspector = connect_with_fixture(&url).await?;

    let columns = introspector
        .column_types("rawstats_test", "job_tasks")
        .await?;

    let cpu_time = columns
        .get("cpu_time")
        .ok_or_else(|| anyhow!("expected cpu_time column"))?;
    let expected = match introspector.engine() {
        "postgres" => "numeric(18,2)",
        _ => "decimal(18,2)",
    };
    assert_eq!(cpu_time, expected);
    assert!(columns.contains_key("job_id"));
    assert!(
        !columns.contains_key("submit_time_ts"),
        "dropped columns should not be reported"
    );

    Ok(())
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn missing_table_has_no_columns() -> Result<()> {
    let url = database_url()?;
    let introspector = connect_with_fixture(&url).await?;

    let columns = introspector
        .column_types("rawstats_test", "no_such_table")
        .await?;
    assert!(columns.is_empty());

    Ok(())
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn builds_catalog_against_live_schema() -> Result<()> {
    let url = database_url()?;
    let introspector = connect_with_fixture(&url).await?;

    let config = RawStatisticsConfig::from_value(serde_json::json!({
        "realms": {
            "jobs": {
                "tables": [{ "alias": "jt", "name": "job_tasks", "schema": "rawstats_test" }],
                "fields": [{
                    "name": "cpu_time",
                    "tableAlias": "jt",
                    "column": "cpu_time",
                    "batchExport": true,
                    "documentation": "CPU time"
                }]
            }
        }
    }))?;
    let store = RealmConfigStore::from_config(config);
    let variables = VariableStore::default();

    let catalog = ExportCatalogBuilder::new(&store, &variables)
        .with_introspector(introspector.as_ref())
        .build_export_catalog("jobs", true)
        .await?;

    assert_eq!(catalog.len(), 1);
    assert!(catalog[0].data_type.is_some());

    Ok(())
}
