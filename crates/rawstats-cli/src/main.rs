mod logging;
mod settings;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use rawstats_core::{
    Error as CoreError, ExportCatalogBuilder, FieldResolver, JsonFileSource, RealmConfig,
    RealmConfigStore, config_json_schema,
};
use rawstats_introspect::PoolOptions;
use serde::Serialize;
use thiserror::Error;

use logging::{LogFormat, init_logging};
use settings::load_settings;

#[derive(Debug, Error)]
enum CliError {
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
}

#[derive(Parser, Debug)]
#[command(name = "rawstats", version, about = "Raw statistics metadata for batch export")]
struct Cli {
    /// Directory containing rawstatistics.json and rawstatistics.d/.
    #[arg(long, env = "RAWSTATS_CONFIG_DIR", default_value = "etc")]
    config_dir: PathBuf,
    /// TOML file with organization and hierarchy constants.
    #[arg(long, env = "RAWSTATS_CONSTANTS")]
    constants: Option<PathBuf>,
    /// Log format written to stderr.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List realms.
    Realms(RealmsArgs),
    /// Print the resolved field definitions of a realm.
    Fields(FieldsArgs),
    /// Print the batch export catalog of a realm.
    Catalog(CatalogArgs),
    /// Load and validate the configuration.
    Validate,
    /// Print the JSON Schema of rawstatistics.json.
    Schema,
}

#[derive(Args, Debug)]
struct RealmsArgs {
    /// Only realms that support "show raw data".
    #[arg(long, conflicts_with = "batch_export")]
    raw_data: bool,
    /// Only realms that support batch export.
    #[arg(long)]
    batch_export: bool,
}

#[derive(Args, Debug)]
struct FieldsArgs {
    realm: String,
}

#[derive(Args, Debug)]
struct CatalogArgs {
    /// Realm to describe.
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    realm: Option<String>,
    /// Describe every batch-exportable realm.
    #[arg(long)]
    all: bool,
    /// Database connection string; data types are included when set.
    #[arg(long, env = "DATABASE_URL", value_name = "CONNECTION_STRING")]
    conn: Option<String>,
    /// Upper bound for each schema introspection query.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

#[derive(Debug, Serialize)]
struct RealmSummary<'a> {
    name: &'a str,
    display: &'a str,
    raw_data: bool,
    batch_export: bool,
}

impl<'a> From<&'a RealmConfig> for RealmSummary<'a> {
    fn from(realm: &'a RealmConfig) -> Self {
        Self {
            name: &realm.name,
            display: realm.display_name(),
            raw_data: realm.raw_data_enabled(),
            batch_export: realm.batch_export_enabled(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_logging(cli.log_format)?;

    let store = RealmConfigStore::new(JsonFileSource::new(&cli.config_dir));

    match cli.command {
        Command::Realms(args) => run_realms(&store, args),
        Command::Fields(args) => run_fields(&store, cli.constants, args),
        Command::Catalog(args) => run_catalog(&store, cli.constants, args).await,
        Command::Validate => run_validate(&store),
        Command::Schema => print_json(&config_json_schema()),
    }
}

fn run_realms(store: &RealmConfigStore, args: RealmsArgs) -> Result<(), CliError> {
    let realms = if args.raw_data {
        store.get_raw_data_realms()?
    } else if args.batch_export {
        store.get_batch_export_realms()?
    } else {
        store.config()?.realms.values().collect()
    };

    let summaries: Vec<RealmSummary<'_>> = realms.into_iter().map(RealmSummary::from).collect();
    print_json(&summaries)
}

fn run_fields(
    store: &RealmConfigStore,
    constants: Option<PathBuf>,
    args: FieldsArgs,
) -> Result<(), CliError> {
    let variables = load_settings(constants.as_deref())?.variables();
    let fields = FieldResolver::new(store, &variables).resolve_fields(&args.realm)?;
    print_json(&fields)
}

async fn run_catalog(
    store: &RealmConfigStore,
    constants: Option<PathBuf>,
    args: CatalogArgs,
) -> Result<(), CliError> {
    let variables = load_settings(constants.as_deref())?.variables();
    let timer = Instant::now();

    let introspector = match &args.conn {
        Some(conn) => Some(rawstats_introspect::connect(conn, &PoolOptions::default()).await?),
        None => None,
    };
    let include_data_types = introspector.is_some();

    let mut builder = ExportCatalogBuilder::new(store, &variables)
        .with_timeout(Duration::from_secs(args.timeout_secs));
    if let Some(introspector) = &introspector {
        builder = builder.with_introspector(introspector.as_ref());
    }

    if args.all {
        let catalogs = builder.build_all_export_catalogs(include_data_types).await?;
        tracing::info!(
            event = "catalogs_built",
            realms = catalogs.len(),
            duration_ms = timer.elapsed().as_millis()
        );
        return print_json(&catalogs);
    }

    let realm = args
        .realm
        .ok_or_else(|| CliError::InvalidArgs("a realm or --all is required".to_string()))?;
    let catalog = builder
        .build_export_catalog(&realm, include_data_types)
        .await?;
    tracing::info!(
        event = "catalog_built",
        realm = %realm,
        fields = catalog.len(),
        duration_ms = timer.elapsed().as_millis()
    );
    print_json(&catalog)
}

fn run_validate(store: &RealmConfigStore) -> Result<(), CliError> {
    let config = store.config()?;
    let fields: usize = config
        .realms
        .values()
        .map(|realm| realm.fields.as_ref().map_or(0, Vec::len))
        .sum();
    tracing::info!(event = "config_valid", realms = config.realms.len(), fields);
    println!(
        "configuration is valid: {} realm(s), {fields} field(s)",
        config.realms.len()
    );
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
