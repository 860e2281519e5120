mod config;
mod registry;
mod writer;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use schemaforge_core::{
    build_fk_graph_report, build_schema, ensure_consistent, validate_schema, CatalogSnapshot,
    Error as CoreError, FkGraphReport, Schema, SCHEMA_VERSION,
};
use schemaforge_introspect::{Adapter, MySqlAdapter};
use sqlx::mysql::MySqlPoolOptions;
use thiserror::Error;
use uuid::Uuid;

use config::{Config, ConfigError, OutputConfig};
use registry::{
    init_logging, start_run, write_catalog, write_graph_report, write_schema, RunContext,
};
use writer::{write_ddl, write_json_atomic, DdlSources, WriterError};

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("output error: {0}")]
    Writer(#[from] WriterError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("failed to read catalog {}: {message}", .path.display())]
    Catalog { path: PathBuf, message: String },
    #[error("strict mode: {0}")]
    Strict(String),
}

#[derive(Parser, Debug)]
#[command(name = "schemaforge", version, about = "MySQL schema extraction and DDL synthesis")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read a live MySQL catalog and write the schema model and DDL.
    Extract(ExtractArgs),
    /// Rebuild the schema model and DDL from a stored catalog snapshot.
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Path to schemaforge.toml.
    #[arg(long, value_name = "FILE")]
    config: PathBuf,
    /// Output directory for runs.
    #[arg(long, default_value = "runs")]
    run_dir: PathBuf,
    /// Optional output path for schema.json (overrides output.schema_json).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Optional output path for the raw catalog snapshot.
    #[arg(long)]
    catalog_out: Option<PathBuf>,
    /// Fail on catalog inconsistencies or foreign-key cycles.
    #[arg(long, default_value_t = false)]
    strict: bool,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Catalog snapshot written by `extract --catalog-out`.
    #[arg(long, value_name = "FILE")]
    catalog: PathBuf,
    /// Optional schemaforge.toml supplying [output] and [extract].
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Output path for schema.json; printed to stdout when no path is configured.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Directory for generated .sql files (overrides output.ddl_dir).
    #[arg(long)]
    ddl_dir: Option<PathBuf>,
    /// Fail on catalog inconsistencies or foreign-key cycles.
    #[arg(long, default_value_t = false)]
    strict: bool,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Extract(args) => run_extract(args).await,
        Command::Render(args) => run_render(args),
    }
}

async fn run_extract(args: ExtractArgs) -> Result<(), CliError> {
    let config = Config::load(&args.config)?;
    let connection = config.connection()?;

    let pool = MySqlPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect_lazy_with(connection.connect_options());
    let adapter = MySqlAdapter::new(pool, connection.database.clone());

    let run_id = Uuid::new_v4().to_string();
    let run_ctx = RunContext {
        run_id: run_id.clone(),
        started_at: chrono::Utc::now(),
        engine: adapter.engine().to_string(),
        schema_version: SCHEMA_VERSION.to_string(),
        strict: args.strict,
        run_dir: args.run_dir,
        extract: config.extract.clone(),
        connection: connection.redacted(),
    };

    let run_paths = start_run(&run_ctx)?;
    init_logging(Some(&run_paths.logs_path))?;

    tracing::info!(
        event = "run_started",
        run_id = %run_id,
        engine = adapter.engine(),
        run_root = %run_paths.root.display()
    );
    let timer = Instant::now();

    tracing::info!(event = "introspection_started", database = %adapter.database());
    let catalog = adapter
        .fetch_catalog(&config.extract.introspect_options())
        .await?;
    tracing::info!(event = "introspection_finished");

    write_catalog(&run_paths, &catalog, args.catalog_out.as_deref())?;
    tracing::info!(event = "catalog_written", path = %run_paths.catalog_path.display());

    let schema = build_schema(&catalog, &config.extract.build);
    let report = build_fk_graph_report(&schema);
    write_graph_report(&run_paths, &report)?;

    emit_ddl(&schema, &config, None)?;

    let out = args.out.or_else(|| config.output.schema_json.clone());
    let issues = check_schema(&schema, &report, args.strict);
    write_schema(&run_paths, &schema.into_document(), out.as_deref())?;
    tracing::info!(event = "schema_written", path = %run_paths.schema_path.display());
    issues?;

    let duration_ms = timer.elapsed().as_millis();
    tracing::info!(event = "run_finished", status = "success", duration_ms = duration_ms);

    Ok(())
}

fn run_render(args: RenderArgs) -> Result<(), CliError> {
    init_logging(None)?;

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let catalog = read_catalog(&args.catalog)?;
    tracing::info!(event = "catalog_loaded", path = %args.catalog.display(), schema = %catalog.schema);

    let schema = build_schema(&catalog, &config.extract.build);
    let report = build_fk_graph_report(&schema);

    emit_ddl(&schema, &config, args.ddl_dir.as_deref())?;

    let out = args.out.or_else(|| config.output.schema_json.clone());
    let issues = check_schema(&schema, &report, args.strict);
    let document = schema.into_document();
    match out {
        Some(path) => {
            write_json_atomic(&path, &document)?;
            tracing::info!(event = "schema_written", path = %path.display());
        }
        None => {
            let json = serde_json::to_string_pretty(&document).map_err(WriterError::from)?;
            println!("{json}");
        }
    }
    issues
}

fn read_catalog(path: &Path) -> Result<CatalogSnapshot, CliError> {
    let content = std::fs::read_to_string(path).map_err(|err| CliError::Catalog {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|err| CliError::Catalog {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

fn emit_ddl(schema: &Schema, config: &Config, ddl_dir: Option<&Path>) -> Result<(), CliError> {
    if !config.extract.build.emit_ddl_files {
        return Ok(());
    }
    let OutputConfig {
        ddl_dir: configured,
        seed_dir,
        patch_dir,
        ..
    } = &config.output;
    let Some(ddl_dir) = ddl_dir.or(configured.as_deref()) else {
        return Ok(());
    };

    let sources = DdlSources {
        seed_dir: seed_dir.as_deref(),
        patch_dir: patch_dir.as_deref(),
    };
    write_ddl(schema, ddl_dir, &sources)?;
    Ok(())
}

/// Log diagnostics; under `strict` turn them into a failure.
fn check_schema(schema: &Schema, report: &FkGraphReport, strict: bool) -> Result<(), CliError> {
    for issue in validate_schema(schema) {
        tracing::warn!(event = "schema_issue", issue = %issue);
    }
    if let Some(cycle) = &report.cycle {
        tracing::warn!(event = "fk_cycle", tables = ?cycle);
    }

    if strict {
        ensure_consistent(schema)?;
        if report.has_cycle() {
            return Err(CliError::Strict(
                "foreign key graph contains cycles".to_string(),
            ));
        }
    }
    Ok(())
}
