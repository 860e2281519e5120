use std::fs::{create_dir_all, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use serde::Serialize;

use schemaforge_core::{CatalogSnapshot, FkGraphReport, SchemaDocument};

use crate::config::{ExtractConfig, RedactedConnection};
use crate::writer::write_json_atomic;

use super::RegistryResult;

/// Metadata captured at run start.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub engine: String,
    pub schema_version: String,
    pub strict: bool,
    pub run_dir: PathBuf,
    pub extract: ExtractConfig,
    pub connection: RedactedConnection,
}

/// JSON config written to each run directory.
#[derive(Debug, Serialize)]
struct RunConfig<'a> {
    run_id: &'a str,
    started_at: String,
    engine: &'a str,
    schema_version: &'a str,
    strict: bool,
    extract: &'a ExtractConfig,
    connection: &'a RedactedConnection,
    git: GitInfo,
}

/// Git metadata for reproducibility.
#[derive(Debug, Serialize)]
struct GitInfo {
    commit: Option<String>,
    dirty: Option<bool>,
}

/// Paths for run artifacts.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub root: PathBuf,
    pub schema_path: PathBuf,
    pub catalog_path: PathBuf,
    pub graph_path: PathBuf,
    pub logs_path: PathBuf,
}

/// Create `<run_dir>/<timestamp>__run_<id>/` with its `config.json` and an
/// empty `logs.ndjson`.
pub fn start_run(ctx: &RunContext) -> RegistryResult<RunPaths> {
    let timestamp = ctx.started_at.format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let root = ctx.run_dir.join(format!("{timestamp}__run_{}", ctx.run_id));
    create_dir_all(&root)?;

    let config = RunConfig {
        run_id: &ctx.run_id,
        started_at: ctx.started_at.to_rfc3339(),
        engine: &ctx.engine,
        schema_version: &ctx.schema_version,
        strict: ctx.strict,
        extract: &ctx.extract,
        connection: &ctx.connection,
        git: collect_git_info(),
    };
    write_json_atomic(&root.join("config.json"), &config)?;

    let logs_path = root.join("logs.ndjson");
    OpenOptions::new().create(true).append(true).open(&logs_path)?;

    Ok(RunPaths {
        schema_path: root.join("schema.json"),
        catalog_path: root.join("catalog.json"),
        graph_path: root.join("fk_graph.json"),
        logs_path,
        root,
    })
}

/// Write `schema.json` into the run and, when requested, to `out_path`.
pub fn write_schema(
    paths: &RunPaths,
    document: &SchemaDocument,
    out_path: Option<&Path>,
) -> RegistryResult<()> {
    write_json_atomic(&paths.schema_path, document)?;
    if let Some(out_path) = out_path {
        write_json_atomic(out_path, document)?;
    }
    Ok(())
}

pub fn write_catalog(
    paths: &RunPaths,
    catalog: &CatalogSnapshot,
    out_path: Option<&Path>,
) -> RegistryResult<()> {
    write_json_atomic(&paths.catalog_path, catalog)?;
    if let Some(out_path) = out_path {
        write_json_atomic(out_path, catalog)?;
    }
    Ok(())
}

pub fn write_graph_report(paths: &RunPaths, report: &FkGraphReport) -> RegistryResult<()> {
    Ok(write_json_atomic(&paths.graph_path, report)?)
}

fn collect_git_info() -> GitInfo {
    let commit = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|value| !value.is_empty());

    let dirty = Command::new("git")
        .args(["status", "--porcelain"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| !output.stdout.is_empty());

    GitInfo { commit, dirty }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_run_creates_layout_with_redacted_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = RunContext {
            run_id: "abc".to_string(),
            started_at: DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
                .expect("timestamp")
                .with_timezone(&Utc),
            engine: "mysql".to_string(),
            schema_version: "0.1".to_string(),
            strict: false,
            run_dir: dir.path().to_path_buf(),
            extract: ExtractConfig::default(),
            connection: RedactedConnection {
                host: "localhost".to_string(),
                port: 3306,
                user: "root".to_string(),
                password: Some("***".to_string()),
                database: "shop".to_string(),
            },
        };

        let paths = start_run(&ctx).expect("start run");
        assert_eq!(
            paths.root,
            dir.path().join("2026-01-02T03-04-05Z__run_abc")
        );
        assert!(paths.logs_path.is_file());

        let config: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(paths.root.join("config.json")).expect("config"),
        )
        .expect("json");
        assert_eq!(config["connection"]["password"], "***");
        assert_eq!(config["extract"]["include_views"], true);
        assert_eq!(config["extract"]["procedure_delimiter"], "$$");

        let document = schemaforge_core::Schema::empty("shop").into_document();
        write_schema(&paths, &document, None).expect("schema");
        assert!(paths.schema_path.is_file());
    }
}
