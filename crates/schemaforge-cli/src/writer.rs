use std::fs::{create_dir_all, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use schemaforge_core::Schema;

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid output path: {0}")]
    InvalidPath(String),
}

pub type WriterResult<T> = std::result::Result<T, WriterError>;

const TABLES_DIR: &str = "tables";
const PROCEDURES_DIR: &str = "procedures";
const INIT_DIR: &str = "init";

/// Where the DDL writer reads extra scripts from.
#[derive(Debug, Clone, Default)]
pub struct DdlSources<'a> {
    pub seed_dir: Option<&'a Path>,
    pub patch_dir: Option<&'a Path>,
}

pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> WriterResult<()> {
    let mut data = serde_json::to_vec_pretty(value)?;
    data.push(b'\n');
    write_bytes_atomic(path, &data)
}

pub fn write_bytes_atomic(path: &Path, data: &[u8]) -> WriterResult<()> {
    let parent = path.parent().filter(|parent| !parent.as_os_str().is_empty());
    if let Some(parent) = parent {
        create_dir_all(parent)?;
    }

    let tmp_path = temp_path(path)?;
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    std::fs::rename(&tmp_path, path)?;
    if let Some(parent) = parent {
        sync_dir(parent)?;
    }

    Ok(())
}

fn temp_path(path: &Path) -> WriterResult<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| WriterError::InvalidPath(path.display().to_string()))?;
    let tmp_name = format!(".{}.tmp", file_name.to_string_lossy());
    Ok(path.with_file_name(tmp_name))
}

#[cfg(unix)]
fn sync_dir(path: &Path) -> io::Result<()> {
    let dir = OpenOptions::new().read(true).open(path)?;
    dir.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_path: &Path) -> io::Result<()> {
    Ok(())
}

fn entity_file(dir: &Path, name: &str) -> WriterResult<PathBuf> {
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(WriterError::InvalidPath(name.to_string()));
    }
    Ok(dir.join(format!("{name}.sql")))
}

/// Write per-entity `.sql` files and the numbered init scripts under `ddl_dir`.
///
/// Returns every path written, in write order.
pub fn write_ddl(
    schema: &Schema,
    ddl_dir: &Path,
    sources: &DdlSources<'_>,
) -> WriterResult<Vec<PathBuf>> {
    let mut written = Vec::new();

    let tables_dir = ddl_dir.join(TABLES_DIR);
    for table in &schema.tables {
        let path = entity_file(&tables_dir, &table.name)?;
        write_bytes_atomic(&path, table.definition.as_bytes())?;
        written.push(path);
    }

    let procedures_dir = ddl_dir.join(PROCEDURES_DIR);
    for procedure in &schema.procedures {
        let path = entity_file(&procedures_dir, &procedure.name)?;
        write_bytes_atomic(&path, procedure.definition.as_bytes())?;
        written.push(path);
    }

    let init_dir = ddl_dir.join(INIT_DIR);
    for (file_name, content) in init_phases(schema, sources)? {
        let path = init_dir.join(file_name);
        write_bytes_atomic(&path, content.as_bytes())?;
        written.push(path);
    }

    tracing::info!(
        event = "ddl_written",
        dir = %ddl_dir.display(),
        files = written.len()
    );
    Ok(written)
}

/// Numbered phase scripts in execution order. Phases without content are omitted.
pub fn init_phases(
    schema: &Schema,
    sources: &DdlSources<'_>,
) -> WriterResult<Vec<(&'static str, String)>> {
    let database = format!(
        "CREATE DATABASE IF NOT EXISTS {name};\nUSE {name};\n",
        name = schema.name
    );
    let tables = join_scripts(schema.ordered_tables().map(|table| table.definition.clone()));
    let seed = match sources.seed_dir {
        Some(dir) => join_scripts(read_sql_dir(dir)?),
        None => String::new(),
    };
    let procedures = join_scripts(
        schema
            .procedures
            .iter()
            .map(|procedure| procedure.definition.clone()),
    );
    let patches = match sources.patch_dir {
        Some(dir) => join_scripts(read_sql_dir(dir)?),
        None => String::new(),
    };

    Ok([
        ("00_database.sql", database),
        ("01_tables.sql", tables),
        ("02_seed.sql", seed),
        ("03_procedures.sql", procedures),
        ("04_patches.sql", patches),
    ]
    .into_iter()
    .filter(|(_, content)| !content.is_empty())
    .collect())
}

fn join_scripts(scripts: impl IntoIterator<Item = String>) -> String {
    scripts
        .into_iter()
        .filter(|script| !script.trim().is_empty())
        .map(|mut script| {
            if !script.ends_with('\n') {
                script.push('\n');
            }
            script
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Contents of every `*.sql` file directly under `dir`, sorted by file name.
/// A missing directory yields nothing.
fn read_sql_dir(dir: &Path) -> WriterResult<Vec<String>> {
    if !dir.is_dir() {
        tracing::debug!(event = "script_dir_missing", dir = %dir.display());
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            paths.push(path);
        }
    }
    paths.sort();

    paths
        .iter()
        .map(|path| std::fs::read_to_string(path).map_err(WriterError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemaforge_core::{
        build_schema, CatalogSnapshot, ExtractOptions, RawColumn, RawForeignKey, RawParameter,
        RawRoutine,
    };

    fn column(table: &str, name: &str, key: &str) -> RawColumn {
        RawColumn {
            table_name: table.to_string(),
            column_name: name.to_string(),
            ordinal_position: 1,
            column_type: "int".to_string(),
            data_type: "int".to_string(),
            column_key: key.to_string(),
            is_nullable: "NO".to_string(),
            table_type: "BASE TABLE".to_string(),
            ..RawColumn::default()
        }
    }

    fn shop(with_procedure: bool) -> Schema {
        let mut catalog = CatalogSnapshot::new("shop");
        catalog.columns = vec![
            column("orders", "id", "PRI"),
            RawColumn {
                ordinal_position: 2,
                ..column("orders", "user_id", "MUL")
            },
            column("users", "id", "PRI"),
        ];
        catalog.foreign_keys = vec![RawForeignKey {
            constraint_name: "fk_orders_user".to_string(),
            table_name: "orders".to_string(),
            column_name: "user_id".to_string(),
            referenced_table_name: "users".to_string(),
            referenced_column_name: "id".to_string(),
            ordinal_position: 1,
        }];
        if with_procedure {
            catalog.routines = vec![RawRoutine {
                routine_name: "purge".to_string(),
                routine_definition: Some("BEGIN DELETE FROM orders; END".to_string()),
            }];
            catalog.parameters = vec![RawParameter {
                routine_name: "purge".to_string(),
                parameter_name: "days".to_string(),
                parameter_mode: Some("IN".to_string()),
                data_type: "int".to_string(),
                ordinal_position: 1,
            }];
        }
        build_schema(&catalog, &ExtractOptions::default())
    }

    #[test]
    fn writes_entity_files_and_phases() {
        let dir = tempfile::tempdir().expect("tempdir");
        let seed = dir.path().join("seed");
        std::fs::create_dir_all(&seed).expect("seed dir");
        std::fs::write(seed.join("b.sql"), "INSERT INTO orders VALUES (1, 1);").expect("seed b");
        std::fs::write(seed.join("a.sql"), "INSERT INTO users VALUES (1);\n").expect("seed a");
        std::fs::write(seed.join("notes.txt"), "ignored").expect("notes");

        let schema = shop(true);
        let ddl_dir = dir.path().join("sql");
        let sources = DdlSources {
            seed_dir: Some(&seed),
            patch_dir: None,
        };
        let written = write_ddl(&schema, &ddl_dir, &sources).expect("write ddl");

        let orders = std::fs::read_to_string(ddl_dir.join("tables/orders.sql")).expect("orders");
        assert_eq!(orders, schema.table("orders").expect("orders").definition);
        assert!(ddl_dir.join("procedures/purge.sql").is_file());

        let init = ddl_dir.join("init");
        let database = std::fs::read_to_string(init.join("00_database.sql")).expect("database");
        assert_eq!(database, "CREATE DATABASE IF NOT EXISTS shop;\nUSE shop;\n");

        let tables = std::fs::read_to_string(init.join("01_tables.sql")).expect("tables");
        let users_at = tables.find("CREATE TABLE IF NOT EXISTS users").expect("users");
        let orders_at = tables.find("CREATE TABLE IF NOT EXISTS orders").expect("orders");
        assert!(users_at < orders_at);

        let seed_script = std::fs::read_to_string(init.join("02_seed.sql")).expect("seed");
        assert_eq!(
            seed_script,
            "INSERT INTO users VALUES (1);\n\nINSERT INTO orders VALUES (1, 1);\n"
        );

        assert!(init.join("03_procedures.sql").is_file());
        assert!(!init.join("04_patches.sql").exists());
        assert_eq!(written.len(), 2 + 1 + 4);
    }

    #[test]
    fn empty_phases_are_skipped() {
        let schema = shop(false);
        let phases = init_phases(
            &schema,
            &DdlSources {
                seed_dir: Some(Path::new("/nonexistent/seed")),
                patch_dir: None,
            },
        )
        .expect("phases");
        let names: Vec<&str> = phases.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["00_database.sql", "01_tables.sql"]);
    }

    #[test]
    fn atomic_write_replaces_content_without_leftovers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/schema.json");
        write_json_atomic(&path, &serde_json::json!({ "a": 1 })).expect("first write");
        write_json_atomic(&path, &serde_json::json!({ "a": 2 })).expect("second write");

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
        assert_eq!(value["a"], 2);

        let leftovers: Vec<_> = std::fs::read_dir(path.parent().expect("parent"))
            .expect("read dir")
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn rejects_entity_names_that_escape_the_directory() {
        assert!(entity_file(Path::new("sql"), "../etc").is_err());
        assert!(entity_file(Path::new("sql"), "..").is_err());
        assert!(entity_file(Path::new("sql"), "orders").is_ok());
    }
}
