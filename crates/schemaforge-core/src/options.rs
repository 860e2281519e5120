use serde::{Deserialize, Serialize};

/// Default delimiter wrapped around procedure bodies.
pub const DEFAULT_PROCEDURE_DELIMITER: &str = "$$";

/// Options that control what a schema build keeps and emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Attach the verbatim catalog row to every column as `raw`.
    pub include_raw_column_metadata: bool,
    /// Attach `information_schema`-style table metadata to every table and view.
    pub include_raw_table_metadata: bool,
    /// Attach the verbatim routine row to every procedure.
    pub include_raw_procedure_metadata: bool,
    /// Ask the output writer for per-entity `.sql` files and init scripts.
    /// The engine always synthesizes definitions; only the writer reads this.
    pub emit_ddl_files: bool,
    /// Statement delimiter used while a procedure body is being created.
    pub procedure_delimiter: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            include_raw_column_metadata: false,
            include_raw_table_metadata: false,
            include_raw_procedure_metadata: false,
            emit_ddl_files: true,
            procedure_delimiter: DEFAULT_PROCEDURE_DELIMITER.to_string(),
        }
    }
}
