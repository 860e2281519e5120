//! Raw catalog rows handed to the engine by a catalog-access adapter.
//!
//! The shapes mirror MySQL's `information_schema` after light cleanup by the
//! adapter (index members grouped, flags resolved). Every row set is scoped to
//! a single schema.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Point-in-time snapshot of every catalog row set for one schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CatalogSnapshot {
    /// Schema (database) name all rows belong to.
    pub schema: String,
    /// One row per (table, column), ordered by table then ordinal position.
    #[serde(default)]
    pub columns: Vec<RawColumn>,
    /// One row per foreign key member column.
    #[serde(default)]
    pub foreign_keys: Vec<RawForeignKey>,
    /// One row per index, members already grouped in index order.
    #[serde(default)]
    pub indexes: Vec<RawIndex>,
    #[serde(default)]
    pub partitions: Vec<RawPartition>,
    #[serde(default)]
    pub routines: Vec<RawRoutine>,
    #[serde(default)]
    pub parameters: Vec<RawParameter>,
}

/// `COLUMNS` row joined with the owning relation's table type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RawColumn {
    pub table_name: String,
    pub column_name: String,
    pub ordinal_position: u32,
    /// Full SQL type, e.g. `varchar(255)` or `int unsigned`.
    pub column_type: String,
    /// Semantic type, e.g. `varchar`.
    pub data_type: String,
    #[serde(default)]
    pub character_maximum_length: Option<i64>,
    /// `PRI`, `UNI`, `MUL` or empty.
    #[serde(default)]
    pub column_key: String,
    /// `YES` or `NO`.
    pub is_nullable: String,
    #[serde(default)]
    pub extra: Option<String>,
    #[serde(default)]
    pub column_default: Option<String>,
    #[serde(default)]
    pub generation_expression: Option<String>,
    /// `BASE TABLE`, `VIEW` or `SYSTEM VIEW`.
    #[serde(default)]
    pub table_type: String,
    /// `YES`/`NO` for views; `None` for base tables, which are always
    /// insertable. MySQL has no `IS_INSERTABLE_INTO`, so introspection fills
    /// this from `VIEWS.IS_UPDATABLE` (a MySQL view accepts inserts only
    /// when it is updatable).
    #[serde(default)]
    pub is_insertable_into: Option<String>,
}

/// One member column of a foreign key constraint (`KEY_COLUMN_USAGE`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RawForeignKey {
    pub constraint_name: String,
    pub table_name: String,
    pub column_name: String,
    pub referenced_table_name: String,
    pub referenced_column_name: String,
    #[serde(default)]
    pub ordinal_position: u32,
}

/// An index with its member columns in index order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RawIndex {
    pub table_name: String,
    pub index_name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub is_unique: bool,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub is_foreign_key: bool,
    #[serde(default)]
    pub is_auto_number: bool,
}

/// One partition of a partitioned table (`PARTITIONS`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RawPartition {
    pub table_name: String,
    pub partition_name: String,
    /// `RANGE`, `LIST`, `HASH`, `KEY`, `LINEAR HASH`, `RANGE COLUMNS`, ...
    pub method: String,
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ordinal_position: u32,
}

/// A stored procedure (`ROUTINES`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RawRoutine {
    pub routine_name: String,
    #[serde(default)]
    pub routine_definition: Option<String>,
}

/// One procedure parameter (`PARAMETERS`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RawParameter {
    pub routine_name: String,
    pub parameter_name: String,
    /// `IN`, `OUT`, `INOUT`; missing means `IN`.
    #[serde(default)]
    pub parameter_mode: Option<String>,
    /// Full SQL type (`DTD_IDENTIFIER`).
    pub data_type: String,
    pub ordinal_position: u32,
}

impl CatalogSnapshot {
    /// Empty snapshot for `schema`.
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            ..Self::default()
        }
    }
}
