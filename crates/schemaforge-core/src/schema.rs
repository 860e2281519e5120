use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::catalog::{RawColumn, RawRoutine};
use crate::constraints::{ForeignKeyReference, Index};
use crate::types::{Generation, ParamMode};

/// Output root: schema name to schema snapshot.
pub type SchemaDocument = BTreeMap<String, Schema>;

/// One extracted schema with its synthesized DDL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub name: String,
    pub tables: Vec<Table>,
    pub views: Vec<Table>,
    /// Table names in creation order; parents precede children.
    pub table_order: Vec<String>,
    pub procedures: Vec<Procedure>,
}

impl Schema {
    /// Empty schema named `name`.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
            views: Vec::new(),
            table_order: Vec::new(),
            procedures: Vec::new(),
        }
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|table| table.name == name)
    }

    pub fn procedure(&self, name: &str) -> Option<&Procedure> {
        self.procedures.iter().find(|procedure| procedure.name == name)
    }

    /// Tables in `table_order`; names without a matching table are skipped.
    pub fn ordered_tables(&self) -> impl Iterator<Item = &Table> {
        self.table_order.iter().filter_map(|name| self.table(name))
    }

    /// Wrap into the keyed output document.
    pub fn into_document(self) -> SchemaDocument {
        let mut document = SchemaDocument::new();
        document.insert(self.name.clone(), self);
        document
    }
}

/// A table or view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub name: String,
    pub schema_name: String,
    pub kind: TableKind,
    pub columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<Index>,
    /// Rendered `PARTITION BY ...` clause.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    /// Full DDL text: `CREATE TABLE` followed by constraint and index statements.
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<RawTableMeta>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Referenced tables in column order, without duplicates.
    pub fn dependencies(&self) -> Vec<&str> {
        let mut targets: Vec<&str> = Vec::new();
        for reference in self.columns.iter().flat_map(|column| &column.references) {
            if !targets.contains(&reference.table_name.as_str()) {
                targets.push(&reference.table_name);
            }
        }
        targets
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Table,
    View,
}

/// `information_schema.TABLES`-style metadata kept when requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RawTableMeta {
    pub is_insertable_into: String,
    pub table_type: String,
    pub table_catalog: String,
    pub table_name: String,
    pub table_schema: String,
}

/// Normalized column metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    pub ordinal_position: u32,
    /// Full SQL type as declared (`varchar(255)`).
    pub sql_type: String,
    /// Semantic type (`varchar`).
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i64>,
    pub is_primary_key: bool,
    /// True iff this column is one of two or more primary key columns.
    pub is_compound_key: bool,
    pub is_nullable: bool,
    pub is_auto_increment: bool,
    pub generated: Generation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_expression: Option<String>,
    pub is_updatable: bool,
    /// Raw catalog default; `None` when the column has no default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Extra catalog text left after known markers are removed.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub extra: String,
    pub references: Vec<ForeignKeyReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<RawColumn>,
}

/// A stored procedure and its synthesized DDL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Procedure {
    pub name: String,
    pub schema_name: String,
    pub kind: RoutineKind,
    pub body: String,
    pub params: Vec<Parameter>,
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<RawRoutine>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoutineKind {
    Procedure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    pub mode: ParamMode,
    pub sql_type: String,
    pub ordinal_position: u32,
}
