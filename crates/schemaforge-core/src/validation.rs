use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;

use crate::error::{Error, Result};
use crate::schema::Schema;

/// Catalog inconsistency carried through into the model.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaIssue {
    #[error("{table}.{column} references missing table {target}")]
    DanglingReference {
        table: String,
        column: String,
        target: String,
    },
    #[error("duplicate column {table}.{column}")]
    DuplicateColumn { table: String, column: String },
    #[error("index {table}.{index} is foreign-key backed but no constraint matches it")]
    UnresolvedForeignKeyIndex { table: String, index: String },
}

/// Report catalog inconsistencies. The schema is never modified or rejected.
pub fn validate_schema(schema: &Schema) -> Vec<SchemaIssue> {
    let tables: BTreeSet<&str> = schema.tables.iter().map(|t| t.name.as_str()).collect();
    let mut issues = Vec::new();

    for table in &schema.tables {
        let mut seen = BTreeSet::new();
        for column in &table.columns {
            if !seen.insert(column.name.as_str()) {
                issues.push(SchemaIssue::DuplicateColumn {
                    table: table.name.clone(),
                    column: column.name.clone(),
                });
            }
            for reference in &column.references {
                if !tables.contains(reference.table_name.as_str()) {
                    issues.push(SchemaIssue::DanglingReference {
                        table: table.name.clone(),
                        column: column.name.clone(),
                        target: reference.table_name.clone(),
                    });
                }
            }
        }

        let constraint_names: BTreeSet<&str> = table
            .columns
            .iter()
            .flat_map(|column| &column.references)
            .map(|reference| reference.name.as_str())
            .collect();
        for index in table.indexes.iter().filter(|index| index.is_foreign_key) {
            if !constraint_names.contains(index.name.as_str()) {
                issues.push(SchemaIssue::UnresolvedForeignKeyIndex {
                    table: table.name.clone(),
                    index: index.name.clone(),
                });
            }
        }
    }

    issues
}

/// Fail on the first issue found by [`validate_schema`].
pub fn ensure_consistent(schema: &Schema) -> Result<()> {
    match validate_schema(schema).into_iter().next() {
        Some(issue) => Err(Error::InvalidSchema(issue.to_string())),
        None => Ok(()),
    }
}
