//! DDL synthesis for tables, views and procedures.

use std::collections::{BTreeMap, BTreeSet};

use crate::align::align_columns;
use crate::catalog::RawPartition;
use crate::constraints::{ConstraintId, ForeignKeyDefinition, Index, IndexClass};
use crate::normalize::{is_text_type, render_default};
use crate::schema::{Column, Procedure, Table};
use crate::types::Generation;

/// Column definition fragments, tab separated: name, SQL type, clauses.
pub fn column_fragments(column: &Column, inline_auto_increment: bool) -> String {
    let mut clauses: Vec<String> = Vec::new();

    if inline_auto_increment {
        clauses.push("auto_increment".to_string());
    }

    if column.generated.is_computed() {
        let kind = if column.generated == Generation::Virtual {
            "VIRTUAL"
        } else {
            "STORED"
        };
        clauses.push(format!(
            "AS ({}) {kind}",
            column.generation_expression.as_deref().unwrap_or_default()
        ));
    } else {
        if let Some(default) = &column.default_value {
            if !default.is_empty() || is_text_type(&column.data_type) {
                clauses.push(format!(
                    "DEFAULT {}",
                    render_default(default, &column.data_type)
                ));
            }
        }
        clauses.push(if column.is_nullable { "NULL" } else { "NOT NULL" }.to_string());
    }

    if column.is_primary_key && !column.is_compound_key {
        clauses.push("PRIMARY KEY".to_string());
    }
    if !column.extra.is_empty() {
        clauses.push(column.extra.clone());
    }

    format!("{}\t{}\t{}", column.name, column.sql_type, clauses.join(" "))
}

/// Auto-increment columns that must wait for a backing index before the
/// attribute can be applied. Single-column primary keys are always inlined.
fn deferred_auto_columns(table: &Table) -> BTreeSet<&str> {
    let mut deferred = BTreeSet::new();
    for index in table.indexes.iter().filter(|index| index.is_auto_number) {
        for name in &index.columns {
            if let Some(column) = table.column(name) {
                if column.is_auto_increment && !is_inline_primary_key(column) {
                    deferred.insert(column.name.as_str());
                }
            }
        }
    }
    deferred
}

fn is_inline_primary_key(column: &Column) -> bool {
    column.is_primary_key && !column.is_compound_key
}

/// `CREATE TABLE IF NOT EXISTS` with aligned column lines and partitioning.
pub fn create_table_statement(table: &Table) -> String {
    let deferred = deferred_auto_columns(table);
    let lines: Vec<String> = table
        .columns
        .iter()
        .map(|column| {
            let inline = column.is_auto_increment && !deferred.contains(column.name.as_str());
            column_fragments(column, inline)
        })
        .collect();

    let body = align_columns(&lines)
        .into_iter()
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join(",\n");

    let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (\n{body}\n)", table.name);
    if let Some(partition) = &table.partition {
        sql.push(' ');
        sql.push_str(partition);
    }
    sql.push(';');
    sql
}

/// Full table DDL: create statement followed by key, constraint and index
/// statements in index catalog order, then foreign keys no index emitted.
pub fn table_definition(
    table: &Table,
    fk_definitions: &BTreeMap<ConstraintId, ForeignKeyDefinition>,
) -> String {
    let mut statements = vec![create_table_statement(table)];
    let deferred = deferred_auto_columns(table);
    let mut reapplied: BTreeSet<&str> = BTreeSet::new();
    let mut emitted_fks: BTreeSet<&ConstraintId> = BTreeSet::new();

    for index in &table.indexes {
        match index.class() {
            IndexClass::Primary => {
                if index.columns.len() > 1 {
                    statements.push(format!(
                        "ALTER TABLE {} ADD PRIMARY KEY ({});",
                        table.name,
                        index.column_list()
                    ));
                }
            }
            IndexClass::Unique => statements.push(format!(
                "ALTER TABLE {} ADD CONSTRAINT {} UNIQUE ({});",
                table.name,
                index.name,
                index.column_list()
            )),
            IndexClass::ForeignKey => {
                let id = ConstraintId::new(&table.schema_name, &index.name);
                match fk_definitions.get_key_value(&id) {
                    Some((id, definition)) => {
                        statements.push(foreign_key_statement(table, &index.name, definition));
                        emitted_fks.insert(id);
                    }
                    None => tracing::debug!(
                        event = "fk_definition_missing",
                        table = %table.name,
                        index = %index.name
                    ),
                }
            }
            IndexClass::Plain => statements.push(format!(
                "CREATE INDEX {} ON {} ({});",
                index.name,
                table.name,
                index.column_list()
            )),
        }

        if index.is_auto_number {
            reapply_auto_increment(table, index, &deferred, &mut reapplied, &mut statements);
        }
    }

    for (id, definition) in fk_definitions {
        if definition.table == table.name
            && id.schema == table.schema_name
            && !emitted_fks.contains(id)
        {
            statements.push(foreign_key_statement(table, &id.name, definition));
        }
    }

    let mut sql = statements.join("\n");
    sql.push('\n');
    sql
}

fn foreign_key_statement(table: &Table, name: &str, definition: &ForeignKeyDefinition) -> String {
    format!(
        "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({});",
        table.name,
        name,
        definition.columns.join(","),
        definition.referenced_table,
        definition.referenced_columns.join(",")
    )
}

fn reapply_auto_increment<'t>(
    table: &'t Table,
    index: &'t Index,
    deferred: &BTreeSet<&str>,
    reapplied: &mut BTreeSet<&'t str>,
    statements: &mut Vec<String>,
) {
    for name in &index.columns {
        if !deferred.contains(name.as_str()) || !reapplied.insert(name.as_str()) {
            continue;
        }
        if let Some(column) = table.column(name) {
            statements.push(format!(
                "ALTER TABLE {} MODIFY {} {} auto_increment;",
                table.name, column.name, column.sql_type
            ));
            statements.push(format!("ALTER TABLE {} AUTO_INCREMENT = 1;", table.name));
        }
    }
}

/// `DROP` + delimiter-wrapped `CREATE PROCEDURE`.
pub fn procedure_definition(procedure: &Procedure, delimiter: &str) -> String {
    let params = procedure
        .params
        .iter()
        .map(|param| format!("{} {} {}", param.mode.as_sql(), param.name, param.sql_type))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "DROP PROCEDURE IF EXISTS {name};\nDELIMITER {delimiter}\nCREATE PROCEDURE {name}({params})\n{body}{delimiter}\nDELIMITER ;\n",
        name = procedure.name,
        body = procedure.body.trim_end(),
    )
}

/// Render `PARTITION BY ...` from a table's partition rows.
pub fn partition_clause(rows: &[&RawPartition]) -> Option<String> {
    let mut rows: Vec<&RawPartition> = rows.to_vec();
    rows.sort_by_key(|row| row.ordinal_position);

    let first = rows.first()?;
    let method = first.method.trim().to_ascii_uppercase();
    if method.is_empty() {
        return None;
    }
    let expression = first.expression.as_deref().unwrap_or("").trim();
    let head = format!("PARTITION BY {method} ({expression})");

    let values = if method.starts_with("RANGE") {
        Some("VALUES LESS THAN")
    } else if method.starts_with("LIST") {
        Some("VALUES IN")
    } else {
        None
    };

    match values {
        Some(values) => {
            let partitions = rows
                .iter()
                .map(|row| {
                    format!(
                        "PARTITION {} {values} ({})",
                        row.partition_name,
                        row.description.as_deref().unwrap_or("MAXVALUE")
                    )
                })
                .collect::<Vec<_>>()
                .join(", ");
            Some(format!("{head} ({partitions})"))
        }
        None => Some(format!("{head} PARTITIONS {}", rows.len())),
    }
}
