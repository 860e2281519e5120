//! Row normalization: raw catalog rows into canonical column and procedure
//! records with derived flags.

use std::collections::{BTreeMap, HashMap};

use crate::build::BuildContext;
use crate::catalog::{CatalogSnapshot, RawColumn, RawForeignKey, RawParameter, RawRoutine};
use crate::constraints::{ConstraintId, ForeignKeyDefinition, ForeignKeyReference};
use crate::schema::{Column, Parameter, Procedure, RoutineKind};
use crate::types::{FkAction, Generation, ParamMode};

const AUTO_INCREMENT: &str = "auto_increment";
const DEFAULT_GENERATED: &str = "DEFAULT_GENERATED";
const STORED_GENERATED: &str = "STORED GENERATED";
const VIRTUAL_GENERATED: &str = "VIRTUAL GENERATED";
const ON_UPDATE: &str = "on update";
const CURRENT_TIMESTAMP: &str = "CURRENT_TIMESTAMP";

const TEXT_TYPES: &[&str] = &[
    "char",
    "varchar",
    "tinytext",
    "text",
    "mediumtext",
    "longtext",
    "enum",
    "set",
];

/// Lookup key for the column owning a foreign key reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnKey {
    pub table: String,
    pub column: String,
}

impl ColumnKey {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

/// A normalized column together with the relation facts needed to group it.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedColumn {
    pub table: String,
    pub table_type: String,
    pub is_insertable_into: Option<String>,
    pub column: Column,
}

impl NormalizedColumn {
    pub fn is_view(&self) -> bool {
        self.table_type.to_ascii_uppercase().contains("VIEW")
    }
}

/// Normalize every row set of `catalog` into `ctx`.
pub fn normalize(ctx: &mut BuildContext<'_>, catalog: &CatalogSnapshot) {
    ctx.fk_definitions = foreign_key_definitions(ctx.schema_name, &catalog.foreign_keys);
    ctx.references = reference_lookup(ctx.schema_name, &catalog.foreign_keys);

    let pk_widths = primary_key_widths(&catalog.columns);
    let keep_raw = ctx.options.include_raw_column_metadata;

    ctx.columns = catalog
        .columns
        .iter()
        .map(|row| {
            let compound = pk_widths.get(row.table_name.as_str()).copied().unwrap_or(0) >= 2;
            let reference = ctx
                .references
                .get(&ColumnKey::new(&row.table_name, &row.column_name));
            NormalizedColumn {
                table: row.table_name.clone(),
                table_type: row.table_type.clone(),
                is_insertable_into: row.is_insertable_into.clone(),
                column: normalize_column(row, compound, reference, keep_raw),
            }
        })
        .collect();

    ctx.procedures = normalize_procedures(
        ctx.schema_name,
        &catalog.routines,
        &catalog.parameters,
        ctx.options.include_raw_procedure_metadata,
    );

    tracing::debug!(
        event = "rows_normalized",
        schema = %ctx.schema_name,
        columns = ctx.columns.len(),
        references = ctx.references.len(),
        procedures = ctx.procedures.len()
    );
}

/// Build the canonical column record for one catalog row.
pub fn normalize_column(
    row: &RawColumn,
    compound: bool,
    reference: Option<&ForeignKeyReference>,
    keep_raw: bool,
) -> Column {
    let extra = row.extra.as_deref().unwrap_or("");
    let generated = derive_generation(extra);

    let generation_expression = match generated {
        Generation::Never => None,
        Generation::Stored | Generation::Virtual => {
            Some(row.generation_expression.clone().unwrap_or_default())
        }
        Generation::ByDefault | Generation::Always => {
            Some(row.column_default.clone().unwrap_or_default())
        }
    };

    Column {
        name: row.column_name.clone(),
        ordinal_position: row.ordinal_position,
        sql_type: row.column_type.clone(),
        data_type: row.data_type.clone(),
        max_length: row.character_maximum_length,
        is_primary_key: row.column_key == "PRI",
        is_compound_key: row.column_key == "PRI" && compound,
        is_nullable: row.is_nullable.eq_ignore_ascii_case("YES"),
        is_auto_increment: extra.contains(AUTO_INCREMENT),
        generated,
        generation_expression,
        is_updatable: generated == Generation::Never,
        default_value: row.column_default.clone(),
        extra: residual_extra(extra),
        references: reference.cloned().into_iter().collect(),
        raw: keep_raw.then(|| row.clone()),
    }
}

/// Derive the generation mode from a catalog `EXTRA` value.
pub fn derive_generation(extra: &str) -> Generation {
    if extra.contains(STORED_GENERATED) {
        Generation::Stored
    } else if extra.contains(VIRTUAL_GENERATED) {
        Generation::Virtual
    } else if extra.contains(DEFAULT_GENERATED) {
        if extra.contains(ON_UPDATE) {
            Generation::Always
        } else {
            Generation::ByDefault
        }
    } else {
        Generation::Never
    }
}

/// `EXTRA` with the markers this engine interprets removed.
pub fn residual_extra(extra: &str) -> String {
    let mut rest = extra.to_string();
    for marker in [STORED_GENERATED, VIRTUAL_GENERATED, DEFAULT_GENERATED, AUTO_INCREMENT] {
        rest = rest.replace(marker, " ");
    }
    rest.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn is_text_type(data_type: &str) -> bool {
    let data_type = data_type.trim().to_ascii_lowercase();
    TEXT_TYPES.contains(&data_type.as_str())
}

/// Render a raw default as a SQL literal or expression.
pub fn render_default(raw: &str, data_type: &str) -> String {
    if raw == CURRENT_TIMESTAMP {
        raw.to_string()
    } else if raw.contains('(') {
        format!("({raw})")
    } else if is_text_type(data_type) {
        format!("'{}'", raw.replace('\'', "''"))
    } else {
        raw.to_string()
    }
}

/// Column-level reference lookup; the first row for a column wins.
pub fn reference_lookup(
    schema: &str,
    rows: &[RawForeignKey],
) -> HashMap<ColumnKey, ForeignKeyReference> {
    let mut lookup = HashMap::with_capacity(rows.len());
    for row in rows {
        lookup
            .entry(ColumnKey::new(&row.table_name, &row.column_name))
            .or_insert_with(|| ForeignKeyReference {
                schema_name: schema.to_string(),
                source_table: row.table_name.clone(),
                source_column: row.column_name.clone(),
                table_name: row.referenced_table_name.clone(),
                column_name: row.referenced_column_name.clone(),
                on_update: FkAction::Cascade,
                on_delete: FkAction::Restrict,
                name: row.constraint_name.clone(),
            });
    }
    lookup
}

/// Group member rows into constraints keyed by `schema/constraint`.
pub fn foreign_key_definitions(
    schema: &str,
    rows: &[RawForeignKey],
) -> BTreeMap<ConstraintId, ForeignKeyDefinition> {
    let mut ordered: Vec<&RawForeignKey> = rows.iter().collect();
    ordered.sort_by_key(|row| row.ordinal_position);

    let mut definitions: BTreeMap<ConstraintId, ForeignKeyDefinition> = BTreeMap::new();
    for row in ordered {
        let id = ConstraintId::new(schema, &row.constraint_name);
        let definition = definitions
            .entry(id.clone())
            .or_insert_with(|| ForeignKeyDefinition {
                id,
                table: row.table_name.clone(),
                columns: Vec::new(),
                referenced_table: row.referenced_table_name.clone(),
                referenced_columns: Vec::new(),
            });
        definition.columns.push(row.column_name.clone());
        definition
            .referenced_columns
            .push(row.referenced_column_name.clone());
    }
    definitions
}

fn primary_key_widths(rows: &[RawColumn]) -> HashMap<&str, usize> {
    let mut widths: HashMap<&str, usize> = HashMap::new();
    for row in rows.iter().filter(|row| row.column_key == "PRI") {
        *widths.entry(row.table_name.as_str()).or_insert(0) += 1;
    }
    widths
}

/// Procedures in catalog order with parameters sorted by ordinal position.
/// Definitions are left empty for the synthesizer.
pub fn normalize_procedures(
    schema: &str,
    routines: &[RawRoutine],
    parameters: &[RawParameter],
    keep_raw: bool,
) -> Vec<Procedure> {
    let mut by_routine: HashMap<&str, Vec<&RawParameter>> = HashMap::new();
    for param in parameters {
        by_routine
            .entry(param.routine_name.as_str())
            .or_default()
            .push(param);
    }

    routines
        .iter()
        .map(|routine| {
            let mut params: Vec<Parameter> = by_routine
                .get(routine.routine_name.as_str())
                .map(|rows| {
                    rows.iter()
                        .map(|row| Parameter {
                            name: row.parameter_name.clone(),
                            mode: ParamMode::from_catalog(row.parameter_mode.as_deref()),
                            sql_type: row.data_type.clone(),
                            ordinal_position: row.ordinal_position,
                        })
                        .collect()
                })
                .unwrap_or_default();
            params.sort_by_key(|param| param.ordinal_position);

            Procedure {
                name: routine.routine_name.clone(),
                schema_name: schema.to_string(),
                kind: RoutineKind::Procedure,
                body: routine.routine_definition.clone().unwrap_or_default(),
                params,
                definition: String::new(),
                raw: keep_raw.then(|| routine.clone()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(extra: Option<&str>) -> RawColumn {
        RawColumn {
            table_name: "orders".to_string(),
            column_name: "created_at".to_string(),
            ordinal_position: 3,
            column_type: "timestamp".to_string(),
            data_type: "timestamp".to_string(),
            character_maximum_length: None,
            column_key: String::new(),
            is_nullable: "NO".to_string(),
            extra: extra.map(str::to_string),
            column_default: Some("CURRENT_TIMESTAMP".to_string()),
            generation_expression: None,
            table_type: "BASE TABLE".to_string(),
            is_insertable_into: None,
        }
    }

    #[test]
    fn derives_generation_from_extra_markers() {
        assert_eq!(derive_generation(""), Generation::Never);
        assert_eq!(derive_generation("auto_increment"), Generation::Never);
        assert_eq!(derive_generation("DEFAULT_GENERATED"), Generation::ByDefault);
        assert_eq!(
            derive_generation("DEFAULT_GENERATED on update CURRENT_TIMESTAMP"),
            Generation::Always
        );
        assert_eq!(derive_generation("STORED GENERATED"), Generation::Stored);
        assert_eq!(derive_generation("VIRTUAL GENERATED"), Generation::Virtual);
    }

    #[test]
    fn residual_extra_keeps_unknown_text() {
        assert_eq!(
            residual_extra("DEFAULT_GENERATED on update CURRENT_TIMESTAMP"),
            "on update CURRENT_TIMESTAMP"
        );
        assert_eq!(residual_extra("auto_increment"), "");
        assert_eq!(residual_extra("STORED GENERATED"), "");
    }

    #[test]
    fn renders_default_literals() {
        assert_eq!(render_default("CURRENT_TIMESTAMP", "timestamp"), "CURRENT_TIMESTAMP");
        assert_eq!(render_default("uuid()", "char"), "(uuid())");
        assert_eq!(render_default("it's", "varchar"), "'it''s'");
        assert_eq!(render_default("", "text"), "''");
        assert_eq!(render_default("0", "int"), "0");
        assert_eq!(render_default("1.50", "decimal"), "1.50");
    }

    #[test]
    fn missing_extra_is_treated_as_empty() {
        let column = normalize_column(&raw(None), false, None, false);
        assert_eq!(column.generated, Generation::Never);
        assert!(column.is_updatable);
        assert!(column.generation_expression.is_none());
        assert_eq!(column.extra, "");
        assert!(column.max_length.is_none());
    }

    #[test]
    fn generated_columns_are_not_updatable() {
        let column = normalize_column(
            &raw(Some("DEFAULT_GENERATED on update CURRENT_TIMESTAMP")),
            false,
            None,
            true,
        );
        assert_eq!(column.generated, Generation::Always);
        assert!(!column.is_updatable);
        assert_eq!(column.generation_expression.as_deref(), Some("CURRENT_TIMESTAMP"));
        assert_eq!(column.extra, "on update CURRENT_TIMESTAMP");
        assert!(column.raw.is_some());
    }

    #[test]
    fn reference_lookup_uses_structured_keys() {
        let rows = vec![
            RawForeignKey {
                constraint_name: "fk_one".to_string(),
                table_name: "a_b".to_string(),
                column_name: "x".to_string(),
                referenced_table_name: "p".to_string(),
                referenced_column_name: "id".to_string(),
                ordinal_position: 1,
            },
            RawForeignKey {
                constraint_name: "fk_two".to_string(),
                table_name: "a".to_string(),
                column_name: "b_x".to_string(),
                referenced_table_name: "q".to_string(),
                referenced_column_name: "id".to_string(),
                ordinal_position: 1,
            },
        ];

        let lookup = reference_lookup("shop", &rows);
        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup[&ColumnKey::new("a_b", "x")].table_name, "p");
        assert_eq!(lookup[&ColumnKey::new("a", "b_x")].table_name, "q");
        assert_eq!(lookup[&ColumnKey::new("a", "b_x")].on_update, FkAction::Cascade);
        assert_eq!(lookup[&ColumnKey::new("a", "b_x")].on_delete, FkAction::Restrict);
    }

    #[test]
    fn multi_column_constraints_keep_member_order() {
        let row = |column: &str, target: &str, position: u32| RawForeignKey {
            constraint_name: "fk_line_order".to_string(),
            table_name: "line".to_string(),
            column_name: column.to_string(),
            referenced_table_name: "orders".to_string(),
            referenced_column_name: target.to_string(),
            ordinal_position: position,
        };
        let rows = vec![row("order_no", "no", 2), row("order_year", "year", 1)];

        let definitions = foreign_key_definitions("shop", &rows);
        let definition = &definitions[&ConstraintId::new("shop", "fk_line_order")];
        assert_eq!(definition.columns, vec!["order_year", "order_no"]);
        assert_eq!(definition.referenced_columns, vec!["year", "no"]);
    }

    #[test]
    fn procedures_sort_parameters_by_position() {
        let routines = vec![RawRoutine {
            routine_name: "archive".to_string(),
            routine_definition: Some("BEGIN END".to_string()),
        }];
        let params = vec![
            RawParameter {
                routine_name: "archive".to_string(),
                parameter_name: "moved".to_string(),
                parameter_mode: Some("OUT".to_string()),
                data_type: "int".to_string(),
                ordinal_position: 2,
            },
            RawParameter {
                routine_name: "archive".to_string(),
                parameter_name: "cutoff".to_string(),
                parameter_mode: Some("IN".to_string()),
                data_type: "date".to_string(),
                ordinal_position: 1,
            },
        ];

        let procedures = normalize_procedures("shop", &routines, &params, false);
        let names: Vec<&str> = procedures[0].params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["cutoff", "moved"]);
        assert_eq!(procedures[0].params[1].mode, ParamMode::Out);
        assert!(procedures[0].raw.is_none());
    }
}
