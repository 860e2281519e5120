use std::collections::{BTreeSet, HashMap};

use schemaforge_core::{
    RawColumn, RawForeignKey, RawIndex, RawParameter, RawPartition, RawRoutine,
};

use crate::options::IntrospectOptions;

use super::queries::{
    ColumnRow, ForeignKeyRow, ParameterRow, PartitionRow, RoutineRow, StatisticsRow,
};

const PRIMARY_INDEX: &str = "PRIMARY";
const VIEW_TABLE_TYPE: &str = "VIEW";

fn position(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

pub fn map_columns(raw: Vec<ColumnRow>, opts: &IntrospectOptions) -> Vec<RawColumn> {
    raw.into_iter()
        .filter(|row| opts.table_enabled(&row.table_name))
        .filter(|row| opts.include_views || row.table_type != VIEW_TABLE_TYPE)
        .map(|row| RawColumn {
            table_name: row.table_name,
            column_name: row.column_name,
            ordinal_position: position(row.ordinal_position),
            column_type: row.column_type,
            data_type: row.data_type,
            character_maximum_length: row.character_maximum_length,
            column_key: row.column_key.unwrap_or_default(),
            is_nullable: row.is_nullable,
            extra: row.extra,
            column_default: row.column_default,
            generation_expression: row.generation_expression,
            table_type: row.table_type,
            is_insertable_into: row.is_insertable_into,
        })
        .collect()
}

pub fn map_foreign_keys(raw: Vec<ForeignKeyRow>, opts: &IntrospectOptions) -> Vec<RawForeignKey> {
    raw.into_iter()
        .filter(|row| opts.table_enabled(&row.table_name))
        .map(|row| RawForeignKey {
            constraint_name: row.constraint_name,
            table_name: row.table_name,
            column_name: row.column_name,
            referenced_table_name: row.referenced_table_name,
            referenced_column_name: row.referenced_column_name,
            ordinal_position: position(row.ordinal_position),
        })
        .collect()
}

/// Group per-column statistics rows into one [`RawIndex`] per table index.
///
/// Indexes keep the order of their first row; members are ordered by their
/// position in the index. Functional key parts are skipped.
pub fn map_indexes(
    raw: Vec<StatisticsRow>,
    columns: &[RawColumn],
    foreign_keys: &[RawForeignKey],
    opts: &IntrospectOptions,
) -> Vec<RawIndex> {
    let fk_names: BTreeSet<(&str, &str)> = foreign_keys
        .iter()
        .map(|fk| (fk.table_name.as_str(), fk.constraint_name.as_str()))
        .collect();
    let auto_columns: BTreeSet<(&str, &str)> = columns
        .iter()
        .filter(|column| {
            column
                .extra
                .as_deref()
                .is_some_and(|extra| extra.to_ascii_lowercase().contains("auto_increment"))
        })
        .map(|column| (column.table_name.as_str(), column.column_name.as_str()))
        .collect();

    let mut grouped: Vec<(RawIndex, Vec<(u64, String)>)> = Vec::new();
    let mut slots: HashMap<(String, String), usize> = HashMap::new();

    for row in raw {
        if !opts.table_enabled(&row.table_name) {
            continue;
        }
        let key = (row.table_name.clone(), row.index_name.clone());
        let slot = *slots.entry(key).or_insert_with(|| {
            grouped.push((
                RawIndex {
                    is_unique: row.non_unique == 0,
                    is_primary: row.index_name == PRIMARY_INDEX,
                    table_name: row.table_name.clone(),
                    index_name: row.index_name.clone(),
                    ..RawIndex::default()
                },
                Vec::new(),
            ));
            grouped.len() - 1
        });
        if let Some(column) = row.column_name {
            grouped[slot].1.push((row.seq_in_index, column));
        }
    }

    grouped
        .into_iter()
        .filter(|(_, members)| !members.is_empty())
        .map(|(mut index, mut members)| {
            members.sort_by_key(|(seq, _)| *seq);
            index.columns = members.into_iter().map(|(_, column)| column).collect();
            index.is_foreign_key =
                fk_names.contains(&(index.table_name.as_str(), index.index_name.as_str()));
            index.is_auto_number = index
                .columns
                .iter()
                .any(|column| auto_columns.contains(&(index.table_name.as_str(), column.as_str())));
            index
        })
        .collect()
}

pub fn map_partitions(raw: Vec<PartitionRow>, opts: &IntrospectOptions) -> Vec<RawPartition> {
    raw.into_iter()
        .filter(|row| opts.table_enabled(&row.table_name))
        .map(|row| RawPartition {
            table_name: row.table_name,
            partition_name: row.partition_name,
            method: row.method.unwrap_or_default(),
            expression: row.expression,
            description: row.description,
            ordinal_position: position(row.ordinal_position),
        })
        .collect()
}

pub fn map_routines(raw: Vec<RoutineRow>) -> Vec<RawRoutine> {
    raw.into_iter()
        .map(|row| RawRoutine {
            routine_name: row.routine_name,
            routine_definition: row.routine_definition,
        })
        .collect()
}

pub fn map_parameters(raw: Vec<ParameterRow>) -> Vec<RawParameter> {
    raw.into_iter()
        .map(|row| RawParameter {
            routine_name: row.routine_name,
            parameter_name: row.parameter_name.unwrap_or_default(),
            parameter_mode: row.parameter_mode,
            data_type: row.data_type.unwrap_or_default(),
            ordinal_position: position(row.ordinal_position),
        })
        .collect()
}
