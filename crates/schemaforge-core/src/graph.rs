//! Relation grouping, FK fan-in and the FK dependency report.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::build::BuildContext;
use crate::catalog::{CatalogSnapshot, RawPartition};
use crate::constraints::Index;
use crate::ddl::partition_clause;
use crate::schema::{RawTableMeta, Schema, Table, TableKind};

/// Fan-in tally for a referenced table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanIn {
    /// Number of referencing columns.
    pub referenced_count: usize,
    /// Source table per referencing column, in encounter order.
    pub children: Vec<String>,
}

/// Tables and views grouped from normalized columns, plus FK adjacency.
#[derive(Debug, Clone, Default)]
pub struct SchemaGraph {
    /// Tables and views in catalog encounter order.
    pub relations: Vec<Table>,
    positions: HashMap<String, usize>,
    /// Tables owning at least one column with a foreign key reference.
    pub has_parent: BTreeSet<String>,
    pub fan_in: BTreeMap<String, FanIn>,
}

impl SchemaGraph {
    pub fn relation(&self, name: &str) -> Option<&Table> {
        self.positions.get(name).map(|&idx| &self.relations[idx])
    }

    /// Base table names in encounter order.
    pub fn table_names(&self) -> Vec<&str> {
        self.relations
            .iter()
            .filter(|relation| relation.kind == TableKind::Table)
            .map(|relation| relation.name.as_str())
            .collect()
    }

    pub fn is_table(&self, name: &str) -> bool {
        self.relation(name)
            .is_some_and(|relation| relation.kind == TableKind::Table)
    }

    /// Split into (tables, views), both in encounter order.
    pub fn into_parts(self) -> (Vec<Table>, Vec<Table>) {
        self.relations
            .into_iter()
            .partition(|relation| relation.kind == TableKind::Table)
    }
}

/// Group `ctx.columns` into relations and record FK fan-in.
pub fn build_graph(ctx: &mut BuildContext<'_>, catalog: &CatalogSnapshot) {
    let columns = std::mem::take(&mut ctx.columns);
    let mut graph = SchemaGraph::default();

    for normalized in columns {
        let idx = match graph.positions.get(&normalized.table) {
            Some(&idx) => idx,
            None => {
                let kind = if normalized.is_view() {
                    TableKind::View
                } else {
                    TableKind::Table
                };
                graph.relations.push(Table {
                    name: normalized.table.clone(),
                    schema_name: ctx.schema_name.to_string(),
                    kind,
                    columns: Vec::new(),
                    indexes: Vec::new(),
                    partition: None,
                    definition: String::new(),
                    raw: None,
                });
                let idx = graph.relations.len() - 1;
                graph.positions.insert(normalized.table.clone(), idx);
                idx
            }
        };

        if ctx.options.include_raw_table_metadata {
            graph.relations[idx].raw = Some(RawTableMeta {
                is_insertable_into: normalized
                    .is_insertable_into
                    .clone()
                    .unwrap_or_else(|| "YES".to_string()),
                table_type: normalized.table_type.clone(),
                table_catalog: ctx.schema_name.to_string(),
                table_name: normalized.table.clone(),
                table_schema: ctx.schema_name.to_string(),
            });
        }

        if !normalized.column.references.is_empty() {
            graph.has_parent.insert(normalized.table.clone());
        }

        graph.relations[idx].columns.push(normalized.column);
    }

    graph.fan_in = fan_in_tally(&graph.relations);

    for raw in &catalog.indexes {
        if let Some(&idx) = graph.positions.get(&raw.table_name) {
            graph.relations[idx].indexes.push(Index::from(raw));
        }
    }

    let mut partitions: BTreeMap<&str, Vec<&RawPartition>> = BTreeMap::new();
    for row in &catalog.partitions {
        partitions.entry(row.table_name.as_str()).or_default().push(row);
    }
    for (table, rows) in partitions {
        if let Some(&idx) = graph.positions.get(table) {
            graph.relations[idx].partition = partition_clause(&rows);
        }
    }

    tracing::debug!(
        event = "graph_built",
        schema = %ctx.schema_name,
        relations = graph.relations.len(),
        dependents = graph.has_parent.len(),
        referenced = graph.fan_in.len()
    );

    ctx.graph = graph;
}

/// Fan-in per referenced table: one tally entry per referencing column,
/// children in relation then column order.
pub fn fan_in_tally<'a>(
    relations: impl IntoIterator<Item = &'a Table>,
) -> BTreeMap<String, FanIn> {
    let mut fan_in: BTreeMap<String, FanIn> = BTreeMap::new();
    for relation in relations {
        for reference in relation.columns.iter().flat_map(|column| &column.references) {
            let entry = fan_in.entry(reference.table_name.clone()).or_default();
            entry.referenced_count += 1;
            entry.children.push(relation.name.clone());
        }
    }
    fan_in
}

/// Summary of FK graph structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FkGraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// FK dependency report for a built schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FkGraphReport {
    pub summary: FkGraphSummary,
    /// Fan-in of every referenced base table.
    pub fan_in: BTreeMap<String, FanIn>,
    /// Tables left unresolved by a strict topological sort, when any.
    pub cycle: Option<Vec<String>>,
}

impl FkGraphReport {
    pub fn has_cycle(&self) -> bool {
        self.cycle.is_some()
    }
}

/// Build a deterministic FK dependency report. Self references count as cycles.
pub fn build_fk_graph_report(schema: &Schema) -> FkGraphReport {
    let graph = build_adjacency(schema);
    let nodes = graph.len();
    let edges = graph.values().map(|targets| targets.len()).sum();

    FkGraphReport {
        summary: FkGraphSummary { nodes, edges },
        fan_in: fan_in_tally(&schema.tables),
        cycle: unresolved_nodes(&graph),
    }
}

fn build_adjacency(schema: &Schema) -> BTreeMap<String, BTreeSet<String>> {
    let mut graph: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let known: BTreeSet<&str> = schema.tables.iter().map(|t| t.name.as_str()).collect();

    for table in &schema.tables {
        graph.entry(table.name.clone()).or_default();
        for parent in table.dependencies() {
            if known.contains(parent) {
                graph
                    .entry(parent.to_string())
                    .or_default()
                    .insert(table.name.clone());
            }
        }
    }

    graph
}

fn unresolved_nodes(graph: &BTreeMap<String, BTreeSet<String>>) -> Option<Vec<String>> {
    let mut indegree: BTreeMap<&str, usize> = graph.keys().map(|node| (node.as_str(), 0)).collect();
    for targets in graph.values() {
        for target in targets {
            *indegree.entry(target.as_str()).or_insert(0) += 1;
        }
    }

    let mut ready: BTreeSet<&str> = indegree
        .iter()
        .filter_map(|(node, count)| (*count == 0).then_some(*node))
        .collect();
    let mut resolved = 0;

    while let Some(node) = ready.pop_first() {
        resolved += 1;
        if let Some(targets) = graph.get(node) {
            for target in targets {
                if let Some(count) = indegree.get_mut(target.as_str()) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.insert(target.as_str());
                    }
                }
            }
        }
    }

    if resolved == graph.len() {
        None
    } else {
        Some(
            indegree
                .into_iter()
                .filter_map(|(node, count)| (count > 0).then(|| node.to_string()))
                .collect(),
        )
    }
}
