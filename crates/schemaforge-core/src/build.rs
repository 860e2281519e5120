use std::collections::{BTreeMap, HashMap};

use crate::catalog::CatalogSnapshot;
use crate::constraints::{ConstraintId, ForeignKeyDefinition, ForeignKeyReference};
use crate::ddl::{create_table_statement, procedure_definition, table_definition};
use crate::graph::{build_graph, SchemaGraph};
use crate::normalize::{normalize, ColumnKey, NormalizedColumn};
use crate::options::ExtractOptions;
use crate::order::order_tables;
use crate::schema::{Procedure, Schema};

/// Mutable state threaded through normalize, graph and order phases.
#[derive(Debug)]
pub struct BuildContext<'a> {
    pub schema_name: &'a str,
    pub options: &'a ExtractOptions,
    pub references: HashMap<ColumnKey, ForeignKeyReference>,
    pub fk_definitions: BTreeMap<ConstraintId, ForeignKeyDefinition>,
    /// Normalized columns; drained by the graph phase.
    pub columns: Vec<NormalizedColumn>,
    pub procedures: Vec<Procedure>,
    pub graph: SchemaGraph,
    pub table_order: Vec<String>,
}

impl<'a> BuildContext<'a> {
    pub fn new(schema_name: &'a str, options: &'a ExtractOptions) -> Self {
        Self {
            schema_name,
            options,
            references: HashMap::new(),
            fk_definitions: BTreeMap::new(),
            columns: Vec::new(),
            procedures: Vec::new(),
            graph: SchemaGraph::default(),
            table_order: Vec::new(),
        }
    }

    /// Synthesize definitions and assemble the final schema.
    pub fn finish(self) -> Schema {
        let (mut tables, mut views) = self.graph.into_parts();

        for table in &mut tables {
            table.definition = table_definition(table, &self.fk_definitions);
        }
        for view in &mut views {
            view.definition = create_table_statement(view);
        }

        let mut procedures = self.procedures;
        for procedure in &mut procedures {
            procedure.definition = procedure_definition(procedure, &self.options.procedure_delimiter);
        }

        Schema {
            name: self.schema_name.to_string(),
            tables,
            views,
            table_order: self.table_order,
            procedures,
        }
    }
}

/// Build the schema model, table order and DDL from one catalog snapshot.
pub fn build_schema(catalog: &CatalogSnapshot, options: &ExtractOptions) -> Schema {
    let mut ctx = BuildContext::new(&catalog.schema, options);
    normalize(&mut ctx, catalog);
    build_graph(&mut ctx, catalog);
    ctx.table_order = order_tables(&ctx.graph);

    let schema = ctx.finish();
    tracing::info!(
        event = "schema_built",
        schema = %schema.name,
        tables = schema.tables.len(),
        views = schema.views.len(),
        procedures = schema.procedures.len()
    );
    schema
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_catalog_yields_empty_schema() {
        let schema = build_schema(&CatalogSnapshot::new("empty"), &ExtractOptions::default());
        assert_eq!(schema, Schema::empty("empty"));
    }

    #[test]
    fn zero_routines_yield_no_procedures() {
        let mut catalog = CatalogSnapshot::new("shop");
        catalog.columns.push(crate::catalog::RawColumn {
            table_name: "t".to_string(),
            column_name: "id".to_string(),
            ordinal_position: 1,
            column_type: "int".to_string(),
            data_type: "int".to_string(),
            is_nullable: "NO".to_string(),
            table_type: "BASE TABLE".to_string(),
            ..Default::default()
        });
        let schema = build_schema(&catalog, &ExtractOptions::default());
        assert!(schema.procedures.is_empty());
        assert_eq!(schema.table_order, vec!["t"]);
    }
}
