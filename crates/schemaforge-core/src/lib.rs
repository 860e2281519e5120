//! Schema-model construction and DDL synthesis for schemaforge.
//!
//! Raw catalog rows go in ([`CatalogSnapshot`]); a normalized [`Schema`] comes
//! out, with tables in foreign-key dependency order and a self-contained DDL
//! definition per table and procedure.

pub mod align;
pub mod build;
pub mod catalog;
pub mod constraints;
pub mod ddl;
pub mod error;
pub mod graph;
pub mod normalize;
pub mod options;
pub mod order;
pub mod schema;
pub mod types;
pub mod validation;

pub use align::align_columns;
pub use build::{build_schema, BuildContext};
pub use catalog::{
    CatalogSnapshot, RawColumn, RawForeignKey, RawIndex, RawParameter, RawPartition, RawRoutine,
};
pub use constraints::{ConstraintId, ForeignKeyDefinition, ForeignKeyReference, Index, IndexClass};
pub use error::{Error, Result};
pub use graph::{
    build_fk_graph_report, fan_in_tally, FanIn, FkGraphReport, FkGraphSummary, SchemaGraph,
};
pub use normalize::ColumnKey;
pub use options::{ExtractOptions, DEFAULT_PROCEDURE_DELIMITER};
pub use order::order_tables;
pub use schema::{
    Column, Parameter, Procedure, RawTableMeta, RoutineKind, Schema, SchemaDocument, Table,
    TableKind,
};
pub use types::{FkAction, Generation, ParamMode};
pub use validation::{ensure_consistent, validate_schema, SchemaIssue};

/// Contract version for `schema.json` artifacts.
pub const SCHEMA_VERSION: &str = "0.1";
