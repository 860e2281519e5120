//! Catalog access for schemaforge.
//!
//! Fetches `information_schema` row sets into a [`CatalogSnapshot`] and hands
//! them to the core engine.

pub mod adapter;
pub mod mysql;
pub mod options;

pub use adapter::Adapter;
pub use mysql::{fetch_catalog, introspect_mysql, MySqlAdapter};
pub use options::IntrospectOptions;

pub use schemaforge_core::{CatalogSnapshot, Schema};
