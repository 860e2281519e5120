use async_trait::async_trait;

use schemaforge_core::{build_schema, CatalogSnapshot, ExtractOptions, Result, Schema};

use crate::options::IntrospectOptions;

/// Trait implemented by database adapters that can read a schema catalog.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Returns the engine identifier (e.g. `mysql`).
    fn engine(&self) -> &'static str;

    /// Fetch every catalog row set as one consistent snapshot.
    async fn fetch_catalog(&self, opts: &IntrospectOptions) -> Result<CatalogSnapshot>;

    /// Fetch the catalog and build the schema model with its DDL.
    async fn introspect(
        &self,
        opts: &IntrospectOptions,
        extract: &ExtractOptions,
    ) -> Result<Schema> {
        let catalog = self.fetch_catalog(opts).await?;
        Ok(build_schema(&catalog, extract))
    }
}
