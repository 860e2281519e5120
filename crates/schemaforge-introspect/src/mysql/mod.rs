use sqlx::MySqlPool;

use schemaforge_core::{build_schema, CatalogSnapshot, ExtractOptions, Result, Schema};

use crate::adapter::Adapter;
use crate::options::IntrospectOptions;

mod mapper;
mod queries;

/// Adapter for MySQL databases.
#[derive(Debug, Clone)]
pub struct MySqlAdapter {
    pool: MySqlPool,
    database: String,
}

impl MySqlAdapter {
    /// Create a new adapter reading `database` through a pre-configured pool.
    pub fn new(pool: MySqlPool, database: impl Into<String>) -> Self {
        Self {
            pool,
            database: database.into(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }
}

#[async_trait::async_trait]
impl Adapter for MySqlAdapter {
    fn engine(&self) -> &'static str {
        "mysql"
    }

    async fn fetch_catalog(&self, opts: &IntrospectOptions) -> Result<CatalogSnapshot> {
        fetch_catalog(&self.pool, &self.database, opts).await
    }
}

/// Introspect one MySQL database and build its schema model.
pub async fn introspect_mysql(
    pool: &MySqlPool,
    database: &str,
    opts: &IntrospectOptions,
    extract: &ExtractOptions,
) -> Result<Schema> {
    let catalog = fetch_catalog(pool, database, opts).await?;
    Ok(build_schema(&catalog, extract))
}

/// Read every catalog row set the schema builder consumes.
pub async fn fetch_catalog(
    pool: &MySqlPool,
    database: &str,
    opts: &IntrospectOptions,
) -> Result<CatalogSnapshot> {
    let columns = mapper::map_columns(queries::list_columns(pool, database).await?, opts);
    let foreign_keys =
        mapper::map_foreign_keys(queries::list_foreign_keys(pool, database).await?, opts);
    let indexes = mapper::map_indexes(
        queries::list_statistics(pool, database).await?,
        &columns,
        &foreign_keys,
        opts,
    );
    let partitions = mapper::map_partitions(queries::list_partitions(pool, database).await?, opts);

    let (routines, parameters) = if opts.include_procedures {
        (
            mapper::map_routines(queries::list_procedures(pool, database).await?),
            mapper::map_parameters(queries::list_parameters(pool, database).await?),
        )
    } else {
        (Vec::new(), Vec::new())
    };

    tracing::info!(
        event = "catalog_fetched",
        database = %database,
        columns = columns.len(),
        foreign_keys = foreign_keys.len(),
        indexes = indexes.len(),
        partitions = partitions.len(),
        routines = routines.len()
    );

    Ok(CatalogSnapshot {
        schema: database.to_string(),
        columns,
        foreign_keys,
        indexes,
        partitions,
        routines,
        parameters,
    })
}
