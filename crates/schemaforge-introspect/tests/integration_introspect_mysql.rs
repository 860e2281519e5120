use anyhow::{anyhow, Context, Result};
use schemaforge_core::{validate_schema, ExtractOptions, Generation, ParamMode, TableKind};
use schemaforge_introspect::{
    fetch_catalog, introspect_mysql, Adapter, IntrospectOptions, MySqlAdapter,
};
use sqlx::{mysql::MySqlPoolOptions, MySqlPool};
use std::{env, fs};

const SCHEMA_FIXTURE: &str = "fixtures/sql/mysql/001_schema.sql";
const PROCEDURE_FIXTURE: &str = "fixtures/sql/mysql/002_procedures.sql";

fn database_url() -> Option<String> {
    env::var("TEST_DATABASE_URL").ok()
}

async fn reset_fixtures(pool: &MySqlPool) -> Result<()> {
    let script = fs::read_to_string(SCHEMA_FIXTURE)
        .with_context(|| format!("reading fixture {SCHEMA_FIXTURE}"))?;
    for statement in script.split(';') {
        let sql = statement.trim();
        if sql.is_empty() {
            continue;
        }
        sqlx::raw_sql(sql)
            .execute(pool)
            .await
            .with_context(|| format!("executing fixture {SCHEMA_FIXTURE}"))?;
    }

    // Procedure bodies contain `;`, so the routine is sent as one statement.
    sqlx::raw_sql("DROP PROCEDURE IF EXISTS count_orders")
        .execute(pool)
        .await?;
    let procedure = fs::read_to_string(PROCEDURE_FIXTURE)
        .with_context(|| format!("reading fixture {PROCEDURE_FIXTURE}"))?;
    sqlx::raw_sql(procedure.trim())
        .execute(pool)
        .await
        .with_context(|| format!("executing fixture {PROCEDURE_FIXTURE}"))?;

    Ok(())
}

async fn connect() -> Result<Option<(MySqlPool, String)>> {
    let Some(url) = database_url() else {
        eprintln!("TEST_DATABASE_URL not set; skipping MySQL integration test");
        return Ok(None);
    };
    let pool = MySqlPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(10))
        .connect(&url)
        .await
        .context("connecting to MySQL")?;
    let database = sqlx::query_scalar::<_, String>("select cast(database() as char)")
        .fetch_one(&pool)
        .await
        .context("reading current database")?;
    reset_fixtures(&pool).await?;
    Ok(Some((pool, database)))
}

#[tokio::test]
async fn introspects_tables_keys_and_procedures() -> Result<()> {
    let Some((pool, database)) = connect().await? else {
        return Ok(());
    };

    let schema = introspect_mysql(
        &pool,
        &database,
        &IntrospectOptions::default(),
        &ExtractOptions::default(),
    )
    .await?;

    let position = |name: &str| {
        schema
            .table_order
            .iter()
            .position(|table| table == name)
            .ok_or_else(|| anyhow!("expected {name} in table order"))
    };
    assert!(position("users")? < position("orders")?);
    assert!(position("orders")? < position("order_lines")?);
    assert!(position("products")? < position("order_lines")?);
    assert!(!schema.table_order.iter().any(|t| t == "active_users"));

    let view = schema
        .views
        .iter()
        .find(|view| view.name == "active_users")
        .ok_or_else(|| anyhow!("expected active_users view"))?;
    assert_eq!(view.kind, TableKind::View);

    let lines = schema
        .table("order_lines")
        .ok_or_else(|| anyhow!("expected order_lines table"))?;
    let order_id = lines
        .column("order_id")
        .ok_or_else(|| anyhow!("expected order_lines.order_id"))?;
    assert!(order_id.is_primary_key && order_id.is_compound_key);
    assert_eq!(order_id.references.len(), 1);
    assert_eq!(order_id.references[0].table_name, "orders");
    assert!(lines
        .definition
        .contains("ADD CONSTRAINT fk_lines_order FOREIGN KEY (order_id) REFERENCES orders (id);"));

    let products = schema
        .table("products")
        .ok_or_else(|| anyhow!("expected products table"))?;
    let taxed = products
        .column("price_with_tax")
        .ok_or_else(|| anyhow!("expected products.price_with_tax"))?;
    assert_eq!(taxed.generated, Generation::Stored);
    assert!(!taxed.is_updatable);

    let procedure = schema
        .procedure("count_orders")
        .ok_or_else(|| anyhow!("expected count_orders procedure"))?;
    let modes: Vec<ParamMode> = procedure.params.iter().map(|p| p.mode).collect();
    assert_eq!(modes, vec![ParamMode::In, ParamMode::Out]);
    assert!(procedure
        .definition
        .starts_with("DROP PROCEDURE IF EXISTS count_orders;\nDELIMITER $$\n"));

    assert!(validate_schema(&schema).is_empty());

    let adapter = MySqlAdapter::new(pool.clone(), database.clone());
    assert_eq!(adapter.engine(), "mysql");
    let again = adapter
        .introspect(&IntrospectOptions::default(), &ExtractOptions::default())
        .await?;
    assert_eq!(again, schema);

    // Fixture reset drops tables, so the filtered pass shares this test's setup.
    check_table_filter_and_procedure_toggle(&pool, &database).await
}

async fn check_table_filter_and_procedure_toggle(pool: &MySqlPool, database: &str) -> Result<()> {
    let opts = IntrospectOptions {
        include_procedures: false,
        tables: Some(vec!["users".to_string(), "orders".to_string()]),
        ..IntrospectOptions::default()
    };
    let catalog = fetch_catalog(pool, database, &opts).await?;

    assert!(catalog.routines.is_empty());
    assert!(catalog.parameters.is_empty());
    assert!(catalog
        .columns
        .iter()
        .all(|c| c.table_name == "users" || c.table_name == "orders"));
    assert!(catalog
        .indexes
        .iter()
        .any(|index| index.table_name == "orders" && index.is_foreign_key));
    Ok(())
}
