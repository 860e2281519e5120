use sqlx::MySqlPool;

use schemaforge_core::{Error, Result};

// information_schema exposes several columns as VARBINARY or LONGTEXT
// depending on server version; every text column is cast to CHAR and every
// count to UNSIGNED so the row types below decode on MySQL 5.7 and 8.x alike.

#[derive(Debug, sqlx::FromRow)]
pub struct ColumnRow {
    pub table_name: String,
    pub column_name: String,
    pub ordinal_position: u64,
    pub column_type: String,
    pub data_type: String,
    pub character_maximum_length: Option<i64>,
    pub column_key: Option<String>,
    pub is_nullable: String,
    pub extra: Option<String>,
    pub column_default: Option<String>,
    pub generation_expression: Option<String>,
    pub table_type: String,
    /// `VIEWS.IS_UPDATABLE`; null for base tables.
    pub is_insertable_into: Option<String>,
}

pub async fn list_columns(pool: &MySqlPool, schema: &str) -> Result<Vec<ColumnRow>> {
    sqlx::query_as::<_, ColumnRow>(
        r#"
        select
          cast(c.TABLE_NAME as char) as table_name,
          cast(c.COLUMN_NAME as char) as column_name,
          cast(c.ORDINAL_POSITION as unsigned) as ordinal_position,
          cast(c.COLUMN_TYPE as char) as column_type,
          cast(c.DATA_TYPE as char) as data_type,
          cast(c.CHARACTER_MAXIMUM_LENGTH as signed) as character_maximum_length,
          cast(c.COLUMN_KEY as char) as column_key,
          cast(c.IS_NULLABLE as char) as is_nullable,
          cast(c.EXTRA as char) as extra,
          cast(c.COLUMN_DEFAULT as char) as column_default,
          cast(c.GENERATION_EXPRESSION as char) as generation_expression,
          cast(t.TABLE_TYPE as char) as table_type,
          cast(v.IS_UPDATABLE as char) as is_insertable_into
        from information_schema.COLUMNS c
        join information_schema.TABLES t
          on t.TABLE_SCHEMA = c.TABLE_SCHEMA and t.TABLE_NAME = c.TABLE_NAME
        left join information_schema.VIEWS v
          on v.TABLE_SCHEMA = c.TABLE_SCHEMA and v.TABLE_NAME = c.TABLE_NAME
        where c.TABLE_SCHEMA = ?
        order by c.TABLE_NAME, c.ORDINAL_POSITION
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await
    .map_err(|err| Error::Db(err.to_string()))
}

#[derive(Debug, sqlx::FromRow)]
pub struct ForeignKeyRow {
    pub constraint_name: String,
    pub table_name: String,
    pub column_name: String,
    pub referenced_table_name: String,
    pub referenced_column_name: String,
    pub ordinal_position: u64,
}

pub async fn list_foreign_keys(pool: &MySqlPool, schema: &str) -> Result<Vec<ForeignKeyRow>> {
    sqlx::query_as::<_, ForeignKeyRow>(
        r#"
        select
          cast(k.CONSTRAINT_NAME as char) as constraint_name,
          cast(k.TABLE_NAME as char) as table_name,
          cast(k.COLUMN_NAME as char) as column_name,
          cast(k.REFERENCED_TABLE_NAME as char) as referenced_table_name,
          cast(k.REFERENCED_COLUMN_NAME as char) as referenced_column_name,
          cast(k.ORDINAL_POSITION as unsigned) as ordinal_position
        from information_schema.KEY_COLUMN_USAGE k
        where k.TABLE_SCHEMA = ?
          and k.REFERENCED_TABLE_NAME is not null
          and k.REFERENCED_TABLE_SCHEMA = k.TABLE_SCHEMA
        order by k.TABLE_NAME, k.CONSTRAINT_NAME, k.ORDINAL_POSITION
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await
    .map_err(|err| Error::Db(err.to_string()))
}

#[derive(Debug, sqlx::FromRow)]
pub struct StatisticsRow {
    pub table_name: String,
    pub index_name: String,
    /// Null for functional key parts.
    pub column_name: Option<String>,
    pub non_unique: i64,
    pub seq_in_index: u64,
}

pub async fn list_statistics(pool: &MySqlPool, schema: &str) -> Result<Vec<StatisticsRow>> {
    sqlx::query_as::<_, StatisticsRow>(
        r#"
        select
          cast(s.TABLE_NAME as char) as table_name,
          cast(s.INDEX_NAME as char) as index_name,
          cast(s.COLUMN_NAME as char) as column_name,
          cast(s.NON_UNIQUE as signed) as non_unique,
          cast(s.SEQ_IN_INDEX as unsigned) as seq_in_index
        from information_schema.STATISTICS s
        join information_schema.TABLES t
          on t.TABLE_SCHEMA = s.TABLE_SCHEMA and t.TABLE_NAME = s.TABLE_NAME
        where s.TABLE_SCHEMA = ?
          and t.TABLE_TYPE = 'BASE TABLE'
        order by s.TABLE_NAME, s.INDEX_NAME, s.SEQ_IN_INDEX
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await
    .map_err(|err| Error::Db(err.to_string()))
}

#[derive(Debug, sqlx::FromRow)]
pub struct PartitionRow {
    pub table_name: String,
    pub partition_name: String,
    pub method: Option<String>,
    pub expression: Option<String>,
    pub description: Option<String>,
    pub ordinal_position: u64,
}

pub async fn list_partitions(pool: &MySqlPool, schema: &str) -> Result<Vec<PartitionRow>> {
    sqlx::query_as::<_, PartitionRow>(
        r#"
        select
          cast(p.TABLE_NAME as char) as table_name,
          cast(p.PARTITION_NAME as char) as partition_name,
          cast(p.PARTITION_METHOD as char) as method,
          cast(p.PARTITION_EXPRESSION as char) as expression,
          cast(p.PARTITION_DESCRIPTION as char) as description,
          cast(p.PARTITION_ORDINAL_POSITION as unsigned) as ordinal_position
        from information_schema.PARTITIONS p
        where p.TABLE_SCHEMA = ?
          and p.PARTITION_NAME is not null
          and (p.SUBPARTITION_ORDINAL_POSITION is null or p.SUBPARTITION_ORDINAL_POSITION = 1)
        order by p.TABLE_NAME, p.PARTITION_ORDINAL_POSITION
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await
    .map_err(|err| Error::Db(err.to_string()))
}

#[derive(Debug, sqlx::FromRow)]
pub struct RoutineRow {
    pub routine_name: String,
    pub routine_definition: Option<String>,
}

pub async fn list_procedures(pool: &MySqlPool, schema: &str) -> Result<Vec<RoutineRow>> {
    sqlx::query_as::<_, RoutineRow>(
        r#"
        select
          cast(r.ROUTINE_NAME as char) as routine_name,
          cast(r.ROUTINE_DEFINITION as char) as routine_definition
        from information_schema.ROUTINES r
        where r.ROUTINE_SCHEMA = ?
          and r.ROUTINE_TYPE = 'PROCEDURE'
        order by r.ROUTINE_NAME
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await
    .map_err(|err| Error::Db(err.to_string()))
}

#[derive(Debug, sqlx::FromRow)]
pub struct ParameterRow {
    pub routine_name: String,
    pub parameter_name: Option<String>,
    pub parameter_mode: Option<String>,
    pub data_type: Option<String>,
    pub ordinal_position: u64,
}

pub async fn list_parameters(pool: &MySqlPool, schema: &str) -> Result<Vec<ParameterRow>> {
    sqlx::query_as::<_, ParameterRow>(
        r#"
        select
          cast(p.SPECIFIC_NAME as char) as routine_name,
          cast(p.PARAMETER_NAME as char) as parameter_name,
          cast(p.PARAMETER_MODE as char) as parameter_mode,
          cast(p.DTD_IDENTIFIER as char) as data_type,
          cast(p.ORDINAL_POSITION as unsigned) as ordinal_position
        from information_schema.PARAMETERS p
        where p.SPECIFIC_SCHEMA = ?
          and p.ROUTINE_TYPE = 'PROCEDURE'
          and p.ORDINAL_POSITION > 0
        order by p.SPECIFIC_NAME, p.ORDINAL_POSITION
        "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await
    .map_err(|err| Error::Db(err.to_string()))
}
