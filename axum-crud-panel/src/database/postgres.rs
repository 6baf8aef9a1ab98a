//! PostgreSQL database provider implementation

use crate::database::traits::{Connector, DatabaseError, DatabaseProvider};
use crate::schema::{
    ColumnInfo, CountResponse, ForeignKey, RowQuery, RowValues, RowsResponse, SortOrder,
    TableInfo, TableSchema, MAX_LIMIT,
};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// SQL text plus its positional parameters (`None` binds NULL)
type Statement = (String, Vec<Option<String>>);

/// PostgreSQL database provider
pub struct PostgresProvider {
    pool: PgPool,
}

impl PostgresProvider {
    /// Create a new PostgreSQL provider
    ///
    /// # Arguments
    ///
    /// * `pool` - PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Quote an identifier to prevent SQL injection
    fn quote_identifier(identifier: &str) -> String {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }

    /// `LIMIT`/`OFFSET` suffix; offsets beyond `BIGINT` are clamped
    fn page_clause(limit: u64, offset: u64) -> String {
        format!(" LIMIT {} OFFSET {}", limit, offset.min(i64::MAX as u64))
    }

    /// Positional parameter bound as text and cast to the column's type
    fn typed_parameter(index: usize, column: &ColumnInfo) -> String {
        format!("${}::text::{}", index, Self::quote_identifier(&column.udt_name))
    }

    /// Text form of a JSON value for a column, `None` for NULL
    fn json_to_parameter(value: &Value, column: &ColumnInfo) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            Value::Array(items) if column.udt_name.starts_with('_') => Some(array_literal(items)),
            other => Some(other.to_string()),
        }
    }

    /// Build a WHERE clause from filters
    ///
    /// Columns are compared as text so a single parameter type fits every
    /// column; values containing `%` use LIKE.
    fn build_where_clause(
        schema: &TableSchema,
        filters: &HashMap<String, String>,
        parameter_offset: usize,
    ) -> Result<(String, Vec<String>), DatabaseError> {
        if filters.is_empty() {
            return Ok((String::new(), vec![]));
        }

        // Sorted so the generated SQL is deterministic
        let mut entries: Vec<(&String, &String)> = filters.iter().collect();
        entries.sort();

        let mut conditions = Vec::new();
        let mut values = Vec::new();

        for (position, (column, filter_value)) in entries.into_iter().enumerate() {
            if schema.column(column).is_none() {
                return Err(DatabaseError::InvalidColumn(column.clone()));
            }
            let quoted_column = Self::quote_identifier(column);
            let operator = if filter_value.contains('%') { "LIKE" } else { "=" };
            conditions.push(format!(
                "{}::text {} ${}",
                quoted_column,
                operator,
                parameter_offset + position
            ));
            values.push(filter_value.clone());
        }

        Ok((format!(" WHERE {}", conditions.join(" AND ")), values))
    }

    /// Resolve value columns against the schema, in the caller's order
    fn resolve_columns<'s>(
        schema: &'s TableSchema,
        values: &RowValues,
    ) -> Result<Vec<&'s ColumnInfo>, DatabaseError> {
        values
            .keys()
            .map(|name| {
                schema
                    .column(name)
                    .ok_or_else(|| DatabaseError::InvalidColumn(name.clone()))
            })
            .collect()
    }

    /// WHERE clause matching exactly one row by primary key
    fn build_key_clause(
        schema: &TableSchema,
        key: &RowValues,
        parameter_offset: usize,
    ) -> Result<Statement, DatabaseError> {
        let key_columns = schema.key_columns();
        if key_columns.is_empty() {
            return Err(DatabaseError::NoPrimaryKey(schema.name.clone()));
        }
        if key.len() != key_columns.len() {
            return Err(DatabaseError::InvalidKey(format!(
                "expected columns {}",
                key_columns.join(", ")
            )));
        }

        let mut conditions = Vec::new();
        let mut parameters = Vec::new();
        for (position, name) in key_columns.iter().enumerate() {
            let value = key.get(name).ok_or_else(|| {
                DatabaseError::InvalidKey(format!("missing key column {}", name))
            })?;
            let column = schema
                .column(name)
                .ok_or_else(|| DatabaseError::InvalidColumn(name.clone()))?;
            conditions.push(format!(
                "{} = {}",
                Self::quote_identifier(name),
                Self::typed_parameter(parameter_offset + position, column)
            ));
            parameters.push(Self::json_to_parameter(value, column));
        }

        Ok((format!(" WHERE {}", conditions.join(" AND ")), parameters))
    }

    /// Wrap a data-modifying statement so it returns the row as JSON
    fn returning_json(statement: String) -> String {
        format!(
            "WITH changed AS ({} RETURNING *) SELECT to_jsonb(changed) AS row FROM changed",
            statement
        )
    }

    fn build_insert(schema: &TableSchema, values: &RowValues) -> Result<Statement, DatabaseError> {
        let quoted_table = Self::quote_identifier(&schema.name);
        if values.is_empty() {
            return Ok((
                Self::returning_json(format!("INSERT INTO {} DEFAULT VALUES", quoted_table)),
                vec![],
            ));
        }

        let columns = Self::resolve_columns(schema, values)?;
        let names: Vec<String> = columns
            .iter()
            .map(|c| Self::quote_identifier(&c.name))
            .collect();
        let placeholders: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(position, column)| Self::typed_parameter(position + 1, column))
            .collect();
        let parameters = columns
            .iter()
            .zip(values.values())
            .map(|(column, value)| Self::json_to_parameter(value, column))
            .collect();

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quoted_table,
            names.join(", "),
            placeholders.join(", ")
        );
        Ok((Self::returning_json(sql), parameters))
    }

    fn build_update(
        schema: &TableSchema,
        key: &RowValues,
        values: &RowValues,
    ) -> Result<Statement, DatabaseError> {
        if values.is_empty() {
            return Err(DatabaseError::EmptyValues);
        }

        let columns = Self::resolve_columns(schema, values)?;
        let assignments: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(position, column)| {
                format!(
                    "{} = {}",
                    Self::quote_identifier(&column.name),
                    Self::typed_parameter(position + 1, column)
                )
            })
            .collect();
        let mut parameters: Vec<Option<String>> = columns
            .iter()
            .zip(values.values())
            .map(|(column, value)| Self::json_to_parameter(value, column))
            .collect();

        let (where_clause, key_parameters) =
            Self::build_key_clause(schema, key, parameters.len() + 1)?;
        parameters.extend(key_parameters);

        let sql = format!(
            "UPDATE {} SET {}{}",
            Self::quote_identifier(&schema.name),
            assignments.join(", "),
            where_clause
        );
        Ok((Self::returning_json(sql), parameters))
    }

    fn build_delete(schema: &TableSchema, key: &RowValues) -> Result<Statement, DatabaseError> {
        let (where_clause, parameters) = Self::build_key_clause(schema, key, 1)?;
        let sql = format!(
            "DELETE FROM {}{}",
            Self::quote_identifier(&schema.name),
            where_clause
        );
        Ok((Self::returning_json(sql), parameters))
    }

    /// Run a statement built by one of the `build_*` helpers
    async fn fetch_changed_row(&self, table: &str, statement: Statement) -> Result<Value, DatabaseError> {
        let (sql, parameters) = statement;
        debug!(table, sql = %sql, "executing row mutation");

        let mut query_builder = sqlx::query(&sql);
        for parameter in parameters {
            query_builder = query_builder.bind(parameter);
        }

        let row = query_builder
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::RowNotFound(table.to_string()))?;
        Ok(row.try_get::<Value, _>("row")?)
    }
}

/// PostgreSQL array literal for a JSON array (`{1,"two",NULL}`)
fn array_literal(items: &[Value]) -> String {
    let elements: Vec<String> = items
        .iter()
        .map(|item| match item {
            Value::Null => "NULL".to_string(),
            Value::Bool(_) | Value::Number(_) => item.to_string(),
            Value::Array(nested) => array_literal(nested),
            Value::String(text) => quote_array_element(text),
            Value::Object(_) => quote_array_element(&item.to_string()),
        })
        .collect();
    format!("{{{}}}", elements.join(","))
}

fn quote_array_element(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

#[async_trait]
impl DatabaseProvider for PostgresProvider {
    async fn list_tables(&self) -> Result<Vec<TableInfo>, DatabaseError> {
        let query = r#"
            SELECT table_name
            FROM information_schema.tables
            WHERE table_schema = 'public'
              AND table_type = 'BASE TABLE'
            ORDER BY table_name
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;

        let mut tables = Vec::new();
        for row in rows {
            let name: String = row.try_get("table_name")?;

            // Row counts are best effort; a table we cannot count is still listed
            let count_query = format!(
                "SELECT COUNT(*) AS count FROM {}",
                Self::quote_identifier(&name)
            );
            let row_count: Option<u64> = sqlx::query_scalar(&count_query)
                .fetch_one(&self.pool)
                .await
                .ok()
                .map(|count: i64| count as u64);

            tables.push(TableInfo { name, row_count });
        }

        Ok(tables)
    }

    async fn get_table_schema(&self, table: &str) -> Result<TableSchema, DatabaseError> {
        let column_query = r#"
            SELECT
                column_name,
                data_type,
                udt_name,
                is_nullable,
                column_default
            FROM information_schema.columns
            WHERE table_schema = 'public'
              AND table_name = $1
            ORDER BY ordinal_position
        "#;

        let column_rows = sqlx::query(column_query)
            .bind(table)
            .fetch_all(&self.pool)
            .await?;

        if column_rows.is_empty() {
            return Err(DatabaseError::TableNotFound(table.to_string()));
        }

        let pk_query = r#"
            SELECT kcu.column_name
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
              ON tc.constraint_name = kcu.constraint_name
              AND tc.table_schema = kcu.table_schema
            WHERE tc.table_schema = 'public'
              AND tc.table_name = $1
              AND tc.constraint_type = 'PRIMARY KEY'
            ORDER BY kcu.ordinal_position
        "#;

        let pk_rows = sqlx::query(pk_query)
            .bind(table)
            .fetch_all(&self.pool)
            .await?;

        let primary_key_columns: Vec<String> = pk_rows
            .iter()
            .map(|row| row.try_get::<String, _>("column_name"))
            .collect::<Result<Vec<_>, _>>()?;

        let fk_query = r#"
            SELECT
                kcu.column_name,
                ccu.table_name AS references_table,
                ccu.column_name AS references_column
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
              ON tc.constraint_name = kcu.constraint_name
              AND tc.table_schema = kcu.table_schema
            JOIN information_schema.constraint_column_usage ccu
              ON ccu.constraint_name = tc.constraint_name
              AND ccu.table_schema = tc.table_schema
            WHERE tc.table_schema = 'public'
              AND tc.table_name = $1
              AND tc.constraint_type = 'FOREIGN KEY'
            ORDER BY kcu.column_name
        "#;

        let fk_rows = sqlx::query(fk_query)
            .bind(table)
            .fetch_all(&self.pool)
            .await?;

        let foreign_keys: Vec<ForeignKey> = fk_rows
            .iter()
            .map(|row| {
                Ok(ForeignKey {
                    column: row.try_get("column_name")?,
                    references_table: row.try_get("references_table")?,
                    references_column: row.try_get("references_column")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        let columns: Vec<ColumnInfo> = column_rows
            .iter()
            .map(|row| {
                let column_name: String = row.try_get("column_name")?;
                let is_nullable: String = row.try_get("is_nullable")?;

                Ok(ColumnInfo {
                    is_primary_key: primary_key_columns.contains(&column_name),
                    name: column_name,
                    data_type: row.try_get("data_type")?,
                    udt_name: row.try_get("udt_name")?,
                    nullable: is_nullable == "YES",
                    default_value: row.try_get("column_default")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        let primary_key = if primary_key_columns.is_empty() {
            None
        } else {
            Some(primary_key_columns)
        };

        Ok(TableSchema {
            name: table.to_string(),
            columns,
            primary_key,
            foreign_keys,
        })
    }

    async fn get_rows(&self, table: &str, query: RowQuery) -> Result<RowsResponse, DatabaseError> {
        // Validates the table and gives us column names
        let schema = self.get_table_schema(table).await?;
        let column_names: Vec<String> = schema.columns.iter().map(|c| c.name.clone()).collect();

        let quoted_table = Self::quote_identifier(table);
        let mut sql = format!("SELECT to_jsonb(t) AS row FROM {} AS t", quoted_table);

        let (where_clause, filter_values) = Self::build_where_clause(&schema, &query.filters, 1)?;
        sql.push_str(&where_clause);

        if let Some(sort_column) = &query.sort_by {
            if !column_names.contains(sort_column) {
                return Err(DatabaseError::InvalidColumn(sort_column.clone()));
            }

            let sort_direction = match query.sort_order {
                Some(SortOrder::Descending) => "DESC",
                _ => "ASC",
            };
            sql.push_str(&format!(
                " ORDER BY {} {}",
                Self::quote_identifier(sort_column),
                sort_direction
            ));
        }

        let limit = query.limit.min(MAX_LIMIT);
        sql.push_str(&Self::page_clause(limit, query.offset));

        let mut query_builder = sqlx::query(&sql);
        for value in &filter_values {
            query_builder = query_builder.bind(value);
        }

        let rows = query_builder.fetch_all(&self.pool).await?;
        let json_rows: Vec<Value> = rows
            .iter()
            .map(|row| row.try_get::<Value, _>("row"))
            .collect::<Result<Vec<_>, _>>()?;

        let total = self.count_rows(table, &query).await?.count;
        let has_more = query.offset.saturating_add(json_rows.len() as u64) < total;

        Ok(RowsResponse {
            rows: json_rows,
            columns: column_names,
            total,
            offset: query.offset,
            limit,
            has_more,
        })
    }

    async fn count_rows(&self, table: &str, query: &RowQuery) -> Result<CountResponse, DatabaseError> {
        let schema = self.get_table_schema(table).await?;
        let mut sql = format!(
            "SELECT COUNT(*) AS count FROM {}",
            Self::quote_identifier(table)
        );

        let (where_clause, filter_values) = Self::build_where_clause(&schema, &query.filters, 1)?;
        sql.push_str(&where_clause);

        let mut query_builder = sqlx::query(&sql);
        for value in &filter_values {
            query_builder = query_builder.bind(value);
        }

        let row = query_builder.fetch_one(&self.pool).await?;
        let count: i64 = row.try_get("count")?;

        Ok(CountResponse {
            count: count as u64,
        })
    }

    async fn insert_row(&self, table: &str, values: &RowValues) -> Result<Value, DatabaseError> {
        let schema = self.get_table_schema(table).await?;
        let statement = Self::build_insert(&schema, values)?;
        self.fetch_changed_row(table, statement).await
    }

    async fn update_row(
        &self,
        table: &str,
        key: &RowValues,
        values: &RowValues,
    ) -> Result<Value, DatabaseError> {
        let schema = self.get_table_schema(table).await?;
        let statement = Self::build_update(&schema, key, values)?;
        self.fetch_changed_row(table, statement).await
    }

    async fn delete_row(&self, table: &str, key: &RowValues) -> Result<Value, DatabaseError> {
        let schema = self.get_table_schema(table).await?;
        let statement = Self::build_delete(&schema, key)?;
        self.fetch_changed_row(table, statement).await
    }
}

/// Opens a pooled [`PostgresProvider`] per connection URL
#[derive(Debug, Clone)]
pub struct PostgresConnector {
    max_connections: u32,
    acquire_timeout: Duration,
}

impl Default for PostgresConnector {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

impl PostgresConnector {
    pub fn new(max_connections: u32, acquire_timeout: Duration) -> Self {
        Self {
            max_connections,
            acquire_timeout,
        }
    }
}

#[async_trait]
impl Connector for PostgresConnector {
    async fn connect(&self, url: &str) -> Result<Arc<dyn DatabaseProvider>, DatabaseError> {
        if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
            return Err(DatabaseError::InvalidUrl(
                "expected a postgres:// or postgresql:// URL".to_string(),
            ));
        }

        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
            .connect(url)
            .await?;

        Ok(Arc::new(PostgresProvider::new(pool)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn column(name: &str, udt_name: &str, is_primary_key: bool) -> ColumnInfo {
        ColumnInfo {
            name: name.to_string(),
            data_type: udt_name.to_string(),
            udt_name: udt_name.to_string(),
            nullable: !is_primary_key,
            default_value: None,
            is_primary_key,
        }
    }

    fn users() -> TableSchema {
        TableSchema {
            name: "users".to_string(),
            columns: vec![
                column("id", "int4", true),
                column("email", "text", false),
                column("tags", "_text", false),
            ],
            primary_key: Some(vec!["id".to_string()]),
            foreign_keys: vec![],
        }
    }

    fn values(value: Value) -> RowValues {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn quotes_identifiers() {
        assert_eq!(PostgresProvider::quote_identifier("users"), "\"users\"");
        assert_eq!(
            PostgresProvider::quote_identifier("we\"ird"),
            "\"we\"\"ird\""
        );
    }

    #[test]
    fn where_clause_compares_as_text() {
        let filters = HashMap::from([
            ("email".to_string(), "%@example.com".to_string()),
            ("id".to_string(), "3".to_string()),
        ]);
        let (clause, values) = PostgresProvider::build_where_clause(&users(), &filters, 1).unwrap();
        assert_eq!(
            clause,
            " WHERE \"email\"::text LIKE $1 AND \"id\"::text = $2"
        );
        assert_eq!(values, ["%@example.com", "3"]);
    }

    #[test]
    fn page_clause_clamps_huge_offsets() {
        assert_eq!(PostgresProvider::page_clause(50, 100), " LIMIT 50 OFFSET 100");
        assert_eq!(
            PostgresProvider::page_clause(50, u64::MAX),
            format!(" LIMIT 50 OFFSET {}", i64::MAX)
        );
    }

    #[test]
    fn where_clause_rejects_unknown_columns() {
        let filters = HashMap::from([("nope".to_string(), "x".to_string())]);
        let error = PostgresProvider::build_where_clause(&users(), &filters, 1).unwrap_err();
        assert!(matches!(error, DatabaseError::InvalidColumn(c) if c == "nope"));
    }

    #[test]
    fn insert_casts_each_parameter() {
        let (sql, parameters) = PostgresProvider::build_insert(
            &users(),
            &values(json!({ "email": "a@b.c", "tags": ["x", "y \"z\""] })),
        )
        .unwrap();

        assert_eq!(
            sql,
            "WITH changed AS (INSERT INTO \"users\" (\"email\", \"tags\") VALUES ($1::text::\"text\", $2::text::\"_text\") RETURNING *) SELECT to_jsonb(changed) AS row FROM changed"
        );
        assert_eq!(
            parameters,
            vec![
                Some("a@b.c".to_string()),
                Some("{\"x\",\"y \\\"z\\\"\"}".to_string())
            ]
        );
    }

    #[test]
    fn insert_without_values_uses_defaults() {
        let (sql, parameters) = PostgresProvider::build_insert(&users(), &RowValues::new()).unwrap();
        assert!(sql.contains("INSERT INTO \"users\" DEFAULT VALUES"));
        assert!(parameters.is_empty());
    }

    #[test]
    fn update_numbers_key_after_values() {
        let (sql, parameters) = PostgresProvider::build_update(
            &users(),
            &values(json!({ "id": 4 })),
            &values(json!({ "email": null })),
        )
        .unwrap();

        assert!(sql.contains(
            "UPDATE \"users\" SET \"email\" = $1::text::\"text\" WHERE \"id\" = $2::text::\"int4\""
        ));
        assert_eq!(parameters, vec![None, Some("4".to_string())]);
    }

    #[test]
    fn key_must_match_primary_key() {
        let schema = users();
        let error = PostgresProvider::build_delete(&schema, &values(json!({ "email": "x" }))).unwrap_err();
        assert!(matches!(error, DatabaseError::InvalidKey(_)));

        let error = PostgresProvider::build_delete(&schema, &values(json!({ "id": 1, "email": "x" })))
            .unwrap_err();
        assert!(matches!(error, DatabaseError::InvalidKey(_)));

        let keyless = TableSchema {
            primary_key: None,
            ..schema
        };
        let error = PostgresProvider::build_delete(&keyless, &values(json!({ "id": 1 }))).unwrap_err();
        assert!(matches!(error, DatabaseError::NoPrimaryKey(_)));
    }

    #[test]
    fn update_rejects_unknown_columns_and_empty_values() {
        let key = values(json!({ "id": 1 }));
        let error =
            PostgresProvider::build_update(&users(), &key, &values(json!({ "nope": 1 }))).unwrap_err();
        assert!(matches!(error, DatabaseError::InvalidColumn(_)));

        let error = PostgresProvider::build_update(&users(), &key, &RowValues::new()).unwrap_err();
        assert!(matches!(error, DatabaseError::EmptyValues));
    }

    #[tokio::test]
    async fn connector_rejects_other_schemes() {
        let error = PostgresConnector::default()
            .connect("mysql://localhost/db")
            .await
            .err()
            .unwrap();
        assert!(matches!(error, DatabaseError::InvalidUrl(_)));
    }
}
