//! Database provider traits
//!
//! These traits define the interface every database implementation provides,
//! and how one is opened from a connection URL.

use crate::schema::{CountResponse, RowQuery, RowValues, RowsResponse, TableInfo, TableSchema};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Database provider trait for schema discovery and data access
///
/// Implementations of this trait provide database-specific logic for
/// discovering schema information, fetching rows and mutating them.
#[async_trait]
pub trait DatabaseProvider: Send + Sync + 'static {
    /// List all tables in the database
    ///
    /// # Returns
    ///
    /// A vector of table information, optionally including row counts
    async fn list_tables(&self) -> Result<Vec<TableInfo>, DatabaseError>;

    /// Get schema information for a specific table
    ///
    /// # Arguments
    ///
    /// * `table` - Name of the table
    ///
    /// # Returns
    ///
    /// Columns, primary key and foreign keys
    async fn get_table_schema(&self, table: &str) -> Result<TableSchema, DatabaseError>;

    /// Fetch rows with pagination, sorting, and filtering
    ///
    /// # Arguments
    ///
    /// * `table` - Name of the table
    /// * `query` - Query parameters (pagination, sorting, filters)
    ///
    /// # Returns
    ///
    /// Paginated rows with metadata
    async fn get_rows(&self, table: &str, query: RowQuery) -> Result<RowsResponse, DatabaseError>;

    /// Get total row count for a table (with optional filters)
    async fn count_rows(&self, table: &str, query: &RowQuery) -> Result<CountResponse, DatabaseError>;

    /// Insert a row and return it as stored
    ///
    /// # Arguments
    ///
    /// * `table` - Name of the table
    /// * `values` - Column values; omitted columns take their defaults
    async fn insert_row(&self, table: &str, values: &RowValues) -> Result<Value, DatabaseError>;

    /// Update the row matching `key` (all primary key columns) and return it
    async fn update_row(
        &self,
        table: &str,
        key: &RowValues,
        values: &RowValues,
    ) -> Result<Value, DatabaseError>;

    /// Delete the row matching `key` (all primary key columns) and return it
    async fn delete_row(&self, table: &str, key: &RowValues) -> Result<Value, DatabaseError>;
}

/// Opens database providers from connection URLs
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Connect to the database at `url`
    async fn connect(&self, url: &str) -> Result<Arc<dyn DatabaseProvider>, DatabaseError>;
}

/// Database error type
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Generic database error
    #[error("Database error: {0}")]
    Query(String),

    /// Table not found
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Invalid column name
    #[error("Invalid column: {0}")]
    InvalidColumn(String),

    /// Update or delete did not match any row
    #[error("Row not found in table {0}")]
    RowNotFound(String),

    /// Update or delete on a table without a primary key
    #[error("Table {0} has no primary key")]
    NoPrimaryKey(String),

    /// Key does not cover exactly the primary key columns
    #[error("Invalid row key: {0}")]
    InvalidKey(String),

    /// Insert or update without any values
    #[error("No column values given")]
    EmptyValues,

    /// Connection URL rejected before connecting
    #[error("Invalid connection URL: {0}")]
    InvalidUrl(String),

    /// Query timeout
    #[error("Query timeout exceeded")]
    Timeout,
}

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut => DatabaseError::Timeout,
            other => DatabaseError::Query(other.to_string()),
        }
    }
}
