//! Persistent store port and query description.

use futures_util::future::BoxFuture;
use rusqlite::types::Value;
use rusqlite::{Connection, Row, Transaction, params_from_iter};

use crate::domain::errors::StoreError;
use crate::domain::lazy_list::LazyList;

/// Maps one result row into a record.
pub type RowMapper<T> = fn(&Row<'_>) -> rusqlite::Result<T>;

/// A parameterized read query plus its row mapper.
#[derive(Debug, Clone)]
pub struct FetchRequest<T> {
    sql: String,
    params: Vec<Value>,
    map_row: RowMapper<T>,
}

impl<T> FetchRequest<T> {
    /// Creates a request with no bound parameters.
    pub fn new(sql: impl Into<String>, map_row: RowMapper<T>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
            map_row,
        }
    }

    /// Binds the next positional parameter.
    #[must_use]
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Returns the query text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Runs the query and maps every row.
    pub fn rows(&self, conn: &Connection) -> rusqlite::Result<Vec<T>> {
        let mut statement = conn.prepare(&self.sql)?;
        let rows = statement.query_map(params_from_iter(self.params.iter()), self.map_row)?;
        rows.collect()
    }

    /// Counts the rows the query would return.
    pub fn count(&self, conn: &Connection) -> rusqlite::Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM ({})", self.sql);
        let count: i64 = conn.query_row(&sql, params_from_iter(self.params.iter()), |row| {
            row.get(0)
        })?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

/// Asynchronous, readiness-gated access to the local database.
///
/// `fetch` and `update` enqueue their work when called, not when the
/// returned future is first polled, so work runs in call order.
pub trait PersistentStore: Send + Sync {
    /// Counts matching rows. Returns 0 on any failure, including a store that
    /// is not open yet.
    fn count<T>(&self, request: &FetchRequest<T>) -> usize;

    /// Reads rows and maps them lazily with `map`.
    fn fetch<T, V, M>(
        &self,
        request: FetchRequest<T>,
        map: M,
    ) -> BoxFuture<'static, Result<LazyList<V>, StoreError>>
    where
        T: Send + Sync + 'static,
        V: Clone + Send + 'static,
        M: Fn(&T) -> Option<V> + Send + Sync + 'static;

    /// Runs `operation` inside a write transaction. The transaction commits
    /// only if the operation succeeded and changed rows.
    fn update<R, F>(&self, operation: F) -> BoxFuture<'static, Result<R, StoreError>>
    where
        R: Send + 'static,
        F: FnOnce(&Transaction<'_>) -> Result<R, StoreError> + Send + 'static;
}
