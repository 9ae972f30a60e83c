//! Query executor: the single entry point for SQL issued by repositories.
//!
//! Statements are classified syntactically. Anything starting with `SELECT`
//! is a read and goes through the [`QueryCache`]; everything else is a write,
//! executed directly and followed by invalidation of its target table.
//!
//! Invalidation is process-local. Another process or another executor over
//! the same database may keep serving its own cached results until they
//! expire.

mod transaction;

use std::sync::Arc;

use serde::Serialize;
use tokio_rusqlite::rusqlite::{self, params_from_iter, types::Value};

use crate::Error;
use crate::cache::{CacheStats, KeywordTableResolver, QueryCache, TableResolver, compute_fingerprint};
use crate::store::row::{Row, column_i64, read_rows};
use crate::store::Store;

pub use transaction::TransactionScope;

/// Outcome of a write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WriteResult {
    /// Rowid of the most recent successful insert on the connection.
    pub last_insert_id: i64,
    pub rows_affected: u64,
}

/// Result of [`QueryExecutor::execute`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Rows(Arc<Vec<Row>>),
    Write(WriteResult),
}

/// Whether a statement is served through the read path.
pub fn is_read(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("SELECT"))
}

pub(crate) fn run_write(conn: &rusqlite::Connection, sql: &str, params: &[Value]) -> rusqlite::Result<WriteResult> {
    let rows_affected = conn.execute(sql, params_from_iter(params.iter()))?;
    Ok(WriteResult { last_insert_id: conn.last_insert_rowid(), rows_affected: rows_affected as u64 })
}

/// Evicts cached reads after a successful write.
#[derive(Clone, Debug)]
pub(crate) struct Invalidator {
    cache: Arc<QueryCache>,
    resolver: Arc<dyn TableResolver>,
}

impl Invalidator {
    pub(crate) fn after_write(&self, sql: &str) {
        match self.resolver.target_table(sql) {
            Some(table) => {
                let evicted = self.cache.invalidate_table(&table);
                tracing::debug!(%table, evicted, "invalidated cached reads");
            }
            None => {
                tracing::warn!(
                    statement = %sql.trim(),
                    "could not determine target table of write; cached reads expire by TTL only"
                );
            }
        }
    }
}

/// Cache-aware statement executor over a shared [`Store`].
#[derive(Clone, Debug)]
pub struct QueryExecutor {
    store: Store,
    invalidator: Invalidator,
}

impl QueryExecutor {
    /// Create an executor using [`KeywordTableResolver`] for invalidation.
    pub fn new(store: Store, cache: QueryCache) -> Self {
        Self::with_resolver(store, cache, KeywordTableResolver)
    }

    /// Create an executor with a custom table resolver.
    pub fn with_resolver(store: Store, cache: QueryCache, resolver: impl TableResolver + 'static) -> Self {
        Self { store, invalidator: Invalidator { cache: Arc::new(cache), resolver: Arc::new(resolver) } }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn cache(&self) -> &QueryCache {
        &self.invalidator.cache
    }

    /// Execute a statement, serving reads from the cache when possible.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Query`] with the storage error untouched if SQLite
    /// rejects the statement. Nothing is retried.
    pub async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<QueryOutput, Error> {
        if is_read(sql) { self.read(sql, params).await } else { self.write(sql, params).await }
    }

    async fn read(&self, sql: &str, params: Vec<Value>) -> Result<QueryOutput, Error> {
        let cache = &self.invalidator.cache;
        let fingerprint = compute_fingerprint(sql, &params);

        if let Some(cached) = cache.get(&fingerprint) {
            tracing::debug!(%fingerprint, "query cache hit");
            return Ok(cached);
        }

        let statement = sql.to_string();
        let rows = self
            .store
            .conn
            .call(move |conn| read_rows(conn, &statement, &params))
            .await
            .map_err(|e| log_failure(sql, Error::from(e)))?;

        tracing::debug!(%fingerprint, rows = rows.len(), "query cache miss");
        let output = QueryOutput::Rows(Arc::new(rows));
        cache.put(fingerprint, sql, output.clone());
        Ok(output)
    }

    async fn write(&self, sql: &str, params: Vec<Value>) -> Result<QueryOutput, Error> {
        let statement = sql.to_string();
        let result = self
            .store
            .conn
            .call(move |conn| run_write(conn, &statement, &params))
            .await
            .map_err(|e| log_failure(sql, Error::from(e)))?;

        self.invalidator.after_write(sql);
        Ok(QueryOutput::Write(result))
    }

    /// Execute a read and return its rows.
    pub async fn fetch_all(&self, sql: &str, params: Vec<Value>) -> Result<Arc<Vec<Row>>, Error> {
        match self.execute(sql, params).await? {
            QueryOutput::Rows(rows) => Ok(rows),
            QueryOutput::Write(_) => Err(Error::InvalidInput("expected a SELECT statement".into())),
        }
    }

    /// Execute a read and return its first row, if any.
    pub async fn fetch_optional(&self, sql: &str, params: Vec<Value>) -> Result<Option<Row>, Error> {
        Ok(self.fetch_all(sql, params).await?.first().cloned())
    }

    /// Execute a single-row read and return one integer column of it.
    pub async fn fetch_i64(&self, sql: &str, params: Vec<Value>, column: &str) -> Result<i64, Error> {
        let row = self
            .fetch_optional(sql, params)
            .await?
            .ok_or_else(|| Error::InvalidData(format!("expected a row carrying `{column}`")))?;
        column_i64(&row, column)
    }

    /// Execute a write and return its outcome.
    pub async fn run(&self, sql: &str, params: Vec<Value>) -> Result<WriteResult, Error> {
        match self.execute(sql, params).await? {
            QueryOutput::Write(result) => Ok(result),
            QueryOutput::Rows(_) => Err(Error::InvalidInput("expected a non-SELECT statement".into())),
        }
    }

    /// Drop every cached read result.
    pub fn clear_cache(&self) -> usize {
        let cleared = self.invalidator.cache.clear();
        tracing::info!(cleared, "query cache cleared");
        cleared
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.invalidator.cache.stats()
    }
}

fn log_failure(sql: &str, err: Error) -> Error {
    tracing::warn!(error = %err, statement = %sql.trim(), "statement failed");
    err
}
