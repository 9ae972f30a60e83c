//! Scoped transactions.
//!
//! The unit of work runs synchronously on the storage thread between an
//! explicit `BEGIN TRANSACTION` and `COMMIT`/`ROLLBACK`, so no statement from
//! another task can interleave with it.

use std::sync::Arc;

use tokio_rusqlite::rusqlite::{self, types::Value};

use super::{Invalidator, QueryExecutor, QueryOutput, WriteResult, is_read, run_write};
use crate::Error;
use crate::store::row::{Row, read_rows};

/// Statement access inside a running transaction.
///
/// Reads bypass the query cache so they observe uncommitted changes. Writes
/// invalidate their target table as soon as they succeed, even if the
/// transaction is later rolled back.
pub struct TransactionScope<'a> {
    conn: &'a rusqlite::Connection,
    invalidator: &'a Invalidator,
}

impl TransactionScope<'_> {
    pub fn execute(&self, sql: &str, params: &[Value]) -> Result<QueryOutput, Error> {
        if is_read(sql) {
            let rows = read_rows(self.conn, sql, params)?;
            Ok(QueryOutput::Rows(Arc::new(rows)))
        } else {
            let result = run_write(self.conn, sql, params)?;
            self.invalidator.after_write(sql);
            Ok(QueryOutput::Write(result))
        }
    }

    pub fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, Error> {
        match self.execute(sql, params)? {
            QueryOutput::Rows(rows) => Ok(Arc::unwrap_or_clone(rows)),
            QueryOutput::Write(_) => Err(Error::InvalidInput("expected a SELECT statement".into())),
        }
    }

    pub fn run(&self, sql: &str, params: &[Value]) -> Result<WriteResult, Error> {
        match self.execute(sql, params)? {
            QueryOutput::Write(result) => Ok(result),
            QueryOutput::Rows(_) => Err(Error::InvalidInput("expected a non-SELECT statement".into())),
        }
    }
}

fn rollback(conn: &rusqlite::Connection) {
    if let Err(e) = conn.execute_batch("ROLLBACK") {
        tracing::error!(error = %e, "rollback failed");
    }
}

impl QueryExecutor {
    /// Run `work` atomically.
    ///
    /// Commits when `work` succeeds. When it fails the transaction is rolled
    /// back and the original error is returned unchanged; a failing rollback
    /// is logged and never replaces that error. A failing commit is rolled
    /// back and reported.
    pub async fn run_in_transaction<T, F>(&self, work: F) -> Result<T, Error>
    where
        F: FnOnce(&TransactionScope<'_>) -> Result<T, Error> + Send + 'static,
        T: Send + 'static,
    {
        let invalidator = self.invalidator.clone();
        self.store
            .conn
            .call(move |conn| -> Result<T, Error> {
                conn.execute_batch("BEGIN TRANSACTION")?;

                let scope = TransactionScope { conn, invalidator: &invalidator };
                match work(&scope) {
                    Ok(value) => match conn.execute_batch("COMMIT") {
                        Ok(()) => Ok(value),
                        Err(e) => {
                            rollback(conn);
                            Err(e.into())
                        }
                    },
                    Err(err) => {
                        tracing::debug!(error = %err, "unit of work failed; rolling back");
                        rollback(conn);
                        Err(err)
                    }
                }
            })
            .await
            .map_err(Error::from)
    }
}
