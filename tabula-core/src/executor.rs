//! Statement execution interface and the bundled SQLite executor

use crate::{Error, Result, Row, Statement, Value};
use std::future::Future;

/// Anything that can run `?`-parameterized SQL.
///
/// Pools, single connections and transactions all qualify. Builders only
/// ever borrow an executor, so the same handle can be passed to several
/// operations (for example every statement of one transaction).
pub trait Executor: Send + Sync {
    /// Failure type surfaced by the underlying driver
    type Error: std::error::Error + Send + Sync + 'static;

    /// Run a statement that returns no rows (INSERT, UPDATE, DELETE, DDL)
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = std::result::Result<ExecResult, Self::Error>> + Send;

    /// Run a statement that returns rows
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = std::result::Result<Vec<Row>, Self::Error>> + Send;
}

/// Metadata returned by a write statement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub last_insert_id: i64,
    pub rows_affected: u64,
}

pub(crate) async fn execute_statement<X>(
    executor: &X,
    operation: &'static str,
    table: &str,
    statement: &Statement,
) -> Result<ExecResult>
where
    X: Executor,
{
    tracing::debug!(
        target: "tabula::sql",
        sql = %statement.sql,
        params = statement.args.len(),
        "execute"
    );
    executor
        .execute(&statement.sql, &statement.args)
        .await
        .map_err(|e| wrap_failure(operation, table, e))
}

pub(crate) async fn fetch_rows<X>(
    executor: &X,
    operation: &'static str,
    table: &str,
    statement: &Statement,
) -> Result<Vec<Row>>
where
    X: Executor,
{
    tracing::debug!(
        target: "tabula::sql",
        sql = %statement.sql,
        params = statement.args.len(),
        "query"
    );
    executor
        .query(&statement.sql, &statement.args)
        .await
        .map_err(|e| wrap_failure(operation, table, e))
}

fn wrap_failure<E>(operation: &'static str, table: &str, error: E) -> Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    tracing::debug!(operation, table, error = %error, "statement failed");
    Error::execution(operation, table, error)
}

/// SQLite executor backed by sqlx
#[cfg(feature = "sqlite")]
pub mod sqlite {
    use super::{ExecResult, Executor};
    use crate::{Result, Row, Value};
    use sqlx::sqlite::{SqliteArguments, SqlitePoolOptions, SqliteQueryResult, SqliteRow};
    use sqlx::{Column, Row as _, Sqlite, TypeInfo, ValueRef};
    use tokio::sync::Mutex;

    /// Connection settings for [`SqlitePool`]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SqliteConfig {
        pub url: String,
        pub max_connections: u32,
    }

    impl Default for SqliteConfig {
        fn default() -> Self {
            Self {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
            }
        }
    }

    impl SqliteConfig {
        pub fn url(mut self, url: impl Into<String>) -> Self {
            self.url = url.into();
            self
        }

        pub fn max_connections(mut self, max_connections: u32) -> Self {
            self.max_connections = max_connections;
            self
        }

        fn is_memory(&self) -> bool {
            self.url.contains(":memory:") || self.url.contains("mode=memory")
        }
    }

    /// SQLite connection pool wrapper
    #[derive(Debug, Clone)]
    pub struct SqlitePool {
        inner: sqlx::SqlitePool,
    }

    impl SqlitePool {
        /// Connect with default settings to `url`
        pub async fn connect(url: &str) -> Result<Self> {
            Self::connect_with(&SqliteConfig::default().url(url)).await
        }

        pub async fn connect_with(config: &SqliteConfig) -> Result<Self> {
            let mut options = SqlitePoolOptions::new().max_connections(config.max_connections);
            if config.is_memory() {
                // an in-memory database lives only as long as its connection
                options = options.idle_timeout(None).max_lifetime(None);
            }
            let pool = options.connect(&config.url).await?;
            tracing::debug!(
                url = %config.url,
                max_connections = config.max_connections,
                "sqlite pool connected"
            );
            Ok(Self { inner: pool })
        }

        /// Create from an existing sqlx pool
        pub fn from_pool(pool: sqlx::SqlitePool) -> Self {
            Self { inner: pool }
        }

        pub fn inner(&self) -> &sqlx::SqlitePool {
            &self.inner
        }

        /// Start a transaction. Statements run through the returned handle
        /// take effect only once it is committed.
        pub async fn begin(&self) -> Result<SqliteTransaction> {
            let txn = self.inner.begin().await?;
            Ok(SqliteTransaction {
                inner: Mutex::new(txn),
            })
        }
    }

    impl Executor for SqlitePool {
        type Error = sqlx::Error;

        async fn execute(&self, sql: &str, params: &[Value]) -> sqlx::Result<ExecResult> {
            let result = bind_values(sqlx::query(sql), params)
                .execute(&self.inner)
                .await?;
            Ok(exec_result(&result))
        }

        async fn query(&self, sql: &str, params: &[Value]) -> sqlx::Result<Vec<Row>> {
            let rows = bind_values(sqlx::query(sql), params)
                .fetch_all(&self.inner)
                .await?;
            rows.iter().map(decode_row).collect()
        }
    }

    /// An open SQLite transaction.
    ///
    /// Dropping it without calling [`SqliteTransaction::commit`] rolls the
    /// transaction back.
    pub struct SqliteTransaction {
        inner: Mutex<sqlx::Transaction<'static, Sqlite>>,
    }

    impl std::fmt::Debug for SqliteTransaction {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("SqliteTransaction").finish_non_exhaustive()
        }
    }

    impl SqliteTransaction {
        pub async fn commit(self) -> Result<()> {
            self.inner.into_inner().commit().await?;
            Ok(())
        }

        pub async fn rollback(self) -> Result<()> {
            self.inner.into_inner().rollback().await?;
            Ok(())
        }
    }

    impl Executor for SqliteTransaction {
        type Error = sqlx::Error;

        async fn execute(&self, sql: &str, params: &[Value]) -> sqlx::Result<ExecResult> {
            let mut txn = self.inner.lock().await;
            let result = bind_values(sqlx::query(sql), params)
                .execute(&mut **txn)
                .await?;
            Ok(exec_result(&result))
        }

        async fn query(&self, sql: &str, params: &[Value]) -> sqlx::Result<Vec<Row>> {
            let mut txn = self.inner.lock().await;
            let rows = bind_values(sqlx::query(sql), params)
                .fetch_all(&mut **txn)
                .await?;
            rows.iter().map(decode_row).collect()
        }
    }

    fn exec_result(result: &SqliteQueryResult) -> ExecResult {
        ExecResult {
            last_insert_id: result.last_insert_rowid(),
            rows_affected: result.rows_affected(),
        }
    }

    /// Bind values to a sqlx query in placeholder order
    fn bind_values<'q>(
        mut query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
        params: &'q [Value],
    ) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
        for param in params {
            query = match param {
                Value::Null => query.bind(None::<i64>),
                Value::Bool(b) => query.bind(*b),
                Value::I32(i) => query.bind(*i),
                Value::I64(i) => query.bind(*i),
                Value::F32(f) => query.bind(*f),
                Value::F64(f) => query.bind(*f),
                Value::String(s) => query.bind(s.as_str()),
                Value::Bytes(b) => query.bind(b.as_slice()),
                Value::Json(j) => query.bind(j.to_string()),
            };
        }
        query
    }

    /// Convert a sqlx row by the storage class of each value
    fn decode_row(row: &SqliteRow) -> sqlx::Result<Row> {
        let mut columns = Vec::with_capacity(row.len());
        for (index, column) in row.columns().iter().enumerate() {
            let raw = row.try_get_raw(index)?;
            let value = if raw.is_null() {
                Value::Null
            } else {
                match raw.type_info().name() {
                    "INTEGER" | "BOOLEAN" => Value::I64(row.try_get_unchecked(index)?),
                    "REAL" => Value::F64(row.try_get_unchecked(index)?),
                    "BLOB" => Value::Bytes(row.try_get_unchecked(index)?),
                    _ => Value::String(row.try_get_unchecked(index)?),
                }
            };
            columns.push((column.name().to_string(), value));
        }
        Ok(Row::new(columns))
    }

    #[cfg(test)]
    mod sqlite_tests {
        use super::*;

        #[test]
        fn test_config_defaults() {
            let config = SqliteConfig::default();
            assert_eq!(config.url, "sqlite::memory:");
            assert_eq!(config.max_connections, 1);
            assert!(config.is_memory());

            let config = config.url("sqlite://todos.db").max_connections(4);
            assert!(!config.is_memory());
            assert_eq!(config.max_connections, 4);
        }

        #[tokio::test]
        async fn test_decodes_storage_classes() {
            let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
            let rows = pool
                .query(
                    "SELECT 1 AS i, 2.5 AS r, 'x' AS t, x'0102' AS b, NULL AS n, ? AS p",
                    &[Value::Bool(true)],
                )
                .await
                .unwrap();
            let row = &rows[0];
            assert_eq!(row.get_value("i"), Some(&Value::I64(1)));
            assert_eq!(row.get_value("r"), Some(&Value::F64(2.5)));
            assert_eq!(row.get_value("t"), Some(&Value::String("x".into())));
            assert_eq!(row.get_value("b"), Some(&Value::Bytes(vec![1, 2])));
            assert_eq!(row.get_value("n"), Some(&Value::Null));
            assert!(row.get::<bool>("p").unwrap());
        }

        #[tokio::test]
        async fn test_execute_reports_rowid() {
            let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
            pool.execute("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT)", &[])
                .await
                .unwrap();
            let result = pool
                .execute("INSERT INTO t (v) VALUES (?)", &[Value::from("a")])
                .await
                .unwrap();
            assert_eq!(
                result,
                ExecResult {
                    last_insert_id: 1,
                    rows_affected: 1
                }
            );
        }

        #[tokio::test]
        async fn test_driver_error_surfaces() {
            let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
            let err = pool.query("SELECT * FROM missing", &[]).await.unwrap_err();
            assert!(err.to_string().contains("missing"));
        }
    }
}

/// In-memory executor double that records every statement it is given
#[cfg(test)]
pub(crate) mod testing {
    use super::{ExecResult, Executor};
    use crate::{Row, Statement, Value};
    use std::sync::Mutex;

    #[derive(Debug, thiserror::Error)]
    #[error("mock executor failure")]
    pub(crate) struct MockFailure;

    #[derive(Default)]
    pub(crate) struct RecordingExecutor {
        statements: Mutex<Vec<Statement>>,
        rows: Vec<Row>,
        result: ExecResult,
        fail: bool,
    }

    impl RecordingExecutor {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn with_rows(rows: Vec<Row>) -> Self {
            Self {
                rows,
                ..Self::default()
            }
        }

        pub(crate) fn with_result(result: ExecResult) -> Self {
            Self {
                result,
                ..Self::default()
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub(crate) fn statements(&self) -> Vec<Statement> {
            self.statements.lock().unwrap().clone()
        }

        fn record(&self, sql: &str, params: &[Value]) -> Result<(), MockFailure> {
            self.statements.lock().unwrap().push(Statement {
                sql: sql.to_string(),
                args: params.to_vec(),
            });
            if self.fail {
                Err(MockFailure)
            } else {
                Ok(())
            }
        }
    }

    impl Executor for RecordingExecutor {
        type Error = MockFailure;

        async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecResult, MockFailure> {
            self.record(sql, params)?;
            Ok(self.result)
        }

        async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, MockFailure> {
            self.record(sql, params)?;
            Ok(self.rows.clone())
        }
    }
}
