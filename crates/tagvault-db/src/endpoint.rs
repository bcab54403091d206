//! `SQLite` implementation of the replica endpoint port.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, Sqlite, SqlitePool, TypeInfo, ValueRef};
use tagvault_core::{ConnectionProfile, DbRow, DbValue, EndpointError, ReplicaEndpoint};
use tracing::debug;

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// SQLite primary result codes that mean the database file itself is out of
/// reach (`SQLITE_IOERR`, `SQLITE_CANTOPEN`).
const UNREACHABLE_CODES: [i64; 2] = [10, 14];

/// One replica backed by a lazily connected `SQLite` pool.
///
/// Connecting is deferred to the first statement so an offline replica never
/// blocks startup; it shows up as an unreachable attempt instead.
#[derive(Debug, Clone)]
pub struct SqliteReplicaEndpoint {
    name: String,
    pool: SqlitePool,
}

impl SqliteReplicaEndpoint {
    /// Build an endpoint from a profile without touching the database.
    ///
    /// The database file is never created here; a missing file is an
    /// unreachable replica, not an empty one.
    pub fn connect_lazy(profile: &ConnectionProfile) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(&profile.url)?.create_if_missing(false);
        let pool = SqlitePoolOptions::new()
            .max_connections(profile.max_connections)
            .acquire_timeout(Duration::from_millis(profile.connect_timeout_ms))
            .connect_lazy_with(options);
        Ok(Self {
            name: profile.name.clone(),
            pool,
        })
    }

    /// Wrap an existing pool.
    pub fn from_pool(name: impl Into<String>, pool: SqlitePool) -> Self {
        Self {
            name: name.into(),
            pool,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ReplicaEndpoint for SqliteReplicaEndpoint {
    async fn fetch(&self, sql: &str, params: &[DbValue]) -> Result<Vec<DbRow>, EndpointError> {
        let rows = bind_all(sqlx::query(sql), params)
            .fetch_all(&self.pool)
            .await
            .map_err(classify)?;
        debug!(profile = %self.name, rows = rows.len(), "Fetched rows");
        rows.iter().map(convert_row).collect()
    }

    async fn execute(&self, sql: &str, params: &[DbValue]) -> Result<u64, EndpointError> {
        let affected = bind_all(sqlx::query(sql), params)
            .execute(&self.pool)
            .await
            .map_err(classify)?
            .rows_affected();
        debug!(profile = %self.name, affected, "Executed statement");
        Ok(affected)
    }
}

fn bind_all<'q>(mut query: SqliteQuery<'q>, params: &[DbValue]) -> SqliteQuery<'q> {
    for value in params {
        query = match value {
            DbValue::Null => query.bind(None::<String>),
            DbValue::Integer(v) => query.bind(*v),
            DbValue::Real(v) => query.bind(*v),
            DbValue::Text(v) => query.bind(v.clone()),
            DbValue::Blob(v) => query.bind(v.clone()),
        };
    }
    query
}

/// Split driver errors into "replica unreachable" and "statement failed".
pub fn classify(err: sqlx::Error) -> EndpointError {
    let unreachable = match &err {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db) => db
            .code()
            .and_then(|code| code.parse::<i64>().ok())
            .is_some_and(|code| UNREACHABLE_CODES.contains(&(code & 0xff))),
        _ => false,
    };
    if unreachable {
        EndpointError::Unreachable(err.to_string())
    } else {
        EndpointError::Statement(err.to_string())
    }
}

fn column_error(column: &str, err: &sqlx::Error) -> EndpointError {
    EndpointError::Statement(format!("column {column}: {err}"))
}

/// Convert a driver row into a port row using each value's storage class.
fn convert_row(row: &SqliteRow) -> Result<DbRow, EndpointError> {
    let mut out = DbRow::new();
    for (index, column) in row.columns().iter().enumerate() {
        let name = column.name();
        let raw = row.try_get_raw(index).map_err(|e| column_error(name, &e))?;
        let value = if raw.is_null() {
            DbValue::Null
        } else {
            let storage = raw.type_info().name().to_ascii_uppercase();
            match storage.as_str() {
                "INTEGER" | "BOOLEAN" => DbValue::Integer(
                    row.try_get::<i64, _>(index)
                        .map_err(|e| column_error(name, &e))?,
                ),
                "REAL" => DbValue::Real(
                    row.try_get::<f64, _>(index)
                        .map_err(|e| column_error(name, &e))?,
                ),
                "BLOB" => DbValue::Blob(
                    row.try_get::<Vec<u8>, _>(index)
                        .map_err(|e| column_error(name, &e))?,
                ),
                _ => DbValue::Text(
                    row.try_get_unchecked::<String, _>(index)
                        .map_err(|e| column_error(name, &e))?,
                ),
            }
        };
        out.push(name, value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Executor;

    async fn memory_endpoint() -> SqliteReplicaEndpoint {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        pool.execute("CREATE TABLE t (i INTEGER, r REAL, s TEXT, b BLOB)")
            .await
            .unwrap();
        SqliteReplicaEndpoint::from_pool("memory", pool)
    }

    #[tokio::test]
    async fn test_round_trips_every_value_kind() {
        let endpoint = memory_endpoint().await;
        let affected = endpoint
            .execute(
                "INSERT INTO t (i, r, s, b) VALUES (?1, ?2, ?3, ?4)",
                &[
                    DbValue::Integer(7),
                    DbValue::Real(1.5),
                    DbValue::Text("KXYZ".to_string()),
                    DbValue::Blob(vec![1, 2]),
                ],
            )
            .await
            .unwrap();
        assert_eq!(affected, 1);
        endpoint
            .execute("INSERT INTO t (i) VALUES (?1)", &[DbValue::Null])
            .await
            .unwrap();

        let rows = endpoint
            .fetch("SELECT i, r, s, b FROM t ORDER BY rowid", &[])
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].integer("i"), Some(7));
        assert_eq!(rows[0].get("r"), Some(&DbValue::Real(1.5)));
        assert_eq!(rows[0].text("S"), Some("KXYZ"));
        assert_eq!(rows[0].get("b"), Some(&DbValue::Blob(vec![1, 2])));
        assert!(rows[1].get("i").is_some_and(DbValue::is_null));
    }

    #[tokio::test]
    async fn test_statement_errors_are_not_connectivity() {
        let endpoint = memory_endpoint().await;
        let err = endpoint.fetch("SELECT * FROM missing_table", &[]).await.unwrap_err();
        assert!(matches!(err, EndpointError::Statement(_)));
    }

    #[tokio::test]
    async fn test_missing_database_file_is_unreachable() {
        let dir = tempfile::TempDir::new().unwrap();
        let url = format!("sqlite://{}", dir.path().join("offline/replica.db").display());
        let endpoint =
            SqliteReplicaEndpoint::connect_lazy(&ConnectionProfile::new("offline", url)).unwrap();

        let err = endpoint.execute("SELECT 1", &[]).await.unwrap_err();
        assert!(matches!(err, EndpointError::Unreachable(_)), "{err:?}");
    }
}
