use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use sqlx::AnyConnection;
use sqlx::any::{Any, AnyArguments, AnyQueryResult};
use sqlx::query::Query;
use sqlx::Row;
use sqlx_conn_mgr::{Database, DatabaseConfig};
use tracing::{debug, trace};

use crate::context::QueryContext;
use crate::decode::{decode_row, decode_rows};
use crate::prepared::PreparedStatement;
use crate::transactions::TransactionScope;
use crate::{Error, Result};

/// Result returned from write operations (e.g. INSERT, UPDATE, DELETE).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteQueryResult {
   /// The number of rows affected by the write operation.
   pub rows_affected: u64,
   /// The generated key of the last inserted row, as reported by the driver.
   ///
   /// Not every backend reports this through the `Any` driver; use
   /// [`DatabaseWrapper::insert`] when the key is required.
   pub last_insert_id: Option<i64>,
}

impl From<AnyQueryResult> for WriteQueryResult {
   fn from(result: AnyQueryResult) -> Self {
      Self {
         rows_affected: result.rows_affected(),
         last_insert_id: result.last_insert_id(),
      }
   }
}

/// Statement in a transaction with query and bind values
#[derive(Debug, Clone)]
pub struct Statement {
   pub query: String,
   pub values: Vec<JsonValue>,
}

impl Statement {
   pub fn new(query: impl Into<String>, values: Vec<JsonValue>) -> Self {
      Self {
         query: query.into(),
         values,
      }
   }
}

/// Parameterized access to a pooled [`Database`].
///
/// Values are always bound positionally (`?`), never spliced into the SQL text.
#[derive(Clone)]
pub struct DatabaseWrapper {
   inner: Arc<Database>,
}

impl DatabaseWrapper {
   /// Connect to the database at `url` via the connection manager
   pub async fn connect(url: &str, custom_config: Option<DatabaseConfig>) -> Result<Self> {
      let db = Database::connect(url, custom_config).await?;
      Ok(Self { inner: db })
   }

   /// Wrap an already connected database.
   pub fn from_database(db: Arc<Database>) -> Self {
      Self { inner: db }
   }

   pub fn inner(&self) -> &Arc<Database> {
      &self.inner
   }

   /// Execute a write query (INSERT/UPDATE/DELETE)
   pub async fn execute(
      &self,
      ctx: &QueryContext,
      query: &str,
      values: Vec<JsonValue>,
   ) -> Result<WriteQueryResult> {
      let pool = self.inner.pool()?;
      trace!("execute: {}", query);

      let mut q = sqlx::query(query);
      for value in values {
         q = bind_value(q, value);
      }

      ctx.run(async move { Ok::<_, Error>(WriteQueryResult::from(q.execute(pool).await?)) })
         .await
   }

   /// Execute an INSERT and return the key generated for the new row.
   ///
   /// The statement and the key lookup share one connection, so the key
   /// belongs to this insert even under concurrency.
   pub async fn insert(
      &self,
      ctx: &QueryContext,
      query: &str,
      values: Vec<JsonValue>,
   ) -> Result<i64> {
      let pool = self.inner.pool()?;
      trace!("insert: {}", query);

      let mut q = sqlx::query(query);
      for value in values {
         q = bind_value(q, value);
      }

      ctx.run(async move {
         let mut conn = pool.acquire().await?;
         let result = q.execute(&mut *conn).await?;
         last_insert_id(&mut conn, &result).await
      })
      .await
   }

   /// Execute a SELECT query, possibly returning multiple rows
   pub async fn fetch_all(
      &self,
      ctx: &QueryContext,
      query: &str,
      values: Vec<JsonValue>,
   ) -> Result<Vec<IndexMap<String, JsonValue>>> {
      let pool = self.inner.pool()?;
      trace!("fetch_all: {}", query);

      let mut q = sqlx::query(query);
      for value in values {
         q = bind_value(q, value);
      }

      let rows = ctx
         .run(async move { Ok::<_, Error>(q.fetch_all(pool).await?) })
         .await?;

      decode_rows(rows)
   }

   /// Execute a SELECT query expecting zero or one result
   pub async fn fetch_one(
      &self,
      ctx: &QueryContext,
      query: &str,
      values: Vec<JsonValue>,
   ) -> Result<Option<IndexMap<String, JsonValue>>> {
      let pool = self.inner.pool()?;

      // Add LIMIT 2 to detect if query returns multiple rows
      // We only need to fetch up to 2 rows to know if there's more than 1
      let limited_query = format!("{} LIMIT 2", query.trim().trim_end_matches(';'));
      trace!("fetch_one: {}", limited_query);

      let mut q = sqlx::query(&limited_query);
      for value in values {
         q = bind_value(q, value);
      }

      let rows = ctx
         .run(async move { Ok::<_, Error>(q.fetch_all(pool).await?) })
         .await?;

      match rows.as_slice() {
         [] => Ok(None),
         [row] => Ok(Some(decode_row(row)?)),
         _ => Err(Error::MultipleRowsReturned(rows.len())),
      }
   }

   /// Execute multiple write statements atomically within a transaction.
   ///
   /// This method:
   /// 1. Begins a transaction
   /// 2. Executes all statements in order
   /// 3. Commits on success
   /// 4. Rolls back on any error
   ///
   /// Returns the result of each statement execution.
   pub async fn execute_transaction(
      &self,
      ctx: &QueryContext,
      statements: Vec<Statement>,
   ) -> Result<Vec<WriteQueryResult>> {
      let pool = self.inner.pool()?;

      ctx.run(async move {
         let mut tx = pool.begin().await?;

         // Execute all statements, collecting results and rolling back on error
         let result = execute_statements(&mut tx, statements).await;

         match result {
            Ok(results) => {
               tx.commit().await?;
               debug!("Transaction committed ({} statements)", results.len());
               Ok(results)
            }
            Err(e) => {
               match tx.rollback().await {
                  // Rollback succeeded, return original error
                  Ok(()) => {
                     debug!("Transaction rolled back: {}", e);
                     Err(e)
                  }

                  // Rollback also failed, return the rollback error and the original error
                  Err(rollback_err) => Err(Error::TransactionRollbackFailed {
                     transaction_error: e.to_string(),
                     rollback_error: rollback_err.to_string(),
                  }),
               }
            }
         }
      })
      .await
   }

   /// Begin a transaction the caller drives statement by statement.
   ///
   /// The caller must commit or roll back; dropping the scope rolls back.
   pub async fn begin(&self, ctx: &QueryContext) -> Result<TransactionScope> {
      let pool = self.inner.pool()?;
      let tx = ctx
         .run(async move { Ok::<_, Error>(pool.begin().await?) })
         .await?;

      Ok(TransactionScope::new(self.inner.target().to_string(), tx))
   }

   /// Prepare `query` once on a dedicated connection for repeated execution.
   pub async fn prepare(&self, ctx: &QueryContext, query: &str) -> Result<PreparedStatement> {
      let pool = self.inner.pool()?;
      ctx.run(PreparedStatement::prepare(pool, query)).await
   }

   /// Close the database connection
   pub async fn close(self) -> Result<()> {
      self.inner.close().await?;
      Ok(())
   }
}

/// Run `statements` in order on `conn`, stopping at the first failure.
pub(crate) async fn execute_statements(
   conn: &mut AnyConnection,
   statements: Vec<Statement>,
) -> Result<Vec<WriteQueryResult>> {
   let mut results = Vec::with_capacity(statements.len());
   for statement in statements {
      let mut q = sqlx::query(&statement.query);
      for value in statement.values {
         q = bind_value(q, value);
      }
      results.push(WriteQueryResult::from(q.execute(&mut *conn).await?));
   }
   Ok(results)
}

/// Generated key for the row inserted by `result` on `conn`.
///
/// Uses the key reported by the driver when there is one. Otherwise the same
/// connection is asked for its last generated key, which is only meaningful
/// immediately after the insert.
pub async fn last_insert_id(conn: &mut AnyConnection, result: &AnyQueryResult) -> Result<i64> {
   if let Some(id) = result.last_insert_id() {
      return Ok(id);
   }

   let sql = if conn.backend_name().eq_ignore_ascii_case("sqlite") {
      "SELECT last_insert_rowid()"
   } else {
      "SELECT CAST(LAST_INSERT_ID() AS SIGNED)"
   };

   let row = sqlx::query(sql).fetch_one(&mut *conn).await?;
   Ok(row.try_get::<i64, _>(0)?)
}

/// Helper function to bind a JSON value to a SQLx query
pub(crate) fn bind_value<'a>(
   query: Query<'a, Any, AnyArguments<'a>>,
   value: JsonValue,
) -> Query<'a, Any, AnyArguments<'a>> {
   match value {
      JsonValue::Null => query.bind(None::<String>),
      JsonValue::Bool(b) => query.bind(b),
      JsonValue::Number(number) => {
         // Preserve integer precision by binding as i64 when possible
         if let Some(int_val) = number.as_i64() {
            query.bind(int_val)
         } else {
            // Not an integer or too large for i64, bind as f64 (may lose precision)
            query.bind(number.as_f64().unwrap_or_default())
         }
      }
      JsonValue::String(s) => query.bind(s),
      // Arrays and objects are stored as their JSON text
      other => query.bind(other.to_string()),
   }
}
