//! Statements prepared once and executed many times

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use sqlx::AnyPool;
use sqlx::any::{Any, AnyStatement};
use sqlx::pool::PoolConnection;
use sqlx::Statement as _;
use tracing::trace;

use crate::context::QueryContext;
use crate::decode::decode_rows;
use crate::wrapper::{WriteQueryResult, bind_value, last_insert_id};
use crate::{Error, Result};

/// A server-side prepared statement pinned to one pooled connection.
///
/// Preparing parses the SQL once; each [`execute`](Self::execute) only sends
/// a new set of parameters. The connection stays checked out for as long as
/// the statement lives and returns to the pool when it is dropped.
pub struct PreparedStatement {
   conn: PoolConnection<Any>,
   statement: AnyStatement<'static>,
}

impl PreparedStatement {
   pub(crate) async fn prepare(pool: &AnyPool, query: &str) -> Result<Self> {
      let mut conn = pool.acquire().await?;
      let statement = sqlx::Executor::prepare(&mut *conn, query).await?.to_owned();
      trace!("prepared: {}", statement.sql());

      Ok(Self { conn, statement })
   }

   pub fn sql(&self) -> &str {
      self.statement.sql()
   }

   /// Execute the statement with a fresh set of bind values.
   pub async fn execute(
      &mut self,
      ctx: &QueryContext,
      values: Vec<JsonValue>,
   ) -> Result<WriteQueryResult> {
      let Self { conn, statement } = self;

      let mut q = statement.query();
      for value in values {
         q = bind_value(q, value);
      }

      ctx.run(async move { Ok::<_, Error>(WriteQueryResult::from(q.execute(&mut **conn).await?)) })
         .await
   }

   /// Execute an INSERT statement and return the key generated for the new row.
   pub async fn insert(&mut self, ctx: &QueryContext, values: Vec<JsonValue>) -> Result<i64> {
      let Self { conn, statement } = self;

      let mut q = statement.query();
      for value in values {
         q = bind_value(q, value);
      }

      ctx.run(async move {
         let result = q.execute(&mut **conn).await?;
         last_insert_id(conn, &result).await
      })
      .await
   }

   /// Run the statement as a query and return decoded rows.
   pub async fn fetch_all(
      &mut self,
      ctx: &QueryContext,
      values: Vec<JsonValue>,
   ) -> Result<Vec<IndexMap<String, JsonValue>>> {
      let Self { conn, statement } = self;

      let mut q = statement.query();
      for value in values {
         q = bind_value(q, value);
      }

      let rows = ctx
         .run(async move { Ok::<_, Error>(q.fetch_all(&mut **conn).await?) })
         .await?;

      decode_rows(rows)
   }
}
