//! Caller-driven transactions

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use sqlx::Transaction;
use sqlx::any::Any;
use tracing::debug;
use uuid::Uuid;

use crate::context::QueryContext;
use crate::decode::decode_rows;
use crate::wrapper::{WriteQueryResult, bind_value};
use crate::{Error, Result};

/// An open transaction holding one pooled connection until it is finalized.
///
/// Every exit path must end in [`commit`](Self::commit) or
/// [`rollback`](Self::rollback). A scope that is dropped instead (early
/// return, `?`, cancelled future) is rolled back when its connection goes
/// back to the pool.
#[must_use = "if unused, the transaction is immediately rolled back"]
pub struct TransactionScope {
   id: Uuid,
   target: String,
   tx: Option<Transaction<'static, Any>>,
}

impl TransactionScope {
   pub(crate) fn new(target: String, tx: Transaction<'static, Any>) -> Self {
      let id = Uuid::new_v4();
      debug!("Transaction {} started for {}", id, target);

      Self {
         id,
         target,
         tx: Some(tx),
      }
   }

   /// Identifier used in trace output for this transaction.
   pub fn id(&self) -> Uuid {
      self.id
   }

   fn tx(&mut self) -> Result<&mut Transaction<'static, Any>> {
      self.tx.as_mut().ok_or(Error::TransactionAlreadyFinalized)
   }

   /// Execute a write statement inside this transaction
   pub async fn execute(
      &mut self,
      ctx: &QueryContext,
      query: &str,
      values: Vec<JsonValue>,
   ) -> Result<WriteQueryResult> {
      let tx = self.tx()?;

      let mut q = sqlx::query(query);
      for value in values {
         q = bind_value(q, value);
      }

      ctx.run(async move { Ok::<_, Error>(WriteQueryResult::from(q.execute(&mut **tx).await?)) })
         .await
   }

   /// Execute a read query inside this transaction and return decoded results.
   ///
   /// Sees this transaction's own uncommitted writes.
   pub async fn fetch_all(
      &mut self,
      ctx: &QueryContext,
      query: &str,
      values: Vec<JsonValue>,
   ) -> Result<Vec<IndexMap<String, JsonValue>>> {
      let tx = self.tx()?;

      let mut q = sqlx::query(query);
      for value in values {
         q = bind_value(q, value);
      }

      let rows = ctx
         .run(async move { Ok::<_, Error>(q.fetch_all(&mut **tx).await?) })
         .await?;

      decode_rows(rows)
   }

   /// Commit this transaction
   pub async fn commit(mut self, ctx: &QueryContext) -> Result<()> {
      let tx = self.tx.take().ok_or(Error::TransactionAlreadyFinalized)?;
      ctx.run(async move { Ok::<_, Error>(tx.commit().await?) }).await?;
      debug!("Transaction {} committed for {}", self.id, self.target);
      Ok(())
   }

   /// Rollback this transaction
   pub async fn rollback(mut self, ctx: &QueryContext) -> Result<()> {
      let tx = self.tx.take().ok_or(Error::TransactionAlreadyFinalized)?;
      ctx.run(async move { Ok::<_, Error>(tx.rollback().await?) }).await?;
      debug!("Transaction {} rolled back for {}", self.id, self.target);
      Ok(())
   }
}

impl Drop for TransactionScope {
   fn drop(&mut self) {
      // SQLx rolls the transaction back when the connection is returned to
      // the pool without an explicit COMMIT.
      if self.tx.is_some() {
         debug!(
            "Dropping transaction {} for {} (will auto-rollback)",
            self.id, self.target
         );
      }
   }
}
