//! Deadlines and cancellation for database calls
//!
//! Every storage-facing call in this workspace takes a [`QueryContext`]. The
//! context wraps the driver future, so when the caller cancels or the deadline
//! passes the future is dropped and SQLx abandons the in-flight statement.
//!
//! ```no_run
//! use std::time::Duration;
//! use sqlx_toolkit::QueryContext;
//!
//! # async fn demo() -> sqlx_toolkit::Result<()> {
//! let ctx = QueryContext::with_timeout(Duration::from_secs(2));
//! let answer = ctx.run(async { Ok(42) }).await?;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, timeout_at};
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Deadline and cancellation signal carried into every database call.
///
/// Cloning shares the same cancellation token; use [`child`](Self::child) for
/// a context that can be cancelled on its own without affecting the parent.
#[derive(Debug, Clone)]
pub struct QueryContext {
   deadline: Option<Instant>,
   token: CancellationToken,
}

impl Default for QueryContext {
   fn default() -> Self {
      Self::background()
   }
}

impl QueryContext {
   /// A context with no deadline that is only cancelled explicitly.
   pub fn background() -> Self {
      Self {
         deadline: None,
         token: CancellationToken::new(),
      }
   }

   /// A context that expires `timeout` from now.
   pub fn with_timeout(timeout: Duration) -> Self {
      Self::with_deadline(Instant::now() + timeout)
   }

   /// A context that expires at `deadline`.
   pub fn with_deadline(deadline: Instant) -> Self {
      Self {
         deadline: Some(deadline),
         token: CancellationToken::new(),
      }
   }

   /// Derive a context that is cancelled along with this one.
   pub fn child(&self) -> Self {
      Self {
         deadline: self.deadline,
         token: self.token.child_token(),
      }
   }

   /// Derive a child whose deadline is the earlier of the parent's and `timeout` from now.
   pub fn child_with_timeout(&self, timeout: Duration) -> Self {
      let own = Instant::now() + timeout;
      let deadline = match self.deadline {
         Some(parent) => parent.min(own),
         None => own,
      };

      Self {
         deadline: Some(deadline),
         token: self.token.child_token(),
      }
   }

   pub fn cancel(&self) {
      self.token.cancel();
   }

   pub fn is_cancelled(&self) -> bool {
      self.token.is_cancelled()
   }

   pub fn deadline(&self) -> Option<Instant> {
      self.deadline
   }

   /// Token observed by [`run`](Self::run), for wiring into other tasks.
   pub fn cancellation_token(&self) -> &CancellationToken {
      &self.token
   }

   /// Fail if the context is already cancelled or past its deadline.
   ///
   /// For work that never awaits the database, such as in-memory fakes.
   pub fn check(&self) -> Result<()> {
      if self.token.is_cancelled() {
         return Err(Error::Cancelled);
      }

      if let Some(deadline) = self.deadline
         && Instant::now() >= deadline
      {
         return Err(Error::DeadlineExceeded);
      }

      Ok(())
   }

   /// Drive `fut` to completion unless the context is cancelled or expires first.
   ///
   /// A context that is already cancelled or expired never polls `fut`.
   pub async fn run<T, F>(&self, fut: F) -> Result<T>
   where
      F: Future<Output = Result<T>>,
   {
      self.check()?;

      let deadline = self.deadline;
      let guarded = async move {
         match deadline {
            Some(deadline) => match timeout_at(deadline, fut).await {
               Ok(result) => result,
               Err(_) => Err(Error::DeadlineExceeded),
            },
            None => fut.await,
         }
      };

      tokio::select! {
         biased;
         _ = self.token.cancelled() => Err(Error::Cancelled),
         result = guarded => result,
      }
   }
}
