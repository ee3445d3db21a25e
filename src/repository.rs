use std::future::Future;

use sqlx_toolkit::QueryContext;

use crate::{Comment, Result};

/// Storage for [`Comment`]s.
///
/// Every call takes the caller's [`QueryContext`]; cancelling it or letting its
/// deadline pass aborts the call with an interrupted error. Implementations
/// are shared across tasks, so they hold no per-call state.
pub trait CommentRepository: Send + Sync {
   /// Store `comment` and return it with the id storage assigned.
   ///
   /// Any id already on `comment` is ignored.
   fn insert(
      &self,
      ctx: &QueryContext,
      comment: Comment,
   ) -> impl Future<Output = Result<Comment>> + Send;

   /// Look up one comment, failing with [`Error::NotFound`](crate::Error::NotFound)
   /// when no row has `id`.
   fn find_by_id(&self, ctx: &QueryContext, id: i32) -> impl Future<Output = Result<Comment>> + Send;

   /// Every stored comment, in storage order. Empty storage yields an empty `Vec`.
   fn find_all(&self, ctx: &QueryContext) -> impl Future<Output = Result<Vec<Comment>>> + Send;
}
