//! In-process comment storage for tests and tools without a database

use parking_lot::Mutex;
use sqlx_toolkit::QueryContext;

use crate::{Comment, CommentRepository, Error, Result};

#[derive(Debug)]
struct State {
   comments: Vec<Comment>,
   next_id: i64,
}

/// [`CommentRepository`] that keeps comments in memory.
///
/// Ids start at 1 and increase by one per insert, like an auto-increment column.
#[derive(Debug)]
pub struct InMemoryCommentRepository {
   state: Mutex<State>,
}

impl Default for InMemoryCommentRepository {
   fn default() -> Self {
      Self::new()
   }
}

impl InMemoryCommentRepository {
   pub fn new() -> Self {
      Self {
         state: Mutex::new(State {
            comments: Vec::new(),
            next_id: 1,
         }),
      }
   }

   pub fn len(&self) -> usize {
      self.state.lock().comments.len()
   }

   pub fn is_empty(&self) -> bool {
      self.len() == 0
   }
}

impl CommentRepository for InMemoryCommentRepository {
   async fn insert(&self, ctx: &QueryContext, comment: Comment) -> Result<Comment> {
      ctx.check()?;

      let mut state = self.state.lock();
      let next = state.next_id;
      let id = i32::try_from(next).map_err(|_| Error::IdOutOfRange(next))?;
      state.next_id += 1;

      let stored = Comment { id, ..comment };
      state.comments.push(stored.clone());
      Ok(stored)
   }

   async fn find_by_id(&self, ctx: &QueryContext, id: i32) -> Result<Comment> {
      ctx.check()?;

      self
         .state
         .lock()
         .comments
         .iter()
         .find(|c| c.id == id)
         .cloned()
         .ok_or(Error::NotFound { id })
   }

   async fn find_all(&self, ctx: &QueryContext) -> Result<Vec<Comment>> {
      ctx.check()?;
      Ok(self.state.lock().comments.clone())
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[tokio::test]
   async fn test_ids_increase_from_one() {
      let repo = InMemoryCommentRepository::new();
      let ctx = QueryContext::background();

      let first = repo.insert(&ctx, Comment::new("a@x.com", "hi")).await.unwrap();
      let second = repo.insert(&ctx, Comment::new("b@x.com", "yo")).await.unwrap();

      assert_eq!(first.id, 1);
      assert_eq!(second.id, 2);
      assert_eq!(repo.len(), 2);
   }

   #[tokio::test]
   async fn test_supplied_id_is_ignored() {
      let repo = InMemoryCommentRepository::new();
      let ctx = QueryContext::background();

      let stored = repo
         .insert(
            &ctx,
            Comment {
               id: 42,
               ..Comment::new("a@x.com", "hi")
            },
         )
         .await
         .unwrap();

      assert_eq!(stored.id, 1);
      assert!(repo.find_by_id(&ctx, 42).await.unwrap_err().is_not_found());
   }

   #[tokio::test]
   async fn test_exhausted_ids_are_rejected() {
      let repo = InMemoryCommentRepository::new();
      repo.state.lock().next_id = i64::from(i32::MAX) + 1;

      let err = repo
         .insert(&QueryContext::background(), Comment::new("a@x.com", "hi"))
         .await
         .unwrap_err();

      assert!(matches!(err, Error::IdOutOfRange(_)));
      assert!(repo.is_empty());
   }

   #[tokio::test]
   async fn test_cancelled_context_stores_nothing() {
      let repo = InMemoryCommentRepository::new();
      let ctx = QueryContext::background();
      ctx.cancel();

      let err = repo.insert(&ctx, Comment::new("a@x.com", "hi")).await.unwrap_err();

      assert!(err.is_interrupted());
      assert!(repo.is_empty());
   }
}
