//! SQL-backed comment storage

use std::sync::Arc;

use sqlx_conn_mgr::Database;
use sqlx_toolkit::{QueryContext, last_insert_id};
use tracing::trace;

use crate::{Comment, CommentRepository, Error, Result};

const INSERT_COMMENT: &str = "INSERT INTO comments(email, comment) VALUES (?, ?)";
const FIND_COMMENT_BY_ID: &str = "SELECT id, email, comment FROM comments WHERE id = ? LIMIT 1";
const FIND_ALL_COMMENTS: &str = "SELECT id, email, comment FROM comments";

/// [`CommentRepository`] over the `comments` table of a pooled [`Database`].
///
/// Cloning shares the pool.
#[derive(Debug, Clone)]
pub struct SqlCommentRepository {
   db: Arc<Database>,
}

impl SqlCommentRepository {
   pub fn new(db: Arc<Database>) -> Self {
      Self { db }
   }

   pub fn database(&self) -> &Arc<Database> {
      &self.db
   }
}

impl CommentRepository for SqlCommentRepository {
   async fn insert(&self, ctx: &QueryContext, comment: Comment) -> Result<Comment> {
      let id = ctx
         .run(async {
            let pool = self.db.pool()?;

            // Key lookup must happen on the connection that ran the insert
            let mut conn = pool.acquire().await?;
            let result = sqlx::query(INSERT_COMMENT)
               .bind(comment.email.as_str())
               .bind(comment.comment.as_str())
               .execute(&mut *conn)
               .await?;

            last_insert_id(&mut conn, &result).await
         })
         .await?;

      let id = i32::try_from(id).map_err(|_| Error::IdOutOfRange(id))?;
      trace!("inserted comment {}", id);

      Ok(Comment { id, ..comment })
   }

   async fn find_by_id(&self, ctx: &QueryContext, id: i32) -> Result<Comment> {
      let found = ctx
         .run(async {
            let pool = self.db.pool()?;
            let row = sqlx::query_as::<_, Comment>(FIND_COMMENT_BY_ID)
               .bind(id)
               .fetch_optional(pool)
               .await?;
            Ok::<_, sqlx_toolkit::Error>(row)
         })
         .await?;

      found.ok_or(Error::NotFound { id })
   }

   async fn find_all(&self, ctx: &QueryContext) -> Result<Vec<Comment>> {
      let comments = ctx
         .run(async {
            let pool = self.db.pool()?;
            let rows = sqlx::query_as::<_, Comment>(FIND_ALL_COMMENTS)
               .fetch_all(pool)
               .await?;
            Ok::<_, sqlx_toolkit::Error>(rows)
         })
         .await?;

      trace!("loaded {} comments", comments.len());
      Ok(comments)
   }
}
