//! # sqlx-comments
//!
//! Comment storage on top of a pooled SQLx connection.
//!
//! The workspace is split the same way the storage stack is layered:
//!
//! - [`sqlx_conn_mgr`] opens the pool (MySQL in production, any SQLx `Any`
//!   URL otherwise) and owns its limits.
//! - [`sqlx_toolkit`] supplies [`QueryContext`] for deadlines and
//!   cancellation, plus lower-level query helpers.
//! - This crate defines the [`Comment`] entity and the [`CommentRepository`]
//!   trait with SQL and in-memory implementations.
//!
//! ```no_run
//! use std::time::Duration;
//! use sqlx_comments::{
//!    Comment, CommentRepository, ConnectionSettings, Database, QueryContext,
//!    SqlCommentRepository,
//! };
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect_mysql(&ConnectionSettings::from_env()?, None).await?;
//! let repo = SqlCommentRepository::new(db);
//!
//! let ctx = QueryContext::with_timeout(Duration::from_secs(5));
//! let saved = repo.insert(&ctx, Comment::new("a@x.com", "hi")).await?;
//! let found = repo.find_by_id(&ctx, saved.id).await?;
//! assert_eq!(found, saved);
//! # Ok(())
//! # }
//! ```

mod entity;
mod error;
mod memory;
mod repository;
mod sql;

pub use entity::Comment;
pub use error::{Error, Result};
pub use memory::InMemoryCommentRepository;
pub use repository::CommentRepository;
pub use sql::SqlCommentRepository;

// Re-export the pieces callers need to build a repository
pub use sqlx_conn_mgr::{ConnectionSettings, Database, DatabaseConfig};
pub use sqlx_toolkit::QueryContext;
