//! Error types for sqlx-conn-mgr

use thiserror::Error;

/// Errors that may occur when working with sqlx-conn-mgr
#[derive(Error, Debug)]
pub enum Error {
   /// Error from the sqlx library. Standard sqlx errors are converted to this variant
   #[error("Sqlx error: {0}")]
   Sqlx(#[from] sqlx::Error),

   /// Pool limits or connection settings that cannot be used
   #[error("Invalid configuration: {0}")]
   Config(String),

   /// Database has been closed and cannot be used
   #[error("Database has been closed")]
   DatabaseClosed,
}

/// A type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
