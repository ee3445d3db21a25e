/// Result type alias for repository operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for repository operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// No comment is stored under the requested id.
   #[error("comment with id {id} not found")]
   NotFound { id: i32 },

   /// Storage generated a key that does not fit a comment id.
   #[error("generated id {0} is out of range for a comment id")]
   IdOutOfRange(i64),

   /// Error from the query toolkit, including cancellation and closed pools.
   #[error(transparent)]
   Toolkit(#[from] sqlx_toolkit::Error),

   /// Error from SQLx operations.
   #[error(transparent)]
   Sqlx(#[from] sqlx::Error),
}

impl Error {
   pub fn is_not_found(&self) -> bool {
      matches!(self, Error::NotFound { .. })
   }

   /// Whether the caller's context stopped the call.
   pub fn is_interrupted(&self) -> bool {
      matches!(self, Error::Toolkit(e) if e.is_interrupted())
   }

   /// Extract a structured error code from the error type.
   pub fn error_code(&self) -> String {
      match self {
         Error::NotFound { .. } => "NOT_FOUND".to_string(),
         Error::IdOutOfRange(_) => "ID_OUT_OF_RANGE".to_string(),
         Error::Toolkit(e) => e.error_code(),
         Error::Sqlx(e) => match e.as_database_error().and_then(|db_err| db_err.code()) {
            Some(code) => format!("DB_{}", code),
            None => "SQLX_ERROR".to_string(),
         },
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_not_found_mentions_id() {
      let err = Error::NotFound { id: 999 };

      assert!(err.is_not_found());
      assert!(!err.is_interrupted());
      assert_eq!(err.error_code(), "NOT_FOUND");
      assert!(err.to_string().contains("999"));
   }

   #[test]
   fn test_id_out_of_range() {
      let err = Error::IdOutOfRange(i64::from(i32::MAX) + 1);

      assert!(!err.is_not_found());
      assert_eq!(err.error_code(), "ID_OUT_OF_RANGE");
      assert!(err.to_string().contains("2147483648"));
   }

   #[test]
   fn test_toolkit_codes_pass_through() {
      let cancelled = Error::from(sqlx_toolkit::Error::Cancelled);
      assert!(cancelled.is_interrupted());
      assert_eq!(cancelled.error_code(), "CANCELLED");

      let closed = Error::from(sqlx_toolkit::Error::ConnectionManager(
         sqlx_conn_mgr::Error::DatabaseClosed,
      ));
      assert!(!closed.is_interrupted());
      assert_eq!(closed.error_code(), "DATABASE_CLOSED");
   }

   #[test]
   fn test_sqlx_without_database_code() {
      let err = Error::from(sqlx::Error::PoolTimedOut);
      assert_eq!(err.error_code(), "SQLX_ERROR");
      assert!(!err.is_not_found());
   }
}
