//! # sqlx-conn-mgr
//!
//! A minimal wrapper around SQLx that hands out a pre-configured connection pool.
//!
//! ## Core Types
//!
//! - **[`Database`]**: Pooled handle shared by every caller
//! - **[`DatabaseConfig`]**: Pool limits (idle/open connections, idle timeout, max lifetime)
//! - **[`ConnectionSettings`]**: MySQL host, port, credentials and database name
//! - **[`Error`]**: Error type for connection operations
//!
//! ## Defaults
//!
//! - **10** idle connections kept warm, at most **100** open
//! - Idle connections closed after **5 minutes**
//! - Every connection recycled after **60 minutes**
//!
//! Construction never aborts the process. A server that cannot be reached is
//! reported as an [`Error`] and the caller decides whether to retry or give up.

mod config;
mod database;
mod error;

// Re-export public types
pub use config::{ConnectionSettings, DatabaseConfig};
pub use database::Database;
pub use error::{Error, Result};
