//! Pooled database handle built on SQLx's `Any` driver

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sqlx::AnyPool;
use tracing::debug;

use crate::config::{ConnectionSettings, DatabaseConfig};
use crate::{Error, Result};

/// Pooled connection handle to a relational database.
///
/// ## Architecture
///
/// A single SQLx pool is shared by every caller. SQLx owns borrowing and
/// returning connections, evicting idle ones and recycling old ones; this type
/// only decides the limits (see [`DatabaseConfig`]) and tracks whether the
/// handle has been closed.
///
/// The `Any` driver picks the backend from the URL scheme, so the same handle
/// serves a MySQL server in production and a SQLite file in tests.
///
/// ## Usage Pattern
///
/// ```text
/// 1. Connect (validates the config and opens the first connection eagerly)
/// 2. Share the returned Arc with repositories and run queries via pool()
/// 3. Close when done; pool() fails afterwards
/// ```
#[derive(Debug)]
pub struct Database {
   pool: AnyPool,

   config: DatabaseConfig,

   /// Marks database as closed to prevent further operations
   closed: AtomicBool,

   /// Connection URL with credentials stripped, for logging
   target: String,
}

impl Database {
   /// Connect to the database at `url`, creating the connection pool.
   ///
   /// Fails fast: the pool opens one connection before returning, so an
   /// unreachable server or bad credentials surface here as an error rather
   /// than on the first query.
   pub async fn connect(url: &str, custom_config: Option<DatabaseConfig>) -> Result<Arc<Self>> {
      let config = custom_config.unwrap_or_default();
      config.validate()?;

      sqlx::any::install_default_drivers();

      let target = redact_url(url);
      let pool = config.pool_options().connect(url).await?;

      debug!(
         "Connected to {} (max_open={}, max_idle={})",
         target, config.max_open_connections, config.max_idle_connections
      );

      Ok(Arc::new(Self {
         pool,
         config,
         closed: AtomicBool::new(false),
         target,
      }))
   }

   /// Connect to the MySQL server described by `settings`.
   pub async fn connect_mysql(
      settings: &ConnectionSettings,
      custom_config: Option<DatabaseConfig>,
   ) -> Result<Arc<Self>> {
      Self::connect(&settings.to_url(), custom_config).await
   }

   /// The connection pool, or [`Error::DatabaseClosed`] after [`close`](Self::close).
   pub fn pool(&self) -> Result<&AnyPool> {
      if self.is_closed() {
         return Err(Error::DatabaseClosed);
      }
      Ok(&self.pool)
   }

   /// The limits this pool was built with.
   pub fn config(&self) -> &DatabaseConfig {
      &self.config
   }

   /// Connection target with any credentials removed.
   pub fn target(&self) -> &str {
      &self.target
   }

   pub fn is_closed(&self) -> bool {
      self.closed.load(Ordering::Acquire)
   }

   /// Close the pool, waiting for checked-out connections to be returned.
   ///
   /// Closing twice is a no-op.
   pub async fn close(&self) -> Result<()> {
      if self.closed.swap(true, Ordering::AcqRel) {
         return Ok(());
      }

      self.pool.close().await;
      debug!("Closed connection pool for {}", self.target);
      Ok(())
   }
}

/// Strip `user:password@` from a connection URL.
fn redact_url(url: &str) -> String {
   let Some(scheme_end) = url.find("://") else {
      return url.to_string();
   };

   let rest = &url[scheme_end + 3..];
   let authority_end = rest.find('/').unwrap_or(rest.len());

   match rest[..authority_end].rfind('@') {
      Some(at) => format!("{}://{}", &url[..scheme_end], &rest[at + 1..]),
      None => url.to_string(),
   }
}
