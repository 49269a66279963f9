use std::sync::Once;
use std::time::Duration;

use sqlx::any::AnyPoolOptions;

use crate::database::Database;
use crate::dialect::Dialect;
use crate::error::ConnectionError;

/// Opens connection handles for a [`ConnectionProvider`].
///
/// [`ConnectionProvider`]: crate::ConnectionProvider
pub trait Connector: Send + Sync + 'static {
    /// The handle shared by everyone using the connection.
    type Handle: Clone + Send + Sync + 'static;

    /// Opens and validates a new handle.
    fn connect(
        &self,
        uri: &str,
    ) -> impl Future<Output = Result<Self::Handle, ConnectionError>> + Send;
}

/// Connects to real databases through a sqlx `Any` pool.
#[derive(Clone, Debug)]
pub struct SqlConnector {
    max_connections: u32,
    acquire_timeout: Duration,
}

impl SqlConnector {
    /// Creates a connector with a small pool.
    #[inline]
    pub fn new() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the maximum number of pooled connections.
    #[inline]
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    /// Sets how long to wait for a connection before failing.
    #[inline]
    pub fn with_acquire_timeout(mut self, acquire_timeout: Duration) -> Self {
        self.acquire_timeout = acquire_timeout;
        self
    }
}

impl Default for SqlConnector {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for SqlConnector {
    type Handle = Database;

    fn connect(
        &self,
        uri: &str,
    ) -> impl Future<Output = Result<Database, ConnectionError>> + Send {
        static INSTALL_DRIVERS: Once = Once::new();
        INSTALL_DRIVERS.call_once(sqlx::any::install_default_drivers);

        let options = AnyPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout);
        let dialect_or_err = Dialect::from_uri(uri);
        let uri = uri.to_owned();

        async move {
            let dialect = dialect_or_err?;
            let pool = options
                .connect(&dialect.normalize_uri(&uri))
                .await
                .map_err(ConnectionError::Connect)?;
            let database = Database::new(pool, dialect);
            database.ping().await.map_err(ConnectionError::Connect)?;
            debug!("connected to {dialect} database");
            Ok(database)
        }
    }
}
