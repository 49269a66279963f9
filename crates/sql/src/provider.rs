use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::connection::Connector;
use crate::error::ConnectionError;

/// How long a connection handle is reused by default.
pub const DEFAULT_CONNECTION_TTL: Duration = Duration::from_secs(60 * 60);

struct CachedHandle<H> {
    handle: H,
    created_at: Instant,
}

/// Lazily opens a connection handle and shares it until it expires.
///
/// The cache is guarded by an async mutex that is held while connecting,
/// so concurrent first calls wait for one construction instead of racing.
/// Failed attempts are not cached; the next call tries again.
pub struct ConnectionProvider<C: Connector> {
    connector: C,
    uri: SecretString,
    ttl: Duration,
    cached: Mutex<Option<CachedHandle<C::Handle>>>,
}

impl<C: Connector> ConnectionProvider<C> {
    /// Creates a provider that connects to `uri` on first use.
    pub fn new(connector: C, uri: SecretString, ttl: Duration) -> Self {
        Self {
            connector,
            uri,
            ttl,
            cached: Mutex::new(None),
        }
    }

    /// Returns the time-to-live of cached handles.
    #[inline]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached handle, connecting first if there is none or it
    /// has outlived the TTL.
    pub async fn get_connection(&self) -> Result<C::Handle, ConnectionError> {
        let mut cached = self.cached.lock().await;
        if let Some(entry) = cached.as_ref() {
            if entry.created_at.elapsed() < self.ttl {
                trace!("reusing cached connection");
                return Ok(entry.handle.clone());
            }
            debug!("cached connection expired, reconnecting");
            *cached = None;
        }

        let handle = self
            .connector
            .connect(self.uri.expose_secret())
            .await
            .inspect_err(|err| error!("failed to connect: {err}"))?;
        *cached = Some(CachedHandle {
            handle: handle.clone(),
            created_at: Instant::now(),
        });
        info!("database connection established");
        Ok(handle)
    }

    /// Drops the cached handle so the next call reconnects.
    pub async fn invalidate(&self) {
        if self.cached.lock().await.take().is_some() {
            debug!("cached connection invalidated");
        }
    }
}
