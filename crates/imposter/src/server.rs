//! `ImposterServer` builder and accept loop.
//!
//! Ties the layers together: socket → handler → gateway → directory.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use imposter_directory::{Directory, DirectoryConfig, MemoryStore, SessionStore};
use imposter_protocol::{Codec, ConnectionId, JsonCodec};
use tokio::net::TcpListener;

use crate::handler::handle_connection;
use crate::{Gateway, ImposterError, ServerConfig};

/// Shared server state passed to each connection task.
pub(crate) struct ServerState<S: SessionStore, C: Codec> {
    pub(crate) gateway: Gateway<S>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting an [`ImposterServer`].
///
/// ```rust,no_run
/// # async fn run() -> Result<(), imposter::ImposterError> {
/// use imposter::ImposterServer;
///
/// let server = ImposterServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct ImposterServerBuilder {
    config: ServerConfig,
}

impl ImposterServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Replaces every setting at once.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the game directory's retention and capacity.
    pub fn directory_config(mut self, config: DirectoryConfig) -> Self {
        self.config.directory = config;
        self
    }

    /// Sets how often expired games are purged.
    pub fn purge_interval(mut self, interval: Duration) -> Self {
        self.config.purge_interval = interval;
        self
    }

    /// Binds the listener with an in-memory directory and `JsonCodec`.
    pub async fn build(
        self,
    ) -> Result<ImposterServer<MemoryStore, JsonCodec>, ImposterError> {
        let directory = Arc::new(Directory::new(self.config.directory.clone()));
        self.build_with(directory, JsonCodec).await
    }

    /// Binds the listener around an existing directory and codec.
    pub async fn build_with<S: SessionStore, C: Codec>(
        self,
        directory: Arc<Directory<S>>,
        codec: C,
    ) -> Result<ImposterServer<S, C>, ImposterError> {
        let listener = TcpListener::bind(self.config.bind_addr.as_str()).await?;
        tracing::info!(addr = %self.config.bind_addr, "listening");

        let state = Arc::new(ServerState {
            gateway: Gateway::new(directory),
            codec,
        });

        Ok(ImposterServer {
            listener,
            state,
            purge_interval: self.config.purge_interval,
            next_connection: AtomicU64::new(1),
        })
    }
}

impl Default for ImposterServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound imposter game server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ImposterServer<S: SessionStore, C: Codec> {
    listener: TcpListener,
    state: Arc<ServerState<S, C>>,
    purge_interval: Duration,
    next_connection: AtomicU64,
}

impl ImposterServer<MemoryStore, JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> ImposterServerBuilder {
        ImposterServerBuilder::new()
    }
}

impl<S: SessionStore, C: Codec> ImposterServer<S, C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The gateway all connections share.
    pub fn gateway(&self) -> &Gateway<S> {
        &self.state.gateway
    }

    /// Runs the accept loop and the periodic purge until the process
    /// is terminated.
    pub async fn run(self) -> Result<(), ImposterError> {
        tracing::info!("imposter server running");

        let purger = tokio::spawn(purge_loop(
            Arc::clone(&self.state),
            self.purge_interval,
        ));

        let result = self.accept_loop().await;
        purger.abort();
        result
    }

    async fn accept_loop(&self) -> Result<(), ImposterError> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let conn = ConnectionId::new(
                        self.next_connection.fetch_add(1, Ordering::Relaxed),
                    );
                    tracing::debug!(%conn, %addr, "accepted connection");

                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, conn, state).await {
                            tracing::debug!(%conn, error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

async fn purge_loop<S: SessionStore, C: Codec>(
    state: Arc<ServerState<S, C>>,
    every: Duration,
) {
    // `interval` panics on a zero period.
    let mut interval = tokio::time::interval(every.max(Duration::from_millis(1)));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        state.gateway.purge_expired().await;
    }
}
