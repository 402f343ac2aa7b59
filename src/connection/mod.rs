//! Connection management for MongoDB
//!
//! This module provides:
//! - Connection establishment with retries and termination
//! - Connection pool sizing from configuration

use mongodb::bson::doc;
use mongodb::{Client, Database, options::ClientOptions};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::ConnectionConfig;
use crate::error::{ConnectionError, Result};

/// Delay between connection attempts.
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// MongoDB connection manager
pub struct ConnectionManager {
    /// MongoDB client instance
    client: Option<Client>,

    /// Connection configuration
    config: ConnectionConfig,

    /// Current connection state
    state: Arc<RwLock<ConnectionState>>,
}

/// Connection state information
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected
    Disconnected,

    /// Currently connecting
    Connecting,

    /// Connected and ready
    Connected,

    /// Connection failed
    Failed(String),
}

/// Connection pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of connections in the pool
    pub max_size: u32,

    /// Minimum number of idle connections
    pub min_idle: u32,

    /// Connection timeout duration
    pub connection_timeout: Duration,
}

impl ConnectionManager {
    /// Create a new connection manager
    ///
    /// # Arguments
    /// * `config` - Connection configuration, including the URI
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            client: None,
            config,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
        }
    }

    /// Establish connection to MongoDB
    ///
    /// Parses the URI, applies pool settings and pings the server, retrying
    /// up to `retry_attempts` additional times.
    pub async fn connect(&mut self) -> Result<()> {
        self.set_state(ConnectionState::Connecting).await;

        let options = match Self::parse_uri(&self.config.uri).await {
            Ok(options) => self.configure_pool(options),
            Err(e) => {
                self.set_state(ConnectionState::Failed(e.to_string())).await;
                return Err(e);
            }
        };

        match self.connect_with_retry(options).await {
            Ok(client) => {
                self.client = Some(client);
                self.set_state(ConnectionState::Connected).await;
                info!("Connected to MongoDB");
                Ok(())
            }
            Err(e) => {
                self.set_state(ConnectionState::Failed(e.to_string())).await;
                Err(e)
            }
        }
    }

    /// Disconnect from MongoDB
    ///
    /// Closes all pooled connections.
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(client) = self.client.take() {
            client.shutdown().await;
            info!("Disconnected from MongoDB");
        }
        self.set_state(ConnectionState::Disconnected).await;
        Ok(())
    }

    /// Get a handle to the configured database
    pub fn get_database(&self) -> Result<Database> {
        Ok(self.get_client()?.database(&self.config.database))
    }

    /// Get the MongoDB client
    pub fn get_client(&self) -> Result<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| ConnectionError::NotConnected.into())
    }

    /// Get current connection state
    pub async fn get_state(&self) -> ConnectionState {
        self.state.read().await.clone()
    }

    /// Check if currently connected
    pub async fn is_connected(&self) -> bool {
        matches!(*self.state.read().await, ConnectionState::Connected)
    }

    /// Parse connection URI and create client options
    async fn parse_uri(uri: &str) -> Result<ClientOptions> {
        ClientOptions::parse(uri)
            .await
            .map_err(|e| ConnectionError::InvalidUri(format!("{uri}: {e}")).into())
    }

    /// Configure client options with pool settings
    fn configure_pool(&self, mut options: ClientOptions) -> ClientOptions {
        let pool = PoolConfig::from(&self.config);
        options.max_pool_size = Some(pool.max_size);
        options.min_pool_size = Some(pool.min_idle);
        options.connect_timeout = Some(pool.connection_timeout);
        options.server_selection_timeout = Some(pool.connection_timeout);
        if options.app_name.is_none() {
            options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
        }
        options
    }

    /// Update connection state
    async fn set_state(&self, new_state: ConnectionState) {
        *self.state.write().await = new_state;
    }

    /// Attempt connection with retries
    async fn connect_with_retry(&self, options: ClientOptions) -> Result<Client> {
        let attempts = self.config.retry_attempts + 1;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            let result = match Client::with_options(options.clone()) {
                Ok(client) => Self::ping(&client).await.map(|_| client),
                Err(e) => Err(ConnectionError::ConnectionFailed(e.to_string()).into()),
            };

            match result {
                Ok(client) => return Ok(client),
                Err(e) => {
                    warn!("Connection attempt {}/{} failed: {}", attempt, attempts, e);
                    last_error = e.to_string();
                    if attempt < attempts {
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                }
            }
        }

        Err(ConnectionError::ConnectionFailed(last_error).into())
    }

    /// Verify connection is alive by sending a ping
    async fn ping(client: &Client) -> Result<()> {
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| ConnectionError::PingFailed(e.to_string()))?;
        Ok(())
    }
}

impl From<&ConnectionConfig> for PoolConfig {
    fn from(config: &ConnectionConfig) -> Self {
        Self {
            max_size: config.max_pool_size,
            min_idle: config.min_pool_size,
            connection_timeout: Duration::from_secs(config.timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_config_from_connection_config() {
        let conn_config = ConnectionConfig::default();
        let pool_config = PoolConfig::from(&conn_config);
        assert_eq!(pool_config.max_size, conn_config.max_pool_size);
        assert_eq!(
            pool_config.connection_timeout,
            Duration::from_secs(conn_config.timeout)
        );
    }

    #[tokio::test]
    async fn test_new_manager_is_disconnected() {
        let manager = ConnectionManager::new(ConnectionConfig::default());
        assert_eq!(manager.get_state().await, ConnectionState::Disconnected);
        assert!(!manager.is_connected().await);
        assert!(manager.get_client().is_err());
        assert!(manager.get_database().is_err());
    }

    #[tokio::test]
    async fn test_invalid_uri_fails_without_retry() {
        let config = ConnectionConfig {
            uri: "not-a-mongodb-uri".to_string(),
            ..ConnectionConfig::default()
        };
        let mut manager = ConnectionManager::new(config);
        let err = manager.connect().await.unwrap_err();
        assert!(err.to_string().contains("Invalid connection URI"));
        assert!(matches!(
            manager.get_state().await,
            ConnectionState::Failed(_)
        ));
    }
}
