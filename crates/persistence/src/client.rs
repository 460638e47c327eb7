//! ScyllaDB session plumbing for the grievance store

use std::sync::Arc;
use std::time::Duration;

use scylla::{Session, SessionBuilder};

use crate::error::StoreError;
use crate::schema;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Cluster connection settings. `Default` picks up the conventional
/// `SCYLLA_HOSTS` / `SCYLLA_KEYSPACE` environment variables so ad-hoc
/// tooling works without a config file.
#[derive(Debug, Clone)]
pub struct ScyllaConfig {
    pub hosts: Vec<String>,
    pub keyspace: String,
    pub replication_factor: u8,
}

impl Default for ScyllaConfig {
    fn default() -> Self {
        Self {
            hosts: hosts_from_env(),
            keyspace: std::env::var("SCYLLA_KEYSPACE").unwrap_or_else(|_| "sauti".to_string()),
            replication_factor: 1,
        }
    }
}

fn hosts_from_env() -> Vec<String> {
    match std::env::var("SCYLLA_HOSTS") {
        Ok(raw) => raw
            .split(',')
            .map(|host| host.trim().to_string())
            .filter(|host| !host.is_empty())
            .collect(),
        Err(_) => vec!["127.0.0.1:9042".to_string()],
    }
}

/// Shared handle to one ScyllaDB session. Cheap to clone; every store
/// instance holds one.
#[derive(Clone)]
pub struct ScyllaClient {
    session: Arc<Session>,
    config: ScyllaConfig,
}

impl ScyllaClient {
    /// Connect to the cluster named in `config`.
    pub async fn connect(config: ScyllaConfig) -> Result<Self, StoreError> {
        tracing::info!(
            hosts = ?config.hosts,
            keyspace = %config.keyspace,
            "Connecting to ScyllaDB"
        );

        let session = SessionBuilder::new()
            .known_nodes(&config.hosts)
            .connection_timeout(CONNECT_TIMEOUT)
            .build()
            .await?;

        Ok(Self {
            session: Arc::new(session),
            config,
        })
    }

    /// Create the keyspace and grievance table when they do not exist yet.
    /// Safe to call on every startup.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        let keyspace = &self.config.keyspace;
        schema::create_keyspace(&self.session, keyspace, self.config.replication_factor).await?;
        schema::create_tables(&self.session, keyspace).await?;
        tracing::info!(keyspace = %keyspace, "Keyspace and tables ready");
        Ok(())
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn keyspace(&self) -> &str {
        &self.config.keyspace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_local_fallbacks() {
        // Only meaningful when the env vars are unset, as on CI
        if std::env::var("SCYLLA_HOSTS").is_err() {
            let config = ScyllaConfig::default();
            assert_eq!(config.hosts, vec!["127.0.0.1:9042".to_string()]);
            assert_eq!(config.replication_factor, 1);
        }
    }
}
