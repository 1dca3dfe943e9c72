use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub object_store: ObjectStoreConfig,
}

/// Document-store connection settings.
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub username: String,
    pub password: String,
    /// Database holding the run and metric collections; also the
    /// authentication source.
    pub database: String,
    /// One address, or several for replica-set discovery.
    pub hosts: Vec<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_replica_set")]
    pub replica_set: String,
    #[serde(default = "default_tls")]
    pub tls: bool,
    #[serde(default = "default_tls_ca_file")]
    pub tls_ca_file: PathBuf,
}

fn default_port() -> u16 {
    27018
}
fn default_replica_set() -> String {
    "rs01".to_string()
}
fn default_tls() -> bool {
    true
}
fn default_tls_ca_file() -> PathBuf {
    PathBuf::from("/usr/local/share/ca-certificates/Yandex/YandexInternalRootCA.crt")
}

/// Object-store client settings.
///
/// The access-key pair is optional: when absent, the client falls back to
/// `AWS_ACCESS_KEY_ID`/`AWS_SECRET_ACCESS_KEY` in the environment and
/// otherwise runs anonymously (ambient/instance credentials).
#[derive(Debug, Deserialize, Clone)]
pub struct ObjectStoreConfig {
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    #[serde(default = "default_endpoint_url")]
    pub endpoint_url: String,
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            access_key_id: None,
            secret_access_key: None,
            endpoint_url: default_endpoint_url(),
        }
    }
}

fn default_endpoint_url() -> String {
    "https://storage.yandexcloud.net".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.store.hosts.is_empty() {
        anyhow::bail!("store.hosts must list at least one address");
    }
    if config.store.database.is_empty() {
        anyhow::bail!("store.database must not be empty");
    }

    Ok(config)
}
