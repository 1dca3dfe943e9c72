//! Object-store client.
//!
//! Runs reference their uploaded log directories by object-store path
//! (`s3://...`); the upload itself happens outside this system, so the
//! client here only resolves credentials, carries the endpoint, and can
//! probe reachability for `rled status`. Custom endpoints keep
//! S3-compatible services (MinIO, LocalStack, cloud providers) working.

use anyhow::{Context, Result};

use crate::config::ObjectStoreConfig;

/// Access credentials resolved for the object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// An access-key pair, from config or environment.
    Keys {
        access_key_id: String,
        secret_access_key: String,
    },
    /// No explicit credentials; ambient/instance-role or public access.
    Anonymous,
}

impl Credentials {
    /// Resolve credentials: explicit config keys win, then the
    /// `AWS_ACCESS_KEY_ID`/`AWS_SECRET_ACCESS_KEY` environment pair,
    /// then anonymous.
    pub fn resolve(config: &ObjectStoreConfig) -> Self {
        if let (Some(id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            return Credentials::Keys {
                access_key_id: id.clone(),
                secret_access_key: secret.clone(),
            };
        }
        match (
            std::env::var("AWS_ACCESS_KEY_ID"),
            std::env::var("AWS_SECRET_ACCESS_KEY"),
        ) {
            (Ok(id), Ok(secret)) => Credentials::Keys {
                access_key_id: id,
                secret_access_key: secret,
            },
            _ => Credentials::Anonymous,
        }
    }
}

/// Handle on the object-store endpoint.
pub struct ObjectStoreClient {
    endpoint_url: String,
    credentials: Credentials,
    http: reqwest::Client,
}

impl ObjectStoreClient {
    pub fn new(config: &ObjectStoreConfig) -> Self {
        Self {
            endpoint_url: config.endpoint_url.trim_end_matches('/').to_string(),
            credentials: Credentials::resolve(config),
            http: reqwest::Client::new(),
        }
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn is_anonymous(&self) -> bool {
        self.credentials == Credentials::Anonymous
    }

    /// Probe the endpoint. Any HTTP response counts as reachable — an
    /// auth rejection still proves the service is there.
    pub async fn healthcheck(&self) -> Result<u16> {
        let response = self
            .http
            .get(&self.endpoint_url)
            .send()
            .await
            .with_context(|| format!("object store endpoint {} is unreachable", self.endpoint_url))?;
        Ok(response.status().as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(
        access_key_id: Option<&str>,
        secret_access_key: Option<&str>,
        endpoint_url: &str,
    ) -> ObjectStoreConfig {
        ObjectStoreConfig {
            access_key_id: access_key_id.map(str::to_string),
            secret_access_key: secret_access_key.map(str::to_string),
            endpoint_url: endpoint_url.to_string(),
        }
    }

    #[test]
    fn explicit_keys_win_over_environment() {
        std::env::set_var("AWS_ACCESS_KEY_ID", "env-id");
        std::env::set_var("AWS_SECRET_ACCESS_KEY", "env-secret");

        let creds = Credentials::resolve(&config(Some("cfg-id"), Some("cfg-secret"), "http://x"));
        assert_eq!(
            creds,
            Credentials::Keys {
                access_key_id: "cfg-id".to_string(),
                secret_access_key: "cfg-secret".to_string(),
            }
        );

        std::env::remove_var("AWS_ACCESS_KEY_ID");
        std::env::remove_var("AWS_SECRET_ACCESS_KEY");
    }

    #[test]
    fn missing_keys_fall_back_to_anonymous() {
        // Only half a pair configured still means anonymous.
        let creds = Credentials::resolve(&config(Some("cfg-id"), None, "http://x"));
        if std::env::var("AWS_ACCESS_KEY_ID").is_err() {
            assert_eq!(creds, Credentials::Anonymous);
        }
    }

    #[test]
    fn endpoint_is_normalized() {
        let client = ObjectStoreClient::new(&config(None, None, "http://localhost:9000/"));
        assert_eq!(client.endpoint_url(), "http://localhost:9000");
    }

    #[test]
    fn default_config_points_at_the_default_endpoint() {
        let client = ObjectStoreClient::new(&ObjectStoreConfig::default());
        assert_eq!(client.endpoint_url(), "https://storage.yandexcloud.net");
    }
}
