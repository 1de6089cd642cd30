use async_trait::async_trait;
use cassandra_uri::{ConnectionConfig, SecretCoordinate};
use secrecy::SecretString;
use serde_json::Value;
use std::collections::HashMap;
use tracing::*;

#[cfg(test)]
use mockall::*;

use crate::error::{Error, Result};

/// Resolves a credential stored by reference in a remote secret store.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SecretResolver: Send + Sync {
    /// Returns the value stored under the coordinate's secret key.
    async fn resolve(&self, coordinate: &SecretCoordinate) -> Result<SecretString>;
}

/// In-memory secret store. Every secret is a JSON object document, identified by region and
/// secret name; the secret key selects a string field of that document.
#[derive(Clone, Default)]
pub struct StaticSecretStore {
    documents: HashMap<(String, String), String>,
}

impl StaticSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(
        mut self,
        region: impl Into<String>,
        secret_name: impl Into<String>,
        document: impl Into<String>,
    ) -> Self {
        self.documents
            .insert((region.into(), secret_name.into()), document.into());
        self
    }
}

fn resolution_error(coordinate: &SecretCoordinate, reason: impl Into<String>) -> Error {
    Error::SecretResolution {
        coordinate: coordinate.to_string(),
        reason: reason.into(),
    }
}

#[async_trait]
impl SecretResolver for StaticSecretStore {
    async fn resolve(&self, coordinate: &SecretCoordinate) -> Result<SecretString> {
        let document = self
            .documents
            .get(&(
                coordinate.region().to_string(),
                coordinate.secret_name().to_string(),
            ))
            .ok_or_else(|| resolution_error(coordinate, "secret not found"))?;

        // the document is the secret itself; parse errors must not echo it back
        let document: Value = serde_json::from_str(document)
            .map_err(|_| resolution_error(coordinate, "secret is not a JSON document"))?;

        match document.get(coordinate.secret_key()) {
            Some(Value::String(value)) => Ok(SecretString::new(value.clone())),
            Some(_) => Err(resolution_error(coordinate, "secret key is not a string")),
            None => Err(resolution_error(coordinate, "secret key not found")),
        }
    }
}

/// Resolves the password to authenticate with. When the configuration carries a complete secret
/// coordinate, the password comes from `resolver` only and the literal password is ignored.
pub async fn resolve_password(
    config: &ConnectionConfig,
    resolver: Option<&dyn SecretResolver>,
) -> Result<Option<SecretString>> {
    let Some(coordinate) = config.secret_coordinate() else {
        return Ok(config.password().cloned());
    };

    info!(
        region = coordinate.region(),
        secret_name = coordinate.secret_name(),
        secret_key = coordinate.secret_key(),
        "Resolving password from secret store."
    );

    let resolver =
        resolver.ok_or_else(|| resolution_error(&coordinate, "no secret resolver configured"))?;

    resolver.resolve(&coordinate).await.map(Some)
}
