use cassandra_uri::ConnectionConfig;
use secrecy::SecretString;
use std::sync::Arc;
use tokio_rustls::rustls::crypto::ring;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tracing::*;

use crate::error::{Error, Result};
use crate::keystore::{KeyStore, KeyStoreLoader, StoreLocation};

/// Effective trust and key store locations. When only one store is configured, it is used for
/// both.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TlsStores {
    trust_store: Option<StoreLocation>,
    key_store: Option<StoreLocation>,
}

impl TlsStores {
    pub fn new(trust_store: Option<StoreLocation>, key_store: Option<StoreLocation>) -> Self {
        let (trust_store, key_store) = match (trust_store, key_store) {
            (Some(trust_store), None) => (Some(trust_store.clone()), Some(trust_store)),
            (None, Some(key_store)) => (Some(key_store.clone()), Some(key_store)),
            stores => stores,
        };

        TlsStores {
            trust_store,
            key_store,
        }
    }

    pub fn from_config(config: &ConnectionConfig) -> Self {
        let location = |path: Option<&str>, password: Option<&SecretString>| {
            path.map(|path| StoreLocation::new(path, password.cloned()))
        };

        Self::new(
            location(config.trust_store(), config.trust_store_password()),
            location(config.key_store(), config.key_store_password()),
        )
    }

    pub fn trust_store(&self) -> Option<&StoreLocation> {
        self.trust_store.as_ref()
    }

    pub fn key_store(&self) -> Option<&StoreLocation> {
        self.key_store.as_ref()
    }
}

fn load_store(location: Option<&StoreLocation>, loader: &dyn KeyStoreLoader) -> Result<KeyStore> {
    match location {
        Some(location) => loader.load(location),
        None => Ok(KeyStore::empty()),
    }
}

/// Builds a client TLS context. The client identity is taken from the trust store, while every
/// certificate of the key store becomes a trusted root.
pub fn build_tls_context(
    stores: &TlsStores,
    loader: &dyn KeyStoreLoader,
) -> Result<Arc<ClientConfig>> {
    let identity_store = load_store(stores.trust_store(), loader)?;
    let root_store = load_store(stores.key_store(), loader)?;

    let mut roots = RootCertStore::empty();
    for certificate in root_store.certificates() {
        roots.add(certificate.clone())?;
    }

    if roots.is_empty() {
        warn!("No trusted certificates configured; server certificates will be rejected.");
    }

    let builder = ClientConfig::builder_with_provider(Arc::new(ring::default_provider()))
        .with_safe_default_protocol_versions()?
        .with_root_certificates(roots);

    let config = match identity_store.into_identity() {
        Some(identity) => {
            let (chain, key) = identity.into_parts();
            builder.with_client_auth_cert(chain, key)?
        }
        None => builder.with_no_client_auth(),
    };

    Ok(Arc::new(config))
}

/// Name the server certificate is verified against.
pub fn server_name(host: &str) -> Result<ServerName<'static>> {
    ServerName::try_from(host)
        .map(|name| name.to_owned())
        .map_err(|error| Error::TlsConfiguration(format!("invalid server name '{host}': {error}")))
}
