//! Ambient, process-wide TLS configuration.
//!
//! The trust and key store options fall back to four well-known properties
//! (`javax.net.ssl.trustStore`, `javax.net.ssl.trustStorePassword`, `javax.net.ssl.keyStore`,
//! `javax.net.ssl.keyStorePassword`) when neither the auxiliary properties nor the URI set them.
//! Where those properties come from is decided by the [`AmbientTlsConfig`] handed to the parser.

use std::collections::HashMap;
use std::env;

use crate::options::{OptionSource, UriOption};

/// Provider of ambient TLS properties, looked up by their property name.
pub trait AmbientTlsConfig {
    fn property(&self, name: &str) -> Option<String>;
}

/// Reads ambient properties from environment variables. The variable name is the property
/// name uppercased with dots replaced by underscores, e.g. `javax.net.ssl.trustStore` is read
/// from `JAVAX_NET_SSL_TRUSTSTORE`.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvTlsConfig;

impl EnvTlsConfig {
    pub fn variable_name(property: &str) -> String {
        property.replace('.', "_").to_ascii_uppercase()
    }
}

impl AmbientTlsConfig for EnvTlsConfig {
    fn property(&self, name: &str) -> Option<String> {
        env::var(Self::variable_name(name)).ok()
    }
}

/// Fixed set of ambient properties.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StaticTlsConfig(HashMap<String, String>);

impl StaticTlsConfig {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }
}

impl From<HashMap<String, String>> for StaticTlsConfig {
    fn from(properties: HashMap<String, String>) -> Self {
        StaticTlsConfig(properties)
    }
}

impl AmbientTlsConfig for StaticTlsConfig {
    fn property(&self, name: &str) -> Option<String> {
        self.0.get(name).cloned()
    }
}

/// Adapts an [`AmbientTlsConfig`] to the option chain. Answers only the store options.
pub(crate) struct AmbientSource<'a>(pub(crate) &'a dyn AmbientTlsConfig);

impl OptionSource for AmbientSource<'_> {
    fn lookup(&self, option: UriOption) -> Option<String> {
        option
            .ambient_property()
            .and_then(|name| self.0.property(name))
    }
}
