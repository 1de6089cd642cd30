use itertools::Itertools;
use secrecy::SecretString;
use std::collections::HashMap;
use std::fmt::{self, Debug, Display, Formatter};
use std::path::{Path, PathBuf};
use tracing::*;

use crate::ambient::{AmbientSource, AmbientTlsConfig, EnvTlsConfig};
use crate::error::{Error, Result};
use crate::mask::mask_password;
use crate::options::{OptionChain, UriOption, UriOptions};
use crate::secret::SecretCoordinate;
use crate::PREFIX;

/// Fully resolved connection configuration parsed from a connection string and auxiliary
/// properties. Immutable once built; a new one should be parsed for every connection attempt.
#[derive(Clone)]
pub struct ConnectionConfig {
    uri: String,
    hosts: Vec<String>,
    keyspace: Option<String>,
    collection: Option<String>,
    user_name: Option<String>,
    password: Option<SecretString>,
    data_center: Option<String>,
    ssl_enabled: bool,
    trust_store: Option<String>,
    trust_store_password: Option<SecretString>,
    key_store: Option<String>,
    key_store_password: Option<SecretString>,
    aws_region: Option<String>,
    aws_secret_name: Option<String>,
    aws_secret_key: Option<String>,
    config_file: Option<PathBuf>,
}

impl ConnectionConfig {
    /// Parses `uri`, consulting `properties` first and the process environment for ambient TLS
    /// store settings. See [`ConnectionConfig::parse_with`].
    pub fn parse(uri: &str, properties: &HashMap<String, String>) -> Result<Self> {
        Self::parse_with(uri, properties, &EnvTlsConfig)
    }

    /// Parses a connection string of the form
    /// `jdbc:cassandra://host1[:port1],host2[:port2]/keyspace[.collection][?opt=val&...]`.
    ///
    /// Every option is resolved from `properties` first, the URI options segment second and,
    /// for the trust/key store options only, from `ambient` last.
    pub fn parse_with(
        uri: &str,
        properties: &HashMap<String, String>,
        ambient: &dyn AmbientTlsConfig,
    ) -> Result<Self> {
        info!(uri = %mask_password(uri), "Parsing connection URI.");

        let remainder = uri.strip_prefix(PREFIX).ok_or_else(|| Error::MalformedUri {
            uri: mask_password(uri),
        })?;

        let (address, uri_options) = match options_delimiter(remainder) {
            Some(idx) => (&remainder[..idx], UriOptions::parse(&remainder[idx + 1..])),
            None => (remainder, UriOptions::default()),
        };

        let (server_part, namespace) = match address.find('/') {
            Some(idx) if idx > 0 => (&address[..idx], Some(&address[idx + 1..])),
            _ => (address, None),
        };

        let hosts = server_part
            .split(',')
            .enumerate()
            .map(|(position, host)| {
                if host.is_empty() {
                    Err(Error::EmptyHost {
                        uri: mask_password(uri),
                        position,
                    })
                } else {
                    Ok(host.to_string())
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let (keyspace, collection) = match namespace.filter(|namespace| !namespace.is_empty()) {
            None => (None, None),
            Some(namespace) => match namespace.split_once('.') {
                Some((keyspace, collection)) => {
                    (Some(keyspace.to_string()), Some(collection.to_string()))
                }
                None => (Some(namespace.to_string()), None),
            },
        };

        let ambient = AmbientSource(ambient);
        let chain = OptionChain::new()
            .with_source(properties)
            .with_source(&uri_options)
            .with_source(&ambient);
        let secret = |option| chain.resolve(option).map(SecretString::new);

        let ssl_enabled_option = chain.resolve(UriOption::SslEnabled);
        let config = ConnectionConfig {
            uri: uri.to_string(),
            hosts,
            keyspace,
            collection,
            user_name: chain.resolve(UriOption::User),
            password: secret(UriOption::Password),
            data_center: chain.resolve(UriOption::DataCenter),
            ssl_enabled: ssl_enabled_option
                .as_deref()
                .is_some_and(|value| value.eq_ignore_ascii_case("true")),
            trust_store: chain.resolve(UriOption::TrustStore),
            trust_store_password: secret(UriOption::TrustStorePassword),
            key_store: chain.resolve(UriOption::KeyStore),
            key_store_password: secret(UriOption::KeyStorePassword),
            aws_region: chain.resolve(UriOption::AwsRegion),
            aws_secret_name: chain.resolve(UriOption::AwsSecretName),
            aws_secret_key: chain.resolve(UriOption::AwsSecretKey),
            config_file: chain.resolve(UriOption::ConfigFile).map(PathBuf::from),
        };

        info!(
            hosts = %config.hosts.iter().join(","),
            keyspace = ?config.keyspace,
            collection = ?config.collection,
            user = ?config.user_name,
            dc = ?config.data_center,
            sslenabled = ?ssl_enabled_option,
            "Parsed connection URI."
        );

        Ok(config)
    }

    /// The connection string exactly as given.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The connection string with password values masked.
    pub fn masked_uri(&self) -> String {
        mask_password(&self.uri)
    }

    /// Host specifiers (`host` or `host:port`) in the order they were given.
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn keyspace(&self) -> Option<&str> {
        self.keyspace.as_deref()
    }

    /// Set only together with a keyspace, from the part after the first `.` of the namespace.
    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    /// Literal password option. Ignored when a [`SecretCoordinate`] is configured.
    pub fn password(&self) -> Option<&SecretString> {
        self.password.as_ref()
    }

    pub fn data_center(&self) -> Option<&str> {
        self.data_center.as_deref()
    }

    pub fn ssl_enabled(&self) -> bool {
        self.ssl_enabled
    }

    pub fn trust_store(&self) -> Option<&str> {
        self.trust_store.as_deref()
    }

    pub fn trust_store_password(&self) -> Option<&SecretString> {
        self.trust_store_password.as_ref()
    }

    pub fn key_store(&self) -> Option<&str> {
        self.key_store.as_deref()
    }

    pub fn key_store_password(&self) -> Option<&SecretString> {
        self.key_store_password.as_ref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.aws_region.as_deref()
    }

    pub fn aws_secret_name(&self) -> Option<&str> {
        self.aws_secret_name.as_deref()
    }

    pub fn aws_secret_key(&self) -> Option<&str> {
        self.aws_secret_key.as_deref()
    }

    /// Secret store coordinate of the password; present only when region, secret name and
    /// secret key are all set.
    pub fn secret_coordinate(&self) -> Option<SecretCoordinate> {
        match (&self.aws_region, &self.aws_secret_name, &self.aws_secret_key) {
            (Some(region), Some(secret_name), Some(secret_key)) => Some(SecretCoordinate::new(
                region.clone(),
                secret_name.clone(),
                secret_key.clone(),
            )),
            _ => None,
        }
    }

    /// Path of the external driver configuration file.
    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }
}

impl Display for ConnectionConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked_uri())
    }
}

impl Debug for ConnectionConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("uri", &self.masked_uri())
            .field("hosts", &self.hosts)
            .field("keyspace", &self.keyspace)
            .field("collection", &self.collection)
            .field("user_name", &self.user_name)
            .field("password", &self.password)
            .field("data_center", &self.data_center)
            .field("ssl_enabled", &self.ssl_enabled)
            .field("trust_store", &self.trust_store)
            .field("key_store", &self.key_store)
            .field("secret_coordinate", &self.secret_coordinate())
            .field("config_file", &self.config_file)
            .finish_non_exhaustive()
    }
}

/// `?` is preferred; `;` only counts when there is no `?` past the first character.
fn options_delimiter(uri: &str) -> Option<usize> {
    ['?', ';']
        .into_iter()
        .filter_map(|delimiter| uri.find(delimiter))
        .find(|idx| *idx > 0)
}
