//! **cassandra-uri** interprets `jdbc:cassandra://` connection strings.
//!
//! A connection string names the contact points, the target keyspace (and optionally a
//! collection inside it) and a set of options. Options may also be supplied through an
//! auxiliary property map, which always takes precedence over the URI, and the four TLS store
//! options fall back to ambient process configuration.
//!
//! ```
//! use cassandra_uri::{ConnectionConfig, StaticTlsConfig};
//! use std::collections::HashMap;
//!
//! let config = ConnectionConfig::parse_with(
//!     "jdbc:cassandra://h1:9043,h2/ks1.coll1?user=alice&password=secret&dc=dc2",
//!     &HashMap::new(),
//!     &StaticTlsConfig::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(config.hosts(), ["h1:9043", "h2"]);
//! assert_eq!(config.keyspace(), Some("ks1"));
//! assert_eq!(config.collection(), Some("coll1"));
//! assert_eq!(config.data_center(), Some("dc2"));
//! ```
//!
//! Parsing never performs I/O. Turning a [`ConnectionConfig`] into a live session is the job of
//! the `cassandra-connect` crate.

pub mod ambient;
pub mod error;
pub mod options;

mod config;
mod mask;
mod secret;

pub use crate::ambient::{AmbientTlsConfig, EnvTlsConfig, StaticTlsConfig};
pub use crate::config::ConnectionConfig;
pub use crate::mask::{mask_password, password_value, MASK_CHAR};
pub use crate::options::{OptionChain, OptionSource, UriOption, UriOptions};
pub use crate::secret::SecretCoordinate;

/// Scheme prefix every connection string has to start with.
pub const PREFIX: &str = "jdbc:cassandra://";

pub type Error = error::Error;
pub type Result<T> = error::Result<T>;
