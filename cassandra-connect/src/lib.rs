//! **cassandra-connect** turns `jdbc:cassandra://` connection strings into live
//! [cdrs-tokio](cdrs_tokio) sessions.
//!
//! ## Getting started
//!
//! ```no_run
//! use cassandra_connect::SessionBootstrap;
//! use std::collections::HashMap;
//!
//! #[tokio::main]
//! async fn main() {
//!     let session = SessionBootstrap::new()
//!         .connect(
//!             "jdbc:cassandra://10.0.0.1:9042,10.0.0.2/app?user=app&password=secret&dc=eu",
//!             &HashMap::new(),
//!         )
//!         .await
//!         .unwrap();
//!
//!     assert!(!session.is_tls());
//! }
//! ```
//!
//! ## Session assembly
//!
//! Connecting happens in two stages. [`SessionBootstrap::plan`] resolves everything the session
//! needs: contact points, the TLS context built from key and trust stores, the password (possibly
//! through a [`SecretResolver`]), driver settings from the `configfile` option and the data
//! center. [`SessionPlan::connect`] then opens one connection to check the cluster answers and
//! hands the plan to the driver. Both steps are bounded by [`CONNECT_TIMEOUT`].
//!
//! Sessions use topology-aware load balancing, preferring nodes from the configured data center,
//! or [`DEFAULT_DATA_CENTER`] when none is given.

pub mod bootstrap;
pub mod contact_point;
pub mod error;
pub mod keystore;
pub mod secret;
pub mod settings;
pub mod tls;

pub use crate::bootstrap::{
    CassandraSession, Credentials, RustlsSession, SessionBootstrap, SessionPlan, TcpSession,
    TlsContext, CONNECT_TIMEOUT, DEFAULT_DATA_CENTER,
};
pub use crate::contact_point::{ContactPoint, DEFAULT_PORT};
pub use crate::keystore::{FileKeyStoreLoader, KeyStore, KeyStoreLoader, StoreLocation};
pub use crate::secret::{SecretResolver, StaticSecretStore};
pub use crate::settings::{CompressionSetting, DriverSettings};
pub use cassandra_uri::{ConnectionConfig, SecretCoordinate};

pub type Error = error::Error;
pub type Result<T> = error::Result<T>;
