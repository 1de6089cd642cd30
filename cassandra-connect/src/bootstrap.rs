use cassandra_uri::{AmbientTlsConfig, ConnectionConfig, EnvTlsConfig};
use cdrs_tokio::authenticators::{
    NoneAuthenticatorProvider, SaslAuthenticatorProvider, StaticPasswordAuthenticatorProvider,
};
use cdrs_tokio::cluster::session::{
    RustlsSessionBuilder, Session, SessionBuildError, SessionBuilder, TcpSessionBuilder,
    DEFAULT_TRANSPORT_BUFFER_SIZE,
};
use cdrs_tokio::cluster::{
    ConnectionManager, KeyspaceHolder, NodeAddress, NodeRustlsConfigBuilder, NodeTcpConfigBuilder,
    RustlsConnectionManager, TcpConnectionManager,
};
use cdrs_tokio::compression::Compression;
use cdrs_tokio::frame::Version;
use cdrs_tokio::frame_encoding::ProtocolFrameEncodingFactory;
use cdrs_tokio::load_balancing::node_distance_evaluator::TopologyAwareNodeDistanceEvaluator;
use cdrs_tokio::load_balancing::TopologyAwareLoadBalancingStrategy;
use cdrs_tokio::retry::NeverReconnectionPolicy;
use cdrs_tokio::transport::{CdrsTransport, TransportRustls, TransportTcp};
use itertools::Itertools;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::future::Future;
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task;
use tokio::time::timeout;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::ClientConfig;
use tracing::*;

use crate::contact_point::{contact_points, ContactPoint};
use crate::error::{Error, Result};
use crate::keystore::{FileKeyStoreLoader, KeyStoreLoader};
use crate::secret::{resolve_password, SecretResolver};
use crate::settings::DriverSettings;
use crate::tls::{build_tls_context, server_name, TlsStores};

/// Data center the session is bound to when none is configured.
pub const DEFAULT_DATA_CENTER: &str = "datacenter1";

/// Upper bound for opening a single connection to a contact point, and for session
/// initialization once a contact point answered.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub type TcpSession = Session<
    TransportTcp,
    TcpConnectionManager,
    TopologyAwareLoadBalancingStrategy<TransportTcp, TcpConnectionManager>,
>;

pub type RustlsSession = Session<
    TransportRustls,
    RustlsConnectionManager,
    TopologyAwareLoadBalancingStrategy<TransportRustls, RustlsConnectionManager>,
>;

/// Live session, plain or TLS-wrapped depending on the `sslenabled` option.
pub enum CassandraSession {
    Tcp(TcpSession),
    Rustls(RustlsSession),
}

impl CassandraSession {
    pub fn is_tls(&self) -> bool {
        matches!(self, CassandraSession::Rustls(_))
    }
}

/// Client TLS context along with the name the server certificate is verified against.
#[derive(Clone, Debug)]
pub struct TlsContext {
    server_name: ServerName<'static>,
    config: Arc<ClientConfig>,
}

impl TlsContext {
    pub fn server_name(&self) -> &ServerName<'static> {
        &self.server_name
    }

    pub fn config(&self) -> &Arc<ClientConfig> {
        &self.config
    }
}

/// User name and password bound to the session.
#[derive(Clone, Debug)]
pub struct Credentials {
    user_name: String,
    password: SecretString,
}

impl Credentials {
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }
}

/// Everything needed to open a session, resolved from a [`ConnectionConfig`]. Building a plan
/// performs file and secret store I/O, but never contacts the cluster.
#[derive(Clone, Debug)]
pub struct SessionPlan {
    contact_points: Vec<ContactPoint>,
    tls: Option<TlsContext>,
    settings: DriverSettings,
    data_center: String,
    credentials: Option<Credentials>,
    keyspace: Option<String>,
    config_file: Option<PathBuf>,
}

// Session builders share configuration methods through the SessionBuilder trait, but are
// distinct types for plain and TLS transports.
macro_rules! configure_session {
    ($builder:expr, $plan:expr) => {{
        let plan: &SessionPlan = $plan;
        let mut builder = $builder
            .with_node_distance_evaluator(Box::new(TopologyAwareNodeDistanceEvaluator::new(
                plan.data_center.clone(),
            )))
            .with_reconnection_policy(Arc::new(NeverReconnectionPolicy::default()));

        if let Some(keyspace) = &plan.keyspace {
            builder = builder.with_keyspace(keyspace.clone());
        }

        if let Some(compression) = plan.settings.compression {
            builder = builder.with_compression(compression.into());
        }

        if let Some(tcp_nodelay) = plan.settings.tcp_nodelay {
            builder = builder.with_tcp_nodelay(tcp_nodelay);
        }

        if let Some(transport_buffer_size) = plan.settings.transport_buffer_size {
            builder = builder.with_transport_buffer_size(transport_buffer_size);
        }

        builder
    }};
}

impl SessionPlan {
    pub fn contact_points(&self) -> &[ContactPoint] {
        &self.contact_points
    }

    pub fn tls(&self) -> Option<&TlsContext> {
        self.tls.as_ref()
    }

    pub fn settings(&self) -> &DriverSettings {
        &self.settings
    }

    pub fn data_center(&self) -> &str {
        &self.data_center
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn keyspace(&self) -> Option<&str> {
        self.keyspace.as_deref()
    }

    pub fn authenticator_provider(&self) -> Arc<dyn SaslAuthenticatorProvider + Send + Sync> {
        match &self.credentials {
            Some(credentials) => {
                info!(user = %credentials.user_name, "Authenticating as user.");
                Arc::new(StaticPasswordAuthenticatorProvider::new(
                    credentials.user_name.as_str(),
                    credentials.password.expose_secret().as_str(),
                ))
            }
            None => Arc::new(NoneAuthenticatorProvider),
        }
    }

    fn compression(&self) -> Compression {
        self.settings
            .compression
            .map(Compression::from)
            .unwrap_or(Compression::None)
    }

    fn transport_buffer_size(&self) -> usize {
        self.settings
            .transport_buffer_size
            .unwrap_or(DEFAULT_TRANSPORT_BUFFER_SIZE)
    }

    fn tcp_nodelay(&self) -> bool {
        self.settings.tcp_nodelay.unwrap_or(true)
    }

    fn session_build_error(&self, error: SessionBuildError) -> Error {
        match Error::from(error) {
            Error::DriverConfig { reason, .. } => Error::DriverConfig {
                path: self.config_file.clone().unwrap_or_default(),
                reason,
            },
            error => error,
        }
    }

    /// Opens a single connection to the first contact point which accepts one. Startup and
    /// authentication run as part of the connection.
    async fn verify_reachable<T, CM>(&self, connection_manager: &CM) -> Result<()>
    where
        T: CdrsTransport,
        CM: ConnectionManager<T>,
    {
        let mut last_error = None;

        for contact_point in &self.contact_points {
            let addresses = match NodeAddress::from(contact_point.clone())
                .resolve_address()
                .await
            {
                Ok(addresses) => addresses,
                Err(error) => {
                    warn!(%contact_point, %error, "Cannot resolve contact point.");
                    last_error = Some(error);
                    continue;
                }
            };

            for address in addresses {
                let connection = timeout(
                    CONNECT_TIMEOUT,
                    connection_manager.connection(None, None, address),
                )
                .await
                .map_err(|_| {
                    cdrs_tokio::error::Error::Timeout(format!(
                        "Timeout waiting for connection to: {address}"
                    ))
                })
                .and_then(|result| result);

                match connection {
                    Ok(_) => {
                        debug!(%contact_point, %address, "Contact point reachable.");
                        return Ok(());
                    }
                    Err(error) => {
                        warn!(%contact_point, %address, %error, "Cannot connect to contact point.");
                        last_error = Some(error);
                    }
                }
            }
        }

        Err(Error::Connection(last_error.unwrap_or_else(|| {
            cdrs_tokio::error::Error::General("No contact point addresses".into())
        })))
    }

    async fn build_session<T>(
        &self,
        build: impl Future<Output = std::result::Result<T, SessionBuildError>>,
    ) -> Result<T> {
        match timeout(CONNECT_TIMEOUT, build).await {
            Ok(session) => session.map_err(|error| self.session_build_error(error)),
            Err(_) => Err(Error::Connection(cdrs_tokio::error::Error::Timeout(
                "Timeout waiting for session initialization".into(),
            ))),
        }
    }

    /// Opens the session. This is where the cluster is first contacted: one connection is
    /// attempted before the driver takes over, and both steps are bounded by
    /// [`CONNECT_TIMEOUT`]. Lost connections are never re-established by the session.
    pub async fn connect(&self) -> Result<CassandraSession> {
        info!(
            contact_points = %self.contact_points.iter().join(","),
            dc = %self.data_center,
            keyspace = ?self.keyspace,
            tls = self.tls.is_some(),
            "Connecting to cluster."
        );

        let authenticator_provider = self.authenticator_provider();
        let keyspace_holder = Arc::new(KeyspaceHolder::new(watch::channel(None).0));

        match &self.tls {
            None => {
                let connection_manager = TcpConnectionManager::new(
                    authenticator_provider.clone(),
                    keyspace_holder,
                    Box::new(ProtocolFrameEncodingFactory),
                    self.compression(),
                    self.transport_buffer_size(),
                    self.tcp_nodelay(),
                    Version::V4,
                );
                self.verify_reachable(&connection_manager).await?;

                let node_config = self
                    .contact_points
                    .iter()
                    .cloned()
                    .fold(NodeTcpConfigBuilder::new(), |builder, contact_point| {
                        builder.with_contact_point(contact_point.into())
                    })
                    .with_authenticator_provider(authenticator_provider)
                    .build()
                    .await?;

                let builder = TcpSessionBuilder::new(
                    TopologyAwareLoadBalancingStrategy::new(None, false),
                    node_config,
                );
                let session = self
                    .build_session(configure_session!(builder, self).build())
                    .await?;

                Ok(CassandraSession::Tcp(session))
            }
            Some(tls) => {
                let connection_manager = RustlsConnectionManager::new(
                    tls.server_name.clone(),
                    authenticator_provider.clone(),
                    tls.config.clone(),
                    keyspace_holder,
                    Box::new(ProtocolFrameEncodingFactory),
                    self.compression(),
                    self.transport_buffer_size(),
                    self.tcp_nodelay(),
                    Version::V4,
                );
                self.verify_reachable(&connection_manager).await?;

                let node_config = self
                    .contact_points
                    .iter()
                    .cloned()
                    .fold(
                        NodeRustlsConfigBuilder::new(tls.server_name.clone(), tls.config.clone()),
                        |builder, contact_point| builder.with_contact_point(contact_point.into()),
                    )
                    .with_authenticator_provider(authenticator_provider)
                    .build()
                    .await?;

                let builder = RustlsSessionBuilder::new(
                    TopologyAwareLoadBalancingStrategy::new(None, false),
                    node_config,
                );
                let session = self
                    .build_session(configure_session!(builder, self).build())
                    .await?;

                Ok(CassandraSession::Rustls(session))
            }
        }
    }
}

/// Turns connection strings into sessions. Collaborators default to reading key stores from the
/// file system and ambient TLS settings from the environment; no secret resolver is configured
/// by default.
#[derive(Clone)]
pub struct SessionBootstrap {
    secret_resolver: Option<Arc<dyn SecretResolver>>,
    keystore_loader: Arc<dyn KeyStoreLoader + Send + Sync>,
    ambient_tls: Arc<dyn AmbientTlsConfig + Send + Sync>,
}

impl Default for SessionBootstrap {
    fn default() -> Self {
        SessionBootstrap {
            secret_resolver: None,
            keystore_loader: Arc::new(FileKeyStoreLoader),
            ambient_tls: Arc::new(EnvTlsConfig),
        }
    }
}

impl SessionBootstrap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret_resolver(mut self, secret_resolver: Arc<dyn SecretResolver>) -> Self {
        self.secret_resolver = Some(secret_resolver);
        self
    }

    pub fn with_keystore_loader(
        mut self,
        keystore_loader: Arc<dyn KeyStoreLoader + Send + Sync>,
    ) -> Self {
        self.keystore_loader = keystore_loader;
        self
    }

    pub fn with_ambient_tls(mut self, ambient_tls: Arc<dyn AmbientTlsConfig + Send + Sync>) -> Self {
        self.ambient_tls = ambient_tls;
        self
    }

    pub fn parse(&self, uri: &str, properties: &HashMap<String, String>) -> Result<ConnectionConfig> {
        Ok(ConnectionConfig::parse_with(
            uri,
            properties,
            self.ambient_tls.as_ref(),
        )?)
    }

    // loaders read files synchronously
    async fn load_tls_context(
        &self,
        stores: TlsStores,
        contact_points: Vec<ContactPoint>,
    ) -> Result<Option<Arc<ClientConfig>>> {
        let loader = self.keystore_loader.clone();

        let loaded = task::spawn_blocking(move || {
            let mut client_config = None;

            // the context is rebuilt for every contact point; only the last one is kept
            for contact_point in &contact_points {
                debug!(%contact_point, "Building TLS context.");
                client_config = Some(build_tls_context(&stores, loader.as_ref())?);
            }

            Ok::<_, Error>(client_config)
        })
        .await;

        match loaded {
            Ok(client_config) => client_config,
            Err(error) if error.is_panic() => panic::resume_unwind(error.into_panic()),
            Err(error) => Err(Error::TlsConfiguration(error.to_string())),
        }
    }

    /// Resolves everything a session needs from `config`.
    pub async fn plan(&self, config: &ConnectionConfig) -> Result<SessionPlan> {
        let contact_points = contact_points(config.hosts())?;

        let tls = if config.ssl_enabled() {
            self.load_tls_context(TlsStores::from_config(config), contact_points.clone())
                .await?
        } else {
            None
        };

        let tls = match (tls, contact_points.first()) {
            (Some(client_config), Some(first)) => Some(TlsContext {
                server_name: server_name(first.host())?,
                config: client_config,
            }),
            _ => None,
        };

        let settings = match config.config_file() {
            Some(path) => DriverSettings::load(path).await?,
            None => DriverSettings::default(),
        };

        let data_center = config
            .data_center()
            .unwrap_or(DEFAULT_DATA_CENTER)
            .to_string();

        let password = resolve_password(config, self.secret_resolver.as_deref()).await?;
        let credentials = match (config.user_name(), password) {
            (Some(user_name), Some(password)) if !user_name.is_empty() => Some(Credentials {
                user_name: user_name.to_string(),
                password,
            }),
            _ => None,
        };

        Ok(SessionPlan {
            contact_points,
            tls,
            settings,
            data_center,
            credentials,
            keyspace: config.keyspace().map(str::to_string),
            config_file: config.config_file().map(Path::to_path_buf),
        })
    }

    pub async fn connect_config(&self, config: &ConnectionConfig) -> Result<CassandraSession> {
        self.plan(config).await?.connect().await
    }

    pub async fn connect(
        &self,
        uri: &str,
        properties: &HashMap<String, String>,
    ) -> Result<CassandraSession> {
        let config = self.parse(uri, properties)?;
        self.connect_config(&config).await
    }
}
