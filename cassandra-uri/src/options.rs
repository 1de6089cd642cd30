//! Option lookup and precedence.
//!
//! Every named option is resolved by an [`OptionChain`]: an ordered list of [`OptionSource`]s
//! queried in priority order until one of them yields a value.

use std::collections::HashMap;

/// Options recognized in the connection string and in the auxiliary properties.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UriOption {
    User,
    Password,
    DataCenter,
    SslEnabled,
    TrustStore,
    TrustStorePassword,
    KeyStore,
    KeyStorePassword,
    AwsRegion,
    AwsSecretName,
    AwsSecretKey,
    ConfigFile,
}

impl UriOption {
    pub const ALL: [UriOption; 12] = [
        UriOption::User,
        UriOption::Password,
        UriOption::DataCenter,
        UriOption::SslEnabled,
        UriOption::TrustStore,
        UriOption::TrustStorePassword,
        UriOption::KeyStore,
        UriOption::KeyStorePassword,
        UriOption::AwsRegion,
        UriOption::AwsSecretName,
        UriOption::AwsSecretKey,
        UriOption::ConfigFile,
    ];

    /// Lowercase key under which the option appears in URIs and property maps.
    pub fn key(self) -> &'static str {
        match self {
            UriOption::User => "user",
            UriOption::Password => "password",
            UriOption::DataCenter => "dc",
            UriOption::SslEnabled => "sslenabled",
            UriOption::TrustStore => "javax.net.ssl.truststore",
            UriOption::TrustStorePassword => "javax.net.ssl.truststorepassword",
            UriOption::KeyStore => "javax.net.ssl.keystore",
            UriOption::KeyStorePassword => "javax.net.ssl.keystorepassword",
            UriOption::AwsRegion => "awsregion",
            UriOption::AwsSecretName => "awssecretname",
            UriOption::AwsSecretKey => "awssecretkey",
            UriOption::ConfigFile => "configfile",
        }
    }

    /// Name of the ambient TLS property used as the last fallback, if the option has one.
    pub fn ambient_property(self) -> Option<&'static str> {
        match self {
            UriOption::TrustStore => Some("javax.net.ssl.trustStore"),
            UriOption::TrustStorePassword => Some("javax.net.ssl.trustStorePassword"),
            UriOption::KeyStore => Some("javax.net.ssl.keyStore"),
            UriOption::KeyStorePassword => Some("javax.net.ssl.keyStorePassword"),
            _ => None,
        }
    }
}

/// A single layer of option values.
pub trait OptionSource {
    fn lookup(&self, option: UriOption) -> Option<String>;
}

/// Auxiliary properties are matched by the exact lowercase option key.
impl OptionSource for HashMap<String, String> {
    fn lookup(&self, option: UriOption) -> Option<String> {
        self.get(option.key()).cloned()
    }
}

/// Options segment of a connection string. Keys are lowercased; repeated keys keep all their
/// values in encounter order and lookups answer with the last one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UriOptions(HashMap<String, Vec<String>>);

impl UriOptions {
    /// Parses `key=value` pairs separated by `&` or `;`. Parts without `=` are skipped.
    pub fn parse(segment: &str) -> Self {
        let mut options: HashMap<String, Vec<String>> = HashMap::new();

        for part in segment.split(['&', ';']) {
            if let Some((key, value)) = part.split_once('=') {
                options
                    .entry(key.to_lowercase())
                    .or_default()
                    .push(value.to_string());
            }
        }

        UriOptions(options)
    }

    /// All values given for `key`, in encounter order.
    pub fn values(&self, key: &str) -> &[String] {
        self.0.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn last_value(&self, key: &str) -> Option<&str> {
        self.values(key).last().map(String::as_str)
    }
}

impl OptionSource for UriOptions {
    fn lookup(&self, option: UriOption) -> Option<String> {
        self.last_value(option.key()).map(str::to_string)
    }
}

/// Ordered chain of option sources; the first source holding a value wins.
#[derive(Clone, Default)]
pub struct OptionChain<'a> {
    sources: Vec<&'a dyn OptionSource>,
}

impl<'a> OptionChain<'a> {
    pub fn new() -> Self {
        Default::default()
    }

    /// Appends a source with lower priority than all sources added so far.
    pub fn with_source(mut self, source: &'a dyn OptionSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn resolve(&self, option: UriOption) -> Option<String> {
        self.sources
            .iter()
            .find_map(|source| source.lookup(option))
    }
}
