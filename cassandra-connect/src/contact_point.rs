use cdrs_tokio::cluster::NodeAddress;
use derive_more::Display;

use crate::error::{Error, Result};

/// Native protocol port used until a host specifier names another one.
pub const DEFAULT_PORT: u16 = 9042;

/// Node address used to bootstrap cluster discovery.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Display)]
#[display("{host}:{port}")]
pub struct ContactPoint {
    host: String,
    port: u16,
}

impl ContactPoint {
    /// Parses a `host` or `host:port` specifier, using `default_port` when no port is given.
    pub fn parse(specifier: &str, default_port: u16) -> Result<Self> {
        match specifier.find(':') {
            Some(idx) if idx > 0 => {
                let port = specifier[idx + 1..].trim();
                let port = port.parse().map_err(|_| Error::InvalidContactPoint {
                    host: specifier.to_string(),
                    reason: format!("'{}' is not a valid port", port),
                })?;

                Ok(ContactPoint {
                    host: specifier[..idx].trim().to_string(),
                    port,
                })
            }
            _ => Ok(ContactPoint {
                host: specifier.to_string(),
                port: default_port,
            }),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

/// Parses host specifiers in order. A port given on one specifier becomes the default for the
/// following specifiers which omit theirs.
pub fn contact_points<S: AsRef<str>>(specifiers: &[S]) -> Result<Vec<ContactPoint>> {
    let mut port = DEFAULT_PORT;
    specifiers
        .iter()
        .map(|specifier| {
            let contact_point = ContactPoint::parse(specifier.as_ref(), port)?;
            port = contact_point.port;
            Ok(contact_point)
        })
        .collect()
}

impl From<ContactPoint> for NodeAddress {
    fn from(contact_point: ContactPoint) -> Self {
        NodeAddress::Hostname(contact_point.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_without_port() {
        let contact_point = ContactPoint::parse("node1", 9000).unwrap();

        assert_eq!(contact_point.host(), "node1");
        assert_eq!(contact_point.port(), 9000);
    }

    #[test]
    fn test_parse_trims_host_and_port() {
        let contact_point = ContactPoint::parse(" node1 : 9043 ", DEFAULT_PORT).unwrap();

        assert_eq!(contact_point.host(), "node1");
        assert_eq!(contact_point.port(), 9043);
        assert_eq!(contact_point.to_string(), "node1:9043");
    }

    #[test]
    fn test_parse_rejects_invalid_port() {
        assert!(matches!(
            ContactPoint::parse("node1:cql", DEFAULT_PORT),
            Err(Error::InvalidContactPoint { .. })
        ));
        assert!(matches!(
            ContactPoint::parse("node1:70000", DEFAULT_PORT),
            Err(Error::InvalidContactPoint { .. })
        ));
    }

    #[test]
    fn test_port_carries_over_to_following_hosts() {
        let ports = contact_points(&["h1", "h2:9043", "h3", "h4:9050", "h5"])
            .unwrap()
            .iter()
            .map(ContactPoint::port)
            .collect::<Vec<_>>();

        assert_eq!(ports, vec![9042, 9043, 9043, 9050, 9050]);
    }

    #[test]
    fn test_node_address_conversion() {
        let address: NodeAddress = ContactPoint::parse("10.0.0.1:9142", DEFAULT_PORT)
            .unwrap()
            .into();
        assert!(address == NodeAddress::Hostname("10.0.0.1:9142".into()));
    }
}
