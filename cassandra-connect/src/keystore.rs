//! Key and trust store loading.
//!
//! Stores are either PEM bundles or PKCS#12 archives. A PEM bundle carrying a private key is an
//! identity (key plus certificate chain); a bundle without a key holds trusted certificates only.
//! PKCS#12 archives map their private key chain to the identity and their trusted certificate
//! entries to trusted certificates.

use itertools::Itertools;
use p12_keystore::{KeyStore as Pkcs12Store, KeyStoreEntry};
use secrecy::{ExposeSecret, SecretString};
use std::fmt::{self, Debug, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use tracing::*;

#[cfg(test)]
use mockall::*;

use crate::error::{Error, Result};

const PEM_ARMOUR: &[u8] = b"-----BEGIN ";

/// Location of a store on disk along with the password protecting it.
#[derive(Clone, Debug)]
pub struct StoreLocation {
    path: PathBuf,
    password: Option<SecretString>,
}

impl StoreLocation {
    pub fn new(path: impl Into<PathBuf>, password: Option<SecretString>) -> Self {
        StoreLocation {
            path: path.into(),
            password,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn password(&self) -> Option<&SecretString> {
        self.password.as_ref()
    }
}

impl PartialEq for StoreLocation {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.password.as_ref().map(ExposeSecret::expose_secret)
                == other.password.as_ref().map(ExposeSecret::expose_secret)
    }
}

/// Private key with the certificate chain presented alongside it, leaf first.
pub struct Identity {
    chain: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
}

impl Identity {
    pub fn new(chain: Vec<CertificateDer<'static>>, key: PrivateKeyDer<'static>) -> Self {
        Identity { chain, key }
    }

    pub fn into_parts(self) -> (Vec<CertificateDer<'static>>, PrivateKeyDer<'static>) {
        (self.chain, self.key)
    }
}

impl Debug for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("chain", &self.chain.len())
            .finish_non_exhaustive()
    }
}

/// Loaded store contents.
#[derive(Debug, Default)]
pub struct KeyStore {
    identity: Option<Identity>,
    trusted: Vec<CertificateDer<'static>>,
}

impl KeyStore {
    pub fn new(identity: Option<Identity>, trusted: Vec<CertificateDer<'static>>) -> Self {
        KeyStore { identity, trusted }
    }

    /// Store without any entries, used in place of a store which was not configured.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn trusted(&self) -> &[CertificateDer<'static>] {
        &self.trusted
    }

    /// Every certificate in the store: trusted entries and the identity chain.
    pub fn certificates(&self) -> impl Iterator<Item = &CertificateDer<'static>> {
        self.trusted
            .iter()
            .chain(self.identity.iter().flat_map(|identity| identity.chain.iter()))
    }

    pub fn into_identity(self) -> Option<Identity> {
        self.identity
    }
}

/// Loads key material from a store location.
#[cfg_attr(test, automock)]
pub trait KeyStoreLoader {
    fn load(&self, location: &StoreLocation) -> Result<KeyStore>;
}

/// Loads stores from the file system. The file is read in full and closed before parsing; reads
/// block the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileKeyStoreLoader;

impl KeyStoreLoader for FileKeyStoreLoader {
    fn load(&self, location: &StoreLocation) -> Result<KeyStore> {
        let path = location.path();
        let contents = fs::read(path).map_err(|error| {
            Error::TlsConfiguration(format!("cannot read {}: {}", path.display(), error))
        })?;

        let store = if is_pem(&contents) {
            read_pem(&contents)
        } else {
            let password = location
                .password()
                .map(|password| password.expose_secret().as_str())
                .unwrap_or_default();
            read_pkcs12(&contents, password)
        }
        .map_err(|reason| {
            Error::TlsConfiguration(format!("invalid store {}: {}", path.display(), reason))
        })?;

        debug!(
            path = %path.display(),
            identity = store.identity.is_some(),
            trusted = store.trusted.len(),
            "Loaded key store."
        );

        Ok(store)
    }
}

fn is_pem(contents: &[u8]) -> bool {
    contents
        .windows(PEM_ARMOUR.len())
        .any(|window| window == PEM_ARMOUR)
}

fn read_pem(mut contents: &[u8]) -> std::result::Result<KeyStore, String> {
    let mut certificates = vec![];
    let mut keys = vec![];

    for item in rustls_pemfile::read_all(&mut contents) {
        match item.map_err(|error| error.to_string())? {
            rustls_pemfile::Item::X509Certificate(certificate) => certificates.push(certificate),
            rustls_pemfile::Item::Pkcs1Key(key) => keys.push(PrivateKeyDer::from(key)),
            rustls_pemfile::Item::Pkcs8Key(key) => keys.push(PrivateKeyDer::from(key)),
            rustls_pemfile::Item::Sec1Key(key) => keys.push(PrivateKeyDer::from(key)),
            _ => {}
        }
    }

    if keys.len() > 1 {
        return Err(format!(
            "expected at most one private key, found {}",
            keys.len()
        ));
    }

    match keys.pop() {
        Some(_) if certificates.is_empty() => Err("private key without a certificate".into()),
        Some(key) => Ok(KeyStore::new(
            Some(Identity::new(certificates, key)),
            vec![],
        )),
        None => Ok(KeyStore::new(None, certificates)),
    }
}

fn read_pkcs12(contents: &[u8], password: &str) -> std::result::Result<KeyStore, String> {
    let store = Pkcs12Store::from_pkcs12(contents, password).map_err(|error| error.to_string())?;

    let identity = store.private_key_chain().map(|(alias, chain)| {
        debug!(alias, "Using private key chain.");
        Identity::new(
            chain
                .chain()
                .iter()
                .map(|certificate| CertificateDer::from(certificate.as_der().to_vec()))
                .collect(),
            PrivatePkcs8KeyDer::from(chain.key().to_vec()).into(),
        )
    });

    let trusted = store
        .entries()
        .filter_map(|(_, entry)| match entry {
            KeyStoreEntry::Certificate(certificate) => {
                Some(CertificateDer::from(certificate.as_der().to_vec()))
            }
            KeyStoreEntry::PrivateKeyChain(_) => None,
        })
        .collect_vec();

    Ok(KeyStore::new(identity, trusted))
}
