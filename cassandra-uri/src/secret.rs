use derive_more::{Constructor, Display};

/// Reference to a credential held in a remote secret store: the region hosting the store, the
/// name of the secret document and the key of the field inside it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Constructor, Display)]
#[display("{region}/{secret_name}:{secret_key}")]
pub struct SecretCoordinate {
    region: String,
    secret_name: String,
    secret_key: String,
}

impl SecretCoordinate {
    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn secret_name(&self) -> &str {
        &self.secret_name
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }
}
