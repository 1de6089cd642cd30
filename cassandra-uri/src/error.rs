use std::result;
use thiserror::Error as ThisError;

pub type Result<T> = result::Result<T, Error>;

/// Errors raised while interpreting a connection string. URIs carried by the variants are
/// always masked, so errors can be logged or displayed as they are.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
    /// The connection string lacks the required scheme prefix.
    #[error("Malformed URI '{uri}': it needs to start with {}", crate::PREFIX)]
    MalformedUri { uri: String },
    /// One of the comma separated host specifiers is empty.
    #[error("Malformed URI '{uri}': host #{position} is empty")]
    EmptyHost { uri: String, position: usize },
}
