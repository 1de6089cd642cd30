use cdrs_tokio::compression::Compression;
use serde::Deserialize;
use std::path::Path;
use tracing::*;

use crate::error::{Error, Result};

/// Frame compression negotiated with the cluster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionSetting {
    #[default]
    None,
    Lz4,
    Snappy,
}

impl From<CompressionSetting> for Compression {
    fn from(setting: CompressionSetting) -> Self {
        match setting {
            CompressionSetting::None => Compression::None,
            CompressionSetting::Lz4 => Compression::Lz4,
            CompressionSetting::Snappy => Compression::Snappy,
        }
    }
}

/// Driver settings beyond the options of the connection string, read from the JSON document
/// named by the `configfile` option. Unset fields keep the driver defaults.
///
/// ```json
/// { "compression": "lz4", "tcp_nodelay": true, "transport_buffer_size": 1048576 }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriverSettings {
    pub compression: Option<CompressionSetting>,
    pub tcp_nodelay: Option<bool>,
    pub transport_buffer_size: Option<usize>,
}

impl DriverSettings {
    /// Parses settings from JSON; `path` is only used in error messages.
    pub fn from_json(path: &Path, json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|error| Error::DriverConfig {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|error| Error::DriverConfig {
                path: path.to_path_buf(),
                reason: error.to_string(),
            })?;

        let settings = Self::from_json(path, &json)?;
        debug!(path = %path.display(), ?settings, "Loaded driver settings.");

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_json() {
        let settings = DriverSettings::from_json(
            Path::new("driver.json"),
            r#"{"compression": "snappy", "transport_buffer_size": 4096}"#,
        )
        .unwrap();

        assert_eq!(settings.compression, Some(CompressionSetting::Snappy));
        assert_eq!(settings.tcp_nodelay, None);
        assert_eq!(settings.transport_buffer_size, Some(4096));
    }

    #[test]
    fn test_empty_document_keeps_defaults() {
        let settings = DriverSettings::from_json(Path::new("driver.json"), "{}").unwrap();
        assert_eq!(settings, DriverSettings::default());
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let error = DriverSettings::from_json(Path::new("driver.json"), r#"{"compresion": "lz4"}"#)
            .unwrap_err();

        assert!(matches!(error, Error::DriverConfig { .. }));
        assert!(error.to_string().contains("driver.json"));
    }

    #[test]
    fn test_compression_mapping() {
        assert!(matches!(
            Compression::from(CompressionSetting::Lz4),
            Compression::Lz4
        ));
        assert!(matches!(
            Compression::from(CompressionSetting::default()),
            Compression::None
        ));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"compression": "lz4", "tcp_nodelay": false}}"#).unwrap();

        let settings = DriverSettings::load(file.path()).await.unwrap();

        assert_eq!(settings.compression, Some(CompressionSetting::Lz4));
        assert_eq!(settings.tcp_nodelay, Some(false));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        assert!(matches!(
            DriverSettings::load(Path::new("/nonexistent/driver.json")).await,
            Err(Error::DriverConfig { .. })
        ));
    }
}
