//! Layered configuration: environment variables override the config file,
//! which overrides built-in defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The two configuration keys the storage layer needs, plus the env-var
/// overrides carried for parity with the rest of this workspace's config
/// story.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BlobCacheConfig {
    /// `blob-service.directory` — base directory for the storage folder.
    /// `None` means "use the OS temp directory".
    pub directory: Option<PathBuf>,

    /// `blob-service.port` — default port when the caller doesn't specify one.
    pub port: u16,
}

impl Default for BlobCacheConfig {
    fn default() -> Self {
        Self {
            directory: None,
            port: DEFAULT_PORT,
        }
    }
}

/// Default port used when no other port is configured or requested.
pub const DEFAULT_PORT: u16 = 9300;

#[derive(Debug, Deserialize, Default)]
struct FileFormat {
    #[serde(default)]
    blob_service: FileBlobService,
}

#[derive(Debug, Deserialize, Default)]
struct FileBlobService {
    directory: Option<PathBuf>,
    port: Option<u16>,
}

impl BlobCacheConfig {
    /// Load: env vars override the config file, which overrides defaults.
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        let path = Self::file_path();
        if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| Error::ConfigRead(path.clone(), e))?;
            let parsed: FileFormat =
                toml::from_str(&text).map_err(|e| Error::ConfigParse(path.clone(), e))?;
            if let Some(dir) = parsed.blob_service.directory {
                config.directory = Some(dir);
            }
            if let Some(port) = parsed.blob_service.port {
                config.port = port;
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Where the config file lives: `$BLOBCACHE_CONFIG`, else
    /// `$XDG_CONFIG_HOME/blobcache/config.toml`, else
    /// `~/.config/blobcache/config.toml`.
    pub fn file_path() -> PathBuf {
        std::env::var("BLOBCACHE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// The directory a storage folder should be created under: the
    /// configured directory, or the OS temp directory.
    pub fn storage_base(&self) -> PathBuf {
        self.directory
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("BLOBCACHE_DIRECTORY") {
            self.directory = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("BLOBCACHE_PORT") {
            if let Ok(p) = v.parse() {
                self.port = p;
            }
        }
    }
}

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
        .join("blobcache")
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}
