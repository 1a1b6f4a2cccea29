//! Asset resolution.
//!
//! The engine and the credits command both resolve logical asset names
//! through this seam; the transport behind it is out of scope and
//! replaceable (filesystem here, bundled archives or test fixtures
//! elsewhere).

use std::fs;
use std::io;
use std::path::PathBuf;

use crate::error::AssetError;

/// Logical name of the credits text resource.
pub const CREDITS_ASSET: &str = "legal.txt";

/// Resolves logical asset names to bytes and engine-consumable URLs.
pub trait AssetProvider: Send + Sync {
    /// Read the full contents of the named asset.
    fn read(&self, name: &str) -> Result<Vec<u8>, AssetError>;

    /// URL string handed to engine playback calls for the named asset.
    fn asset_url(&self, name: &str) -> String {
        format!("asset:///{}", name)
    }
}

/// Filesystem-backed asset provider rooted at a single directory.
pub struct DirAssetProvider {
    root: PathBuf,
}

impl DirAssetProvider {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

impl AssetProvider for DirAssetProvider {
    fn read(&self, name: &str) -> Result<Vec<u8>, AssetError> {
        let path = self.root.join(name);
        fs::read(&path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => AssetError::NotFound {
                name: name.to_string(),
            },
            _ => AssetError::ReadFailed {
                name: name.to_string(),
                reason: err.to_string(),
            },
        })
    }
}
