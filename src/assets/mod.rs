pub mod extractor;

pub use extractor::AssetExtractor;

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// CDN hosting a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CdnProvider {
    Cdnjs,
    Jsdelivr,
}

impl fmt::Display for CdnProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CdnProvider::Cdnjs => "cdnjs",
            CdnProvider::Jsdelivr => "jsdelivr",
        };
        f.write_str(label)
    }
}

/// A package on a CDN, identified by provider and name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Asset {
    pub cdn: CdnProvider,
    pub name: String,
}

impl Asset {
    pub fn new(cdn: CdnProvider, name: impl Into<String>) -> Self {
        Self {
            cdn,
            name: name.into(),
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.cdn)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetVersion {
    pub asset: Asset,
    pub version: String,
}

impl AssetVersion {
    pub fn new(asset: Asset, version: impl Into<String>) -> Self {
        Self {
            asset,
            version: version.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.asset.name
    }
}

/// One occurrence of a CDN asset inside a markup file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetVersionItem {
    pub asset_version: AssetVersion,
    /// Full URL exactly as written in the markup
    pub url: String,
    pub integrity: Option<String>,
    /// Path of the file inside the CDN package
    pub file_name: String,
}

impl AssetVersionItem {
    pub fn asset(&self) -> &Asset {
        &self.asset_version.asset
    }

    pub fn version(&self) -> &str {
        &self.asset_version.version
    }
}

/// Asset occurrences per scanned file, in scan order
pub type FileAssetMap = IndexMap<PathBuf, Vec<AssetVersionItem>>;
