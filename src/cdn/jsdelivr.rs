use crate::cdn::{CdnClient, CdnFile};
use crate::error::{CdnupError, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

const JSDELIVR_API: &str = "https://data.jsdelivr.com/v1/packages/npm";
const JSDELIVR_FILES: &str = "https://cdn.jsdelivr.net/npm";

/// jsDelivr data API client for npm packages
pub struct JsdelivrClient {
    client: Client,
}

impl JsdelivrClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn get<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<Option<T>> {
        debug!(url, "fetching from jsdelivr");

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| CdnupError::CdnRequest(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            debug!(url, status = %response.status(), "jsdelivr returned no data");
            return Ok(None);
        }

        let body = response.json::<T>().map_err(|e| {
            CdnupError::CdnRequest(format!("Invalid jsdelivr response from {}: {}", url, e))
        })?;
        Ok(Some(body))
    }
}

impl CdnClient for JsdelivrClient {
    fn latest_version(&self, name: &str) -> Result<Option<String>> {
        let url = format!("{}/{}/resolved", JSDELIVR_API, name);
        let resolved: Option<ResolvedResponse> = self.get(&url)?;
        Ok(resolved.and_then(|r| r.version))
    }

    fn files(&self, name: &str, version: &str) -> Result<Vec<CdnFile>> {
        let url = format!("{}/{}@{}?structure=flat", JSDELIVR_API, name, version);
        let listing: Option<FlatListing> = self.get(&url)?;
        Ok(listing
            .map(|listing| listing.into_files(name, version))
            .unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
struct ResolvedResponse {
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FlatListing {
    #[serde(default)]
    files: Vec<FlatFile>,
}

#[derive(Debug, Deserialize)]
struct FlatFile {
    /// Package-relative path with a leading `/`
    name: String,
    /// Base64 SHA-256 of the file
    hash: Option<String>,
}

impl FlatListing {
    fn into_files(self, name: &str, version: &str) -> Vec<CdnFile> {
        self.files
            .into_iter()
            .map(|file| CdnFile {
                url: format!("{}/{}@{}{}", JSDELIVR_FILES, name, version, file.name),
                integrity: file
                    .hash
                    .filter(|h| !h.is_empty())
                    .map(|h| format!("sha256-{}", h)),
                file_name: file.name,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_file_listing_from_flat_structure() {
        let json = r#"{
            "type": "npm",
            "name": "bootstrap",
            "version": "5.3.2",
            "default": "/dist/js/bootstrap.min.js",
            "files": [
                { "name": "/dist/css/bootstrap.min.css", "hash": "abc=", "size": 10 },
                { "name": "/README.md", "size": 3 }
            ]
        }"#;
        let listing: FlatListing = serde_json::from_str(json).unwrap();
        let files = listing.into_files("bootstrap", "5.3.2");

        assert_eq!(
            files[0],
            CdnFile {
                url: "https://cdn.jsdelivr.net/npm/bootstrap@5.3.2/dist/css/bootstrap.min.css"
                    .to_string(),
                file_name: "/dist/css/bootstrap.min.css".to_string(),
                integrity: Some("sha256-abc=".to_string()),
            }
        );
        assert_eq!(files[1].integrity, None);
    }

    #[test]
    fn unresolved_version_is_none() {
        let resolved: ResolvedResponse =
            serde_json::from_str(r#"{"type": "npm", "name": "nope", "version": null}"#).unwrap();
        assert_eq!(resolved.version, None);
    }
}
