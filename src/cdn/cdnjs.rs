use crate::cdn::{CdnClient, CdnFile};
use crate::error::{CdnupError, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

const CDNJS_API: &str = "https://api.cdnjs.com/libraries";
const CDNJS_FILES: &str = "https://cdnjs.cloudflare.com/ajax/libs";

/// cdnjs API client
pub struct CdnjsClient {
    client: Client,
}

impl CdnjsClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn get<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<Option<T>> {
        debug!(url, "fetching from cdnjs");

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| CdnupError::CdnRequest(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            debug!(url, status = %response.status(), "cdnjs returned no data");
            return Ok(None);
        }

        let body = response
            .json::<T>()
            .map_err(|e| CdnupError::CdnRequest(format!("Invalid cdnjs response from {}: {}", url, e)))?;
        Ok(Some(body))
    }
}

impl CdnClient for CdnjsClient {
    fn latest_version(&self, name: &str) -> Result<Option<String>> {
        let url = format!("{}/{}?fields=version", CDNJS_API, name);
        let library: Option<LibraryResponse> = self.get(&url)?;
        Ok(library.and_then(|l| l.version).filter(|v| !v.is_empty()))
    }

    fn files(&self, name: &str, version: &str) -> Result<Vec<CdnFile>> {
        let url = format!("{}/{}/{}?fields=files,sri", CDNJS_API, name, version);
        let listing: Option<VersionResponse> = self.get(&url)?;
        Ok(listing
            .map(|listing| listing.into_files(name, version))
            .unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
struct LibraryResponse {
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    #[serde(default)]
    files: Vec<String>,
    #[serde(default)]
    sri: HashMap<String, String>,
}

impl VersionResponse {
    fn into_files(mut self, name: &str, version: &str) -> Vec<CdnFile> {
        self.files
            .into_iter()
            .map(|file_name| CdnFile {
                url: format!("{}/{}/{}/{}", CDNJS_FILES, name, version, file_name),
                integrity: self.sri.remove(&file_name),
                file_name,
            })
            .collect()
    }
}
