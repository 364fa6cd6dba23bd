use crate::assets::CdnProvider;
use crate::error::{CdnupError, Result};
use reqwest::blocking::Client;
use std::time::Duration;

pub mod cdnjs;
pub mod jsdelivr;

pub use cdnjs::CdnjsClient;
pub use jsdelivr::JsdelivrClient;

/// A file published in one version of a CDN package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdnFile {
    pub url: String,
    pub file_name: String,
    pub integrity: Option<String>,
}

pub trait CdnClient {
    /// Latest published version, or `None` when the package is unknown
    fn latest_version(&self, name: &str) -> Result<Option<String>>;

    fn files(&self, name: &str, version: &str) -> Result<Vec<CdnFile>>;
}

/// One client per supported CDN, selected by provider
pub struct CdnClients {
    cdnjs: Box<dyn CdnClient>,
    jsdelivr: Box<dyn CdnClient>,
}

impl CdnClients {
    pub fn new() -> Result<Self> {
        let client = build_http_client()?;
        Ok(Self::with_clients(
            Box::new(CdnjsClient::new(client.clone())),
            Box::new(JsdelivrClient::new(client)),
        ))
    }

    pub fn with_clients(cdnjs: Box<dyn CdnClient>, jsdelivr: Box<dyn CdnClient>) -> Self {
        Self { cdnjs, jsdelivr }
    }

    pub fn for_provider(&self, provider: CdnProvider) -> &dyn CdnClient {
        match provider {
            CdnProvider::Cdnjs => self.cdnjs.as_ref(),
            CdnProvider::Jsdelivr => self.jsdelivr.as_ref(),
        }
    }
}

pub(crate) fn build_http_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(concat!("cdnup/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| CdnupError::CdnRequest(format!("Failed to build HTTP client: {}", e)))
}
