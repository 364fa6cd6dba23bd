use crate::assets::{AssetVersion, CdnProvider};
use crate::github::PullRequest;
use serde::Serialize;

/// One package moved to a new version on its own branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetUpdate {
    pub name: String,
    pub cdn: CdnProvider,
    /// Stale versions that were replaced
    pub from_versions: Vec<String>,
    pub version: String,
    pub pull_request_number: u64,
    pub pull_request_url: String,
}

impl AssetUpdate {
    pub fn new(target: &AssetVersion, from_versions: Vec<String>, pull_request: PullRequest) -> Self {
        Self {
            name: target.name().to_string(),
            cdn: target.asset.cdn,
            from_versions,
            version: target.version.clone(),
            pull_request_number: pull_request.number,
            pull_request_url: pull_request.url,
        }
    }
}

/// Tracks what an update run did, in processing order
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateResult {
    pub updates: Vec<AssetUpdate>,
    /// Packages whose update was aborted by an error
    pub failed: Vec<String>,
}

impl UpdateResult {
    pub fn add_update(&mut self, update: AssetUpdate) {
        self.updates.push(update);
    }

    pub fn add_failure(&mut self, name: impl Into<String>) {
        self.failed.push(name.into());
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}
