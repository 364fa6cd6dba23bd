use crate::error::{CdnupError, Result};
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Request to open a pull request on `owner/repo`
#[derive(Debug, Clone, Serialize)]
pub struct NewPullRequest {
    #[serde(skip)]
    pub owner: String,
    #[serde(skip)]
    pub repo: String,
    pub title: String,
    pub head: String,
    pub base: String,
    pub body: String,
    pub maintainer_can_modify: bool,
    pub draft: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(rename = "html_url")]
    pub url: String,
}

impl PullRequest {
    /// Stand-in returned when no pull request was actually opened
    pub fn placeholder() -> Self {
        Self {
            number: 0,
            url: String::new(),
        }
    }
}

pub trait PullRequestService {
    fn create_pull_request(&self, request: &NewPullRequest) -> Result<PullRequest>;

    fn add_labels(&self, owner: &str, repo: &str, number: u64, labels: &[String]) -> Result<()>;
}

/// GitHub REST API client
pub struct GitHubClient {
    client: Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(api_url: &str, token: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("cdnup/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CdnupError::PullRequest(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response> {
        let url = format!("{}{}", self.api_url, path);
        debug!(url = %url, "POST to GitHub");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .json(body)
            .send()?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let detail = response.text().unwrap_or_default();
        Err(CdnupError::PullRequest(format!(
            "POST {} returned {}: {}",
            path, status, detail
        )))
    }
}

impl PullRequestService for GitHubClient {
    fn create_pull_request(&self, request: &NewPullRequest) -> Result<PullRequest> {
        let path = format!("/repos/{}/{}/pulls", request.owner, request.repo);
        let pull_request = self.post(&path, request)?.json::<PullRequest>()?;
        Ok(pull_request)
    }

    fn add_labels(&self, owner: &str, repo: &str, number: u64, labels: &[String]) -> Result<()> {
        let path = format!("/repos/{}/{}/issues/{}/labels", owner, repo, number);
        self.post(&path, &LabelsRequest { labels })?;
        Ok(())
    }
}

#[derive(Serialize)]
struct LabelsRequest<'a> {
    labels: &'a [String],
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;

    /// Records requests and hands out increasing pull request numbers
    #[derive(Default)]
    pub struct FakePullRequests {
        pub created: RefCell<Vec<NewPullRequest>>,
        pub labelled: RefCell<Vec<(u64, Vec<String>)>>,
        pub fail_labels: bool,
    }

    impl PullRequestService for FakePullRequests {
        fn create_pull_request(&self, request: &NewPullRequest) -> Result<PullRequest> {
            let mut created = self.created.borrow_mut();
            created.push(request.clone());
            let number = created.len() as u64;
            Ok(PullRequest {
                number,
                url: format!(
                    "https://github.com/{}/{}/pull/{}",
                    request.owner, request.repo, number
                ),
            })
        }

        fn add_labels(&self, _owner: &str, _repo: &str, number: u64, labels: &[String]) -> Result<()> {
            if self.fail_labels {
                return Err(CdnupError::PullRequest("label not found".to_string()));
            }
            self.labelled.borrow_mut().push((number, labels.to_vec()));
            Ok(())
        }
    }
}
