use crate::assets::AssetVersion;
use crate::error::{CdnupError, Result};
use crate::github::{NewPullRequest, PullRequest, PullRequestService};
use crate::options::UpdateOptions;
use tracing::{error, info};

/// ChangePublisher opens the pull request for a pushed update branch
pub struct ChangePublisher<'a> {
    service: &'a dyn PullRequestService,
    options: &'a UpdateOptions,
}

impl<'a> ChangePublisher<'a> {
    pub fn new(service: &'a dyn PullRequestService, options: &'a UpdateOptions) -> Self {
        Self { service, options }
    }

    pub fn publish(&self, base: &str, head: &str, target: &AssetVersion) -> Result<PullRequest> {
        let title = pull_request_title(target);

        if self.options.dry_run {
            info!(base, head, title = %title, "dry run: not opening pull request");
            return Ok(PullRequest::placeholder());
        }

        let repository = self.options.repository.as_ref().ok_or_else(|| {
            CdnupError::Configuration(
                "No repository configured to open pull requests against".to_string(),
            )
        })?;

        let request = NewPullRequest {
            owner: repository.owner.clone(),
            repo: repository.name.clone(),
            title,
            head: head.to_string(),
            base: base.to_string(),
            body: self.pull_request_body(target),
            maintainer_can_modify: true,
            draft: false,
        };

        let pull_request = self.service.create_pull_request(&request)?;
        info!(number = pull_request.number, url = %pull_request.url, "opened pull request");

        // The pull request exists at this point; a labelling problem must not undo that
        if !self.options.labels.is_empty() {
            if let Err(e) = self.service.add_labels(
                &repository.owner,
                &repository.name,
                pull_request.number,
                &self.options.labels,
            ) {
                error!(number = pull_request.number, error = %e, "failed to apply labels");
            }
        }

        Ok(pull_request)
    }

    fn pull_request_body(&self, target: &AssetVersion) -> String {
        let mut body = format!(
            "Updates {} to version {}.",
            target.name(),
            target.version
        );

        if let Some(run_url) = self.options.run_url() {
            body.push_str(&format!(
                "\n\nThis pull request was created by [this workflow run]({}).",
                run_url
            ));
        }

        body
    }
}

pub fn pull_request_title(target: &AssetVersion) -> String {
    format!("Update {} to {}", target.name(), target.version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{Asset, CdnProvider};
    use crate::github::testing::FakePullRequests;
    use crate::options::RepositorySlug;

    fn options() -> UpdateOptions {
        let mut options = UpdateOptions::local("/tmp", vec!["*.html".to_string()]);
        options.repository = Some(RepositorySlug::parse("octo/site").unwrap());
        options.token = Some("token".to_string());
        options.run_id = Some("99".to_string());
        options
    }

    fn target() -> AssetVersion {
        AssetVersion::new(Asset::new(CdnProvider::Cdnjs, "foo"), "2.0.0")
    }

    #[test]
    fn opens_pull_request_with_title_and_body() {
        let service = FakePullRequests::default();
        let options = options();
        let publisher = ChangePublisher::new(&service, &options);

        let pr = publisher.publish("main", "update-static-assets/foo/2.0.0", &target()).unwrap();

        assert_eq!(pr.number, 1);
        let created = service.created.borrow();
        assert_eq!(created[0].title, "Update foo to 2.0.0");
        assert_eq!(created[0].base, "main");
        assert_eq!(created[0].head, "update-static-assets/foo/2.0.0");
        assert!(created[0].body.contains("version 2.0.0"));
        assert!(created[0].body.contains("https://github.com/octo/site/actions/runs/99"));
        assert!(service.labelled.borrow().is_empty());
    }

    #[test]
    fn applies_labels() {
        let service = FakePullRequests::default();
        let mut options = options();
        options.labels = vec!["dependencies".to_string(), "cdn".to_string()];
        let publisher = ChangePublisher::new(&service, &options);

        publisher.publish("main", "head", &target()).unwrap();

        assert_eq!(
            *service.labelled.borrow(),
            vec![(1, vec!["dependencies".to_string(), "cdn".to_string()])]
        );
    }

    #[test]
    fn label_failure_keeps_pull_request() {
        let service = FakePullRequests {
            fail_labels: true,
            ..FakePullRequests::default()
        };
        let mut options = options();
        options.labels = vec!["missing".to_string()];
        let publisher = ChangePublisher::new(&service, &options);

        let pr = publisher.publish("main", "head", &target()).unwrap();
        assert_eq!(pr.number, 1);
    }

    #[test]
    fn dry_run_returns_placeholder_without_calls() {
        let service = FakePullRequests::default();
        let mut options = options();
        options.dry_run = true;
        let publisher = ChangePublisher::new(&service, &options);

        let pr = publisher.publish("main", "head", &target()).unwrap();

        assert_eq!(pr, PullRequest::placeholder());
        assert!(service.created.borrow().is_empty());
    }

    #[test]
    fn requires_repository() {
        let service = FakePullRequests::default();
        let mut options = options();
        options.repository = None;
        let publisher = ChangePublisher::new(&service, &options);

        assert!(publisher.publish("main", "head", &target()).is_err());
    }
}
