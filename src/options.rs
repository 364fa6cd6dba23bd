use crate::cli::UpdateArgs;
use crate::error::{CdnupError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_BRANCH_PREFIX: &str = "update-static-assets";

/// Settings for one run; built once from the command line and never mutated.
#[derive(Debug, Clone)]
pub struct UpdateOptions {
    pub repo_path: PathBuf,
    pub file_globs: Vec<String>,
    pub token: Option<String>,
    pub api_url: String,
    pub server_url: String,
    pub repository: Option<RepositorySlug>,
    pub run_id: Option<String>,
    pub branch_prefix: String,
    pub commit_message: Option<String>,
    pub user_name: String,
    pub user_email: String,
    pub labels: Vec<String>,
    pub dry_run: bool,
}

/// `owner/repo`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySlug {
    pub owner: String,
    pub name: String,
}

impl RepositorySlug {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(CdnupError::Configuration(format!(
                "Repository must be in the form owner/repo, got '{}'",
                value
            ))),
        }
    }
}

impl fmt::Display for RepositorySlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl UpdateOptions {
    /// Options for scanning `repo_path` with no remote side effects configured
    #[cfg(test)]
    pub fn local(repo_path: impl Into<PathBuf>, file_globs: Vec<String>) -> Self {
        Self {
            repo_path: repo_path.into(),
            file_globs,
            token: None,
            api_url: "https://api.github.com".to_string(),
            server_url: "https://github.com".to_string(),
            repository: None,
            run_id: None,
            branch_prefix: DEFAULT_BRANCH_PREFIX.to_string(),
            commit_message: None,
            user_name: "github-actions[bot]".to_string(),
            user_email: "41898282+github-actions[bot]@users.noreply.github.com".to_string(),
            labels: Vec::new(),
            dry_run: false,
        }
    }

    pub fn from_args(path: &str, file_globs: Vec<String>, args: &UpdateArgs) -> Result<Self> {
        let repo_path = validate_repo_path(Path::new(path))?;
        validate_base_url(&args.api_url)?;
        validate_base_url(&args.server_url)?;

        let repository = args
            .repository
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .map(RepositorySlug::parse)
            .transpose()?;

        if repository.is_none() && !args.dry_run {
            return Err(CdnupError::Configuration(
                "A repository (owner/repo) is required to open pull requests \
                 (set GITHUB_REPOSITORY, --repository or pass --dry-run)"
                    .into(),
            ));
        }

        let token = args.token.clone().filter(|t| !t.is_empty());
        if token.is_none() && !args.dry_run {
            return Err(CdnupError::Configuration(
                "A token is required to open pull requests (set GITHUB_TOKEN or --token)".into(),
            ));
        }

        let branch_prefix = args.branch_prefix.trim().trim_end_matches('/').to_string();

        Ok(Self {
            repo_path,
            file_globs: normalize_globs(file_globs),
            token,
            api_url: args.api_url.trim_end_matches('/').to_string(),
            server_url: args.server_url.trim_end_matches('/').to_string(),
            repository,
            run_id: args.run_id.clone().filter(|r| !r.is_empty()),
            branch_prefix: if branch_prefix.is_empty() {
                DEFAULT_BRANCH_PREFIX.to_string()
            } else {
                branch_prefix
            },
            commit_message: args.commit_message.clone().filter(|m| !m.trim().is_empty()),
            user_name: args.user_name.clone(),
            user_email: args.user_email.clone(),
            labels: parse_labels(args.labels.as_deref().unwrap_or_default()),
            dry_run: args.dry_run,
        })
    }

    /// Link to the workflow run that produced the update, when known
    pub fn run_url(&self) -> Option<String> {
        let repository = self.repository.as_ref()?;
        let run_id = self.run_id.as_ref()?;
        Some(format!(
            "{}/{}/actions/runs/{}",
            self.server_url, repository, run_id
        ))
    }
}

pub fn validate_repo_path(path: &Path) -> Result<PathBuf> {
    let canonical = path.canonicalize().map_err(|e| {
        CdnupError::ProjectValidation(format!("Invalid path '{}': {e}", path.display()))
    })?;

    if !canonical.is_dir() {
        return Err(CdnupError::ProjectValidation(format!(
            "Path '{}' is not a directory",
            canonical.display()
        )));
    }

    Ok(canonical)
}

fn validate_base_url(url: &str) -> Result<()> {
    let parsed = Url::parse(url)
        .map_err(|_| CdnupError::Configuration(format!("Invalid URL: {url}")))?;

    match parsed.scheme() {
        "https" | "http" => Ok(()),
        scheme => Err(CdnupError::Configuration(format!(
            "Unsupported URL scheme: {scheme}"
        ))),
    }
}

pub fn normalize_globs(globs: Vec<String>) -> Vec<String> {
    globs
        .into_iter()
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .collect()
}

fn parse_labels(labels: &str) -> Vec<String> {
    labels
        .split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
