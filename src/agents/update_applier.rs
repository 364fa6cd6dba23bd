use crate::agents::commit_message::generate_commit_message;
use crate::agents::version_control::VersionControlAgent;
use crate::assets::{AssetVersion, FileAssetMap};
use crate::cdn::CdnFile;
use crate::error::Result;
use crate::options::{DEFAULT_BRANCH_PREFIX, UpdateOptions};
use crate::version::VersionComparator;
use std::fs;
use tracing::{debug, info};

/// Result of rewriting the markup files for one package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchOutcome {
    pub files_updated: usize,
    /// Versions that were replaced, in the order first seen
    pub replaced_versions: Vec<String>,
    /// Lowest version that was replaced
    pub lowest_version: Option<String>,
}

/// A package committed on its update branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedUpdate {
    pub branch: String,
    pub replaced_versions: Vec<String>,
}

/// Rewrite every stale reference to `target` whose replacement exists in
/// `cdn_files`. Files are only written when at least one reference changed.
pub fn patch_files(
    file_assets: &FileAssetMap,
    target: &AssetVersion,
    cdn_files: &[CdnFile],
) -> Result<PatchOutcome> {
    let mut outcome = PatchOutcome::default();

    for (path, items) in file_assets {
        let stale: Vec<_> = items
            .iter()
            .filter(|item| item.asset() == &target.asset && item.version() != target.version)
            .collect();
        if stale.is_empty() {
            continue;
        }

        let mut content = fs::read_to_string(path)?;
        let mut replacements = 0;

        for item in stale {
            if !content.contains(&item.url) {
                continue;
            }

            let Some(replacement) = cdn_files.iter().find(|f| f.file_name == item.file_name)
            else {
                debug!(
                    path = %path.display(),
                    file = %item.file_name,
                    version = %target.version,
                    "file no longer published, leaving reference as is"
                );
                continue;
            };

            content = content.replace(&item.url, &replacement.url);
            if let Some(integrity) = &item.integrity {
                content = content.replace(integrity, replacement.integrity.as_deref().unwrap_or(""));
            }
            replacements += 1;

            if !outcome.replaced_versions.iter().any(|v| v == item.version()) {
                outcome.replaced_versions.push(item.version().to_string());
            }
            outcome.lowest_version = Some(match outcome.lowest_version.take() {
                Some(lowest) => VersionComparator::lowest(&lowest, item.version()).to_string(),
                None => item.version().to_string(),
            });
        }

        if replacements > 0 {
            fs::write(path, &content)?;
            outcome.files_updated += 1;
            debug!(path = %path.display(), replacements, "rewrote markup file");
        }
    }

    Ok(outcome)
}

/// `<prefix>/<name>/<version>`, lower-cased
pub fn branch_name(prefix: &str, target: &AssetVersion) -> String {
    let prefix = if prefix.is_empty() {
        DEFAULT_BRANCH_PREFIX
    } else {
        prefix
    };
    format!("{}/{}/{}", prefix, target.name(), target.version).to_lowercase()
}

/// UpdateApplier turns one stale package into a committed update branch
pub struct UpdateApplier<'a> {
    git: &'a VersionControlAgent,
    options: &'a UpdateOptions,
    push_enabled: bool,
}

impl<'a> UpdateApplier<'a> {
    pub fn new(git: &'a VersionControlAgent, options: &'a UpdateOptions, has_remote: bool) -> Self {
        Self {
            git,
            options,
            push_enabled: has_remote && !options.dry_run,
        }
    }

    /// Patch files, then branch, commit and push. Returns the new branch, or
    /// `None` when there was nothing to change or the branch is already on
    /// the remote.
    pub fn apply(
        &self,
        base_branch: &str,
        file_assets: &FileAssetMap,
        target: &AssetVersion,
        cdn_files: &[CdnFile],
    ) -> Result<Option<AppliedUpdate>> {
        let branch = branch_name(&self.options.branch_prefix, target);

        if self.git.remote_branch_exists(&branch)? {
            info!(branch = %branch, "update branch already exists on remote, skipping");
            return Ok(None);
        }

        let outcome = patch_files(file_assets, target, cdn_files)?;
        if outcome.files_updated == 0 {
            info!(asset = %target.asset, "no references could be updated, skipping");
            return Ok(None);
        }

        let message = match &self.options.commit_message {
            Some(message) => message.clone(),
            None => generate_commit_message(
                target.name(),
                outcome.lowest_version.as_deref().unwrap_or(&target.version),
                &target.version,
            ),
        };

        self.git.create_branch(&branch, base_branch)?;
        self.git.stage_all()?;
        self.git.commit(&message)?;

        if self.push_enabled {
            self.git.push(&branch)?;
            info!(branch = %branch, "pushed update branch");
        } else {
            debug!(branch = %branch, "push skipped");
        }

        Ok(Some(AppliedUpdate {
            branch,
            replaced_versions: outcome.replaced_versions,
        }))
    }
}
