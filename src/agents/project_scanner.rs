use crate::assets::{AssetExtractor, FileAssetMap};
use crate::error::{CdnupError, Result};
use indexmap::IndexSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// ProjectScannerAgent finds the markup files of a repository and the CDN
/// assets they reference
pub struct ProjectScannerAgent {
    project_path: PathBuf,
    file_globs: Vec<String>,
}

impl ProjectScannerAgent {
    pub fn new<P: AsRef<Path>>(project_path: P, file_globs: &[String]) -> Self {
        Self {
            project_path: project_path.as_ref().to_path_buf(),
            file_globs: file_globs.to_vec(),
        }
    }

    /// Validates the project structure
    pub fn validate(&self) -> Result<ProjectInfo> {
        if !self.project_path.is_dir() {
            return Err(CdnupError::ProjectValidation(format!(
                "'{}' is not a directory",
                self.project_path.display()
            )));
        }

        if self.file_globs.is_empty() {
            return Err(CdnupError::Configuration(
                "No file patterns configured to scan".to_string(),
            ));
        }

        let git_dir = self.project_path.join(".git");
        Ok(ProjectInfo {
            project_path: self.project_path.clone(),
            has_git: git_dir.exists(),
        })
    }

    /// Markup files matching any configured glob, in glob order, without
    /// duplicates and never inside `.git`
    pub fn markup_files(&self) -> Result<Vec<PathBuf>> {
        let root = glob::Pattern::escape(&self.project_path.to_string_lossy());
        let mut files = IndexSet::new();

        for pattern in &self.file_globs {
            let pattern = pattern.trim_start_matches("./");
            let full_pattern = format!("{}/{}", root.trim_end_matches('/'), pattern);

            let entries = glob::glob(&full_pattern).map_err(|e| {
                CdnupError::Configuration(format!("Invalid file pattern '{}': {}", pattern, e))
            })?;

            for entry in entries {
                let path = match entry {
                    Ok(path) => path,
                    Err(e) => {
                        debug!(error = %e, "skipping unreadable path");
                        continue;
                    }
                };

                if path.is_file() && !self.is_git_internal(&path) {
                    files.insert(path);
                }
            }
        }

        Ok(files.into_iter().collect())
    }

    /// Extract assets from every markup file; files without CDN assets are
    /// left out of the map
    pub fn scan(&self, extractor: &AssetExtractor) -> Result<FileAssetMap> {
        let mut file_assets = FileAssetMap::new();

        for path in self.markup_files()? {
            let items: Vec<_> = extractor.extract(&path).collect();
            debug!(path = %path.display(), assets = items.len(), "scanned markup file");

            if !items.is_empty() {
                file_assets.insert(path, items);
            }
        }

        Ok(file_assets)
    }

    fn is_git_internal(&self, path: &Path) -> bool {
        path.strip_prefix(&self.project_path)
            .map(|relative| relative.components().any(|c| c.as_os_str() == ".git"))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
pub struct ProjectInfo {
    pub project_path: PathBuf,
    pub has_git: bool,
}
