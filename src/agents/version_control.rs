use crate::error::{CdnupError, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

const REMOTE: &str = "origin";

/// How a git invocation's outcome is judged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Check {
    /// Non-zero exit or anything on stderr is a failure
    Strict,
    /// Only a non-zero exit is a failure; stderr carries progress chatter
    ExitCode,
    /// Never fails
    Tolerant,
}

/// VersionControlAgent runs git in the repository checkout with hardened
/// input validation. Output is captured, never shown on the terminal.
pub struct VersionControlAgent {
    project_path: PathBuf,
}

impl VersionControlAgent {
    pub fn new<P: AsRef<Path>>(project_path: P) -> Result<Self> {
        let project_path = Self::validate_git_path(project_path.as_ref())?;
        Ok(Self { project_path })
    }

    /// Check if the working directory is clean
    pub fn is_working_directory_clean(&self) -> Result<bool> {
        let output = self.run_git(&["status", "--porcelain"], Check::Strict)?;
        Ok(output.stdout.is_empty())
    }

    pub fn current_branch(&self) -> Result<String> {
        let output = self.run_git(&["rev-parse", "--abbrev-ref", "HEAD"], Check::Strict)?;
        let branch = String::from_utf8_lossy(&output.stdout).trim().to_string();

        if branch.is_empty() || branch == "HEAD" {
            return Err(CdnupError::GitOperation(
                "HEAD is detached; check out a branch before updating".to_string(),
            ));
        }
        Ok(branch)
    }

    /// Set the author identity for commits made in this repository
    pub fn configure_identity(&self, name: &str, email: &str) -> Result<()> {
        self.run_git(&["config", "user.name", name], Check::Strict)?;
        self.run_git(&["config", "user.email", email], Check::Strict)?;
        Ok(())
    }

    pub fn has_remote(&self) -> Result<bool> {
        let output = self.run_git(&["remote"], Check::Strict)?;
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .any(|line| line.trim() == REMOTE))
    }

    /// Refresh remote-tracking branches so existing update branches are seen
    pub fn fetch_remote(&self) -> Result<()> {
        self.run_git(&["fetch", "--quiet", "--prune", REMOTE], Check::ExitCode)?;
        Ok(())
    }

    pub fn remote_branch_exists(&self, branch: &str) -> Result<bool> {
        let remote_ref = format!("{REMOTE}/{branch}");
        let output = self.run_git(&["branch", "-r", "--list", &remote_ref], Check::Strict)?;
        Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
    }

    /// Create (or reset) `branch` at `base` and switch to it, carrying the
    /// working tree changes along
    pub fn create_branch(&self, branch: &str, base: &str) -> Result<()> {
        Self::validate_branch_name(branch)?;
        self.run_git(&["checkout", "-q", "-B", branch, base], Check::ExitCode)?;
        Ok(())
    }

    pub fn checkout(&self, branch: &str) -> Result<()> {
        self.run_git(&["checkout", "-q", branch], Check::ExitCode)?;
        Ok(())
    }

    pub fn stage_all(&self) -> Result<()> {
        self.run_git(&["add", "--all"], Check::ExitCode)?;
        Ok(())
    }

    pub fn commit(&self, message: &str) -> Result<()> {
        self.run_git(&["commit", "-q", "-m", message], Check::ExitCode)?;
        Ok(())
    }

    pub fn push(&self, branch: &str) -> Result<()> {
        self.run_git(
            &["push", "--quiet", "--set-upstream", REMOTE, branch],
            Check::ExitCode,
        )?;
        Ok(())
    }

    /// Throw away uncommitted changes to tracked files
    pub fn discard_changes(&self) -> Result<()> {
        self.run_git(&["reset", "-q", "--hard"], Check::Tolerant)?;
        Ok(())
    }

    #[cfg(test)]
    pub fn head_commit_message(&self) -> Result<String> {
        let output = self.run_git(&["log", "-1", "--format=%B"], Check::Strict)?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn run_git(&self, args: &[&str], check: Check) -> Result<Output> {
        let command = args.join(" ");
        debug!(command = %command, "running git");

        let output = Command::new("git")
            .current_dir(&self.project_path)
            .env("GIT_TERMINAL_PROMPT", "0")
            .args(args)
            .output()
            .map_err(|e| CdnupError::GitCommand {
                command: command.clone(),
                message: format!("failed to execute git: {e}"),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let failed = match check {
            Check::Strict => !output.status.success() || !stderr.is_empty(),
            Check::ExitCode => !output.status.success(),
            Check::Tolerant => false,
        };

        if failed {
            let message = if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr
            };
            return Err(CdnupError::GitCommand { command, message });
        }

        if !stderr.is_empty() {
            debug!(command = %command, stderr = %stderr, "git wrote to stderr");
        }

        Ok(output)
    }

    fn validate_git_path(path: &Path) -> Result<PathBuf> {
        let dangerous = [';', '|', '&', '$', '`', '\n', '\r'];
        let path_str = path.to_string_lossy();
        if let Some(ch) = dangerous.iter().find(|c| path_str.contains(**c)) {
            return Err(CdnupError::GitOperation(format!(
                "Path contains dangerous character: '{}'",
                ch
            )));
        }

        if !path.is_absolute() {
            return Err(CdnupError::GitOperation(
                "Only absolute paths are allowed for Git operations".to_string(),
            ));
        }

        if !path.is_dir() {
            return Err(CdnupError::GitOperation(format!(
                "Invalid Git path: '{}' is not a directory",
                path.display()
            )));
        }

        Ok(path.to_path_buf())
    }

    fn validate_branch_name(branch: &str) -> Result<()> {
        let valid = !branch.is_empty()
            && !branch.starts_with('-')
            && !branch.contains("..")
            && branch
                .chars()
                .all(|c| !c.is_whitespace() && !matches!(c, '~' | '^' | ':' | '?' | '*' | '[' | '\\'));

        if valid {
            Ok(())
        } else {
            Err(CdnupError::GitOperation(format!(
                "Refusing to create branch with unsafe name '{}'",
                branch
            )))
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::Path;
    use std::process::Command;

    pub fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .current_dir(dir)
            .args(args)
            .output()
            .unwrap();
        assert!(
            status.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&status.stderr)
        );
    }

    pub fn git_output(dir: &Path, args: &[&str]) -> String {
        let output = Command::new("git")
            .current_dir(dir)
            .args(args)
            .output()
            .unwrap();
        assert!(output.status.success(), "git {:?} failed", args);
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    /// Bare repository registered as `origin` of `dir`, holding its `main`
    pub fn add_bare_remote(dir: &Path, remote: &Path) {
        git(remote, &["init", "-q", "--bare"]);
        git(dir, &["remote", "add", "origin", remote.to_str().unwrap()]);
        git(dir, &["push", "-q", "origin", "main"]);
    }

    /// Initialise a repository on branch `main` holding `files` in one commit
    pub fn init_repo(dir: &Path, files: &[(&str, &str)]) {
        git(dir, &["init", "-q"]);
        git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        git(dir, &["config", "user.name", "Test"]);
        git(dir, &["config", "user.email", "test@example.com"]);
        git(dir, &["config", "commit.gpgsign", "false"]);

        for (name, content) in files {
            let path = dir.join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(path, content).unwrap();
        }

        git(dir, &["add", "--all"]);
        git(dir, &["commit", "-q", "-m", "initial"]);
    }
}
