use crate::agents::{
    AppliedUpdate, AssetUpdate, ChangePublisher, ProjectScannerAgent, Reconciliation, UpdateApplier,
    UpdateResult, VersionControlAgent, VersionReconciler,
};
use crate::assets::{AssetExtractor, AssetVersion, FileAssetMap};
use crate::cdn::CdnClients;
use crate::error::{CdnupError, Result};
use crate::github::{PullRequest, PullRequestService};
use crate::options::UpdateOptions;
use colored::Colorize;
use std::fmt::Display;
use std::path::Path;
use tracing::{error, warn};

/// Step output. Moves to stderr when stdout is reserved for JSON.
struct Console {
    json: bool,
}

impl Console {
    fn line(&self, text: impl Display) {
        if self.json {
            eprintln!("{}", text);
        } else {
            println!("{}", text);
        }
    }
}

/// Execute the update workflow: one branch, commit and pull request per
/// stale package
pub fn execute_update(
    options: &UpdateOptions,
    clients: &CdnClients,
    pull_requests: &dyn PullRequestService,
    json: bool,
) -> Result<UpdateResult> {
    let console = Console { json };
    console.line("Starting CDN asset update...".cyan().bold());

    // Step 1: Validate project structure
    console.line(format!("\n{}", "1. Validating project structure...".yellow()));
    let scanner = ProjectScannerAgent::new(&options.repo_path, &options.file_globs);
    let project_info = scanner.validate()?;
    if !project_info.has_git {
        return Err(CdnupError::ProjectValidation(format!(
            "'{}' is not a Git repository",
            project_info.project_path.display()
        )));
    }
    console.line("✓ Project structure is valid".green());

    // Step 2: Check Git status
    console.line(format!("\n{}", "2. Checking Git status...".yellow()));
    let git = VersionControlAgent::new(&options.repo_path)?;
    if !git.is_working_directory_clean()? {
        console.line("⚠ Warning: Working directory has uncommitted changes".red());
        console.line("Please commit or stash your changes before proceeding.");
        return Ok(UpdateResult::default());
    }
    git.configure_identity(&options.user_name, &options.user_email)?;
    let base_branch = git.current_branch()?;

    let has_remote = git.has_remote()?;
    if has_remote {
        git.fetch_remote()?;
    }
    console.line(
        format!(
            "✓ Working directory is clean (base branch: {})",
            base_branch
        )
        .green(),
    );

    // Step 3: Scan markup files
    console.line(format!("\n{}", "3. Scanning markup files...".yellow()));
    let extractor = AssetExtractor::new()?;
    let file_assets = scanner.scan(&extractor)?;
    console.line(format!(
        "   Found CDN assets in {} file(s)",
        file_assets.len()
    ));

    // Step 4: Resolve latest versions
    console.line(format!("\n{}", "4. Resolving latest versions...".yellow()));
    let reconciliation = VersionReconciler::new(clients).reconcile(&file_assets);
    let targets = reconciliation.targets();
    console.line(format!("✓ {} package(s) out of date", targets.len()).green());

    // Step 5: Apply updates
    let mut result = UpdateResult::default();
    if !targets.is_empty() {
        console.line(format!("\n{}", "5. Applying updates...".yellow()));
    }

    let applier = UpdateApplier::new(&git, options, has_remote);
    let publisher = ChangePublisher::new(pull_requests, options);

    for target in &targets {
        let outcome = update_asset(
            clients,
            &applier,
            &publisher,
            &base_branch,
            &file_assets,
            target,
        );

        match outcome {
            Ok(Some((applied, pull_request))) => {
                console.line(format!(
                    "   {} {} {} → {} ({})",
                    "✓".green(),
                    target.name().white().bold(),
                    applied.replaced_versions.join(", ").red(),
                    target.version.green(),
                    applied.branch.dimmed()
                ));
                result.add_update(AssetUpdate::new(
                    target,
                    applied.replaced_versions,
                    pull_request,
                ));
            }
            Ok(None) => {}
            Err(e) => {
                error!(asset = %target.asset, error = %e, "update aborted");
                console.line(format!("   {} {}: {}", "✗".red(), target.name().bold(), e));
                result.add_failure(target.name());
                if let Err(reset) = git.discard_changes() {
                    warn!(error = %reset, "failed to discard changes");
                }
            }
        }

        git.checkout(&base_branch)?;
    }

    // Step 6: Display summary
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    print_update_result(&console, &result);

    if result.has_failures() {
        return Err(CdnupError::UpdateFailed(result.failed));
    }

    console.line(format!(
        "\n{}",
        "✨ Update process completed successfully!".green().bold()
    ));
    Ok(result)
}

/// Run the per-package pipeline. `None` means the package needed no new
/// branch: nothing to change, no file listing, or the branch already exists.
fn update_asset(
    clients: &CdnClients,
    applier: &UpdateApplier,
    publisher: &ChangePublisher,
    base_branch: &str,
    file_assets: &FileAssetMap,
    target: &AssetVersion,
) -> Result<Option<(AppliedUpdate, PullRequest)>> {
    let cdn_files = match clients
        .for_provider(target.asset.cdn)
        .files(target.name(), &target.version)
    {
        Ok(files) => files,
        Err(e) => {
            warn!(asset = %target.asset, version = %target.version, error = %e, "failed to list files, skipping");
            return Ok(None);
        }
    };

    let Some(applied) = applier.apply(base_branch, file_assets, target, &cdn_files)? else {
        return Ok(None);
    };

    let pull_request = publisher.publish(base_branch, &applied.branch, target)?;
    Ok(Some((applied, pull_request)))
}

fn print_update_result(console: &Console, result: &UpdateResult) {
    if result.is_empty() && !result.has_failures() {
        console.line(format!("\n{}", "No updates were applied".yellow()));
        return;
    }

    console.line(format!("\n{}", "Update Summary:".cyan().bold()));
    console.line(format!("Total updates: {}", result.updates.len()).green());

    for update in &result.updates {
        let pull_request = if update.pull_request_number == 0 {
            "no pull request".dimmed().to_string()
        } else {
            format!("#{} {}", update.pull_request_number, update.pull_request_url)
        };
        console.line(format!(
            "  • {} ({}) → {} [{}]",
            update.name.white().bold(),
            update.cdn,
            update.version.green(),
            pull_request
        ));
    }

    if result.has_failures() {
        console.line(format!("Failed: {}", result.failed.join(", ")).red());
    }
}

/// Execute the check workflow (dry-run)
pub fn execute_check(
    project_path: &Path,
    file_globs: &[String],
    clients: &CdnClients,
) -> Result<Reconciliation> {
    println!("{}", "Checking for stale CDN assets...".cyan().bold());

    // Step 1: Validate project structure
    println!("\n{}", "1. Validating project structure...".yellow());
    let scanner = ProjectScannerAgent::new(project_path, file_globs);
    scanner.validate()?;
    println!("{}", "✓ Project structure is valid".green());

    // Step 2: Scan markup files
    println!("\n{}", "2. Scanning markup files...".yellow());
    let file_assets = scanner.scan(&AssetExtractor::new()?)?;
    println!("   Found CDN assets in {} file(s)", file_assets.len());

    // Step 3: Resolve latest versions without modifying anything
    println!("\n{}", "3. Resolving latest versions...".yellow());
    let reconciliation = VersionReconciler::new(clients).reconcile(&file_assets);
    println!("{}", "✓ Check completed".green());

    print_available_updates(&reconciliation);

    Ok(reconciliation)
}

fn print_available_updates(reconciliation: &Reconciliation) {
    let targets = reconciliation.targets();
    if targets.is_empty() {
        println!("\n{}", "✨ All CDN assets are up to date!".green().bold());
        return;
    }

    println!("\n{}", "📦 Available Updates:".cyan().bold());
    println!("{}", format!("Found {} update(s)", targets.len()).yellow());

    for target in &targets {
        println!(
            "  • {} ({}) {} → {}",
            target.name().white().bold(),
            target.asset.cdn,
            reconciliation.stale_versions(&target.asset).join(", ").red(),
            target.version.green().bold()
        );
    }

    println!("\n{}", "To apply these updates, run:".dimmed());
    println!("  {}", "cdnup update".cyan());
}

/// Execute the list workflow - display every CDN reference per file
pub fn execute_list(project_path: &Path, file_globs: &[String]) -> Result<FileAssetMap> {
    println!("{}", "Listing CDN assets...".cyan().bold());

    // Step 1: Validate project structure
    println!("\n{}", "1. Validating project structure...".yellow());
    let scanner = ProjectScannerAgent::new(project_path, file_globs);
    let project_info = scanner.validate()?;
    println!("{}", "✓ Project structure is valid".green());

    // Step 2: Scan markup files
    println!("\n{}", "2. Scanning markup files...".yellow());
    let file_assets = scanner.scan(&AssetExtractor::new()?)?;
    println!("{}", "✓ Scan completed".green());

    print_assets(&project_info.project_path, &file_assets);

    Ok(file_assets)
}

fn print_assets(root: &Path, file_assets: &FileAssetMap) {
    println!("\n{}", "📦 CDN assets:".cyan().bold());

    let mut references = 0;
    for (path, items) in file_assets {
        let relative = path.strip_prefix(root).unwrap_or(path);
        println!("\n{}", relative.display().to_string().yellow().bold());
        for item in items {
            references += 1;
            println!(
                "  {} {} {}",
                format!("{}@{}", item.asset().name, item.version()).cyan(),
                format!("({})", item.asset().cdn).dimmed(),
                item.file_name.dimmed()
            );
        }
    }

    println!("\n{}", "Summary:".cyan().bold());
    println!("  {} files", file_assets.len().to_string().yellow());
    println!("  {} references", references.to_string().yellow());
}
