use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "cdnup",
    about = "Keep CDN-hosted scripts and stylesheets up to date, one pull request per package",
    version,
    author
)]
pub struct Cli {
    /// Path to the repository checkout (defaults to current directory)
    #[arg(short, long, global = true, env = "GITHUB_WORKSPACE", default_value = ".")]
    pub path: String,

    /// Comma-separated globs of markup files to scan, relative to the repository
    #[arg(
        long = "file-extensions",
        global = true,
        env = "CDNUP_FILE_EXTENSIONS",
        value_delimiter = ',',
        default_value = "**/*.html,**/*.htm,**/*.cshtml,**/*.razor"
    )]
    pub file_extensions: Vec<String>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rewrite stale CDN references and open one pull request per package
    Update(UpdateArgs),

    /// Report stale CDN references without changing anything
    Check,

    /// List every CDN asset referenced by the scanned files
    List,
}

#[derive(Args, Debug, Clone)]
pub struct UpdateArgs {
    /// Token used to push branches and open pull requests
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Base URL of the GitHub REST API
    #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    pub api_url: String,

    /// Base URL of the GitHub server, used to link back to the workflow run
    #[arg(long, env = "GITHUB_SERVER_URL", default_value = "https://github.com")]
    pub server_url: String,

    /// Repository slug (owner/repo) pull requests are opened against
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: Option<String>,

    /// Identifier of the workflow run, linked from pull request bodies
    #[arg(long, env = "GITHUB_RUN_ID")]
    pub run_id: Option<String>,

    /// Prefix for update branch names
    #[arg(long, env = "CDNUP_BRANCH_PREFIX", default_value = "update-static-assets")]
    pub branch_prefix: String,

    /// Commit message to use instead of the generated one
    #[arg(long, env = "CDNUP_COMMIT_MESSAGE")]
    pub commit_message: Option<String>,

    /// Git author name for update commits
    #[arg(long, env = "CDNUP_USER_NAME", default_value = "github-actions[bot]")]
    pub user_name: String,

    /// Git author email for update commits
    #[arg(
        long,
        env = "CDNUP_USER_EMAIL",
        default_value = "41898282+github-actions[bot]@users.noreply.github.com"
    )]
    pub user_email: String,

    /// Comma-separated labels to apply to opened pull requests
    #[arg(long, env = "CDNUP_LABELS")]
    pub labels: Option<String>,

    /// Commit locally but skip pushing and opening pull requests
    #[arg(long, env = "CDNUP_DRY_RUN")]
    pub dry_run: bool,

    /// Print the run result as JSON
    #[arg(long)]
    pub json: bool,
}
