mod agents;
mod assets;
mod cdn;
mod cli;
mod error;
mod github;
mod options;
mod version;
mod workflow;

use cdn::CdnClients;
use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use github::GitHubClient;
use options::{UpdateOptions, normalize_globs, validate_repo_path};
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> error::Result<()> {
    match cli.command {
        Commands::Update(args) => {
            let options = UpdateOptions::from_args(&cli.path, cli.file_extensions, &args)?;
            let clients = CdnClients::new()?;
            let github = GitHubClient::new(
                &options.api_url,
                options.token.as_deref().unwrap_or_default(),
            )?;
            workflow::execute_update(&options, &clients, &github, args.json).map(|_| ())
        }
        Commands::Check => {
            let project_path = validate_repo_path(Path::new(&cli.path))?;
            let clients = CdnClients::new()?;
            workflow::execute_check(&project_path, &normalize_globs(cli.file_extensions), &clients)
                .map(|_| ())
        }
        Commands::List => {
            let project_path = validate_repo_path(Path::new(&cli.path))?;
            workflow::execute_list(&project_path, &normalize_globs(cli.file_extensions)).map(|_| ())
        }
    }
}
