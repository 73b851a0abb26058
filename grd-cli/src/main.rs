//! grd - rename the default branch of every project in a GitLab group

mod cli;

use clap::Parser;
use grd_core::{BranchMigrator, Settings};
use grd_gitlab::GitLabClient;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("grd=info,grd_core=info,grd_gitlab=info,warn")
        }
    });
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let group_id = cli.require_group_id()?;

    let (settings, config_file) =
        Settings::load_with_overrides(cli.config.as_deref(), cli.overrides())?;
    if let Some(path) = config_file {
        println!("Using config file: {}", path.display());
    }

    let config = settings.migration_config()?;
    tracing::debug!(
        url = %settings.url,
        target = %config.target_branch,
        delete_old = config.delete_old,
        unprotect_old = config.unprotect_old,
        policy = ?config.error_policy,
        "Configuration loaded"
    );

    let client = GitLabClient::new(&settings.url, settings.token.clone())?;
    let mut migrator = BranchMigrator::new(client, config);
    let report = migrator.migrate_group(group_id).await?;

    if report.has_failures() {
        anyhow::bail!(
            "{} of {} project(s) failed to migrate",
            report.failed(),
            report.projects.len()
        );
    }

    Ok(())
}
