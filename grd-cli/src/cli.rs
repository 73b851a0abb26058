//! Command line arguments

use std::path::PathBuf;

use clap::Parser;
use grd_core::config::CliOverrides;

/// grd renames the default branch of all projects in a group
///
/// Every project in the group is looked up. If its default branch already
/// matches the new name nothing happens. Otherwise a new branch is created
/// from the old default, made the default and protected. The old default can
/// then be unprotected and optionally deleted.
///
/// Examples:
///   grd 1234                    rename every default branch in group 1234 to 'main'
///   grd 1234 --new-name trunk   rename to 'trunk' instead
///   grd 1234 --delete           also delete the old default branch
///
/// Flags can also be set through GRD_* environment variables or ~/.grd.toml.
#[derive(Parser, Debug)]
#[command(name = "grd", version, verbatim_doc_comment)]
pub struct Cli {
    /// GitLab group ID or full path
    pub group_id: Option<String>,

    /// Name of the new default branch [default: main]
    #[arg(short = 'n', long)]
    pub new_name: Option<String>,

    /// GitLab API token
    #[arg(short, long)]
    pub token: Option<String>,

    /// GitLab base URL [default: https://gitlab.com]
    #[arg(short, long)]
    pub url: Option<String>,

    /// Unprotect the old default branch when done
    #[arg(short = 'p', long)]
    pub unprotect: bool,

    /// Delete the old default branch when done
    #[arg(short, long)]
    pub delete: bool,

    /// Allow developers to merge into the new default branch
    #[arg(long)]
    pub devs_can_merge: bool,

    /// Allow developers to push to the new default branch
    #[arg(long)]
    pub devs_can_push: bool,

    /// Keep migrating the remaining projects when one fails
    #[arg(long)]
    pub keep_going: bool,

    /// Config file (default is $HOME/.grd.toml)
    #[arg(long, env = "GRD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// The group to migrate; running without one is a usage error
    pub fn require_group_id(&self) -> anyhow::Result<&str> {
        self.group_id.as_deref().ok_or_else(|| {
            anyhow::anyhow!("requires a GitLab group ID\n\nUsage: grd <GROUP_ID> [OPTIONS]")
        })
    }

    /// Flags given explicitly on the command line
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            new_name: self.new_name.clone(),
            token: self.token.clone(),
            url: self.url.clone(),
            unprotect: self.unprotect,
            delete: self.delete,
            devs_can_merge: self.devs_can_merge,
            devs_can_push: self.devs_can_push,
            keep_going: self.keep_going,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_short_flags() {
        let cli = Cli::try_parse_from([
            "grd", "1234", "-n", "trunk", "-t", "secret", "-u", "https://git.example.com", "-p",
            "-d",
        ])
        .unwrap();

        assert_eq!(cli.group_id.as_deref(), Some("1234"));
        let overrides = cli.overrides();
        assert_eq!(overrides.new_name.as_deref(), Some("trunk"));
        assert_eq!(overrides.token.as_deref(), Some("secret"));
        assert_eq!(overrides.url.as_deref(), Some("https://git.example.com"));
        assert!(overrides.unprotect);
        assert!(overrides.delete);
        assert!(!overrides.devs_can_push);
    }

    #[test]
    fn test_parse_long_flags() {
        let cli = Cli::try_parse_from([
            "grd",
            "platform/backend",
            "--devs-can-merge",
            "--devs-can-push",
            "--keep-going",
            "--config",
            "/tmp/grd.toml",
        ])
        .unwrap();

        assert_eq!(cli.group_id.as_deref(), Some("platform/backend"));
        assert!(cli.devs_can_merge);
        assert!(cli.devs_can_push);
        assert!(cli.keep_going);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/grd.toml")));
    }

    #[test]
    fn test_group_id_is_optional_at_parse_time() {
        let cli = Cli::try_parse_from(["grd"]).unwrap();
        assert!(cli.group_id.is_none());
        assert!(cli.overrides().new_name.is_none());
    }

    #[test]
    fn test_missing_group_id_is_usage_error() {
        let cli = Cli::try_parse_from(["grd", "--delete"]).unwrap();
        let err = cli.require_group_id().unwrap_err();
        assert!(err.to_string().contains("requires a GitLab group ID"));
        assert!(err.to_string().contains("Usage: grd <GROUP_ID>"));
    }

    #[test]
    fn test_require_group_id() {
        let cli = Cli::try_parse_from(["grd", "1234"]).unwrap();
        assert_eq!(cli.require_group_id().unwrap(), "1234");
    }

    #[test]
    fn test_rejects_second_positional() {
        assert!(Cli::try_parse_from(["grd", "1", "2"]).is_err());
    }

    #[test]
    fn test_version_flag() {
        let err = Cli::try_parse_from(["grd", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
