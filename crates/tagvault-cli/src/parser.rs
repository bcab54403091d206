//! Main CLI parser and top-level argument handling.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for redundant commercial schedule storage.
#[derive(Parser)]
#[command(name = "tagvault")]
#[command(about = "Save, rename, delete and repair commercial playlists across redundant replicas")]
#[command(version)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(long, global = true, env = "TAGVAULT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from([
            "tagvault",
            "--verbose",
            "--config",
            "/etc/tagvault.json",
            "channels",
            "--usable",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/tagvault.json")));
        assert!(matches!(
            cli.command,
            Some(Commands::Channels {
                refresh: false,
                usable: true,
                json: false
            })
        ));
    }

    #[test]
    fn test_rename_takes_two_files() {
        let cli = Cli::parse_from(["tagvault", "rename", "KXYZ", "old.tag", "new.tag"]);
        let Some(Commands::Rename {
            channel,
            old_file,
            new_file,
        }) = cli.command
        else {
            panic!("expected rename");
        };
        assert_eq!(channel, "KXYZ");
        assert_eq!(old_file, PathBuf::from("old.tag"));
        assert_eq!(new_file, PathBuf::from("new.tag"));
    }
}
