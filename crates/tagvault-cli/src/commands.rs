//! Available commands.

use std::path::PathBuf;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// List channels from the catalog
    Channels {
        /// Bypass the cache and reload from the catalog database
        #[arg(long)]
        refresh: bool,
        /// Only channels with at least one configured target
        #[arg(long)]
        usable: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List the playlists stored for a channel
    List {
        channel: String,
    },

    /// Save a playlist file to every target and every replica
    Save {
        channel: String,
        /// Local TAG file to save
        file: PathBuf,
    },

    /// Replace a saved playlist with a new version under a new name
    Rename {
        channel: String,
        /// TAG file describing the playlist as currently saved
        old_file: PathBuf,
        /// TAG file describing the playlist after the change
        new_file: PathBuf,
    },

    /// Delete a saved playlist everywhere
    Delete {
        channel: String,
        /// TAG file describing the playlist to delete
        file: PathBuf,
    },

    /// Copy a saved playlist onto targets that are missing it
    Repair {
        channel: String,
        /// TAG file describing the playlist to repair
        file: PathBuf,
    },

    /// Check whether a schedule slot is taken
    Slot {
        /// Date as YYYY-MM-DD
        date: String,
        /// Time as HH:MM
        time: String,
    },

    /// Create missing replica databases and apply the schema
    InitSchema,
}
