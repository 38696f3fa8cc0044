//! CLI argument parsing with clap

use crate::config::{Config, MediaFilter, Privacy};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// smugline - sync local photo and video folders with SmugMug albums
///
/// Uploads skip files whose content is already in the album, downloads
/// skip files that already exist locally, so interrupted runs can simply
/// be started again.
#[derive(Parser, Debug)]
#[command(name = "smugline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// SmugMug API key
    #[arg(long, env = "SMUGLINE_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Email address of the SmugMug account (prompted for when missing)
    #[arg(long, global = true)]
    pub email: Option<String>,

    /// SmugMug password (prompted for when missing)
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Path to configuration file (TOML format)
    ///
    /// CLI arguments override config file settings.
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Dry run mode - show what would be done without doing it
    #[arg(short = 'n', long, global = true)]
    pub dry_run: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output log file as JSON
    #[arg(long, global = true)]
    pub json_log: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Upload files from a folder to an album, creating it if needed
    Upload {
        album_name: String,

        /// Folder to upload from
        #[arg(long = "from", default_value = ".")]
        from: PathBuf,

        /// Upload videos, images, or both
        #[arg(long, value_enum, default_value_t = MediaFilter::Images)]
        media: MediaFilter,

        /// Privacy of the album if it has to be created
        #[arg(long, value_enum, default_value_t = Privacy::Unlisted)]
        privacy: Privacy,
    },

    /// Download an entire album into a folder
    Download {
        album_name: String,

        /// Folder to download into
        #[arg(long = "to", default_value = ".")]
        to: PathBuf,

        /// Download videos, images, or both
        #[arg(long, value_enum, default_value_t = MediaFilter::Images)]
        media: MediaFilter,
    },

    /// Process a JSON file with upload directives
    Process {
        manifest: PathBuf,

        /// Folder the manifest's file paths are relative to
        #[arg(long = "from", default_value = ".")]
        from: PathBuf,
    },

    /// List album names
    List,

    /// Create a new album
    Create {
        album_name: String,

        /// Album privacy setting
        #[arg(long, value_enum, default_value_t = Privacy::Unlisted)]
        privacy: Privacy,
    },

    /// Find duplicate images in an album and delete them
    #[command(name = "clear-duplicates", alias = "clear_duplicates")]
    ClearDuplicates { album_name: String },

    /// Print a commented configuration file with the default settings
    SampleConfig,
}

impl Command {
    /// Whether the command talks to the remote service
    pub fn needs_session(&self) -> bool {
        !matches!(self, Command::SampleConfig)
    }
}

impl Cli {
    /// Get config file name (without extension) for log naming
    pub fn config_name(&self) -> Option<String> {
        self.config.as_ref().and_then(|p| {
            p.file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.to_string())
        })
    }

    /// Merge CLI arguments with config from file
    /// CLI arguments take precedence over config file settings
    pub fn merge_with_config(&self, mut config: Config) -> Config {
        if let Some(ref api_key) = self.api_key {
            config.api_key = Some(api_key.clone());
        }
        if let Some(ref email) = self.email {
            config.email = Some(email.clone());
        }
        if self.dry_run {
            config.dry_run = true;
        }
        if self.verbose {
            config.verbose = true;
        }

        config
    }

    /// Convert CLI arguments to Config (when no config file is used)
    pub fn to_config(&self) -> Config {
        self.merge_with_config(Config::default())
    }
}
