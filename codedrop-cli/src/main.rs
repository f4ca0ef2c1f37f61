//! # codedrop
//!
//! CLI for secure, ephemeral file handoff.
//!
//! ## Commands
//!
//! - `push`: Encrypt a file locally and upload it, printing a share URL
//! - `pull`: Download and decrypt a file from a share URL
//! - `stats`: Show server storage and deduplication metrics
//!
//! ## Example
//!
//! ```bash
//! # Push a file that self-destructs after one download or 30 minutes
//! codedrop push ./report.pdf --expire 30m --max-views 1
//!
//! # On the receiving side
//! codedrop pull 'http://localhost:8080/drop/<id>#k=<key>'
//! ```
//!
//! The decryption key lives in the URL fragment and is never sent to the
//! server.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod pipeline;

/// Secure, ephemeral file handoff tool.
#[derive(Parser, Debug)]
#[command(name = "codedrop")]
#[command(version, about, long_about = None)]
struct Cli {
    /// CodeDrop API server URL
    #[arg(long, short = 's', global = true, default_value = "http://localhost:8080")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt and push a file to the CodeDrop server
    Push {
        /// Path to the file to push
        path: PathBuf,

        /// Time until the drop is permanently deleted (e.g. 30m, 24h)
        #[arg(long, short = 'e', default_value = "24h")]
        expire: String,

        /// Maximum number of times this drop can be downloaded
        #[arg(long, short = 'm', default_value_t = 1)]
        max_views: i32,
    },

    /// Download and decrypt a file from a share URL
    Pull {
        /// Share URL of the form http://host/drop/<id>#k=<key>
        url: String,
    },

    /// View server health and storage metrics
    Stats,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Push {
            path,
            expire,
            max_views,
        } => commands::push::run(&cli.server, &path, &expire, max_views).await,
        Commands::Pull { url } => commands::pull::run(&url).await,
        Commands::Stats => commands::stats::run(&cli.server).await,
    };

    if let Err(err) = result {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
