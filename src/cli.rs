//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Fetch a policy bundle or configuration source into a local directory.
///
/// Sources carry an optional forced-transport prefix (git::, hg::, s3::,
/// gcs::, oci::) ahead of the location, or are bare https:// URLs and
/// filesystem paths. Plain-HTTP sources are refused before any transfer
/// starts.
#[derive(Parser, Debug)]
#[command(name = "bundlefetch")]
#[command(author, version, about)]
pub struct Args {
    /// Source URL to fetch (e.g. git::https://example.com/org/policy.git)
    pub source: String,

    /// Destination directory (created if missing)
    #[arg(short = 'd', long, default_value = ".")]
    pub dest: PathBuf,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Print transfer metadata as JSON on success
    #[arg(long)]
    pub json: bool,
}
