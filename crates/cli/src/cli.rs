use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "psgcp")]
#[command(version)]
#[command(about = "Fetch, package and run Pixel Streaming helpers for Google Cloud", long_about = None)]
#[command(after_help = "Examples:\n  \
  psgcp fetch my-bucket                 download and extract the helper bundle\n  \
  psgcp package ./Windows               zip a packaged build for upload\n  \
  psgcp run ./helper.exe --zone eu      run a helper and stream its output")]
pub struct Cli {
    /// Directory holding downloaded, extracted and packaged artifacts
    #[arg(long, global = true, value_name = "DIR", default_value = "Saved")]
    pub saved_dir: PathBuf,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download and extract the helper bundle from a bucket
    Fetch {
        /// Bucket the bundle is published in
        #[arg(value_name = "BUCKET")]
        bucket: String,
    },

    /// Compress a packaged build directory into the upload archive
    Package {
        /// Directory to compress
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },

    /// Launch a program and stream its output
    Run {
        /// Program to launch
        #[arg(value_name = "PROGRAM")]
        program: String,

        /// Arguments passed to the program unchanged
        #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Manage the saved project info
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Print the uppercase hex of a value's UTF-8 bytes
    Hex {
        #[arg(value_name = "INPUT")]
        input: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// Save project info, replacing any previous record
    Save(ProjectArgs),

    /// Print the saved project info as JSON
    Show,
}

#[derive(Args, Debug)]
pub struct ProjectArgs {
    #[arg(long)]
    pub project_id: String,

    #[arg(long)]
    pub bucket_name: String,

    #[arg(long)]
    pub plain_credentials: String,

    #[arg(long)]
    pub unique_app_name: String,

    #[arg(long)]
    pub vm_zone: String,

    #[arg(long)]
    pub gpu_name: String,
}
