use std::path::PathBuf;

use clap::Parser;

/// Installs python packages into a serverless deployment directory, leaving
/// out what the runtime already provides.
#[derive(Debug, Parser)]
#[clap(version)]
pub struct CliArgs {
    #[clap(subcommand)]
    pub cmd: Command,
    /// Directory packages are installed into
    #[clap(short, long, default_value = "lambda_package")]
    pub target: PathBuf,
    /// Python interpreter used to run pip [env: LAMBDA_PKG_PIP_PYTHON]
    #[clap(long)]
    pub python: Option<PathBuf>,
    /// Python version environment markers are evaluated for [env: LAMBDA_PKG_PYTHON_VERSION]
    #[clap(long)]
    pub python_version: Option<String>,
}

#[derive(Debug, Parser)]
pub enum Command {
    ///Resolves requirements and installs them with their dependencies
    Install {
        requirements: Vec<String>,
        /// Requirements file, may be given multiple times
        #[clap(short = 'r', long = "requirement")]
        requirement_files: Vec<PathBuf>,
        /// Project to leave out together with its dependencies
        #[clap(short, long)]
        exclude: Vec<String>,
        /// Project to install even though it is excluded by default
        #[clap(long)]
        include: Vec<String>,
        /// Do not exclude the packages the lambda runtime provides
        #[clap(long)]
        no_default_excludes: bool,
        /// Replace installed distributions that conflict with a requirement
        #[clap(long)]
        replace_conflicting: bool,
        /// Package index url [env: LAMBDA_PKG_PIP_INDEX]
        #[clap(short, long)]
        index_url: Option<String>,
        /// Directory searched for wheels before the index
        #[clap(short, long)]
        find_links: Vec<PathBuf>,
        /// Only install wheels from the find-links directories
        #[clap(long)]
        offline: bool,
        #[clap(long)]
        no_cache_dir: bool,
        /// Write a toml summary of the installed distributions to this file
        #[clap(long)]
        output_manifest: Option<PathBuf>,
    },
    ///Lists distributions installed in the target directory
    List,
    ///Prints the projects excluded by default
    Excludes,
}
