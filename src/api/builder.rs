use std::{env, error::Error, path::PathBuf};

use crate::{
    fetch::{FindLinksFetcher, PipWheelFetcher, WheelFetcher},
    installer::DistInstaller,
    model::{
        excludes::ExclusionSet,
        requirement::{lambda_marker_environment, DEFAULT_PYTHON_VERSION},
    },
    LambdaPkg,
};

const DEFAULT_TARGET_DIRECTORY_NAME: &str = "lambda_package";
const DEFAULT_PYTHON: &str = "python3";

#[derive(Default)]
pub struct LambdaPkgBuilder {
    // Relative paths are resolved against `root`
    root: Option<PathBuf>,
    target: Option<PathBuf>,
    entries: Vec<PathBuf>,
    excludes: Option<ExclusionSet>,
    python: Option<PathBuf>,
    python_version: Option<String>,
    index_url: Option<String>,
    find_links: Vec<PathBuf>,
    no_cache_dir: bool,
    offline: bool,
}

impl LambdaPkgBuilder {
    /// Project root directory.
    ///
    /// Defaults to the current directory.
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Directory packages are installed into.
    ///
    /// Defaults to `lambda_package`.
    pub fn target(mut self, path: impl Into<PathBuf>) -> Self {
        self.target = Some(path.into());
        self
    }

    /// Additional directories whose installed distributions count as
    /// available. The target directory is always searched first.
    pub fn entries(mut self, entries: Vec<PathBuf>) -> Self {
        self.entries = entries;
        self
    }

    /// Projects never installed.
    ///
    /// Defaults to the packages the lambda python runtime provides.
    pub fn excludes(mut self, excludes: ExclusionSet) -> Self {
        self.excludes = Some(excludes);
        self
    }

    /// Interpreter used to run pip.
    ///
    /// Defaults to `python3`.
    pub fn python(mut self, python: Option<PathBuf>) -> Self {
        self.python = python;
        self
    }

    /// Python version environment markers are evaluated for.
    ///
    /// Defaults to `3.12`.
    pub fn python_version(mut self, version: Option<String>) -> Self {
        self.python_version = version;
        self
    }

    pub fn index_url(mut self, index_url: Option<String>) -> Self {
        self.index_url = index_url;
        self
    }

    pub fn find_links(mut self, find_links: Vec<PathBuf>) -> Self {
        self.find_links = find_links;
        self
    }

    pub fn no_cache_dir(mut self, no_cache_dir: bool) -> Self {
        self.no_cache_dir = no_cache_dir;
        self
    }

    /// Only install wheels found in the find-links directories, never run pip.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn try_build(self) -> Result<LambdaPkg, Box<dyn Error>> {
        let Self {
            root,
            target,
            entries,
            excludes,
            python,
            python_version,
            index_url,
            find_links,
            no_cache_dir,
            offline,
        } = self;
        let root = match root {
            Some(root) => root,
            None => env::current_dir()?,
        };

        let target =
            root.join(target.unwrap_or_else(|| PathBuf::from(DEFAULT_TARGET_DIRECTORY_NAME)));
        let find_links = find_links
            .into_iter()
            .map(|link| root.join(link))
            .collect::<Vec<_>>();

        let fetcher: Box<dyn WheelFetcher> = if offline {
            Box::new(FindLinksFetcher::new(find_links))
        } else {
            Box::new(
                PipWheelFetcher::new(python.unwrap_or_else(|| PathBuf::from(DEFAULT_PYTHON)))
                    .index_url(index_url)
                    .find_links(find_links)
                    .no_cache_dir(no_cache_dir),
            )
        };
        let installer = DistInstaller::new(&target, fetcher)?;

        let entries = std::iter::once(installer.dist_dir().to_path_buf())
            .chain(entries.into_iter().map(|entry| root.join(entry)))
            .collect();

        let marker_environment = lambda_marker_environment(
            python_version.as_deref().unwrap_or(DEFAULT_PYTHON_VERSION),
        )?;

        Ok(LambdaPkg {
            entries,
            excludes: excludes.unwrap_or_else(ExclusionSet::lambda),
            marker_environment,
            installer,
        })
    }
}
