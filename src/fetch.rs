use std::{
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
    str::FromStr,
};

use log::{debug, trace};
use pep440_rs::Version;
use pep508_rs::Requirement;
use regex_lite::Regex;
use thiserror::Error;

use crate::model::{
    name::ProjectName,
    requirement::{direct_url, requirement_name, version_specifiers},
    ParseError,
};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Error while reading requirement: {0}")]
    Parsing(#[from] ParseError),
    #[error("pip exited with {status}: {stderr}")]
    Pip { status: ExitStatus, stderr: String },
    #[error("pip produced no wheel in {0}")]
    NoWheel(String),
    #[error("No wheel satisfying {0} was found")]
    NotFound(String),
}

/// Locates or builds a wheel satisfying a requirement. Implementations may
/// place the wheel in `dest` or return a path to an existing file.
pub trait WheelFetcher {
    fn fetch_wheel(&self, requirement: &Requirement, dest: &Path) -> Result<PathBuf, FetchError>;
}

impl WheelFetcher for Box<dyn WheelFetcher> {
    fn fetch_wheel(&self, requirement: &Requirement, dest: &Path) -> Result<PathBuf, FetchError> {
        self.as_ref().fetch_wheel(requirement, dest)
    }
}

/// Builds wheels with `python -m pip wheel --no-deps`. Dependencies are left
/// to the resolver.
#[derive(Debug, Clone)]
pub struct PipWheelFetcher {
    python: PathBuf,
    index_url: Option<String>,
    find_links: Vec<PathBuf>,
    no_cache_dir: bool,
}

impl PipWheelFetcher {
    pub fn new(python: impl Into<PathBuf>) -> Self {
        PipWheelFetcher {
            python: python.into(),
            index_url: None,
            find_links: Vec::new(),
            no_cache_dir: false,
        }
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

    fn command(&self, requirement: &Requirement, dest: &Path) -> Command {
        let mut cmd = Command::new(&self.python);
        cmd.args(["-m", "pip", "--disable-pip-version-check", "wheel", "--no-deps", "-w"])
            .arg(dest);
        // Explicit pip verbosity settings take precedence.
        if std::env::var_os("PIP_QUIET").is_none() && std::env::var_os("PIP_VERBOSE").is_none() {
            cmd.arg("--quiet");
        }
        if self.no_cache_dir && std::env::var_os("PIP_NO_CACHE_DIR").is_none() {
            cmd.arg("--no-cache-dir");
        }
        if let Some(index_url) = &self.index_url {
            cmd.arg("--index-url").arg(index_url);
        }
        for link in &self.find_links {
            cmd.arg("--find-links").arg(link);
        }
        // `name @ url` is not accepted on the pip command line.
        match direct_url(requirement) {
            Some(url) => cmd.arg(url),
            None => cmd.arg(requirement.to_string()),
        };
        cmd
    }
}

impl WheelFetcher for PipWheelFetcher {
    fn fetch_wheel(&self, requirement: &Requirement, dest: &Path) -> Result<PathBuf, FetchError> {
        let mut cmd = self.command(requirement, dest);
        debug!("Running {:?}", cmd);
        let output = cmd.output()?;
        if !output.status.success() {
            return Err(FetchError::Pip {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let mut wheels = std::fs::read_dir(dest)?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<Result<Vec<_>, _>>()?;
        wheels.retain(|path| path.extension().is_some_and(|ext| ext == "whl"));
        wheels.sort();
        wheels
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::NoWheel(dest.display().to_string()))
    }
}

/// Picks wheels out of local directories without touching the network.
#[derive(Debug, Clone, Default)]
pub struct FindLinksFetcher {
    locations: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelFilename {
    pub name: ProjectName,
    pub version: Version,
}

impl WheelFilename {
    /// Parses `{name}-{version}(-{build})?-{python}-{abi}-{platform}.whl`.
    pub fn parse(filename: &str) -> Option<WheelFilename> {
        let re = Regex::new(
            r"^(?P<name>[^-]+)-(?P<version>[^-]+)(-\d[^-]*)?-[^-]+-[^-]+-[^-]+\.whl$",
        )
        .unwrap();
        let captures = re.captures(filename)?;
        let version = Version::from_str(captures.name("version")?.as_str()).ok()?;
        Some(WheelFilename {
            name: ProjectName::new(captures.name("name")?.as_str()),
            version,
        })
    }
}

impl FindLinksFetcher {
    pub fn new(locations: Vec<PathBuf>) -> Self {
        FindLinksFetcher { locations }
    }
}

impl WheelFetcher for FindLinksFetcher {
    fn fetch_wheel(&self, requirement: &Requirement, _dest: &Path) -> Result<PathBuf, FetchError> {
        let name = requirement_name(requirement);
        let specifiers = version_specifiers(requirement)?;

        let mut best: Option<(Version, PathBuf)> = None;
        for location in &self.locations {
            if !location.is_dir() {
                trace!("Skipping missing find-links location {}", location.display());
                continue;
            }
            for entry in std::fs::read_dir(location)? {
                let path = entry?.path();
                let Some(wheel) = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .and_then(WheelFilename::parse)
                else {
                    continue;
                };
                if wheel.name != name
                    || !specifiers
                        .as_ref()
                        .map_or(true, |specifiers| specifiers.contains(&wheel.version))
                {
                    continue;
                }
                if best.as_ref().map_or(true, |(version, _)| &wheel.version > version) {
                    best = Some((wheel.version, path));
                }
            }
        }

        best.map(|(_, path)| path)
            .ok_or_else(|| FetchError::NotFound(requirement.to_string()))
    }
}
