use std::{
    fmt::{Display, Formatter},
    path::{Path, PathBuf},
    str::FromStr,
};

use log::{debug, trace};
use pep440_rs::Version;
use pep508_rs::Requirement;

use crate::model::{
    metadata::{is_dist_info, DistMetadata, METADATA_FILE_NAME},
    name::ProjectName,
    requirement::{parse_requirement, requirement_name, version_specifiers},
    ParseError,
};

/// One resolved package version together with its declared dependencies.
#[derive(Debug, Clone)]
pub struct Distribution {
    pub key: ProjectName,
    pub project_name: String,
    pub version: Version,
    /// Directory the distribution is importable from.
    pub location: PathBuf,
    /// The `.dist-info` directory, when the distribution was read from disk.
    pub metadata_dir: Option<PathBuf>,
    requires: Vec<Requirement>,
}

impl Distribution {
    pub fn new(
        project_name: &str,
        version: Version,
        location: impl Into<PathBuf>,
        requires: Vec<Requirement>,
    ) -> Self {
        Distribution {
            key: ProjectName::new(project_name),
            project_name: project_name.to_string(),
            version,
            location: location.into(),
            metadata_dir: None,
            requires,
        }
    }

    pub fn from_metadata(
        metadata: DistMetadata,
        location: impl Into<PathBuf>,
    ) -> Result<Self, ParseError> {
        let version = parse_version(&metadata.version)?;
        let requires = metadata
            .requires_dist
            .iter()
            .map(|spec| parse_requirement(spec))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Distribution::new(&metadata.name, version, location, requires))
    }

    /// Reads a `<name>-<version>.dist-info` directory. The distribution is
    /// located in the directory containing it.
    pub fn from_dist_info(path: &Path) -> Result<Self, ParseError> {
        trace!("Reading distribution metadata from {}", path.display());
        let metadata = DistMetadata::from_file(&path.join(METADATA_FILE_NAME))?;
        let location = path.parent().unwrap_or(path).to_path_buf();
        let mut distribution = Distribution::from_metadata(metadata, location)?;
        distribution.metadata_dir = Some(path.to_path_buf());
        Ok(distribution)
    }

    /// Declared sub-requirements, unfiltered. Markers and extras are
    /// evaluated by the resolver.
    pub fn requires(&self) -> &[Requirement] {
        &self.requires
    }

    /// Whether this distribution can stand in for `requirement`.
    pub fn satisfies(&self, requirement: &Requirement) -> bool {
        if requirement_name(requirement) != self.key {
            return false;
        }
        match version_specifiers(requirement) {
            Ok(Some(specifiers)) => specifiers.contains(&self.version),
            Ok(None) => true,
            Err(err) => {
                debug!("Treating {requirement} as unsatisfied: {err}");
                false
            }
        }
    }
}

impl PartialEq for Distribution {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.version == other.version && self.location == other.location
    }
}

impl Eq for Distribution {}

impl Display for Distribution {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.project_name, self.version)
    }
}

pub fn parse_version(version: &str) -> Result<Version, ParseError> {
    Version::from_str(version.trim())
        .map_err(|err| ParseError::Version(version.to_string(), err.to_string()))
}

/// All distributions with a `.dist-info` directory directly under `dir`,
/// sorted by directory name.
pub fn find_distributions(dir: &Path) -> Result<Vec<Distribution>, ParseError> {
    let mut dist_infos = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()?;
    dist_infos.retain(|path| is_dist_info(path));
    dist_infos.sort();
    dist_infos
        .iter()
        .map(|path| Distribution::from_dist_info(path))
        .collect()
}
