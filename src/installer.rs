use std::{
    fs::File,
    path::{Component, Path, PathBuf},
};

use log::{debug, info, warn};
use pep508_rs::Requirement;
use thiserror::Error;
use zip::ZipArchive;

use crate::{
    fetch::{FetchError, WheelFetcher},
    model::{
        distribution::{find_distributions, Distribution},
        metadata::{DistMetadata, DIST_INFO_SUFFIX, METADATA_FILE_NAME},
        name::ProjectName,
        requirement::requirement_name,
        ParseError,
    },
    resolver::WorkingSet,
};

/// Supplies a distribution for a requirement the working set cannot meet.
/// `Ok(None)` means no distribution is available.
pub trait Installer {
    fn fetch_dist(
        &self,
        requirement: &Requirement,
        working_set: &WorkingSet,
    ) -> Result<Option<Distribution>, InstallError>;
}

impl<F> Installer for F
where
    F: Fn(&Requirement, &WorkingSet) -> Result<Option<Distribution>, InstallError>,
{
    fn fetch_dist(
        &self,
        requirement: &Requirement,
        working_set: &WorkingSet,
    ) -> Result<Option<Distribution>, InstallError> {
        self(requirement, working_set)
    }
}

#[derive(Error, Debug)]
#[error("Could not install {requirement}: {cause}")]
pub struct InstallError {
    pub requirement: String,
    #[source]
    pub cause: InstallFailure,
}

impl InstallError {
    pub fn new(requirement: &Requirement, cause: impl Into<InstallFailure>) -> Self {
        InstallError {
            requirement: requirement.to_string(),
            cause: cause.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum InstallFailure {
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Error while reading wheel archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Error while fetching wheel: {0}")]
    Fetch(#[from] FetchError),
    #[error("Error while reading installed metadata: {0}")]
    Metadata(#[from] ParseError),
    #[error("Wheel {0} has no .dist-info metadata")]
    MissingDistInfo(String),
    #[error("Wheel entry {0} would be written outside the install directory")]
    UnsafePath(String),
    #[error("Fetched wheel provides {found}, not {expected}")]
    Mismatch { expected: String, found: String },
}

/// Installs wheels by unpacking them, `.dist-info` directory included, into
/// a flat target directory.
pub struct DistInstaller<F = Box<dyn WheelFetcher>> {
    dist_dir: PathBuf,
    fetcher: F,
}

impl<F: WheelFetcher> DistInstaller<F> {
    pub fn new(dist_dir: &Path, fetcher: F) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(dist_dir)?;
        Ok(DistInstaller {
            dist_dir: dist_dir.canonicalize()?,
            fetcher,
        })
    }

    pub fn dist_dir(&self) -> &Path {
        &self.dist_dir
    }

    pub fn installed(&self) -> Result<Vec<Distribution>, ParseError> {
        find_distributions(&self.dist_dir)
    }

    pub fn install(&self, requirement: &Requirement) -> Result<Distribution, InstallError> {
        self.try_install(requirement)
            .map_err(|cause| InstallError::new(requirement, cause))
    }

    fn try_install(&self, requirement: &Requirement) -> Result<Distribution, InstallFailure> {
        // The resolver already evaluated markers: if it asks, it is required.
        let mut requirement = requirement.clone();
        requirement.marker = None;
        let name = requirement_name(&requirement);

        if let Some(dist) = self
            .installed()?
            .into_iter()
            .find(|dist| dist.satisfies(&requirement))
        {
            debug!("{dist} is already installed in {}", self.dist_dir.display());
            return Ok(dist);
        }

        let download_dir = tempfile::tempdir()?;
        let wheel = self.fetcher.fetch_wheel(&requirement, download_dir.path())?;
        let dist_info = self.extract(&wheel, &name)?;
        let dist = Distribution::from_dist_info(&self.dist_dir.join(dist_info))?;
        self.remove_stale(&dist)?;

        info!("Extracted {dist} into {}", self.dist_dir.display());
        Ok(dist)
    }

    /// Unpacks every entry of `wheel` into the target directory and returns
    /// the name of its `.dist-info` directory. Nothing is written unless all
    /// entry paths stay inside the target and the metadata names `expected`.
    fn extract(&self, wheel: &Path, expected: &ProjectName) -> Result<String, InstallFailure> {
        debug!(
            "Extracting {} into {}",
            wheel.display(),
            self.dist_dir.display()
        );
        let mut archive = ZipArchive::new(File::open(wheel)?)?;

        let mut entries = Vec::with_capacity(archive.len());
        let mut metadata_entry = None;
        for index in 0..archive.len() {
            let entry = archive.by_index(index)?;
            let relative = entry
                .enclosed_name()
                .map(Path::to_path_buf)
                .ok_or_else(|| InstallFailure::UnsafePath(entry.name().to_string()))?;
            if metadata_entry.is_none() {
                metadata_entry = metadata_dir_name(&relative).map(|dir| (index, dir));
            }
            entries.push((index, relative, entry.is_dir()));
        }
        let (metadata_index, dist_info) = metadata_entry
            .ok_or_else(|| InstallFailure::MissingDistInfo(wheel.display().to_string()))?;

        let contents = std::io::read_to_string(archive.by_index(metadata_index)?)?;
        let metadata = DistMetadata::from_str(
            &contents,
            &format!("{dist_info}/{METADATA_FILE_NAME}"),
        )?;
        if ProjectName::new(&metadata.name) != *expected {
            return Err(InstallFailure::Mismatch {
                expected: expected.to_string(),
                found: format!("{} {}", metadata.name, metadata.version),
            });
        }

        for (index, relative, is_dir) in entries {
            let target = self.dist_dir.join(&relative);
            if is_dir {
                std::fs::create_dir_all(&target)?;
                continue;
            }
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&target)?;
            std::io::copy(&mut archive.by_index(index)?, &mut out)?;
        }

        Ok(dist_info)
    }

    /// Drops metadata left behind by other versions of the same project.
    fn remove_stale(&self, dist: &Distribution) -> Result<(), InstallFailure> {
        for other in self.installed()? {
            if other.key != dist.key || other.metadata_dir == dist.metadata_dir {
                continue;
            }
            if let Some(metadata_dir) = &other.metadata_dir {
                warn!("Removing metadata of replaced {other}");
                std::fs::remove_dir_all(metadata_dir)?;
            }
        }
        Ok(())
    }
}

impl<F: WheelFetcher> Installer for DistInstaller<F> {
    fn fetch_dist(
        &self,
        requirement: &Requirement,
        _working_set: &WorkingSet,
    ) -> Result<Option<Distribution>, InstallError> {
        self.install(requirement).map(Some)
    }
}

/// `<dir>.dist-info` when `path` is `<dir>.dist-info/METADATA`.
fn metadata_dir_name(path: &Path) -> Option<String> {
    let mut components = path.components();
    let (Some(Component::Normal(dir)), Some(Component::Normal(file)), None) =
        (components.next(), components.next(), components.next())
    else {
        return None;
    };
    let dir = dir.to_str()?;
    (dir.ends_with(DIST_INFO_SUFFIX) && file == METADATA_FILE_NAME).then(|| dir.to_string())
}
