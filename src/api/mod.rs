use std::{
    error::Error,
    path::{Path, PathBuf},
};

use pep508_rs::{MarkerEnvironment, Requirement};

use crate::{
    installer::DistInstaller,
    model::{distribution::Distribution, excludes::ExclusionSet},
    resolver::{DistributionResolver, ExcludesWorkingSet},
};

mod builder;

pub use builder::LambdaPkgBuilder;

pub struct LambdaPkg {
    entries: Vec<PathBuf>,
    excludes: ExclusionSet,
    marker_environment: MarkerEnvironment,
    installer: DistInstaller,
}

impl LambdaPkg {
    pub fn builder() -> LambdaPkgBuilder {
        LambdaPkgBuilder::default()
    }

    /// Resolves `requirements` against what is already installed in the
    /// target and installs everything missing, except excluded projects.
    pub fn install(
        &self,
        requirements: &[Requirement],
        replace_conflicting: bool,
    ) -> Result<Vec<Distribution>, Box<dyn Error>> {
        let mut working_set = ExcludesWorkingSet::new(
            &self.entries,
            self.excludes.clone(),
            self.marker_environment.clone(),
        )?;
        let resolved =
            working_set.resolve(requirements, Some(&self.installer), replace_conflicting)?;
        Ok(resolved)
    }

    /// Distributions currently installed in the target directory
    pub fn installed(&self) -> Result<Vec<Distribution>, Box<dyn Error>> {
        Ok(self.installer.installed()?)
    }

    pub fn target(&self) -> &Path {
        self.installer.dist_dir()
    }

    pub fn excludes(&self) -> &ExclusionSet {
        &self.excludes
    }
}
