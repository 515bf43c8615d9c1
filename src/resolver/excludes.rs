use std::path::PathBuf;

use log::debug;
use pep508_rs::{ExtraName, MarkerEnvironment, Requirement};

use crate::{
    installer::Installer,
    model::{distribution::Distribution, excludes::ExclusionSet, name::ProjectName, ParseError},
};

use super::{DistributionResolver, RequirementFilter, ResolveError, WorkingSet};

impl RequirementFilter for ExclusionSet {
    fn admits(&self, name: &ProjectName) -> bool {
        !self.contains(name)
    }
}

/// A working set that never resolves, installs or expands a project in its
/// exclusion set. Everything else is standard resolution.
pub struct ExcludesWorkingSet {
    inner: WorkingSet,
    excludes: ExclusionSet,
}

impl ExcludesWorkingSet {
    pub fn new(
        entries: &[PathBuf],
        excludes: ExclusionSet,
        marker_environment: MarkerEnvironment,
    ) -> Result<Self, ParseError> {
        let inner = WorkingSet::from_entries(entries, marker_environment)?;
        Ok(ExcludesWorkingSet::from_working_set(inner, excludes))
    }

    /// Wraps an existing working set, dropping any distribution whose
    /// project is excluded.
    pub fn from_working_set(mut inner: WorkingSet, excludes: ExclusionSet) -> Self {
        inner.retain(|dist| {
            let keep = !excludes.contains(&dist.key);
            if !keep {
                debug!("Ignoring excluded {dist} found in {}", dist.location.display());
            }
            keep
        });
        ExcludesWorkingSet { inner, excludes }
    }

    pub fn excludes(&self) -> &ExclusionSet {
        &self.excludes
    }

    pub fn working_set(&self) -> &WorkingSet {
        &self.inner
    }
}

impl DistributionResolver for ExcludesWorkingSet {
    fn resolve_with_extras(
        &mut self,
        requirements: &[Requirement],
        installer: Option<&dyn Installer>,
        replace_conflicting: bool,
        extras: &[ExtraName],
    ) -> Result<Vec<Distribution>, ResolveError> {
        self.inner.resolve_filtered(
            requirements,
            installer,
            replace_conflicting,
            extras,
            &self.excludes,
        )
    }
}
