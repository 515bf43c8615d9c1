mod excludes;
mod working_set;

use std::collections::BTreeSet;

use pep508_rs::{ExtraName, Requirement};
use thiserror::Error;

use crate::{
    installer::{InstallError, Installer},
    model::{distribution::Distribution, name::ProjectName},
};

pub use excludes::ExcludesWorkingSet;
pub use working_set::WorkingSet;

pub trait DistributionResolver {
    /// Lists every distribution needed to (recursively) meet `requirements`,
    /// in resolution order. `installer` is asked for anything not already
    /// present in the working set.
    fn resolve(
        &mut self,
        requirements: &[Requirement],
        installer: Option<&dyn Installer>,
        replace_conflicting: bool,
    ) -> Result<Vec<Distribution>, ResolveError> {
        self.resolve_with_extras(requirements, installer, replace_conflicting, &[])
    }

    /// Same as `resolve`, with `extras` active for the markers of the
    /// top-level requirements.
    fn resolve_with_extras(
        &mut self,
        requirements: &[Requirement],
        installer: Option<&dyn Installer>,
        replace_conflicting: bool,
        extras: &[ExtraName],
    ) -> Result<Vec<Distribution>, ResolveError>;
}

/// Decides, before any lookup or install happens, whether a requirement on
/// `name` takes part in resolution at all. A rejected requirement is
/// dropped together with everything it would have pulled in.
pub trait RequirementFilter {
    fn admits(&self, name: &ProjectName) -> bool;
}

pub struct AdmitAll;

impl RequirementFilter for AdmitAll {
    fn admits(&self, _name: &ProjectName) -> bool {
        true
    }
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("No distribution found for {requirement}{}", required_by_suffix(.required_by))]
    DistributionNotFound {
        requirement: Box<Requirement>,
        required_by: BTreeSet<String>,
    },
    #[error(
        "{dist} conflicts with {requirement}{}{}",
        earlier_suffix(.earlier.as_deref()),
        required_by_suffix(.required_by)
    )]
    VersionConflict {
        dist: Box<Distribution>,
        requirement: Box<Requirement>,
        /// The requirement `dist` was originally chosen for, when it was chosen
        /// during this resolution.
        earlier: Option<Box<Requirement>>,
        required_by: BTreeSet<String>,
    },
    #[error(transparent)]
    Installation(#[from] InstallError),
}

fn required_by_suffix(required_by: &BTreeSet<String>) -> String {
    if required_by.is_empty() {
        String::new()
    } else {
        format!(
            " (required by {})",
            required_by.iter().cloned().collect::<Vec<_>>().join(", ")
        )
    }
}

fn earlier_suffix(earlier: Option<&Requirement>) -> String {
    earlier
        .map(|requirement| format!(", which was selected for {requirement}"))
        .unwrap_or_default()
}
