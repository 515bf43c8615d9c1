pub mod cli;
pub mod config;
pub mod fetch;
pub mod installer;
pub mod model;
pub mod resolver;

mod api;
#[cfg(test)]
mod test_support;

pub use api::{LambdaPkg, LambdaPkgBuilder};
pub use installer::{DistInstaller, Installer};
pub use model::excludes::{ExclusionSet, LAMBDA_EXCLUDES};
pub use resolver::{DistributionResolver, ExcludesWorkingSet, WorkingSet};
