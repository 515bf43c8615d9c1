use std::path::Path;

use serde::Serialize;

use crate::model::{distribution::Distribution, excludes::ExclusionSet, ParseError};

/// Summary of an install run, written next to the deployment package.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InstallManifest {
    pub target: String,
    pub excludes: Vec<String>,
    pub distributions: Vec<InstalledDistribution>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InstalledDistribution {
    pub name: String,
    pub version: String,
}

impl InstallManifest {
    pub fn new(target: &Path, excludes: &ExclusionSet, distributions: &[Distribution]) -> Self {
        InstallManifest {
            target: target.display().to_string(),
            excludes: excludes.iter().map(ToString::to_string).collect(),
            distributions: distributions
                .iter()
                .map(|dist| InstalledDistribution {
                    name: dist.project_name.clone(),
                    version: dist.version.to_string(),
                })
                .collect(),
        }
    }

    pub fn to_string(&self) -> Result<String, ParseError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
