use std::{collections::HashMap, path::PathBuf};

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

pub struct LambdaPkgConfig {
    pub python: Option<PathBuf>,
    pub index_url: Option<String>,
    pub python_version: Option<String>,
}

impl LambdaPkgConfig {
    pub fn load() -> anyhow::Result<Self> {
        let raw_config = RawConfig::load(None)?;

        Ok(Self {
            python: raw_config.pip.python,
            index_url: raw_config.pip.index,
            python_version: raw_config.python.version,
        })
    }
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct RawConfig {
    #[serde(default)]
    pip: PipConfig,
    #[serde(default)]
    python: PythonConfig,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct PipConfig {
    python: Option<PathBuf>,
    index: Option<String>,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct PythonConfig {
    version: Option<String>,
}

impl RawConfig {
    fn load(env: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(
                Environment::with_prefix("LAMBDA_PKG")
                    .separator("_")
                    .source(env),
            )
            .build()?
            .try_deserialize()
    }
}
