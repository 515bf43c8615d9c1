use thiserror::Error;

pub mod distribution;
pub mod excludes;
pub mod manifest;
pub mod metadata;
pub mod name;
pub mod requirement;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error reading distribution metadata: {0}")]
    IO(#[from] std::io::Error),
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),
    #[error("Invalid requirement `{0}`: {1}")]
    Requirement(String, String),
    #[error("Invalid version `{0}`: {1}")]
    Version(String, String),
    #[error("Missing metadata field `{0}` in {1}")]
    MissingField(String, String),
    #[error("Invalid python version `{0}` for the marker environment")]
    PythonVersion(String),
}
