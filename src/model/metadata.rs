use std::path::Path;

use crate::model::ParseError;

pub const METADATA_FILE_NAME: &str = "METADATA";
pub const DIST_INFO_SUFFIX: &str = ".dist-info";

/// The fields of a core metadata (`METADATA`) file the resolver cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistMetadata {
    pub name: String,
    pub version: String,
    pub requires_dist: Vec<String>,
}

impl DistMetadata {
    pub fn from_file(path: &Path) -> Result<DistMetadata, ParseError> {
        let contents = std::fs::read_to_string(path)?;
        DistMetadata::from_str(&contents, &path.display().to_string())
    }

    /// Parses the header section of an email-style metadata document. The
    /// header ends at the first blank line; anything after it is the
    /// long description and is ignored.
    pub fn from_str(contents: &str, origin: &str) -> Result<DistMetadata, ParseError> {
        let mut name = None;
        let mut version = None;
        let mut requires_dist = Vec::new();

        for line in contents.lines() {
            if line.trim().is_empty() {
                break;
            }
            // Folded continuation of a previous header.
            if line.starts_with([' ', '\t']) {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "name" => name = Some(value.to_string()),
                "version" => version = Some(value.to_string()),
                "requires-dist" => requires_dist.push(value.to_string()),
                _ => {}
            }
        }

        Ok(DistMetadata {
            name: name.ok_or_else(|| ParseError::MissingField("Name".into(), origin.into()))?,
            version: version
                .ok_or_else(|| ParseError::MissingField("Version".into(), origin.into()))?,
            requires_dist,
        })
    }
}

pub fn is_dist_info(path: &Path) -> bool {
    path.is_dir()
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(DIST_INFO_SUFFIX))
}
