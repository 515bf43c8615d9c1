use std::{path::Path, str::FromStr};

use log::debug;
use pep440_rs::VersionSpecifiers;
use pep508_rs::{MarkerEnvironment, Requirement, StringVersion, VersionOrUrl};

use crate::model::{name::ProjectName, ParseError};

pub const DEFAULT_PYTHON_VERSION: &str = "3.12";

pub fn parse_requirement(spec: &str) -> Result<Requirement, ParseError> {
    Requirement::from_str(spec.trim())
        .map_err(|err| ParseError::Requirement(spec.to_string(), err.to_string()))
}

/// Parses a requirements file: one requirement per line, blank lines and
/// `#` comments ignored.
pub fn parse_requirements_file(path: &Path) -> Result<Vec<Requirement>, ParseError> {
    debug!("Reading requirements from {}", path.display());
    let contents = std::fs::read_to_string(path)?;
    parse_requirements(&contents)
}

pub fn parse_requirements(contents: &str) -> Result<Vec<Requirement>, ParseError> {
    contents
        .lines()
        .map(|line| line.split_once(" #").map_or(line, |(head, _)| head).trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(parse_requirement)
        .collect()
}

pub fn requirement_name(requirement: &Requirement) -> ProjectName {
    ProjectName::new(&requirement.name.to_string())
}

/// Requested extras, lowercased, sorted and deduplicated.
pub fn requirement_extras(requirement: &Requirement) -> Vec<String> {
    let mut extras = requirement
        .extras
        .iter()
        .map(|extra| extra.to_string().to_ascii_lowercase())
        .collect::<Vec<_>>();
    extras.sort();
    extras.dedup();
    extras
}

/// Version constraint of a requirement, `None` when it accepts any version
/// (no specifier or a direct URL).
pub fn version_specifiers(
    requirement: &Requirement,
) -> Result<Option<VersionSpecifiers>, ParseError> {
    match &requirement.version_or_url {
        Some(VersionOrUrl::VersionSpecifier(specifiers)) => {
            let text = specifiers.to_string();
            VersionSpecifiers::from_str(&text)
                .map(Some)
                .map_err(|err| ParseError::Version(text, err.to_string()))
        }
        Some(VersionOrUrl::Url(_)) | None => Ok(None),
    }
}

pub fn direct_url(requirement: &Requirement) -> Option<String> {
    match &requirement.version_or_url {
        Some(VersionOrUrl::Url(url)) => Some(url.to_string()),
        _ => None,
    }
}

/// Marker environment of the serverless python runtime: CPython on
/// x86_64 Linux.
pub fn lambda_marker_environment(python_version: &str) -> Result<MarkerEnvironment, ParseError> {
    let parts = python_version
        .trim()
        .split('.')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>();
    if parts.len() < 2 || parts.iter().any(|part| part.parse::<u64>().is_err()) {
        return Err(ParseError::PythonVersion(python_version.to_string()));
    }
    let short = parts[..2].join(".");
    let full = if parts.len() == 2 {
        format!("{short}.0")
    } else {
        parts.join(".")
    };
    let string_version = |value: &str| {
        StringVersion::from_str(value)
            .map_err(|_| ParseError::PythonVersion(python_version.to_string()))
    };

    Ok(MarkerEnvironment {
        implementation_name: "cpython".into(),
        implementation_version: string_version(&full)?,
        os_name: "posix".into(),
        platform_machine: "x86_64".into(),
        platform_python_implementation: "CPython".into(),
        platform_release: String::new(),
        platform_system: "Linux".into(),
        platform_version: String::new(),
        python_full_version: string_version(&full)?,
        python_version: string_version(&short)?,
        sys_platform: "linux".into(),
    })
}
