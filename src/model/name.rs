use std::fmt::{Display, Formatter};

use serde::Serialize;

/// Normalized project name used as the key everywhere a distribution is
/// looked up: lowercase, with runs of `-`, `_` and `.` collapsed to `-`.
#[derive(Clone, Hash, Serialize, Debug, PartialEq, Eq, Ord, PartialOrd)]
pub struct ProjectName(String);

impl ProjectName {
    pub fn new(name: &str) -> Self {
        let mut normalized = String::with_capacity(name.len());
        let mut pending_separator = false;
        for c in name.trim().chars() {
            if matches!(c, '-' | '_' | '.') {
                pending_separator = true;
                continue;
            }
            if pending_separator && !normalized.is_empty() {
                normalized.push('-');
            }
            pending_separator = false;
            normalized.push(c.to_ascii_lowercase());
        }
        ProjectName(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The escaped form used in wheel file names and `.dist-info` directories.
    pub fn to_dist_info_stem(&self) -> String {
        self.0.replace('-', "_")
    }
}

impl Display for ProjectName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectName {
    fn from(s: &str) -> Self {
        ProjectName::new(s)
    }
}

impl From<String> for ProjectName {
    fn from(s: String) -> Self {
        ProjectName::new(&s)
    }
}
