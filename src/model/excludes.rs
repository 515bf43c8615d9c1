use std::collections::BTreeSet;

use crate::model::name::ProjectName;

/// Packages the serverless python runtime already ships with.
pub const LAMBDA_EXCLUDES: &[&str] = &[
    "boto3",
    "botocore",
    "jmespath",
    "pip",
    "python-dateutil",
    "rapid-client",
    "s3transfer",
    "setuptools",
    "six",
    "urllib3",
];

/// Project names that are never installed, wherever they occur in the
/// dependency tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    names: BTreeSet<ProjectName>,
}

impl ExclusionSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ExclusionSet {
            names: names
                .into_iter()
                .map(|name| ProjectName::new(name.as_ref()))
                .collect(),
        }
    }

    pub fn lambda() -> Self {
        ExclusionSet::new(LAMBDA_EXCLUDES)
    }

    pub fn contains(&self, name: &ProjectName) -> bool {
        self.names.contains(name)
    }

    pub fn union(&self, other: &ExclusionSet) -> Self {
        ExclusionSet {
            names: self.names.union(&other.names).cloned().collect(),
        }
    }

    pub fn difference(&self, other: &ExclusionSet) -> Self {
        ExclusionSet {
            names: self.names.difference(&other.names).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProjectName> {
        self.names.iter()
    }
}

impl<S: AsRef<str>> FromIterator<S> for ExclusionSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        ExclusionSet::new(iter)
    }
}
