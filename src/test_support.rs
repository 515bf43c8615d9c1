//! Fixtures shared by unit tests: in-memory package indexes and on-disk
//! wheels / dist-info directories.

use std::{
    cell::RefCell,
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use pep508_rs::{MarkerEnvironment, Requirement};
use zip::{write::FileOptions, ZipWriter};

use crate::{
    installer::{InstallError, Installer},
    model::{
        distribution::{parse_version, Distribution},
        name::ProjectName,
        requirement::{lambda_marker_environment, parse_requirement},
    },
    resolver::WorkingSet,
};

pub fn marker_env() -> MarkerEnvironment {
    lambda_marker_environment("3.12").unwrap()
}

pub fn req(spec: &str) -> Requirement {
    parse_requirement(spec).unwrap()
}

pub fn dist(name: &str, version: &str, requires: &[&str]) -> Distribution {
    Distribution::new(
        name,
        parse_version(version).unwrap(),
        "/index",
        requires.iter().map(|spec| req(spec)).collect(),
    )
}

/// Package index standing in for an installer: returns the highest version
/// satisfying the requirement and records every call.
pub struct FakeIndex {
    dists: Vec<Distribution>,
    pub calls: RefCell<Vec<String>>,
}

impl FakeIndex {
    pub fn new(dists: Vec<Distribution>) -> Self {
        FakeIndex {
            dists,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn called(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl Installer for FakeIndex {
    fn fetch_dist(
        &self,
        requirement: &Requirement,
        _working_set: &WorkingSet,
    ) -> Result<Option<Distribution>, InstallError> {
        self.calls.borrow_mut().push(requirement.name.to_string());
        Ok(self
            .dists
            .iter()
            .filter(|dist| dist.satisfies(requirement))
            .max_by(|a, b| a.version.cmp(&b.version))
            .cloned())
    }
}

fn metadata_text(name: &str, version: &str, requires: &[&str]) -> String {
    let mut text = format!("Metadata-Version: 2.1\nName: {name}\nVersion: {version}\n");
    for spec in requires {
        text.push_str(&format!("Requires-Dist: {spec}\n"));
    }
    text.push_str("\nLong description.\n");
    text
}

fn dist_info_name(name: &str, version: &str) -> String {
    format!(
        "{}-{}.dist-info",
        ProjectName::new(name).to_dist_info_stem(),
        version
    )
}

pub fn write_dist_info(root: &Path, name: &str, version: &str, requires: &[&str]) -> PathBuf {
    let dir = root.join(dist_info_name(name, version));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("METADATA"), metadata_text(name, version, requires)).unwrap();
    dir
}

/// Builds `<name>-<version>-py3-none-any.whl` in `dir` holding a single
/// module plus its dist-info directory.
pub fn write_wheel(dir: &Path, name: &str, version: &str, requires: &[&str]) -> PathBuf {
    let stem = ProjectName::new(name).to_dist_info_stem();
    let path = dir.join(format!("{stem}-{version}-py3-none-any.whl"));
    let mut zip = ZipWriter::new(File::create(&path).unwrap());
    let options = FileOptions::default();
    let dist_info = dist_info_name(name, version);

    zip.start_file(format!("{stem}/__init__.py"), options).unwrap();
    zip.write_all(format!("__version__ = \"{version}\"\n").as_bytes())
        .unwrap();
    zip.start_file(format!("{dist_info}/METADATA"), options)
        .unwrap();
    zip.write_all(metadata_text(name, version, requires).as_bytes())
        .unwrap();
    zip.start_file(format!("{dist_info}/WHEEL"), options).unwrap();
    zip.write_all(b"Wheel-Version: 1.0\nRoot-Is-Purelib: true\nTag: py3-none-any\n")
        .unwrap();
    zip.finish().unwrap();
    path
}
