use std::{
    collections::{BTreeSet, HashMap, HashSet, VecDeque},
    path::{Path, PathBuf},
};

use log::{debug, info, trace, warn};
use pep508_rs::{ExtraName, MarkerEnvironment, Requirement};

use crate::{
    installer::Installer,
    model::{
        distribution::{find_distributions, Distribution},
        name::ProjectName,
        requirement::{requirement_extras, requirement_name},
        ParseError,
    },
};

use super::{AdmitAll, DistributionResolver, RequirementFilter, ResolveError};

/// Distributions currently considered available, at most one per project,
/// in the order they became available.
pub struct WorkingSet {
    entries: Vec<PathBuf>,
    dists: Vec<Distribution>,
    marker_environment: MarkerEnvironment,
}

struct Pending {
    requirement: Requirement,
    requested_by: Option<String>,
}

impl WorkingSet {
    pub fn new(marker_environment: MarkerEnvironment) -> Self {
        WorkingSet {
            entries: Vec::new(),
            dists: Vec::new(),
            marker_environment,
        }
    }

    /// Builds a working set from the distributions installed under each of
    /// `entries`. When several entries provide the same project the first
    /// one wins.
    pub fn from_entries(
        entries: &[PathBuf],
        marker_environment: MarkerEnvironment,
    ) -> Result<Self, ParseError> {
        let mut working_set = WorkingSet::new(marker_environment);
        for entry in entries {
            working_set.add_entry(entry)?;
        }
        Ok(working_set)
    }

    pub fn add_entry(&mut self, entry: &Path) -> Result<(), ParseError> {
        self.entries.push(entry.to_path_buf());
        if !entry.is_dir() {
            debug!("Skipping missing entry {}", entry.display());
            return Ok(());
        }
        for dist in find_distributions(entry)? {
            trace!("Found {} in {}", dist, entry.display());
            self.add(dist, false);
        }
        Ok(())
    }

    /// Adds `dist` unless a distribution of the same project is present.
    /// With `replace` the present one is swapped out in place. Returns
    /// whether `dist` ended up in the set.
    pub fn add(&mut self, dist: Distribution, replace: bool) -> bool {
        match self.dists.iter().position(|d| d.key == dist.key) {
            Some(index) if replace => {
                self.dists[index] = dist;
                true
            }
            Some(_) => false,
            None => {
                self.dists.push(dist);
                true
            }
        }
    }

    pub fn find(&self, name: &ProjectName) -> Option<&Distribution> {
        self.dists.iter().find(|d| &d.key == name)
    }

    pub fn retain(&mut self, keep: impl FnMut(&Distribution) -> bool) {
        self.dists.retain(keep);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Distribution> {
        self.dists.iter()
    }

    pub fn len(&self) -> usize {
        self.dists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dists.is_empty()
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn marker_environment(&self) -> &MarkerEnvironment {
        &self.marker_environment
    }

    /// Breadth-first resolution. Every requirement popped from the queue
    /// first goes through `filter`; rejected ones are neither looked up,
    /// installed nor expanded. Sub-requirements are queued in declaration
    /// order. `extras` are active when evaluating top-level markers.
    ///
    /// A project is replaced at most once per call, a second conflict on it
    /// is a `VersionConflict`.
    pub(crate) fn resolve_filtered(
        &mut self,
        requirements: &[Requirement],
        installer: Option<&dyn Installer>,
        replace_conflicting: bool,
        extras: &[ExtraName],
        filter: &dyn RequirementFilter,
    ) -> Result<Vec<Distribution>, ResolveError> {
        let mut queue = requirements
            .iter()
            .filter(|requirement| requirement.evaluate_markers(&self.marker_environment, extras))
            .map(|requirement| Pending {
                requirement: requirement.clone(),
                requested_by: None,
            })
            .collect::<VecDeque<_>>();

        let mut processed: HashSet<(ProjectName, Vec<String>)> = HashSet::new();
        let mut selected_for: HashMap<ProjectName, Requirement> = HashMap::new();
        let mut required_by: HashMap<ProjectName, BTreeSet<String>> = HashMap::new();
        let mut replaced: HashSet<ProjectName> = HashSet::new();
        let mut resolved: Vec<Distribution> = Vec::new();

        while let Some(Pending {
            requirement,
            requested_by,
        }) = queue.pop_front()
        {
            let name = requirement_name(&requirement);
            if !filter.admits(&name) {
                debug!("Dropping excluded requirement {requirement}");
                continue;
            }
            if let Some(parent) = requested_by {
                required_by.entry(name.clone()).or_default().insert(parent);
            }

            let current = resolved
                .iter()
                .find(|d| d.key == name)
                .or_else(|| self.find(&name))
                .cloned();

            let (dist, fresh) = match current {
                Some(dist) if dist.satisfies(&requirement) => {
                    let fresh = !resolved.contains(&dist);
                    if fresh {
                        trace!("Using available {dist} for {requirement}");
                        resolved.push(dist.clone());
                    }
                    (dist, fresh)
                }
                Some(dist) if !replace_conflicting || replaced.contains(&name) => {
                    return Err(ResolveError::VersionConflict {
                        earlier: selected_for.get(&name).cloned().map(Box::new),
                        required_by: required_by.remove(&name).unwrap_or_default(),
                        dist: Box::new(dist),
                        requirement: Box::new(requirement),
                    });
                }
                current => {
                    if let Some(conflicting) = &current {
                        warn!("Replacing {conflicting} to satisfy {requirement}");
                        replaced.insert(name.clone());
                    }
                    let dist = self.acquire(&requirement, installer, &required_by)?;
                    resolved.retain(|d| d.key != name);
                    resolved.push(dist.clone());
                    self.add(dist.clone(), true);
                    (dist, true)
                }
            };
            selected_for
                .entry(name.clone())
                .or_insert_with(|| requirement.clone());

            let key = (name, requirement_extras(&requirement));
            if !fresh && processed.contains(&key) {
                continue;
            }

            for sub_requirement in dist.requires() {
                if !sub_requirement.evaluate_markers(&self.marker_environment, &requirement.extras)
                {
                    trace!("Markers exclude {sub_requirement} of {dist}");
                    continue;
                }
                queue.push_back(Pending {
                    requirement: sub_requirement.clone(),
                    requested_by: Some(dist.project_name.clone()),
                });
            }
            processed.insert(key);
        }

        Ok(resolved)
    }

    fn acquire(
        &self,
        requirement: &Requirement,
        installer: Option<&dyn Installer>,
        required_by: &HashMap<ProjectName, BTreeSet<String>>,
    ) -> Result<Distribution, ResolveError> {
        let not_found = || ResolveError::DistributionNotFound {
            requirement: Box::new(requirement.clone()),
            required_by: required_by
                .get(&requirement_name(requirement))
                .cloned()
                .unwrap_or_default(),
        };

        let Some(installer) = installer else {
            return Err(not_found());
        };
        let dist = installer
            .fetch_dist(requirement, self)?
            .ok_or_else(not_found)?;
        if !dist.satisfies(requirement) {
            return Err(ResolveError::VersionConflict {
                dist: Box::new(dist),
                requirement: Box::new(requirement.clone()),
                earlier: None,
                required_by: BTreeSet::new(),
            });
        }
        info!("Installed {dist}");
        Ok(dist)
    }
}

impl DistributionResolver for WorkingSet {
    fn resolve_with_extras(
        &mut self,
        requirements: &[Requirement],
        installer: Option<&dyn Installer>,
        replace_conflicting: bool,
        extras: &[ExtraName],
    ) -> Result<Vec<Distribution>, ResolveError> {
        self.resolve_filtered(requirements, installer, replace_conflicting, extras, &AdmitAll)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    use crate::test_support::{dist, marker_env, req, write_dist_info, FakeIndex};
    use pretty_assertions::assert_eq;

    fn names(dists: &[Distribution]) -> Vec<String> {
        dists.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn resolves_transitive_dependencies_breadth_first() {
        let index = FakeIndex::new(vec![
            dist("a", "1.0", &["b", "c"]),
            dist("b", "1.0", &["d"]),
            dist("c", "1.0", &[]),
            dist("d", "1.0", &[]),
        ]);
        let mut working_set = WorkingSet::new(marker_env());

        let resolved = working_set
            .resolve(&[req("a")], Some(&index), false)
            .unwrap();

        assert_eq!(names(&resolved), vec!["a 1.0", "b 1.0", "c 1.0", "d 1.0"]);
        assert_eq!(working_set.len(), 4);
    }

    #[test]
    fn shared_dependency_is_installed_once() {
        let index = FakeIndex::new(vec![
            dist("a", "1.0", &["shared>=1"]),
            dist("b", "1.0", &["shared"]),
            dist("shared", "1.2", &[]),
        ]);
        let mut working_set = WorkingSet::new(marker_env());

        let resolved = working_set
            .resolve(&[req("a"), req("b")], Some(&index), false)
            .unwrap();

        assert_eq!(names(&resolved), vec!["a 1.0", "b 1.0", "shared 1.2"]);
        assert_eq!(index.called(), vec!["a", "b", "shared"]);
    }

    #[test]
    fn second_resolve_reuses_working_set() {
        let index = FakeIndex::new(vec![dist("a", "1.0", &["b"]), dist("b", "1.0", &[])]);
        let mut working_set = WorkingSet::new(marker_env());

        let first = working_set
            .resolve(&[req("a")], Some(&index), false)
            .unwrap();
        let second = working_set
            .resolve(&[req("a")], Some(&index), false)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(index.called(), vec!["a", "b"]);
    }

    #[test]
    fn missing_distribution() {
        let index = FakeIndex::new(vec![dist("a", "1.0", &["ghost>=2"])]);
        let mut working_set = WorkingSet::new(marker_env());

        let err = working_set
            .resolve(&[req("a")], Some(&index), false)
            .unwrap_err();

        match err {
            ResolveError::DistributionNotFound {
                requirement,
                required_by,
            } => {
                assert_eq!(requirement.to_string(), req("ghost>=2").to_string());
                assert_eq!(required_by, BTreeSet::from(["a".to_string()]));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn no_installer_and_nothing_available() {
        let mut working_set = WorkingSet::new(marker_env());
        let err = working_set.resolve(&[req("a")], None, false).unwrap_err();
        assert!(matches!(err, ResolveError::DistributionNotFound { .. }));
    }

    #[test]
    fn conflicting_pins_fail_without_replacement() {
        let index = FakeIndex::new(vec![dist("pkgx", "1.0", &[]), dist("pkgx", "2.0", &[])]);
        let mut working_set = WorkingSet::new(marker_env());

        let err = working_set
            .resolve(&[req("pkgX==1.0"), req("pkgX==2.0")], Some(&index), false)
            .unwrap_err();

        match err {
            ResolveError::VersionConflict {
                dist,
                requirement,
                earlier,
                ..
            } => {
                assert_eq!(dist.to_string(), "pkgx 1.0");
                assert_eq!(requirement.to_string(), req("pkgX==2.0").to_string());
                assert_eq!(
                    earlier.map(|r| r.to_string()),
                    Some(req("pkgX==1.0").to_string())
                );
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn conflicting_pins_last_wins_with_replacement() {
        let index = FakeIndex::new(vec![
            dist("pkgx", "1.0", &["old-only"]),
            dist("pkgx", "2.0", &[]),
            dist("old-only", "1.0", &[]),
        ]);
        let mut working_set = WorkingSet::new(marker_env());

        let resolved = working_set
            .resolve(&[req("pkgX==1.0"), req("pkgX==2.0")], Some(&index), true)
            .unwrap();

        let pkgx = resolved
            .iter()
            .filter(|d| d.key == ProjectName::new("pkgx"))
            .collect::<Vec<_>>();
        assert_eq!(pkgx.len(), 1);
        assert_eq!(pkgx[0].to_string(), "pkgx 2.0");
        assert_eq!(
            working_set
                .find(&ProjectName::new("pkgx"))
                .map(ToString::to_string),
            Some("pkgx 2.0".to_string())
        );
        // Requirements queued by the replaced version are still honoured.
        assert_eq!(names(&resolved), vec!["pkgx 2.0", "old-only 1.0"]);
    }

    #[test]
    fn replacement_cycle_is_a_conflict() {
        let index = FakeIndex::new(vec![
            dist("x", "1.0", &["y==1.0"]),
            dist("x", "2.0", &["y==2.0"]),
            dist("y", "1.0", &["x==2.0"]),
            dist("y", "2.0", &["x==1.0"]),
        ]);
        let mut working_set = WorkingSet::new(marker_env());

        let err = working_set
            .resolve(&[req("x==1.0")], Some(&index), true)
            .unwrap_err();

        match err {
            ResolveError::VersionConflict {
                dist,
                requirement,
                earlier,
                ..
            } => {
                assert_eq!(dist.to_string(), "x 2.0");
                assert_eq!(requirement.to_string(), req("x==1.0").to_string());
                assert!(earlier.is_some());
            }
            other => panic!("unexpected error {other}"),
        }
        assert_eq!(index.called(), vec!["x", "y", "x", "y"]);
    }

    #[test]
    fn caller_extras_activate_top_level_markers() {
        let index = FakeIndex::new(vec![dist("tomli", "2.0", &[])]);
        let requirements = [req(r#"tomli ; extra == "toml""#)];

        let mut working_set = WorkingSet::new(marker_env());
        let plain = working_set
            .resolve(&requirements, Some(&index), false)
            .unwrap();
        assert!(plain.is_empty());

        let with_extra = working_set
            .resolve_with_extras(
                &requirements,
                Some(&index),
                false,
                &[ExtraName::from_str("toml").unwrap()],
            )
            .unwrap();
        assert_eq!(names(&with_extra), vec!["tomli 2.0"]);
    }

    #[test]
    fn transitive_conflict_with_preinstalled() {
        let dir = tempfile::tempdir().unwrap();
        write_dist_info(dir.path(), "b", "1.0", &[]);
        let index = FakeIndex::new(vec![dist("a", "1.0", &["b>=2"]), dist("b", "2.0", &[])]);
        let mut working_set =
            WorkingSet::from_entries(&[dir.path().to_path_buf()], marker_env()).unwrap();

        let err = working_set
            .resolve(&[req("a")], Some(&index), false)
            .unwrap_err();
        match err {
            ResolveError::VersionConflict {
                earlier,
                required_by,
                ..
            } => {
                assert!(earlier.is_none());
                assert_eq!(required_by, BTreeSet::from(["a".to_string()]));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn preinstalled_distribution_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        write_dist_info(dir.path(), "b", "1.5", &[]);
        let index = FakeIndex::new(vec![dist("a", "1.0", &["b>=1"])]);
        let mut working_set =
            WorkingSet::from_entries(&[dir.path().to_path_buf()], marker_env()).unwrap();

        let resolved = working_set
            .resolve(&[req("a")], Some(&index), false)
            .unwrap();

        assert_eq!(names(&resolved), vec!["a 1.0", "b 1.5"]);
        assert_eq!(resolved[1].location, dir.path());
        assert_eq!(index.called(), vec!["a"]);
    }

    #[test]
    fn markers_and_extras() {
        let index = FakeIndex::new(vec![
            dist(
                "jose",
                "3.3",
                &[
                    "rsa",
                    r#"pycryptodome ; extra == "pycryptodome""#,
                    r#"tomli ; python_version < "3.11""#,
                ],
            ),
            dist("rsa", "4.9", &[]),
            dist("pycryptodome", "3.20", &[]),
            dist("tomli", "2.0", &[]),
        ]);

        let mut working_set = WorkingSet::new(marker_env());
        let plain = working_set
            .resolve(&[req("jose")], Some(&index), false)
            .unwrap();
        assert_eq!(names(&plain), vec!["jose 3.3", "rsa 4.9"]);

        let with_extra = working_set
            .resolve(&[req("jose[pycryptodome]")], Some(&index), false)
            .unwrap();
        assert_eq!(
            names(&with_extra),
            vec!["jose 3.3", "rsa 4.9", "pycryptodome 3.20"]
        );
    }

    #[test]
    fn top_level_markers_are_evaluated() {
        let index = FakeIndex::new(vec![dist("tomli", "2.0", &[])]);
        let mut working_set = WorkingSet::new(marker_env());
        let resolved = working_set
            .resolve(
                &[req(r#"tomli ; python_version < "3.11""#)],
                Some(&index),
                false,
            )
            .unwrap();
        assert!(resolved.is_empty());
        assert!(index.called().is_empty());
    }

    #[test]
    fn dependency_cycle_terminates() {
        let index = FakeIndex::new(vec![dist("a", "1.0", &["b"]), dist("b", "1.0", &["a"])]);
        let mut working_set = WorkingSet::new(marker_env());
        let resolved = working_set
            .resolve(&[req("a")], Some(&index), false)
            .unwrap();
        assert_eq!(names(&resolved), vec!["a 1.0", "b 1.0"]);
    }

    #[test]
    fn add_keeps_one_distribution_per_project() {
        let mut working_set = WorkingSet::new(marker_env());
        assert!(working_set.add(dist("six", "1.15", &[]), false));
        assert!(!working_set.add(dist("Six", "1.16", &[]), false));
        assert_eq!(working_set.len(), 1);
        assert!(working_set.add(dist("six", "1.16", &[]), true));
        assert_eq!(
            working_set.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["six 1.16"]
        );
    }

    #[test]
    fn missing_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let working_set =
            WorkingSet::from_entries(&[dir.path().join("nope")], marker_env()).unwrap();
        assert!(working_set.is_empty());
        assert_eq!(working_set.entries(), &[dir.path().join("nope")]);
    }
}
