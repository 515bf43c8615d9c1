use log::{debug, info};

use crate::{
    model::{
        excludes::{ExclusionSet, LAMBDA_EXCLUDES},
        manifest::InstallManifest,
        requirement::{parse_requirement, parse_requirements_file},
        ParseError,
    },
    LambdaPkg,
};
use pep508_rs::Requirement;
use std::{
    error::Error,
    path::{Path, PathBuf},
};

/// Handler to install command
/// Resolves the requirements into the target directory and optionally
/// writes a manifest of everything the requirements resolved to
pub fn do_install(
    lambda_pkg: &LambdaPkg,
    requirements: &[Requirement],
    replace_conflicting: bool,
    output_manifest: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    if requirements.is_empty() {
        return Err("No requirements given, pass them as arguments or with -r".into());
    }

    debug!(
        "Excluding {}",
        lambda_pkg
            .excludes()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    let resolved = lambda_pkg.install(requirements, replace_conflicting)?;
    info!(
        "Resolved {} distributions into {}",
        resolved.len(),
        lambda_pkg.target().display()
    );

    if let Some(output_manifest) = output_manifest {
        let manifest = InstallManifest::new(lambda_pkg.target(), lambda_pkg.excludes(), &resolved);
        std::fs::write(output_manifest, manifest.to_string()?)?;
        info!("Wrote install manifest to {}", output_manifest.display());
    }

    Ok(())
}

/// Handler to list command
pub fn do_list(lambda_pkg: &LambdaPkg) -> Result<(), Box<dyn Error>> {
    for dist in lambda_pkg.installed()? {
        println!("{} {}", dist.project_name, dist.version);
    }
    Ok(())
}

/// Handler to excludes command
pub fn do_excludes() {
    for name in LAMBDA_EXCLUDES {
        println!("{name}");
    }
}

/// Requirements given on the command line followed by those in
/// requirements files, in order
pub fn collect_requirements(
    requirements: &[String],
    requirement_files: &[PathBuf],
) -> Result<Vec<Requirement>, ParseError> {
    let mut collected = requirements
        .iter()
        .map(|spec| parse_requirement(spec))
        .collect::<Result<Vec<_>, _>>()?;
    for file in requirement_files {
        collected.extend(parse_requirements_file(file)?);
    }
    Ok(collected)
}

pub fn build_excludes(
    exclude: &[String],
    include: &[String],
    no_default_excludes: bool,
) -> ExclusionSet {
    let defaults = if no_default_excludes {
        ExclusionSet::default()
    } else {
        ExclusionSet::lambda()
    };
    defaults
        .union(&ExclusionSet::new(exclude))
        .difference(&ExclusionSet::new(include))
}
