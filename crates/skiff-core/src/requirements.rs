//! Minimum tool version checks

use semver::Version;

use crate::error::{CoreError, Result};
use crate::package::PackageDefinition;

/// Version reported by unreleased development builds
pub const DEV_VERSION: &str = "0.0.0-dev";

fn parse_version(s: &str) -> std::result::Result<Version, semver::Error> {
    Version::parse(s.trim().trim_start_matches('v'))
}

/// Check that `current` satisfies every version requirement of `pkg`
///
/// Development builds (empty or `0.0.0-dev`) skip the check. All unmet
/// requirements are reported in a single error.
pub fn validate_version_requirements(pkg: &PackageDefinition, current: &str) -> Result<()> {
    let requirements = &pkg.build.version_requirements;
    if requirements.is_empty() || current.is_empty() || current == DEV_VERSION {
        return Ok(());
    }

    let current_version = parse_version(current)?;
    let mut unmet = Vec::new();

    for requirement in requirements {
        let required = parse_version(&requirement.version)?;
        if current_version < required {
            let line = if requirement.reason.is_empty() {
                format!("  - requires v{}", required)
            } else {
                format!("  - requires v{}: {}", required, requirement.reason)
            };
            unmet.push(line);
        }
    }

    if unmet.is_empty() {
        return Ok(());
    }

    Err(CoreError::UnmetRequirements {
        details: format!(
            "current version v{} does not satisfy\n{}",
            current_version,
            unmet.join("\n")
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::VersionRequirement;

    fn package(requirements: &[(&str, &str)]) -> PackageDefinition {
        let mut pkg = PackageDefinition::default();
        pkg.build.version_requirements = requirements
            .iter()
            .map(|(version, reason)| VersionRequirement {
                version: version.to_string(),
                reason: reason.to_string(),
            })
            .collect();
        pkg
    }

    #[test]
    fn test_no_requirements() {
        assert!(validate_version_requirements(&package(&[]), "0.1.0").is_ok());
    }

    #[test]
    fn test_dev_version_skips_check() {
        let pkg = package(&[("v99.0.0", "future")]);
        assert!(validate_version_requirements(&pkg, DEV_VERSION).is_ok());
        assert!(validate_version_requirements(&pkg, "").is_ok());
    }

    #[test]
    fn test_exact_version_meets_requirement() {
        let pkg = package(&[("v0.3.0", "")]);
        assert!(validate_version_requirements(&pkg, "0.3.0").is_ok());
        assert!(validate_version_requirements(&pkg, "v0.3.1").is_ok());
    }

    #[test]
    fn test_all_unmet_requirements_reported() {
        let pkg = package(&[
            ("v0.2.0", "schema merging"),
            ("v0.1.0", ""),
            ("v0.5.0", "image archives"),
        ]);
        let err = validate_version_requirements(&pkg, "0.1.5").unwrap_err();
        let message = err.to_string();

        assert!(message.contains("requires v0.2.0: schema merging"));
        assert!(message.contains("requires v0.5.0: image archives"));
        assert!(!message.contains("v0.1.0"));
    }

    #[test]
    fn test_invalid_requirement_version() {
        let pkg = package(&[("latest", "")]);
        assert!(matches!(
            validate_version_requirements(&pkg, "0.1.0"),
            Err(CoreError::InvalidVersion(_))
        ));
    }
}
