use std::collections::HashSet;

use crate::plugin_system::dependency::{
    DependencyChecker, DependencyCheckers, DependencyError, DependencySpec, InternalPluginChecker, PackageChecker,
    RuntimeVersionChecker,
};
use crate::plugin_system::version::{VersionRange, parse_version};

#[test]
fn test_parse_dependency_kinds() {
    assert_eq!(DependencySpec::parse("beta").unwrap(), DependencySpec::Plugin("beta".to_string()));
    assert_eq!(
        DependencySpec::parse("plugin:beta").unwrap(),
        DependencySpec::Plugin("beta".to_string())
    );
    assert_eq!(
        DependencySpec::parse("package: openssl").unwrap(),
        DependencySpec::Package("openssl".to_string())
    );
    assert_eq!(
        "runtime:>=0.1".parse::<DependencySpec>().unwrap(),
        DependencySpec::Runtime(">=0.1".to_string())
    );
    assert_eq!(DependencySpec::Package("git".to_string()).to_string(), "package:git");
}

#[test]
fn test_parse_dependency_errors() {
    assert!(matches!(
        DependencySpec::parse("npm:left-pad"),
        Err(DependencyError::UnknownKind { kind, .. }) if kind == "npm"
    ));
    assert!(matches!(DependencySpec::parse("package:"), Err(DependencyError::Empty(_))));
    assert!(matches!(DependencySpec::parse("  "), Err(DependencyError::Empty(_))));
}

#[test]
fn test_internal_checker_uses_admitted_set() {
    let admitted: HashSet<String> = ["alpha".to_string()].into_iter().collect();
    let checker = InternalPluginChecker::new(&admitted);
    assert!(checker.is_installed("alpha"));
    assert!(!checker.is_installed("beta"));
}

#[test]
fn test_runtime_checker_requirements() {
    let checker = RuntimeVersionChecker::from_version_str("1.4.2").unwrap();
    assert!(checker.is_installed("1.2"), "a bare version is a minimum");
    assert!(checker.is_installed(">=1.0, <2.0"));
    assert!(!checker.is_installed("^2.0"));
    assert!(!checker.is_installed("not a version"));
}

#[test]
fn test_version_helpers() {
    assert_eq!(parse_version("v2").unwrap().to_string(), "2.0.0");
    assert_eq!(parse_version("1.3").unwrap().to_string(), "1.3.0");
    assert!(parse_version("one").is_err());

    let range = VersionRange::minimum_or_constraint("0.2.0").unwrap();
    assert!(range.includes(&parse_version("0.5.0").unwrap()));
    assert_eq!(range.to_string(), "0.2.0");
}

#[test]
fn test_unmet_splits_internal_and_external() {
    let checkers = DependencyCheckers::new(
        PackageChecker::new(["openssl"]),
        RuntimeVersionChecker::from_version_str("0.1.0").unwrap(),
    );
    let admitted: HashSet<String> = ["alpha".to_string()].into_iter().collect();
    let specs = vec![
        DependencySpec::Plugin("alpha".to_string()),
        DependencySpec::Plugin("beta".to_string()),
        DependencySpec::Package("openssl".to_string()),
        DependencySpec::Package("ffmpeg".to_string()),
        DependencySpec::Runtime(">=9.0".to_string()),
    ];

    let unmet = checkers.unmet(&specs, &admitted);

    assert_eq!(unmet.internal, vec![DependencySpec::Plugin("beta".to_string())]);
    assert_eq!(
        unmet.external,
        vec![
            DependencySpec::Package("ffmpeg".to_string()),
            DependencySpec::Runtime(">=9.0".to_string()),
        ]
    );
    assert_eq!(unmet.all(), vec!["package:ffmpeg", "runtime:>=9.0", "plugin:beta"]);
    assert!(checkers.unmet(&specs[..1], &admitted).is_empty());
}
