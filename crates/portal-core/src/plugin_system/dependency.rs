use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use semver::Version;
use thiserror::Error;

use crate::plugin_system::version::{VersionError, VersionRange, parse_version};

/// A predicate deciding whether one declared dependency is satisfied.
pub trait DependencyChecker {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    fn is_installed(&self, identifier: &str) -> bool;
}

/// Satisfied when the identifier was already admitted during this load.
pub struct InternalPluginChecker<'a> {
    admitted: &'a HashSet<String>,
}

impl<'a> InternalPluginChecker<'a> {
    pub fn new(admitted: &'a HashSet<String>) -> Self {
        Self { admitted }
    }
}

impl DependencyChecker for InternalPluginChecker<'_> {
    fn name(&self) -> &'static str {
        "plugin"
    }

    fn is_installed(&self, identifier: &str) -> bool {
        self.admitted.contains(identifier)
    }
}

/// Satisfied when the package is in the configured installed set.
#[derive(Debug, Clone, Default)]
pub struct PackageChecker {
    installed: HashSet<String>,
}

impl PackageChecker {
    pub fn new<I, S>(installed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            installed: installed.into_iter().map(Into::into).collect(),
        }
    }
}

impl DependencyChecker for PackageChecker {
    fn name(&self) -> &'static str {
        "package"
    }

    fn is_installed(&self, identifier: &str) -> bool {
        self.installed.contains(identifier)
    }
}

/// Satisfied when the running core version meets the requirement. A bare
/// version is a minimum.
#[derive(Debug, Clone)]
pub struct RuntimeVersionChecker {
    runtime: Version,
}

impl RuntimeVersionChecker {
    pub fn new(runtime: Version) -> Self {
        Self { runtime }
    }

    pub fn from_version_str(runtime: &str) -> Result<Self, VersionError> {
        Ok(Self::new(parse_version(runtime)?))
    }

    pub fn runtime(&self) -> &Version {
        &self.runtime
    }
}

impl DependencyChecker for RuntimeVersionChecker {
    fn name(&self) -> &'static str {
        "runtime"
    }

    fn is_installed(&self, identifier: &str) -> bool {
        match VersionRange::minimum_or_constraint(identifier) {
            Ok(range) => range.includes(&self.runtime),
            Err(e) => {
                log::debug!("[DependencyChecker] {}", e);
                false
            }
        }
    }
}

/// A parsed entry of a manifest's `dependencies` list.
///
/// `plugin:<id>` and a bare `<id>` name another plugin, `package:<name>` an
/// installed package, and `runtime:<requirement>` the core version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DependencySpec {
    Plugin(String),
    Package(String),
    Runtime(String),
}

impl DependencySpec {
    pub fn parse(input: &str) -> Result<Self, DependencyError> {
        let input = input.trim();
        let spec = match input.split_once(':') {
            Some(("plugin", target)) => DependencySpec::Plugin(target.trim().to_string()),
            Some(("package", target)) => DependencySpec::Package(target.trim().to_string()),
            Some(("runtime", target)) => DependencySpec::Runtime(target.trim().to_string()),
            Some((kind, _)) => {
                return Err(DependencyError::UnknownKind {
                    dependency: input.to_string(),
                    kind: kind.to_string(),
                });
            }
            None => DependencySpec::Plugin(input.to_string()),
        };
        if spec.target().is_empty() {
            return Err(DependencyError::Empty(input.to_string()));
        }
        Ok(spec)
    }

    pub fn target(&self) -> &str {
        match self {
            DependencySpec::Plugin(t) | DependencySpec::Package(t) | DependencySpec::Runtime(t) => t,
        }
    }

    /// Internal dependencies may be satisfied later in the same load.
    pub fn is_internal(&self) -> bool {
        matches!(self, DependencySpec::Plugin(_))
    }
}

impl FromStr for DependencySpec {
    type Err = DependencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DependencySpec::parse(s)
    }
}

impl fmt::Display for DependencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencySpec::Plugin(t) => write!(f, "plugin:{}", t),
            DependencySpec::Package(t) => write!(f, "package:{}", t),
            DependencySpec::Runtime(t) => write!(f, "runtime:{}", t),
        }
    }
}

/// Error that can occur when reading dependency declarations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DependencyError {
    #[error("Empty dependency declaration '{0}'")]
    Empty(String),

    #[error("Unknown dependency kind '{kind}' in '{dependency}'")]
    UnknownKind { dependency: String, kind: String },
}

/// Dependencies left unmet by one check, split by whether a later admission
/// could still satisfy them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnmetDependencies {
    pub internal: Vec<DependencySpec>,
    pub external: Vec<DependencySpec>,
}

impl UnmetDependencies {
    pub fn is_empty(&self) -> bool {
        self.internal.is_empty() && self.external.is_empty()
    }

    pub fn all(&self) -> Vec<String> {
        self.external
            .iter()
            .chain(self.internal.iter())
            .map(ToString::to_string)
            .collect()
    }
}

/// The external checkers, configured once per loader.
#[derive(Debug, Clone)]
pub struct DependencyCheckers {
    pub packages: PackageChecker,
    pub runtime: RuntimeVersionChecker,
}

impl DependencyCheckers {
    pub fn new(packages: PackageChecker, runtime: RuntimeVersionChecker) -> Self {
        Self { packages, runtime }
    }

    /// Run every declared dependency through its checker.
    pub fn unmet(&self, specs: &[DependencySpec], admitted: &HashSet<String>) -> UnmetDependencies {
        let internal = InternalPluginChecker::new(admitted);
        let mut unmet = UnmetDependencies::default();
        for spec in specs {
            let checker: &dyn DependencyChecker = match spec {
                DependencySpec::Plugin(_) => &internal,
                DependencySpec::Package(_) => &self.packages,
                DependencySpec::Runtime(_) => &self.runtime,
            };
            if checker.is_installed(spec.target()) {
                continue;
            }
            log::debug!("[DependencyChecker] {} check failed for '{}'", checker.name(), spec.target());
            if spec.is_internal() {
                unmet.internal.push(spec.clone());
            } else {
                unmet.external.push(spec.clone());
            }
        }
        unmet
    }
}
