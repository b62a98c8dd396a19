use std::fmt;
use std::str::FromStr;

use semver::{Version, VersionReq};
use thiserror::Error;

/// Error type for version parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("Invalid version '{input}': {message}")]
    InvalidVersion { input: String, message: String },
    #[error("Invalid version constraint '{input}': {message}")]
    InvalidConstraint { input: String, message: String },
}

/// Parse a version, accepting the `1` and `1.2` shorthands as `1.0.0` and `1.2.0`.
pub fn parse_version(input: &str) -> Result<Version, VersionError> {
    let trimmed = input.trim().trim_start_matches('v');
    let padded = match trimmed.split('.').count() {
        1 => format!("{}.0.0", trimmed),
        2 => format!("{}.0", trimmed),
        _ => trimmed.to_string(),
    };
    Version::parse(&padded).map_err(|e| VersionError::InvalidVersion {
        input: input.to_string(),
        message: e.to_string(),
    })
}

/// Represents a version requirement range using semver constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    /// The constraint as written (e.g., "^1.2.3", ">=2.0", "0.2.0")
    constraint: String,
    /// The parsed semver requirement
    req: VersionReq,
}

impl VersionRange {
    /// Creates a new version range from a semver constraint string.
    pub fn from_constraint(constraint: &str) -> Result<Self, VersionError> {
        let req = VersionReq::parse(constraint).map_err(|e| VersionError::InvalidConstraint {
            input: constraint.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            constraint: constraint.to_string(),
            req,
        })
    }

    /// Like [`from_constraint`](Self::from_constraint), except that a bare
    /// version is a minimum: `0.2.0` means `>=0.2.0`, not `^0.2.0`.
    pub fn minimum_or_constraint(input: &str) -> Result<Self, VersionError> {
        let trimmed = input.trim();
        let starts_with_digit = trimmed.chars().next().is_some_and(|c| c.is_ascii_digit());
        if starts_with_digit && !trimmed.contains(',') {
            let min = parse_version(trimmed)?;
            let req = VersionReq::parse(&format!(">={}", min)).map_err(|e| VersionError::InvalidConstraint {
                input: input.to_string(),
                message: e.to_string(),
            })?;
            return Ok(Self {
                constraint: input.to_string(),
                req,
            });
        }
        Self::from_constraint(trimmed)
    }

    /// Checks if a specific `semver::Version` satisfies this range.
    pub fn includes(&self, version: &Version) -> bool {
        self.req.matches(version)
    }

    /// Returns a reference to the underlying `semver::VersionReq`.
    pub fn semver_req(&self) -> &VersionReq {
        &self.req
    }

    /// Returns the constraint as written.
    pub fn constraint_string(&self) -> &str {
        &self.constraint
    }
}

/// Display shows the constraint as written.
impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.constraint)
    }
}

impl FromStr for VersionRange {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VersionRange::minimum_or_constraint(s)
    }
}
