//! Cluster versions and the compatibility gate run before mutating calls

pub mod gate;

pub use gate::{check, FieldSet, GateOutcome, ValidationMode, VersionedResource};

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Version the resource descriptors were written against
pub const BUILD_VERSION: ClusterVersion = ClusterVersion::new(5, 2, 0);

/// Oldest cluster the provider is expected to work with
pub const MIN_VERSION: ClusterVersion = ClusterVersion::new(5, 0, 0);

#[derive(Debug, Error, PartialEq)]
pub enum VersionError {
    #[error("Cluster reported wrong version: {0}, which does not have Major.Minor.Patch version format")]
    Malformed(String),
}

/// Major.minor.patch core of a cluster version. Builds since 5.3 report
/// extra components (`5.3.0.12.4`); only the first three are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClusterVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl ClusterVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub fn parse(raw: &str) -> Result<Self, VersionError> {
        let malformed = || VersionError::Malformed(raw.to_string());
        let mut parts = raw.trim().splitn(4, '.');

        let mut next = || -> Result<u64, VersionError> {
            let part = parts.next().ok_or_else(malformed)?;
            // Tolerate suffixes such as "0-sp3" on the last kept component
            let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().map_err(|_| malformed())
        };

        Ok(Self::new(next()?, next()?, next()?))
    }

    pub fn relation_to_build(&self) -> VersionRelation {
        match self.cmp(&BUILD_VERSION) {
            std::cmp::Ordering::Equal => VersionRelation::Equal,
            std::cmp::Ordering::Less => VersionRelation::ClusterLower,
            std::cmp::Ordering::Greater => VersionRelation::ClusterGreater,
        }
    }

    pub fn is_below_minimum(&self) -> bool {
        *self < MIN_VERSION
    }
}

impl FromStr for ClusterVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ClusterVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionRelation {
    Equal,
    ClusterLower,
    ClusterGreater,
}

/// Warning to surface once the cluster version is known, None when it matches the build
pub fn compatibility_warning(cluster: &ClusterVersion) -> Option<String> {
    if cluster.is_below_minimum() {
        return Some(format!(
            "Cluster version is lower than the minimum provider version ({}<{}), strict version validation is not supported",
            cluster, MIN_VERSION
        ));
    }

    match cluster.relation_to_build() {
        VersionRelation::Equal => None,
        VersionRelation::ClusterGreater => Some(format!(
            "Cluster version is greater than the provider build version ({}>{}), please consider upgrading",
            cluster, BUILD_VERSION
        )),
        VersionRelation::ClusterLower => Some(format!(
            "Cluster version is lower than the provider build version ({}<{}), resource creation or update might fail",
            cluster, BUILD_VERSION
        )),
    }
}

/// Logs the compatibility warning, if any
pub fn warn_on_mismatch(cluster: &ClusterVersion) {
    match compatibility_warning(cluster) {
        Some(warning) => tracing::warn!("{}", warning),
        None => tracing::debug!("Cluster version {} matches build version", cluster),
    }
}
