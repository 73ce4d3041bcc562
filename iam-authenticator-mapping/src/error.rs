//! Error types for configuration loading and identity resolution.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::arn::{ArnError, ResourceType};

/// Errors raised while loading configuration or building a mapping index.
///
/// These never occur at request time. A reload that fails with one of them is
/// rejected as a whole and the previously active index stays in force.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("duplicate {resource_type} mapping for {arn}: {first:?} and {second:?} canonicalize to the same ARN")]
    DuplicateArn {
        resource_type: ResourceType,
        arn: String,
        first: String,
        second: String,
    },

    #[error("invalid ARN {arn:?} in {resource_type} mappings: {source}")]
    InvalidArn {
        resource_type: ResourceType,
        arn: String,
        #[source]
        source: ArnError,
    },

    #[error("{arn:?} is a {actual} ARN but is listed in the {expected} mappings")]
    WrongResourceType {
        arn: String,
        expected: ResourceType,
        actual: ResourceType,
    },

    #[error("mapped account {0:?} is not a 12-digit AWS account ID")]
    InvalidAccountId(String),

    #[error("failed to read configuration file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Why a principal was refused a Kubernetes identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DenialReason {
    /// The principal ARN could not be canonicalized.
    MalformedIdentity,
    /// A matching rule's templates could not be expanded for this principal.
    TemplateExpansionFailed,
    /// No rule and no mapped account admits the principal.
    NoMatchingMapping,
}

impl DenialReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MalformedIdentity => "MalformedIdentity",
            Self::TemplateExpansionFailed => "TemplateExpansionFailed",
            Self::NoMatchingMapping => "NoMatchingMapping",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The engine's "no" outcome. Always carries a reason code.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[error("access denied: {reason}")]
pub struct AccessDenied {
    pub reason: DenialReason,
}

impl AccessDenied {
    pub fn new(reason: DenialReason) -> Self {
        Self { reason }
    }
}

impl From<DenialReason> for AccessDenied {
    fn from(reason: DenialReason) -> Self {
        Self::new(reason)
    }
}
