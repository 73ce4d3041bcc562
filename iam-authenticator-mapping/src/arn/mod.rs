//! AWS ARN parsing and canonicalization for IAM principals.

pub mod canonical;

use thiserror::Error;

pub use canonical::{CanonicalArn, ResourceType};

/// Reasons an ARN string cannot be canonicalized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArnError {
    #[error("ARN {0:?} does not have the six colon-delimited segments of arn:partition:service:region:account:resource")]
    MissingSegments(String),
    #[error("ARN {0:?} does not start with the 'arn' prefix")]
    NotAnArn(String),
    #[error("ARN {0:?} has an empty partition")]
    EmptyPartition(String),
    #[error("account segment {0:?} is not a 12-digit AWS account ID")]
    InvalidAccountId(String),
    #[error("resource {0:?} is not a role, user or assumed-role")]
    UnrecognizedResourceType(String),
    #[error("service {service:?} cannot own a {resource_type} resource")]
    UnsupportedService {
        service: String,
        resource_type: String,
    },
    #[error("resource {0:?} has an empty name")]
    EmptyResourceName(String),
    #[error("assumed-role resource {0:?} carries no session name")]
    MissingSessionName(String),
}

pub type ArnResult<T> = Result<T, ArnError>;

/// Returns true if `value` is exactly twelve ASCII digits.
pub(crate) fn is_account_id(value: &str) -> bool {
    value.len() == 12 && value.bytes().all(|b| b.is_ascii_digit())
}
