//! Canonical form of IAM principal ARNs.
//!
//! Role and user ARNs are reduced to `arn:<partition>:iam::<account>:<type>/<name>`:
//! partition and service tokens are lower-cased, the region is dropped and any IAM
//! path is removed from the resource. Resource names keep their case, since IAM
//! treats them as case-sensitive identifiers. STS `assumed-role` session ARNs are
//! canonicalized to the role they were assumed from.

use std::fmt;
use std::str::FromStr;

use super::{is_account_id, ArnError, ArnResult};

const ROLE: &str = "role";
const USER: &str = "user";
const ASSUMED_ROLE: &str = "assumed-role";

/// The kind of IAM principal a canonical ARN identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Role,
    User,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Role => ROLE,
            Self::User => USER,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed and normalized IAM principal ARN.
///
/// Two ARNs naming the same principal (differing only in partition/service case,
/// region or IAM path) produce the same [`CanonicalArn::as_str`] key. The input
/// string is kept in [`CanonicalArn::original`] for audit output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalArn {
    key: String,
    partition: String,
    account_id: String,
    resource_type: ResourceType,
    name: String,
    path: String,
    session_name: Option<String>,
    original: String,
}

impl CanonicalArn {
    /// Parse and canonicalize `arn`.
    ///
    /// Accepts `arn:<partition>:iam:<region>:<account>:role/[<path>/]<name>`,
    /// the equivalent `user/...` form, and
    /// `arn:<partition>:sts:<region>:<account>:assumed-role/<role>/<session>`.
    pub fn parse(arn: &str) -> ArnResult<Self> {
        let segments: Vec<&str> = arn.splitn(6, ':').collect();
        let &[prefix, partition, service, _region, account_id, resource] = segments.as_slice()
        else {
            return Err(ArnError::MissingSegments(arn.to_string()));
        };

        if prefix != "arn" {
            return Err(ArnError::NotAnArn(arn.to_string()));
        }
        if partition.is_empty() {
            return Err(ArnError::EmptyPartition(arn.to_string()));
        }
        if !is_account_id(account_id) {
            return Err(ArnError::InvalidAccountId(account_id.to_string()));
        }

        let (type_token, rest) = resource
            .split_once('/')
            .ok_or_else(|| ArnError::UnrecognizedResourceType(resource.to_string()))?;
        let service = service.to_ascii_lowercase();

        let (resource_type, path, name, session_name) = match type_token {
            ROLE | USER => {
                require_service(&service, "iam", type_token)?;
                let (path, name) = split_path(rest);
                let resource_type = if type_token == ROLE {
                    ResourceType::Role
                } else {
                    ResourceType::User
                };
                (resource_type, path, name, None)
            }
            ASSUMED_ROLE => {
                require_service(&service, "sts", type_token)?;
                let (role, session) = rest
                    .split_once('/')
                    .ok_or_else(|| ArnError::MissingSessionName(resource.to_string()))?;
                if session.is_empty() {
                    return Err(ArnError::MissingSessionName(resource.to_string()));
                }
                (ResourceType::Role, "/".to_string(), role, Some(session.to_string()))
            }
            _ => return Err(ArnError::UnrecognizedResourceType(resource.to_string())),
        };

        if name.is_empty() {
            return Err(ArnError::EmptyResourceName(resource.to_string()));
        }

        let partition = partition.to_ascii_lowercase();
        let key = format!("arn:{partition}:iam::{account_id}:{resource_type}/{name}");

        Ok(Self {
            key,
            partition,
            account_id: account_id.to_string(),
            resource_type,
            name: name.to_string(),
            path,
            session_name,
            original: arn.to_string(),
        })
    }

    /// The canonical ARN string, used as the lookup key.
    pub fn as_str(&self) -> &str {
        &self.key
    }

    pub fn partition(&self) -> &str {
        &self.partition
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// The role or user name, without any IAM path.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The IAM path the principal was created under, `/` when none was given.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Session name embedded in an `assumed-role` ARN.
    pub fn session_name(&self) -> Option<&str> {
        self.session_name.as_deref()
    }

    /// The ARN exactly as it was supplied.
    pub fn original(&self) -> &str {
        &self.original
    }
}

impl fmt::Display for CanonicalArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl FromStr for CanonicalArn {
    type Err = ArnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn require_service(service: &str, expected: &str, type_token: &str) -> ArnResult<()> {
    if service == expected {
        Ok(())
    } else {
        Err(ArnError::UnsupportedService {
            service: service.to_string(),
            resource_type: type_token.to_string(),
        })
    }
}

/// Split `path/to/Name` into (`/path/to/`, `Name`).
fn split_path(rest: &str) -> (String, &str) {
    match rest.rsplit_once('/') {
        Some((path, name)) => (format!("/{path}/"), name),
        None => ("/".to_string(), rest),
    }
}
