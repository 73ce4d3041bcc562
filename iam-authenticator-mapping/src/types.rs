//! Request and response shapes exchanged with the surrounding webhook.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Prefix of the Kubernetes UID assigned to resolved identities.
pub const UID_PREFIX: &str = "aws-iam-authenticator";

/// An AWS principal whose credentials have already been verified upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedPrincipal {
    pub arn: String,
    #[serde(rename = "accountID")]
    pub account_id: String,
    /// Empty for IAM users.
    #[serde(default)]
    pub session_name: String,
    #[serde(rename = "userID", default)]
    pub user_id: String,
}

impl AuthenticatedPrincipal {
    pub fn new(
        arn: impl Into<String>,
        account_id: impl Into<String>,
        session_name: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            arn: arn.into(),
            account_id: account_id.into(),
            session_name: session_name.into(),
            user_id: user_id.into(),
        }
    }

    /// The session name, or `None` when empty.
    pub fn session_name(&self) -> Option<&str> {
        Some(self.session_name.as_str()).filter(|s| !s.is_empty())
    }
}

/// The Kubernetes identity a principal is admitted as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedIdentity {
    pub username: String,
    /// Distinct group names in first-seen order.
    pub groups: Vec<String>,
    pub uid: String,
    /// Canonical ARN the decision was made on.
    pub canonical_arn: String,
}

impl ResolvedIdentity {
    /// Build an identity, dropping repeated group names while keeping order.
    pub fn new(
        username: String,
        groups: Vec<String>,
        principal: &AuthenticatedPrincipal,
        canonical_arn: &str,
    ) -> Self {
        let mut seen = HashSet::new();
        let groups = groups
            .into_iter()
            .filter(|group| seen.insert(group.clone()))
            .collect();

        Self {
            username,
            groups,
            uid: format!(
                "{UID_PREFIX}:{}:{}",
                principal.account_id, principal.user_id
            ),
            canonical_arn: canonical_arn.to_string(),
        }
    }
}
