//! This crate provides the identity-mapping engine of the AWS IAM authenticator
//! for Kubernetes:
//! - ARN canonicalization for IAM roles, users and assumed-role sessions
//! - Username/group template expansion (`{{AccountID}}`, `{{SessionName}}`)
//! - A keyed mapping index built once per configuration load
//! - Resolution of authenticated principals to Kubernetes identities, with
//!   atomically swappable configuration
//!

pub mod arn;
pub mod config;
mod error;
mod index;
mod resolver;
pub mod template;
mod types;

// Re-exports for a small, focused public API
pub use arn::{ArnError, CanonicalArn, ResourceType};
pub use config::{Config, MappingConfig, MappingRule, RoleMapping, UserMapping};
pub use error::{AccessDenied, ConfigError, ConfigResult, DenialReason};
pub use index::MappingIndex;
pub use resolver::{resolve, ResolveResult, Resolver};
pub use template::{TemplateError, TemplateVars};
pub use types::{AuthenticatedPrincipal, ResolvedIdentity};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolving_sample_principal() {
        let config = Config::from_json_str(
            r#"{
                "clusterID": "test",
                "mapRoles": [{
                    "rolearn": "arn:aws:iam::111111111111:role/Admin",
                    "username": "admin:{{SessionName}}",
                    "groups": ["system:masters"]
                }]
            }"#,
        )
        .expect("should parse");
        let resolver = Resolver::from_config(config.mapping()).expect("should build");

        let identity = resolver
            .resolve(&AuthenticatedPrincipal::new(
                "arn:aws:iam::111111111111:role/Admin",
                "111111111111",
                "i-0abc",
                "AROAEXAMPLE",
            ))
            .expect("should resolve");
        assert_eq!(identity.username, "admin:i-0abc");
        assert_eq!(identity.groups, vec!["system:masters"]);
    }
}
