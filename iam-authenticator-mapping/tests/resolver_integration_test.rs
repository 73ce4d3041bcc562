//! End-to-end resolution scenarios against the public API.

use std::sync::Arc;
use std::thread;

use iam_authenticator_mapping::{
    AuthenticatedPrincipal, Config, ConfigError, DenialReason, MappingConfig, ResolvedIdentity,
    Resolver, RoleMapping,
};

const CONFIG: &str = r#"{
    "clusterID": "integration",
    "mapRoles": [
        {
            "rolearn": "arn:aws:iam::111111111111:role/Admin",
            "username": "admin:{{SessionName}}",
            "groups": ["system:masters"]
        },
        {
            "rolearn": "arn:aws:iam::111111111111:role/nodes/NodeInstanceRole",
            "username": "system:node:{{SessionName}}",
            "groups": ["system:bootstrappers", "system:nodes"]
        }
    ],
    "mapUsers": [
        {
            "userarn": "arn:aws:iam::111111111111:user/ci",
            "username": "ci-{{AccountID}}",
            "groups": ["deployers"]
        }
    ],
    "mapAccounts": ["222222222222"]
}"#;

fn resolver() -> Resolver {
    let config = Config::from_json_str(CONFIG).expect("config should parse");
    Resolver::from_config(config.mapping()).expect("index should build")
}

fn principal(arn: &str, account: &str, session: &str) -> AuthenticatedPrincipal {
    AuthenticatedPrincipal::new(arn, account, session, "AROAEXAMPLE")
}

#[test]
fn test_role_rule_scenario() {
    let identity = resolver()
        .resolve(&principal(
            "arn:aws:iam::111111111111:role/Admin",
            "111111111111",
            "i-0abc",
        ))
        .expect("should be allowed");
    assert_eq!(identity.username, "admin:i-0abc");
    assert_eq!(identity.groups, vec!["system:masters"]);
}

#[test]
fn test_node_role_via_sts_session_arn() {
    let identity = resolver()
        .resolve(&principal(
            "arn:aws:sts::111111111111:assumed-role/NodeInstanceRole/i-0123456789abcdef0",
            "111111111111",
            "i-0123456789abcdef0",
        ))
        .expect("should be allowed");
    assert_eq!(identity.username, "system:node:i-0123456789abcdef0");
    assert_eq!(
        identity.groups,
        vec!["system:bootstrappers", "system:nodes"]
    );
    assert_eq!(
        identity.canonical_arn,
        "arn:aws:iam::111111111111:role/NodeInstanceRole"
    );
}

#[test]
fn test_user_rule_scenario() {
    let identity = resolver()
        .resolve(&principal(
            "arn:aws:iam::111111111111:user/ci",
            "111111111111",
            "",
        ))
        .expect("should be allowed");
    assert_eq!(identity.username, "ci-111111111111");
}

#[test]
fn test_mapped_account_scenario() {
    let identity = resolver()
        .resolve(&principal(
            "arn:aws:iam::222222222222:user/bob",
            "222222222222",
            "",
        ))
        .expect("mapped account should be allowed");
    assert_eq!(identity.username, "arn:aws:iam::222222222222:user/bob");
    assert!(identity.groups.is_empty());
}

#[test]
fn test_malformed_identity_scenario() {
    let denied = resolver()
        .resolve(&principal("arn:aws:iam::role/Admin", "111111111111", "s"))
        .expect_err("should be denied");
    assert_eq!(denied.reason, DenialReason::MalformedIdentity);
}

#[test]
fn test_no_matching_mapping_scenario() {
    let denied = resolver()
        .resolve(&principal(
            "arn:aws:iam::333333333333:role/Admin",
            "333333333333",
            "s",
        ))
        .expect_err("should be denied");
    assert_eq!(denied.reason, DenialReason::NoMatchingMapping);
}

#[test]
fn test_resolution_is_deterministic() {
    let resolver = resolver();
    let p = principal(
        "arn:aws:iam::111111111111:role/Admin",
        "111111111111",
        "sess",
    );
    let first = resolver.resolve(&p).expect("allowed");
    for _ in 0..10 {
        assert_eq!(resolver.resolve(&p).expect("allowed"), first);
    }
}

#[test]
fn test_failed_reload_keeps_previous_index() {
    let resolver = resolver();
    let mut bad: MappingConfig = Config::from_json_str(CONFIG)
        .expect("config should parse")
        .mapping;
    bad.role_mappings.push(RoleMapping {
        role_arn: "arn:aws:iam::111111111111:role/other-path/Admin".to_string(),
        username: "shadow".to_string(),
        groups: vec![],
    });

    let err = resolver.reload(&bad).expect_err("duplicate should be rejected");
    assert!(matches!(err, ConfigError::DuplicateArn { .. }));

    let identity = resolver
        .resolve(&principal(
            "arn:aws:iam::111111111111:role/Admin",
            "111111111111",
            "still-old",
        ))
        .expect("old index still active");
    assert_eq!(identity.username, "admin:still-old");
}

#[test]
fn test_concurrent_resolution_during_reload() {
    let resolver = Arc::new(resolver());
    let replacement = MappingConfig {
        role_mappings: vec![RoleMapping {
            role_arn: "arn:aws:iam::111111111111:role/Admin".to_string(),
            username: "new-admin:{{SessionName}}".to_string(),
            groups: vec!["new".to_string()],
        }],
        ..MappingConfig::default()
    };

    thread::scope(|scope| {
        for _ in 0..4 {
            let resolver = Arc::clone(&resolver);
            scope.spawn(move || {
                let p = principal(
                    "arn:aws:iam::111111111111:role/Admin",
                    "111111111111",
                    "s",
                );
                for _ in 0..200 {
                    let identity: ResolvedIdentity = resolver.resolve(&p).expect("always allowed");
                    // a resolution sees one whole index: username and groups agree
                    match identity.username.as_str() {
                        "admin:s" => assert_eq!(identity.groups, vec!["system:masters"]),
                        "new-admin:s" => assert_eq!(identity.groups, vec!["new"]),
                        other => panic!("unexpected username {other}"),
                    }
                }
            });
        }
        scope.spawn(|| {
            for _ in 0..50 {
                resolver.reload(&replacement).expect("reload should succeed");
            }
        });
    });

    assert_eq!(resolver.snapshot().role_count(), 1);
    assert_eq!(resolver.snapshot().account_count(), 0);
}
