//! Authenticator configuration: mapping rules and the surrounding server settings.
//!
//! The JSON keys follow the authenticator's established configuration format
//! (`clusterID`, `mapRoles`, `rolearn`, ...).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Default localhost port the authentication webhook listens on.
pub const DEFAULT_LOCALHOST_PORT: u16 = 21362;

/// Maps an IAM role ARN to a Kubernetes username and group templates.
///
/// Templates may use `{{AccountID}}` and `{{SessionName}}`. The session name's
/// meaning depends on who assumed the role: the instance ID for an EC2 instance
/// role, the federated identity for a federated role, or a caller-chosen value
/// for a plain `sts:AssumeRole`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMapping {
    #[serde(rename = "rolearn")]
    pub role_arn: String,
    pub username: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

/// Maps a single IAM user ARN to a Kubernetes username and group templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMapping {
    #[serde(rename = "userarn")]
    pub user_arn: String,
    pub username: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

/// Common view over role and user mapping rules.
pub trait MappingRule {
    fn arn(&self) -> &str;
    fn username_template(&self) -> &str;
    fn group_templates(&self) -> &[String];
}

impl MappingRule for RoleMapping {
    fn arn(&self) -> &str {
        &self.role_arn
    }

    fn username_template(&self) -> &str {
        &self.username
    }

    fn group_templates(&self) -> &[String] {
        &self.groups
    }
}

impl MappingRule for UserMapping {
    fn arn(&self) -> &str {
        &self.user_arn
    }

    fn username_template(&self) -> &str {
        &self.username
    }

    fn group_templates(&self) -> &[String] {
        &self.groups
    }
}

/// The mapping rules the identity index is built from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingConfig {
    /// Ordered role mappings.
    #[serde(default, rename = "mapRoles")]
    pub role_mappings: Vec<RoleMapping>,
    /// Ordered user mappings.
    #[serde(default, rename = "mapUsers")]
    pub user_mappings: Vec<UserMapping>,
    /// Accounts whose principals are admitted without an explicit mapping.
    #[serde(default, rename = "mapAccounts")]
    pub mapped_accounts: Vec<String>,
}

/// Full authenticator configuration.
///
/// Only [`Config::mapping`] is consumed by the resolution engine; the remaining
/// fields belong to the webhook server and are carried as plain data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Unique-per-cluster identifier for this authenticator installation.
    #[serde(rename = "clusterID")]
    pub cluster_id: String,
    #[serde(default = "default_localhost_port")]
    pub localhost_port: u16,
    #[serde(default)]
    pub generate_kubeconfig_path: Option<PathBuf>,
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
    #[serde(flatten)]
    pub mapping: MappingConfig,
}

fn default_localhost_port() -> u16 {
    DEFAULT_LOCALHOST_PORT
}

impl Config {
    /// Parse a configuration from its JSON form.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded configuration from {}", path.display());
        Self::from_json_str(&contents)
    }

    pub fn mapping(&self) -> &MappingConfig {
        &self.mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "clusterID": "prod.example.com",
        "stateDir": "/var/aws-iam-authenticator",
        "mapRoles": [
            {
                "rolearn": "arn:aws:iam::111111111111:role/Admin",
                "username": "admin:{{SessionName}}",
                "groups": ["system:masters"]
            },
            {
                "rolearn": "arn:aws:iam::111111111111:role/Viewer",
                "username": "viewer"
            }
        ],
        "mapUsers": [
            {
                "userarn": "arn:aws:iam::111111111111:user/alice",
                "username": "alice",
                "groups": ["developers"]
            }
        ],
        "mapAccounts": ["222222222222"]
    }"#;

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_json_str(SAMPLE).unwrap();
        assert_eq!(config.cluster_id, "prod.example.com");
        assert_eq!(config.localhost_port, DEFAULT_LOCALHOST_PORT);
        assert_eq!(
            config.state_dir,
            Some(PathBuf::from("/var/aws-iam-authenticator"))
        );
        assert_eq!(config.generate_kubeconfig_path, None);

        let mapping = config.mapping();
        assert_eq!(mapping.role_mappings.len(), 2);
        assert_eq!(mapping.role_mappings[0].groups, vec!["system:masters"]);
        assert!(mapping.role_mappings[1].groups.is_empty());
        assert_eq!(mapping.user_mappings[0].user_arn, "arn:aws:iam::111111111111:user/alice");
        assert_eq!(mapping.mapped_accounts, vec!["222222222222"]);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = Config::from_json_str(r#"{"clusterID": "c1", "localhostPort": 8080}"#).unwrap();
        assert_eq!(config.localhost_port, 8080);
        assert_eq!(config.mapping, MappingConfig::default());
    }

    #[test]
    fn test_parse_error() {
        let result = Config::from_json_str(r#"{"mapRoles": []}"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.mapping.user_mappings.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(dir.path().join("missing.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_mapping_rule_views() {
        let role = RoleMapping {
            role_arn: "arn:aws:iam::111111111111:role/Admin".to_string(),
            username: "admin".to_string(),
            groups: vec!["g".to_string()],
        };
        assert_eq!(role.arn(), "arn:aws:iam::111111111111:role/Admin");
        assert_eq!(role.username_template(), "admin");
        assert_eq!(role.group_templates(), ["g".to_string()]);
    }
}
