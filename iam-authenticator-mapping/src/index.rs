//! Keyed lookup structures built once per configuration load.

use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};

use crate::arn::{is_account_id, CanonicalArn, ResourceType};
use crate::config::{MappingConfig, MappingRule, RoleMapping, UserMapping};
use crate::error::{ConfigError, ConfigResult};
use crate::template;

/// Immutable index over one configuration's mapping rules.
///
/// Role and user rules are keyed by canonical ARN; mapped accounts are kept as a
/// set of account IDs. The index is never mutated after [`MappingIndex::build`],
/// so it can be shared freely between concurrent resolutions.
#[derive(Debug, Clone, Default)]
pub struct MappingIndex {
    roles: HashMap<String, RoleMapping>,
    users: HashMap<String, UserMapping>,
    accounts: HashSet<String>,
}

impl MappingIndex {
    /// Validate `config` and build its index.
    ///
    /// Fails if a rule ARN does not parse, names the wrong kind of principal for
    /// its list, or collides with an earlier rule in the same list after
    /// canonicalization; or if a mapped account is not a 12-digit ID.
    pub fn build(config: &MappingConfig) -> ConfigResult<Self> {
        let roles = index_rules(&config.role_mappings, ResourceType::Role)?;
        let users = index_rules(&config.user_mappings, ResourceType::User)?;

        let mut accounts = HashSet::with_capacity(config.mapped_accounts.len());
        for account in &config.mapped_accounts {
            if !is_account_id(account) {
                return Err(ConfigError::InvalidAccountId(account.clone()));
            }
            if !accounts.insert(account.clone()) {
                warn!("Mapped account {} is listed more than once", account);
            }
        }

        info!(
            "Built mapping index: {} role mappings, {} user mappings, {} mapped accounts",
            roles.len(),
            users.len(),
            accounts.len()
        );

        Ok(Self {
            roles,
            users,
            accounts,
        })
    }

    pub fn lookup_role(&self, arn: &CanonicalArn) -> Option<&RoleMapping> {
        self.roles.get(arn.as_str())
    }

    pub fn lookup_user(&self, arn: &CanonicalArn) -> Option<&UserMapping> {
        self.users.get(arn.as_str())
    }

    pub fn is_mapped_account(&self, account_id: &str) -> bool {
        self.accounts.contains(account_id)
    }

    pub fn role_count(&self) -> usize {
        self.roles.len()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }
}

fn index_rules<R>(rules: &[R], expected: ResourceType) -> ConfigResult<HashMap<String, R>>
where
    R: MappingRule + Clone,
{
    let mut indexed: HashMap<String, R> = HashMap::with_capacity(rules.len());

    for rule in rules {
        let arn = CanonicalArn::parse(rule.arn()).map_err(|source| ConfigError::InvalidArn {
            resource_type: expected,
            arn: rule.arn().to_string(),
            source,
        })?;

        if arn.resource_type() != expected {
            return Err(ConfigError::WrongResourceType {
                arn: rule.arn().to_string(),
                expected,
                actual: arn.resource_type(),
            });
        }

        if let Some(existing) = indexed.get(arn.as_str()) {
            return Err(ConfigError::DuplicateArn {
                resource_type: expected,
                arn: arn.as_str().to_string(),
                first: existing.arn().to_string(),
                second: rule.arn().to_string(),
            });
        }

        warn_on_invalid_templates(rule, &arn);
        debug!("Indexed {} mapping {}", expected, arn);
        indexed.insert(arn.as_str().to_string(), rule.clone());
    }

    Ok(indexed)
}

/// Template errors surface at resolution time; flag them early in the logs.
fn warn_on_invalid_templates<R: MappingRule>(rule: &R, arn: &CanonicalArn) {
    let templates = std::iter::once(rule.username_template())
        .chain(rule.group_templates().iter().map(String::as_str));
    for t in templates {
        if let Err(e) = template::validate(t) {
            warn!(
                "Mapping for {} has template {:?} that will fail to expand: {}",
                arn, t, e
            );
        }
    }
}
