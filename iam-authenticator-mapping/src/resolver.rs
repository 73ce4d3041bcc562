//! Resolution of authenticated AWS principals to Kubernetes identities.
//!
//! Precedence, first match wins:
//!
//! 1. a principal ARN that does not canonicalize, or whose account differs from
//!    the principal's `accountID`, is denied (`MalformedIdentity`);
//! 2. role principals are looked up among the role mappings;
//! 3. user principals are looked up among the user mappings;
//! 4. principals of a mapped account get a default identity;
//! 5. everything else is denied (`NoMatchingMapping`).
//!
//! A template that fails to expand for a matched rule denies the request
//! (`TemplateExpansionFailed`); it never falls through to the account tier.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use log::{debug, info, warn};

use crate::arn::{CanonicalArn, ResourceType};
use crate::config::{MappingConfig, MappingRule};
use crate::error::{AccessDenied, ConfigResult, DenialReason};
use crate::index::MappingIndex;
use crate::template::{self, TemplateResult, TemplateVars};
use crate::types::{AuthenticatedPrincipal, ResolvedIdentity};

pub type ResolveResult = Result<ResolvedIdentity, AccessDenied>;

/// Resolves principals against the currently published [`MappingIndex`].
///
/// The index is replaced wholesale on [`Resolver::reload`]. Each call to
/// [`Resolver::resolve`] reads one snapshot, so it sees either the old or the
/// new configuration, never a mix.
pub struct Resolver {
    index: ArcSwap<MappingIndex>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(MappingIndex::default())
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("index", &*self.index.load())
            .finish()
    }
}

impl Resolver {
    pub fn new(index: MappingIndex) -> Self {
        Self {
            index: ArcSwap::from_pointee(index),
        }
    }

    pub fn from_config(config: &MappingConfig) -> ConfigResult<Self> {
        Ok(Self::new(MappingIndex::build(config)?))
    }

    /// Build an index from `config` and publish it.
    ///
    /// On error nothing is published and the previous index remains active.
    pub fn reload(&self, config: &MappingConfig) -> ConfigResult<()> {
        let next = MappingIndex::build(config)?;
        self.index.store(Arc::new(next));
        info!("Published new mapping index");
        Ok(())
    }

    /// The currently active index.
    pub fn snapshot(&self) -> Arc<MappingIndex> {
        self.index.load_full()
    }

    pub fn resolve(&self, principal: &AuthenticatedPrincipal) -> ResolveResult {
        let index = self.index.load();
        resolve(&index, principal)
    }
}

/// Resolve `principal` against `index`.
pub fn resolve(index: &MappingIndex, principal: &AuthenticatedPrincipal) -> ResolveResult {
    let arn = match CanonicalArn::parse(&principal.arn) {
        Ok(arn) => arn,
        Err(e) => {
            warn!("Denying malformed principal ARN {:?}: {}", principal.arn, e);
            return Err(DenialReason::MalformedIdentity.into());
        }
    };
    if principal.account_id != arn.account_id() {
        warn!(
            "Denying {}: principal account {:?} does not match the ARN account",
            arn, principal.account_id
        );
        return Err(DenialReason::MalformedIdentity.into());
    }

    let account_id = principal.account_id.as_str();
    // Every tier is consulted so the cost of a decision does not reveal which tier made it.
    let explicit: Option<(&dyn MappingRule, TemplateVars<'_>)> = match arn.resource_type() {
        ResourceType::Role => index.lookup_role(&arn).map(|rule| {
            let session_name = principal.session_name().or_else(|| arn.session_name());
            (rule as &dyn MappingRule, TemplateVars::for_role(account_id, session_name))
        }),
        ResourceType::User => index
            .lookup_user(&arn)
            .map(|rule| (rule as &dyn MappingRule, TemplateVars::for_user(account_id))),
    };
    let account_mapped = index.is_mapped_account(account_id);

    if let Some((rule, vars)) = explicit {
        return match expand_rule(rule, &vars) {
            Ok((username, groups)) => {
                debug!("Mapped {} to {} via {} mapping", arn, username, arn.resource_type());
                Ok(ResolvedIdentity::new(username, groups, principal, arn.as_str()))
            }
            Err(e) => {
                warn!("Denying {}: mapping templates failed to expand: {}", arn, e);
                Err(DenialReason::TemplateExpansionFailed.into())
            }
        };
    }

    if account_mapped {
        debug!("Mapped {} via mapped account {}", arn, account_id);
        return Ok(ResolvedIdentity::new(
            arn.as_str().to_string(),
            Vec::new(),
            principal,
            arn.as_str(),
        ));
    }

    warn!("Denying {}: no mapping matched", arn);
    Err(DenialReason::NoMatchingMapping.into())
}

fn expand_rule(
    rule: &dyn MappingRule,
    vars: &TemplateVars<'_>,
) -> TemplateResult<(String, Vec<String>)> {
    let username = template::expand(rule.username_template(), vars)?;
    let groups = template::expand_all(rule.group_templates(), vars)?;
    Ok((username, groups))
}
