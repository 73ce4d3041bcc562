//! Username and group template expansion.
//!
//! Templates may contain two placeholders, `{{AccountID}}` and `{{SessionName}}`.
//! Expansion is a single textual pass: substituted values are never scanned for
//! further placeholders, so an account ID or session name cannot inject one.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Placeholder name for the 12-digit AWS account ID.
pub const ACCOUNT_ID: &str = "AccountID";
/// Placeholder name for the role session name.
pub const SESSION_NAME: &str = "SessionName";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]*)\}\}").expect("placeholder pattern is valid"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown template variable {0:?}; only {{{{AccountID}}}} and {{{{SessionName}}}} are supported")]
    UnknownVariable(String),
    #[error("template references {{{{SessionName}}}} but the principal has no session name")]
    MissingSessionName,
}

pub type TemplateResult<T> = Result<T, TemplateError>;

/// Values available to a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateVars<'a> {
    pub account_id: &'a str,
    pub session_name: Option<&'a str>,
}

impl<'a> TemplateVars<'a> {
    /// Variables for an assumed-role principal. An empty session name counts as absent.
    pub fn for_role(account_id: &'a str, session_name: Option<&'a str>) -> Self {
        Self {
            account_id,
            session_name: session_name.filter(|s| !s.is_empty()),
        }
    }

    /// Variables for an IAM user principal, which never has a session name.
    pub fn for_user(account_id: &'a str) -> Self {
        Self {
            account_id,
            session_name: None,
        }
    }

    fn lookup(&self, variable: Variable) -> TemplateResult<&'a str> {
        match variable {
            Variable::AccountId => Ok(self.account_id),
            Variable::SessionName => self.session_name.ok_or(TemplateError::MissingSessionName),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variable {
    AccountId,
    SessionName,
}

impl Variable {
    fn from_name(name: &str) -> TemplateResult<Self> {
        match name {
            ACCOUNT_ID => Ok(Self::AccountId),
            SESSION_NAME => Ok(Self::SessionName),
            other => Err(TemplateError::UnknownVariable(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'t> {
    Literal(&'t str),
    Variable(Variable),
}

/// Split a template into literal text and recognized placeholders.
///
/// A `{{` that does not open a well-formed placeholder is rejected rather than
/// passed through as text.
fn segments(template: &str) -> TemplateResult<Vec<Segment<'_>>> {
    let mut out = Vec::new();
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(template) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        push_literal(&mut out, &template[last..whole.start()])?;
        let name = caps.get(1).map_or("", |m| m.as_str());
        out.push(Segment::Variable(Variable::from_name(name)?));
        last = whole.end();
    }
    push_literal(&mut out, &template[last..])?;

    Ok(out)
}

fn push_literal<'t>(out: &mut Vec<Segment<'t>>, text: &'t str) -> TemplateResult<()> {
    if let Some(pos) = text.find("{{") {
        return Err(TemplateError::UnknownVariable(text[pos..].to_string()));
    }
    if !text.is_empty() {
        out.push(Segment::Literal(text));
    }
    Ok(())
}

/// Expand `template` against `vars`.
pub fn expand(template: &str, vars: &TemplateVars<'_>) -> TemplateResult<String> {
    let mut expanded = String::with_capacity(template.len());
    for segment in segments(template)? {
        match segment {
            Segment::Literal(text) => expanded.push_str(text),
            Segment::Variable(variable) => expanded.push_str(vars.lookup(variable)?),
        }
    }
    Ok(expanded)
}

/// Expand each template in order. Duplicate results are kept.
pub fn expand_all(templates: &[String], vars: &TemplateVars<'_>) -> TemplateResult<Vec<String>> {
    templates.iter().map(|t| expand(t, vars)).collect()
}

/// Check that `template` only references known placeholders.
///
/// Session-name availability is not checked; that depends on the principal.
pub fn validate(template: &str) -> TemplateResult<()> {
    segments(template).map(|_| ())
}
