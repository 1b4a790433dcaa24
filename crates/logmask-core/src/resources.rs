//! Typed resource descriptors
//!
//! Plain data only. Resources point at each other through [`ResourceRef`]
//! (the template-local logical ID); nothing here knows how a provisioning
//! engine renders or applies them.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Logical ID of a resource within one graph
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ResourceRef(String);

impl ResourceRef {
    pub fn new(logical_id: impl Into<String>) -> Self {
        Self(logical_id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A value that is either known now or resolved by the engine at deploy time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ValueRef {
    Literal(String),
    /// The resource's primary identifier (its name for most resource types)
    Ref(ResourceRef),
    /// A named attribute of the resource, e.g. `Arn`
    GetAtt(ResourceRef, String),
}

impl ValueRef {
    /// Resource this value depends on, if any
    pub fn target(&self) -> Option<&ResourceRef> {
        match self {
            Self::Literal(_) => None,
            Self::Ref(target) | Self::GetAtt(target, _) => Some(target),
        }
    }
}

/// Sensitive data class audited and masked by a data protection policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataIdentifier {
    EmailAddress,
    IpAddress,
    Custom { name: String, regex: String },
}

impl DataIdentifier {
    pub fn custom(name: impl Into<String>, regex: impl Into<String>) -> Self {
        Self::Custom {
            name: name.into(),
            regex: regex.into(),
        }
    }

    /// Name used inside the policy document
    pub fn name(&self) -> &str {
        match self {
            Self::EmailAddress => "EmailAddress",
            Self::IpAddress => "IpAddress",
            Self::Custom { name, .. } => name,
        }
    }

    /// Managed identifiers are referenced by ARN, custom ones by name
    pub fn is_managed(&self) -> bool {
        !matches!(self, Self::Custom { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataProtectionPolicy {
    pub name: String,
    pub description: String,
    pub identifiers: Vec<DataIdentifier>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    Destroy,
    Retain,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogGroup {
    pub logical_id: ResourceRef,
    pub name: String,
    pub data_protection: DataProtectionPolicy,
    pub removal_policy: RemovalPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Allow => "Allow",
            Effect::Deny => "Deny",
        }
    }
}

/// One statement of an identity policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyStatement {
    pub effect: Effect,
    pub actions: Vec<String>,
    pub resources: Vec<String>,
}

impl PolicyStatement {
    pub fn new<A, R>(effect: Effect, actions: A, resources: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            effect,
            actions: actions.into_iter().map(Into::into).collect(),
            resources: resources.into_iter().map(Into::into).collect(),
        }
    }

    /// True when both statements cover the same actions over the same resources
    pub fn same_scope(&self, other: &PolicyStatement) -> bool {
        self.actions == other.actions && self.resources == other.resources
    }
}

/// Named policy attached to exactly one role or user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlinePolicy {
    pub logical_id: ResourceRef,
    pub policy_name: String,
    pub statements: Vec<PolicyStatement>,
}

/// AWS managed policy, referenced by its path-qualified name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ManagedPolicy(String);

impl ManagedPolicy {
    pub fn aws(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionRole {
    pub logical_id: ResourceRef,
    /// Service principal allowed to assume the role
    pub assumed_by: String,
    pub managed_policies: Vec<ManagedPolicy>,
    pub default_policy: InlinePolicy,
}

/// Where the function's deployment package lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CodeLocation {
    /// Bucket and key supplied as template parameters at deploy time
    Parameters,
    S3 { bucket: String, key: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComputeFunction {
    pub logical_id: ResourceRef,
    pub code: CodeLocation,
    pub handler: String,
    pub runtime: String,
    pub role: ResourceRef,
    pub timeout: Duration,
    pub log_group: Option<ResourceRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Schedule {
    Rate(Duration),
}

impl Schedule {
    /// Schedule expression, e.g. `rate(1 minute)`.
    ///
    /// Returns `None` when the rate is zero or not a whole number of minutes.
    pub fn expression(&self) -> Option<String> {
        let Schedule::Rate(interval) = self;
        let secs = interval.as_secs();
        if secs == 0 || interval.subsec_nanos() != 0 || secs % 60 != 0 {
            return None;
        }

        let (value, unit) = if secs % 86_400 == 0 {
            (secs / 86_400, "day")
        } else if secs % 3_600 == 0 {
            (secs / 3_600, "hour")
        } else {
            (secs / 60, "minute")
        };
        let plural = if value == 1 { "" } else { "s" };
        Some(format!("rate({} {}{})", value, unit, plural))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleRule {
    pub logical_id: ResourceRef,
    pub schedule: Schedule,
    pub targets: Vec<ResourceRef>,
}

/// Console password for an IAM user
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Credential {
    /// Embedded verbatim in the rendered template. Demo use only.
    PlainText(#[serde(serialize_with = "redacted")] String),
    /// Resolved from Secrets Manager when the stack deploys
    SecretRef {
        secret_id: String,
        json_key: Option<String>,
    },
}

impl Credential {
    /// True when the credential cannot yield a usable password: a blank
    /// plaintext value, a blank secret id, or a `json_key` that is set but blank.
    pub fn is_empty(&self) -> bool {
        match self {
            Credential::PlainText(value) => value.trim().is_empty(),
            Credential::SecretRef {
                secret_id,
                json_key,
            } => {
                secret_id.trim().is_empty()
                    || matches!(json_key.as_deref(), Some(key) if key.trim().is_empty())
            }
        }
    }
}

fn redacted<S: serde::Serializer>(_: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str("***")
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::PlainText(_) => f.write_str("PlainText(\"***\")"),
            Credential::SecretRef {
                secret_id,
                json_key,
            } => f
                .debug_struct("SecretRef")
                .field("secret_id", secret_id)
                .field("json_key", json_key)
                .finish(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub logical_id: ResourceRef,
    pub user_name: String,
    pub password: Credential,
    pub managed_policies: Vec<ManagedPolicy>,
    pub policies: Vec<InlinePolicy>,
}

/// Named value published for other stacks to import
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedValue {
    pub name: String,
    pub value: ValueRef,
}
