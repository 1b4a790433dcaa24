//! Resource graph construction
//!
//! `build` is a single synchronous pass. Later resources reference earlier
//! ones by logical ID, so the order below is load-bearing.

use crate::error::{BuildError, Result};
use crate::graph::Graph;
use crate::masking::MaskingMatcher;
use crate::resources::*;
use std::time::Duration;
use tracing::debug;

pub const PRIVILEGED_USER_NAME: &str = "DemoLogAdmin";
pub const STANDARD_USER_NAME: &str = "DemoLogViewer";
pub const LOG_GROUP_NAME: &str = "LoggerLambdaDemoLogGroup";

pub const UNMASK_ACTION: &str = "logs:Unmask";
pub const LOGS_RESOURCE_PATTERN: &str = "arn:aws:logs:*:*:*";

pub const EMPLOYEE_ID_IDENTIFIER: &str = "EmployeeId";
pub const EMPLOYEE_ID_PATTERN: &str = r"EmployeeId-\d{9}";

const LAMBDA_SERVICE_PRINCIPAL: &str = "lambda.amazonaws.com";
const BASIC_EXECUTION_POLICY: &str = "service-role/AWSLambdaBasicExecutionRole";
const LOGS_READ_ONLY_POLICY: &str = "CloudWatchLogsReadOnlyAccess";

const EMITTER_HANDLER: &str = "bootstrap";
const EMITTER_RUNTIME: &str = "provided.al2023";
const EMITTER_TIMEOUT: Duration = Duration::from_secs(15);
const EMITTER_RATE: Duration = Duration::from_secs(60);

/// Export names published by the stack
pub mod exports {
    pub const LOG_GROUP_NAME: &str = "LambdaLoggerLogGroupName";
    pub const LOG_GROUP_ARN: &str = "LambdaLoggerLogGroupArn";
    pub const FUNCTION_ARN: &str = "LoggerLambdaFunctionArn";
    pub const FUNCTION_NAME: &str = "LoggerLambdaFunctionName";
    pub const PRIVILEGED_USER_NAME: &str = "PrivilegedUserName";
    pub const STANDARD_USER_NAME: &str = "StandardUserName";
}

/// Input to [`build`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackConfig {
    pub privileged_user_secret: Option<Credential>,
    pub standard_user_secret: Option<Credential>,
    /// Falls back to [`CodeLocation::Parameters`] when unset
    pub emitter_code: Option<CodeLocation>,
}

impl StackConfig {
    /// Config with plain-text console passwords, as used by the demo
    pub fn with_passwords(privileged: impl Into<String>, standard: impl Into<String>) -> Self {
        Self {
            privileged_user_secret: Some(Credential::PlainText(privileged.into())),
            standard_user_secret: Some(Credential::PlainText(standard.into())),
            emitter_code: None,
        }
    }
}

/// Build the complete resource graph for `config`.
///
/// Inputs are checked before anything is constructed; any failure returns
/// an error and no graph.
pub fn build(config: &StackConfig) -> Result<Graph> {
    let privileged_secret = require_secret(&config.privileged_user_secret, "privileged user")?;
    let standard_secret = require_secret(&config.standard_user_secret, "standard user")?;

    let data_protection = data_protection_policy()?;

    let log_group = LogGroup {
        logical_id: ResourceRef::new("LoggerLambdaLogGroup"),
        name: LOG_GROUP_NAME.to_string(),
        data_protection,
        removal_policy: RemovalPolicy::Destroy,
    };

    let execution_role = execution_role();

    let function = ComputeFunction {
        logical_id: ResourceRef::new("LoggerLambda"),
        code: config
            .emitter_code
            .clone()
            .unwrap_or(CodeLocation::Parameters),
        handler: EMITTER_HANDLER.to_string(),
        runtime: EMITTER_RUNTIME.to_string(),
        role: execution_role.logical_id.clone(),
        timeout: EMITTER_TIMEOUT,
        log_group: Some(log_group.logical_id.clone()),
    };

    let schedule = ScheduleRule {
        logical_id: ResourceRef::new("LambdaScheduleRule"),
        schedule: Schedule::Rate(EMITTER_RATE),
        targets: vec![function.logical_id.clone()],
    };

    let privileged_user = log_user(
        "DemoLogAdminUser",
        PRIVILEGED_USER_NAME,
        privileged_secret,
        unmask_policy("UnmaskLogAllowPolicy", Effect::Allow),
    );

    let standard_user = log_user(
        "DemoLogViewerUser",
        STANDARD_USER_NAME,
        standard_secret,
        unmask_policy("UnmaskLogDenyPolicy", Effect::Deny),
    );

    let exports = vec![
        export(
            exports::LOG_GROUP_NAME,
            ValueRef::Literal(log_group.name.clone()),
        ),
        export(
            exports::LOG_GROUP_ARN,
            ValueRef::GetAtt(log_group.logical_id.clone(), "Arn".to_string()),
        ),
        export(
            exports::FUNCTION_ARN,
            ValueRef::GetAtt(function.logical_id.clone(), "Arn".to_string()),
        ),
        export(
            exports::FUNCTION_NAME,
            ValueRef::Ref(function.logical_id.clone()),
        ),
        export(
            exports::PRIVILEGED_USER_NAME,
            ValueRef::Literal(privileged_user.user_name.clone()),
        ),
        export(
            exports::STANDARD_USER_NAME,
            ValueRef::Literal(standard_user.user_name.clone()),
        ),
    ];

    let graph = Graph {
        log_group,
        execution_role,
        function,
        schedule,
        privileged_user,
        standard_user,
        exports,
    };
    graph.validate()?;

    let counts = graph.counts();
    debug!(
        policies = counts.policies,
        users = counts.users,
        exports = graph.exports.len(),
        "Built resource graph"
    );

    Ok(graph)
}

fn require_secret(secret: &Option<Credential>, who: &str) -> Result<Credential> {
    match secret {
        Some(credential) if !credential.is_empty() => Ok(credential.clone()),
        _ => Err(BuildError::configuration(format!(
            "{} secret is required",
            who
        ))),
    }
}

/// Email, IP address and employee id identifiers. Custom patterns are
/// compiled here so a bad regex fails the build instead of the deploy.
pub fn data_protection_policy() -> Result<DataProtectionPolicy> {
    let policy = DataProtectionPolicy {
        name: "LoggerDataProtectionPolicy".to_string(),
        description: "Demo data protection policy for Logger Lambda".to_string(),
        identifiers: vec![
            DataIdentifier::EmailAddress,
            DataIdentifier::IpAddress,
            DataIdentifier::custom(EMPLOYEE_ID_IDENTIFIER, EMPLOYEE_ID_PATTERN),
        ],
    };
    MaskingMatcher::from_policy(&policy)?;
    Ok(policy)
}

fn execution_role() -> ExecutionRole {
    ExecutionRole {
        logical_id: ResourceRef::new("LoggerLambdaRole"),
        assumed_by: LAMBDA_SERVICE_PRINCIPAL.to_string(),
        managed_policies: vec![ManagedPolicy::aws(BASIC_EXECUTION_POLICY)],
        default_policy: InlinePolicy {
            logical_id: ResourceRef::new("LoggerLambdaRoleDefaultPolicy"),
            policy_name: "LoggerLambdaRoleDefaultPolicy".to_string(),
            statements: vec![PolicyStatement::new(
                Effect::Allow,
                [
                    "logs:CreateLogGroup",
                    "logs:CreateLogStream",
                    "logs:PutLogEvents",
                    "logs:ListLogDeliveries",
                ],
                [LOGS_RESOURCE_PATTERN],
            )],
        },
    }
}

/// The allow and deny variants differ in effect only.
fn unmask_policy(name: &str, effect: Effect) -> InlinePolicy {
    InlinePolicy {
        logical_id: ResourceRef::new(name),
        policy_name: name.to_string(),
        statements: vec![PolicyStatement::new(
            effect,
            [UNMASK_ACTION],
            [LOGS_RESOURCE_PATTERN],
        )],
    }
}

fn log_user(
    logical_id: &str,
    user_name: &str,
    password: Credential,
    policy: InlinePolicy,
) -> User {
    User {
        logical_id: ResourceRef::new(logical_id),
        user_name: user_name.to_string(),
        password,
        managed_policies: vec![ManagedPolicy::aws(LOGS_READ_ONLY_POLICY)],
        policies: vec![policy],
    }
}

fn export(name: &str, value: ValueRef) -> ExportedValue {
    ExportedValue {
        name: name.to_string(),
        value,
    }
}
