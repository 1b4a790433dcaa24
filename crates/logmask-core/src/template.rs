//! CloudFormation rendering of a [`Graph`]
//!
//! The graph stays engine-agnostic; this module is the only place that knows
//! CloudFormation property names. Output is a `serde_json::Value` whose maps
//! are key-ordered, so identical graphs render byte-identical templates.

use crate::error::{BuildError, Result};
use crate::graph::Graph;
use crate::resources::*;
use serde_json::{json, Map, Value};

pub const TEMPLATE_DESCRIPTION: &str =
    "CloudWatch Logs data protection demo: masked log group, emitter function and unmask users";

const POLICY_VERSION: &str = "2012-10-17";
const DATA_PROTECTION_VERSION: &str = "2021-06-01";
const EVENTS_SERVICE_PRINCIPAL: &str = "events.amazonaws.com";

pub const CODE_BUCKET_PARAMETER: &str = "EmitterCodeBucket";
pub const CODE_KEY_PARAMETER: &str = "EmitterCodeKey";

/// A rendered template plus lookup helpers
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    value: Value,
}

impl Template {
    pub fn as_value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn to_string_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.value)
    }

    /// `(logical_id, resource)` pairs of the given CloudFormation type
    pub fn resources_of_type<'a>(&'a self, resource_type: &'a str) -> Vec<(&'a str, &'a Value)> {
        self.value["Resources"]
            .as_object()
            .into_iter()
            .flat_map(|resources| resources.iter())
            .filter(|(_, resource)| resource["Type"] == resource_type)
            .map(|(id, resource)| (id.as_str(), resource))
            .collect()
    }

    pub fn resource_count(&self, resource_type: &str) -> usize {
        self.resources_of_type(resource_type).len()
    }

    /// Properties of every resource of the given type
    pub fn properties_of_type<'a>(&'a self, resource_type: &'a str) -> Vec<&'a Value> {
        self.resources_of_type(resource_type)
            .into_iter()
            .map(|(_, resource)| &resource["Properties"])
            .collect()
    }

    pub fn output(&self, name: &str) -> Option<&Value> {
        self.value["Outputs"].get(name)
    }
}

/// Render `graph` as a CloudFormation template.
///
/// The graph is validated first; an invalid graph never renders.
pub fn render(graph: &Graph) -> Result<Template> {
    graph.validate()?;

    let mut resources = Map::new();

    let log_group = &graph.log_group;
    resources.insert(
        log_group.logical_id.to_string(),
        with_removal_policy(
            json!({
                "Type": "AWS::Logs::LogGroup",
                "Properties": {
                    "LogGroupName": log_group.name,
                    "DataProtectionPolicy": data_protection_document(&log_group.data_protection),
                }
            }),
            log_group.removal_policy,
        ),
    );

    let role = &graph.execution_role;
    resources.insert(
        role.logical_id.to_string(),
        json!({
            "Type": "AWS::IAM::Role",
            "Properties": {
                "AssumeRolePolicyDocument": {
                    "Statement": [{
                        "Action": "sts:AssumeRole",
                        "Effect": "Allow",
                        "Principal": { "Service": role.assumed_by },
                    }],
                    "Version": POLICY_VERSION,
                },
                "ManagedPolicyArns": managed_policy_arns(&role.managed_policies),
            }
        }),
    );
    resources.insert(
        role.default_policy.logical_id.to_string(),
        policy_resource(&role.default_policy, "Roles", &role.logical_id),
    );

    let function = &graph.function;
    let mut function_properties = json!({
        "Code": code_location(&function.code),
        "Handler": function.handler,
        "Runtime": function.runtime,
        "Role": get_att(&function.role, "Arn"),
        "Timeout": function.timeout.as_secs(),
    });
    if let Some(log_group) = &function.log_group {
        function_properties["LoggingConfig"] = json!({ "LogGroup": reference(log_group) });
    }
    resources.insert(
        function.logical_id.to_string(),
        json!({
            "Type": "AWS::Lambda::Function",
            "Properties": function_properties,
            "DependsOn": [
                role.default_policy.logical_id.as_str(),
                role.logical_id.as_str(),
            ],
        }),
    );

    let rule = &graph.schedule;
    let expression = rule.schedule.expression().ok_or_else(|| {
        BuildError::invalid_graph("schedule rate must be a positive whole number of minutes")
    })?;
    let targets: Vec<Value> = rule
        .targets
        .iter()
        .enumerate()
        .map(|(i, target)| {
            json!({
                "Arn": get_att(target, "Arn"),
                "Id": format!("Target{}", i),
            })
        })
        .collect();
    resources.insert(
        rule.logical_id.to_string(),
        json!({
            "Type": "AWS::Events::Rule",
            "Properties": {
                "ScheduleExpression": expression,
                "State": "ENABLED",
                "Targets": targets,
            }
        }),
    );
    for target in &rule.targets {
        resources.insert(
            format!("{}AllowEventRule{}", rule.logical_id, target),
            json!({
                "Type": "AWS::Lambda::Permission",
                "Properties": {
                    "Action": "lambda:InvokeFunction",
                    "FunctionName": get_att(target, "Arn"),
                    "Principal": EVENTS_SERVICE_PRINCIPAL,
                    "SourceArn": get_att(&rule.logical_id, "Arn"),
                }
            }),
        );
    }

    for user in graph.users() {
        resources.insert(
            user.logical_id.to_string(),
            json!({
                "Type": "AWS::IAM::User",
                "Properties": {
                    "LoginProfile": { "Password": credential(&user.password) },
                    "ManagedPolicyArns": managed_policy_arns(&user.managed_policies),
                    "UserName": user.user_name,
                }
            }),
        );
        for policy in &user.policies {
            resources.insert(
                policy.logical_id.to_string(),
                policy_resource(policy, "Users", &user.logical_id),
            );
        }
    }

    let mut outputs = Map::new();
    for export in &graph.exports {
        outputs.insert(
            export.name.clone(),
            json!({
                "Value": value_ref(&export.value),
                "Export": { "Name": export.name },
            }),
        );
    }

    let mut template = json!({
        "AWSTemplateFormatVersion": "2010-09-09",
        "Description": TEMPLATE_DESCRIPTION,
        "Resources": resources,
        "Outputs": outputs,
    });
    if function.code == CodeLocation::Parameters {
        template["Parameters"] = json!({
            CODE_BUCKET_PARAMETER: {
                "Type": "String",
                "Description": "S3 bucket holding the emitter deployment package",
            },
            CODE_KEY_PARAMETER: {
                "Type": "String",
                "Description": "S3 key of the emitter deployment package",
            },
        });
    }

    Ok(Template { value: template })
}

fn reference(target: &ResourceRef) -> Value {
    json!({ "Ref": target.as_str() })
}

fn get_att(target: &ResourceRef, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [target.as_str(), attribute] })
}

fn value_ref(value: &ValueRef) -> Value {
    match value {
        ValueRef::Literal(literal) => json!(literal),
        ValueRef::Ref(target) => reference(target),
        ValueRef::GetAtt(target, attribute) => get_att(target, attribute),
    }
}

/// Partition-aware ARN of an AWS managed policy
fn managed_policy_arns(policies: &[ManagedPolicy]) -> Vec<Value> {
    policies
        .iter()
        .map(|policy| {
            json!({
                "Fn::Join": [
                    "",
                    [
                        "arn:",
                        { "Ref": "AWS::Partition" },
                        format!(":iam::aws:policy/{}", policy.name()),
                    ]
                ]
            })
        })
        .collect()
}

/// Single-element lists collapse to a scalar, as CloudFormation emits them
fn one_or_many(values: &[String]) -> Value {
    match values {
        [single] => json!(single),
        many => json!(many),
    }
}

fn policy_document(statements: &[PolicyStatement]) -> Value {
    let statements: Vec<Value> = statements
        .iter()
        .map(|statement| {
            json!({
                "Action": one_or_many(&statement.actions),
                "Effect": statement.effect.as_str(),
                "Resource": one_or_many(&statement.resources),
            })
        })
        .collect();
    json!({ "Statement": statements, "Version": POLICY_VERSION })
}

fn policy_resource(policy: &InlinePolicy, attach_key: &str, owner: &ResourceRef) -> Value {
    json!({
        "Type": "AWS::IAM::Policy",
        "Properties": {
            "PolicyDocument": policy_document(&policy.statements),
            "PolicyName": policy.policy_name,
            attach_key: [reference(owner)],
        }
    })
}

fn data_identifier_ref(identifier: &DataIdentifier) -> Value {
    if identifier.is_managed() {
        json!(format!(
            "arn:aws:dataprotection::aws:data-identifier/{}",
            identifier.name()
        ))
    } else {
        json!(identifier.name())
    }
}

fn data_protection_document(policy: &DataProtectionPolicy) -> Value {
    let identifiers: Vec<Value> = policy.identifiers.iter().map(data_identifier_ref).collect();
    let custom: Vec<Value> = policy
        .identifiers
        .iter()
        .filter_map(|identifier| match identifier {
            DataIdentifier::Custom { name, regex } => Some(json!({ "Name": name, "Regex": regex })),
            _ => None,
        })
        .collect();

    let mut document = json!({
        "Name": policy.name,
        "Description": policy.description,
        "Version": DATA_PROTECTION_VERSION,
        "Statement": [
            {
                "Sid": "audit-statement",
                "DataIdentifier": identifiers,
                "Operation": { "Audit": { "FindingsDestination": {} } },
            },
            {
                "Sid": "redact-statement",
                "DataIdentifier": identifiers,
                "Operation": { "Deidentify": { "MaskConfig": {} } },
            },
        ],
    });
    if !custom.is_empty() {
        document["Configuration"] = json!({ "CustomDataIdentifier": custom });
    }
    document
}

fn code_location(code: &CodeLocation) -> Value {
    match code {
        CodeLocation::Parameters => json!({
            "S3Bucket": { "Ref": CODE_BUCKET_PARAMETER },
            "S3Key": { "Ref": CODE_KEY_PARAMETER },
        }),
        CodeLocation::S3 { bucket, key } => json!({ "S3Bucket": bucket, "S3Key": key }),
    }
}

fn credential(password: &Credential) -> Value {
    match password {
        Credential::PlainText(value) => json!(value),
        Credential::SecretRef {
            secret_id,
            json_key: Some(key),
        } => json!(format!(
            "{{{{resolve:secretsmanager:{}:SecretString:{}}}}}",
            secret_id, key
        )),
        Credential::SecretRef {
            secret_id,
            json_key: None,
        } => json!(format!("{{{{resolve:secretsmanager:{}}}}}", secret_id)),
    }
}

fn with_removal_policy(mut resource: Value, policy: RemovalPolicy) -> Value {
    let value = match policy {
        RemovalPolicy::Destroy => "Delete",
        RemovalPolicy::Retain => "Retain",
    };
    resource["UpdateReplacePolicy"] = json!(value);
    resource["DeletionPolicy"] = json!(value);
    resource
}
