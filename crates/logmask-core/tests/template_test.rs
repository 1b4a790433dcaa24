// Integration tests for logmask-core
//
// Builds the demo graph, renders it and checks the template resource by
// resource: counts per type, the execution role, both unmask policies,
// the schedule rule, the users and the exports.

use logmask_core::{
    build, exports, render, BuildError, Credential, Effect, StackConfig, Template,
    PRIVILEGED_USER_NAME, STANDARD_USER_NAME,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn demo_config() -> StackConfig {
    StackConfig::with_passwords("p@ss1", "p@ss2")
}

fn demo_template() -> Template {
    let graph = build(&demo_config()).expect("demo config builds");
    render(&graph).expect("demo graph renders")
}

fn managed_policy_arn(name: &str) -> Value {
    json!({
        "Fn::Join": [
            "",
            ["arn:", { "Ref": "AWS::Partition" }, format!(":iam::aws:policy/{}", name)]
        ]
    })
}

fn policy_named<'a>(template: &'a Template, name: &str) -> &'a Value {
    template
        .properties_of_type("AWS::IAM::Policy")
        .into_iter()
        .find(|properties| properties["PolicyName"] == name)
        .unwrap_or_else(|| panic!("policy {} not rendered", name))
}

fn user_named<'a>(template: &'a Template, name: &str) -> &'a Value {
    template
        .properties_of_type("AWS::IAM::User")
        .into_iter()
        .find(|properties| properties["UserName"] == name)
        .unwrap_or_else(|| panic!("user {} not rendered", name))
}

#[test]
fn test_resource_counts() {
    let template = demo_template();

    assert_eq!(template.resource_count("AWS::Logs::LogGroup"), 1);
    assert_eq!(template.resource_count("AWS::Lambda::Function"), 1);
    assert_eq!(template.resource_count("AWS::IAM::Role"), 1);
    assert_eq!(template.resource_count("AWS::IAM::Policy"), 3);
    assert_eq!(template.resource_count("AWS::Lambda::Permission"), 1);
    assert_eq!(template.resource_count("AWS::Events::Rule"), 1);
    assert_eq!(template.resource_count("AWS::IAM::User"), 2);
}

#[test]
fn test_execution_role() {
    let template = demo_template();
    let roles = template.properties_of_type("AWS::IAM::Role");

    assert_eq!(
        *roles[0],
        json!({
            "AssumeRolePolicyDocument": {
                "Statement": [{
                    "Action": "sts:AssumeRole",
                    "Effect": "Allow",
                    "Principal": { "Service": "lambda.amazonaws.com" }
                }],
                "Version": "2012-10-17"
            },
            "ManagedPolicyArns": [managed_policy_arn("service-role/AWSLambdaBasicExecutionRole")]
        })
    );

    let default_policy = policy_named(&template, "LoggerLambdaRoleDefaultPolicy");
    assert_eq!(default_policy["Roles"], json!([{ "Ref": "LoggerLambdaRole" }]));
    assert_eq!(
        default_policy["PolicyDocument"]["Statement"][0]["Action"],
        json!([
            "logs:CreateLogGroup",
            "logs:CreateLogStream",
            "logs:PutLogEvents",
            "logs:ListLogDeliveries"
        ])
    );
}

#[test]
fn test_unmask_policies() {
    let template = demo_template();

    let deny = policy_named(&template, "UnmaskLogDenyPolicy");
    assert_eq!(
        deny["PolicyDocument"],
        json!({
            "Statement": [{
                "Action": "logs:Unmask",
                "Effect": "Deny",
                "Resource": "arn:aws:logs:*:*:*"
            }],
            "Version": "2012-10-17"
        })
    );
    assert_eq!(deny["Users"], json!([{ "Ref": "DemoLogViewerUser" }]));

    let allow = policy_named(&template, "UnmaskLogAllowPolicy");
    assert_eq!(
        allow["PolicyDocument"],
        json!({
            "Statement": [{
                "Action": "logs:Unmask",
                "Effect": "Allow",
                "Resource": "arn:aws:logs:*:*:*"
            }],
            "Version": "2012-10-17"
        })
    );
    assert_eq!(allow["Users"], json!([{ "Ref": "DemoLogAdminUser" }]));
}

#[test]
fn test_unmask_statements_differ_only_in_effect() {
    let graph = build(&demo_config()).unwrap();
    let admin = &graph.privileged_user.policies[0].statements[0];
    let viewer = &graph.standard_user.policies[0].statements[0];

    assert_eq!(admin.effect, Effect::Allow);
    assert_eq!(viewer.effect, Effect::Deny);
    assert_eq!(admin.actions, viewer.actions);
    assert_eq!(admin.resources, viewer.resources);
    assert!(admin.same_scope(viewer));
}

#[test]
fn test_schedule_rule() {
    let template = demo_template();
    let rules = template.properties_of_type("AWS::Events::Rule");

    assert_eq!(
        *rules[0],
        json!({
            "ScheduleExpression": "rate(1 minute)",
            "State": "ENABLED",
            "Targets": [{
                "Arn": { "Fn::GetAtt": ["LoggerLambda", "Arn"] },
                "Id": "Target0"
            }]
        })
    );

    let permissions = template.properties_of_type("AWS::Lambda::Permission");
    assert_eq!(permissions[0]["Principal"], json!("events.amazonaws.com"));
    assert_eq!(
        permissions[0]["SourceArn"],
        json!({ "Fn::GetAtt": ["LambdaScheduleRule", "Arn"] })
    );
}

#[test]
fn test_users() {
    let template = demo_template();

    for (name, password) in [(PRIVILEGED_USER_NAME, "p@ss1"), (STANDARD_USER_NAME, "p@ss2")] {
        assert_eq!(
            *user_named(&template, name),
            json!({
                "LoginProfile": { "Password": password },
                "ManagedPolicyArns": [managed_policy_arn("CloudWatchLogsReadOnlyAccess")],
                "UserName": name
            })
        );
    }
}

#[test]
fn test_log_group_and_function() {
    let template = demo_template();

    let (id, log_group) = template.resources_of_type("AWS::Logs::LogGroup")[0];
    assert_eq!(id, "LoggerLambdaLogGroup");
    assert_eq!(log_group["DeletionPolicy"], json!("Delete"));
    let properties = &log_group["Properties"];
    assert_eq!(properties["LogGroupName"], json!("LoggerLambdaDemoLogGroup"));
    let policy = &properties["DataProtectionPolicy"];
    assert_eq!(policy["Name"], json!("LoggerDataProtectionPolicy"));
    assert_eq!(
        policy["Statement"][1]["DataIdentifier"],
        json!([
            "arn:aws:dataprotection::aws:data-identifier/EmailAddress",
            "arn:aws:dataprotection::aws:data-identifier/IpAddress",
            "EmployeeId"
        ])
    );

    let function = template.properties_of_type("AWS::Lambda::Function")[0];
    assert_eq!(function["Timeout"], json!(15));
    assert_eq!(function["Handler"], json!("bootstrap"));
    assert_eq!(
        function["LoggingConfig"],
        json!({ "LogGroup": { "Ref": "LoggerLambdaLogGroup" } })
    );
    assert_eq!(
        function["Role"],
        json!({ "Fn::GetAtt": ["LoggerLambdaRole", "Arn"] })
    );
    assert!(template.as_value()["Parameters"]["EmitterCodeBucket"].is_object());
}

#[test]
fn test_exports() {
    let graph = build(&demo_config()).unwrap();
    assert_eq!(graph.exports.len(), 6);

    let template = render(&graph).unwrap();
    assert_eq!(
        template.output(exports::PRIVILEGED_USER_NAME).unwrap()["Value"],
        json!("DemoLogAdmin")
    );
    assert_eq!(
        template.output(exports::STANDARD_USER_NAME).unwrap()["Value"],
        json!("DemoLogViewer")
    );
    assert_eq!(
        template.output(exports::LOG_GROUP_ARN).unwrap(),
        &json!({
            "Value": { "Fn::GetAtt": ["LoggerLambdaLogGroup", "Arn"] },
            "Export": { "Name": "LambdaLoggerLogGroupArn" }
        })
    );
    assert_eq!(
        template.output(exports::FUNCTION_NAME).unwrap()["Value"],
        json!({ "Ref": "LoggerLambda" })
    );
}

#[test]
fn test_build_is_deterministic() {
    let first = build(&demo_config()).unwrap();
    let second = build(&demo_config()).unwrap();
    assert_eq!(first, second);

    let first = render(&first).unwrap().to_string_pretty().unwrap();
    let second = render(&second).unwrap().to_string_pretty().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_secret_references_replace_plaintext() {
    let config = StackConfig {
        privileged_user_secret: Some(Credential::SecretRef {
            secret_id: "logmask/users".to_string(),
            json_key: Some("privileged".to_string()),
        }),
        standard_user_secret: Some(Credential::SecretRef {
            secret_id: "logmask/users".to_string(),
            json_key: Some("standard".to_string()),
        }),
        emitter_code: None,
    };
    let template = render(&build(&config).unwrap()).unwrap();
    let rendered = template.to_string_pretty().unwrap();

    assert!(rendered.contains("{{resolve:secretsmanager:logmask/users:SecretString:privileged}}"));
    assert!(!rendered.contains("p@ss1"));
}

#[test]
fn test_invalid_graph_never_renders() {
    let mut graph = build(&demo_config()).unwrap();
    graph.standard_user.policies[0].statements.clear();
    assert!(matches!(render(&graph), Err(BuildError::InvalidGraph { .. })));

    let mut graph = build(&demo_config()).unwrap();
    graph.standard_user.policies[0].statements[0].effect = Effect::Allow;
    assert!(matches!(render(&graph), Err(BuildError::InvalidGraph { .. })));

    let mut graph = build(&demo_config()).unwrap();
    graph.exports.push(graph.exports[0].clone());
    assert!(matches!(graph.validate(), Err(BuildError::InvalidGraph { .. })));

    let mut graph = build(&demo_config()).unwrap();
    graph.schedule.targets.clear();
    assert!(matches!(graph.validate(), Err(BuildError::InvalidGraph { .. })));
}
