// Masking contract between the emitter and the log group's policy
//
// Runs generated messages through the matcher compiled from the policy the
// graph builder attaches to the log group.

use logmask_core::{build, MaskingMatcher, StackConfig};
use logmask_emitter::generate;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn policy_matcher() -> MaskingMatcher {
    let graph = build(&StackConfig::with_passwords("p@ss1", "p@ss2")).unwrap();
    MaskingMatcher::from_policy(&graph.log_group.data_protection).unwrap()
}

#[test]
fn test_generated_messages_are_flagged() {
    let matcher = policy_matcher();

    for seed in 0..50 {
        let event = generate(&mut StdRng::seed_from_u64(seed));
        let [plain, ip, email, employee] = &event.messages;

        assert!(
            !matcher.is_sensitive(plain),
            "user id line should stay readable: {}",
            plain
        );

        let findings = matcher.find(ip);
        assert!(findings
            .iter()
            .any(|f| f.identifier == "IpAddress" && f.text == event.ip_address));

        let expected_email = format!("{}@fakedomain.com", event.user_id);
        let findings = matcher.find(email);
        assert!(findings
            .iter()
            .any(|f| f.identifier == "EmailAddress" && f.text == expected_email));

        let expected_employee = format!("EmployeeId-{}", event.employee_id);
        let findings = matcher.find(employee);
        assert!(findings
            .iter()
            .any(|f| f.identifier == "EmployeeId" && f.text == expected_employee));
    }
}

#[test]
fn test_masked_messages_hide_values() {
    let matcher = policy_matcher();
    let event = generate(&mut StdRng::seed_from_u64(2024));

    let masked = matcher.mask(&event.messages[3]);
    assert!(!masked.contains(&event.employee_id));
    assert!(masked.starts_with(&format!("User id: {}", event.user_id)));

    let masked = matcher.mask(&event.messages[1]);
    assert!(!masked.contains(&event.ip_address));
}
