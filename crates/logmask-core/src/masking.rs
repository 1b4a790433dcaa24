//! Local approximation of the log group's data protection policy
//!
//! CloudWatch applies the managed identifiers server side; these patterns
//! cover the shapes the emitter produces so the masking contract can be
//! checked without a deployed stack.

use crate::error::{BuildError, Result};
use crate::resources::{DataIdentifier, DataProtectionPolicy};
use regex::Regex;

const EMAIL_PATTERN: &str = r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}";
const IPV4_PATTERN: &str =
    r"\b(?:(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\b";

/// A span of a message matched by one identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub identifier: String,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct MaskingMatcher {
    patterns: Vec<(String, Regex)>,
}

impl MaskingMatcher {
    /// Compile one pattern per identifier, in policy order
    pub fn from_policy(policy: &DataProtectionPolicy) -> Result<Self> {
        let patterns = policy
            .identifiers
            .iter()
            .map(|identifier| {
                let pattern = match identifier {
                    DataIdentifier::EmailAddress => EMAIL_PATTERN,
                    DataIdentifier::IpAddress => IPV4_PATTERN,
                    DataIdentifier::Custom { regex, .. } => regex.as_str(),
                };
                let compiled = Regex::new(pattern)
                    .map_err(|e| BuildError::malformed_pattern(identifier.name(), e))?;
                Ok((identifier.name().to_string(), compiled))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// All matches, ordered by position in the message
    pub fn find(&self, message: &str) -> Vec<Finding> {
        let mut findings: Vec<Finding> = self
            .patterns
            .iter()
            .flat_map(|(name, regex)| {
                regex.find_iter(message).map(move |m| Finding {
                    identifier: name.clone(),
                    start: m.start(),
                    end: m.end(),
                    text: m.as_str().to_string(),
                })
            })
            .collect();
        findings.sort_by_key(|f| (f.start, f.end));
        findings
    }

    pub fn is_sensitive(&self, message: &str) -> bool {
        self.patterns.iter().any(|(_, regex)| regex.is_match(message))
    }

    /// Replace every matched character with `*`
    pub fn mask(&self, message: &str) -> String {
        let findings = self.find(message);
        message
            .char_indices()
            .map(|(offset, c)| {
                if findings.iter().any(|f| (f.start..f.end).contains(&offset)) {
                    '*'
                } else {
                    c
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_policy() -> DataProtectionPolicy {
        DataProtectionPolicy {
            name: "test".to_string(),
            description: String::new(),
            identifiers: vec![
                DataIdentifier::EmailAddress,
                DataIdentifier::IpAddress,
                DataIdentifier::custom("EmployeeId", r"EmployeeId-\d{9}"),
            ],
        }
    }

    #[test]
    fn test_find_each_identifier() {
        let matcher = MaskingMatcher::from_policy(&demo_policy()).unwrap();

        let findings = matcher.find("Email address for abc: abc@fakedomain.com");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].identifier, "EmailAddress");
        assert_eq!(findings[0].text, "abc@fakedomain.com");

        let findings = matcher.find("User connecting from ip address: 10.0.255.7");
        assert_eq!(findings[0].identifier, "IpAddress");
        assert_eq!(findings[0].text, "10.0.255.7");

        let findings = matcher.find("User id: abc has employee id: EmployeeId-123456789");
        assert_eq!(findings[0].identifier, "EmployeeId");
    }

    #[test]
    fn test_ip_out_of_range_not_matched() {
        let matcher = MaskingMatcher::from_policy(&demo_policy()).unwrap();
        assert!(!matcher.is_sensitive("version 300.1.2.3"));
        assert!(!matcher.is_sensitive("Processing data for user id: abcdefgh"));
    }

    #[test]
    fn test_mask_preserves_length() {
        let matcher = MaskingMatcher::from_policy(&demo_policy()).unwrap();
        let masked = matcher.mask("id EmployeeId-000000001 ok");
        assert_eq!(masked, "id ******************** ok");
    }

    #[test]
    fn test_malformed_custom_pattern() {
        let mut policy = demo_policy();
        policy.identifiers.push(DataIdentifier::custom("Broken", "EmployeeId-(\\d"));
        let err = MaskingMatcher::from_policy(&policy).unwrap_err();
        assert!(matches!(err, BuildError::MalformedPattern { .. }));
        assert_eq!(err.code(), "E002");
    }
}
