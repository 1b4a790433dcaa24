//! The assembled resource graph and its structural invariants

use crate::builder::UNMASK_ACTION;
use crate::error::{BuildError, Result};
use crate::resources::*;
use serde::Serialize;
use std::collections::BTreeSet;

/// Every resource of the stack, wired together by logical ID
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Graph {
    pub log_group: LogGroup,
    pub execution_role: ExecutionRole,
    pub function: ComputeFunction,
    pub schedule: ScheduleRule,
    pub privileged_user: User,
    pub standard_user: User,
    pub exports: Vec<ExportedValue>,
}

/// Number of resources of each kind in a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceCounts {
    pub log_groups: usize,
    pub functions: usize,
    pub roles: usize,
    pub policies: usize,
    pub schedule_rules: usize,
    pub users: usize,
    pub data_protection_policies: usize,
    pub data_identifiers: usize,
}

impl Graph {
    pub fn users(&self) -> [&User; 2] {
        [&self.privileged_user, &self.standard_user]
    }

    /// All inline policies: the role's default policy first, then per user
    pub fn policies(&self) -> impl Iterator<Item = &InlinePolicy> {
        std::iter::once(&self.execution_role.default_policy)
            .chain(self.users().into_iter().flat_map(|user| user.policies.iter()))
    }

    pub fn export(&self, name: &str) -> Option<&ExportedValue> {
        self.exports.iter().find(|export| export.name == name)
    }

    pub fn counts(&self) -> ResourceCounts {
        ResourceCounts {
            log_groups: 1,
            functions: 1,
            roles: 1,
            policies: self.policies().count(),
            schedule_rules: 1,
            users: self.users().len(),
            data_protection_policies: 1,
            data_identifiers: self.log_group.data_protection.identifiers.len(),
        }
    }

    /// Logical IDs of every resource in the graph, in construction order
    pub fn logical_ids(&self) -> Vec<&ResourceRef> {
        let mut ids = vec![
            &self.log_group.logical_id,
            &self.execution_role.logical_id,
            &self.execution_role.default_policy.logical_id,
            &self.function.logical_id,
            &self.schedule.logical_id,
        ];
        for user in self.users() {
            ids.push(&user.logical_id);
            ids.extend(user.policies.iter().map(|policy| &policy.logical_id));
        }
        ids
    }

    /// Check the invariants every graph must hold.
    pub fn validate(&self) -> Result<()> {
        let mut known = BTreeSet::new();
        for id in self.logical_ids() {
            if !known.insert(id) {
                return Err(BuildError::invalid_graph(format!(
                    "duplicate logical id '{}'",
                    id
                )));
            }
        }
        let resolve = |target: &ResourceRef, context: &str| -> Result<()> {
            if known.contains(target) {
                Ok(())
            } else {
                Err(BuildError::invalid_graph(format!(
                    "{} references unknown resource '{}'",
                    context, target
                )))
            }
        };

        if self.log_group.data_protection.identifiers.is_empty() {
            return Err(BuildError::invalid_graph(format!(
                "data protection policy '{}' has no identifiers",
                self.log_group.data_protection.name
            )));
        }

        for policy in self.policies() {
            if policy.statements.is_empty() {
                return Err(BuildError::invalid_graph(format!(
                    "policy '{}' has no statements",
                    policy.policy_name
                )));
            }
            for statement in &policy.statements {
                if statement.actions.is_empty() || statement.resources.is_empty() {
                    return Err(BuildError::invalid_graph(format!(
                        "policy '{}' has a statement without actions or resources",
                        policy.policy_name
                    )));
                }
            }
        }

        resolve(&self.function.role, "function role")?;
        if self.function.role != self.execution_role.logical_id {
            return Err(BuildError::invalid_graph(
                "function must be bound to the graph's execution role",
            ));
        }
        if let Some(log_group) = &self.function.log_group {
            resolve(log_group, "function log group")?;
            if *log_group != self.log_group.logical_id {
                return Err(BuildError::invalid_graph(
                    "function must log to the graph's log group",
                ));
            }
        }
        if self.function.timeout.is_zero() {
            return Err(BuildError::invalid_graph("function timeout must be positive"));
        }

        if self.schedule.targets.is_empty() {
            return Err(BuildError::invalid_graph(format!(
                "schedule rule '{}' has no targets",
                self.schedule.logical_id
            )));
        }
        if self.schedule.schedule.expression().is_none() {
            return Err(BuildError::invalid_graph(
                "schedule rate must be a positive whole number of minutes",
            ));
        }
        for target in &self.schedule.targets {
            resolve(target, "schedule target")?;
        }

        self.validate_unmask_symmetry()?;

        let mut export_names = BTreeSet::new();
        for export in &self.exports {
            if !export_names.insert(export.name.as_str()) {
                return Err(BuildError::invalid_graph(format!(
                    "duplicate export name '{}'",
                    export.name
                )));
            }
            if let Some(target) = export.value.target() {
                resolve(target, &format!("export '{}'", export.name))?;
            }
        }

        Ok(())
    }

    /// The privileged user is allowed exactly what the standard user is denied.
    fn validate_unmask_symmetry(&self) -> Result<()> {
        let allow = unmask_statement(&self.privileged_user)?;
        let deny = unmask_statement(&self.standard_user)?;

        if allow.effect != Effect::Allow {
            return Err(BuildError::invalid_graph(format!(
                "user '{}' must be allowed to unmask",
                self.privileged_user.user_name
            )));
        }
        if deny.effect != Effect::Deny {
            return Err(BuildError::invalid_graph(format!(
                "user '{}' must be denied unmask",
                self.standard_user.user_name
            )));
        }
        if !allow.same_scope(deny) {
            return Err(BuildError::invalid_graph(
                "unmask allow and deny statements must cover the same actions and resources",
            ));
        }
        Ok(())
    }
}

fn unmask_statement(user: &User) -> Result<&PolicyStatement> {
    user.policies
        .iter()
        .flat_map(|policy| policy.statements.iter())
        .find(|statement| statement.actions.iter().any(|action| action == UNMASK_ACTION))
        .ok_or_else(|| {
            BuildError::invalid_graph(format!(
                "user '{}' has no unmask statement",
                user.user_name
            ))
        })
}
