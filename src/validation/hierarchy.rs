//! Hierarchy Validation
//!
//! Validates every chain in the ledger and the cross-level linkage between
//! them. Linkage is checked against the snapshot recorded at child-creation
//! time: a child genesis `prev_hash` must be the hash of *some* block in the
//! parent's chain. Comparing against the parent's current head instead would
//! spuriously invalidate every child as soon as the parent gains a block.

use serde::Serialize;
use tracing::{info, warn};

use crate::chain::Difficulty;
use crate::ledger::entity::{EntityLevel, EntityRecord};
use crate::ledger::hierarchy::Ledger;
use crate::validation::chain::validate_chain;

/// One problem found in the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkageIssue {
    #[serde(rename = "type")]
    pub entity_type: EntityLevel,
    #[serde(rename = "id")]
    pub entity_id: String,
    pub reason: String,
}

/// Full report over every chain and linkage in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyValidation {
    pub valid: bool,
    pub issues: Vec<LinkageIssue>,
}

impl HierarchyValidation {
    pub fn summary(&self) -> String {
        if self.valid {
            "✅ ledger is valid".to_string()
        } else {
            format!("❌ ledger has {} issue(s)", self.issues.len())
        }
    }
}

/// Validate every department, class and student chain, plus each child's
/// genesis linkage into its parent chain. Missing parents are their own
/// issue kind.
pub fn validate_hierarchy(ledger: &Ledger, difficulty: Difficulty) -> HierarchyValidation {
    let mut issues = Vec::new();

    for dept in &ledger.departments {
        check_chain(EntityLevel::Department, dept, difficulty, &mut issues);
    }

    for class in ledger.classes.values() {
        check_chain(EntityLevel::Class, class, difficulty, &mut issues);
        check_linkage(
            EntityLevel::Class,
            class,
            "departmentId",
            |id| ledger.department(id),
            "department",
            &mut issues,
        );
    }

    for student in ledger.students.values() {
        check_chain(EntityLevel::Student, student, difficulty, &mut issues);
        check_linkage(
            EntityLevel::Student,
            student,
            "classId",
            |id| ledger.class(id),
            "class",
            &mut issues,
        );
    }

    let valid = issues.is_empty();
    if valid {
        info!(
            departments = ledger.departments.len(),
            classes = ledger.classes.len(),
            students = ledger.students.len(),
            "hierarchy validation passed"
        );
    } else {
        warn!(issues = issues.len(), "hierarchy validation found issues");
    }

    HierarchyValidation { valid, issues }
}

fn check_chain(
    level: EntityLevel,
    record: &EntityRecord,
    difficulty: Difficulty,
    issues: &mut Vec<LinkageIssue>,
) {
    let report = validate_chain(&record.chain, difficulty);
    if !report.valid {
        issues.push(LinkageIssue {
            entity_type: level,
            entity_id: record.id.clone(),
            reason: report.reason().to_string(),
        });
    }
}

/// A child's parent id is read from its genesis attributes (immutable once
/// mined), and the genesis `prev_hash` must be anchored somewhere in that
/// parent's chain.
fn check_linkage<'a, F>(
    level: EntityLevel,
    child: &EntityRecord,
    parent_key: &str,
    lookup_parent: F,
    parent_name: &str,
    issues: &mut Vec<LinkageIssue>,
) where
    F: Fn(&str) -> Option<&'a EntityRecord>,
{
    let genesis = match child.chain.first() {
        Some(block) => block,
        // empty chain was already reported by check_chain
        None => return,
    };

    let parent_id = genesis
        .transaction
        .genesis_meta()
        .and_then(|meta| meta.get(parent_key))
        .and_then(|v| v.as_str());

    let parent_id = match parent_id {
        Some(id) => id,
        None => {
            issues.push(LinkageIssue {
                entity_type: level,
                entity_id: child.id.clone(),
                reason: format!("genesis missing {} linkage attribute", parent_name),
            });
            return;
        }
    };

    let parent = match lookup_parent(parent_id) {
        Some(parent) => parent,
        None => {
            issues.push(LinkageIssue {
                entity_type: level,
                entity_id: child.id.clone(),
                reason: format!("parent {} missing", parent_name),
            });
            return;
        }
    };

    if !parent.chain.iter().any(|b| b.hash == genesis.prev_hash) {
        issues.push(LinkageIssue {
            entity_type: level,
            entity_id: child.id.clone(),
            reason: format!(
                "genesis prev_hash not anchored in parent {} chain",
                parent_name
            ),
        });
    }
}
