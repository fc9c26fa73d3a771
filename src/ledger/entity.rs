//! Entity Records and Meta Projection
//!
//! An entity's `meta` is a cache over its chain: the genesis payload is the
//! base, each update merges on top, a delete marks `status = deleted`. The
//! projection is a pure fold so the cache is always re-derivable.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::chain::{Attributes, Block, Transaction};

/// Hierarchy level of an entity record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityLevel {
    Department,
    Class,
    Student,
}

impl fmt::Display for EntityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Department => "department",
            Self::Class => "class",
            Self::Student => "student",
        };
        write!(f, "{}", s)
    }
}

/// One entity (department, class or student): its chain plus the cached
/// meta projection. Same shape at every hierarchy level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: String,
    pub chain: Vec<Block>,
    pub meta: Attributes,
}

impl EntityRecord {
    pub fn head(&self) -> Option<&Block> {
        self.chain.last()
    }

    /// Recompute the cached meta from the chain. Called after every append;
    /// the chain stays the single source of truth.
    pub fn refresh_meta(&mut self) {
        self.meta = project_meta(&self.chain);
    }

    pub fn is_deleted(&self) -> bool {
        self.meta.get("status").and_then(Value::as_str) == Some("deleted")
    }

    /// Projected string attribute, empty if absent.
    pub fn attr(&self, key: &str) -> &str {
        self.meta.get(key).and_then(Value::as_str).unwrap_or("")
    }
}

/// Summary row for listings: projected meta plus the chain head hash.
#[derive(Debug, Clone, Serialize)]
pub struct EntityListing {
    pub id: String,
    pub meta: Attributes,
    pub latest_hash: String,
}

impl From<&EntityRecord> for EntityListing {
    fn from(record: &EntityRecord) -> Self {
        Self {
            id: record.id.clone(),
            meta: record.meta.clone(),
            latest_hash: record
                .head()
                .map(|b| b.hash.clone())
                .unwrap_or_default(),
        }
    }
}

/// Fold a chain into the entity's current attribute view.
///
/// Attendance blocks never touch meta; they are events, not edits.
pub fn project_meta(chain: &[Block]) -> Attributes {
    let mut meta = Attributes::new();
    for block in chain {
        match &block.transaction {
            Transaction::DepartmentMeta { meta: base }
            | Transaction::ClassMeta { meta: base }
            | Transaction::StudentMeta { meta: base } => {
                meta = base.clone();
            }
            Transaction::DepartmentUpdate { update, timestamp }
            | Transaction::ClassUpdate { update, timestamp }
            | Transaction::StudentUpdate { update, timestamp } => {
                for (key, value) in update {
                    meta.insert(key.clone(), value.clone());
                }
                meta.insert("updated_at".to_string(), Value::String(timestamp.clone()));
            }
            Transaction::DepartmentDeleted { status, timestamp }
            | Transaction::ClassDeleted { status, timestamp }
            | Transaction::StudentDeleted { status, timestamp } => {
                meta.insert("status".to_string(), Value::String(status.clone()));
                meta.insert("deleted_at".to_string(), Value::String(timestamp.clone()));
            }
            Transaction::Attendance(_) => {}
        }
    }
    meta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{create_genesis_block, create_next_block, MiningPolicy, ROOT_HASH};
    use serde_json::json;

    fn policy() -> MiningPolicy {
        MiningPolicy::with_difficulty(1)
    }

    fn genesis_chain() -> Vec<Block> {
        let mut meta = Attributes::new();
        meta.insert("id".into(), json!("stu_1"));
        meta.insert("name".into(), json!("Student 1"));
        meta.insert("roll".into(), json!("1001"));
        let genesis =
            create_genesis_block(Transaction::StudentMeta { meta }, ROOT_HASH, &policy()).unwrap();
        vec![genesis]
    }

    #[test]
    fn test_projection_starts_from_genesis_meta() {
        let chain = genesis_chain();
        let meta = project_meta(&chain);
        assert_eq!(meta["name"], "Student 1");
        assert_eq!(meta["roll"], "1001");
    }

    #[test]
    fn test_updates_merge_in_order() {
        let mut chain = genesis_chain();

        let mut first = Attributes::new();
        first.insert("name".into(), json!("Renamed Student"));
        let block = create_next_block(
            chain.last().unwrap(),
            Transaction::StudentUpdate {
                update: first,
                timestamp: "2026-02-01T00:00:00.000Z".into(),
            },
            &policy(),
        )
        .unwrap();
        chain.push(block);

        let mut second = Attributes::new();
        second.insert("roll".into(), json!("2002"));
        let block = create_next_block(
            chain.last().unwrap(),
            Transaction::StudentUpdate {
                update: second,
                timestamp: "2026-02-02T00:00:00.000Z".into(),
            },
            &policy(),
        )
        .unwrap();
        chain.push(block);

        let meta = project_meta(&chain);
        assert_eq!(meta["name"], "Renamed Student");
        assert_eq!(meta["roll"], "2002");
        assert_eq!(meta["updated_at"], "2026-02-02T00:00:00.000Z");
    }

    #[test]
    fn test_soft_delete_marks_status_without_erasing_history() {
        let mut chain = genesis_chain();
        let block = create_next_block(
            chain.last().unwrap(),
            Transaction::StudentDeleted {
                status: "deleted".into(),
                timestamp: "2026-03-01T00:00:00.000Z".into(),
            },
            &policy(),
        )
        .unwrap();
        chain.push(block);

        let meta = project_meta(&chain);
        assert_eq!(meta["status"], "deleted");
        assert_eq!(meta["name"], "Student 1");
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_attendance_blocks_do_not_affect_meta() {
        let mut chain = genesis_chain();
        let record = crate::chain::AttendanceRecord {
            student_id: "stu_1".into(),
            student_name: "Student 1".into(),
            roll: "1001".into(),
            department_id: "dept_1".into(),
            class_id: "class_1".into(),
            status: crate::chain::AttendanceStatus::Present,
            timestamp: "2026-02-01T08:00:00.000Z".into(),
        };
        let block = create_next_block(
            chain.last().unwrap(),
            Transaction::Attendance(record),
            &policy(),
        )
        .unwrap();
        chain.push(block);

        let before = project_meta(&chain[..1]);
        let after = project_meta(&chain);
        assert_eq!(before, after);
    }
}
