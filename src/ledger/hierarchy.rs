//! Hierarchy Registry
//!
//! The in-memory ledger: departments at the top, classes under departments,
//! students under classes. Creating a child snapshots the parent chain's
//! head hash into the child's genesis `prev_hash`; that linkage is a recorded
//! value, not a live pointer, so later parent appends never disturb it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

use crate::chain::{
    create_genesis_block, create_next_block, now_iso8601, AttendanceRecord, AttendanceStatus,
    Attributes, Block, MiningPolicy, Transaction, ROOT_HASH,
};
use crate::error::LedgerError;
use crate::ledger::entity::{EntityListing, EntityRecord};

/// Opaque entity identifier: prefix plus 128 random bits.
pub fn generate_id(prefix: &str) -> String {
    format!("{}{}", prefix, Uuid::new_v4().simple())
}

/// The whole hierarchy. Also the persisted snapshot shape; field names match
/// the original `data.json` layout so old snapshots load unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub departments: Vec<EntityRecord>,
    #[serde(rename = "classesIndex")]
    pub classes: BTreeMap<String, EntityRecord>,
    #[serde(rename = "studentsIndex")]
    pub students: BTreeMap<String, EntityRecord>,
}

impl Ledger {
    pub fn department(&self, id: &str) -> Option<&EntityRecord> {
        self.departments.iter().find(|d| d.id == id)
    }

    pub fn class(&self, id: &str) -> Option<&EntityRecord> {
        self.classes.get(id)
    }

    pub fn student(&self, id: &str) -> Option<&EntityRecord> {
        self.students.get(id)
    }

    /// Look an id up across all three levels.
    pub fn find(&self, id: &str) -> Option<(crate::ledger::EntityLevel, &EntityRecord)> {
        use crate::ledger::EntityLevel::*;
        self.department(id)
            .map(|r| (Department, r))
            .or_else(|| self.class(id).map(|r| (Class, r)))
            .or_else(|| self.student(id).map(|r| (Student, r)))
    }

    // ---- creation ----------------------------------------------------

    pub fn create_department(
        &mut self,
        name: &str,
        policy: &MiningPolicy,
    ) -> Result<String, LedgerError> {
        if name.trim().is_empty() {
            return Err(LedgerError::InvalidInput(
                "department name required".to_string(),
            ));
        }
        let id = generate_id("dept_");
        let meta = base_meta(&id, name, &[]);
        let genesis = create_genesis_block(
            Transaction::DepartmentMeta { meta: meta.clone() },
            ROOT_HASH,
            policy,
        )?;
        info!(department_id = %id, hash = %genesis.hash, "created department");
        self.departments.push(EntityRecord {
            id: id.clone(),
            chain: vec![genesis],
            meta,
        });
        Ok(id)
    }

    pub fn create_class(
        &mut self,
        dept_id: &str,
        name: Option<&str>,
        policy: &MiningPolicy,
    ) -> Result<String, LedgerError> {
        let parent_hash = self
            .department(dept_id)
            .and_then(EntityRecord::head)
            .map(|b| b.hash.clone())
            .ok_or_else(|| LedgerError::department_not_found(dept_id))?;

        let id = generate_id("class_");
        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| format!("Class {}", id));
        let meta = base_meta(&id, &name, &[("departmentId", dept_id)]);
        let genesis = create_genesis_block(
            Transaction::ClassMeta { meta: meta.clone() },
            &parent_hash,
            policy,
        )?;
        info!(class_id = %id, department_id = %dept_id, "created class");
        self.classes.insert(
            id.clone(),
            EntityRecord {
                id: id.clone(),
                chain: vec![genesis],
                meta,
            },
        );
        Ok(id)
    }

    pub fn create_student(
        &mut self,
        dept_id: &str,
        class_id: &str,
        name: Option<&str>,
        roll: Option<&str>,
        policy: &MiningPolicy,
    ) -> Result<String, LedgerError> {
        let parent_hash = self
            .class(class_id)
            .and_then(EntityRecord::head)
            .map(|b| b.hash.clone())
            .ok_or_else(|| LedgerError::class_not_found(class_id))?;

        let id = generate_id("stu_");
        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| format!("Student {}", id));
        let roll = roll
            .map(str::to_string)
            .unwrap_or_else(|| format!("R{}", id));
        let meta = base_meta(
            &id,
            &name,
            &[
                ("roll", &roll),
                ("departmentId", dept_id),
                ("classId", class_id),
            ],
        );
        let genesis = create_genesis_block(
            Transaction::StudentMeta { meta: meta.clone() },
            &parent_hash,
            policy,
        )?;
        info!(student_id = %id, class_id = %class_id, "created student");
        self.students.insert(
            id.clone(),
            EntityRecord {
                id: id.clone(),
                chain: vec![genesis],
                meta,
            },
        );
        Ok(id)
    }

    // ---- updates and soft deletes ------------------------------------

    pub fn update_department(
        &mut self,
        id: &str,
        update: Attributes,
        policy: &MiningPolicy,
    ) -> Result<Block, LedgerError> {
        let record = self
            .departments
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| LedgerError::department_not_found(id))?;
        let tx = Transaction::DepartmentUpdate {
            update,
            timestamp: now_iso8601(),
        };
        append_block(record, tx, policy)
    }

    pub fn update_class(
        &mut self,
        id: &str,
        update: Attributes,
        policy: &MiningPolicy,
    ) -> Result<Block, LedgerError> {
        let record = self
            .classes
            .get_mut(id)
            .ok_or_else(|| LedgerError::class_not_found(id))?;
        let tx = Transaction::ClassUpdate {
            update,
            timestamp: now_iso8601(),
        };
        append_block(record, tx, policy)
    }

    pub fn update_student(
        &mut self,
        id: &str,
        update: Attributes,
        policy: &MiningPolicy,
    ) -> Result<Block, LedgerError> {
        let record = self
            .students
            .get_mut(id)
            .ok_or_else(|| LedgerError::student_not_found(id))?;
        let tx = Transaction::StudentUpdate {
            update,
            timestamp: now_iso8601(),
        };
        append_block(record, tx, policy)
    }

    pub fn delete_department(
        &mut self,
        id: &str,
        policy: &MiningPolicy,
    ) -> Result<Block, LedgerError> {
        let record = self
            .departments
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| LedgerError::department_not_found(id))?;
        let tx = Transaction::DepartmentDeleted {
            status: "deleted".to_string(),
            timestamp: now_iso8601(),
        };
        append_block(record, tx, policy)
    }

    pub fn delete_class(&mut self, id: &str, policy: &MiningPolicy) -> Result<Block, LedgerError> {
        let record = self
            .classes
            .get_mut(id)
            .ok_or_else(|| LedgerError::class_not_found(id))?;
        let tx = Transaction::ClassDeleted {
            status: "deleted".to_string(),
            timestamp: now_iso8601(),
        };
        append_block(record, tx, policy)
    }

    pub fn delete_student(
        &mut self,
        id: &str,
        policy: &MiningPolicy,
    ) -> Result<Block, LedgerError> {
        let record = self
            .students
            .get_mut(id)
            .ok_or_else(|| LedgerError::student_not_found(id))?;
        let tx = Transaction::StudentDeleted {
            status: "deleted".to_string(),
            timestamp: now_iso8601(),
        };
        append_block(record, tx, policy)
    }

    // ---- attendance --------------------------------------------------

    pub fn mark_attendance(
        &mut self,
        student_id: &str,
        status: AttendanceStatus,
        policy: &MiningPolicy,
    ) -> Result<Block, LedgerError> {
        let record = self
            .students
            .get_mut(student_id)
            .ok_or_else(|| LedgerError::student_not_found(student_id))?;
        let tx = Transaction::Attendance(AttendanceRecord {
            student_id: record.id.clone(),
            student_name: record.attr("name").to_string(),
            roll: record.attr("roll").to_string(),
            department_id: record.attr("departmentId").to_string(),
            class_id: record.attr("classId").to_string(),
            status,
            timestamp: now_iso8601(),
        });
        append_block(record, tx, policy)
    }

    /// All attendance marks whose transaction timestamp falls on the given
    /// UTC calendar day.
    pub fn attendance_on(&self, day: NaiveDate) -> Vec<AttendanceRecord> {
        let prefix = day.format("%Y-%m-%d").to_string();
        self.attendance_records(|rec| rec.timestamp.starts_with(&prefix))
    }

    pub fn attendance_for_department(&self, dept_id: &str) -> Vec<AttendanceRecord> {
        self.attendance_records(|rec| rec.department_id == dept_id)
    }

    pub fn attendance_for_class(&self, class_id: &str) -> Vec<AttendanceRecord> {
        self.attendance_records(|rec| rec.class_id == class_id)
    }

    fn attendance_records<F>(&self, keep: F) -> Vec<AttendanceRecord>
    where
        F: Fn(&AttendanceRecord) -> bool,
    {
        let mut out = Vec::new();
        for student in self.students.values() {
            for block in &student.chain {
                if let Transaction::Attendance(rec) = &block.transaction {
                    if keep(rec) {
                        out.push(rec.clone());
                    }
                }
            }
        }
        out
    }

    // ---- listings ----------------------------------------------------

    pub fn department_listings(&self) -> Vec<EntityListing> {
        self.departments.iter().map(EntityListing::from).collect()
    }

    pub fn class_listings(&self, dept_id: &str) -> Vec<EntityListing> {
        self.classes
            .values()
            .filter(|c| c.attr("departmentId") == dept_id)
            .map(EntityListing::from)
            .collect()
    }

    pub fn student_listings(&self) -> Vec<EntityListing> {
        self.students.values().map(EntityListing::from).collect()
    }

    // ---- bootstrap ---------------------------------------------------

    /// Seed a fresh hierarchy: `departments` departments, each with
    /// `classes_per` classes of `students_per` students.
    pub fn seed(
        &mut self,
        departments: usize,
        classes_per: usize,
        students_per: usize,
        policy: &MiningPolicy,
    ) -> Result<(), LedgerError> {
        for d in 1..=departments {
            let dept_id = self.create_department(&format!("Department {}", d), policy)?;
            for c in 1..=classes_per {
                let class_id =
                    self.create_class(&dept_id, Some(&format!("Class {}", c)), policy)?;
                for s in 1..=students_per {
                    let roll = format!("{}{:03}", c, s);
                    self.create_student(
                        &dept_id,
                        &class_id,
                        Some(&format!("Student {}", s)),
                        Some(&roll),
                        policy,
                    )?;
                }
            }
        }
        info!(
            departments,
            classes_per, students_per, "seeded default hierarchy"
        );
        Ok(())
    }
}

/// Mine the next block for `record`'s chain, append it and refresh the
/// cached meta projection. The chain itself is never rewritten.
fn append_block(
    record: &mut EntityRecord,
    transaction: Transaction,
    policy: &MiningPolicy,
) -> Result<Block, LedgerError> {
    let head = record.head().ok_or_else(|| {
        LedgerError::Snapshot(format!("entity {} has an empty chain", record.id))
    })?;
    let block = create_next_block(head, transaction, policy)?;
    record.chain.push(block.clone());
    record.refresh_meta();
    Ok(block)
}

fn base_meta(id: &str, name: &str, extra: &[(&str, &str)]) -> Attributes {
    let mut meta = Attributes::new();
    meta.insert("id".to_string(), json!(id));
    meta.insert("name".to_string(), json!(name));
    for (key, value) in extra {
        meta.insert((*key).to_string(), Value::String((*value).to_string()));
    }
    meta.insert("created_at".to_string(), json!(now_iso8601()));
    meta
}
