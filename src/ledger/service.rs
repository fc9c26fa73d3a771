//! Ledger Service
//!
//! Owns the ledger context, the snapshot store and the mining policy. Every
//! mutation runs as: stage (mine + append on a blocking worker) -> persist
//! the staged snapshot -> commit in memory. If the persist fails the staged
//! state is discarded, so the in-memory ledger never gets ahead of disk.
//!
//! Mutations take `&mut self`; that exclusive borrow is the critical section
//! that prevents two concurrent mutations from mining against the same head.

use tracing::{info, warn};

use crate::chain::{AttendanceStatus, Attributes, Block, Difficulty, MiningPolicy};
use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::ledger::hierarchy::Ledger;
use crate::storage::SnapshotStore;
use crate::validation::{validate_hierarchy, HierarchyValidation};

pub struct LedgerService {
    ledger: Ledger,
    store: SnapshotStore,
    policy: MiningPolicy,
}

impl LedgerService {
    /// Load the snapshot at the configured path, or start empty if absent.
    pub fn open(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let store = SnapshotStore::new(&config.data_path);
        let ledger = match store.load()? {
            Some(ledger) => {
                info!(
                    departments = ledger.departments.len(),
                    classes = ledger.classes.len(),
                    students = ledger.students.len(),
                    "loaded ledger snapshot"
                );
                ledger
            }
            None => {
                info!(path = %config.data_path.display(), "no snapshot found, starting empty");
                Ledger::default()
            }
        };
        Ok(Self {
            ledger,
            store,
            policy: MiningPolicy {
                difficulty: Difficulty(config.difficulty),
                max_iterations: config.mining_budget,
            },
        })
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn policy(&self) -> MiningPolicy {
        self.policy
    }

    /// Validate every chain and every cross-level linkage.
    pub fn validate(&self) -> HierarchyValidation {
        validate_hierarchy(&self.ledger, self.policy.difficulty)
    }

    // ---- mutations ---------------------------------------------------

    pub async fn create_department(&mut self, name: String) -> Result<String, LedgerError> {
        self.commit(move |ledger, policy| ledger.create_department(&name, policy))
            .await
    }

    pub async fn create_class(
        &mut self,
        dept_id: String,
        name: Option<String>,
    ) -> Result<String, LedgerError> {
        self.commit(move |ledger, policy| ledger.create_class(&dept_id, name.as_deref(), policy))
            .await
    }

    pub async fn create_student(
        &mut self,
        dept_id: String,
        class_id: String,
        name: Option<String>,
        roll: Option<String>,
    ) -> Result<String, LedgerError> {
        self.commit(move |ledger, policy| {
            ledger.create_student(&dept_id, &class_id, name.as_deref(), roll.as_deref(), policy)
        })
        .await
    }

    pub async fn update_department(
        &mut self,
        id: String,
        update: Attributes,
    ) -> Result<Block, LedgerError> {
        self.commit(move |ledger, policy| ledger.update_department(&id, update, policy))
            .await
    }

    pub async fn update_class(
        &mut self,
        id: String,
        update: Attributes,
    ) -> Result<Block, LedgerError> {
        self.commit(move |ledger, policy| ledger.update_class(&id, update, policy))
            .await
    }

    pub async fn update_student(
        &mut self,
        id: String,
        update: Attributes,
    ) -> Result<Block, LedgerError> {
        self.commit(move |ledger, policy| ledger.update_student(&id, update, policy))
            .await
    }

    pub async fn delete_department(&mut self, id: String) -> Result<Block, LedgerError> {
        self.commit(move |ledger, policy| ledger.delete_department(&id, policy))
            .await
    }

    pub async fn delete_class(&mut self, id: String) -> Result<Block, LedgerError> {
        self.commit(move |ledger, policy| ledger.delete_class(&id, policy))
            .await
    }

    pub async fn delete_student(&mut self, id: String) -> Result<Block, LedgerError> {
        self.commit(move |ledger, policy| ledger.delete_student(&id, policy))
            .await
    }

    pub async fn mark_attendance(
        &mut self,
        student_id: String,
        status: AttendanceStatus,
    ) -> Result<Block, LedgerError> {
        self.commit(move |ledger, policy| ledger.mark_attendance(&student_id, status, policy))
            .await
    }

    pub async fn seed(
        &mut self,
        departments: usize,
        classes_per: usize,
        students_per: usize,
    ) -> Result<(), LedgerError> {
        self.commit(move |ledger, policy| {
            ledger.seed(departments, classes_per, students_per, policy)
        })
        .await
    }

    /// Run `op` against a staged copy of the ledger on a blocking worker
    /// (mining is CPU-bound), persist the staged snapshot, then commit it.
    async fn commit<T, F>(&mut self, op: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut Ledger, &MiningPolicy) -> Result<T, LedgerError> + Send + 'static,
        T: Send + 'static,
    {
        let mut staged = self.ledger.clone();
        let policy = self.policy;
        let (staged, result) = tokio::task::spawn_blocking(move || {
            let result = op(&mut staged, &policy);
            (staged, result)
        })
        .await
        .map_err(|e| LedgerError::Storage(format!("mining worker failed: {}", e)))?;

        let value = result?;
        match self.store.save(&staged) {
            Ok(()) => {
                self.ledger = staged;
                Ok(value)
            }
            Err(err) => {
                warn!(error = %err, "snapshot persist failed, discarding staged mutation");
                Err(err)
            }
        }
    }
}
