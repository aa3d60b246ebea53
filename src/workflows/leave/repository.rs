use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::domain::{
    ApproverRole, AuditEntry, Employee, EmployeeId, LeaveRequest, LeaveRequestId,
};

/// Repository unit: the request plus its audit trail and the version backing
/// optimistic concurrency. `version` increases by one on every stored update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRecord {
    pub request: LeaveRequest,
    pub history: Vec<AuditEntry>,
    pub version: u64,
}

impl LeaveRecord {
    pub fn status_view(&self) -> LeaveStatusView {
        LeaveStatusView {
            request_id: self.request.id.clone(),
            employee_id: self.request.employee_id.clone(),
            leave_type: self.request.leave_type.label(),
            status: self.request.status.label(),
            days: self.request.days,
            awaiting: self.request.awaiting_role().map(ApproverRole::label),
            paid_days: self.request.paid_days,
            unpaid_days: self.request.unpaid_days,
            category: self.request.category.map(|category| category.label()),
        }
    }
}

/// Storage abstraction so the service module can be exercised in isolation.
/// `update` is an optimistic write: it fails with `Conflict` unless the stored
/// version still matches the version the record was read at.
pub trait LeaveRepository: Send + Sync {
    fn insert(&self, record: LeaveRecord) -> Result<LeaveRecord, RepositoryError>;
    fn update(&self, record: LeaveRecord) -> Result<LeaveRecord, RepositoryError>;
    fn fetch(&self, id: &LeaveRequestId) -> Result<Option<LeaveRecord>, RepositoryError>;
    fn pending_for_role(
        &self,
        role: ApproverRole,
        limit: usize,
    ) -> Result<Vec<LeaveRecord>, RepositoryError>;
}

/// Read-only view into the external employee store.
pub trait EmployeeDirectory: Send + Sync {
    fn fetch(&self, id: &EmployeeId) -> Result<Option<Employee>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record was created or modified concurrently")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Trait describing outbound notification hooks. The core only announces
/// forwarded and terminal transitions; delivery belongs to the surrounding
/// application.
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notice: WorkflowNotice) -> Result<(), NotificationError>;
}

/// Notice payload so routes/tests can assert integration boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowNotice {
    pub template: String,
    pub request_id: LeaveRequestId,
    pub details: BTreeMap<String, String>,
}

/// Notice dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Sanitized representation of a request's exposed status.
#[derive(Debug, Clone, Serialize)]
pub struct LeaveStatusView {
    pub request_id: LeaveRequestId,
    pub employee_id: EmployeeId,
    pub leave_type: &'static str,
    pub status: &'static str,
    pub days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awaiting: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unpaid_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<&'static str>,
}

/// In-memory repository used by the binary and as the default test double.
#[derive(Debug, Default)]
pub struct MemoryLeaveRepository {
    records: Mutex<BTreeMap<LeaveRequestId, LeaveRecord>>,
}

impl MemoryLeaveRepository {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<LeaveRequestId, LeaveRecord>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

impl LeaveRepository for MemoryLeaveRepository {
    fn insert(&self, record: LeaveRecord) -> Result<LeaveRecord, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.contains_key(&record.request.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.request.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: LeaveRecord) -> Result<LeaveRecord, RepositoryError> {
        let mut guard = self.lock()?;
        let stored = guard
            .get(&record.request.id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.version != record.version {
            return Err(RepositoryError::Conflict);
        }
        let mut next = record;
        next.version += 1;
        guard.insert(next.request.id.clone(), next.clone());
        Ok(next)
    }

    fn fetch(&self, id: &LeaveRequestId) -> Result<Option<LeaveRecord>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.get(id).cloned())
    }

    fn pending_for_role(
        &self,
        role: ApproverRole,
        limit: usize,
    ) -> Result<Vec<LeaveRecord>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard
            .values()
            .filter(|record| record.request.awaiting_role() == Some(role))
            .take(limit)
            .cloned()
            .collect())
    }
}

/// In-memory employee directory; stands in for the external employee store.
#[derive(Debug, Default)]
pub struct MemoryEmployeeDirectory {
    employees: Mutex<BTreeMap<EmployeeId, Employee>>,
}

impl MemoryEmployeeDirectory {
    pub fn upsert(&self, employee: Employee) {
        if let Ok(mut guard) = self.employees.lock() {
            guard.insert(employee.id.clone(), employee);
        }
    }
}

impl EmployeeDirectory for MemoryEmployeeDirectory {
    fn fetch(&self, id: &EmployeeId) -> Result<Option<Employee>, RepositoryError> {
        let guard = self
            .employees
            .lock()
            .map_err(|_| RepositoryError::Unavailable("directory mutex poisoned".to_string()))?;
        Ok(guard.get(id).cloned())
    }
}

/// Publisher that records transitions in the log stream only. Used by the
/// binary, where actual delivery is the surrounding application's job.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotificationPublisher;

impl NotificationPublisher for LogNotificationPublisher {
    fn publish(&self, notice: WorkflowNotice) -> Result<(), NotificationError> {
        tracing::info!(
            template = %notice.template,
            request_id = %notice.request_id,
            "workflow notice"
        );
        Ok(())
    }
}
