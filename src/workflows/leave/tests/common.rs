use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::workflows::leave::domain::{
    ApprovalStep, ApproverRole, DecisionPayload, DocumentDescriptor, Employee, EmployeeId,
    EmploymentStatus, Gender, LeaveCategory, LeaveRequest, LeaveRequestId, LeaveStatus,
    LeaveSubmission, LeaveType, StepStatus,
};
use crate::workflows::leave::policy::ApprovalPolicy;
use crate::workflows::leave::repository::{
    LeaveRecord, LeaveRepository, MemoryEmployeeDirectory, MemoryLeaveRepository,
    NotificationError, NotificationPublisher, RepositoryError, WorkflowNotice,
};
use crate::workflows::leave::service::LeaveWorkflowService;

pub(super) type TestService =
    LeaveWorkflowService<MemoryLeaveRepository, MemoryEmployeeDirectory, MemoryNotifications>;

pub(super) fn employee(
    id: &str,
    name: &str,
    gender: Gender,
    employment_status: EmploymentStatus,
) -> Employee {
    let mut leave_balance = BTreeMap::new();
    leave_balance.insert(LeaveType::Annual, 18);
    leave_balance.insert(LeaveType::Sick, 10);
    leave_balance.insert(LeaveType::Medical, 20);
    leave_balance.insert(LeaveType::Maternity, 120);

    Employee {
        id: EmployeeId(id.to_string()),
        name: name.to_string(),
        gender,
        employment_status,
        leave_balance,
    }
}

pub(super) fn confirmed_female() -> Employee {
    employee(
        "staff-01",
        "Rehana Akter",
        Gender::Female,
        EmploymentStatus::Confirmed,
    )
}

pub(super) fn confirmed_male() -> Employee {
    employee(
        "staff-02",
        "Imran Hossain",
        Gender::Male,
        EmploymentStatus::Confirmed,
    )
}

pub(super) fn probation_female() -> Employee {
    employee(
        "staff-03",
        "Sharmin Sultana",
        Gender::Female,
        EmploymentStatus::Probation,
    )
}

/// Five-day medical leave routed hod -> dean -> president; the president is
/// the financial approver for medical leave under the default policy.
pub(super) fn medical_submission(employee_id: &EmployeeId) -> LeaveSubmission {
    LeaveSubmission {
        employee_id: employee_id.clone(),
        leave_type: LeaveType::Medical,
        start_date: NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date"),
        end_date: NaiveDate::from_ymd_opt(2026, 3, 6).expect("valid date"),
        reason: "Post-surgery recovery".to_string(),
        documents: vec![DocumentDescriptor {
            name: "Medical certificate".to_string(),
            storage_key: "s3://leaveflow/docs/certificate.pdf".to_string(),
        }],
        approval_chain: vec![
            ApproverRole::Hod,
            ApproverRole::Dean,
            ApproverRole::President,
        ],
    }
}

/// Three-day annual leave routed hod -> dean -> hr.
pub(super) fn annual_submission(employee_id: &EmployeeId) -> LeaveSubmission {
    LeaveSubmission {
        employee_id: employee_id.clone(),
        leave_type: LeaveType::Annual,
        start_date: NaiveDate::from_ymd_opt(2026, 4, 6).expect("valid date"),
        end_date: NaiveDate::from_ymd_opt(2026, 4, 8).expect("valid date"),
        reason: "Family visit".to_string(),
        documents: Vec::new(),
        approval_chain: vec![ApproverRole::Hod, ApproverRole::Dean, ApproverRole::Hr],
    }
}

pub(super) fn maternity_submission(employee_id: &EmployeeId) -> LeaveSubmission {
    LeaveSubmission {
        employee_id: employee_id.clone(),
        leave_type: LeaveType::Maternity,
        start_date: NaiveDate::from_ymd_opt(2026, 5, 4).expect("valid date"),
        end_date: NaiveDate::from_ymd_opt(2026, 8, 28).expect("valid date"),
        reason: "Maternity leave".to_string(),
        documents: Vec::new(),
        approval_chain: vec![ApproverRole::Hod, ApproverRole::Dean],
    }
}

/// Bare open request for driving the chain engine without the service.
pub(super) fn open_request(roles: &[ApproverRole]) -> LeaveRequest {
    LeaveRequest {
        id: LeaveRequestId("lr-chain-01".to_string()),
        employee_id: EmployeeId("staff-01".to_string()),
        leave_type: LeaveType::Annual,
        start_date: NaiveDate::from_ymd_opt(2026, 4, 6).expect("valid date"),
        end_date: NaiveDate::from_ymd_opt(2026, 4, 8).expect("valid date"),
        days: 3,
        status: LeaveStatus::Pending,
        chain: roles.iter().copied().map(ApprovalStep::pending).collect(),
        current_step: 0,
        paid_days: None,
        unpaid_days: None,
        category: None,
        reason: "Family visit".to_string(),
        documents: Vec::new(),
        applied_on: NaiveDate::from_ymd_opt(2026, 3, 30).expect("valid date"),
    }
}

pub(super) fn approval_payload(decided_by: &str) -> DecisionPayload {
    DecisionPayload {
        decided_by: decided_by.to_string(),
        comment: None,
        paid_days: None,
        unpaid_days: None,
        category: None,
    }
}

pub(super) fn split_payload(
    decided_by: &str,
    paid_days: u32,
    unpaid_days: u32,
    category: Option<LeaveCategory>,
) -> DecisionPayload {
    DecisionPayload {
        decided_by: decided_by.to_string(),
        comment: None,
        paid_days: Some(paid_days),
        unpaid_days: Some(unpaid_days),
        category,
    }
}

pub(super) fn build_service() -> (
    TestService,
    Arc<MemoryLeaveRepository>,
    Arc<MemoryNotifications>,
) {
    let repository = Arc::new(MemoryLeaveRepository::default());
    let directory = Arc::new(MemoryEmployeeDirectory::default());
    directory.upsert(confirmed_female());
    directory.upsert(confirmed_male());
    directory.upsert(probation_female());
    let notifications = Arc::new(MemoryNotifications::default());
    let service = LeaveWorkflowService::new(
        repository.clone(),
        directory,
        notifications.clone(),
        ApprovalPolicy::default(),
    );
    (service, repository, notifications)
}

/// Scan-based validation of the cursor model: everything before the cursor is
/// approved and nothing after the acted region has been touched.
pub(super) fn assert_chain_consistent(request: &LeaveRequest) {
    if !request.status.is_terminal() {
        assert!(
            request.current_step < request.chain.len(),
            "cursor {} out of range for chain of {}",
            request.current_step,
            request.chain.len()
        );
        let first_pending = request
            .chain
            .iter()
            .position(|step| step.status == StepStatus::Pending)
            .expect("open request has a pending step");
        assert_eq!(
            request.current_step, first_pending,
            "cursor must point at the first pending step"
        );
        assert_eq!(
            request.chain[request.current_step].status,
            StepStatus::Pending
        );
    }

    for step in &request.chain[..request.current_step.min(request.chain.len())] {
        assert_eq!(step.status, StepStatus::Approved, "prefix must be approved");
    }

    for step in request
        .chain
        .iter()
        .skip_while(|step| step.status != StepStatus::Pending)
    {
        if step.status == StepStatus::Pending {
            assert!(
                step.decided_by.is_none() && step.decided_on.is_none() && step.comment.is_none(),
                "untouched steps must carry no decision metadata"
            );
        }
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifications {
    events: Mutex<Vec<WorkflowNotice>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<WorkflowNotice> {
        self.events.lock().expect("notice mutex poisoned").clone()
    }
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, notice: WorkflowNotice) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notice mutex poisoned")
            .push(notice);
        Ok(())
    }
}

/// Publisher that always fails, for asserting fire-and-forget semantics.
pub(super) struct FailingNotifications;

impl NotificationPublisher for FailingNotifications {
    fn publish(&self, _notice: WorkflowNotice) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp offline".to_string()))
    }
}

/// Repository wrapper that fails the first `failures` updates with `Conflict`
/// to exercise the service's optimistic retry.
pub(super) struct FlakyRepository {
    inner: MemoryLeaveRepository,
    failures: Mutex<usize>,
}

impl FlakyRepository {
    pub(super) fn failing(failures: usize) -> Self {
        Self {
            inner: MemoryLeaveRepository::default(),
            failures: Mutex::new(failures),
        }
    }
}

impl LeaveRepository for FlakyRepository {
    fn insert(&self, record: LeaveRecord) -> Result<LeaveRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn update(&self, record: LeaveRecord) -> Result<LeaveRecord, RepositoryError> {
        let mut remaining = self.failures.lock().expect("failure counter poisoned");
        if *remaining > 0 {
            *remaining -= 1;
            return Err(RepositoryError::Conflict);
        }
        drop(remaining);
        self.inner.update(record)
    }

    fn fetch(&self, id: &LeaveRequestId) -> Result<Option<LeaveRecord>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn pending_for_role(
        &self,
        role: ApproverRole,
        limit: usize,
    ) -> Result<Vec<LeaveRecord>, RepositoryError> {
        self.inner.pending_for_role(role, limit)
    }
}
