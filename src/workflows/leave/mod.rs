//! Leave-request approval workflow: chain engine, eligibility and
//! reconciliation validators, and the controller that routes an application
//! through its ordered chain of approvers to a terminal state.

pub(crate) mod chain;
pub mod domain;
pub(crate) mod eligibility;
pub mod policy;
pub(crate) mod reconciliation;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ApprovalStep, ApproverRole, AuditAction, AuditEntry, Decision, DecisionPayload,
    DocumentDescriptor, Employee, EmployeeId, EmploymentStatus, Gender, LeaveCategory,
    LeaveRequest, LeaveRequestId, LeaveStatus, LeaveSubmission, LeaveType, StepStatus,
    WithdrawalPayload,
};
pub use eligibility::{EligibilityBlock, EligibilityView};
pub use policy::ApprovalPolicy;
pub use reconciliation::{ReconciliationFailure, ReconciliationViolation};
pub use repository::{
    EmployeeDirectory, LeaveRecord, LeaveRepository, LeaveStatusView, LogNotificationPublisher,
    MemoryEmployeeDirectory, MemoryLeaveRepository, NotificationError, NotificationPublisher,
    RepositoryError, WorkflowNotice,
};
pub use router::leave_router;
pub use service::{
    ActionAvailability, LeaveWorkflowService, SubmissionError, WorkflowError,
};
