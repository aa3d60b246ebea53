use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for leave requests.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LeaveRequestId(pub String);

impl fmt::Display for LeaveRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for employees; the employee record itself is owned by an
/// external directory and only read here.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EmployeeId(pub String);

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Closed set of leave categories an application can be filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveType {
    Annual,
    Sick,
    Casual,
    Medical,
    Maternity,
}

impl LeaveType {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Annual,
            Self::Sick,
            Self::Casual,
            Self::Medical,
            Self::Maternity,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Annual => "annual",
            Self::Sick => "sick",
            Self::Casual => "casual",
            Self::Medical => "medical",
            Self::Maternity => "maternity",
        }
    }
}

/// Lifecycle of a leave request. `Approved`, `Rejected`, and `Withdrawn` are
/// terminal; no decision is accepted once one of them is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    Pending,
    Forwarded,
    Approved,
    Rejected,
    Withdrawn,
}

impl LeaveStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Forwarded => "forwarded",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Withdrawn)
    }
}

/// Roles that may appear in an approval chain, in no particular order; the
/// escalation order is whatever the submitted chain says it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApproverRole {
    Hod,
    Dean,
    Vc,
    Hr,
    President,
}

impl ApproverRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hod => "Head of Department",
            Self::Dean => "Dean",
            Self::Vc => "Vice Chancellor",
            Self::Hr => "HR",
            Self::President => "President",
        }
    }

    /// Parse a role from a URL path segment or similar external input.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hod" => Some(Self::Hod),
            "dean" => Some(Self::Dean),
            "vc" => Some(Self::Vc),
            "hr" => Some(Self::Hr),
            "president" => Some(Self::President),
            _ => None,
        }
    }
}

/// Per-step decision state inside an approval chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Approved,
    Rejected,
}

impl StepStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// One role-scoped decision point in the escalation chain. The decision
/// metadata is populated only when the step leaves `Pending`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalStep {
    pub role: ApproverRole,
    pub status: StepStatus,
    pub decided_by: Option<String>,
    pub decided_on: Option<DateTime<Utc>>,
    pub comment: Option<String>,
}

impl ApprovalStep {
    pub fn pending(role: ApproverRole) -> Self {
        Self {
            role,
            status: StepStatus::Pending,
            decided_by: None,
            decided_on: None,
            comment: None,
        }
    }
}

/// Pay classification a medical leave must carry before it can be finally
/// approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveCategory {
    MedicalPaid,
    MedicalUnpaid,
}

impl LeaveCategory {
    pub const fn label(self) -> &'static str {
        match self {
            Self::MedicalPaid => "medical-paid",
            Self::MedicalUnpaid => "medical-unpaid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    Probation,
    Confirmed,
}

/// Read-only employee snapshot supplied by the external directory. The leave
/// balance is carried for display; balance accounting happens elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub gender: Gender,
    pub employment_status: EmploymentStatus,
    pub leave_balance: BTreeMap<LeaveType, u32>,
}

/// Supporting evidence attached to a submission (medical certificates and the
/// like). Storage itself is external; only the pointer is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    pub name: String,
    pub storage_key: String,
}

/// A leave application moving through its approval chain.
///
/// `current_step` is the cursor of the single pending step while the request
/// is open; every step before it is approved and no step after it has been
/// touched. `days` is the inclusive day count of the requested window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: LeaveRequestId,
    pub employee_id: EmployeeId,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: u32,
    pub status: LeaveStatus,
    pub chain: Vec<ApprovalStep>,
    pub current_step: usize,
    pub paid_days: Option<u32>,
    pub unpaid_days: Option<u32>,
    pub category: Option<LeaveCategory>,
    pub reason: String,
    pub documents: Vec<DocumentDescriptor>,
    pub applied_on: NaiveDate,
}

impl LeaveRequest {
    /// The role whose turn it is, or `None` once the request is terminal.
    pub fn awaiting_role(&self) -> Option<ApproverRole> {
        if self.status.is_terminal() {
            return None;
        }
        self.chain.get(self.current_step).map(|step| step.role)
    }
}

/// Decision verb an approver can submit for their chain step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

/// Inbound payload for a new leave application. The approval chain is composed
/// by the surrounding organization policy and arrives ready-made; this core
/// consumes it but never derives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveSubmission {
    pub employee_id: EmployeeId,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    #[serde(default)]
    pub documents: Vec<DocumentDescriptor>,
    pub approval_chain: Vec<ApproverRole>,
}

/// Decision payload; the split fields are only honored when the acting role is
/// the final financial approver for the request's leave type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionPayload {
    pub decided_by: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub paid_days: Option<u32>,
    #[serde(default)]
    pub unpaid_days: Option<u32>,
    #[serde(default)]
    pub category: Option<LeaveCategory>,
}

/// Payload for the withdrawal flow, which bypasses the chain entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalPayload {
    pub withdrawn_by: String,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Submitted,
    Approved,
    Rejected,
    Withdrawn,
}

impl AuditAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
        }
    }
}

/// One line of a request's audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub action: AuditAction,
    pub role: Option<ApproverRole>,
    pub actor: String,
    pub at: DateTime<Utc>,
    pub comment: Option<String>,
}
