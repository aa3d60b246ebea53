use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use super::chain::{self, ChainError, StepAction};
use super::domain::{
    ApprovalStep, ApproverRole, AuditAction, AuditEntry, Decision, DecisionPayload, EmployeeId,
    LeaveRequest, LeaveRequestId, LeaveStatus, LeaveSubmission, LeaveType, WithdrawalPayload,
};
use super::eligibility::{self, EligibilityBlock};
use super::policy::ApprovalPolicy;
use super::reconciliation::{self, ReconciliationFailure};
use super::repository::{
    EmployeeDirectory, LeaveRecord, LeaveRepository, NotificationPublisher, RepositoryError,
    WorkflowNotice,
};

/// Workflow controller composing the eligibility gate, the reconciliation
/// validator, and the chain engine behind one narrow write path. Every
/// decision is a read-validate-write against a single record; the repository's
/// version check serializes concurrent approvers.
pub struct LeaveWorkflowService<R, E, N> {
    repository: Arc<R>,
    directory: Arc<E>,
    notifications: Arc<N>,
    policy: ApprovalPolicy,
}

static REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> LeaveRequestId {
    let id = REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    LeaveRequestId(format!("lr-{id:06}"))
}

/// How many times a losing read-validate-write is replayed before the
/// conflict is surfaced. One replay is normally enough: the reload observes
/// the winner's state and `can_act` settles the outcome.
const UPDATE_RETRY_LIMIT: usize = 3;

fn inclusive_days(start_date: NaiveDate, end_date: NaiveDate) -> Option<u32> {
    if end_date < start_date {
        return None;
    }
    let span = end_date.signed_duration_since(start_date).num_days() + 1;
    u32::try_from(span).ok()
}

impl<R, E, N> LeaveWorkflowService<R, E, N>
where
    R: LeaveRepository + 'static,
    E: EmployeeDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(
        repository: Arc<R>,
        directory: Arc<E>,
        notifications: Arc<N>,
        policy: ApprovalPolicy,
    ) -> Self {
        Self {
            repository,
            directory,
            notifications,
            policy,
        }
    }

    /// Register a new application. The chain arrives pre-composed; it is
    /// validated for shape (non-empty, no duplicate roles, contains the leave
    /// type's financial approver) but never re-derived.
    pub fn submit(&self, submission: LeaveSubmission) -> Result<LeaveRecord, WorkflowError> {
        let employee = self
            .directory
            .fetch(&submission.employee_id)?
            .ok_or_else(|| WorkflowError::EmployeeNotFound(submission.employee_id.clone()))?;

        let days = inclusive_days(submission.start_date, submission.end_date).ok_or(
            SubmissionError::InvalidDateRange {
                start_date: submission.start_date,
                end_date: submission.end_date,
            },
        )?;

        self.validate_chain(&submission.approval_chain, submission.leave_type)?;

        let request = LeaveRequest {
            id: next_request_id(),
            employee_id: submission.employee_id,
            leave_type: submission.leave_type,
            start_date: submission.start_date,
            end_date: submission.end_date,
            days,
            status: LeaveStatus::Pending,
            chain: submission
                .approval_chain
                .into_iter()
                .map(ApprovalStep::pending)
                .collect(),
            current_step: 0,
            paid_days: None,
            unpaid_days: None,
            category: None,
            reason: submission.reason,
            documents: submission.documents,
            applied_on: Utc::now().date_naive(),
        };

        let record = LeaveRecord {
            request,
            history: vec![AuditEntry {
                action: AuditAction::Submitted,
                role: None,
                actor: employee.name,
                at: Utc::now(),
                comment: None,
            }],
            version: 1,
        };

        let stored = self.repository.insert(record)?;
        Ok(stored)
    }

    /// Apply one approver decision, in order and short-circuiting on the
    /// first failure: load, `can_act`, eligibility (approve only),
    /// reconciliation (approve by the financial approver only), chain engine,
    /// persist, audit, notify. Recoverable failures leave the stored record
    /// untouched.
    pub fn submit_decision(
        &self,
        id: &LeaveRequestId,
        role: ApproverRole,
        decision: Decision,
        payload: DecisionPayload,
    ) -> Result<LeaveRecord, WorkflowError> {
        let mut attempts = 0;
        loop {
            let mut record = self
                .repository
                .fetch(id)?
                .ok_or_else(|| WorkflowError::RequestNotFound(id.clone()))?;
            let employee = self
                .directory
                .fetch(&record.request.employee_id)?
                .ok_or_else(|| {
                    WorkflowError::EmployeeNotFound(record.request.employee_id.clone())
                })?;

            if !chain::can_act(&record.request, role) {
                return Err(WorkflowError::NotYourTurn { role });
            }

            if decision == Decision::Approve {
                eligibility::check(record.request.leave_type, &employee)?;

                if role == self.policy.financial_approver(record.request.leave_type) {
                    let split = reconciliation::validate(
                        record.request.days,
                        payload.paid_days,
                        payload.unpaid_days,
                        payload.category,
                        ApprovalPolicy::requires_category(record.request.leave_type),
                    )?;
                    record.request.paid_days = Some(split.paid_days);
                    record.request.unpaid_days = Some(split.unpaid_days);
                    record.request.category = split.category;
                }
            }

            let now = Utc::now();
            let transition = chain::apply_decision(
                &mut record.request,
                role,
                decision,
                StepAction {
                    decided_by: payload.decided_by.clone(),
                    decided_on: now,
                    comment: payload.comment.clone(),
                },
            )?;
            record.history.push(AuditEntry {
                action: match decision {
                    Decision::Approve => AuditAction::Approved,
                    Decision::Reject => AuditAction::Rejected,
                },
                role: Some(role),
                actor: payload.decided_by.clone(),
                at: now,
                comment: payload.comment.clone(),
            });

            match self.repository.update(record) {
                Ok(updated) => {
                    self.notify(&updated, transition.status, Some(transition.role));
                    return Ok(updated);
                }
                Err(RepositoryError::Conflict) if attempts + 1 < UPDATE_RETRY_LIMIT => {
                    attempts += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Take a still-open request out of circulation. The chain engine knows
    /// nothing about withdrawal; steps keep whatever state they had.
    pub fn withdraw(
        &self,
        id: &LeaveRequestId,
        payload: WithdrawalPayload,
    ) -> Result<LeaveRecord, WorkflowError> {
        let mut attempts = 0;
        loop {
            let mut record = self
                .repository
                .fetch(id)?
                .ok_or_else(|| WorkflowError::RequestNotFound(id.clone()))?;

            if record.request.status.is_terminal() {
                return Err(WorkflowError::AlreadyFinal {
                    status: record.request.status,
                });
            }

            record.request.status = LeaveStatus::Withdrawn;
            record.history.push(AuditEntry {
                action: AuditAction::Withdrawn,
                role: None,
                actor: payload.withdrawn_by.clone(),
                at: Utc::now(),
                comment: payload.comment.clone(),
            });

            match self.repository.update(record) {
                Ok(updated) => {
                    self.notify(&updated, LeaveStatus::Withdrawn, None);
                    return Ok(updated);
                }
                Err(RepositoryError::Conflict) if attempts + 1 < UPDATE_RETRY_LIMIT => {
                    attempts += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Fetch a request and current status for API responses.
    pub fn get(&self, id: &LeaveRequestId) -> Result<LeaveRecord, WorkflowError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| WorkflowError::RequestNotFound(id.clone()))
    }

    /// The audit trail of a request, oldest entry first.
    pub fn history(&self, id: &LeaveRequestId) -> Result<Vec<AuditEntry>, WorkflowError> {
        Ok(self.get(id)?.history)
    }

    /// Requests currently waiting on `role`.
    pub fn queue_for_role(
        &self,
        role: ApproverRole,
        limit: usize,
    ) -> Result<Vec<LeaveRecord>, WorkflowError> {
        Ok(self.repository.pending_for_role(role, limit)?)
    }

    /// What `role` could do with this request right now. A client-side
    /// convenience only; `submit_decision` re-validates regardless.
    pub fn actions(
        &self,
        id: &LeaveRequestId,
        role: ApproverRole,
    ) -> Result<ActionAvailability, WorkflowError> {
        let record = self.get(id)?;
        let employee = self
            .directory
            .fetch(&record.request.employee_id)?
            .ok_or_else(|| WorkflowError::EmployeeNotFound(record.request.employee_id.clone()))?;

        let eligibility = eligibility::assess(record.request.leave_type, &employee);
        Ok(ActionAvailability {
            can_act: chain::can_act(&record.request, role),
            eligible: eligibility.eligible,
            reason: eligibility.reason,
        })
    }

    fn validate_chain(
        &self,
        roles: &[ApproverRole],
        leave_type: LeaveType,
    ) -> Result<(), SubmissionError> {
        if roles.is_empty() {
            return Err(SubmissionError::EmptyChain);
        }
        let mut seen: Vec<ApproverRole> = Vec::with_capacity(roles.len());
        for role in roles {
            if seen.contains(role) {
                return Err(SubmissionError::DuplicateRole(*role));
            }
            seen.push(*role);
        }
        let financial = self.policy.financial_approver(leave_type);
        if !roles.contains(&financial) {
            return Err(SubmissionError::MissingFinancialApprover {
                leave_type,
                role: financial,
            });
        }
        Ok(())
    }

    /// Fire-and-forget: a publisher failure is logged and never unwinds a
    /// persisted decision.
    fn notify(&self, record: &LeaveRecord, status: LeaveStatus, role: Option<ApproverRole>) {
        let template = match status {
            LeaveStatus::Forwarded => "leave_forwarded",
            LeaveStatus::Approved => "leave_approved",
            LeaveStatus::Rejected => "leave_rejected",
            LeaveStatus::Withdrawn => "leave_withdrawn",
            LeaveStatus::Pending => return,
        };

        let mut details = BTreeMap::new();
        details.insert("status".to_string(), status.label().to_string());
        details.insert(
            "employee_id".to_string(),
            record.request.employee_id.0.clone(),
        );
        if let Some(role) = role {
            details.insert("role".to_string(), role.label().to_string());
        }
        if let Some(awaiting) = record.request.awaiting_role() {
            details.insert("awaiting".to_string(), awaiting.label().to_string());
        }

        let notice = WorkflowNotice {
            template: template.to_string(),
            request_id: record.request.id.clone(),
            details,
        };
        if let Err(err) = self.notifications.publish(notice) {
            tracing::warn!(
                error = %err,
                request_id = %record.request.id,
                "failed to publish workflow notice"
            );
        }
    }
}

/// Per-role action surface for UI gating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionAvailability {
    pub can_act: bool,
    pub eligible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Shape problems in an inbound submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("end date {end_date} precedes start date {start_date}")]
    InvalidDateRange {
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    #[error("approval chain is empty")]
    EmptyChain,
    #[error("approval chain lists {} more than once", .0.label())]
    DuplicateRole(ApproverRole),
    #[error("{} chain is missing its financial approver {}", .leave_type.label(), .role.label())]
    MissingFinancialApprover {
        leave_type: LeaveType,
        role: ApproverRole,
    },
}

/// Error raised by the workflow controller.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error("leave request {0} not found")]
    RequestNotFound(LeaveRequestId),
    #[error("employee {0} not found")]
    EmployeeNotFound(EmployeeId),
    #[error("no action available for {}", .role.label())]
    NotYourTurn { role: ApproverRole },
    #[error("request is already {}", .status.label())]
    AlreadyFinal { status: LeaveStatus },
    #[error(transparent)]
    Ineligible(#[from] EligibilityBlock),
    #[error(transparent)]
    Reconciliation(#[from] ReconciliationFailure),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<ChainError> for WorkflowError {
    fn from(value: ChainError) -> Self {
        match value {
            ChainError::NotActionable { role } => Self::NotYourTurn { role },
        }
    }
}
