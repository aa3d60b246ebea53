use chrono::{DateTime, Utc};

use super::domain::{ApproverRole, Decision, LeaveRequest, LeaveStatus, StepStatus};

/// Metadata recorded on a chain step when a decision lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepAction {
    pub decided_by: String,
    pub decided_on: DateTime<Utc>,
    pub comment: Option<String>,
}

/// The state change produced by one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainTransition {
    pub role: ApproverRole,
    pub step_index: usize,
    pub status: LeaveStatus,
}

impl ChainTransition {
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("no pending step for {}", .role.label())]
    NotActionable { role: ApproverRole },
}

/// True when the request is still open and it is `role`'s turn. The cursor
/// always points at the single pending step, so earlier steps are approved by
/// construction.
pub fn can_act(request: &LeaveRequest, role: ApproverRole) -> bool {
    if request.status.is_terminal() {
        return false;
    }
    matches!(
        request.chain.get(request.current_step),
        Some(step) if step.role == role && step.status == StepStatus::Pending
    )
}

/// Apply one decision to the chain.
///
/// Reject short-circuits: the acting step is marked, the request becomes
/// `Rejected`, and later steps are never visited. Approve marks the step and
/// either reaches `Approved` on the last step or forwards to the next one.
/// A role whose step already left `Pending` (or any action on a terminal
/// request) fails with `NotActionable`; there is no undo.
pub fn apply_decision(
    request: &mut LeaveRequest,
    role: ApproverRole,
    decision: Decision,
    action: StepAction,
) -> Result<ChainTransition, ChainError> {
    if !can_act(request, role) {
        return Err(ChainError::NotActionable { role });
    }

    let step_index = request.current_step;
    let is_last = step_index + 1 == request.chain.len();

    let step = &mut request.chain[step_index];
    step.decided_by = Some(action.decided_by);
    step.decided_on = Some(action.decided_on);
    step.comment = action.comment;

    match decision {
        Decision::Reject => {
            step.status = StepStatus::Rejected;
            request.status = LeaveStatus::Rejected;
        }
        Decision::Approve => {
            step.status = StepStatus::Approved;
            if is_last {
                request.status = LeaveStatus::Approved;
            } else {
                request.status = LeaveStatus::Forwarded;
                request.current_step += 1;
            }
        }
    }

    Ok(ChainTransition {
        role,
        step_index,
        status: request.status,
    })
}
