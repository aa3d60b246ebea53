use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{ApproverRole, LeaveType};

/// Organizational policy naming, per leave type, the one role allowed to fix
/// the paid/unpaid split (and the pay category where one is required). The
/// approval chain itself is composed upstream and arrives with the submission;
/// this policy never derives chains, it only identifies the financial step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalPolicy {
    financial_approvers: BTreeMap<LeaveType, ApproverRole>,
}

impl ApprovalPolicy {
    pub fn new(financial_approvers: BTreeMap<LeaveType, ApproverRole>) -> Self {
        Self {
            financial_approvers,
        }
    }

    /// The role authorized to reconcile the day split for this leave type.
    pub fn financial_approver(&self, leave_type: LeaveType) -> ApproverRole {
        self.financial_approvers
            .get(&leave_type)
            .copied()
            .unwrap_or(ApproverRole::Dean)
    }

    /// Medical leave must be classified paid/unpaid before final approval.
    pub const fn requires_category(leave_type: LeaveType) -> bool {
        matches!(leave_type, LeaveType::Medical)
    }
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        let mut financial_approvers = BTreeMap::new();
        for leave_type in LeaveType::ordered() {
            financial_approvers.insert(leave_type, ApproverRole::Dean);
        }
        financial_approvers.insert(LeaveType::Medical, ApproverRole::President);
        Self {
            financial_approvers,
        }
    }
}
