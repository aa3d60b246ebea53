use serde::Serialize;

use super::domain::{Employee, EmploymentStatus, Gender, LeaveType};

/// Policy gates that block an approval outright. A blocked request can still
/// be rejected through the normal chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EligibilityBlock {
    #[error("maternity leave is limited to female employees")]
    MaternityRequiresFemale,
    #[error("maternity leave requires confirmed employment status")]
    MaternityRequiresConfirmed,
}

/// Decide whether `leave_type` may be approved for `employee`. Pure; safe to
/// call repeatedly, e.g. to render eligibility before a decision is submitted.
pub fn check(leave_type: LeaveType, employee: &Employee) -> Result<(), EligibilityBlock> {
    match leave_type {
        LeaveType::Maternity => {
            if employee.gender != Gender::Female {
                return Err(EligibilityBlock::MaternityRequiresFemale);
            }
            if employee.employment_status != EmploymentStatus::Confirmed {
                return Err(EligibilityBlock::MaternityRequiresConfirmed);
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// The same gate shaped for API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibilityView {
    pub eligible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

pub fn assess(leave_type: LeaveType, employee: &Employee) -> EligibilityView {
    match check(leave_type, employee) {
        Ok(()) => EligibilityView {
            eligible: true,
            reason: None,
        },
        Err(block) => EligibilityView {
            eligible: false,
            reason: Some(block.to_string()),
        },
    }
}
