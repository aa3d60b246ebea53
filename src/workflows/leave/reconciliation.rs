use std::fmt;

use super::domain::LeaveCategory;

/// A single reconciliation rule failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReconciliationViolation {
    #[error("paid and unpaid days total {allocated}, request covers {required} day(s)")]
    DaysMismatch { required: u32, allocated: u32 },
    #[error("medical leave requires a pay category before final approval")]
    MissingCategory,
}

/// Every violation found in one pass. The day-split check and the category
/// check are independent; failing one never hides the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationFailure {
    violations: Vec<ReconciliationViolation>,
}

impl ReconciliationFailure {
    pub fn violations(&self) -> &[ReconciliationViolation] {
        &self.violations
    }
}

impl fmt::Display for ReconciliationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for violation in &self.violations {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ReconciliationFailure {}

/// The split an approver is committing to, ready to be fixed on the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciledSplit {
    pub paid_days: u32,
    pub unpaid_days: u32,
    pub category: Option<LeaveCategory>,
}

/// Exact-equality split check. Over- and under-allocation fail the same way,
/// reporting the allocated total against the required day count.
pub fn validate_split(required: u32, paid: u32, unpaid: u32) -> Result<(), ReconciliationViolation> {
    let allocated = u64::from(paid) + u64::from(unpaid);
    if allocated != u64::from(required) {
        return Err(ReconciliationViolation::DaysMismatch {
            required,
            allocated: u32::try_from(allocated).unwrap_or(u32::MAX),
        });
    }
    Ok(())
}

/// Run the full reconciliation for a final financial approval. Missing split
/// values count as zero toward the allocated total so the mismatch error
/// always reports actual-versus-required figures.
pub fn validate(
    required: u32,
    paid: Option<u32>,
    unpaid: Option<u32>,
    category: Option<LeaveCategory>,
    requires_category: bool,
) -> Result<ReconciledSplit, ReconciliationFailure> {
    let paid = paid.unwrap_or(0);
    let unpaid = unpaid.unwrap_or(0);

    let mut violations = Vec::new();
    if let Err(violation) = validate_split(required, paid, unpaid) {
        violations.push(violation);
    }
    if requires_category && category.is_none() {
        violations.push(ReconciliationViolation::MissingCategory);
    }

    if violations.is_empty() {
        Ok(ReconciledSplit {
            paid_days: paid,
            unpaid_days: unpaid,
            category,
        })
    } else {
        Err(ReconciliationFailure { violations })
    }
}
