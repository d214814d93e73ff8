use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Lifecycle of a procurement request.
///
/// `Pending` and `ReviewWakasek` are working states; `Approved` and
/// `Rejected` are terminal and accept no further transition.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum ProcurementStatus {
    #[strum(serialize = "PENDING")]
    Pending,
    #[strum(serialize = "REVIEW_WAKASEK")]
    ReviewWakasek,
    #[strum(serialize = "APPROVED")]
    Approved,
    #[strum(serialize = "REJECTED")]
    Rejected,
}

impl ProcurementStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcurementStatus::Approved | ProcurementStatus::Rejected)
    }
}

/// Role of the actor attempting a transition. Role checks themselves
/// (who the caller actually is) belong to the enclosing request layer;
/// this crate trusts the supplied value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum Role {
    /// First-line technical reviewer (kepala program keahlian). Can
    /// advance a request but never finalize it.
    #[strum(serialize = "KAPROG")]
    DepartmentHead,
    /// Final approval authority; may finalize from any non-terminal state.
    #[strum(serialize = "ADMIN")]
    Administrator,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum ApprovalAction {
    #[strum(serialize = "APPROVE")]
    Approve,
    #[strum(serialize = "REJECT")]
    Reject,
}

/// The full transition table. `None` means the combination is invalid and
/// the request must be left untouched.
///
/// | current        | role           | action  | next           |
/// |----------------|----------------|---------|----------------|
/// | PENDING        | KAPROG         | approve | REVIEW_WAKASEK |
/// | PENDING        | ADMIN          | approve | APPROVED       |
/// | REVIEW_WAKASEK | ADMIN          | approve | APPROVED       |
/// | PENDING        | ADMIN          | reject  | REJECTED       |
/// | REVIEW_WAKASEK | ADMIN          | reject  | REJECTED       |
pub fn next_status(
    current: ProcurementStatus,
    role: Role,
    action: ApprovalAction,
) -> Option<ProcurementStatus> {
    use ApprovalAction::*;
    use ProcurementStatus::*;
    use Role::*;

    match (current, role, action) {
        (Pending, DepartmentHead, Approve) => Some(ReviewWakasek),
        (Pending, Administrator, Approve) => Some(Approved),
        (ReviewWakasek, Administrator, Approve) => Some(Approved),
        (Pending, Administrator, Reject) => Some(Rejected),
        (ReviewWakasek, Administrator, Reject) => Some(Rejected),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;
    use test_case::test_case;

    #[test_case(ProcurementStatus::Pending, Role::DepartmentHead, ApprovalAction::Approve => Some(ProcurementStatus::ReviewWakasek); "kaprog advances pending to review")]
    #[test_case(ProcurementStatus::Pending, Role::Administrator, ApprovalAction::Approve => Some(ProcurementStatus::Approved); "admin short-circuits pending to approved")]
    #[test_case(ProcurementStatus::ReviewWakasek, Role::Administrator, ApprovalAction::Approve => Some(ProcurementStatus::Approved); "admin finalizes review")]
    #[test_case(ProcurementStatus::Pending, Role::Administrator, ApprovalAction::Reject => Some(ProcurementStatus::Rejected); "admin rejects pending")]
    #[test_case(ProcurementStatus::ReviewWakasek, Role::Administrator, ApprovalAction::Reject => Some(ProcurementStatus::Rejected); "admin rejects review")]
    #[test_case(ProcurementStatus::ReviewWakasek, Role::DepartmentHead, ApprovalAction::Approve => None; "kaprog cannot act after pending")]
    #[test_case(ProcurementStatus::Pending, Role::DepartmentHead, ApprovalAction::Reject => None; "kaprog cannot reject")]
    #[test_case(ProcurementStatus::Approved, Role::Administrator, ApprovalAction::Approve => None; "approved is terminal")]
    #[test_case(ProcurementStatus::Approved, Role::Administrator, ApprovalAction::Reject => None; "approved cannot be rejected")]
    #[test_case(ProcurementStatus::Rejected, Role::Administrator, ApprovalAction::Approve => None; "rejected is terminal")]
    #[test_case(ProcurementStatus::Rejected, Role::DepartmentHead, ApprovalAction::Approve => None; "rejected is terminal for kaprog too")]
    fn transition_table(
        current: ProcurementStatus,
        role: Role,
        action: ApprovalAction,
    ) -> Option<ProcurementStatus> {
        next_status(current, role, action)
    }

    #[test]
    fn exactly_five_combinations_are_valid() {
        let mut valid = 0;
        for status in ProcurementStatus::iter() {
            for role in Role::iter() {
                for action in ApprovalAction::iter() {
                    if next_status(status, role, action).is_some() {
                        valid += 1;
                    }
                }
            }
        }
        assert_eq!(valid, 5);
    }

    #[test]
    fn terminal_states_admit_no_transition() {
        for status in [ProcurementStatus::Approved, ProcurementStatus::Rejected] {
            for role in Role::iter() {
                for action in ApprovalAction::iter() {
                    assert_eq!(next_status(status, role, action), None);
                }
            }
        }
    }

    #[test]
    fn status_strings_round_trip() {
        for status in ProcurementStatus::iter() {
            let text = status.to_string();
            let parsed: ProcurementStatus = text.parse().expect("parse status");
            assert_eq!(parsed, status);
        }
        assert_eq!(ProcurementStatus::ReviewWakasek.to_string(), "REVIEW_WAKASEK");
        assert_eq!(Role::DepartmentHead.to_string(), "KAPROG");
    }
}
