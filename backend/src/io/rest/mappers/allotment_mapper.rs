use crate::domain::commands::allotment::{ConfirmAllotmentCommand, RevokeOutcome};
use shared::{ConfirmAllotmentRequest, RevokeAllotmentResponse};

/// Recorded as the author of allotments confirmed without one
pub const DEFAULT_CREATED_BY: &str = "u1";

pub struct AllotmentMapper;

impl AllotmentMapper {
    pub fn to_confirm_command(request: ConfirmAllotmentRequest) -> ConfirmAllotmentCommand {
        ConfirmAllotmentCommand {
            chit_group_id: request.chit_group_id,
            member_id: request.member_id,
            month_no: request.month_no,
            allotted_amount: request.allotted_amount,
            created_by: request
                .created_by
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CREATED_BY.to_string()),
        }
    }

    /// `None` when the allotment does not exist.
    pub fn to_revoke_response(outcome: RevokeOutcome) -> Option<RevokeAllotmentResponse> {
        match outcome {
            RevokeOutcome::Revoked(a) => Some(RevokeAllotmentResponse {
                revoked: true,
                success_message: format!("Allotment for month {} revoked", a.month_no),
            }),
            RevokeOutcome::AlreadyRevoked(a) => Some(RevokeAllotmentResponse {
                revoked: false,
                success_message: format!("Allotment for month {} was already revoked", a.month_no),
            }),
            RevokeOutcome::NotFound => None,
        }
    }
}
