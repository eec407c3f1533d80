use crate::domain::commands::member::{
    AddMembershipCommand, BulkImportResult, CreateMemberCommand, MembershipOutcome,
};
use shared::{
    BulkImportResponse, CreateMemberRequest, CreateMembershipRequest, MembershipResponse,
};

pub struct MemberMapper;

impl MemberMapper {
    pub fn to_create_command(request: CreateMemberRequest) -> CreateMemberCommand {
        CreateMemberCommand {
            name: request.name,
            mobile: request.mobile,
            address: request.address,
            id_proof_type: request.id_proof_type,
            id_proof_number: request.id_proof_number,
            chit_group_id: request.chit_group_id.filter(|g| !g.is_empty()),
        }
    }

    pub fn to_membership_command(request: CreateMembershipRequest) -> AddMembershipCommand {
        AddMembershipCommand {
            chit_group_id: request.chit_group_id,
            member_id: request.member_id,
            joined_on: request.joined_on,
        }
    }

    pub fn to_membership_response(outcome: MembershipOutcome) -> MembershipResponse {
        let created = outcome.is_created();
        let membership = match outcome {
            MembershipOutcome::Created(m) | MembershipOutcome::AlreadyMember(m) => m,
        };
        MembershipResponse { membership, created }
    }

    pub fn to_bulk_import_response(result: BulkImportResult) -> BulkImportResponse {
        BulkImportResponse {
            success_message: format!(
                "Imported {} members, {} joined the group",
                result.members.len(),
                result.memberships_created
            ),
            imported: result.members,
            memberships_created: result.memberships_created,
        }
    }
}
