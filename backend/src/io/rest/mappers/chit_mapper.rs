use crate::domain::commands::chit::CreateChitGroupCommand;
use shared::CreateChitGroupRequest;

pub struct ChitMapper;

impl ChitMapper {
    pub fn to_create_command(request: CreateChitGroupRequest) -> CreateChitGroupCommand {
        CreateChitGroupCommand {
            name: request.name,
            chit_value: request.chit_value,
            total_months: request.total_months,
            installment_regular: request.installment_regular,
            installment_allotted: request.installment_allotted,
            start_month: request.start_month,
            upi_id: request.upi_id,
        }
    }
}
