use crate::domain::commands::payment::{PaymentOutcome, RecordPaymentCommand};
use shared::{RecordPaymentRequest, RecordPaymentResponse};

pub struct PaymentMapper;

impl PaymentMapper {
    pub fn to_record_command(request: RecordPaymentRequest) -> RecordPaymentCommand {
        RecordPaymentCommand {
            chit_group_id: request.chit_group_id,
            member_id: request.member_id,
            month_no: request.month_no,
            paid_amount: request.paid_amount,
            payment_date: request.payment_date,
        }
    }

    pub fn to_record_response(outcome: PaymentOutcome) -> RecordPaymentResponse {
        RecordPaymentResponse {
            payment: outcome.payment,
            schedule: outcome.schedule,
        }
    }
}
