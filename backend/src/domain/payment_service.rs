//! Payment ledger.
//!
//! Payments are appended to an immutable log and accumulated onto the
//! matching installment. Several partial payments for the same month simply
//! add up.

use tracing::{debug, warn};

use crate::domain::models::{LedgerSnapshot, PaymentValidationError};
use shared::{round_money, InstallmentSchedule, Payment, PaymentStatus};

#[derive(Clone, Default)]
pub struct PaymentService;

impl PaymentService {
    pub fn new() -> Self {
        Self
    }

    /// Reject payments that could never be meaningful, before anything is logged.
    pub fn validate(&self, paid_amount: f64, month_no: u32) -> Result<(), PaymentValidationError> {
        if !paid_amount.is_finite() || paid_amount <= 0.0 {
            return Err(PaymentValidationError::NonPositiveAmount);
        }
        if month_no == 0 {
            return Err(PaymentValidationError::InvalidMonth);
        }
        Ok(())
    }

    /// Log the payment and apply it to its installment.
    ///
    /// The payment is always logged. When no installment matches
    /// (group, member, month) nothing else changes and `None` is returned.
    pub fn record_payment(
        &self,
        snapshot: &mut LedgerSnapshot,
        payment: Payment,
    ) -> Option<InstallmentSchedule> {
        let updated = match snapshot.find_installment_mut(
            &payment.chit_group_id,
            &payment.member_id,
            payment.month_no,
        ) {
            Some(schedule) => {
                Self::apply(schedule, &payment);
                debug!(
                    "Applied {:.2} to {} month {}: paid {:.2} of {:.2} ({})",
                    payment.paid_amount,
                    schedule.member_id,
                    schedule.month_no,
                    schedule.paid_amount,
                    schedule.due_amount,
                    schedule.status
                );
                Some(schedule.clone())
            }
            None => {
                warn!(
                    "Payment {} has no installment for group {} member {} month {}; logged only",
                    payment.id, payment.chit_group_id, payment.member_id, payment.month_no
                );
                None
            }
        };

        snapshot.payments.push(payment);
        updated
    }

    fn apply(schedule: &mut InstallmentSchedule, payment: &Payment) {
        schedule.paid_amount = round_money(schedule.paid_amount + payment.paid_amount);
        schedule.paid_date = Some(payment.payment_date);
        schedule.status = PaymentStatus::from_amounts(schedule.paid_amount, schedule.due_amount);
    }
}
