//! Read-side installment status.
//!
//! The stored `status` of an installment is a cache. Reports always go
//! through the resolver, which recomputes due, paid, balance and status from
//! the amounts on the record.

use crate::domain::models::LedgerSnapshot;
use shared::{balance_of, InstallmentSchedule, InstallmentStatus, PaymentStatus};

#[derive(Clone, Default)]
pub struct StatusResolver;

impl StatusResolver {
    pub fn new() -> Self {
        Self
    }

    /// Status of one (group, member, month). Missing installments resolve to
    /// all zeros and `pending`.
    pub fn resolve(
        &self,
        snapshot: &LedgerSnapshot,
        chit_group_id: &str,
        member_id: &str,
        month_no: u32,
    ) -> InstallmentStatus {
        snapshot
            .find_installment(chit_group_id, member_id, month_no)
            .map(|schedule| self.resolve_record(schedule))
            .unwrap_or_default()
    }

    pub fn resolve_record(&self, schedule: &InstallmentSchedule) -> InstallmentStatus {
        let due = schedule.due_amount;
        let paid = schedule.paid_amount;
        InstallmentStatus {
            due,
            paid,
            balance: balance_of(due, paid),
            status: PaymentStatus::from_amounts(paid, due),
        }
    }
}
