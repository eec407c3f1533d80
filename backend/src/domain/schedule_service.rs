//! Installment schedule generation.
//!
//! A member's schedule is built once, when the membership is created: one
//! pending record per chit month at the group's regular rate. Allotments and
//! payments later mutate these records in place; they are never regenerated.

use chrono::{Months, NaiveDate};
use tracing::{debug, warn};

use crate::domain::models::LedgerSnapshot;
use shared::{ChitGroup, GroupMembership, InstallmentSchedule, PaymentStatus};

#[derive(Clone, Default)]
pub struct ScheduleService;

impl ScheduleService {
    pub fn new() -> Self {
        Self
    }

    /// Build the full schedule for a membership without touching any state.
    ///
    /// A group with `total_months == 0` produces an empty schedule.
    pub fn generate_schedule(
        &self,
        group: &ChitGroup,
        membership: &GroupMembership,
    ) -> Vec<InstallmentSchedule> {
        (1..=group.total_months)
            .map(|month_no| InstallmentSchedule {
                id: format!("schedule::{}::{}", membership.id, month_no),
                chit_group_id: membership.chit_group_id.clone(),
                member_id: membership.member_id.clone(),
                month_no,
                due_date: Self::due_date(group.start_month, month_no),
                due_amount: group.installment_regular,
                paid_amount: 0.0,
                paid_date: None,
                status: PaymentStatus::Pending,
                is_prize_month: false,
            })
            .collect()
    }

    /// Generate and append a membership's schedule to the snapshot.
    /// Returns the number of records added.
    pub fn append_schedule(
        &self,
        snapshot: &mut LedgerSnapshot,
        group: &ChitGroup,
        membership: &GroupMembership,
    ) -> usize {
        if group.total_months == 0 {
            warn!("Chit group {} has no months, schedule for {} is empty", group.id, membership.member_id);
        }
        let records = self.generate_schedule(group, membership);
        let count = records.len();
        snapshot.installments.extend(records);
        debug!(
            "Generated {} installments for member {} in group {}",
            count, membership.member_id, group.id
        );
        count
    }

    /// Due date of a chit month: the start date moved forward `month_no - 1`
    /// calendar months. The day of month is clamped to the end of shorter
    /// months (Jan 31 -> Feb 28/29).
    pub fn due_date(start_month: NaiveDate, month_no: u32) -> NaiveDate {
        start_month
            .checked_add_months(Months::new(month_no.saturating_sub(1)))
            .unwrap_or(NaiveDate::MAX)
    }
}
