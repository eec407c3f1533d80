//! Reports built on top of the status resolver.

use crate::domain::models::LedgerSnapshot;
use crate::domain::status_resolver::StatusResolver;
use shared::{round_money, ChitStatus, DashboardSummary, LedgerRow, MemberLedgerResponse, OutstandingRow};

#[derive(Clone, Default)]
pub struct ReportService {
    resolver: StatusResolver,
}

impl ReportService {
    pub fn new(resolver: StatusResolver) -> Self {
        Self { resolver }
    }

    /// One row per membership of the group, in token order, summing the
    /// resolved balance of every chit month.
    pub fn outstanding_report(&self, snapshot: &LedgerSnapshot, chit_group_id: &str) -> Vec<OutstandingRow> {
        let total_months = snapshot.find_chit(chit_group_id).map_or(0, |g| g.total_months);

        let mut memberships: Vec<_> = snapshot
            .memberships
            .iter()
            .filter(|m| m.chit_group_id == chit_group_id)
            .collect();
        memberships.sort_by_key(|m| m.token_no);

        memberships
            .into_iter()
            .map(|membership| {
                let (total_due, total_paid, outstanding) = (1..=total_months)
                    .map(|month| self.resolver.resolve(snapshot, chit_group_id, &membership.member_id, month))
                    .fold((0.0, 0.0, 0.0), |(due, paid, balance), status| {
                        (due + status.due, paid + status.paid, balance + status.balance)
                    });
                OutstandingRow {
                    token_no: membership.token_no,
                    member_id: membership.member_id.clone(),
                    member_name: snapshot
                        .find_member(&membership.member_id)
                        .map(|m| m.name.clone())
                        .unwrap_or_default(),
                    total_due: round_money(total_due),
                    total_paid: round_money(total_paid),
                    outstanding: round_money(outstanding),
                }
            })
            .collect()
    }

    /// Month-by-month ledger of a member in a group.
    pub fn member_ledger(
        &self,
        snapshot: &LedgerSnapshot,
        chit_group_id: &str,
        member_id: &str,
    ) -> MemberLedgerResponse {
        let total_months = snapshot.find_chit(chit_group_id).map_or(0, |g| g.total_months);
        let member = snapshot.find_member(member_id);

        let rows = (1..=total_months)
            .map(|month_no| {
                let schedule = snapshot.find_installment(chit_group_id, member_id, month_no);
                let status = schedule
                    .map(|s| self.resolver.resolve_record(s))
                    .unwrap_or_default();
                LedgerRow {
                    month_no,
                    due_date: schedule.map(|s| s.due_date),
                    due: status.due,
                    paid: status.paid,
                    balance: status.balance,
                    status: status.status,
                    is_prize_month: schedule.is_some_and(|s| s.is_prize_month),
                }
            })
            .collect();

        MemberLedgerResponse {
            chit_group_id: chit_group_id.to_string(),
            member_id: member_id.to_string(),
            member_name: member.map(|m| m.name.clone()).unwrap_or_default(),
            mobile: member.map(|m| m.mobile.clone()).unwrap_or_default(),
            rows,
        }
    }

    /// Headline figures, optionally narrowed to one group and/or one month.
    pub fn dashboard_summary(
        &self,
        snapshot: &LedgerSnapshot,
        chit_group_id: Option<&str>,
        month_no: Option<u32>,
    ) -> DashboardSummary {
        let group_matches = |id: &str| chit_group_id.map_or(true, |g| g == id);
        let month_matches = |m: u32| month_no.map_or(true, |wanted| wanted == m);

        let total_collected = snapshot
            .payments
            .iter()
            .filter(|p| group_matches(&p.chit_group_id) && month_matches(p.month_no))
            .map(|p| p.paid_amount)
            .sum();

        let total_outstanding = snapshot
            .installments
            .iter()
            .filter(|s| group_matches(&s.chit_group_id) && month_matches(s.month_no))
            .map(|s| self.resolver.resolve_record(s).balance)
            .sum();

        DashboardSummary {
            active_groups: snapshot.chits.iter().filter(|c| c.status == ChitStatus::Active).count(),
            active_members: snapshot.members.iter().filter(|m| m.is_active).count(),
            total_collected: round_money(total_collected),
            total_outstanding: round_money(total_outstanding),
        }
    }
}
