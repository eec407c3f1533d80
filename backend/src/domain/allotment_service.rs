//! Allotment engine.
//!
//! Per (group, member) an allotment moves Unallotted -> Allotted -> Revoked.
//! Revoked records stay in the register; a revoked member can be allotted
//! again only through a new record.
//!
//! Two invariants hold for active (confirmed, non-revoked) allotments within
//! a group: one per member and one per month. Both are checked here before
//! anything is written, so a refused confirm leaves the snapshot untouched.
//!
//! Confirming at month `k` raises the member's installments for months `> k`
//! to the allotted rate and flags month `k` as the prize month. Revoking
//! undoes both. Callers must serialize allotment operations for a member;
//! the engine does not order concurrent confirms and revokes.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::domain::commands::allotment::{ConfirmAllotmentCommand, RevokeOutcome};
use crate::domain::models::{generate_id, AllotmentError, LedgerSnapshot};
use shared::{Allotment, AllotmentCandidates, PaymentStatus};

#[derive(Clone, Default)]
pub struct AllotmentService;

impl AllotmentService {
    pub fn new() -> Self {
        Self
    }

    /// Check every precondition of a confirm without mutating anything.
    pub fn validate_confirm(
        &self,
        snapshot: &LedgerSnapshot,
        command: &ConfirmAllotmentCommand,
    ) -> Result<(), AllotmentError> {
        let group = snapshot
            .find_chit(&command.chit_group_id)
            .ok_or_else(|| AllotmentError::GroupNotFound(command.chit_group_id.clone()))?;

        if !command.allotted_amount.is_finite() || command.allotted_amount <= 0.0 {
            return Err(AllotmentError::NonPositiveAmount);
        }
        if command.month_no == 0 || command.month_no > group.total_months {
            return Err(AllotmentError::MonthOutOfRange {
                month_no: command.month_no,
                total_months: group.total_months,
            });
        }
        if snapshot
            .find_membership(&command.chit_group_id, &command.member_id)
            .is_none()
        {
            return Err(AllotmentError::NotAMember(command.member_id.clone()));
        }
        let member = snapshot
            .find_member(&command.member_id)
            .ok_or_else(|| AllotmentError::MemberNotFound(command.member_id.clone()))?;
        if !member.is_active {
            return Err(AllotmentError::MemberInactive(member.id.clone()));
        }
        if let Some(existing) =
            snapshot.active_allotment_for_member(&command.chit_group_id, &command.member_id)
        {
            return Err(AllotmentError::MemberAlreadyAllotted {
                member_id: command.member_id.clone(),
                allotment_id: existing.id.clone(),
            });
        }
        if let Some(existing) =
            snapshot.active_allotment_for_month(&command.chit_group_id, command.month_no)
        {
            return Err(AllotmentError::MonthAlreadyAllotted {
                month_no: command.month_no,
                allotment_id: existing.id.clone(),
            });
        }
        Ok(())
    }

    /// Validate, record the allotment and apply the forward rate change.
    pub fn confirm(
        &self,
        snapshot: &mut LedgerSnapshot,
        command: ConfirmAllotmentCommand,
        now: DateTime<Utc>,
    ) -> Result<Allotment, AllotmentError> {
        self.validate_confirm(snapshot, &command)?;

        let allotted_rate = snapshot
            .find_chit(&command.chit_group_id)
            .map(|g| g.installment_allotted)
            .ok_or_else(|| AllotmentError::GroupNotFound(command.chit_group_id.clone()))?;

        let allotment = Allotment {
            id: generate_id("allotment"),
            chit_group_id: command.chit_group_id,
            member_id: command.member_id,
            month_no: command.month_no,
            allotted_amount: command.allotted_amount,
            is_confirmed: true,
            revoked: false,
            created_at: now,
            created_by: command.created_by,
        };

        self.set_prize_month(snapshot, &allotment, true);
        let changed = Self::set_rate_after(snapshot, &allotment, allotted_rate);
        snapshot.allotments.push(allotment.clone());

        info!(
            "Allotted month {} of group {} to {} for {:.2}; {} later installments now {:.2}",
            allotment.month_no,
            allotment.chit_group_id,
            allotment.member_id,
            allotment.allotted_amount,
            changed,
            allotted_rate
        );
        Ok(allotment)
    }

    /// Revoke an allotment and restore the regular rate on later months.
    pub fn revoke(&self, snapshot: &mut LedgerSnapshot, allotment_id: &str) -> RevokeOutcome {
        let Some(index) = snapshot.allotments.iter().position(|a| a.id == allotment_id) else {
            warn!("Revoke requested for unknown allotment {}", allotment_id);
            return RevokeOutcome::NotFound;
        };

        if snapshot.allotments[index].revoked {
            debug!("Allotment {} is already revoked", allotment_id);
            return RevokeOutcome::AlreadyRevoked(snapshot.allotments[index].clone());
        }

        let allotment = {
            let record = &mut snapshot.allotments[index];
            record.revoked = true;
            record.is_confirmed = false;
            record.clone()
        };

        self.set_prize_month(snapshot, &allotment, false);
        match snapshot.find_chit(&allotment.chit_group_id).map(|g| g.installment_regular) {
            Some(regular_rate) => {
                let changed = Self::set_rate_after(snapshot, &allotment, regular_rate);
                info!(
                    "Revoked allotment {} (month {}, member {}); {} installments back to {:.2}",
                    allotment.id, allotment.month_no, allotment.member_id, changed, regular_rate
                );
            }
            None => warn!(
                "Revoked allotment {} references missing group {}; rates left unchanged",
                allotment.id, allotment.chit_group_id
            ),
        }
        RevokeOutcome::Revoked(allotment)
    }

    /// Members who may still win and months still open in a group.
    ///
    /// A candidate has a membership in the group, is active and holds no
    /// active allotment there. Candidates come back in token order.
    pub fn candidates(&self, snapshot: &LedgerSnapshot, chit_group_id: &str) -> AllotmentCandidates {
        let mut memberships: Vec<_> = snapshot
            .memberships
            .iter()
            .filter(|m| m.chit_group_id == chit_group_id)
            .collect();
        memberships.sort_by_key(|m| m.token_no);

        let members = memberships
            .into_iter()
            .filter(|m| snapshot.active_allotment_for_member(chit_group_id, &m.member_id).is_none())
            .filter_map(|m| snapshot.find_member(&m.member_id))
            .filter(|m| m.is_active)
            .cloned()
            .collect();

        let total_months = snapshot.find_chit(chit_group_id).map_or(0, |g| g.total_months);
        let months = (1..=total_months)
            .filter(|month| snapshot.active_allotment_for_month(chit_group_id, *month).is_none())
            .collect();

        AllotmentCandidates { members, months }
    }

    /// Every allotment of a group, revoked ones included, latest month first.
    pub fn register(&self, snapshot: &LedgerSnapshot, chit_group_id: &str) -> Vec<Allotment> {
        let mut allotments: Vec<Allotment> = snapshot
            .allotments
            .iter()
            .filter(|a| a.chit_group_id == chit_group_id)
            .cloned()
            .collect();
        allotments.sort_by(|a, b| b.month_no.cmp(&a.month_no).then(b.created_at.cmp(&a.created_at)));
        allotments
    }

    fn set_prize_month(&self, snapshot: &mut LedgerSnapshot, allotment: &Allotment, is_prize_month: bool) {
        match snapshot.find_installment_mut(&allotment.chit_group_id, &allotment.member_id, allotment.month_no) {
            Some(schedule) => schedule.is_prize_month = is_prize_month,
            None => warn!(
                "No installment for member {} month {} in group {}",
                allotment.member_id, allotment.month_no, allotment.chit_group_id
            ),
        }
    }

    /// Set the due amount of every installment strictly after the allotment
    /// month. Stored status is recomputed so it keeps matching the amounts;
    /// paid amounts are left as they are.
    fn set_rate_after(snapshot: &mut LedgerSnapshot, allotment: &Allotment, rate: f64) -> usize {
        let mut changed = 0;
        for schedule in snapshot.installments.iter_mut().filter(|s| {
            s.chit_group_id == allotment.chit_group_id
                && s.member_id == allotment.member_id
                && s.month_no > allotment.month_no
        }) {
            schedule.due_amount = rate;
            schedule.status = PaymentStatus::from_amounts(schedule.paid_amount, schedule.due_amount);
            changed += 1;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_utils::{snapshot_with_members, GROUP_ID};

    fn command(member_id: &str, month_no: u32) -> ConfirmAllotmentCommand {
        ConfirmAllotmentCommand {
            chit_group_id: GROUP_ID.to_string(),
            member_id: member_id.to_string(),
            month_no,
            allotted_amount: 5000.0,
            created_by: "admin".to_string(),
        }
    }

    fn dues(snapshot: &LedgerSnapshot, member_id: &str) -> Vec<f64> {
        let mut rows: Vec<_> = snapshot
            .installments
            .iter()
            .filter(|s| s.member_id == member_id)
            .collect();
        rows.sort_by_key(|s| s.month_no);
        rows.iter().map(|s| s.due_amount).collect()
    }

    #[test]
    fn test_confirm_raises_only_later_months() {
        let service = AllotmentService::new();
        let mut snapshot = snapshot_with_members(5, &[("member::a", "Asha", true)]);

        service.confirm(&mut snapshot, command("member::a", 2), Utc::now()).unwrap();

        assert_eq!(dues(&snapshot, "member::a"), vec![1000.0, 1000.0, 1200.0, 1200.0, 1200.0]);
        let prize = snapshot.find_installment(GROUP_ID, "member::a", 2).unwrap();
        assert!(prize.is_prize_month);
        assert_eq!(snapshot.allotments.len(), 1);
        assert!(snapshot.allotments[0].is_active());
    }

    #[test]
    fn test_confirm_at_last_month_changes_no_rates() {
        let service = AllotmentService::new();
        let mut snapshot = snapshot_with_members(3, &[("member::a", "Asha", true)]);

        service.confirm(&mut snapshot, command("member::a", 3), Utc::now()).unwrap();
        assert_eq!(dues(&snapshot, "member::a"), vec![1000.0, 1000.0, 1000.0]);
    }

    #[test]
    fn test_confirm_leaves_other_members_untouched() {
        let service = AllotmentService::new();
        let mut snapshot =
            snapshot_with_members(3, &[("member::a", "Asha", true), ("member::b", "Bala", true)]);

        service.confirm(&mut snapshot, command("member::a", 1), Utc::now()).unwrap();
        assert_eq!(dues(&snapshot, "member::b"), vec![1000.0, 1000.0, 1000.0]);
    }

    #[test]
    fn test_revoke_restores_pre_confirm_state() {
        let service = AllotmentService::new();
        let mut snapshot = snapshot_with_members(4, &[("member::a", "Asha", true)]);
        let before = snapshot.installments.clone();

        let allotment = service.confirm(&mut snapshot, command("member::a", 2), Utc::now()).unwrap();
        let outcome = service.revoke(&mut snapshot, &allotment.id);

        match outcome {
            RevokeOutcome::Revoked(revoked) => {
                assert!(revoked.revoked);
                assert!(!revoked.is_confirmed);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(snapshot.installments, before);
        assert_eq!(snapshot.allotments.len(), 1, "history is kept");
    }

    #[test]
    fn test_revoke_twice_is_noop() {
        let service = AllotmentService::new();
        let mut snapshot = snapshot_with_members(4, &[("member::a", "Asha", true)]);
        let first = service.confirm(&mut snapshot, command("member::a", 1), Utc::now()).unwrap();
        service.revoke(&mut snapshot, &first.id);

        // Re-allot at a different month, then revoke the old record again.
        service.confirm(&mut snapshot, command("member::a", 3), Utc::now()).unwrap();
        let outcome = service.revoke(&mut snapshot, &first.id);

        assert!(matches!(outcome, RevokeOutcome::AlreadyRevoked(_)));
        assert_eq!(dues(&snapshot, "member::a"), vec![1000.0, 1000.0, 1000.0, 1200.0]);
    }

    #[test]
    fn test_revoke_unknown_id() {
        let service = AllotmentService::new();
        let mut snapshot = snapshot_with_members(2, &[("member::a", "Asha", true)]);
        assert_eq!(service.revoke(&mut snapshot, "allotment::missing"), RevokeOutcome::NotFound);
    }

    #[test]
    fn test_one_active_allotment_per_member() {
        let service = AllotmentService::new();
        let mut snapshot = snapshot_with_members(4, &[("member::a", "Asha", true)]);
        service.confirm(&mut snapshot, command("member::a", 1), Utc::now()).unwrap();

        let err = service.confirm(&mut snapshot, command("member::a", 2), Utc::now()).unwrap_err();
        assert!(matches!(err, AllotmentError::MemberAlreadyAllotted { .. }));
        assert_eq!(snapshot.allotments.len(), 1);
    }

    #[test]
    fn test_one_active_allotment_per_month() {
        let service = AllotmentService::new();
        let mut snapshot =
            snapshot_with_members(4, &[("member::a", "Asha", true), ("member::b", "Bala", true)]);
        service.confirm(&mut snapshot, command("member::a", 2), Utc::now()).unwrap();
        let before = snapshot.clone();

        let err = service.confirm(&mut snapshot, command("member::b", 2), Utc::now()).unwrap_err();
        assert!(matches!(err, AllotmentError::MonthAlreadyAllotted { month_no: 2, .. }));
        assert_eq!(snapshot, before);
    }

    #[test]
    fn test_revoked_member_can_be_allotted_again() {
        let service = AllotmentService::new();
        let mut snapshot = snapshot_with_members(4, &[("member::a", "Asha", true)]);
        let first = service.confirm(&mut snapshot, command("member::a", 1), Utc::now()).unwrap();
        service.revoke(&mut snapshot, &first.id);

        assert!(service.confirm(&mut snapshot, command("member::a", 1), Utc::now()).is_ok());
        assert_eq!(snapshot.allotments.len(), 2);
    }

    #[test]
    fn test_confirm_rejects_invalid_requests() {
        let service = AllotmentService::new();
        let mut snapshot =
            snapshot_with_members(3, &[("member::a", "Asha", true), ("member::off", "Off", false)]);
        snapshot.members.push(crate::domain::test_utils::test_member("member::x", "Outsider", true));

        let mut zero_amount = command("member::a", 1);
        zero_amount.allotted_amount = 0.0;
        assert_eq!(service.validate_confirm(&snapshot, &zero_amount), Err(AllotmentError::NonPositiveAmount));

        assert!(matches!(
            service.validate_confirm(&snapshot, &command("member::a", 4)),
            Err(AllotmentError::MonthOutOfRange { month_no: 4, total_months: 3 })
        ));
        assert!(matches!(
            service.validate_confirm(&snapshot, &command("member::a", 0)),
            Err(AllotmentError::MonthOutOfRange { .. })
        ));
        assert_eq!(
            service.validate_confirm(&snapshot, &command("member::x", 1)),
            Err(AllotmentError::NotAMember("member::x".to_string()))
        );
        assert_eq!(
            service.validate_confirm(&snapshot, &command("member::off", 1)),
            Err(AllotmentError::MemberInactive("member::off".to_string()))
        );

        let mut other_group = command("member::a", 1);
        other_group.chit_group_id = "chit::other".to_string();
        assert_eq!(
            service.validate_confirm(&snapshot, &other_group),
            Err(AllotmentError::GroupNotFound("chit::other".to_string()))
        );
    }

    #[test]
    fn test_confirm_recomputes_status_of_paid_future_months() {
        let service = AllotmentService::new();
        let mut snapshot = snapshot_with_members(3, &[("member::a", "Asha", true)]);
        {
            let month3 = snapshot.find_installment_mut(GROUP_ID, "member::a", 3).unwrap();
            month3.paid_amount = 1000.0;
            month3.status = PaymentStatus::Paid;
        }

        service.confirm(&mut snapshot, command("member::a", 1), Utc::now()).unwrap();

        let month3 = snapshot.find_installment(GROUP_ID, "member::a", 3).unwrap();
        assert_eq!(month3.due_amount, 1200.0);
        assert_eq!(month3.paid_amount, 1000.0);
        assert_eq!(month3.status, PaymentStatus::Partial);
    }

    #[test]
    fn test_candidates_exclude_winners_and_inactive() {
        let service = AllotmentService::new();
        let mut snapshot = snapshot_with_members(
            3,
            &[("member::a", "Asha", true), ("member::b", "Bala", true), ("member::c", "Chitra", false)],
        );
        service.confirm(&mut snapshot, command("member::a", 2), Utc::now()).unwrap();

        let candidates = service.candidates(&snapshot, GROUP_ID);
        let ids: Vec<&str> = candidates.members.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["member::b"]);
        assert_eq!(candidates.months, vec![1, 3]);
    }

    #[test]
    fn test_register_lists_revoked_records_latest_month_first() {
        let service = AllotmentService::new();
        let mut snapshot =
            snapshot_with_members(3, &[("member::a", "Asha", true), ("member::b", "Bala", true)]);
        let first = service.confirm(&mut snapshot, command("member::a", 1), Utc::now()).unwrap();
        service.confirm(&mut snapshot, command("member::b", 3), Utc::now()).unwrap();
        service.revoke(&mut snapshot, &first.id);

        let register = service.register(&snapshot, GROUP_ID);
        assert_eq!(register.len(), 2);
        assert_eq!(register[0].month_no, 3);
        assert!(register[1].revoked);
    }
}
