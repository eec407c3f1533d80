//! Fixtures shared by the domain unit tests.

use chrono::NaiveDate;

use crate::domain::models::LedgerSnapshot;
use crate::domain::schedule_service::ScheduleService;
use shared::{ChitGroup, ChitStatus, GroupMembership, Member};

pub const GROUP_ID: &str = "chit::g";

pub fn test_group(total_months: u32) -> ChitGroup {
    ChitGroup {
        id: GROUP_ID.to_string(),
        name: "Friday Chit".to_string(),
        chit_value: 3000.0,
        total_months,
        installment_regular: 1000.0,
        installment_allotted: 1200.0,
        start_month: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        status: ChitStatus::Active,
        upi_id: "friday@upi".to_string(),
    }
}

pub fn test_member(id: &str, name: &str, is_active: bool) -> Member {
    Member {
        id: id.to_string(),
        name: name.to_string(),
        mobile: "9876543210".to_string(),
        address: String::new(),
        id_proof_type: "Aadhar".to_string(),
        id_proof_number: String::new(),
        is_active,
    }
}

/// A group with `total_months` months and the given members all joined,
/// schedules generated.
pub fn snapshot_with_members(total_months: u32, members: &[(&str, &str, bool)]) -> LedgerSnapshot {
    let schedule_service = ScheduleService::new();
    let group = test_group(total_months);
    let mut snapshot = LedgerSnapshot::seeded();
    snapshot.chits.push(group.clone());

    for (index, (id, name, is_active)) in members.iter().enumerate() {
        snapshot.members.push(test_member(id, name, *is_active));
        let membership = GroupMembership {
            id: format!("membership::{}", id),
            chit_group_id: GROUP_ID.to_string(),
            member_id: id.to_string(),
            token_no: index as u32 + 1,
            joined_on: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        };
        schedule_service.append_schedule(&mut snapshot, &group, &membership);
        snapshot.memberships.push(membership);
    }
    snapshot
}
