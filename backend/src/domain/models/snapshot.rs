//! The full ledger state persisted as one document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{
    Allotment, ChitGroup, GroupMembership, InstallmentSchedule, MasterSettings, Member, Payment,
    User, UserRole,
};

/// Every entity collection of an installation.
///
/// Collections missing from a stored document load as empty so that
/// snapshots written by older builds stay readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub chits: Vec<ChitGroup>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub memberships: Vec<GroupMembership>,
    #[serde(default)]
    pub installments: Vec<InstallmentSchedule>,
    #[serde(default)]
    pub allotments: Vec<Allotment>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    /// Payment requests raised by other clients. Kept as stored so a load
    /// and save never drops them.
    #[serde(default, alias = "paymentRequests")]
    pub payment_requests: Vec<serde_json::Value>,
    #[serde(default)]
    pub settings: MasterSettings,
    /// Time of the last local change. Seeding does not set it.
    #[serde(default)]
    pub last_modified_at: Option<DateTime<Utc>>,
}

impl LedgerSnapshot {
    /// Snapshot used when storage is empty or unreadable: one administrator
    /// and nothing else.
    pub fn seeded() -> Self {
        Self {
            users: Self::default_users(),
            ..Self::default()
        }
    }

    pub fn default_users() -> Vec<User> {
        vec![User {
            user_id: "u1".to_string(),
            name: "Admin User".to_string(),
            role: UserRole::Admin,
            username: "admin".to_string(),
            password_hash: "xdr5tgb".to_string(),
            is_active: true,
        }]
    }

    pub fn find_chit(&self, chit_group_id: &str) -> Option<&ChitGroup> {
        self.chits.iter().find(|c| c.id == chit_group_id)
    }

    pub fn find_member(&self, member_id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == member_id)
    }

    pub fn find_membership(&self, chit_group_id: &str, member_id: &str) -> Option<&GroupMembership> {
        self.memberships
            .iter()
            .find(|m| m.chit_group_id == chit_group_id && m.member_id == member_id)
    }

    pub fn find_installment(
        &self,
        chit_group_id: &str,
        member_id: &str,
        month_no: u32,
    ) -> Option<&InstallmentSchedule> {
        self.installments.iter().find(|s| {
            s.chit_group_id == chit_group_id && s.member_id == member_id && s.month_no == month_no
        })
    }

    pub fn find_installment_mut(
        &mut self,
        chit_group_id: &str,
        member_id: &str,
        month_no: u32,
    ) -> Option<&mut InstallmentSchedule> {
        self.installments.iter_mut().find(|s| {
            s.chit_group_id == chit_group_id && s.member_id == member_id && s.month_no == month_no
        })
    }

    /// Confirmed, non-revoked allotment of a member in a group
    pub fn active_allotment_for_member(&self, chit_group_id: &str, member_id: &str) -> Option<&Allotment> {
        self.allotments
            .iter()
            .find(|a| a.chit_group_id == chit_group_id && a.member_id == member_id && a.is_active())
    }

    /// Confirmed, non-revoked allotment of a month in a group
    pub fn active_allotment_for_month(&self, chit_group_id: &str, month_no: u32) -> Option<&Allotment> {
        self.allotments
            .iter()
            .find(|a| a.chit_group_id == chit_group_id && a.month_no == month_no && a.is_active())
    }
}
