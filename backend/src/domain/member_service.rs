//! Member creation, bulk import and group membership.

use anyhow::Result;
use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use tracing::{debug, info, warn};

use crate::domain::commands::member::{BulkImportRow, CreateMemberCommand, MembershipOutcome};
use crate::domain::models::member::{
    normalize_mobile, DEFAULT_ID_PROOF_TYPE, MOBILE_DIGITS, UNNAMED_MEMBER,
};
use crate::domain::models::{generate_id, LedgerSnapshot, MemberValidationError};
use crate::domain::schedule_service::ScheduleService;
use shared::{GroupMembership, Member};

#[derive(Clone, Default)]
pub struct MemberService {
    schedule_service: ScheduleService,
}

impl MemberService {
    pub fn new(schedule_service: ScheduleService) -> Self {
        Self { schedule_service }
    }

    /// Build a member from the admin form. The mobile must normalize to
    /// exactly ten digits.
    pub fn build_member(&self, command: &CreateMemberCommand) -> Result<Member, MemberValidationError> {
        let name = command.name.trim();
        if name.is_empty() {
            return Err(MemberValidationError::EmptyName);
        }
        let mobile = normalize_mobile(&command.mobile);
        if mobile.len() != MOBILE_DIGITS {
            return Err(MemberValidationError::InvalidMobile(mobile.len()));
        }

        Ok(Member {
            id: generate_id("member"),
            name: name.to_string(),
            mobile,
            address: command.address.trim().to_string(),
            id_proof_type: command
                .id_proof_type
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(DEFAULT_ID_PROOF_TYPE)
                .to_string(),
            id_proof_number: command.id_proof_number.trim().to_string(),
            is_active: true,
        })
    }

    /// Build a member from an import row. Never fails: missing values fall
    /// back to defaults and the mobile keeps whatever digits were found.
    pub fn member_from_row(&self, row: &BulkImportRow) -> Member {
        let field = |value: &Option<String>| value.as_deref().map(str::trim).unwrap_or("").to_string();
        let mobile = normalize_mobile(row.mobile.as_deref().unwrap_or(""));
        if mobile.len() != MOBILE_DIGITS {
            warn!("Imported member {:?} has a {}-digit mobile", row.name, mobile.len());
        }
        let name = field(&row.name);
        let id_proof_type = field(&row.id_proof_type);

        Member {
            id: generate_id("member"),
            name: if name.is_empty() { UNNAMED_MEMBER.to_string() } else { name },
            mobile,
            address: field(&row.address),
            id_proof_type: if id_proof_type.is_empty() {
                DEFAULT_ID_PROOF_TYPE.to_string()
            } else {
                id_proof_type
            },
            id_proof_number: field(&row.id_proof_number),
            is_active: true,
        }
    }

    /// Split CSV text into import rows.
    ///
    /// Columns are `Name, Mobile, Address, ID Type, ID Number`; short rows
    /// are allowed. A first line mentioning "name" or "mobile" is treated as
    /// a header and skipped. Blank lines are ignored.
    pub fn parse_bulk_csv(&self, text: &str) -> Result<Vec<BulkImportRow>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(text.as_bytes());

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            if record.iter().all(|f| f.is_empty()) {
                continue;
            }
            if index == 0 {
                let first = record.iter().collect::<Vec<_>>().join(",").to_lowercase();
                if first.contains("name") || first.contains("mobile") {
                    debug!("Skipping header line: {}", first);
                    continue;
                }
            }
            let column = |i: usize| record.get(i).filter(|v| !v.is_empty()).map(str::to_string);
            rows.push(BulkImportRow {
                name: column(0),
                mobile: column(1),
                address: column(2),
                id_proof_type: column(3),
                id_proof_number: column(4),
            });
        }
        debug!("Parsed {} import rows", rows.len());
        Ok(rows)
    }

    /// Next token in a group: one past the highest token issued, or 1.
    pub fn next_token_no(&self, snapshot: &LedgerSnapshot, chit_group_id: &str) -> u32 {
        snapshot
            .memberships
            .iter()
            .filter(|m| m.chit_group_id == chit_group_id)
            .map(|m| m.token_no)
            .max()
            .map_or(1, |max| max + 1)
    }

    /// Join a member to a group and generate the member's schedule.
    ///
    /// A second join of the same pair is a no-op returning the existing
    /// membership. When the group does not exist the membership is still
    /// recorded but no schedule can be generated.
    pub fn add_membership(
        &self,
        snapshot: &mut LedgerSnapshot,
        chit_group_id: &str,
        member_id: &str,
        joined_on: NaiveDate,
    ) -> MembershipOutcome {
        if let Some(existing) = snapshot.find_membership(chit_group_id, member_id) {
            debug!("Member {} already belongs to group {}", member_id, chit_group_id);
            return MembershipOutcome::AlreadyMember(existing.clone());
        }

        let membership = GroupMembership {
            id: generate_id("membership"),
            chit_group_id: chit_group_id.to_string(),
            member_id: member_id.to_string(),
            token_no: self.next_token_no(snapshot, chit_group_id),
            joined_on,
        };

        match snapshot.find_chit(chit_group_id).cloned() {
            Some(group) => {
                self.schedule_service.append_schedule(snapshot, &group, &membership);
            }
            None => warn!(
                "Membership for {} references missing group {}; no schedule generated",
                member_id, chit_group_id
            ),
        }

        info!(
            "Member {} joined group {} with token {}",
            member_id, chit_group_id, membership.token_no
        );
        snapshot.memberships.push(membership.clone());
        MembershipOutcome::Created(membership)
    }
}
