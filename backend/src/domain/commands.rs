//! Domain-level command and result types.
//! These structs are used by services inside the domain layer and are **not**
//! exposed over the public API. The REST layer maps the DTOs from the `shared`
//! crate onto them.

pub mod chit {
    use chrono::NaiveDate;

    /// Input for creating a new chit group.
    #[derive(Debug, Clone)]
    pub struct CreateChitGroupCommand {
        pub name: String,
        pub chit_value: f64,
        pub total_months: u32,
        pub installment_regular: f64,
        pub installment_allotted: f64,
        pub start_month: NaiveDate,
        pub upi_id: String,
    }
}

pub mod member {
    use chrono::NaiveDate;
    use shared::{GroupMembership, Member};

    /// Input for creating a single member from the admin form.
    #[derive(Debug, Clone)]
    pub struct CreateMemberCommand {
        pub name: String,
        pub mobile: String,
        pub address: String,
        pub id_proof_type: Option<String>,
        pub id_proof_number: String,
        pub chit_group_id: Option<String>,
    }

    /// One row of a bulk import. Every field may be missing.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct BulkImportRow {
        pub name: Option<String>,
        pub mobile: Option<String>,
        pub address: Option<String>,
        pub id_proof_type: Option<String>,
        pub id_proof_number: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct AddMembershipCommand {
        pub chit_group_id: String,
        pub member_id: String,
        /// Defaults to today
        pub joined_on: Option<NaiveDate>,
    }

    /// Result of adding a membership. Adding an existing (group, member)
    /// pair is a no-op that hands back the membership already on file.
    #[derive(Debug, Clone, PartialEq)]
    pub enum MembershipOutcome {
        Created(GroupMembership),
        AlreadyMember(GroupMembership),
    }

    impl MembershipOutcome {
        pub fn membership(&self) -> &GroupMembership {
            match self {
                MembershipOutcome::Created(m) | MembershipOutcome::AlreadyMember(m) => m,
            }
        }

        pub fn is_created(&self) -> bool {
            matches!(self, MembershipOutcome::Created(_))
        }
    }

    /// Result of creating a member, with the membership when a group was given.
    #[derive(Debug, Clone)]
    pub struct CreateMemberResult {
        pub member: Member,
        pub membership: Option<MembershipOutcome>,
    }

    #[derive(Debug, Clone)]
    pub struct BulkImportResult {
        pub members: Vec<Member>,
        pub memberships_created: usize,
    }
}

pub mod payment {
    use chrono::NaiveDate;
    use shared::{InstallmentSchedule, Payment};

    #[derive(Debug, Clone)]
    pub struct RecordPaymentCommand {
        pub chit_group_id: String,
        pub member_id: String,
        pub month_no: u32,
        pub paid_amount: f64,
        /// Defaults to today
        pub payment_date: Option<NaiveDate>,
    }

    /// The logged payment and the installment it landed on, if any.
    #[derive(Debug, Clone)]
    pub struct PaymentOutcome {
        pub payment: Payment,
        pub schedule: Option<InstallmentSchedule>,
    }
}

pub mod allotment {
    use shared::Allotment;

    #[derive(Debug, Clone)]
    pub struct ConfirmAllotmentCommand {
        pub chit_group_id: String,
        pub member_id: String,
        pub month_no: u32,
        pub allotted_amount: f64,
        pub created_by: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RevokeOutcome {
        Revoked(Allotment),
        /// The record was revoked earlier; nothing changed
        AlreadyRevoked(Allotment),
        NotFound,
    }
}
