use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a chit group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChitStatus {
    Active,
    Closed,
}

impl fmt::Display for ChitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChitStatus::Active => write!(f, "active"),
            ChitStatus::Closed => write!(f, "closed"),
        }
    }
}

/// Half a paisa. Money differences smaller than this are zero.
pub const MONEY_EPSILON: f64 = 0.005;

/// Round a rupee amount to whole paise.
pub fn round_money(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Unpaid part of `due_amount`, in whole paise and never negative.
pub fn balance_of(due_amount: f64, paid_amount: f64) -> f64 {
    let balance = round_money(due_amount - paid_amount);
    if balance < MONEY_EPSILON {
        0.0
    } else {
        balance
    }
}

/// Payment state of a single installment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Partial,
    Paid,
}

impl PaymentStatus {
    /// Derive the status from what has been paid against what is due.
    ///
    /// `paid` wins over `partial` whenever the paid amount covers the due
    /// amount, so a zero-due record with nothing paid reads as paid.
    /// Amounts are compared to within half a paisa.
    pub fn from_amounts(paid_amount: f64, due_amount: f64) -> Self {
        if paid_amount + MONEY_EPSILON >= due_amount {
            PaymentStatus::Paid
        } else if paid_amount >= MONEY_EPSILON {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Pending
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Partial => write!(f, "partial"),
            PaymentStatus::Paid => write!(f, "paid"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Collector,
}

/// An operator account. Authentication happens outside the ledger; the
/// snapshot only carries the records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub name: String,
    pub role: UserRole,
    pub username: String,
    pub password_hash: String,
    pub is_active: bool,
}

/// A pooled savings group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChitGroup {
    pub id: String,
    pub name: String,
    /// Total pool value of the chit
    pub chit_value: f64,
    /// Number of monthly installments (and allotments) in the chit
    pub total_months: u32,
    /// Installment paid by members who have not won yet
    pub installment_regular: f64,
    /// Installment paid after a member's allotment month
    pub installment_allotted: f64,
    /// Calendar anchor for month 1
    pub start_month: NaiveDate,
    pub status: ChitStatus,
    /// UPI destination used in payment links
    pub upi_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub name: String,
    /// Normalized mobile number, 10 digits for individually created members
    pub mobile: String,
    pub address: String,
    pub id_proof_type: String,
    pub id_proof_number: String,
    pub is_active: bool,
}

/// Links a member to a chit group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub id: String,
    pub chit_group_id: String,
    pub member_id: String,
    /// Sequence number unique within the group
    pub token_no: u32,
    pub joined_on: NaiveDate,
}

/// One installment of one member in one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentSchedule {
    pub id: String,
    pub chit_group_id: String,
    pub member_id: String,
    /// 1-based month number within the chit
    pub month_no: u32,
    pub due_date: NaiveDate,
    pub due_amount: f64,
    /// Sum of all payments applied to this installment
    pub paid_amount: f64,
    /// Date of the last payment applied
    pub paid_date: Option<NaiveDate>,
    pub status: PaymentStatus,
    /// True for the month this member won the pool
    pub is_prize_month: bool,
}

/// Designation of a member as a month's winner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allotment {
    pub id: String,
    pub chit_group_id: String,
    pub member_id: String,
    pub month_no: u32,
    pub allotted_amount: f64,
    pub is_confirmed: bool,
    #[serde(default)]
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl Allotment {
    /// Confirmed and not revoked
    pub fn is_active(&self) -> bool {
        self.is_confirmed && !self.revoked
    }
}

/// Append-only payment log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub chit_group_id: String,
    pub member_id: String,
    pub month_no: u32,
    pub paid_amount: f64,
    pub payment_date: NaiveDate,
}

/// Settings carried in the snapshot but not interpreted by the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterSettings {
    #[serde(default = "empty_object")]
    pub late_fee_rules: serde_json::Value,
    #[serde(default = "empty_object")]
    pub receipt_template_config: serde_json::Value,
    #[serde(default = "empty_object")]
    pub whatsapp_config: serde_json::Value,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl Default for MasterSettings {
    fn default() -> Self {
        Self {
            late_fee_rules: empty_object(),
            receipt_template_config: empty_object(),
            whatsapp_config: empty_object(),
        }
    }
}

/// Point-in-time view of one installment, recomputed from amounts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct InstallmentStatus {
    pub due: f64,
    pub paid: f64,
    /// Unpaid portion, never negative
    pub balance: f64,
    pub status: PaymentStatus,
}

/// One row of the outstanding-balance report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutstandingRow {
    pub token_no: u32,
    pub member_id: String,
    pub member_name: String,
    pub total_due: f64,
    pub total_paid: f64,
    pub outstanding: f64,
}

/// One month of a member's ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub month_no: u32,
    pub due_date: Option<NaiveDate>,
    pub due: f64,
    pub paid: f64,
    pub balance: f64,
    pub status: PaymentStatus,
    pub is_prize_month: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberLedgerResponse {
    pub chit_group_id: String,
    pub member_id: String,
    pub member_name: String,
    pub mobile: String,
    pub rows: Vec<LedgerRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DashboardSummary {
    pub active_groups: usize,
    pub active_members: usize,
    pub total_collected: f64,
    pub total_outstanding: f64,
}

/// Members and months still open for allotment in a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllotmentCandidates {
    pub members: Vec<Member>,
    pub months: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateChitGroupRequest {
    pub name: String,
    pub chit_value: f64,
    pub total_months: u32,
    pub installment_regular: f64,
    pub installment_allotted: f64,
    pub start_month: NaiveDate,
    #[serde(default)]
    pub upi_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMemberRequest {
    pub name: String,
    /// Raw mobile input; non-digits are stripped before validation
    pub mobile: String,
    #[serde(default)]
    pub address: String,
    pub id_proof_type: Option<String>,
    #[serde(default)]
    pub id_proof_number: String,
    /// Join this group right away when present
    pub chit_group_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkImportRequest {
    /// CSV rows: Name, Mobile, Address, ID Type, ID Number
    pub csv: String,
    pub chit_group_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkImportResponse {
    pub imported: Vec<Member>,
    pub memberships_created: usize,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMembershipRequest {
    pub chit_group_id: String,
    pub member_id: String,
    pub joined_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipResponse {
    pub membership: GroupMembership,
    /// False when the member already belonged to the group
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPaymentRequest {
    pub chit_group_id: String,
    pub member_id: String,
    pub month_no: u32,
    pub paid_amount: f64,
    /// Defaults to today
    pub payment_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPaymentResponse {
    pub payment: Payment,
    /// Updated installment, absent when no schedule matched the payment
    pub schedule: Option<InstallmentSchedule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmAllotmentRequest {
    pub chit_group_id: String,
    pub member_id: String,
    pub month_no: u32,
    pub allotted_amount: f64,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevokeAllotmentResponse {
    pub revoked: bool,
    pub success_message: String,
}

/// Identifies the installment a reminder or receipt is about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub chit_group_id: String,
    pub member_id: String,
    pub month_no: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationResponse {
    pub sent: bool,
    pub amount: f64,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncStatusResponse {
    pub dirty: bool,
    pub last_synced_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResponse {
    pub synced: bool,
    pub dirty: bool,
    pub message: String,
}
