/// Reasons a confirm request is refused by the allotment engine
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AllotmentError {
    #[error("Chit group not found: {0}")]
    GroupNotFound(String),
    #[error("Member not found: {0}")]
    MemberNotFound(String),
    #[error("Month {month_no} is outside the chit's 1..={total_months} months")]
    MonthOutOfRange { month_no: u32, total_months: u32 },
    #[error("Member {0} does not belong to this chit group")]
    NotAMember(String),
    #[error("Member {0} is inactive")]
    MemberInactive(String),
    #[error("Member {member_id} already holds allotment {allotment_id} in this group")]
    MemberAlreadyAllotted { member_id: String, allotment_id: String },
    #[error("Month {month_no} already has allotment {allotment_id} in this group")]
    MonthAlreadyAllotted { month_no: u32, allotment_id: String },
    #[error("Allotted amount must be positive")]
    NonPositiveAmount,
}
