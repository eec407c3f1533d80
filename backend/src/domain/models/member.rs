/// Number of digits in a normalized mobile number
pub const MOBILE_DIGITS: usize = 10;

/// Id proof type used when none is given
pub const DEFAULT_ID_PROOF_TYPE: &str = "Aadhar";

/// Name given to bulk-imported members without one
pub const UNNAMED_MEMBER: &str = "Unnamed";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MemberValidationError {
    #[error("Member name cannot be empty")]
    EmptyName,
    #[error("Mobile number must have exactly 10 digits, got {0} digits")]
    InvalidMobile(usize),
    #[error("Member not found: {0}")]
    NotFound(String),
}

/// Strip everything but digits and keep the last ten.
///
/// Inputs with fewer than ten digits come back shorter; callers that need a
/// complete number check the length themselves.
pub fn normalize_mobile(raw: &str) -> String {
    let digits: Vec<char> = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let start = digits.len().saturating_sub(MOBILE_DIGITS);
    digits[start..].iter().collect()
}
