#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PaymentValidationError {
    #[error("Payment amount must be positive")]
    NonPositiveAmount,
    #[error("Month number is outside the chit duration")]
    InvalidMonth,
}
