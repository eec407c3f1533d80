//! Payment reminders and receipts.
//!
//! Delivery is fire-and-forget: the ledger hands a message to a [`Notifier`]
//! and never looks at the outcome. The default notifier only composes the
//! WhatsApp links and logs them; a real transport plugs in behind the trait.

use std::sync::Arc;

use tracing::info;

use crate::domain::ledger_store::ChitLedger;

/// Outbound message channel
pub trait Notifier: Send + Sync {
    fn send_payment_link(
        &self,
        upi_id: &str,
        mobile: &str,
        name: &str,
        group_name: &str,
        month_no: u32,
        amount: f64,
    );

    #[allow(clippy::too_many_arguments)]
    fn send_receipt(
        &self,
        chit_group_id: &str,
        member_id: &str,
        mobile: &str,
        name: &str,
        group_name: &str,
        month_no: u32,
        amount: f64,
    );
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum NotificationError {
    #[error("Chit group not found: {0}")]
    GroupNotFound(String),
    #[error("Member not found: {0}")]
    MemberNotFound(String),
    #[error("Nothing is due for month {0}")]
    NothingDue(u32),
    #[error("Nothing has been paid for month {0}")]
    NothingPaid(u32),
}

/// Composes `wa.me` links with an embedded UPI payment link and logs them.
#[derive(Clone)]
pub struct WhatsAppNotifier {
    country_code: String,
}

impl WhatsAppNotifier {
    pub fn new() -> Self {
        Self {
            country_code: "91".to_string(),
        }
    }

    pub fn payment_link_message(
        &self,
        upi_id: &str,
        name: &str,
        group_name: &str,
        month_no: u32,
        amount: f64,
    ) -> String {
        let upi_link = format!(
            "upi://pay?pa={}&pn={}&am={:.2}&cu=INR&tn={}",
            encode(upi_id),
            encode(group_name),
            amount,
            encode(&format!("{} month {}", group_name, month_no))
        );
        format!(
            "Dear {}, your installment of Rs.{:.2} for {} (month {}) is due. Pay here: {}",
            name, amount, group_name, month_no, upi_link
        )
    }

    pub fn receipt_message(&self, name: &str, group_name: &str, month_no: u32, amount: f64) -> String {
        format!(
            "Dear {}, we received Rs.{:.2} towards {} (month {}). Thank you!",
            name, amount, group_name, month_no
        )
    }

    pub fn chat_link(&self, mobile: &str, message: &str) -> String {
        format!("https://wa.me/{}{}?text={}", self.country_code, mobile, encode(message))
    }
}

impl Default for WhatsAppNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for WhatsAppNotifier {
    fn send_payment_link(
        &self,
        upi_id: &str,
        mobile: &str,
        name: &str,
        group_name: &str,
        month_no: u32,
        amount: f64,
    ) {
        let message = self.payment_link_message(upi_id, name, group_name, month_no, amount);
        info!("Payment reminder for {}: {}", name, self.chat_link(mobile, &message));
    }

    fn send_receipt(
        &self,
        chit_group_id: &str,
        member_id: &str,
        mobile: &str,
        name: &str,
        group_name: &str,
        month_no: u32,
        amount: f64,
    ) {
        let message = self.receipt_message(name, group_name, month_no, amount);
        info!(
            "Receipt for {} ({} in {}): {}",
            name,
            member_id,
            chit_group_id,
            self.chat_link(mobile, &message)
        );
    }
}

/// Percent-encode everything outside the URL unreserved set.
fn encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => (b as char).to_string(),
            _ => format!("%{:02X}", b),
        })
        .collect()
}

#[derive(Clone)]
pub struct NotificationService {
    notifier: Arc<dyn Notifier>,
}

impl NotificationService {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Send a payment link for the unpaid balance of an installment.
    /// Returns the amount requested.
    pub fn send_reminder(
        &self,
        ledger: &ChitLedger,
        chit_group_id: &str,
        member_id: &str,
        month_no: u32,
    ) -> Result<f64, NotificationError> {
        let (group, member) = Self::parties(ledger, chit_group_id, member_id)?;
        let status = ledger.resolve_status(chit_group_id, member_id, month_no);
        if status.balance <= 0.0 {
            return Err(NotificationError::NothingDue(month_no));
        }
        self.notifier.send_payment_link(
            &group.upi_id,
            &member.mobile,
            &member.name,
            &group.name,
            month_no,
            status.balance,
        );
        Ok(status.balance)
    }

    /// Send a receipt for what has been paid on an installment.
    /// Returns the amount acknowledged.
    pub fn send_receipt(
        &self,
        ledger: &ChitLedger,
        chit_group_id: &str,
        member_id: &str,
        month_no: u32,
    ) -> Result<f64, NotificationError> {
        let (group, member) = Self::parties(ledger, chit_group_id, member_id)?;
        let status = ledger.resolve_status(chit_group_id, member_id, month_no);
        if status.paid <= 0.0 {
            return Err(NotificationError::NothingPaid(month_no));
        }
        self.notifier.send_receipt(
            chit_group_id,
            member_id,
            &member.mobile,
            &member.name,
            &group.name,
            month_no,
            status.paid,
        );
        Ok(status.paid)
    }

    fn parties(
        ledger: &ChitLedger,
        chit_group_id: &str,
        member_id: &str,
    ) -> Result<(shared::ChitGroup, shared::Member), NotificationError> {
        let group = ledger
            .chit_group(chit_group_id)
            .ok_or_else(|| NotificationError::GroupNotFound(chit_group_id.to_string()))?;
        let member = ledger
            .member(member_id)
            .ok_or_else(|| NotificationError::MemberNotFound(member_id.to_string()))?;
        Ok((group, member))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_link_message_embeds_upi_link() {
        let notifier = WhatsAppNotifier::new();
        let message = notifier.payment_link_message("friday@upi", "Asha", "Friday Chit", 3, 1200.0);
        assert!(message.contains("Rs.1200.00"));
        assert!(message.contains("upi://pay?pa=friday%40upi&pn=Friday%20Chit&am=1200.00"));
    }

    #[test]
    fn test_chat_link_prefixes_country_code() {
        let notifier = WhatsAppNotifier::new();
        let link = notifier.chat_link("9876543210", "Hi there");
        assert_eq!(link, "https://wa.me/919876543210?text=Hi%20there");
    }

    #[test]
    fn test_encode_multibyte() {
        assert_eq!(encode("₹"), "%E2%82%B9");
        assert_eq!(encode("a-b_c.d~"), "a-b_c.d~");
    }
}
