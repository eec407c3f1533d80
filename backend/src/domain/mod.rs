//! Domain layer of the chit ledger.
//!
//! The services here are pure functions over a [`LedgerSnapshot`]; they know
//! nothing about persistence. [`ChitLedger`] owns the snapshot, runs every
//! mutation through them and takes care of persistence and sync.
//!
//! - [`schedule_service`]: installment schedule generation
//! - [`payment_service`]: payment log and accumulation
//! - [`allotment_service`]: allotment confirm/revoke and the rate change
//! - [`status_resolver`]: due/paid/balance/status on read
//! - [`member_service`]: members, bulk import and memberships
//! - [`report_service`]: outstanding, ledger and dashboard reports
//! - [`notification_service`]: payment reminders and receipts
//! - [`ledger_store`]: the local-first store

pub mod allotment_service;
pub mod commands;
pub mod ledger_store;
pub mod member_service;
pub mod models;
pub mod notification_service;
pub mod payment_service;
pub mod report_service;
pub mod schedule_service;
pub mod status_resolver;

#[cfg(test)]
pub(crate) mod test_utils;

pub use allotment_service::AllotmentService;
pub use ledger_store::{ChitLedger, DEFAULT_SYNC_TIMEOUT};
pub use member_service::MemberService;
pub use models::LedgerSnapshot;
pub use notification_service::{NotificationError, NotificationService, Notifier, WhatsAppNotifier};
pub use payment_service::PaymentService;
pub use report_service::ReportService;
pub use schedule_service::ScheduleService;
pub use status_resolver::StatusResolver;
