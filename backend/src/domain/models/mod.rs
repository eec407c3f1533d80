//! Domain models for the chit ledger.
//!
//! The entity records themselves live in the `shared` crate so that any UI can
//! deserialize them directly. This module adds the persisted snapshot that
//! groups them together and the validation errors raised when building them.

pub mod allotment;
pub mod chit_group;
pub mod member;
pub mod payment;
pub mod snapshot;
pub mod sync;

pub use allotment::AllotmentError;
pub use chit_group::{build_chit_group, ChitGroupValidationError};
pub use member::MemberValidationError;
pub use payment::PaymentValidationError;
pub use snapshot::LedgerSnapshot;
pub use sync::SyncError;

use uuid::Uuid;

/// Generate an opaque identifier in the `kind::uuid` format used for every
/// ledger record.
pub fn generate_id(kind: &str) -> String {
    format!("{}::{}", kind, Uuid::new_v4())
}
