//! # IO Module
//!
//! Adapter layer between HTTP clients and the ledger. Handlers translate
//! the DTOs of the `shared` crate into domain commands, call the ledger and
//! translate domain errors into status codes. No business rules live here.

pub mod rest;
