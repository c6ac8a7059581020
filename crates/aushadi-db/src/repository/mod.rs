//! Repository implementations.
//!
//! One repository per aggregate: stock lots, sales, patient registrations,
//! lab receipts. Repositories are plain persistence - validation and the
//! multi-row transactions live in [`crate::ledger`].

pub mod lab;
pub mod patient;
pub mod sale;
pub mod stock;
