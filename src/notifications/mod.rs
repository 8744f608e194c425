//! Outbound notifications.

pub mod email;

pub use email::TransactionMailer;
