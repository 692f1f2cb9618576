//! Outbound collaborators: text completion, payments, object storage.

pub mod ai;
pub mod payments;
pub mod storage;
