//! Business rules between the HTTP handlers and the store.
//!
//! Every function takes the store as `&dyn Store` so handlers and tests can
//! share them without an HTTP layer.

pub mod accounts;
pub mod activities;
pub mod import;
pub mod scores;
pub mod standings;
pub mod teams;
pub mod validation;
