//! PlanDesk Shared Types
//!
//! This crate contains the catalog, assignment and wire types shared by the
//! entitlement editor and the admin API client.

pub mod error;
pub mod types;

pub use error::*;
pub use types::*;
