//! Data models for tug requirement lookups.
//!
//! This module contains the data structures shared by the loader, the
//! lookup engine and the presentation layer:
//!
//! - `Band`: one row of the reference table
//! - `Operation`: berthing or unberthing
//! - `TugRequirement`, `LookupOutcome`: what a query resolves to

pub mod band;
pub mod requirement;

pub use band::Band;
pub use requirement::{LookupOutcome, Operation, TugRequirement};
