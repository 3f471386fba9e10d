//! Blogdex Types - Shared domain types
//!
//! This crate contains domain types used across Blogdex services:
//! - Blogger identity and subscription tiers
//! - Submission lifecycle states
//! - Billing records and derived entitlements
//! - Domain verification
//! - Notification templates

pub mod billing;
pub mod ids;
pub mod notification;
pub mod submission;
pub mod tier;
pub mod verification;

pub use billing::*;
pub use ids::*;
pub use notification::*;
pub use submission::*;
pub use tier::*;
pub use verification::*;
