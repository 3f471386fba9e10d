//! Blogdex Verify Core - Domain-ownership verification
//!
//! Proves that a blogger controls the domain behind their declared blog URL
//! via one of three challenge methods (DNS TXT record, hosted token file,
//! homepage meta tag), and provides the URL/domain matching helper that
//! gates every submission and URL change.

pub mod domain;
pub mod error;
pub mod html;
pub mod probe;
pub mod service;
pub mod token;

pub use domain::{registrable_domain, url_matches_verified_domain};
pub use error::VerifyError;
pub use probe::{DomainProber, HttpProber, ProbeError};
pub use service::{VerificationService, VerifyConfig, VerifyOutcome, TXT_RECORD_LABEL};
pub use token::generate_challenge_token;
