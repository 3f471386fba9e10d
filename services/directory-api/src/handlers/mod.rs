//! HTTP handlers

mod billing;
mod bloggers;
mod health;
mod notifications;
mod submissions;
mod verification;
mod webhook;

pub use billing::{create_checkout, create_portal};
pub use bloggers::{create_blogger, list_submissions};
pub use health::{health, ready};
pub use notifications::list_failed_notifications;
pub use submissions::{
    activate_submission, change_submission_url, create_submission, deactivate_submission,
    review_submission, submit_draft,
};
pub use verification::{declare_blog_url, issue_challenge, verify_domain};
pub use webhook::stripe_webhook;
