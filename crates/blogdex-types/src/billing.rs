//! Billing and entitlement-derivation types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{BloggerId, Tier};

/// Billing record status, driven exclusively by external payment events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingStatus {
    /// Subscription is paid up
    Active,
    /// A payment attempt has failed; retries are in flight
    PastDue,
    /// Terminal until a new checkout recreates the record
    Canceled,
}

impl std::fmt::Display for BillingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::PastDue => write!(f, "past_due"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}

impl std::str::FromStr for BillingStatus {
    type Err = BillingStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "past_due" => Ok(Self::PastDue),
            "canceled" => Ok(Self::Canceled),
            _ => Err(BillingStatusParseError(s.to_string())),
        }
    }
}

/// Error parsing a billing status string
#[derive(Debug, Clone)]
pub struct BillingStatusParseError(pub String);

impl std::fmt::Display for BillingStatusParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid billing status: {}", self.0)
    }
}

impl std::error::Error for BillingStatusParseError {}

/// How far payment-failure notices have progressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureNoticeStage {
    /// No failure notice outstanding
    None,
    /// First "payment failed, will retry" notice sent
    First,
    /// Final notice with a hard downgrade date sent
    Final,
}

impl std::fmt::Display for FailureNoticeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::First => write!(f, "first"),
            Self::Final => write!(f, "final"),
        }
    }
}

impl std::str::FromStr for FailureNoticeStage {
    type Err = BillingStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "first" => Ok(Self::First),
            "final" => Ok(Self::Final),
            _ => Err(BillingStatusParseError(s.to_string())),
        }
    }
}

/// A blogger's billing record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingRecord {
    /// Blogger who owns the record
    pub blogger_id: BloggerId,
    /// Current status
    pub status: BillingStatus,
    /// End of the current paid period
    pub period_end: DateTime<Utc>,
    /// Failure notice progression
    pub failure_notice_stage: FailureNoticeStage,
    /// Payment processor customer reference
    pub customer_ref: String,
    /// Payment processor subscription reference
    pub subscription_ref: Option<String>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
}

impl BillingRecord {
    /// Derive the tier this record grants at `now`.
    ///
    /// `active` grants pro; `past_due` grants pro until the grace period
    /// past `period_end` elapses; `canceled` grants free. A blogger with
    /// no billing record at all is free.
    pub fn tier_at(&self, now: DateTime<Utc>, grace: Duration) -> Tier {
        match self.status {
            BillingStatus::Active => Tier::Pro,
            BillingStatus::PastDue => {
                if now <= self.period_end + grace {
                    Tier::Pro
                } else {
                    Tier::Free
                }
            }
            BillingStatus::Canceled => Tier::Free,
        }
    }
}

/// Checkout session returned by the payment provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider checkout session ID
    pub session_id: String,
    /// Checkout URL to redirect the blogger to
    pub url: String,
}

/// Billing-management portal session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalSession {
    /// Portal session URL
    pub url: String,
}
