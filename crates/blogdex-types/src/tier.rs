//! Subscription tier types

use serde::{Deserialize, Serialize};

/// Subscription tier levels
///
/// A blogger's tier is always derived from their billing record; it is
/// never written directly by any surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Free tier - up to 3 simultaneously listed posts
    Free,
    /// Pro tier - unlimited listed posts
    Pro,
}

/// Maximum number of simultaneously active, approved submissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quota {
    /// At most this many posts may be active at once
    Limited(u32),
    /// No limit on active posts
    Unlimited,
}

impl Quota {
    /// Whether `count` active posts would exceed this quota
    pub const fn exceeded_by(&self, count: u32) -> bool {
        match self {
            Self::Limited(max) => count > *max,
            Self::Unlimited => false,
        }
    }

    /// The concrete limit, if any
    pub const fn limit(&self) -> Option<u32> {
        match self {
            Self::Limited(max) => Some(*max),
            Self::Unlimited => None,
        }
    }
}

impl Tier {
    /// Get the active-post quota for this tier
    pub const fn active_post_quota(&self) -> Quota {
        match self {
            Self::Free => Quota::Limited(3),
            Self::Pro => Quota::Unlimited,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Pro => write!(f, "pro"),
        }
    }
}

impl std::str::FromStr for Tier {
    type Err = TierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "pro" | "professional" => Ok(Self::Pro),
            _ => Err(TierParseError(s.to_string())),
        }
    }
}

/// Error parsing a tier string
#[derive(Debug, Clone)]
pub struct TierParseError(pub String);

impl std::fmt::Display for TierParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid tier: {}", self.0)
    }
}

impl std::error::Error for TierParseError {}
