//! Domain verification types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::BloggerId;

/// Ownership-proof challenge method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMethod {
    /// TXT record at a namespaced subdomain
    DnsTxt,
    /// Token file served from the site root
    HtmlFile,
    /// Meta tag on the homepage
    MetaTag,
}

impl std::fmt::Display for VerificationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DnsTxt => write!(f, "dns_txt"),
            Self::HtmlFile => write!(f, "html_file"),
            Self::MetaTag => write!(f, "meta_tag"),
        }
    }
}

impl std::str::FromStr for VerificationMethod {
    type Err = VerificationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dns_txt" => Ok(Self::DnsTxt),
            "html_file" => Ok(Self::HtmlFile),
            "meta_tag" => Ok(Self::MetaTag),
            _ => Err(VerificationParseError(s.to_string())),
        }
    }
}

/// Verification progress for a blogger's declared domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// No challenge issued yet, or the declared domain changed
    Unverified,
    /// A challenge is outstanding
    Pending,
    /// Ownership proof succeeded
    Verified,
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unverified => write!(f, "unverified"),
            Self::Pending => write!(f, "pending"),
            Self::Verified => write!(f, "verified"),
        }
    }
}

impl std::str::FromStr for VerificationStatus {
    type Err = VerificationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unverified" => Ok(Self::Unverified),
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            _ => Err(VerificationParseError(s.to_string())),
        }
    }
}

/// Error parsing a verification method or status string
#[derive(Debug, Clone)]
pub struct VerificationParseError(pub String);

impl std::fmt::Display for VerificationParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid verification value: {}", self.0)
    }
}

impl std::error::Error for VerificationParseError {}

/// A blogger's domain verification record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainVerification {
    /// Blogger who owns the record
    pub blogger_id: BloggerId,
    /// Registrable host extracted from the declared blog URL
    pub domain: String,
    /// Chosen challenge method, once a challenge has been issued
    pub method: Option<VerificationMethod>,
    /// Outstanding challenge token; single-use per attempt
    pub token: Option<String>,
    /// Verification progress
    pub status: VerificationStatus,
    /// When ownership proof last succeeded
    pub verified_at: Option<DateTime<Utc>>,
}

/// An issued ownership-proof challenge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainChallenge {
    /// Domain the challenge proves control of
    pub domain: String,
    /// Challenge method
    pub method: VerificationMethod,
    /// Token the blogger must publish
    pub token: String,
    /// Human-readable placement instructions
    pub instructions: String,
}
