//! Verification service - challenge issue and ownership proof

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};

use blogdex_db::VerificationRepository;
use blogdex_types::{
    BloggerId, DomainChallenge, DomainVerification, VerificationMethod, VerificationStatus,
};

use crate::domain::registrable_domain;
use crate::error::VerifyError;
use crate::html::find_meta_content;
use crate::probe::DomainProber;
use crate::token::generate_challenge_token;

/// TXT challenge records live under this label
pub const TXT_RECORD_LABEL: &str = "_blogdex-verification";

/// Meta-tag challenges use this attribute name
const META_TAG_NAME: &str = "blogdex-verification";

/// Verification service configuration
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// DNS-over-HTTPS resolver endpoint
    pub doh_endpoint: String,
    /// User agent sent with every probe
    pub user_agent: String,
    /// Upper bound on any single probe
    pub probe_timeout: Duration,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            doh_endpoint: "https://cloudflare-dns.com/dns-query".to_string(),
            user_agent: "blogdex-verifier/0.1".to_string(),
            probe_timeout: Duration::from_secs(10),
        }
    }
}

impl VerifyConfig {
    /// Override the DNS-over-HTTPS resolver
    pub fn with_doh_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.doh_endpoint = endpoint.into();
        self
    }

    /// Override the probe timeout
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }
}

/// Outcome of a verification attempt
///
/// A failed proof is a normal outcome, not an error: the blogger simply has
/// not published the token (or DNS has not propagated), and will re-invoke.
#[derive(Debug, Clone)]
pub struct VerifyOutcome {
    /// Whether ownership proof succeeded
    pub verified: bool,
    /// Human-readable failure reason when it did not
    pub reason: Option<String>,
}

impl VerifyOutcome {
    fn ok() -> Self {
        Self {
            verified: true,
            reason: None,
        }
    }

    fn failed(reason: impl Into<String>) -> Self {
        Self {
            verified: false,
            reason: Some(reason.into()),
        }
    }
}

/// Domain verification service
pub struct VerificationService<R: VerificationRepository, P: DomainProber> {
    repo: Arc<R>,
    prober: Arc<P>,
}

impl<R: VerificationRepository, P: DomainProber> VerificationService<R, P> {
    /// Create a new verification service
    pub fn new(repo: Arc<R>, prober: Arc<P>) -> Self {
        Self { repo, prober }
    }

    /// Declare (or re-declare) the blogger's blog URL.
    ///
    /// A new registrable domain resets verification to `unverified` and
    /// discards any outstanding challenge; re-declaring the same domain
    /// leaves the record untouched.
    #[instrument(skip(self))]
    pub async fn declare_blog_url(
        &self,
        blogger_id: BloggerId,
        blog_url: &str,
    ) -> Result<DomainVerification, VerifyError> {
        let domain = registrable_domain(blog_url)?;

        if let Some(existing) = self.repo.find_by_blogger_id(blogger_id.0).await? {
            if existing.domain == domain {
                return Ok(existing.to_domain()?);
            }
        }

        info!(blogger_id = %blogger_id, domain = %domain, "Resetting domain verification");
        let row = self.repo.reset_domain(blogger_id.0, &domain).await?;
        Ok(row.to_domain()?)
    }

    /// Issue an ownership-proof challenge for the declared domain.
    #[instrument(skip(self))]
    pub async fn issue_challenge(
        &self,
        blogger_id: BloggerId,
        method: VerificationMethod,
    ) -> Result<DomainChallenge, VerifyError> {
        let record = self
            .repo
            .find_by_blogger_id(blogger_id.0)
            .await?
            .ok_or(VerifyError::NotDeclared)?
            .to_domain()?;

        if record.status == VerificationStatus::Verified {
            return Err(VerifyError::AlreadyVerified);
        }

        let token = generate_challenge_token();
        self.repo
            .set_challenge(blogger_id.0, &method.to_string(), &token)
            .await?;

        info!(blogger_id = %blogger_id, domain = %record.domain, method = %method, "Issued domain challenge");

        Ok(DomainChallenge {
            instructions: challenge_instructions(&record.domain, method, &token),
            domain: record.domain,
            method,
            token,
        })
    }

    /// Run the external ownership check for the outstanding challenge.
    ///
    /// Idempotent once verified: re-running reports success without any
    /// probe. A failed probe leaves the record `pending`; nothing retries
    /// automatically.
    #[instrument(skip(self))]
    pub async fn verify(&self, blogger_id: BloggerId) -> Result<VerifyOutcome, VerifyError> {
        let record = self
            .repo
            .find_by_blogger_id(blogger_id.0)
            .await?
            .ok_or(VerifyError::NotDeclared)?
            .to_domain()?;

        if record.status == VerificationStatus::Verified {
            return Ok(VerifyOutcome::ok());
        }

        let (method, token) = match (record.method, record.token.as_deref()) {
            (Some(m), Some(t)) => (m, t),
            _ => return Err(VerifyError::NoChallenge),
        };

        // The probe is the only blocking I/O in the engine; it runs without
        // any lock held and is bounded by the prober's timeout.
        let outcome = self.check_proof(&record.domain, method, token).await;

        if outcome.verified {
            self.repo.mark_verified(blogger_id.0).await?;
            info!(blogger_id = %blogger_id, domain = %record.domain, "Domain verified");
        } else {
            info!(
                blogger_id = %blogger_id,
                domain = %record.domain,
                reason = outcome.reason.as_deref().unwrap_or(""),
                "Domain verification failed"
            );
        }

        Ok(outcome)
    }

    /// Perform the method-specific external check
    async fn check_proof(
        &self,
        domain: &str,
        method: VerificationMethod,
        token: &str,
    ) -> VerifyOutcome {
        match method {
            VerificationMethod::DnsTxt => {
                let name = format!("{TXT_RECORD_LABEL}.{domain}");
                match self.prober.lookup_txt(&name).await {
                    Ok(values) if values.is_empty() => {
                        VerifyOutcome::failed("TXT record not found")
                    }
                    Ok(values) if values.iter().any(|v| v == token) => VerifyOutcome::ok(),
                    Ok(_) => VerifyOutcome::failed("TXT record does not match the expected token"),
                    Err(e) => VerifyOutcome::failed(e.to_string()),
                }
            }
            VerificationMethod::HtmlFile => {
                let url = format!("https://{domain}/{token}.html");
                match self.prober.fetch(&url).await {
                    Ok(body) if body.contains(token) => VerifyOutcome::ok(),
                    Ok(_) => VerifyOutcome::failed("verification file does not contain the token"),
                    Err(e) => VerifyOutcome::failed(e.to_string()),
                }
            }
            VerificationMethod::MetaTag => {
                let url = format!("https://{domain}/");
                match self.prober.fetch(&url).await {
                    Ok(body) => match find_meta_content(&body, META_TAG_NAME) {
                        Some(content) if content == token => VerifyOutcome::ok(),
                        Some(_) => {
                            VerifyOutcome::failed("verification meta tag does not match the token")
                        }
                        None => VerifyOutcome::failed("verification meta tag not found"),
                    },
                    Err(e) => VerifyOutcome::failed(e.to_string()),
                }
            }
        }
    }
}

impl<R: VerificationRepository, P: DomainProber> Clone for VerificationService<R, P> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            prober: Arc::clone(&self.prober),
        }
    }
}

impl<R: VerificationRepository, P: DomainProber> std::fmt::Debug for VerificationService<R, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationService").finish()
    }
}

/// Placement instructions shown to the blogger alongside the token
fn challenge_instructions(domain: &str, method: VerificationMethod, token: &str) -> String {
    match method {
        VerificationMethod::DnsTxt => format!(
            "Add a TXT record at {TXT_RECORD_LABEL}.{domain} with the value {token}"
        ),
        VerificationMethod::HtmlFile => format!(
            "Serve a file at https://{domain}/{token}.html whose body contains {token}"
        ),
        VerificationMethod::MetaTag => format!(
            "Add <meta name=\"{META_TAG_NAME}\" content=\"{token}\"> to the head of https://{domain}/"
        ),
    }
}
