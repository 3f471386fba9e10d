//! Domain extraction and matching

use url::Url;

use crate::error::VerifyError;

/// Extract the registrable domain from a declared blog URL.
///
/// The host is lowercased and a single leading `www.` label is stripped, so
/// `https://www.example.com/blog` and `https://example.com` verify the same
/// domain.
pub fn registrable_domain(blog_url: &str) -> Result<String, VerifyError> {
    let url =
        Url::parse(blog_url).map_err(|e| VerifyError::InvalidUrl(format!("{blog_url}: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(VerifyError::InvalidUrl(format!(
            "unsupported scheme: {}",
            url.scheme()
        )));
    }

    let host = url
        .host_str()
        .ok_or_else(|| VerifyError::InvalidUrl(format!("{blog_url}: missing host")))?
        .to_ascii_lowercase();

    let domain = host.strip_prefix("www.").unwrap_or(&host);
    if domain.is_empty() || !domain.contains('.') {
        return Err(VerifyError::InvalidUrl(format!("{blog_url}: bare host")));
    }

    Ok(domain.to_string())
}

/// Whether `post_url` may be listed under the verified `domain`.
///
/// True iff the URL parses, uses an encrypted transport, and its host
/// equals the domain or sits on a label boundary below it
/// (`blog.example.com` matches `example.com`; `notexample.com` does not).
pub fn url_matches_verified_domain(post_url: &str, domain: &str) -> bool {
    let Ok(url) = Url::parse(post_url) else {
        return false;
    };
    if url.scheme() != "https" {
        return false;
    }
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    let domain = domain.to_ascii_lowercase();

    host == domain || host.ends_with(&format!(".{domain}"))
}
