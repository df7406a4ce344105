use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

// Layered checks: cheap high-confidence patterns first, decoded variants after

static PATH_TRAVERSAL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.\.").expect("static pattern compiles")
});

// Scheme prefix or a protocol-relative `//`
static PROTOCOL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:[a-z][a-z0-9+.-]*:)|(?:/{2,})")
        .expect("static pattern compiles")
});

// Control characters, encoded control bytes, backslashes and invisible separators
static SUSPICIOUS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)[\x00-\x1F\x7F-\x9F]|%(?:00|0[aAdD]|09|5c|26%23)|^[.@〱〵ゝーｰ]|\\|[\u{200E}\u{200F}\u{2060}-\u{2064}\u{2000}-\u{200A}]",
    )
    .expect("static pattern compiles")
});

const MAX_REDIRECT_LENGTH: usize = 2048;

const DANGEROUS_PROTOCOLS: &[&str] = &["javascript:", "vbscript:", "data:", "file:", "ftp:"];

/// Validate a post-authentication redirect target
///
/// Only same-origin relative paths are accepted. Absolute URLs are refused outright, so a
/// callback link can never bounce the user to another site.
///
/// # Errors
///
/// Returns the reason the target was refused
pub fn validate_post_auth_redirect(redirect_url: &str) -> Result<String, String> {
    debug!("Validating post-authentication redirect URL: {redirect_url}");

    if redirect_url.len() > MAX_REDIRECT_LENGTH {
        warn!(
            "Excessively long redirect URL: {} characters",
            redirect_url.len()
        );
        return Err("Redirect URL is too long".to_string());
    }

    if !is_relative_url(redirect_url) {
        warn!("Non-relative redirect refused: {redirect_url}");
        return Err("Redirect URL must be a relative path".to_string());
    }

    for decoded in decoded_variants(redirect_url) {
        check_patterns(redirect_url, &decoded)?;
    }

    Ok(redirect_url.to_string())
}

/// Pick the redirect target for a callback: `next` when it is safe, `default` otherwise
#[must_use]
pub fn resolve_next(next: Option<&str>, default: &str) -> String {
    match next.filter(|n| !n.is_empty()) {
        Some(candidate) => validate_post_auth_redirect(candidate).unwrap_or_else(|reason| {
            warn!("Ignoring unsafe next parameter ({reason}), using {default}");
            default.to_string()
        }),
        None => default.to_string(),
    }
}

/// Starts with `/`, is not protocol-relative and carries no scheme
fn is_relative_url(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//") && !url.contains(':')
}

fn check_patterns(original: &str, decoded: &str) -> Result<(), String> {
    if PATH_TRAVERSAL_PATTERN.is_match(decoded) {
        warn!("Path traversal in redirect: {original} -> {decoded}");
        return Err("Path traversal detected".to_string());
    }
    if PROTOCOL_PATTERN.is_match(decoded) {
        warn!("Protocol injection in redirect: {original} -> {decoded}");
        return Err("Protocol injection detected".to_string());
    }
    if SUSPICIOUS_PATTERN.is_match(decoded) {
        warn!("Suspicious pattern in redirect: {original} -> {decoded}");
        return Err("Suspicious characters detected".to_string());
    }

    let lower = decoded.to_lowercase();
    if DANGEROUS_PROTOCOLS.iter().any(|p| lower.contains(p)) {
        warn!("Dangerous protocol in redirect: {lower}");
        return Err("Dangerous protocol detected".to_string());
    }
    if decoded.matches('@').count() > 1 {
        warn!("Multiple @ symbols in redirect: {decoded}");
        return Err("Domain confusion detected".to_string());
    }
    Ok(())
}

/// The input plus its single- and double-decoded forms, when they differ
fn decoded_variants(path: &str) -> Vec<String> {
    let mut variants = Vec::with_capacity(3);
    variants.push(path.to_string());

    if let Ok(decoded) = urlencoding::decode(path) {
        let once = decoded.into_owned();
        if once != path {
            if let Ok(twice) = urlencoding::decode(&once) {
                let twice = twice.into_owned();
                if twice != once {
                    variants.push(twice);
                }
            }
            variants.push(once);
        }
    }
    variants
}
