//! URL validation and SSRF protection for webhook delivery endpoints.
//!
//! The predicate is string-based: it classifies the URL text without
//! resolving DNS. A hostname that aliases to a private IP therefore passes —
//! that limitation is deliberate, documented by a test below, and must not
//! be "fixed" silently; resolution-time checks are a separate hardening.

use crate::error::WebhookError;

/// Ports an explicit port specification may use.
const ALLOWED_PORTS: [u16; 4] = [80, 443, 8080, 8443];

/// Hosts rejected outright.
const BLOCKED_HOSTS: [&str; 5] = ["localhost", "127.0.0.1", "0.0.0.0", "::1", "[::1]"];

/// Validate a webhook delivery URL.
///
/// Accepts iff all of the following hold:
///
/// 1. The scheme is exactly `http` or `https`.
/// 2. The host is not a loopback/unspecified literal
///    (`localhost`, `127.0.0.1`, `0.0.0.0`, `::1`, `[::1]`).
/// 3. The host does not fall in `10.0.0.0/8`, `192.168.0.0/16`,
///    `172.16.0.0/12` (second octet 16–31), or `169.254.0.0/16`.
/// 4. An explicit port, when present, is one of 80, 443, 8080, 8443.
///
/// # Errors
///
/// Returns `WebhookError::InvalidUrl` for structural failures and
/// `WebhookError::SsrfDetected` for blocked destinations.
pub fn validate_url(raw: &str) -> Result<(), WebhookError> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| WebhookError::InvalidUrl(format!("Unparseable URL: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(WebhookError::InvalidUrl(format!(
                "Unsupported URL scheme: {scheme}"
            )));
        }
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| WebhookError::InvalidUrl("URL must have a host".to_string()))?;

    validate_host(host)?;

    // The url crate normalizes away a scheme-default port, which is allowed
    // anyway; any surviving explicit port must be on the allowlist.
    if let Some(port) = parsed.port() {
        if !ALLOWED_PORTS.contains(&port) {
            return Err(WebhookError::SsrfDetected(format!(
                "Port {port} is not an allowed webhook port"
            )));
        }
    }

    Ok(())
}

/// Reject loopback literals and private-range prefixes.
fn validate_host(host: &str) -> Result<(), WebhookError> {
    let lower = host.to_ascii_lowercase();

    if BLOCKED_HOSTS.contains(&lower.as_str()) {
        return Err(WebhookError::SsrfDetected(format!(
            "Destination host {host} is a loopback or unspecified address"
        )));
    }

    if lower.starts_with("10.") || lower.starts_with("192.168.") || lower.starts_with("169.254.") {
        return Err(WebhookError::SsrfDetected(format!(
            "Destination host {host} is in a private address range"
        )));
    }

    // 172.16.0.0/12 covers second octets 16 through 31 only.
    if let Some(rest) = lower.strip_prefix("172.") {
        if let Some((second, _)) = rest.split_once('.') {
            if let Ok(octet) = second.parse::<u8>() {
                if (16..=31).contains(&octet) {
                    return Err(WebhookError::SsrfDetected(format!(
                        "Destination host {host} is in a private address range"
                    )));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected_as_ssrf(url: &str) -> bool {
        matches!(validate_url(url), Err(WebhookError::SsrfDetected(_)))
    }

    // --- accepted URLs ---

    #[test]
    fn test_accepts_public_https() {
        assert!(validate_url("https://api.example.com/hook").is_ok());
    }

    #[test]
    fn test_accepts_http_with_allowed_port() {
        assert!(validate_url("http://example.com:8080/h").is_ok());
    }

    #[test]
    fn test_accepts_all_allowed_ports() {
        for port in [80, 443, 8080, 8443] {
            let url = format!("https://hooks.example.com:{port}/cb");
            assert!(validate_url(&url).is_ok(), "port {port} should be allowed");
        }
    }

    #[test]
    fn test_accepts_public_ip() {
        assert!(validate_url("https://203.0.113.50/hook").is_ok());
    }

    #[test]
    fn test_accepts_172_outside_private_block() {
        assert!(validate_url("http://172.15.0.1/").is_ok());
        assert!(validate_url("http://172.32.0.1/").is_ok());
    }

    // --- scheme ---

    #[test]
    fn test_rejects_non_http_schemes() {
        assert!(matches!(
            validate_url("ftp://example.com/"),
            Err(WebhookError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_url("file:///etc/passwd"),
            Err(WebhookError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_url("gopher://example.com/"),
            Err(WebhookError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            validate_url("not a url"),
            Err(WebhookError::InvalidUrl(_))
        ));
    }

    // --- loopback and unspecified ---

    #[test]
    fn test_rejects_localhost() {
        assert!(rejected_as_ssrf("http://localhost/x"));
        assert!(rejected_as_ssrf("http://LOCALHOST/x"));
    }

    #[test]
    fn test_rejects_loopback_literals() {
        assert!(rejected_as_ssrf("http://127.0.0.1/"));
        assert!(rejected_as_ssrf("http://0.0.0.0/"));
        assert!(rejected_as_ssrf("http://[::1]/"));
    }

    // --- private ranges ---

    #[test]
    fn test_rejects_rfc1918_10() {
        assert!(rejected_as_ssrf("http://10.0.0.1/"));
    }

    #[test]
    fn test_rejects_rfc1918_192_168() {
        assert!(rejected_as_ssrf("http://192.168.1.1/"));
    }

    #[test]
    fn test_rejects_rfc1918_172_16_to_31() {
        assert!(rejected_as_ssrf("http://172.16.0.1/"));
        assert!(rejected_as_ssrf("http://172.20.0.1/"));
        assert!(rejected_as_ssrf("http://172.31.255.255/"));
    }

    #[test]
    fn test_rejects_link_local_metadata_endpoint() {
        assert!(rejected_as_ssrf("http://169.254.169.254/meta"));
        assert!(rejected_as_ssrf(
            "http://169.254.169.254/latest/meta-data/"
        ));
    }

    // --- ports ---

    #[test]
    fn test_rejects_disallowed_port() {
        assert!(rejected_as_ssrf("http://example.com:22/"));
        assert!(rejected_as_ssrf("https://example.com:6379/"));
        assert!(rejected_as_ssrf("http://example.com:8000/"));
    }

    // --- documented limitation ---

    #[test]
    fn test_known_limitation_hostname_aliasing_private_ip_passes() {
        // The predicate classifies URL text only; it performs no DNS
        // resolution. A public-looking hostname that resolves to a private
        // address is accepted here and must be caught by a resolution-time
        // layer if one is ever added.
        assert!(validate_url("https://intranet-alias.example.com/hook").is_ok());
    }
}
