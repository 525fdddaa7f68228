use url::Url;

/// Reduces a raw domain cell to the host (and port) to probe
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace; empty input stays empty
/// 2. If the input carries a scheme, parse it and keep only `host[:port]`
/// 3. If that parse fails, or yields no host, keep the trimmed input as-is
///
/// # Examples
///
/// ```
/// use reach_probe::url::normalize_domain;
///
/// assert_eq!(normalize_domain("  example.com "), "example.com");
/// assert_eq!(normalize_domain("https://Example.com:8443/path?q=1"), "example.com:8443");
/// ```
pub fn normalize_domain(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    if !trimmed.contains("://") {
        return trimmed.to_string();
    }

    match Url::parse(trimmed) {
        Ok(url) => match url.host_str() {
            Some(host) => match url.port() {
                Some(port) => format!("{}:{}", host, port),
                None => host.to_string(),
            },
            None => trimmed.to_string(),
        },
        Err(e) => {
            tracing::debug!("Keeping unparseable domain {:?} as-is: {}", trimmed, e);
            trimmed.to_string()
        }
    }
}

/// Resolves a `Location` header against the URL that produced it
///
/// Returns None when either side cannot be parsed.
pub fn resolve_location(location: &str, current_url: &str) -> Option<String> {
    let base = Url::parse(current_url).ok()?;
    base.join(location.trim()).ok().map(|url| url.to_string())
}
