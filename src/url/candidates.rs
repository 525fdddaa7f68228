use crate::url::normalize::normalize_domain;

const SCHEMES: [&str; 2] = ["https", "http"];

/// Builds the ordered list of URLs to try for a domain
///
/// Every scheme/host variant of the normalized domain is generated, duplicates
/// dropped, then the list is reordered so the four common variants lead:
///
/// 1. `https://www.<host>`
/// 2. `https://<bare-host>`
/// 3. `http://www.<host>`
/// 4. `http://<bare-host>`
///
/// Any remaining variant keeps its original encounter order after those.
///
/// Returns an empty list only for an empty domain.
///
/// # Examples
///
/// ```
/// use reach_probe::url::build_candidate_urls;
///
/// let urls = build_candidate_urls("example.com");
/// assert_eq!(urls, vec![
///     "https://www.example.com",
///     "https://example.com",
///     "http://www.example.com",
///     "http://example.com",
/// ]);
/// ```
pub fn build_candidate_urls(domain: &str) -> Vec<String> {
    let host = normalize_domain(domain);
    if host.is_empty() {
        return Vec::new();
    }

    let bare = strip_www(&host).to_string();
    let with_www = if has_www(&host) {
        host.clone()
    } else {
        format!("www.{}", host)
    };

    let mut encountered: Vec<String> = Vec::new();
    for scheme in SCHEMES {
        for h in [&host, &bare, &with_www] {
            if h.is_empty() {
                continue;
            }
            push_unique(&mut encountered, format!("{}://{}", scheme, h));
        }
    }

    let preferred = [
        format!("https://{}", with_www),
        format!("https://{}", bare),
        format!("http://{}", with_www),
        format!("http://{}", bare),
    ];

    let mut ordered: Vec<String> = Vec::with_capacity(encountered.len());
    for url in preferred {
        if encountered.contains(&url) {
            push_unique(&mut ordered, url);
        }
    }
    for url in encountered {
        push_unique(&mut ordered, url);
    }

    ordered
}

fn has_www(host: &str) -> bool {
    host.get(..4)
        .map(|prefix| prefix.eq_ignore_ascii_case("www."))
        .unwrap_or(false)
}

fn strip_www(host: &str) -> &str {
    if has_www(host) {
        &host[4..]
    } else {
        host
    }
}

fn push_unique(urls: &mut Vec<String>, url: String) {
    if !urls.contains(&url) {
        urls.push(url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_bare_domain_order() {
        assert_eq!(
            build_candidate_urls("example.com"),
            vec![
                "https://www.example.com",
                "https://example.com",
                "http://www.example.com",
                "http://example.com",
            ]
        );
    }

    #[test]
    fn test_www_domain_order_matches_bare() {
        assert_eq!(
            build_candidate_urls("www.example.com"),
            build_candidate_urls("example.com")
        );
    }

    #[test]
    fn test_full_url_input() {
        assert_eq!(
            build_candidate_urls("http://www.example.com/landing"),
            build_candidate_urls("example.com")
        );
    }

    #[test]
    fn test_port_is_carried() {
        let urls = build_candidate_urls("http://127.0.0.1:8080/");
        assert_eq!(urls[0], "https://www.127.0.0.1:8080");
        assert_eq!(urls[3], "http://127.0.0.1:8080");
    }

    #[test]
    fn test_empty_domain() {
        assert!(build_candidate_urls("").is_empty());
        assert!(build_candidate_urls("   ").is_empty());
    }

    #[test]
    fn test_no_duplicates_and_non_empty() {
        for domain in [
            "example.com",
            "www.example.com",
            "WWW.Example.com",
            "sub.example.com",
            "https://example.com:8443",
            "www.",
            "localhost",
        ] {
            let urls = build_candidate_urls(domain);
            assert!(!urls.is_empty(), "{} produced no candidates", domain);
            let unique: HashSet<_> = urls.iter().collect();
            assert_eq!(unique.len(), urls.len(), "{} produced duplicates", domain);
        }
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(
            build_candidate_urls("sub.example.com"),
            build_candidate_urls("sub.example.com")
        );
    }

    #[test]
    fn test_uppercase_www_prefix() {
        let urls = build_candidate_urls("WWW.Example.com");
        assert_eq!(urls[0], "https://WWW.Example.com");
        assert_eq!(urls[1], "https://Example.com");
    }
}
