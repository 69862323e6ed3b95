//! Image URL resolution.
//!
//! Curated overrides first (high-traffic cards whose thumbnails are
//! unreliable), then a proxy rewrite for hosts that refuse hotlinking,
//! then pass-through. The override map is injected configuration, not
//! a compiled-in table, so curation changes without redeploying
//! extraction logic.

use std::collections::HashMap;

use url::Url;

use crate::query;

/// Proxy rewrite prefix; the server mounts the matching route.
const PROXY_PREFIX: &str = "/image-proxy?url=";

/// Invert the proxy rewrite back to the upstream image URL.
///
/// Proxied URLs yield their encoded target, direct URLs come back
/// unchanged, and anything non-fetchable (empty, relative, garbage)
/// yields `None`.
pub fn upstream_url(resolved: &str) -> Option<String> {
    if let Some(encoded) = resolved.strip_prefix(PROXY_PREFIX) {
        return urlencoding::decode(encoded).ok().map(|u| u.into_owned());
    }
    if resolved.starts_with("http://") || resolved.starts_with("https://") {
        return Some(resolved.to_string());
    }
    None
}

/// Resolves a listing's image URL.
#[derive(Debug, Clone, Default)]
pub struct ImageResolver {
    /// Normalized title substring → canonical image URL.
    overrides: HashMap<String, String>,

    /// Hosts whose images require the referrer/CORS-bypassing proxy.
    proxy_hosts: Vec<String>,
}

impl ImageResolver {
    /// Resolver with the standard marketplace image hosts proxied and
    /// no overrides.
    pub fn new() -> Self {
        Self {
            overrides: HashMap::new(),
            proxy_hosts: vec!["i.ebayimg.com".to_string(), "ebayimg.com".to_string()],
        }
    }

    /// Replace the curated override map. Keys are matched as
    /// substrings of the normalized listing title.
    pub fn with_overrides(mut self, overrides: HashMap<String, String>) -> Self {
        self.overrides = overrides
            .into_iter()
            .map(|(k, v)| (query::normalize(&k), v))
            .collect();
        self
    }

    /// Add a proxy-rewrite host.
    pub fn with_proxy_host(mut self, host: impl Into<String>) -> Self {
        self.proxy_hosts.push(host.into());
        self
    }

    /// Resolve the image URL for a listing.
    pub fn resolve(&self, title: &str, image_url: &str) -> String {
        let normalized_title = query::normalize(title);
        for (key, canonical) in &self.overrides {
            if !key.is_empty() && normalized_title.contains(key.as_str()) {
                return canonical.clone();
            }
        }

        if self.needs_proxy(image_url) {
            return format!("{PROXY_PREFIX}{}", urlencoding::encode(image_url));
        }

        image_url.to_string()
    }

    fn needs_proxy(&self, image_url: &str) -> bool {
        let Ok(parsed) = Url::parse(image_url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        self.proxy_hosts
            .iter()
            .any(|h| host == h || host.ends_with(&format!(".{h}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins_over_proxy() {
        let overrides = HashMap::from([(
            "Justin Jefferson 2020 Prizm".to_string(),
            "https://cdn.example.com/jefferson-prizm.jpg".to_string(),
        )]);
        let resolver = ImageResolver::new().with_overrides(overrides);

        let resolved = resolver.resolve(
            "Justin Jefferson 2020 Prizm PSA 10 #398",
            "https://i.ebayimg.com/thumbs/abc.jpg",
        );
        assert_eq!(resolved, "https://cdn.example.com/jefferson-prizm.jpg");
    }

    #[test]
    fn marketplace_host_is_proxied() {
        let resolver = ImageResolver::new();
        let resolved = resolver.resolve("some card", "https://i.ebayimg.com/thumbs/abc.jpg");
        assert_eq!(
            resolved,
            "/image-proxy?url=https%3A%2F%2Fi.ebayimg.com%2Fthumbs%2Fabc.jpg"
        );
    }

    #[test]
    fn other_hosts_pass_through() {
        let resolver = ImageResolver::new();
        let url = "https://images.example.org/card.png";
        assert_eq!(resolver.resolve("some card", url), url);
    }

    #[test]
    fn unparseable_url_passes_through() {
        let resolver = ImageResolver::new();
        assert_eq!(resolver.resolve("some card", "not a url"), "not a url");
    }

    #[test]
    fn upstream_url_inverts_the_proxy_rewrite() {
        let resolver = ImageResolver::new();
        let original = "https://i.ebayimg.com/thumbs/abc.jpg";
        let resolved = resolver.resolve("some card", original);
        assert_eq!(upstream_url(&resolved).as_deref(), Some(original));
    }

    #[test]
    fn upstream_url_keeps_direct_urls() {
        let url = "https://images.example.org/card.png";
        assert_eq!(upstream_url(url).as_deref(), Some(url));
    }

    #[test]
    fn upstream_url_rejects_non_fetchable() {
        assert_eq!(upstream_url(""), None);
        assert_eq!(upstream_url("not a url"), None);
        assert_eq!(upstream_url("/some/relative/path.jpg"), None);
    }
}
