// file: src/crawler/scope.rs
// description: crawl scope boundary and URL normalization rules
// reference: https://docs.rs/url

use url::Url;

/// Path boundary derived from a seed URL. A discovered link is eligible
/// for traversal only when it shares the seed's scheme and host and its
/// path starts with this prefix.
///
/// Prefix rule: a seed path ending in `/` is its own prefix
/// (`/docs/` stays `/docs/`); otherwise the path is truncated after its
/// last `/` (`/docs/intro` becomes `/docs/`). The `url` crate lowercases
/// scheme and host during parsing, so comparisons are case-normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopePrefix {
    scheme: String,
    host: String,
    path_prefix: String,
}

impl ScopePrefix {
    pub fn from_seed(seed: &Url) -> Self {
        let path = seed.path();
        let path_prefix = if path.ends_with('/') {
            path.to_string()
        } else {
            match path.rfind('/') {
                Some(idx) => path[..=idx].to_string(),
                None => path.to_string(),
            }
        };

        Self {
            scheme: seed.scheme().to_string(),
            host: seed.host_str().unwrap_or_default().to_string(),
            path_prefix,
        }
    }

    pub fn in_scope(&self, url: &Url) -> bool {
        url.scheme() == self.scheme
            && url.host_str() == Some(self.host.as_str())
            && url.path().starts_with(&self.path_prefix)
    }

    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }
}

/// Canonical form used to key the visited set: fragment stripped and the
/// trailing slash removed except on the root path. Fetches always use
/// the original URL; only deduplication sees this form.
pub fn normalize_url(url: &Url) -> String {
    let mut normalized = url.clone();
    normalized.set_fragment(None);

    let path = normalized.path();
    if path != "/" && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        normalized.set_path(&trimmed);
    }

    normalized.to_string()
}
