//! Manifest feed parsing
//!
//! At install time the agent fetches a feed document from the origin and
//! seeds the cache with every asset it references. The feed is a JSON
//! object with an `entry` array; each entry carries an absolute `href`
//! from which the asset path is derived.

use crate::error::{FrescaError, FrescaResult};
use serde::Deserialize;
use url::Url;

/// Parsed manifest feed.
#[derive(Debug, Clone, Deserialize)]
pub struct Feed {
    /// Entries referencing the assets to prefetch
    pub entry: Vec<FeedEntry>,
}

/// One feed entry.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedEntry {
    /// Absolute URL of the referenced asset
    pub href: String,

    /// Optional human-readable title
    #[serde(default)]
    pub title: Option<String>,
}

impl Feed {
    /// Parse a feed document from raw bytes.
    pub fn parse(bytes: &[u8]) -> FrescaResult<Self> {
        serde_json::from_slice(bytes).map_err(FrescaError::ManifestParse)
    }

    /// Derive the asset path for every entry.
    ///
    /// Any entry whose `href` does not parse as an absolute URL fails the
    /// whole manifest; install is all-or-nothing.
    pub fn asset_paths(&self) -> FrescaResult<Vec<String>> {
        self.entry
            .iter()
            .map(|entry| {
                let url = Url::parse(&entry.href).map_err(|e| FrescaError::ManifestEntry {
                    href: entry.href.clone(),
                    reason: e.to_string(),
                })?;
                Ok(url.path().to_string())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_derive_paths() {
        let doc = br#"{
            "entry": [
                {"href": "https://example.io/entry/one.html", "title": "one"},
                {"href": "https://example.io/entry/two.html"}
            ]
        }"#;

        let feed = Feed::parse(doc).unwrap();
        assert_eq!(feed.entry.len(), 2);
        assert_eq!(feed.entry[0].title.as_deref(), Some("one"));
        assert_eq!(
            feed.asset_paths().unwrap(),
            vec!["/entry/one.html", "/entry/two.html"]
        );
    }

    #[test]
    fn malformed_document_fails() {
        let err = Feed::parse(b"<rss/>").unwrap_err();
        assert!(matches!(err, FrescaError::ManifestParse(_)));
    }

    #[test]
    fn invalid_href_fails_whole_manifest() {
        let doc = br#"{"entry": [{"href": "https://example.io/a"}, {"href": "/relative"}]}"#;
        let feed = Feed::parse(doc).unwrap();
        let err = feed.asset_paths().unwrap_err();
        assert!(matches!(err, FrescaError::ManifestEntry { .. }));
    }

    #[test]
    fn empty_feed_is_valid() {
        let feed = Feed::parse(br#"{"entry": []}"#).unwrap();
        assert!(feed.asset_paths().unwrap().is_empty());
    }
}
