//! Request and response data model
//!
//! Everything the engine races on or stores is expressed in these types:
//! a normalized request identity (method + URL, no headers), the
//! destination classification carried by an intercepted request, and the
//! full response snapshot captured at write time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Request method carried by an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Patch,
    Options,
}

impl Method {
    /// The uppercase token for this method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized request identity: method plus absolute URL.
///
/// Headers are deliberately excluded, so two requests for the same resource
/// share one cache entry regardless of negotiation headers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestIdentity {
    /// Request method
    pub method: Method,
    /// Absolute request URL
    pub url: String,
}

impl RequestIdentity {
    /// Create an identity for an arbitrary method.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
        }
    }

    /// Create a GET identity, the common case for cacheable resources.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// The key addressing this identity in a cache store.
    pub fn cache_key(&self) -> String {
        format!("{} {}", self.method, self.url)
    }

    /// The path component of the URL, if it parses as an absolute URL.
    pub fn path(&self) -> Option<String> {
        Url::parse(&self.url).ok().map(|u| u.path().to_string())
    }
}

impl fmt::Display for RequestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// What kind of resource a consumer is requesting.
///
/// Informational only: logged for diagnostics, never part of the identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Document,
    Script,
    Style,
    Image,
    Font,
    Media,
    Worker,
    #[default]
    Other,
}

/// One request offered to the interception engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterceptedRequest {
    /// Normalized identity of the request
    pub identity: RequestIdentity,
    /// Destination classification
    #[serde(default)]
    pub destination: Destination,
}

impl InterceptedRequest {
    /// Wrap an identity with a destination classification.
    pub fn new(identity: RequestIdentity, destination: Destination) -> Self {
        Self {
            identity,
            destination,
        }
    }

    /// A GET request for `url` with an unclassified destination.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(RequestIdentity::get(url), Destination::Other)
    }
}

/// Full response capture: status, headers and body as seen at fetch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    /// Final URL the response was served from
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Response headers in arrival order
    pub headers: Vec<(String, String)>,
    /// Response body bytes
    pub body: Vec<u8>,
    /// When the snapshot was captured
    pub fetched_at: DateTime<Utc>,
}

impl ResponseSnapshot {
    /// Create a snapshot stamped with the current time.
    pub fn new(
        url: impl Into<String>,
        status: u16,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            url: url.into(),
            status,
            headers,
            body,
            fetched_at: Utc::now(),
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body interpreted as UTF-8, lossily.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// First header value matching `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// The unit a cache store persists: the identity together with its snapshot,
/// so stores can enumerate their contents for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Identity this entry answers
    pub identity: RequestIdentity,
    /// Captured response
    pub snapshot: ResponseSnapshot,
}
