//! Forwarding targets and their flush policy.

use std::fmt;

use axum::http::uri::{Authority, InvalidUri, Scheme};
use axum::http::Uri;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// When relayed body bytes reach the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlushPolicy {
    /// Hold bytes until the relay buffer fills or the upstream body ends.
    /// For single-shot JSON replies.
    Buffered,
    /// Pass every upstream chunk on as soon as it arrives.
    /// For token-by-token replies such as server-sent events.
    Streaming,
}

impl FlushPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlushPolicy::Buffered => "buffered",
            FlushPolicy::Streaming => "streaming",
        }
    }
}

impl fmt::Display for FlushPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised when a target address cannot be used.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("invalid upstream address `{address}`: {source}")]
    InvalidUri {
        address: String,
        #[source]
        source: InvalidUri,
    },

    #[error("upstream address `{0}` must use the http scheme")]
    UnsupportedScheme(String),

    #[error("upstream address `{0}` has no host")]
    MissingAuthority(String),
}

/// A fixed upstream destination bound to one flush policy.
///
/// The address is absolute and includes the upstream path, e.g.
/// `http://localhost:8046/api/chat/stream`. Built once at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    address: Uri,
    authority: Authority,
    policy: FlushPolicy,
}

impl ProxyTarget {
    pub fn new(address: &str, policy: FlushPolicy) -> Result<Self, TargetError> {
        let uri: Uri = address.parse().map_err(|source| TargetError::InvalidUri {
            address: address.to_string(),
            source,
        })?;

        if uri.scheme() != Some(&Scheme::HTTP) {
            return Err(TargetError::UnsupportedScheme(address.to_string()));
        }
        let authority = uri
            .authority()
            .cloned()
            .ok_or_else(|| TargetError::MissingAuthority(address.to_string()))?;

        Ok(Self {
            address: uri,
            authority,
            policy,
        })
    }

    pub fn address(&self) -> &Uri {
        &self.address
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    pub fn policy(&self) -> FlushPolicy {
        self.policy
    }

    /// Destination for one forwarded request.
    ///
    /// Scheme, authority and path come from the target. The target's query
    /// wins when it has one, otherwise the inbound query is kept.
    pub fn rewrite_uri(&self, inbound: &Uri) -> Result<Uri, axum::http::Error> {
        let path = self.address.path();
        let path_and_query = match self.address.query().or(inbound.query()) {
            Some(query) => format!("{}?{}", path, query),
            None => path.to_string(),
        };

        Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
    }
}

impl fmt::Display for ProxyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_validation() {
        assert!(ProxyTarget::new("http://localhost:8046/api/chat", FlushPolicy::Buffered).is_ok());
        assert!(matches!(
            ProxyTarget::new("https://localhost:8046/api/chat", FlushPolicy::Buffered),
            Err(TargetError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            ProxyTarget::new("/api/chat", FlushPolicy::Buffered),
            Err(TargetError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            ProxyTarget::new("http://bad host", FlushPolicy::Streaming),
            Err(TargetError::InvalidUri { .. })
        ));
    }

    #[test]
    fn test_rewrite_keeps_inbound_query() {
        let target = ProxyTarget::new("http://127.0.0.1:8046/api/chat/stream", FlushPolicy::Streaming).unwrap();
        let inbound: Uri = "/api/chat/stream?session=7&lang=en".parse().unwrap();

        let uri = target.rewrite_uri(&inbound).unwrap();
        assert_eq!(uri.to_string(), "http://127.0.0.1:8046/api/chat/stream?session=7&lang=en");
        assert_eq!(target.authority().as_str(), "127.0.0.1:8046");
    }

    #[test]
    fn test_rewrite_target_query_wins() {
        let target = ProxyTarget::new("http://upstream/api/chat?mode=sync", FlushPolicy::Buffered).unwrap();
        let inbound: Uri = "/api/chat?mode=async".parse().unwrap();
        assert_eq!(
            target.rewrite_uri(&inbound).unwrap().to_string(),
            "http://upstream/api/chat?mode=sync"
        );
    }

    #[test]
    fn test_rewrite_without_path_uses_root() {
        let target = ProxyTarget::new("http://upstream:9000", FlushPolicy::Buffered).unwrap();
        let inbound: Uri = "/anything".parse().unwrap();
        assert_eq!(target.rewrite_uri(&inbound).unwrap().to_string(), "http://upstream:9000/");
    }
}
