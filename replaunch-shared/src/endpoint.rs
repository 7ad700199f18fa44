//! REPL endpoint addressing.

use serde::{Deserialize, Serialize};

/// Scheme used for REPL endpoint URIs.
pub const SCHEME: &str = "nrepl";

/// Network address of a running REPL server.
///
/// Built from the port a freshly started runtime reports over the ack
/// channel. The launcher only ever talks to processes it started itself,
/// so the host defaults to loopback.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Create an endpoint for an arbitrary host.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Create a loopback endpoint from a reported port.
    pub fn local(port: u16) -> Self {
        Self::new("127.0.0.1", port)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port` form, suitable for `TcpStream::connect`.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the URI representation of this endpoint.
    pub fn to_uri(&self) -> String {
        format!("{}://{}:{}", SCHEME, self.host, self.port)
    }

    /// Parse an endpoint from a `nrepl://host:port` URI.
    pub fn from_uri(uri: &str) -> Result<Self, String> {
        let rest = uri
            .strip_prefix(SCHEME)
            .and_then(|r| r.strip_prefix("://"))
            .ok_or_else(|| format!("invalid endpoint URI '{}': expected {}://", uri, SCHEME))?;

        let (host, port) = rest
            .rsplit_once(':')
            .ok_or_else(|| format!("invalid endpoint URI '{}': missing port", uri))?;
        if host.is_empty() {
            return Err(format!("invalid endpoint URI '{}': missing host", uri));
        }
        let port = port
            .parse::<u16>()
            .map_err(|e| format!("invalid port in '{}': {}", uri, e))?;

        Ok(Self::new(host, port))
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_uri())
    }
}

impl std::str::FromStr for Endpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_uri(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_endpoint_uri() {
        let endpoint = Endpoint::local(41234);
        assert_eq!(endpoint.to_uri(), "nrepl://127.0.0.1:41234");
        assert_eq!(endpoint.authority(), "127.0.0.1:41234");
    }

    #[test]
    fn test_roundtrip() {
        let endpoint = Endpoint::new("10.0.0.7", 7888);
        let parsed: Endpoint = endpoint.to_uri().parse().unwrap();
        assert_eq!(parsed, endpoint);
    }

    #[test]
    fn test_from_uri_rejects_wrong_scheme() {
        assert!(Endpoint::from_uri("tcp://127.0.0.1:7888").is_err());
    }

    #[test]
    fn test_from_uri_rejects_missing_port() {
        assert!(Endpoint::from_uri("nrepl://127.0.0.1").is_err());
        assert!(Endpoint::from_uri("nrepl://127.0.0.1:").is_err());
        assert!(Endpoint::from_uri("nrepl://127.0.0.1:abc").is_err());
    }

    #[test]
    fn test_from_uri_rejects_missing_host() {
        assert!(Endpoint::from_uri("nrepl://:7888").is_err());
    }
}
