//! URL validation and normalization.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use url::{Host, Url};

use crate::{Result, UrlinfoError};

/// Longest URL accepted for checking
pub const MAX_URL_LENGTH: usize = 2048;

const HTTP_PORT: u16 = 80;
const HTTPS_PORT: u16 = 443;

/// Canonical form of a checked URL: `scheme://host[:port]/path[?query]`.
///
/// Hosts are lowercased, default ports are elided, fragments and user info are
/// dropped. Two inputs that normalize to the same string are the same cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NormalizedUrl {
    serialized: String,
    secure: bool,
    host: String,
    port: Option<u16>,
    path: String,
    query: Option<String>,
}

impl NormalizedUrl {
    /// Validate and normalize a raw URL.
    ///
    /// Input without a scheme is treated as `https://<input>`.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(invalid("URL cannot be empty"));
        }
        if trimmed.len() > MAX_URL_LENGTH {
            return Err(invalid(format!(
                "URL exceeds maximum length of {MAX_URL_LENGTH}"
            )));
        }

        let candidate = if trimmed.contains("://") {
            Cow::Borrowed(trimmed)
        } else {
            Cow::Owned(format!("https://{trimmed}"))
        };

        let (scheme, rest) = candidate
            .split_once("://")
            .ok_or_else(|| invalid("URL must use http:// or https:// scheme"))?;
        let secure = match scheme.to_ascii_lowercase().as_str() {
            "http" => false,
            "https" => true,
            other => {
                return Err(invalid(format!(
                    "invalid scheme '{other}', must be http or https"
                )))
            }
        };

        // The url crate skips extra slashes for special schemes, so
        // `http:///evil.net` would otherwise gain a host.
        let authority = rest
            .split(|c| matches!(c, '/' | '?' | '#'))
            .next()
            .unwrap_or_default();
        let host_part = authority.rsplit('@').next().unwrap_or_default();
        if host_part.is_empty() || host_part.starts_with(':') {
            return Err(invalid("URL must include a hostname"));
        }

        let parsed = Url::parse(&candidate).map_err(|e| invalid(format!("{e}")))?;

        let host = match parsed.host() {
            Some(Host::Domain(domain)) => {
                let domain = domain.trim_end_matches('.');
                validate_domain(domain)?;
                domain.to_string()
            }
            Some(Host::Ipv4(ip)) => ip.to_string(),
            Some(Host::Ipv6(ip)) => format!("[{ip}]"),
            None => return Err(invalid("URL must include a hostname")),
        };

        let port = parsed.port();
        let path = match parsed.path() {
            "" => String::from("/"),
            p => p.to_string(),
        };
        let query = parsed
            .query()
            .filter(|q| !q.is_empty())
            .map(String::from);

        Ok(Self::assemble(secure, host, port, path, query))
    }

    /// Build a URL from a routing-layer pair: `host[:port]` plus the requested
    /// path and query string.
    ///
    /// The scheme is `https` when the port is 443, `http` otherwise.
    pub fn from_route(host_and_port: &str, path_and_query: &str) -> Result<Self> {
        let host_and_port = host_and_port.trim();
        if host_and_port.is_empty() {
            return Err(invalid("hostname required"));
        }

        let (host, port) = match host_and_port.rsplit_once(':') {
            Some((host, port)) if !host.contains(':') || host.ends_with(']') => {
                let port: u16 = port
                    .parse()
                    .map_err(|_| invalid(format!("invalid port number '{port}'")))?;
                (host, Some(port))
            }
            _ => (host_and_port, None),
        };

        let scheme = if port == Some(HTTPS_PORT) { "https" } else { "http" };
        let port = port.map(|p| format!(":{p}")).unwrap_or_default();
        let path = path_and_query.trim_start_matches('/');

        Self::parse(&format!("{scheme}://{host}{port}/{path}"))
    }

    fn assemble(
        secure: bool,
        host: String,
        port: Option<u16>,
        path: String,
        query: Option<String>,
    ) -> Self {
        let scheme = if secure { "https" } else { "http" };
        let mut serialized = format!("{scheme}://{host}");
        if let Some(port) = port {
            serialized.push(':');
            serialized.push_str(&port.to_string());
        }
        serialized.push_str(&path);
        if let Some(query) = &query {
            serialized.push('?');
            serialized.push_str(query);
        }

        Self {
            serialized,
            secure,
            host,
            port,
            path,
            query,
        }
    }

    /// The canonical string form
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.serialized
    }

    /// `http` or `https`
    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    /// Lowercased host (IPv6 literals keep their brackets)
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port, falling back to the scheme default
    #[must_use]
    pub const fn port(&self) -> u16 {
        match self.port {
            Some(port) => port,
            None if self.secure => HTTPS_PORT,
            None => HTTP_PORT,
        }
    }

    /// Port only if it differs from the scheme default
    #[must_use]
    pub const fn explicit_port(&self) -> Option<u16> {
        self.port
    }

    /// Path, always starting with `/`
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query string without the leading `?`
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Path followed by `?query` when present
    #[must_use]
    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{query}", self.path),
            None => self.path.clone(),
        }
    }
}

fn invalid(msg: impl Into<String>) -> UrlinfoError {
    UrlinfoError::InvalidUrl(msg.into())
}

fn validate_domain(domain: &str) -> Result<()> {
    if domain == "localhost" {
        return Ok(());
    }

    let labels: Vec<&str> = domain.split('.').collect();
    let well_formed = labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });

    if well_formed {
        Ok(())
    } else {
        Err(invalid(format!("hostname '{domain}' is not valid")))
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialized)
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        &self.serialized
    }
}

impl FromStr for NormalizedUrl {
    type Err = UrlinfoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for NormalizedUrl {
    type Error = UrlinfoError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<NormalizedUrl> for String {
    fn from(url: NormalizedUrl) -> Self {
        url.serialized
    }
}
