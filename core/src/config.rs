//! Connection settings supplied by the caller at construction.
//!
//! # Design
//! The core reads no files and no environment. Everything it needs arrives
//! in a `ClientConfig` value. Accepting the appliance's self-signed
//! certificate is a named flag that defaults to off, so turning certificate
//! checks off is always a visible decision in the caller's code.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;

use crate::error::ApiError;

/// Port the appliance serves its API on.
pub const DEFAULT_PORT: u16 = 8443;

/// Path prefix shared by every endpoint.
pub const BASE_PATH: &str = "/VMtest/";

/// Basic-auth token: base64 of `username:password`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(username: &str, password: &str) -> Self {
        Self(BASE64_STANDARD.encode(format!("{username}:{password}")))
    }

    /// The encoded token, without the `Basic ` scheme prefix.
    pub fn token(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` request header.
    pub fn authorization(&self) -> String {
        format!("Basic {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Workload generator running on the appliance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Fio,
    Vdbench,
}

impl Tool {
    pub fn as_str(self) -> &'static str {
        match self {
            Tool::Fio => "fio",
            Tool::Vdbench => "vdbench",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tool {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fio" => Ok(Tool::Fio),
            "vdbench" => Ok(Tool::Vdbench),
            _ => Err(ApiError::UnknownTool(s.to_string())),
        }
    }
}

/// URL scheme used to reach the appliance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    #[default]
    Https,
    /// Plain HTTP, for local mock appliances only.
    Http,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Https => "https",
            Scheme::Http => "http",
        }
    }
}

/// Everything `ApplianceClient` needs to reach one appliance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub credential: Credential,
    pub tool: Tool,
    pub scheme: Scheme,
    /// Skip certificate validation. The appliance ships a self-signed
    /// certificate, so talking to a stock appliance needs this set, at the
    /// cost of no protection against an impersonating peer.
    pub accept_invalid_certs: bool,
    /// `None` blocks until the appliance answers, however long that takes.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(host: &str, username: &str, password: &str, tool: Tool) -> Self {
        Self {
            host: host.to_string(),
            port: DEFAULT_PORT,
            credential: Credential::new(username, password),
            tool,
            scheme: Scheme::Https,
            accept_invalid_certs: false,
            timeout: None,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Opt in to accepting self-signed or otherwise invalid certificates.
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// `host:port`, as used in connection errors.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Absolute URL every endpoint path is appended to, ending in `/`.
    pub fn base_url(&self) -> String {
        format!("{}://{}{BASE_PATH}", self.scheme.as_str(), self.authority())
    }
}
