//! Blocking HTTPS round trips.
//!
//! # Design
//! `Transport` is the only place that touches the network. `UreqTransport`
//! builds a fresh agent for every request, so each call opens its own
//! connection and drops it afterwards; nothing is pooled between calls.
//! Without a configured timeout a silent appliance blocks the caller
//! indefinitely.

use std::time::Duration;

use tracing::warn;
use ureq::tls::TlsConfig;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one `HttpRequest` and returns the complete response.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// `Transport` backed by a synchronous `ureq` agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    accept_invalid_certs: bool,
    timeout: Option<Duration>,
}

impl UreqTransport {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            accept_invalid_certs: config.accept_invalid_certs,
            timeout: config.timeout,
        }
    }

    /// HTTP error statuses are returned as data; only the JSON `status`
    /// field decides whether a call succeeded.
    fn agent(&self) -> ureq::Agent {
        let tls = TlsConfig::builder()
            .disable_verification(self.accept_invalid_certs)
            .build();
        ureq::Agent::config_builder()
            .http_status_as_error(false)
            .tls_config(tls)
            .max_idle_connections(0)
            .timeout_global(self.timeout)
            .build()
            .new_agent()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let agent = self.agent();
        let body = request.body.as_slice();

        let result = match request.method {
            HttpMethod::Get => with_headers(agent.get(&request.url), &request.headers)
                .force_send_body()
                .send(body),
            HttpMethod::Post => with_headers(agent.post(&request.url), &request.headers).send(body),
        };
        let mut response = result.map_err(|e| map_send_error(&request.url, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

/// Failures before a response arrives: name resolution, connect and socket
/// errors mean the appliance was never reached.
fn map_send_error(url: &str, err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::HostNotFound | ureq::Error::ConnectionFailed | ureq::Error::Io(_) => {
            warn!(url, error = %err, "appliance unreachable");
            ApiError::Connect {
                addr: url.to_string(),
                reason: err.to_string(),
            }
        }
        other => ApiError::Transport(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Scheme, Tool};

    #[test]
    fn refused_connection_is_a_connect_error() {
        // Bind then drop to get a local port nobody listens on.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let config = ClientConfig::new("127.0.0.1", "u", "p", Tool::Fio)
            .port(port)
            .scheme(Scheme::Http);
        let transport = UreqTransport::from_config(&config);
        let request = HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}killtest", config.base_url()),
            headers: Vec::new(),
            body: b"\r\n--B--\r\n".to_vec(),
        };
        let err = transport.execute(&request).unwrap_err();
        assert!(err.is_connect(), "unexpected error: {err}");
    }

    #[test]
    fn certificate_check_follows_config() {
        let config = ClientConfig::new("appliance.lab", "u", "p", Tool::Fio);

        let strict = UreqTransport::from_config(&config).agent();
        assert!(!strict.config().tls_config().disable_verification());

        let lenient =
            UreqTransport::from_config(&config.danger_accept_invalid_certs(true)).agent();
        assert!(lenient.config().tls_config().disable_verification());
    }

    #[test]
    fn agent_keeps_no_idle_connections() {
        let config = ClientConfig::new("appliance.lab", "u", "p", Tool::Fio);
        let agent = UreqTransport::from_config(&config).agent();
        assert_eq!(agent.config().max_idle_connections(), 0);
    }

    #[test]
    fn unknown_host_is_a_connect_error() {
        let config = ClientConfig::new("appliance.invalid", "u", "p", Tool::Fio);
        let transport = UreqTransport::from_config(&config);
        let request = HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}readlog", config.base_url()),
            headers: Vec::new(),
            body: Vec::new(),
        };
        let err = transport.execute(&request).unwrap_err();
        assert!(err.is_connect(), "unexpected error: {err}");
    }
}
