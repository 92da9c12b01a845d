//! SSRF-guarded forwarding of binary payloads.
//!
//! [`RelayForwarder::forward`] validates the destination URL, applies the
//! configured [`HostPolicyMode`], and POSTs the payload through a
//! [`RelayTransport`]. The upstream status, body, and headers come back
//! verbatim; only network-level failures are errors.

pub mod headers;
mod resolve;
mod transport;

pub use headers::DEFAULT_CONTENT_TYPE;
pub use headers::HeaderOverrides;
pub use headers::HeaderScalar;
pub use headers::parse_header_overrides;
pub use resolve::HostResolver;
pub use resolve::SystemResolver;
pub use transport::OutboundRequest;
pub use transport::RelayTransport;
pub use transport::ReqwestTransport;
pub use transport::UpstreamResponse;

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::Arc;

use url::Url;

use crate::Error;
use crate::HostPolicyMode;
use crate::RelayConfig;
use crate::Result;
use crate::security::HostPolicy;
use crate::security::host::Screening;

/// A payload to relay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayRequest {
    /// Absolute http or https destination.
    pub url: String,
    /// Header overrides.
    pub headers: HeaderOverrides,
    /// Payload bytes.
    pub payload: Vec<u8>,
}

/// The upstream's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResponse {
    /// Upstream status code, including non-2xx.
    pub status: u16,
    /// Upstream body.
    pub body: Vec<u8>,
    /// Lowercased header names mapped to comma-joined values.
    pub headers: BTreeMap<String, String>,
}

/// Forwards payloads to caller-chosen URLs under a host policy.
#[derive(Debug, Clone)]
pub struct RelayForwarder {
    policy: HostPolicy,
    resolver: Arc<dyn HostResolver>,
    transport: Arc<dyn RelayTransport>,
}

impl RelayForwarder {
    /// Creates a forwarder with the system resolver and a `reqwest` transport.
    pub fn new(config: &RelayConfig) -> Result<Self> {
        Ok(Self::with_parts(
            config.policy,
            Arc::new(SystemResolver),
            Arc::new(ReqwestTransport::new(config)?),
        ))
    }

    /// Creates a forwarder from explicit collaborators.
    pub fn with_parts(
        mode: HostPolicyMode,
        resolver: Arc<dyn HostResolver>,
        transport: Arc<dyn RelayTransport>,
    ) -> Self {
        Self {
            policy: HostPolicy::new(mode),
            resolver,
            transport,
        }
    }

    /// Configured host policy mode.
    pub fn mode(&self) -> HostPolicyMode {
        self.policy.mode()
    }

    /// Relays a [`RelayRequest`].
    pub async fn send(&self, request: RelayRequest) -> Result<RelayResponse> {
        self.forward(&request.url, request.payload, &request.headers)
            .await
    }

    /// POSTs `payload` to `url` and returns the upstream response.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] for unparsable URLs or schemes other than
    ///   http/https
    /// - [`Error::ForbiddenHost`] when restricted mode rejects the host or
    ///   any address it resolves to
    /// - [`Error::InvalidHeader`] for overrides that cannot be sent
    /// - [`Error::Transport`] for DNS, connect, timeout, and I/O failures
    pub async fn forward(
        &self,
        url: &str,
        payload: Vec<u8>,
        headers: &HeaderOverrides,
    ) -> Result<RelayResponse> {
        let url = parse_destination(url)?;
        let pinned = self.check_host(&url).await?;
        let headers = headers::build_request_headers(headers)?;

        tracing::debug!(url = %url, bytes = payload.len(), "relaying payload");
        let upstream = self
            .transport
            .post(OutboundRequest {
                url: url.clone(),
                headers,
                body: payload,
                pinned,
            })
            .await
            .inspect_err(|e| tracing::warn!(url = %url, error = %e, "relay failed"))?;

        tracing::info!(
            url = %url,
            status = upstream.status,
            bytes = upstream.body.len(),
            "relay completed"
        );

        Ok(RelayResponse {
            status: upstream.status,
            headers: headers::normalize_response_headers(&upstream.headers),
            body: upstream.body,
        })
    }

    async fn check_host(&self, url: &Url) -> Result<Vec<std::net::SocketAddr>> {
        let host = url.host().ok_or_else(|| Error::InvalidUrl {
            url: url.to_string(),
            reason: "missing host".to_string(),
        })?;

        let screening = self.policy.screen(&host).inspect_err(|e| {
            tracing::warn!(url = %url, error = %e, "relay destination rejected");
        })?;
        if screening == Screening::Allowed {
            return Ok(Vec::new());
        }

        let name = host.to_string();
        let port = url.port_or_known_default().unwrap_or(80);
        let addrs = self
            .resolver
            .resolve(&name, port)
            .await
            .map_err(Error::transport)?;
        let ips: Vec<IpAddr> = addrs.iter().map(std::net::SocketAddr::ip).collect();
        self.policy.check_resolved(&name, &ips).inspect_err(|e| {
            tracing::warn!(url = %url, error = %e, "relay destination rejected");
        })?;
        Ok(addrs)
    }
}

fn parse_destination(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| Error::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(Error::InvalidUrl {
                url: raw.to_string(),
                reason: format!("unsupported scheme '{other}'"),
            });
        }
    }
    if url.host().is_none() {
        return Err(Error::InvalidUrl {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(url)
}
