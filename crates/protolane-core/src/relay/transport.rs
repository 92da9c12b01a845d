//! HTTP transport used to deliver relayed payloads.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::redirect::Policy;
use url::Url;

use crate::Error;
use crate::RelayConfig;
use crate::Result;

/// A request ready to be sent upstream.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    /// Validated destination.
    pub url: Url,
    /// Complete outbound header set.
    pub headers: HeaderMap,
    /// Payload, forwarded unmodified.
    pub body: Vec<u8>,
    /// Addresses the host name was resolved to and checked against. When not
    /// empty, the transport must connect only to these.
    pub pinned: Vec<SocketAddr>,
}

/// Raw upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    /// Status code, whatever its class.
    pub status: u16,
    /// Response headers as received.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Vec<u8>,
}

/// Sends a single POST request and returns the full response.
///
/// Implementations must not treat a non-2xx status as an error and must not
/// retry.
#[async_trait]
pub trait RelayTransport: Send + Sync + fmt::Debug {
    /// Sends `request`.
    async fn post(&self, request: OutboundRequest) -> Result<UpstreamResponse>;
}

/// [`RelayTransport`] backed by `reqwest`.
///
/// Redirects are not followed, system proxies are ignored, and the whole
/// exchange is bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Builds a transport from relay configuration.
    pub fn new(config: &RelayConfig) -> Result<Self> {
        let client = client_builder(config.timeout)
            .build()
            .map_err(Error::transport)?;
        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }

    fn client_for(&self, request: &OutboundRequest) -> Result<reqwest::Client> {
        match request.url.host_str() {
            Some(host) if !request.pinned.is_empty() => client_builder(self.timeout)
                .resolve_to_addrs(host, &request.pinned)
                .build()
                .map_err(Error::transport),
            _ => Ok(self.client.clone()),
        }
    }
}

fn client_builder(timeout: Duration) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .timeout(timeout)
        .redirect(Policy::none())
        .no_proxy()
}

#[async_trait]
impl RelayTransport for ReqwestTransport {
    async fn post(&self, request: OutboundRequest) -> Result<UpstreamResponse> {
        let client = self.client_for(&request)?;
        let response = client
            .post(request.url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await
            .map_err(Error::transport)?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(Error::transport)?;

        Ok(UpstreamResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}
