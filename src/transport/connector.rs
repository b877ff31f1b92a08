//! Outbound connection to the relay.
//!
//! Builds the relay URL and handshake request, performs the WebSocket
//! handshake (plaintext or TLS) and wraps the result in a
//! [`RelayConnection`].
//!
//! Identity and credential are sent twice: as query parameters on the
//! `/ws` endpoint and as request headers. The relay may authenticate with
//! either.

use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, WebPkiSupportedAlgorithms};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::{connect_async_tls_with_config, Connector};
use tracing::{info, info_span, warn, Instrument};
use url::Url;

use super::stream::{RelayConnection, RelayStream};
use crate::{AppError, Result};

/// Fixed relay endpoint path.
pub const ENDPOINT_PATH: &str = "/ws";

/// Header carrying the server identity.
pub const SERVER_NAME_HEADER: &str = "X-MCP-Server-Name";

/// Query parameter carrying the server identity.
pub const SERVER_NAME_PARAM: &str = "server_name";

/// Query parameter carrying the bearer credential.
pub const TOKEN_PARAM: &str = "token";

const REDACTED: &str = "REDACTED";

/// Everything needed to dial the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayTarget {
    /// Relay `host:port`.
    pub address: String,
    /// Use `wss` instead of `ws`.
    pub tls: bool,
    /// Identity announced to the relay.
    pub server_name: String,
    /// Optional bearer credential.
    pub token: Option<String>,
    /// Accept any server certificate on this connection (TLS only).
    pub insecure_skip_verify: bool,
}

impl RelayTarget {
    /// URL scheme implied by the `tls` flag.
    #[must_use]
    pub fn scheme(&self) -> &'static str {
        if self.tls {
            "wss"
        } else {
            "ws"
        }
    }

    /// Full relay URL including identity and credential query parameters.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when the address does not form a valid URL.
    pub fn url(&self) -> Result<Url> {
        self.build_url(self.token.as_deref())
    }

    /// Relay URL safe for logs: the credential is replaced by a marker.
    #[must_use]
    pub fn redacted_url(&self) -> String {
        let token = self.token.as_ref().map(|_| REDACTED);
        self.build_url(token).map_or_else(
            |_| format!("{}://{}{ENDPOINT_PATH}", self.scheme(), self.address),
            String::from,
        )
    }

    /// Handshake request with identity and credential headers attached.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when the URL is invalid or the identity or
    /// credential cannot be carried in an HTTP header.
    pub fn request(&self) -> Result<Request> {
        let url = self.url()?;
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|err| AppError::Config(format!("invalid relay request: {err}")))?;

        let name = HeaderValue::from_str(&self.server_name).map_err(|err| {
            AppError::Config(format!("server name is not a valid header value: {err}"))
        })?;
        request.headers_mut().insert(SERVER_NAME_HEADER, name);

        if let Some(token) = &self.token {
            let mut bearer = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|err| {
                AppError::Config(format!("token is not a valid header value: {err}"))
            })?;
            bearer.set_sensitive(true);
            request.headers_mut().insert(AUTHORIZATION, bearer);
        }

        Ok(request)
    }

    fn build_url(&self, token: Option<&str>) -> Result<Url> {
        let base = format!("{}://{}{ENDPOINT_PATH}", self.scheme(), self.address);
        let mut url = Url::parse(&base).map_err(|err| {
            AppError::Config(format!("invalid relay address '{}': {err}", self.address))
        })?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair(SERVER_NAME_PARAM, &self.server_name);
            if let Some(token) = token {
                query.append_pair(TOKEN_PARAM, token);
            }
        }
        Ok(url)
    }
}

/// Dial the relay and perform the WebSocket handshake.
///
/// No retries are attempted; the first failure is returned.
///
/// # Errors
///
/// - `AppError::Config` when the target cannot be turned into a request or
///   the TLS configuration cannot be built.
/// - `AppError::Connect` when the TCP connect, TLS negotiation or HTTP
///   upgrade fails; carries the HTTP status when the relay answered one.
pub async fn connect(target: &RelayTarget) -> Result<RelayConnection> {
    let redacted = target.redacted_url();
    let span = info_span!("relay_connect", url = %redacted, server_name = %target.server_name);

    async move {
        let request = target.request()?;

        let connector = match (target.tls, target.insecure_skip_verify) {
            (true, true) => {
                warn!("certificate verification disabled for this connection");
                Some(Connector::Rustls(Arc::new(insecure_client_config()?)))
            }
            (false, true) => {
                warn!("skip-verify has no effect on a plaintext connection");
                None
            }
            _ => None,
        };

        let (socket, response) = connect_async_tls_with_config(request, None, true, connector)
            .await
            .map_err(|err| connect_error(&redacted, err))?;

        info!(status = response.status().as_u16(), "connected to relay");
        Ok(RelayStream::new(socket, redacted.clone()))
    }
    .instrument(span)
    .await
}

fn connect_error(url: &str, err: WsError) -> AppError {
    let status = match &err {
        WsError::Http(response) => Some(response.status().as_u16()),
        _ => None,
    };
    AppError::Connect {
        url: url.to_owned(),
        status,
        reason: err.to_string(),
    }
}

/// Client TLS configuration that accepts any server certificate.
///
/// Handshake signatures are still checked, so the peer must hold the key
/// for the certificate it presents.
fn insecure_client_config() -> Result<ClientConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let verifier = AcceptAnyCertificate {
        algorithms: provider.signature_verification_algorithms,
    };

    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|err| AppError::Config(format!("tls setup failed: {err}")))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_no_client_auth();

    Ok(config)
}

#[derive(Debug)]
struct AcceptAnyCertificate {
    algorithms: WebPkiSupportedAlgorithms,
}

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}
