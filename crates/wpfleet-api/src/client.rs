// Site management HTTP client
//
// Wraps `reqwest::Client` with URL construction under the `fleet/v1`
// namespace, application-password auth, and error-body decoding. One
// `WpClient` talks to exactly one site.

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{ErrorBody, HealthResponse, InstalledItem, UpdateResponse};
use crate::transport::TransportConfig;

/// REST namespace the companion endpoint is mounted under.
const NAMESPACE: &str = "wp-json/fleet/v1";

/// Raw HTTP client for one site's management endpoints.
///
/// All methods return decoded payloads; non-success responses become
/// [`Error::Authentication`] or [`Error::Remote`] before the caller sees
/// them.
pub struct WpClient {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: SecretString,
}

impl WpClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the site root (e.g. `https://blog.example.com` or
    /// `https://example.com/wordpress` for subdirectory installs).
    pub fn new(
        base_url: Url,
        username: String,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, username, password))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        username: String,
        password: SecretString,
    ) -> Self {
        Self {
            http,
            base_url,
            username,
            password,
        }
    }

    /// The site base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether the site is served over HTTPS.
    pub fn is_https(&self) -> bool {
        self.base_url.scheme() == "https"
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /health`
    pub async fn health(&self) -> Result<HealthResponse, Error> {
        let url = self.endpoint(&["health"])?;
        self.get(url).await
    }

    /// `GET /plugins`
    pub async fn list_plugins(&self) -> Result<Vec<InstalledItem>, Error> {
        let url = self.endpoint(&["plugins"])?;
        self.get(url).await
    }

    /// `GET /themes`
    pub async fn list_themes(&self) -> Result<Vec<InstalledItem>, Error> {
        let url = self.endpoint(&["themes"])?;
        self.get(url).await
    }

    /// `POST /plugins/{slug}/update`
    pub async fn update_plugin(&self, slug: &str) -> Result<UpdateResponse, Error> {
        let url = self.endpoint(&["plugins", slug, "update"])?;
        self.post(url).await
    }

    /// `POST /themes/{slug}/update`
    pub async fn update_theme(&self, slug: &str) -> Result<UpdateResponse, Error> {
        let url = self.endpoint(&["themes", slug, "update"])?;
        self.post(url).await
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/wp-json/fleet/v1/{segments...}`, percent-encoding each
    /// segment so slugs can never escape their path position.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/{NAMESPACE}"))?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .extend(segments);
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::parse_response(resp).await
    }

    async fn post<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::parse_response(resp).await
    }

    /// Decode a success body, or turn an error response into a typed error.
    async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(Error::Authentication { message });
        }

        if !status.is_success() {
            let parsed = serde_json::from_str::<ErrorBody>(&body).ok();
            let code = parsed.as_ref().and_then(|b| b.code.clone());
            let message = parsed
                .and_then(|b| b.message)
                .unwrap_or_else(|| body.chars().take(200).collect());
            return Err(Error::Remote {
                status: status.as_u16(),
                code,
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }
}
