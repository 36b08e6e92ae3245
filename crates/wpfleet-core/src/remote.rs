// ── Remote site capability ──
//
// The engines only ever see a site through `RemoteSite`. `SiteAccess`
// bundles the two steps needed to get one: decrypt the stored credential,
// then hand it to a `SiteConnector`. Either step failing means the whole
// site is unreachable for this run.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use tracing::debug;

use wpfleet_api::{TlsMode, TransportConfig, WpClient};

use crate::config::{FleetConfig, TlsVerification};
use crate::error::CoreError;
use crate::model::{InventoryItem, ItemKind, Site, SiteId};

// ── Capability types ─────────────────────────────────────────────────

/// Result of a health probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheck {
    pub online: bool,
    /// WordPress core version.
    pub version: Option<String>,
    pub php_version: Option<String>,
    pub is_ssl: bool,
    pub ssl_expiry: Option<DateTime<Utc>>,
}

impl HealthCheck {
    pub fn offline() -> Self {
        Self {
            online: false,
            version: None,
            php_version: None,
            is_ssl: false,
            ssl_expiry: None,
        }
    }
}

/// Pending update metadata reported by the site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUpdate {
    pub version: String,
    pub security: bool,
}

/// An installed plugin or theme as the site reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteItem {
    pub slug: String,
    pub name: String,
    pub version: String,
    pub update: Option<RemoteUpdate>,
    pub active: bool,
}

impl RemoteItem {
    /// Convert into the cached inventory row for `site_id`.
    pub fn into_inventory_item(self, site_id: &SiteId, kind: ItemKind) -> InventoryItem {
        let (update_available, new_version, security_update) = match self.update {
            Some(u) => (true, Some(u.version), u.security),
            None => (false, None, false),
        };
        InventoryItem {
            site_id: site_id.clone(),
            kind,
            slug: self.slug,
            name: self.name,
            version: self.version,
            update_available,
            new_version,
            is_active: self.active,
            security_update,
        }
    }
}

/// Version reported after an update was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedUpdate {
    pub version: String,
}

// ── Seams ────────────────────────────────────────────────────────────

/// Per-site management capability. Every call may fail; callers convert
/// failures into per-site or per-item outcomes.
#[async_trait]
pub trait RemoteSite: Send + Sync {
    async fn check_health(&self) -> Result<HealthCheck, CoreError>;
    async fn list_plugins(&self) -> Result<Vec<RemoteItem>, CoreError>;
    async fn list_themes(&self) -> Result<Vec<RemoteItem>, CoreError>;
    async fn apply_plugin_update(&self, slug: &str) -> Result<AppliedUpdate, CoreError>;
    async fn apply_theme_update(&self, slug: &str) -> Result<AppliedUpdate, CoreError>;
}

/// Builds a [`RemoteSite`] for a site from its decrypted credential.
pub trait SiteConnector: Send + Sync {
    fn connect(&self, site: &Site, credential: SecretString)
    -> Result<Arc<dyn RemoteSite>, CoreError>;
}

/// Turns a stored credential reference into the usable secret.
pub trait CredentialCipher: Send + Sync {
    fn decrypt(&self, ciphertext: &str) -> Result<SecretString, CoreError>;
}

/// Connector + cipher pair shared by the sync engine and the orchestrator.
#[derive(Clone)]
pub struct SiteAccess {
    connector: Arc<dyn SiteConnector>,
    cipher: Arc<dyn CredentialCipher>,
}

impl SiteAccess {
    pub fn new(connector: Arc<dyn SiteConnector>, cipher: Arc<dyn CredentialCipher>) -> Self {
        Self { connector, cipher }
    }

    /// Decrypt the site's credential and connect. Any failure here is
    /// reported as a site-level error.
    pub fn open(&self, site: &Site) -> Result<Arc<dyn RemoteSite>, CoreError> {
        let secret = self.cipher.decrypt(&site.credential).map_err(|e| match e {
            CoreError::Credential { .. } => e,
            other => CoreError::Credential {
                message: other.to_string(),
            },
        })?;
        debug!(site = %site.id, "credential resolved");
        self.connector.connect(site, secret)
    }
}

// ── HTTP implementation ──────────────────────────────────────────────

/// [`SiteConnector`] that builds a [`WpClient`] per site. All sites share
/// one pooled HTTP client, built on first connect.
#[derive(Debug)]
pub struct HttpConnector {
    transport: TransportConfig,
    http: OnceLock<reqwest::Client>,
}

impl HttpConnector {
    pub fn new(config: &FleetConfig) -> Self {
        let tls = match &config.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        Self {
            transport: TransportConfig {
                tls,
                timeout: config.request_timeout,
            },
            http: OnceLock::new(),
        }
    }

    fn http(&self) -> Result<reqwest::Client, CoreError> {
        if let Some(client) = self.http.get() {
            return Ok(client.clone());
        }
        let client = self.transport.build_client()?;
        Ok(self.http.get_or_init(|| client).clone())
    }
}

impl SiteConnector for HttpConnector {
    fn connect(
        &self,
        site: &Site,
        credential: SecretString,
    ) -> Result<Arc<dyn RemoteSite>, CoreError> {
        let url: url::Url = site.url.parse().map_err(|e| CoreError::Config {
            message: format!("invalid URL for site {}: {e}", site.id),
        })?;
        let client = WpClient::with_client(self.http()?, url, site.username.clone(), credential);
        Ok(Arc::new(client))
    }
}

#[async_trait]
impl RemoteSite for WpClient {
    async fn check_health(&self) -> Result<HealthCheck, CoreError> {
        let resp = self.health().await?;
        let mut check = HealthCheck::from(resp);
        check.is_ssl = check.is_ssl || self.is_https();
        Ok(check)
    }

    async fn list_plugins(&self) -> Result<Vec<RemoteItem>, CoreError> {
        let items = WpClient::list_plugins(self).await?;
        Ok(items.into_iter().map(RemoteItem::from).collect())
    }

    async fn list_themes(&self) -> Result<Vec<RemoteItem>, CoreError> {
        let items = WpClient::list_themes(self).await?;
        Ok(items.into_iter().map(RemoteItem::from).collect())
    }

    async fn apply_plugin_update(&self, slug: &str) -> Result<AppliedUpdate, CoreError> {
        Ok(self.update_plugin(slug).await?.into())
    }

    async fn apply_theme_update(&self, slug: &str) -> Result<AppliedUpdate, CoreError> {
        Ok(self.update_theme(slug).await?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeConnector, StaticCipher};

    #[test]
    fn remote_item_maps_update_metadata() {
        let item = RemoteItem {
            slug: "akismet".into(),
            name: "Akismet".into(),
            version: "5.3".into(),
            update: Some(RemoteUpdate {
                version: "5.3.1".into(),
                security: true,
            }),
            active: true,
        };
        let row = item.into_inventory_item(&SiteId::from("blog"), ItemKind::Plugin);
        assert!(row.update_available);
        assert!(row.security_update);
        assert_eq!(row.new_version.as_deref(), Some("5.3.1"));
    }

    #[test]
    fn open_wraps_cipher_failures_as_credential_errors() {
        let access = SiteAccess::new(
            Arc::new(FakeConnector::default()),
            Arc::new(StaticCipher::failing("key rotated")),
        );
        let site = Site::new("a", "A", "https://a.example", "bot", "garbage");
        let err = access.open(&site).err();
        assert!(matches!(err, Some(CoreError::Credential { .. })));
    }

    #[test]
    fn http_connector_rejects_bad_urls() {
        let connector = HttpConnector::new(&FleetConfig::default());
        let site = Site::new("a", "A", "not a url", "bot", "x");
        let err = connector
            .connect(&site, SecretString::from("pw".to_string()))
            .err();
        assert!(matches!(err, Some(CoreError::Config { .. })));
    }
}
