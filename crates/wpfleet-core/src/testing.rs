// ── Test doubles ──
//
// Scripted in-memory sites for exercising the engines without a network.
// A `FakeSite` keeps a live plugin/theme list that successful updates
// mutate, so reconciliation re-reads what the "remote" now reports.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::CoreError;
use crate::model::{InventoryItem, ItemKind, Site, SiteId};
use crate::remote::{
    AppliedUpdate, CredentialCipher, HealthCheck, RemoteItem, RemoteSite, RemoteUpdate,
    SiteAccess, SiteConnector,
};
use crate::store::{InventoryStore, MemoryStore};

// ── Fixtures ─────────────────────────────────────────────────────────

pub(crate) fn site(id: &str) -> Site {
    Site::new(
        id,
        id.to_uppercase(),
        format!("https://{id}.example"),
        "bot",
        format!("plain:{id}"),
    )
}

pub(crate) fn inventory_item(
    site_id: &str,
    kind: ItemKind,
    slug: &str,
    version: &str,
    new_version: Option<&str>,
) -> InventoryItem {
    InventoryItem {
        site_id: SiteId::from(site_id),
        kind,
        slug: slug.into(),
        name: slug.to_uppercase(),
        version: version.into(),
        update_available: new_version.is_some(),
        new_version: new_version.map(str::to_owned),
        is_active: true,
        security_update: false,
    }
}

pub(crate) fn remote_item(slug: &str, version: &str, update: Option<&str>) -> RemoteItem {
    RemoteItem {
        slug: slug.into(),
        name: slug.to_uppercase(),
        version: version.into(),
        update: update.map(|v| RemoteUpdate {
            version: v.into(),
            security: false,
        }),
        active: true,
    }
}

/// A store pre-populated with `ids` as never-checked sites.
pub(crate) async fn seeded_store(ids: &[&str]) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for id in ids {
        store.upsert_site(site(id)).await.unwrap();
    }
    store
}

pub(crate) fn access(connector: &Arc<FakeConnector>) -> SiteAccess {
    SiteAccess::new(connector.clone(), Arc::new(StaticCipher::default()))
}

// ── Failure scripting ────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub(crate) enum Fail {
    Unreachable(&'static str),
    Auth,
    Remote(&'static str),
    /// The call panics instead of returning.
    Panic,
}

impl Fail {
    fn error(&self) -> CoreError {
        match self {
            Self::Unreachable(msg) => CoreError::Unreachable {
                message: (*msg).into(),
            },
            Self::Auth => CoreError::AuthenticationFailed {
                message: "invalid application password".into(),
            },
            Self::Remote(msg) => CoreError::Remote {
                message: (*msg).into(),
                status: Some(500),
            },
            Self::Panic => panic!("fake site blew up"),
        }
    }
}

/// Tracks how many calls are in flight at once.
#[derive(Debug, Default)]
pub(crate) struct Probe {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Probe {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub(crate) fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

// ── FakeSite ─────────────────────────────────────────────────────────

#[derive(Debug)]
struct Remote {
    health: Result<HealthCheck, Fail>,
    plugins: Vec<RemoteItem>,
    themes: Vec<RemoteItem>,
    plugins_fail: Option<Fail>,
    themes_fail: Option<Fail>,
    update_fail: HashMap<(ItemKind, String), Fail>,
}

#[derive(Debug)]
pub(crate) struct FakeSite {
    remote: Mutex<Remote>,
    calls: Mutex<Vec<String>>,
    delay: Duration,
    own: Probe,
    fleet: Option<Arc<Probe>>,
}

impl FakeSite {
    pub(crate) fn online() -> Self {
        Self {
            remote: Mutex::new(Remote {
                health: Ok(HealthCheck {
                    online: true,
                    version: Some("6.5.2".into()),
                    php_version: Some("8.2".into()),
                    is_ssl: true,
                    ssl_expiry: None,
                }),
                plugins: Vec::new(),
                themes: Vec::new(),
                plugins_fail: None,
                themes_fail: None,
                update_fail: HashMap::new(),
            }),
            calls: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
            own: Probe::default(),
            fleet: None,
        }
    }

    pub(crate) fn offline() -> Self {
        Self::online().health(Ok(HealthCheck::offline()))
    }

    pub(crate) fn health(self, health: Result<HealthCheck, Fail>) -> Self {
        self.remote.lock().unwrap().health = health;
        self
    }

    pub(crate) fn plugin(self, item: RemoteItem) -> Self {
        self.remote.lock().unwrap().plugins.push(item);
        self
    }

    pub(crate) fn theme(self, item: RemoteItem) -> Self {
        self.remote.lock().unwrap().themes.push(item);
        self
    }

    pub(crate) fn plugins_fail(self, fail: Fail) -> Self {
        self.remote.lock().unwrap().plugins_fail = Some(fail);
        self
    }

    pub(crate) fn update_fails(self, kind: ItemKind, slug: &str, fail: Fail) -> Self {
        self.remote
            .lock()
            .unwrap()
            .update_fail
            .insert((kind, slug.to_owned()), fail);
        self
    }

    /// Every update call takes `delay` of (virtual) time.
    pub(crate) fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Remote-side change after construction.
    pub(crate) fn set_plugins(&self, plugins: Vec<RemoteItem>) {
        self.remote.lock().unwrap().plugins = plugins;
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Most update calls this site ever saw at once.
    pub(crate) fn peak_updates(&self) -> usize {
        self.own.peak()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    async fn apply(&self, kind: ItemKind, slug: &str) -> Result<AppliedUpdate, CoreError> {
        self.record(format!("update {kind}:{slug}"));
        self.own.enter();
        if let Some(fleet) = &self.fleet {
            fleet.enter();
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let result = self.apply_now(kind, slug);
        self.own.leave();
        if let Some(fleet) = &self.fleet {
            fleet.leave();
        }
        result
    }

    fn apply_now(&self, kind: ItemKind, slug: &str) -> Result<AppliedUpdate, CoreError> {
        let mut remote = self.remote.lock().unwrap();
        if let Some(fail) = remote.update_fail.get(&(kind, slug.to_owned())) {
            return Err(fail.error());
        }
        let list = match kind {
            ItemKind::Plugin => &mut remote.plugins,
            ItemKind::Theme => &mut remote.themes,
        };
        let item = list
            .iter_mut()
            .find(|i| i.slug == slug)
            .ok_or_else(|| CoreError::Remote {
                message: format!("{kind} {slug} is not installed"),
                status: Some(404),
            })?;
        if let Some(update) = item.update.take() {
            item.version = update.version;
        }
        Ok(AppliedUpdate {
            version: item.version.clone(),
        })
    }
}

#[async_trait]
impl RemoteSite for FakeSite {
    async fn check_health(&self) -> Result<HealthCheck, CoreError> {
        self.record("health");
        self.remote.lock().unwrap().health.clone().map_err(|f| f.error())
    }

    async fn list_plugins(&self) -> Result<Vec<RemoteItem>, CoreError> {
        self.record("plugins");
        let remote = self.remote.lock().unwrap();
        match &remote.plugins_fail {
            Some(fail) => Err(fail.error()),
            None => Ok(remote.plugins.clone()),
        }
    }

    async fn list_themes(&self) -> Result<Vec<RemoteItem>, CoreError> {
        self.record("themes");
        let remote = self.remote.lock().unwrap();
        match &remote.themes_fail {
            Some(fail) => Err(fail.error()),
            None => Ok(remote.themes.clone()),
        }
    }

    async fn apply_plugin_update(&self, slug: &str) -> Result<AppliedUpdate, CoreError> {
        self.apply(ItemKind::Plugin, slug).await
    }

    async fn apply_theme_update(&self, slug: &str) -> Result<AppliedUpdate, CoreError> {
        self.apply(ItemKind::Theme, slug).await
    }
}

/// Lets a test keep a handle on a site after giving it to the connector.
struct Shared(Arc<FakeSite>);

#[async_trait]
impl RemoteSite for Shared {
    async fn check_health(&self) -> Result<HealthCheck, CoreError> {
        self.0.check_health().await
    }
    async fn list_plugins(&self) -> Result<Vec<RemoteItem>, CoreError> {
        self.0.list_plugins().await
    }
    async fn list_themes(&self) -> Result<Vec<RemoteItem>, CoreError> {
        self.0.list_themes().await
    }
    async fn apply_plugin_update(&self, slug: &str) -> Result<AppliedUpdate, CoreError> {
        self.0.apply_plugin_update(slug).await
    }
    async fn apply_theme_update(&self, slug: &str) -> Result<AppliedUpdate, CoreError> {
        self.0.apply_theme_update(slug).await
    }
}

// ── FakeConnector ────────────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct FakeConnector {
    sites: HashMap<SiteId, Arc<FakeSite>>,
    refused: HashSet<SiteId>,
    connects: AtomicUsize,
    probe: Arc<Probe>,
}

impl FakeConnector {
    pub(crate) fn with_site(mut self, id: &str, mut site: FakeSite) -> Self {
        site.fleet = Some(Arc::clone(&self.probe));
        self.sites.insert(SiteId::from(id), Arc::new(site));
        self
    }

    /// Connecting to `id` fails as if the host were down.
    pub(crate) fn refusing(mut self, id: &str) -> Self {
        self.refused.insert(SiteId::from(id));
        self
    }

    pub(crate) fn site(&self, id: &str) -> Arc<FakeSite> {
        Arc::clone(&self.sites[&SiteId::from(id)])
    }

    pub(crate) fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Most update calls in flight across the whole fleet at once.
    pub(crate) fn peak_updates(&self) -> usize {
        self.probe.peak()
    }
}

impl SiteConnector for FakeConnector {
    fn connect(
        &self,
        site: &Site,
        _credential: SecretString,
    ) -> Result<Arc<dyn RemoteSite>, CoreError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.refused.contains(&site.id) {
            return Err(CoreError::Unreachable {
                message: format!("connection refused: {}", site.url),
            });
        }
        match self.sites.get(&site.id) {
            Some(fake) => Ok(Arc::new(Shared(Arc::clone(fake)))),
            None => Err(CoreError::Unreachable {
                message: format!("no route to {}", site.url),
            }),
        }
    }
}

// ── StaticCipher ─────────────────────────────────────────────────────

/// Identity "decryption", optionally failing for everything or for
/// selected ciphertexts.
#[derive(Debug, Default)]
pub(crate) struct StaticCipher {
    fail_all: Option<String>,
    bad: HashSet<String>,
}

impl StaticCipher {
    pub(crate) fn failing(message: &str) -> Self {
        Self {
            fail_all: Some(message.to_owned()),
            bad: HashSet::new(),
        }
    }

    pub(crate) fn rejecting(ciphertext: &str) -> Self {
        Self {
            fail_all: None,
            bad: HashSet::from([ciphertext.to_owned()]),
        }
    }
}

impl CredentialCipher for StaticCipher {
    fn decrypt(&self, ciphertext: &str) -> Result<SecretString, CoreError> {
        if let Some(message) = &self.fail_all {
            return Err(CoreError::Credential {
                message: message.clone(),
            });
        }
        if self.bad.contains(ciphertext) {
            return Err(CoreError::Internal("authentication tag mismatch".into()));
        }
        Ok(SecretString::from(ciphertext.to_owned()))
    }
}
