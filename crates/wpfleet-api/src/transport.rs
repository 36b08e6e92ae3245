// HTTP transport settings shared by every site client.
//
// A fleet run talks to many hosts with identical TLS and timeout rules, so
// one pooled `reqwest::Client` is built from a `TransportConfig` and handed
// to each `WpClient`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;

/// Upper bound on the TCP/TLS connect phase. A dead host should be
/// classified offline long before the full request timeout.
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Idle keep-alive connections kept per site between calls.
const IDLE_CONNECTIONS_PER_SITE: usize = 2;

/// How server certificates are checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsMode {
    /// Platform root store.
    #[default]
    System,
    /// Trust an extra CA, read from a PEM file.
    CustomCa(PathBuf),
    /// No verification at all (staging sites with self-signed certs).
    DangerAcceptInvalid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Connect-phase timeout: the request timeout, capped.
    pub fn connect_timeout(&self) -> Duration {
        self.timeout.min(MAX_CONNECT_TIMEOUT)
    }

    /// Build the pooled client. Cheap to clone afterwards.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout())
            .pool_max_idle_per_host(IDLE_CONNECTIONS_PER_SITE)
            .user_agent(concat!("wpfleet/", env!("CARGO_PKG_VERSION")));

        let builder = match &self.tls {
            TlsMode::System => builder,
            TlsMode::CustomCa(path) => builder.add_root_certificate(load_ca(path)?),
            TlsMode::DangerAcceptInvalid => builder.danger_accept_invalid_certs(true),
        };

        builder
            .build()
            .map_err(|e| Error::Tls(format!("cannot initialise HTTP client: {e}")))
    }
}

fn load_ca(path: &Path) -> Result<reqwest::Certificate, Error> {
    let pem = std::fs::read(path)
        .map_err(|e| Error::Tls(format!("cannot read CA bundle {}: {e}", path.display())))?;
    reqwest::Certificate::from_pem(&pem)
        .map_err(|e| Error::Tls(format!("{} is not a PEM certificate: {e}", path.display())))
}
