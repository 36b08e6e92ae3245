// wpfleet-api: Async Rust client for per-site management endpoints

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::WpClient;
pub use error::Error;
pub use models::{HealthResponse, InstalledItem, ItemStatus, UpdateInfo, UpdateResponse};
pub use transport::{TlsMode, TransportConfig};
