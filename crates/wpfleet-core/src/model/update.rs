// ── Update requests, results, and the append-only log ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use super::inventory::{InventoryItem, ItemKind};
use super::site_id::SiteId;

/// One unit of bulk-update input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub site_id: SiteId,
    pub kind: ItemKind,
    pub slug: String,
}

impl UpdateRequest {
    pub fn plugin(site_id: impl Into<SiteId>, slug: impl Into<String>) -> Self {
        Self {
            site_id: site_id.into(),
            kind: ItemKind::Plugin,
            slug: slug.into(),
        }
    }

    pub fn theme(site_id: impl Into<SiteId>, slug: impl Into<String>) -> Self {
        Self {
            site_id: site_id.into(),
            kind: ItemKind::Theme,
            slug: slug.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UpdateStatus {
    Success,
    Failed,
}

/// Outcome of one [`UpdateRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResult {
    pub site_id: SiteId,
    pub kind: ItemKind,
    pub slug: String,
    pub status: UpdateStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_version: Option<String>,
}

impl UpdateResult {
    pub fn success(request: UpdateRequest, new_version: String) -> Self {
        Self {
            site_id: request.site_id,
            kind: request.kind,
            slug: request.slug,
            status: UpdateStatus::Success,
            message: None,
            new_version: Some(new_version),
        }
    }

    pub fn failed(request: UpdateRequest, message: impl Into<String>) -> Self {
        Self {
            site_id: request.site_id,
            kind: request.kind,
            slug: request.slug,
            status: UpdateStatus::Failed,
            message: Some(message.into()),
            new_version: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == UpdateStatus::Success
    }
}

/// Persisted record of one [`UpdateResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateLogEntry {
    pub id: Uuid,
    #[serde(flatten)]
    pub result: UpdateResult,
    pub completed_at: DateTime<Utc>,
}

impl UpdateLogEntry {
    pub fn new(result: UpdateResult, completed_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            result,
            completed_at,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

impl UpdateSummary {
    pub fn from_results(results: &[UpdateResult]) -> Self {
        let successful = results.iter().filter(|r| r.is_success()).count();
        Self {
            total: results.len(),
            successful,
            failed: results.len() - successful,
        }
    }
}

/// Everything `apply_updates` hands back: one result per request, in
/// request order, plus totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateBatchReport {
    pub results: Vec<UpdateResult>,
    pub summary: UpdateSummary,
}

impl UpdateBatchReport {
    pub fn new(results: Vec<UpdateResult>) -> Self {
        let summary = UpdateSummary::from_results(&results);
        Self { results, summary }
    }
}

/// A pending update as seen by the prioritizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingUpdate {
    pub site_id: SiteId,
    pub kind: ItemKind,
    pub slug: String,
    pub name: String,
    pub is_active: bool,
    pub is_security: bool,
    pub current_version: String,
    pub new_version: Option<String>,
}

impl PendingUpdate {
    pub fn request(&self) -> UpdateRequest {
        UpdateRequest {
            site_id: self.site_id.clone(),
            kind: self.kind,
            slug: self.slug.clone(),
        }
    }
}

impl From<&InventoryItem> for PendingUpdate {
    fn from(item: &InventoryItem) -> Self {
        Self {
            site_id: item.site_id.clone(),
            kind: item.kind,
            slug: item.slug.clone(),
            name: item.name.clone(),
            is_active: item.is_active,
            is_security: item.security_update,
            current_version: item.version.clone(),
            new_version: item.new_version.clone(),
        }
    }
}
