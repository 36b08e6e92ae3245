// ── Update prioritization ──

use serde::Serialize;
use strum::Display;

use crate::model::{InventoryItem, ItemKind, PendingUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn score(self) -> u8 {
        match self {
            Self::Critical => 100,
            Self::High => 75,
            Self::Medium => 50,
            Self::Low => 25,
        }
    }
}

/// First matching rule wins: security release, active plugin, active
/// theme, anything else.
pub fn classify(update: &PendingUpdate) -> Priority {
    if update.is_security {
        Priority::Critical
    } else if update.is_active && update.kind == ItemKind::Plugin {
        Priority::High
    } else if update.is_active && update.kind == ItemKind::Theme {
        Priority::Medium
    } else {
        Priority::Low
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrioritizedUpdate {
    #[serde(flatten)]
    pub update: PendingUpdate,
    pub priority: Priority,
    pub score: u8,
}

/// Classify every update and order by score, highest first. The sort is
/// stable: equal scores keep their input order.
pub fn prioritize(updates: &[PendingUpdate]) -> Vec<PrioritizedUpdate> {
    let mut out: Vec<PrioritizedUpdate> = updates
        .iter()
        .map(|u| {
            let priority = classify(u);
            PrioritizedUpdate {
                update: u.clone(),
                priority,
                score: priority.score(),
            }
        })
        .collect();
    out.sort_by(|a, b| b.score.cmp(&a.score));
    out
}

/// Pending updates in the cached inventory, in inventory order.
pub fn pending_updates(items: &[InventoryItem]) -> Vec<PendingUpdate> {
    items
        .iter()
        .filter(|i| i.update_available)
        .map(PendingUpdate::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SiteId;
    use crate::testing::inventory_item;
    use pretty_assertions::assert_eq;

    fn pending(slug: &str, kind: ItemKind, active: bool, security: bool) -> PendingUpdate {
        PendingUpdate {
            site_id: SiteId::from("blog"),
            kind,
            slug: slug.into(),
            name: slug.into(),
            is_active: active,
            is_security: security,
            current_version: "1.0".into(),
            new_version: Some("1.1".into()),
        }
    }

    fn order(out: &[PrioritizedUpdate]) -> Vec<(&str, Priority)> {
        out.iter()
            .map(|p| (p.update.slug.as_str(), p.priority))
            .collect()
    }

    #[test]
    fn security_first_then_active_plugins() {
        let input = vec![
            pending("inactive", ItemKind::Plugin, false, false),
            pending("security", ItemKind::Plugin, false, true),
            pending("active", ItemKind::Plugin, true, false),
        ];
        assert_eq!(
            order(&prioritize(&input)),
            vec![
                ("security", Priority::Critical),
                ("active", Priority::High),
                ("inactive", Priority::Low),
            ]
        );
    }

    #[test]
    fn active_theme_ranks_medium() {
        let input = vec![
            pending("old-theme", ItemKind::Theme, false, false),
            pending("theme", ItemKind::Theme, true, false),
        ];
        let out = prioritize(&input);
        assert_eq!(out[0].priority, Priority::Medium);
        assert_eq!(out[0].score, 50);
        assert_eq!(out[1].score, 25);
    }

    #[test]
    fn ties_keep_input_order() {
        let input = vec![
            pending("c", ItemKind::Plugin, true, false),
            pending("a", ItemKind::Plugin, true, false),
            pending("b", ItemKind::Plugin, true, false),
        ];
        let out = prioritize(&input);
        let slugs: Vec<&str> = order(&out).into_iter().map(|(s, _)| s).collect();
        assert_eq!(slugs, vec!["c", "a", "b"]);
    }

    #[test]
    fn security_outranks_inactivity() {
        assert_eq!(
            classify(&pending("t", ItemKind::Theme, false, true)),
            Priority::Critical
        );
    }

    #[test]
    fn pending_updates_skips_current_items() {
        let items = vec![
            inventory_item("blog", ItemKind::Plugin, "current", "2.0", None),
            inventory_item("blog", ItemKind::Plugin, "stale", "1.0", Some("1.2")),
        ];
        let pending = pending_updates(&items);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].slug, "stale");
        assert_eq!(pending[0].new_version.as_deref(), Some("1.2"));
    }

    #[test]
    fn empty_input() {
        assert!(prioritize(&[]).is_empty());
    }
}
