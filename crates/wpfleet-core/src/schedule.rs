// ── Sync scheduling and notifications ──
//
// Pure functions over current fleet state. Callers decide what to do with
// the answers; nothing here suspends or touches the store.

use chrono::{DateTime, TimeDelta, Utc};

use crate::config::NotificationPolicy;
use crate::health::SiteHealthView;
use crate::model::{Notification, NotificationKind, Severity, Site, SiteStatus};

/// Sites that have never synced, or last synced at least `interval_minutes`
/// ago. The boundary is inclusive.
pub fn sites_due_for_sync(sites: &[Site], interval_minutes: u64, now: DateTime<Utc>) -> Vec<&Site> {
    let interval = i64::try_from(interval_minutes)
        .ok()
        .and_then(TimeDelta::try_minutes)
        .unwrap_or(TimeDelta::MAX);

    sites
        .iter()
        .filter(|site| match site.last_synced {
            None => true,
            Some(at) => now - at >= interval,
        })
        .collect()
}

/// Notifications for the current state of `views`. A site may produce
/// several.
pub fn build_notifications(
    views: &[SiteHealthView],
    policy: &NotificationPolicy,
    now: DateTime<Utc>,
) -> Vec<Notification> {
    let ssl_window = TimeDelta::try_days(policy.ssl_warning_days).unwrap_or(TimeDelta::MAX);
    let mut out = Vec::new();

    for view in views {
        let notify = |kind, severity, message: String| Notification {
            site_id: view.site_id.clone(),
            site_name: view.site_name.clone(),
            kind,
            severity,
            message,
        };

        if view.status == SiteStatus::Offline {
            out.push(notify(
                NotificationKind::Offline,
                Severity::Critical,
                format!("{} is offline", view.site_name),
            ));
        }

        let pending = view.total_updates();
        if pending > u64::from(policy.update_threshold) {
            out.push(notify(
                NotificationKind::UpdatesAvailable,
                Severity::Warning,
                format!("{} has {pending} pending updates", view.site_name),
            ));
        }

        if let Some(expiry) = view.ssl_expiry {
            let remaining = expiry - now;
            if remaining <= ssl_window {
                let message = if remaining < TimeDelta::zero() {
                    format!("SSL certificate for {} has expired", view.site_name)
                } else {
                    format!(
                        "SSL certificate for {} expires in {} days",
                        view.site_name,
                        remaining.num_days()
                    )
                };
                out.push(notify(NotificationKind::SslExpiring, Severity::Warning, message));
            }
        }
    }

    out
}
