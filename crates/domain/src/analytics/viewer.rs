//! Viewer identity and the view de-duplication window.

use std::net::IpAddr;

use chrono::{DateTime, Duration, Utc};
use common::{EventId, Outcome, UserId};
use serde::{Deserialize, Serialize};

use super::AnalyticsError;

/// Who viewed an event: the signed-in user, or the client address for
/// anonymous visitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewerKey {
    User(UserId),
    Ip(IpAddr),
}

impl ViewerKey {
    /// Picks the user when present, otherwise parses `ip`.
    pub fn resolve(user_id: Option<UserId>, ip: &str) -> Outcome<Self> {
        let ip = parse_ip(ip)?;
        Ok(match user_id {
            Some(user_id) if !user_id.is_nil() => ViewerKey::User(user_id),
            _ => ViewerKey::Ip(ip),
        })
    }

    /// Stable text form used as the storage key.
    pub fn as_key(&self) -> String {
        match self {
            ViewerKey::User(user_id) => format!("user:{user_id}"),
            ViewerKey::Ip(ip) => format!("ip:{ip}"),
        }
    }
}

impl std::fmt::Display for ViewerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_key())
    }
}

pub(super) fn parse_ip(ip: &str) -> Outcome<IpAddr> {
    let trimmed = ip.trim();
    trimmed
        .parse()
        .map_err(|_| AnalyticsError::InvalidIpAddress(trimmed.to_string()).into())
}

/// How long a repeated view by the same viewer is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupWindow(Duration);

impl DedupWindow {
    pub const DEFAULT_SECS: i64 = 300;
    /// Longest representable window; a `Duration` holds milliseconds in an
    /// `i64`.
    pub const MAX_SECS: i64 = i64::MAX / 1_000;

    /// Builds a window clamped to `1..=MAX_SECS` seconds.
    pub fn from_secs(secs: i64) -> Self {
        Self(Duration::seconds(secs.clamp(1, Self::MAX_SECS)))
    }

    pub fn duration(&self) -> Duration {
        self.0
    }

    /// A view counts when there was no earlier view or the earlier view is
    /// at least one window old.
    pub fn should_count(&self, last_view_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match last_view_at {
            None => true,
            Some(last) => now - last >= self.0,
        }
    }

    /// The fixed-size time slot `at` falls in. Two views in the same bucket
    /// are always inside one window of each other.
    pub fn bucket(&self, at: DateTime<Utc>) -> i64 {
        at.timestamp().div_euclid(self.0.num_seconds())
    }
}

impl Default for DedupWindow {
    fn default() -> Self {
        Self::from_secs(Self::DEFAULT_SECS)
    }
}

/// One stored view, used for de-duplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRecord {
    pub event_id: EventId,
    pub viewer: ViewerKey,
    pub viewed_at: DateTime<Utc>,
}

impl ViewRecord {
    pub fn new(event_id: EventId, viewer: ViewerKey, viewed_at: DateTime<Utc>) -> Self {
        Self {
            event_id,
            viewer,
            viewed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::OutcomeExt;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_viewer_prefers_user() {
        let user = UserId::new();
        assert_eq!(
            ViewerKey::resolve(Some(user), "10.0.0.1").unwrap(),
            ViewerKey::User(user)
        );
        let anonymous = ViewerKey::resolve(None, " 10.0.0.1 ").unwrap();
        assert_eq!(anonymous.as_key(), "ip:10.0.0.1");
    }

    #[test]
    fn test_viewer_rejects_bad_ip() {
        let outcome = ViewerKey::resolve(Some(UserId::new()), "not-an-ip");
        assert_eq!(outcome.messages(), vec!["Invalid IP address: not-an-ip"]);
    }

    #[test]
    fn test_ipv6_viewer() {
        let viewer = ViewerKey::resolve(None, "2001:db8::1").unwrap();
        assert_eq!(viewer.to_string(), "ip:2001:db8::1");
    }

    #[test]
    fn test_window_boundaries() {
        let window = DedupWindow::default();
        assert!(window.should_count(None, at(0)));
        assert!(!window.should_count(Some(at(0)), at(299)));
        assert!(window.should_count(Some(at(0)), at(300)));
    }

    #[test]
    fn test_bucket_is_stable_inside_a_slot() {
        let window = DedupWindow::from_secs(60);
        let start = DateTime::from_timestamp(600, 0).unwrap();
        assert_eq!(window.bucket(start), 10);
        assert_eq!(window.bucket(start + Duration::seconds(59)), 10);
        assert_eq!(window.bucket(start + Duration::seconds(60)), 11);
    }

    #[test]
    fn test_window_has_a_floor() {
        assert_eq!(DedupWindow::from_secs(0).duration(), Duration::seconds(1));
    }

    #[test]
    fn test_window_has_a_ceiling() {
        let window = DedupWindow::from_secs(i64::MAX);
        assert_eq!(window.duration().num_seconds(), DedupWindow::MAX_SECS);
        assert!(!window.should_count(Some(at(0)), at(86_400 * 365)));
        assert_eq!(window.bucket(at(0)), 0);
    }
}
