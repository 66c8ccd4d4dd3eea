//! Toast-style notification feed shared by the fleet view and the app shell.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How long an app-level notification stays visible.
pub const NOTIFICATION_TTL_SECS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub kind: NotificationKind,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>, kind: NotificationKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            message: message.into(),
            timestamp: Utc::now(),
            kind,
        }
    }
}

/// Newest-first list of notifications, optionally capped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationFeed {
    items: Vec<Notification>,
    limit: Option<usize>,
}

impl NotificationFeed {
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// A feed that keeps at most `limit` entries, dropping the oldest.
    pub fn capped(limit: usize) -> Self {
        Self {
            items: Vec::new(),
            limit: Some(limit),
        }
    }

    pub fn push(&mut self, notification: Notification) {
        self.items.insert(0, notification);
        if let Some(limit) = self.limit {
            self.items.truncate(limit);
        }
    }

    pub fn notify(&mut self, title: impl Into<String>, message: impl Into<String>, kind: NotificationKind) {
        self.push(Notification::new(title, message, kind));
    }

    /// Remove a notification by id. Returns whether anything was removed.
    pub fn dismiss(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    /// Drop notifications older than the TTL as of `now`.
    pub fn expire(&mut self, now: DateTime<Utc>) {
        let ttl = Duration::seconds(NOTIFICATION_TTL_SECS);
        self.items.retain(|n| now - n.timestamp < ttl);
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.items.first()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
