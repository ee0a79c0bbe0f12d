use std::time::{Duration, Instant};

/// How long a notification stays visible.
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    pub expires_at: Instant,
}

/// Transient user-facing messages.
#[derive(Debug, Default)]
pub struct Notifications {
    items: Vec<Notification>,
}

impl Notifications {
    pub fn push(&mut self, kind: NotificationKind, message: impl Into<String>, now: Instant) {
        self.items.push(Notification {
            message: message.into(),
            kind,
            expires_at: now + NOTIFICATION_TTL,
        });
    }

    /// Drop everything that has timed out by `now`.
    pub fn expire(&mut self, now: Instant) {
        self.items.retain(|n| n.expires_at > now);
    }

    pub fn active(&self) -> &[Notification] {
        &self.items
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.items.last()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry() {
        let now = Instant::now();
        let mut notes = Notifications::default();
        notes.push(NotificationKind::Error, "Node label cannot be empty", now);
        notes.push(
            NotificationKind::Success,
            "Node created successfully",
            now + Duration::from_secs(2),
        );

        notes.expire(now + Duration::from_millis(2999));
        assert_eq!(notes.active().len(), 2);
        notes.expire(now + NOTIFICATION_TTL);
        assert_eq!(notes.active().len(), 1);
        assert_eq!(notes.latest().unwrap().kind, NotificationKind::Success);
        notes.expire(now + Duration::from_secs(10));
        assert!(notes.active().is_empty());
    }
}
