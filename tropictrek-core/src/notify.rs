use std::time::{Duration, Instant};

pub const DEFAULT_TTL: Duration = Duration::from_secs(4);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NotificationId(u64);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug)]
pub struct Notification {
    pub id: NotificationId,
    pub level: Level,
    pub message: String,
    pub created: Instant,
    /// `None` for sticky notifications that stay until dismissed
    pub ttl: Option<Duration>,
}

impl Notification {
    pub fn is_active(&self, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.saturating_duration_since(self.created) < ttl,
            None => true,
        }
    }
}

#[derive(Debug, Default)]
pub struct Notifications {
    items: Vec<Notification>,
    next_id: u64,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, level: Level, message: impl Into<String>) -> NotificationId {
        self.push_with_ttl(level, message, Some(DEFAULT_TTL))
    }

    pub fn push_sticky(&mut self, level: Level, message: impl Into<String>) -> NotificationId {
        self.push_with_ttl(level, message, None)
    }

    fn push_with_ttl(
        &mut self,
        level: Level,
        message: impl Into<String>,
        ttl: Option<Duration>,
    ) -> NotificationId {
        let id = NotificationId(self.next_id);
        self.next_id += 1;
        self.items.push(Notification {
            id,
            level,
            message: message.into(),
            created: Instant::now(),
            ttl,
        });
        id
    }

    pub fn dismiss(&mut self, id: NotificationId) {
        self.items.retain(|n| n.id != id);
    }

    /// Drop expired notifications.
    pub fn prune(&mut self, now: Instant) {
        self.items.retain(|n| n.is_active(now));
    }

    /// Most recent notification still active at `now`.
    pub fn current(&self, now: Instant) -> Option<&Notification> {
        self.items.iter().rev().find(|n| n.is_active(now))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
