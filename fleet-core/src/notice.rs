//! Transient, self-dismissing notifications: one active notice per surface.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

impl NoticeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeLevel::Success => "success",
            NoticeLevel::Error => "error",
            NoticeLevel::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub message: String,
}

struct BoardInner {
    surface: &'static str,
    ttl: Duration,
    current: watch::Sender<Option<Notice>>,
    next_id: AtomicU64,
}

impl BoardInner {
    fn dismiss(&self, id: u64) -> bool {
        self.current.send_if_modified(|slot| match slot {
            Some(notice) if notice.id == id => {
                *slot = None;
                true
            }
            _ => false,
        })
    }
}

/// Notification slot for one action surface (sign-in form, feedback form,
/// dashboard). Posting replaces whatever is showing.
#[derive(Clone)]
pub struct NoticeBoard {
    inner: Arc<BoardInner>,
}

impl NoticeBoard {
    pub fn new(surface: &'static str, ttl: Duration) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            inner: Arc::new(BoardInner {
                surface,
                ttl,
                current,
                next_id: AtomicU64::new(0),
            }),
        }
    }

    pub fn surface(&self) -> &'static str {
        self.inner.surface
    }

    /// Shows `message`, replacing any current notice, and schedules its
    /// dismissal after the board's TTL. Must be called inside a Tokio runtime.
    pub fn post(&self, level: NoticeLevel, message: impl Into<String>) -> Notice {
        let mut notice = Notice {
            id: 0,
            level,
            message: message.into(),
        };
        self.inner.current.send_modify(|slot| {
            notice.id = self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            *slot = Some(notice.clone());
        });

        tracing::debug!(
            surface = self.inner.surface,
            id = notice.id,
            level = notice.level.as_str(),
            "Notice posted"
        );

        let inner = Arc::downgrade(&self.inner);
        let (id, ttl) = (notice.id, self.inner.ttl);
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(inner) = inner.upgrade() {
                inner.dismiss(id);
            }
        });

        notice
    }

    pub fn success(&self, message: impl Into<String>) -> Notice {
        self.post(NoticeLevel::Success, message)
    }

    pub fn error(&self, message: impl Into<String>) -> Notice {
        self.post(NoticeLevel::Error, message)
    }

    /// Clears the notice with `id` if it is still the one showing.
    pub fn dismiss(&self, id: u64) -> bool {
        self.inner.dismiss(id)
    }

    pub fn current(&self) -> Option<Notice> {
        self.inner.current.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<Option<Notice>> {
        self.inner.current.subscribe()
    }
}
