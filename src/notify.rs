use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;

// a page that is never rendered should not grow the queue forever
const MAX_PENDING: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
    Info,
}

/// One-shot toast shown by the next rendered page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub level: Level,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct Notifier {
    pending: Arc<Mutex<VecDeque<Notification>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&self, message: impl Into<String>) -> Notification {
        self.push(Level::Success, message.into())
    }

    pub fn info(&self, message: impl Into<String>) -> Notification {
        self.push(Level::Info, message.into())
    }

    pub fn error(&self, message: impl Into<String>) -> Notification {
        self.push(Level::Error, message.into())
    }

    pub fn api_error(&self, err: &ApiError) -> Notification {
        warn!("{}", err);
        self.push(Level::Error, err.user_message())
    }

    /// Takes every pending notification; each is delivered once.
    pub fn drain(&self) -> Vec<Notification> {
        self.lock().drain(..).collect()
    }

    #[cfg(test)]
    pub fn pending(&self) -> Vec<Notification> {
        self.lock().iter().cloned().collect()
    }

    fn push(&self, level: Level, message: String) -> Notification {
        info!(?level, "{}", message);
        let notification = Notification {
            id: Uuid::new_v4(),
            level,
            message,
            created_at: Utc::now(),
        };
        let mut queue = self.lock();
        if queue.len() >= MAX_PENDING {
            queue.pop_front();
        }
        queue.push_back(notification.clone());
        notification
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Notification>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
