//! Transient user notifications ("toasts").
//!
//! Dashboards push here on successful saves and on backend failures; the
//! UI shell drains the queue. Every toast is also logged.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::enums::str_enum;

/// Oldest toasts are dropped past this many undrained entries.
pub const MAX_PENDING_TOASTS: usize = 50;

str_enum!(ToastLevel {
    Success => "success",
    Info => "info",
    Error => "error",
});

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct Toasts {
    queue: Mutex<VecDeque<Toast>>,
}

impl Toasts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, level: ToastLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            ToastLevel::Error => tracing::warn!(toast = %message, "Error toast"),
            _ => tracing::info!(level = level.as_str(), toast = %message, "Toast"),
        }
        let toast = Toast {
            level,
            message,
            at: Utc::now(),
        };
        let mut queue = match self.queue.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if queue.len() >= MAX_PENDING_TOASTS {
            queue.pop_front();
        }
        queue.push_back(toast);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(ToastLevel::Success, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(ToastLevel::Info, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(ToastLevel::Error, message);
    }

    /// Take every pending toast, oldest first.
    pub fn drain(&self) -> Vec<Toast> {
        let mut queue = match self.queue.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        queue.drain(..).collect()
    }

    pub fn latest(&self) -> Option<Toast> {
        let queue = match self.queue.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        queue.back().cloned()
    }

    pub fn len(&self) -> usize {
        match self.queue.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_returns_in_order_and_empties() {
        let toasts = Toasts::new();
        toasts.success("saved");
        toasts.error("backend down");
        let drained = toasts.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].level, ToastLevel::Success);
        assert_eq!(drained[1].message, "backend down");
        assert!(toasts.is_empty());
    }

    #[test]
    fn queue_is_bounded() {
        let toasts = Toasts::new();
        for i in 0..MAX_PENDING_TOASTS + 5 {
            toasts.info(format!("toast {i}"));
        }
        assert_eq!(toasts.len(), MAX_PENDING_TOASTS);
        assert_eq!(toasts.drain()[0].message, "toast 5");
    }

    #[test]
    fn latest_peeks_without_draining() {
        let toasts = Toasts::new();
        assert!(toasts.latest().is_none());
        toasts.info("one");
        toasts.error("two");
        assert_eq!(toasts.latest().unwrap().message, "two");
        assert_eq!(toasts.len(), 2);
    }
}
