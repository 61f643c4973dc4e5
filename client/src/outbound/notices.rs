//! Drainable notice queue for front ends that poll for messages.

use std::collections::VecDeque;
use std::sync::Mutex;

use tracing::{info, warn};

use crate::domain::ports::{Notice, NoticeLevel, Notifier};

/// [`Notifier`] that buffers notices until a front end drains them.
///
/// Every notice is also emitted as a `tracing` event.
#[derive(Debug, Default)]
pub struct NoticeQueue {
    pending: Mutex<VecDeque<Notice>>,
}

impl NoticeQueue {
    /// Take every queued notice in arrival order.
    pub fn drain(&self) -> Vec<Notice> {
        match self.pending.lock() {
            Ok(mut pending) => pending.drain(..).collect(),
            Err(poisoned) => poisoned.into_inner().drain(..).collect(),
        }
    }
}

impl Notifier for NoticeQueue {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => info!(notice = %notice.message, "user notice"),
            NoticeLevel::Warning => warn!(notice = %notice.message, "user notice"),
        }
        match self.pending.lock() {
            Ok(mut pending) => pending.push_back(notice),
            Err(poisoned) => poisoned.into_inner().push_back(notice),
        }
    }
}
