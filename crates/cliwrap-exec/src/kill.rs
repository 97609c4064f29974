// SPDX-License-Identifier: MIT OR Apache-2.0
//! One-shot kill signal shared between an execution and its waiter task.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::sync::Notify;

/// Cloneable, one-shot request to kill a running process.
///
/// A trigger that happens before anyone waits is not lost: the waiter
/// observes it on its next call to [`triggered`](KillSwitch::triggered).
#[derive(Clone, Debug, Default)]
pub struct KillSwitch {
    fired: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl KillSwitch {
    /// Create an untriggered switch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the kill. Only the first call has an effect.
    pub fn trigger(&self) {
        if !self.fired.swap(true, Ordering::SeqCst) {
            self.notify.notify_one();
        }
    }

    /// Returns `true` once the kill has been requested.
    pub fn is_triggered(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Wait until the kill is requested.
    pub async fn triggered(&self) {
        if self.is_triggered() {
            return;
        }
        self.notify.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn trigger_before_wait_is_remembered() {
        let k = KillSwitch::new();
        k.clone().trigger();
        tokio::time::timeout(Duration::from_secs(1), k.triggered())
            .await
            .unwrap();
        assert!(k.is_triggered());
    }

    #[tokio::test]
    async fn wakes_a_pending_waiter() {
        let k = KillSwitch::new();
        let waiter = {
            let k = k.clone();
            tokio::spawn(async move { k.triggered().await })
        };
        tokio::task::yield_now().await;
        k.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
