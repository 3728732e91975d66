//! # Debounce Scheduler
//!
//! One cancelable pending timer per channel.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Debounce Channels                                 │
//! │                                                                         │
//! │  EntriesSearch  ── 700ms ──► silent fetch of entries                    │
//! │  ExitsSearch    ── 700ms ──► silent fetch of exits                      │
//! │  SharedFilter   ── 300ms ──► fetch of both resources                    │
//! │                                                                         │
//! │  edit "b"    edit "bo"   edit "bolt"                                    │
//! │    │ arm       │ re-arm    │ re-arm                                     │
//! │    ▼           ▼           ▼                                            │
//! │  ──●──────x────●─────x─────●──────────────────────●──► fire (once)      │
//! │             abort       abort            quiet period                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A timer that fires hands its action to a separate task, so aborting the
//! channel afterwards (re-arm or teardown) never aborts a dispatched fetch.
//! Must be used from within a Tokio runtime.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::debug;

use stockflow_core::Resource;

/// A logical source of debounced refetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebounceChannel {
    EntriesSearch,
    ExitsSearch,
    SharedFilter,
}

impl DebounceChannel {
    /// The search channel of `resource`.
    pub fn search(resource: Resource) -> Self {
        match resource {
            Resource::Entries => DebounceChannel::EntriesSearch,
            Resource::Exits => DebounceChannel::ExitsSearch,
        }
    }
}

impl std::fmt::Display for DebounceChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DebounceChannel::EntriesSearch => write!(f, "entries_search"),
            DebounceChannel::ExitsSearch => write!(f, "exits_search"),
            DebounceChannel::SharedFilter => write!(f, "shared_filter"),
        }
    }
}

/// Pending timers keyed by channel.
#[derive(Debug, Default)]
pub struct DebounceScheduler {
    pending: HashMap<DebounceChannel, JoinHandle<()>>,
}

impl DebounceScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms `channel`, replacing any timer still pending on it.
    ///
    /// After `quiet` elapses without another call on the same channel,
    /// `action` is spawned.
    pub fn schedule<F>(&mut self, channel: DebounceChannel, quiet: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel(channel);

        debug!(%channel, quiet_ms = quiet.as_millis() as u64, "Debounce armed");

        let timer = tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            debug!(%channel, "Debounce fired");
            tokio::spawn(action);
        });

        self.pending.insert(channel, timer);
    }

    /// Cancels the pending timer of `channel`, if any.
    ///
    /// Returns true if a timer was still waiting.
    pub fn cancel(&mut self, channel: DebounceChannel) -> bool {
        match self.pending.remove(&channel) {
            Some(timer) if !timer.is_finished() => {
                timer.abort();
                debug!(%channel, "Debounce cancelled");
                true
            }
            _ => false,
        }
    }

    /// Cancels every pending timer.
    pub fn cancel_all(&mut self) {
        for (channel, timer) in self.pending.drain() {
            if !timer.is_finished() {
                timer.abort();
                debug!(%channel, "Debounce cancelled");
            }
        }
    }

    /// Returns true if `channel` has a timer that has not fired yet.
    pub fn is_pending(&self, channel: DebounceChannel) -> bool {
        self.pending
            .get(&channel)
            .is_some_and(|timer| !timer.is_finished())
    }
}

impl Drop for DebounceScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::sleep;

    fn counter_action(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_coalesces() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut scheduler = DebounceScheduler::new();
        let quiet = Duration::from_millis(700);

        for _ in 0..5 {
            scheduler.schedule(DebounceChannel::EntriesSearch, quiet, counter_action(&fired));
            sleep(Duration::from_millis(200)).await;
        }
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(scheduler.is_pending(DebounceChannel::EntriesSearch));

        sleep(Duration::from_millis(600)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_pending(DebounceChannel::EntriesSearch));
    }

    #[tokio::test(start_paused = true)]
    async fn test_channels_are_independent() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut scheduler = DebounceScheduler::new();

        scheduler.schedule(
            DebounceChannel::EntriesSearch,
            Duration::from_millis(700),
            counter_action(&fired),
        );
        scheduler.schedule(
            DebounceChannel::SharedFilter,
            Duration::from_millis(300),
            counter_action(&fired),
        );

        sleep(Duration::from_millis(350)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        sleep(Duration::from_millis(400)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all_prevents_firing() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut scheduler = DebounceScheduler::new();

        scheduler.schedule(
            DebounceChannel::ExitsSearch,
            Duration::from_millis(700),
            counter_action(&fired),
        );
        scheduler.cancel_all();

        sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!scheduler.cancel(DebounceChannel::ExitsSearch));
    }

    #[test]
    fn test_search_channel_per_resource() {
        assert_eq!(
            DebounceChannel::search(Resource::Entries),
            DebounceChannel::EntriesSearch
        );
        assert_eq!(
            DebounceChannel::search(Resource::Exits),
            DebounceChannel::ExitsSearch
        );
    }
}
