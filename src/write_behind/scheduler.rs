//! Background flush loop.
//!
//! `WriteBehindScheduler::start` spawns one tokio task that owns the dirty
//! set. Touches arrive over a bounded channel; producers use `try_send` and
//! never wait on the loop. The loop serialises notifications, timer ticks,
//! queries and the stop signal, so the dirty set is never shared.
//!
//! Ticks take priority over notifications so a queue that never empties
//! cannot starve flushing. A tick first drains the touches already queued,
//! then flushes.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::dirty_set::DirtySet;
use super::{ConfigError, WriteBehindConfig};
use crate::account::AccountId;
use crate::cache::AccountCache;
use crate::store::AccountStore;

/// Statistics from the flush loop.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FlushStats {
    /// Touch notifications received by the loop.
    pub notifications: u64,
    /// Touch notifications rejected because the queue was full or closed.
    pub notifications_dropped: u64,
    /// Timer ticks handled.
    pub ticks: u64,
    /// Store updates issued.
    pub flushes_issued: u64,
    /// Issued store updates that failed.
    pub flushes_failed: u64,
}

/// Lifecycle of the scheduler. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Running,
    Stopping,
    Stopped,
}

impl SchedulerState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => SchedulerState::Running,
            1 => SchedulerState::Stopping,
            _ => SchedulerState::Stopped,
        }
    }
}

fn load_state(state: &AtomicU8) -> SchedulerState {
    SchedulerState::from_u8(state.load(Ordering::SeqCst))
}

/// Cheap, cloneable sender of "account touched" notifications.
#[derive(Clone)]
pub struct TouchNotifier {
    tx: mpsc::Sender<AccountId>,
    dropped: Arc<AtomicU64>,
    state: Arc<AtomicU8>,
}

impl TouchNotifier {
    /// Record that `id` was mutated. Never blocks.
    ///
    /// Returns `false` if the notification was dropped because the queue is
    /// full or the scheduler has stopped.
    pub fn notify(&self, id: AccountId) -> bool {
        match self.tx.try_send(id) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(account_id = id, "write-behind queue full, touch dropped");
                false
            }
            Err(TrySendError::Closed(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                if load_state(&self.state) == SchedulerState::Running {
                    warn!(account_id = id, "write-behind loop exited unexpectedly, touch dropped");
                } else {
                    debug!(account_id = id, "write-behind scheduler stopped, touch dropped");
                }
                false
            }
        }
    }

    /// Notifications dropped so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Owner of the background flush task.
///
/// ## Example
///
/// ```ignore
/// use std::sync::Arc;
/// use balance_cache::{AccountCache, InMemoryAccountStore, WriteBehindConfig, WriteBehindScheduler};
///
/// let cache = Arc::new(AccountCache::new(InMemoryAccountStore::with_rows([(1, 100)])));
/// let scheduler = WriteBehindScheduler::start(cache.clone(), WriteBehindConfig::default())?;
///
/// cache.get(1).await?.unwrap().decrease(10)?;
/// scheduler.notify(1);
///
/// // Pending changes are not flushed on stop.
/// let stats = scheduler.stop().await;
/// ```
pub struct WriteBehindScheduler {
    notifier: TouchNotifier,
    query_tx: mpsc::Sender<oneshot::Sender<usize>>,
    stop_tx: watch::Sender<bool>,
    state: Arc<AtomicU8>,
    handle: Option<JoinHandle<FlushStats>>,
}

impl WriteBehindScheduler {
    /// Spawn the flush loop on the current tokio runtime.
    ///
    /// The first tick fires one full interval after start.
    pub fn start<S>(cache: Arc<AccountCache<S>>, config: WriteBehindConfig) -> Result<Self, ConfigError>
    where
        S: AccountStore + 'static,
    {
        config.validate()?;
        let first_tick = Instant::now()
            .checked_add(config.flush_interval)
            .ok_or(ConfigError::IntervalTooLarge)?;

        let (tx, notify_rx) = mpsc::channel(config.queue_capacity);
        let (query_tx, query_rx) = mpsc::channel(8);
        let (stop_tx, stop_rx) = watch::channel(false);
        let state = Arc::new(AtomicU8::new(SchedulerState::Running as u8));

        let handle = tokio::spawn(run(
            cache,
            config,
            first_tick,
            notify_rx,
            query_rx,
            stop_rx,
            Arc::clone(&state),
        ));

        Ok(WriteBehindScheduler {
            notifier: TouchNotifier {
                tx,
                dropped: Arc::new(AtomicU64::new(0)),
                state: Arc::clone(&state),
            },
            query_tx,
            stop_tx,
            state,
            handle: Some(handle),
        })
    }

    /// A handle request handlers can use to report touches.
    pub fn notifier(&self) -> TouchNotifier {
        self.notifier.clone()
    }

    pub fn notify(&self, id: AccountId) -> bool {
        self.notifier.notify(id)
    }

    pub fn state(&self) -> SchedulerState {
        load_state(&self.state)
    }

    /// Number of ids waiting to be flushed, as seen by the loop once it has
    /// drained already queued notifications. `None` once the loop has exited.
    pub async fn pending(&self) -> Option<usize> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.query_tx.send(reply_tx).await.ok()?;
        reply_rx.await.ok()
    }

    /// Ask the loop to stop and return immediately.
    ///
    /// An update already being written is not awaited and the dirty set is
    /// not flushed.
    pub fn signal_stop(&self) {
        let _ = self.state.compare_exchange(
            SchedulerState::Running as u8,
            SchedulerState::Stopping as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        let _ = self.stop_tx.send(true);
    }

    /// Signal the loop to stop, wait for it to exit and return its stats.
    pub async fn stop(mut self) -> FlushStats {
        self.signal_stop();
        let mut stats = match self.handle.take() {
            Some(handle) => match handle.await {
                Ok(stats) => stats,
                Err(err) => {
                    error!(error = %err, "write-behind loop failed");
                    self.state.store(SchedulerState::Stopped as u8, Ordering::SeqCst);
                    FlushStats::default()
                }
            },
            None => FlushStats::default(),
        };
        stats.notifications_dropped = self.notifier.dropped();
        stats
    }
}

impl Drop for WriteBehindScheduler {
    fn drop(&mut self) {
        self.signal_stop();
    }
}

async fn run<S>(
    cache: Arc<AccountCache<S>>,
    config: WriteBehindConfig,
    first_tick: Instant,
    mut notify_rx: mpsc::Receiver<AccountId>,
    mut query_rx: mpsc::Receiver<oneshot::Sender<usize>>,
    mut stop_rx: watch::Receiver<bool>,
    state: Arc<AtomicU8>,
) -> FlushStats
where
    S: AccountStore + 'static,
{
    let staleness = config.staleness();
    let mut ticker = time::interval_at(first_tick, config.flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut dirty = DirtySet::new();
    let mut stats = FlushStats::default();

    info!(
        interval_secs = config.flush_interval.as_secs_f64(),
        staleness_secs = staleness.as_secs_f64(),
        "write-behind scheduler started"
    );

    loop {
        tokio::select! {
            biased;

            _ = stop_rx.changed() => break,

            _ = ticker.tick() => {
                stats.ticks += 1;
                drain_queued(&mut notify_rx, &mut dirty, &mut stats, config.queue_capacity);
                flush_due(&cache, &mut dirty, staleness, &mut stats).await;
            }

            Some(id) = notify_rx.recv() => {
                stats.notifications += 1;
                dirty.touch(id, Instant::now());
            }

            Some(reply) = query_rx.recv() => {
                let _ = reply.send(dirty.len());
            }
        }
    }

    state.store(SchedulerState::Stopped as u8, Ordering::SeqCst);
    info!(pending = dirty.len(), "write-behind scheduler stopped");
    stats
}

/// Record at most `limit` touches that are already queued, without waiting.
fn drain_queued(
    notify_rx: &mut mpsc::Receiver<AccountId>,
    dirty: &mut DirtySet,
    stats: &mut FlushStats,
    limit: usize,
) {
    let now = Instant::now();
    for _ in 0..limit {
        match notify_rx.try_recv() {
            Ok(id) => {
                stats.notifications += 1;
                dirty.touch(id, now);
            }
            Err(_) => break,
        }
    }
}

async fn flush_due<S>(
    cache: &AccountCache<S>,
    dirty: &mut DirtySet,
    staleness: std::time::Duration,
    stats: &mut FlushStats,
) where
    S: AccountStore,
{
    for id in dirty.take_due(Instant::now(), staleness) {
        let account = match cache.loaded(id) {
            Ok(Some(account)) => account,
            Ok(None) => {
                warn!(account_id = id, "dirty account is not loaded, skipping flush");
                continue;
            }
            Err(err) => {
                warn!(account_id = id, error = %err, "cache lookup failed, skipping flush");
                continue;
            }
        };

        let balance = account.balance();
        stats.flushes_issued += 1;
        debug!(account_id = id, balance, "flushing account");

        if let Err(err) = cache.store().update_balance(id, balance).await {
            stats.flushes_failed += 1;
            warn!(account_id = id, balance, error = %err, "flush failed, update dropped");
        }
    }
}
