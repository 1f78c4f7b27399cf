//! Write-behind flushing driven through the service, on tokio's paused clock.

use std::time::Duration;

use balance_cache::{AccountRow, SchedulerState, WriteBehindConfig};
use tokio::time::sleep;

use crate::support::Harness;

const SECOND: Duration = Duration::from_secs(1);

#[tokio::test(start_paused = true)]
async fn decrement_is_persisted_once_quiet() {
    let h = Harness::new(&[(7, 10_000)]);

    h.service.decrease(7, 500).await.unwrap();
    assert_eq!(h.store.persisted_balance(7), Some(10_000));

    // Ticks at 60s (too fresh) and 120s (quiet for two intervals).
    sleep(119 * SECOND).await;
    assert!(h.store.updates().is_empty());

    sleep(2 * SECOND).await;
    assert_eq!(h.store.persisted_balance(7), Some(9_500));
    assert_eq!(h.store.updates().len(), 1);

    h.scheduler.stop().await;
}

#[tokio::test(start_paused = true)]
async fn burst_within_window_coalesces_into_one_write() {
    let h = Harness::new(&[(7, 10_000)]);

    h.service.decrease(7, 100).await.unwrap();
    sleep(30 * SECOND).await;
    h.service.decrease(7, 50).await.unwrap();
    assert_eq!(h.balance(7), 9_850);

    // Last touch at 30s: the 120s tick sees only 90s of quiet.
    sleep(95 * SECOND).await;
    assert!(h.store.updates().is_empty());

    // The 180s tick flushes.
    sleep(60 * SECOND).await;
    assert_eq!(h.store.updates(), vec![AccountRow { id: 7, balance: 9_850 }]);

    sleep(10 * 60 * SECOND).await;
    assert_eq!(h.store.updates().len(), 1);

    let stats = h.scheduler.stop().await;
    assert_eq!(stats.notifications, 2);
    assert_eq!(stats.flushes_issued, 1);
}

#[tokio::test(start_paused = true)]
async fn accounts_flush_independently() {
    let h = Harness::new(&[(1, 100), (2, 200)]);

    h.service.decrease(1, 10).await.unwrap();
    sleep(61 * SECOND).await;
    h.service.decrease(2, 20).await.unwrap();

    sleep(60 * SECOND).await;
    assert_eq!(h.store.updates(), vec![AccountRow { id: 1, balance: 90 }]);

    // Account 2 was last touched at 61s, so the 180s tick is too early.
    sleep(60 * SECOND).await;
    assert_eq!(h.store.updates().len(), 1);

    sleep(60 * SECOND).await;
    assert_eq!(
        h.store.updates(),
        vec![
            AccountRow { id: 1, balance: 90 },
            AccountRow { id: 2, balance: 180 },
        ]
    );
    h.scheduler.stop().await;
}

#[tokio::test(start_paused = true)]
async fn rejected_decrement_does_not_dirty_account() {
    let h = Harness::new(&[(7, 10)]);

    h.service.decrease(7, 11).await.unwrap_err();
    sleep(5 * 60 * SECOND).await;

    assert!(h.store.updates().is_empty());
    assert_eq!(h.scheduler.pending().await, Some(0));
    h.scheduler.stop().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_leaves_recent_changes_unpersisted() {
    let h = Harness::new(&[(7, 10_000)]);

    h.service.decrease(7, 1_000).await.unwrap();
    sleep(90 * SECOND).await;

    assert_eq!(h.balance(7), 9_000);
    let stats = h.scheduler.stop().await;
    assert_eq!(stats.flushes_issued, 0);
    assert_eq!(h.store.persisted_balance(7), Some(10_000));
}

#[tokio::test(start_paused = true)]
async fn custom_interval_and_multiplier() {
    let config = WriteBehindConfig::default()
        .with_flush_interval(Duration::from_secs(5))
        .with_staleness_multiplier(3);
    let h = Harness::with_config(&[(3, 30)], config);

    h.service.decrease(3, 3).await.unwrap();

    sleep(14 * SECOND).await;
    assert!(h.store.updates().is_empty());

    sleep(2 * SECOND).await;
    assert_eq!(h.store.persisted_balance(3), Some(27));
    h.scheduler.stop().await;
}

#[tokio::test(start_paused = true)]
async fn touches_after_stop_are_dropped() {
    let h = Harness::new(&[(7, 100)]);
    let notifier = h.scheduler.notifier();

    h.scheduler.signal_stop();
    while h.scheduler.state() != SchedulerState::Stopped {
        tokio::task::yield_now().await;
    }

    // The in-memory decrement still succeeds.
    assert_eq!(h.service.decrease(7, 1).await.unwrap(), 99);
    assert_eq!(notifier.dropped(), 1);
}
