//! Postgres store tests. Skipped unless `TEST_DATABASE_URL` points at a
//! reachable database; they truncate and reseed the `users` table.

use std::sync::Arc;
use std::time::Duration;

use balance_cache::{
    AccountCache, AccountRow, AccountStore, BalanceService, PgAccountStore, WriteBehindConfig,
    WriteBehindScheduler,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

async fn maybe_pool() -> Option<PgPool> {
    let database_url = std::env::var("TEST_DATABASE_URL").ok()?;
    PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .ok()
}

// One test, since every step reseeds the shared table.
#[tokio::test]
async fn postgres_store_and_write_behind() {
    let Some(pool) = maybe_pool().await else {
        eprintln!(
            "Skipping postgres_store_and_write_behind: TEST_DATABASE_URL is not set or unreachable."
        );
        return;
    };
    let store = PgAccountStore::new(pool);

    // Point operations.
    let id = store.bootstrap(10_000).await.unwrap();
    assert_eq!(
        store.read_by_id(id).await.unwrap(),
        Some(AccountRow { id, balance: 10_000 })
    );
    assert_eq!(store.read_by_id(id + 1_000).await.unwrap(), None);
    store.update_balance(id, 9_000).await.unwrap();
    assert_eq!(store.read_by_id(id).await.unwrap().unwrap().balance, 9_000);

    // Write-behind round trip with a short interval.
    let id = store.bootstrap(10_000).await.unwrap();
    let cache = Arc::new(AccountCache::new(store.clone()));
    let config = WriteBehindConfig::default()
        .with_flush_interval(Duration::from_millis(100))
        .with_staleness_multiplier(2);
    let scheduler = WriteBehindScheduler::start(cache.clone(), config).unwrap();
    let service = BalanceService::new(cache, scheduler.notifier());

    service.decrease(id, 100).await.unwrap();
    service.decrease(id, 50).await.unwrap();
    assert_eq!(store.read_by_id(id).await.unwrap().unwrap().balance, 10_000);

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(store.read_by_id(id).await.unwrap().unwrap().balance, 9_850);

    scheduler.stop().await;
}
