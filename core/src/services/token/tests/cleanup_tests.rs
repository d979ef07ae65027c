//! Unit tests for the scheduled chain pruner

use chrono::Duration;
use mk_shared::config::CleanupConfig;
use std::sync::Arc;

use crate::services::token::ChainPruner;

use super::Harness;

#[tokio::test]
async fn test_run_prune_reports_deleted_records() {
    let h = Harness::new();
    let account = h.account("buyer@example.com").await;
    let first = h.engine.issue(account.id).await.unwrap();
    h.engine.refresh(&first.refresh_token).await.unwrap();
    h.advance(Duration::days(30));
    h.engine.issue(account.id).await.unwrap();

    let pruner = ChainPruner::new(h.store.clone(), h.clock.clone(), CleanupConfig::default());
    let report = pruner.run_prune().await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.records_deleted, 2);
    assert_eq!(h.store.len().await, 1);

    let report = pruner.run_prune().await.unwrap();
    assert_eq!(report.records_deleted, 0);
}

#[tokio::test]
async fn test_disabled_pruner_does_nothing() {
    let h = Harness::new();
    let account = h.account("buyer@example.com").await;
    h.engine.issue(account.id).await.unwrap();
    h.advance(Duration::days(31));

    let config = CleanupConfig {
        enabled: false,
        ..CleanupConfig::default()
    };
    let pruner = Arc::new(ChainPruner::new(h.store.clone(), h.clock.clone(), config));

    let report = pruner.run_prune().await.unwrap();
    assert_eq!(report.records_deleted, 0);
    assert_eq!(h.store.len().await, 1);
    assert!(pruner.start_background_task().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_background_task_prunes_on_interval() {
    let h = Harness::new();
    let account = h.account("buyer@example.com").await;
    h.engine.issue(account.id).await.unwrap();
    h.advance(Duration::days(31));

    let config = CleanupConfig {
        enabled: true,
        interval_seconds: 60,
    };
    let pruner = Arc::new(ChainPruner::new(h.store.clone(), h.clock.clone(), config));
    let handle = pruner.start_background_task().unwrap();

    // First tick fires immediately
    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    assert!(h.store.is_empty().await);

    handle.abort();
}
