//! Status reporter reading a ledger that the enforcement controller writes.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reelguard_core::{
    EnforcementController, ScrollEvent, SqliteLedger, StatusReporter, UiSnapshot,
    UiSnapshotClassifier, UsageLedger, UsageStatus,
};

async fn wait_for_count(
    updates: &mut tokio::sync::watch::Receiver<Option<UsageStatus>>,
    count: u32,
) -> UsageStatus {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Some(status) = updates.borrow_and_update().clone() {
                if status.count >= count {
                    return status;
                }
            }
            updates.changed().await.unwrap();
        }
    })
    .await
    .unwrap()
}

fn scroll(controller: &mut EnforcementController<impl UsageLedger>, scrolls: i64) {
    let start = Utc::now();
    for i in 0..scrolls {
        let at = start + chrono::Duration::seconds(i * 2);
        controller
            .on_event(
                &ScrollEvent::scrolled("com.zhiliaoapp.musically", at),
                &UiSnapshot::new(),
            )
            .unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reporter_shares_controller_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = Arc::new(SqliteLedger::open(dir.path().join("reelguard.db")).unwrap());
    ledger.set_limit(10).unwrap();

    let reporter = StatusReporter::spawn(Arc::clone(&ledger), Duration::from_millis(10));
    let mut updates = reporter.subscribe();

    let mut controller =
        EnforcementController::new(UiSnapshotClassifier::default(), Arc::clone(&ledger));
    scroll(&mut controller, 4);

    let status = wait_for_count(&mut updates, 4).await;
    assert_eq!(status.count, 4);
    assert_eq!(status.remaining, 6);
    assert_eq!(ledger.count(&status.day).unwrap(), 4);
    reporter.shutdown().await;
}

#[tokio::test]
async fn test_reporter_on_reader_connection() {
    let dir = tempfile::tempdir().unwrap();
    let writer = SqliteLedger::open(dir.path().join("reelguard.db")).unwrap();
    writer.set_limit(10).unwrap();
    let reader = Arc::new(writer.open_reader().unwrap());

    let reporter = StatusReporter::spawn(reader, Duration::from_millis(20));
    let mut updates = reporter.subscribe();

    let mut controller = EnforcementController::new(UiSnapshotClassifier::default(), writer);
    scroll(&mut controller, 2);

    let status = wait_for_count(&mut updates, 2).await;
    assert_eq!(status.count, 2);
    assert_eq!(status.limit, 10);
    reporter.shutdown().await;
}

#[tokio::test]
async fn test_reporter_observes_controller_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reelguard.db");

    let writer = SqliteLedger::open(&path).unwrap();
    writer.set_limit(10).unwrap();
    let reader = Arc::new(SqliteLedger::open(&path).unwrap());

    let reporter = StatusReporter::spawn(reader, Duration::from_millis(20));
    let mut updates = reporter.subscribe();

    let mut controller = EnforcementController::new(UiSnapshotClassifier::default(), writer);
    scroll(&mut controller, 3);

    let status = wait_for_count(&mut updates, 3).await;

    assert_eq!(status.limit, 10);
    assert_eq!(status.remaining, 7);
    reporter.shutdown().await;
}
