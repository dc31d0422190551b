//! Scan loop guards, failure handling and scheduling

use super::fixtures::{
    FakeProcessSource, FakeWindowSource, RecordingSpawner, candidate_changes, drain, harness,
    host_process, test_config, titled_window,
};
use crate::config::{Config, Directories, ScanConfig};
use crate::discovery::TargetPredicate;
use crate::identity::IdentityResolver;
use crate::scan::{CycleOutcome, ScanLoop, Scanner};
use crate::state::StateStore;
use hitch_types::{CacheOrigin, Candidate, CoreUpdate, Mode, UserIntent};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

async fn next_candidates(rx: &mut UnboundedReceiver<CoreUpdate>) -> Vec<u32> {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await {
                Some(CoreUpdate::CandidatesChanged { candidates }) => {
                    return candidates.pids().into_iter().collect();
                }
                Some(_) => {}
                None => panic!("update channel closed"),
            }
        }
    })
    .await
    .expect("no candidate update in time")
}

fn slow_loop_config() -> Config {
    let mut config = test_config();
    config.scan.idle_interval_ms = 60_000;
    config.scan.active_interval_ms = 60_000;
    config
}

#[tokio::test]
async fn test_cycle_skipped_while_dragging() {
    let temp = TempDir::new().unwrap();
    let dirs = Directories::with_base(temp.path());
    let processes = FakeProcessSource::with(vec![host_process(101)]);
    let (mut orchestrator, _rx) = harness(
        &test_config(),
        &dirs,
        processes.clone(),
        FakeWindowSource::with(Vec::new()),
        RecordingSpawner::new(),
    );

    orchestrator.handle_intent(UserIntent::DragStarted).unwrap();
    assert_eq!(orchestrator.scan_once().await, CycleOutcome::Skipped);
    assert_eq!(processes.calls(), 0);
    assert_eq!(orchestrator.snapshot().state.mode, Mode::Dragging);
}

#[tokio::test(start_paused = true)]
async fn test_cycle_skipped_while_launching() {
    let temp = TempDir::new().unwrap();
    let dirs = Directories::with_base(temp.path());
    let processes = FakeProcessSource::with(vec![host_process(101)]);
    let (orchestrator, _rx) = harness(
        &test_config(),
        &dirs,
        processes.clone(),
        FakeWindowSource::with(Vec::new()),
        RecordingSpawner::new(),
    );

    let launch = orchestrator.launch(101).unwrap();
    assert_eq!(orchestrator.scan_once().await, CycleOutcome::Skipped);
    assert_eq!(processes.calls(), 0);

    launch.await.unwrap();
    assert_eq!(orchestrator.scan_once().await, CycleOutcome::Published);
}

#[tokio::test]
async fn test_failed_cycle_does_not_stick() {
    let temp = TempDir::new().unwrap();
    let dirs = Directories::with_base(temp.path());
    let processes = FakeProcessSource::with(vec![host_process(101)]);
    let (orchestrator, _rx) = harness(
        &test_config(),
        &dirs,
        processes.clone(),
        FakeWindowSource::with(Vec::new()),
        RecordingSpawner::new(),
    );

    processes.set_failing(true);
    assert_eq!(orchestrator.scan_once().await, CycleOutcome::Failed);
    assert_eq!(orchestrator.snapshot().state.mode, Mode::Idle);
    assert!(orchestrator.snapshot().candidates.is_empty());

    processes.set_failing(false);
    assert_eq!(orchestrator.scan_once().await, CycleOutcome::Published);
}

#[tokio::test]
async fn test_loop_survives_failures() {
    let temp = TempDir::new().unwrap();
    let dirs = Directories::with_base(temp.path());
    let mut config = test_config();
    config.scan.idle_interval_ms = 10;
    config.scan.active_interval_ms = 10;
    let processes = FakeProcessSource::with(vec![host_process(101)]);
    processes.set_failing(true);
    let (mut orchestrator, mut rx) = harness(
        &config,
        &dirs,
        processes.clone(),
        FakeWindowSource::with(Vec::new()),
        RecordingSpawner::new(),
    );

    orchestrator.start();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(processes.calls() >= 2);

    processes.set_failing(false);
    assert_eq!(next_candidates(&mut rx).await, vec![101]);
}

#[tokio::test]
async fn test_drag_end_triggers_immediate_rescan() {
    let temp = TempDir::new().unwrap();
    let dirs = Directories::with_base(temp.path());
    let processes = FakeProcessSource::with(vec![host_process(101)]);
    let windows = FakeWindowSource::with(vec![titled_window(101, "Alpha")]);
    let (mut orchestrator, mut rx) = harness(
        &slow_loop_config(),
        &dirs,
        processes.clone(),
        windows,
        RecordingSpawner::new(),
    );

    orchestrator.start();
    assert_eq!(next_candidates(&mut rx).await, vec![101]);

    orchestrator.handle_intent(UserIntent::DragStarted).unwrap();
    processes.set(vec![host_process(101), host_process(202)]);
    orchestrator.handle_intent(UserIntent::DragEnded).unwrap();

    // The loop is sleeping for a minute; only the rescan request can wake it.
    assert_eq!(next_candidates(&mut rx).await, vec![101, 202]);
}

#[tokio::test]
async fn test_close_stops_scanning() {
    let temp = TempDir::new().unwrap();
    let dirs = Directories::with_base(temp.path());
    let mut config = test_config();
    config.scan.idle_interval_ms = 5;
    config.scan.active_interval_ms = 5;
    let processes = FakeProcessSource::with(Vec::new());
    let (mut orchestrator, mut rx) = harness(
        &config,
        &dirs,
        processes.clone(),
        FakeWindowSource::with(Vec::new()),
        RecordingSpawner::new(),
    );

    orchestrator.start();
    tokio::time::sleep(Duration::from_millis(30)).await;
    orchestrator.handle_intent(UserIntent::Close).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let calls = processes.calls();
    processes.set(vec![host_process(101)]);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(processes.calls(), calls);
    assert_eq!(candidate_changes(&drain(&mut rx)), 0);
}

#[test]
fn test_interval_follows_published_set() {
    let config = ScanConfig::default();
    let (store, _rx) = StateStore::new();
    let store = Arc::new(store);
    let scanner = Scanner::new(
        FakeProcessSource::with(Vec::new()),
        TargetPredicate::from_config(&Config::default().target).unwrap(),
        IdentityResolver::new(FakeWindowSource::with(Vec::new()), &config),
    );
    let scan_loop = ScanLoop::new(Arc::new(scanner), Arc::clone(&store), &config);

    assert_eq!(scan_loop.next_interval(), Duration::from_millis(1000));

    let candidates = [Candidate::new(1, "x", CacheOrigin::Fresh)].into_iter().collect();
    assert!(store.publish(candidates));
    assert_eq!(scan_loop.next_interval(), Duration::from_millis(2500));
}
