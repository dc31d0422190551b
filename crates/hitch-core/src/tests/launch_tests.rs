//! Launch sequencing: exclusivity, failure injection and guaranteed release

use super::fixtures::{
    FailingSpawner, FakeProcessSource, FakeWindowSource, PanickingSpawner, RecordingSpawner, drain,
    harness, host_process, test_config,
};
use crate::Error;
use crate::config::{Config, Directories};
use crate::launch::ScriptKind;
use hitch_types::{CoreUpdate, Mode, UserIntent};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn dirs(temp: &TempDir) -> Directories {
    Directories::with_base(temp.path())
}

#[tokio::test(start_paused = true)]
async fn test_second_launch_is_rejected_until_first_completes() {
    let temp = TempDir::new().unwrap();
    let spawner = RecordingSpawner::new();
    let (orchestrator, _rx) = harness(
        &test_config(),
        &dirs(&temp),
        FakeProcessSource::with(vec![host_process(101), host_process(202)]),
        FakeWindowSource::with(Vec::new()),
        spawner.clone(),
    );

    let first = orchestrator.launch(101).unwrap();
    let err = orchestrator.launch(202).unwrap_err();
    assert!(matches!(err, Error::AlreadyLaunching { pid: 101 }));
    assert_eq!(orchestrator.snapshot().state.active_launch_target, Some(101));

    first.await.unwrap();
    assert_eq!(spawner.calls().len(), 1);

    let second = orchestrator.launch(202).unwrap().await.unwrap();
    assert_eq!(second.pid, 202);
    assert_eq!(spawner.calls().len(), 2);
    assert_ne!(spawner.calls()[0].script, spawner.calls()[1].script);
}

#[tokio::test(start_paused = true)]
async fn test_selection_during_launch_is_an_error() {
    let temp = TempDir::new().unwrap();
    let (mut orchestrator, _rx) = harness(
        &test_config(),
        &dirs(&temp),
        FakeProcessSource::with(Vec::new()),
        FakeWindowSource::with(Vec::new()),
        RecordingSpawner::new(),
    );

    orchestrator
        .handle_intent(UserIntent::Select { pid: 5 })
        .unwrap();
    let err = orchestrator
        .handle_intent(UserIntent::Select { pid: 6 })
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyLaunching { pid: 5 }));

    // Drag intents are ignored while launching
    orchestrator.handle_intent(UserIntent::DragStarted).unwrap();
    assert_eq!(orchestrator.snapshot().state.mode, Mode::Launching);
}

#[tokio::test(start_paused = true)]
async fn test_script_targets_selected_pid() {
    let temp = TempDir::new().unwrap();
    let (orchestrator, _rx) = harness(
        &test_config(),
        &dirs(&temp),
        FakeProcessSource::with(Vec::new()),
        FakeWindowSource::with(Vec::new()),
        RecordingSpawner::new(),
    );

    let report = orchestrator.launch(4242).unwrap().await.unwrap();
    let script = report.script.unwrap();
    let body = std::fs::read_to_string(&script).unwrap();

    assert_eq!(body.lines().count(), 2);
    assert!(body.trim_end().ends_with("4242"));
    assert!(body.contains("launcher.jar"));
    assert_eq!(
        script.extension().unwrap().to_str().unwrap(),
        ScriptKind::native().extension()
    );
}

#[tokio::test(start_paused = true)]
async fn test_artifact_failure_releases_mode_without_spawning() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();

    let mut config = test_config();
    config.launch.script_dir = Some(blocker);
    let spawner = RecordingSpawner::new();
    let (orchestrator, mut rx) = harness(
        &config,
        &dirs(&temp),
        FakeProcessSource::with(Vec::new()),
        FakeWindowSource::with(Vec::new()),
        spawner.clone(),
    );

    let report = orchestrator.launch(101).unwrap().await.unwrap();

    assert!(report.script.is_none());
    assert!(!report.spawned);
    assert!(spawner.calls().is_empty());
    assert_eq!(orchestrator.snapshot().state.mode, Mode::Idle);

    let updates = drain(&mut rx);
    assert!(updates.contains(&CoreUpdate::LaunchSpawned {
        pid: 101,
        script: None,
        ok: false,
    }));
    assert!(updates.contains(&CoreUpdate::LaunchCompleted { pid: 101 }));
}

#[tokio::test(start_paused = true)]
async fn test_spawn_failure_still_completes_progress() {
    let temp = TempDir::new().unwrap();
    let (orchestrator, mut rx) = harness(
        &test_config(),
        &dirs(&temp),
        FakeProcessSource::with(Vec::new()),
        FakeWindowSource::with(Vec::new()),
        Arc::new(FailingSpawner),
    );

    let report = orchestrator.launch(101).unwrap().await.unwrap();

    assert_eq!(report.spawn_step, Some(1));
    assert!(!report.spawned);
    assert_eq!(orchestrator.snapshot().state.mode, Mode::Idle);

    let updates = drain(&mut rx);
    assert!(updates.contains(&CoreUpdate::LaunchProgress {
        pid: 101,
        progress: 1.0,
    }));
    assert!(updates.contains(&CoreUpdate::LaunchCompleted { pid: 101 }));
}

#[tokio::test(start_paused = true)]
async fn test_panic_during_spawn_releases_mode() {
    let temp = TempDir::new().unwrap();
    let (orchestrator, _rx) = harness(
        &test_config(),
        &dirs(&temp),
        FakeProcessSource::with(Vec::new()),
        FakeWindowSource::with(Vec::new()),
        Arc::new(PanickingSpawner),
    );

    let err = orchestrator.launch(101).unwrap().await.unwrap_err();
    assert!(err.is_panic());
    assert_eq!(orchestrator.snapshot().state.mode, Mode::Idle);
    assert!(orchestrator.launch(101).is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_aborted_launch_releases_mode() {
    let temp = TempDir::new().unwrap();
    let spawner = RecordingSpawner::new();
    let (orchestrator, _rx) = harness(
        &test_config(),
        &dirs(&temp),
        FakeProcessSource::with(Vec::new()),
        FakeWindowSource::with(Vec::new()),
        spawner.clone(),
    );

    let handle = orchestrator.launch(101).unwrap();
    handle.abort();
    assert!(handle.await.unwrap_err().is_cancelled());

    assert_eq!(orchestrator.snapshot().state.mode, Mode::Idle);
    assert!(spawner.calls().is_empty());
}

#[tokio::test]
async fn test_startup_check_runs_relative_to_working_dir() {
    let temp = TempDir::new().unwrap();
    let dirs = dirs(&temp);
    std::fs::create_dir_all(&dirs.launcher).unwrap();
    std::fs::write(dirs.launcher.join("check.sh"), "exit 0\n").unwrap();

    let config = Config {
        startup_check: Some(PathBuf::from("check.sh")),
        ..test_config()
    };
    let spawner = RecordingSpawner::new();
    let (mut orchestrator, _rx) = harness(
        &config,
        &dirs,
        FakeProcessSource::with(Vec::new()),
        FakeWindowSource::with(Vec::new()),
        spawner.clone(),
    );

    orchestrator.start();

    let calls = spawner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].script, dirs.launcher.join("check.sh"));
    assert_eq!(calls[0].kind, ScriptKind::Shell);
    assert_eq!(calls[0].working_dir, dirs.launcher);
}

#[tokio::test]
async fn test_missing_startup_check_is_skipped() {
    let temp = TempDir::new().unwrap();
    let config = Config {
        startup_check: Some(temp.path().join("missing.bat")),
        ..test_config()
    };
    let spawner = RecordingSpawner::new();
    let (mut orchestrator, _rx) = harness(
        &config,
        &dirs(&temp),
        FakeProcessSource::with(Vec::new()),
        FakeWindowSource::with(Vec::new()),
        spawner.clone(),
    );

    orchestrator.start();
    assert!(spawner.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_fine_grained_launch_keeps_configured_duration() {
    let temp = TempDir::new().unwrap();
    let mut config = test_config();
    config.launch.total_steps = 1000;
    config.launch.duration_ms = 3605;
    config.launch.spawn_threshold = 0.01;
    let (orchestrator, _rx) = harness(
        &config,
        &dirs(&temp),
        FakeProcessSource::with(Vec::new()),
        FakeWindowSource::with(Vec::new()),
        RecordingSpawner::new(),
    );

    let started = tokio::time::Instant::now();
    orchestrator.launch(101).unwrap().await.unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(3605), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(3700), "{elapsed:?}");
}
