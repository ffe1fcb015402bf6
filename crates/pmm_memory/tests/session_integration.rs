//! Integration tests for the session host.
//!
//! Drives a spawned session through its handle the way the terminal host
//! does, with a paused tokio clock so heartbeat timing is deterministic.

use pmm_core::{BrainConfig, ConfigError, EmotionComponent, Mode, ScriptedRandom, Sender};
use pmm_limbic::HeartbeatConfig;
use pmm_memory::{Session, SessionError, SessionHandle, Simulator};
use std::time::Duration;

fn small_config() -> BrainConfig {
    BrainConfig {
        start_mem_slots: 4,
        max_mem_slots: 16,
        expansion_threshold: 0.5,
        ..Default::default()
    }
}

fn spawn_seeded(seed: u64) -> SessionHandle {
    let session = Session::new(small_config(), Simulator::seeded(seed)).unwrap();
    SessionHandle::spawn(session, HeartbeatConfig::testing())
}

/// Full run: stress floods memory until the ceiling, then manual flush and reset.
#[tokio::test(start_paused = true)]
async fn test_stress_run_hits_ceiling() {
    let handle = spawn_seeded(42);

    handle.toggle_stress().await.unwrap();
    assert!(handle.status().stress);
    handle.set_running(true).await.unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;
    handle.set_running(false).await.unwrap();

    let snap = handle.snapshot();
    assert!(snap.tick > 10);
    assert_eq!(snap.memory_capacity, 16, "stress should reach the ceiling");
    assert_eq!(snap.memory_slots.len(), 16);
    assert!(snap.check_invariants());

    let flushed = handle.flush_slots((0..16).collect()).await.unwrap();
    assert_eq!(flushed.used_slots(), 0);
    assert_eq!(
        flushed.logs.latest().map(String::as_str),
        Some("[MANUAL] Bulk flushed 16 memory slots")
    );

    let fresh = handle.reset().await.unwrap();
    assert_eq!(fresh.tick, 0);
    assert_eq!(fresh.memory_capacity, 4);
    assert!(!handle.status().stress);

    handle.shutdown().await.unwrap();
}

/// Training mode runs on its own cadence and reports losses.
#[tokio::test(start_paused = true)]
async fn test_training_cadence() {
    let handle = spawn_seeded(7);
    handle.set_mode(Mode::Training).await.unwrap();
    handle.set_running(true).await.unwrap();

    // Training heartbeat is twice as fast as inference in the testing config
    tokio::time::sleep(Duration::from_millis(52)).await;
    let snap = handle.set_running(false).await.unwrap();
    assert!(snap.tick >= 8, "got {} ticks", snap.tick);
    let metrics = snap.training_metrics.expect("training metrics");
    assert_eq!(metrics.step, snap.tick);

    handle.shutdown().await.unwrap();
}

/// Manual controls through the handle: forced expansion up to the ceiling,
/// chat, and a rejected config.
#[tokio::test]
async fn test_manual_controls_through_handle() {
    let session = Session::new(
        small_config(),
        Simulator::new(Box::new(ScriptedRandom::constant(0.0))),
    )
    .unwrap();
    let handle = SessionHandle::spawn(session, HeartbeatConfig::testing());

    for _ in 0..2 {
        handle.force_expand().await.unwrap();
    }
    let at_ceiling = handle.snapshot();
    assert_eq!(at_ceiling.memory_capacity, 16);
    let again = handle.force_expand().await.unwrap();
    assert_eq!(again.memory_capacity, 16);
    assert_eq!(again.logs.len(), at_ceiling.logs.len());

    // Negative valence alone is not enough for a darker tone
    handle
        .override_emotion(EmotionComponent::Valence, -0.9)
        .await
        .unwrap();
    let snap = handle.send_message("hello there").await.unwrap();
    let reply = snap.chat_history.last().unwrap();
    assert_eq!(reply.sender, Sender::Ai);
    assert_eq!(reply.text, "Acknowledged. Link established.");

    let bad = BrainConfig {
        start_mem_slots: 10,
        max_mem_slots: 5,
        ..Default::default()
    };
    let before = handle.snapshot();
    match handle.apply_config(bad).await {
        Err(SessionError::Config(ConfigError::StartExceedsMax { start, max })) => {
            assert_eq!((start, max), (10, 5));
        }
        other => panic!("expected rejection, got {:?}", other.map(|s| s.tick)),
    }
    assert_eq!(handle.snapshot().tick, before.tick);
    assert_eq!(handle.snapshot().memory_capacity, before.memory_capacity);

    handle.shutdown().await.unwrap();
}

/// Dropping every handle stops the heartbeat without an explicit shutdown.
#[tokio::test]
async fn test_drop_handle_stops_task() {
    let handle = spawn_seeded(1);
    let mut rx = handle.subscribe();
    drop(handle);
    // The sender side goes away with the task
    assert!(rx.changed().await.is_err());
}
