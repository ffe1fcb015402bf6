//! Session host: one simulation run plus its controls
//!
//! `Session` is the synchronous owner of a run: brain config, the current
//! snapshot, mode, and the run/stress flags. `SessionHandle::spawn` moves a
//! session into a background heartbeat task. The task is the only place
//! transitions happen; callers send commands over an mpsc channel and read
//! whole snapshots from a `watch` channel.

use crate::controller::Simulator;
use crate::error::{Result, SessionError};
use pmm_core::{BrainConfig, ConfigError, DecodedMemory, EmotionComponent, Mode, Snapshot};
use pmm_limbic::HeartbeatConfig;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Most ticks a single `step` command runs inside the heartbeat task.
pub const MAX_STEP_BATCH: usize = 10_000;

/// Host-side flags alongside the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub mode: Mode,
    pub running: bool,
    pub stress: bool,
    pub config: BrainConfig,
}

// ============================================================================
// Session
// ============================================================================

#[derive(Debug)]
pub struct Session {
    config: BrainConfig,
    snapshot: Arc<Snapshot>,
    mode: Mode,
    running: bool,
    stress: bool,
    simulator: Simulator,
}

impl Session {
    /// Start a paused inference session. Refuses an invalid config.
    pub fn new(config: BrainConfig, simulator: Simulator) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let snapshot = Arc::new(simulator.initialize(&config));
        Ok(Self {
            config,
            snapshot,
            mode: Mode::default(),
            running: false,
            stress: false,
            simulator,
        })
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn config(&self) -> &BrainConfig {
        &self.config
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_stressed(&self) -> bool {
        self.stress
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            mode: self.mode,
            running: self.running,
            stress: self.stress,
            config: self.config.clone(),
        }
    }

    /// Replace the config and restart the run. On rejection nothing changes.
    pub fn apply_config(&mut self, config: BrainConfig) -> std::result::Result<(), ConfigError> {
        if let Err(e) = config.validate() {
            warn!("Rejected brain config: {}", e);
            return Err(e);
        }
        info!(
            "Applying brain config: start {} / max {} slots, threshold {:.2}",
            config.start_mem_slots, config.max_mem_slots, config.expansion_threshold
        );
        self.config = config;
        self.reset();
        Ok(())
    }

    /// Reinitialize from the current config and clear the run/stress flags.
    pub fn reset(&mut self) {
        self.snapshot = Arc::new(self.simulator.initialize(&self.config));
        self.running = false;
        self.stress = false;
    }

    /// Switching mode always pauses.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode != self.mode {
            info!("Switching to {} mode", mode);
        }
        self.mode = mode;
        self.running = false;
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    /// Flip the stress flag and return the new value.
    pub fn toggle_stress(&mut self) -> bool {
        self.stress = !self.stress;
        info!("Stress test {}", if self.stress { "engaged" } else { "released" });
        self.stress
    }

    /// Run one tick in the current mode.
    pub fn step(&mut self) -> Arc<Snapshot> {
        let next = self
            .simulator
            .tick(&self.snapshot, &self.config, self.mode, self.stress);
        self.snapshot = Arc::new(next);
        self.snapshot()
    }

    pub fn flush_slots(&mut self, indices: &[usize]) -> Arc<Snapshot> {
        self.snapshot = Arc::new(self.simulator.flush_slots(&self.snapshot, indices));
        self.snapshot()
    }

    pub fn compress(&mut self) -> Arc<Snapshot> {
        self.snapshot = Arc::new(self.simulator.compress(&self.snapshot));
        self.snapshot()
    }

    pub fn force_expand(&mut self) -> Arc<Snapshot> {
        self.snapshot = Arc::new(self.simulator.force_expand(&self.snapshot, &self.config));
        self.snapshot()
    }

    pub fn send_message(&mut self, text: &str) -> Arc<Snapshot> {
        self.snapshot = Arc::new(self.simulator.send_message(&self.snapshot, text));
        self.snapshot()
    }

    pub fn override_emotion(&mut self, component: EmotionComponent, value: f32) -> Arc<Snapshot> {
        self.snapshot = Arc::new(
            self.simulator
                .override_emotion(&self.snapshot, component, value),
        );
        self.snapshot()
    }

    pub fn decode_slot(&self, index: usize) -> Option<DecodedMemory> {
        self.simulator.decode_slot(&self.snapshot, index)
    }
}

// ============================================================================
// Heartbeat task
// ============================================================================

type Ack = oneshot::Sender<Arc<Snapshot>>;

enum Command {
    Step(usize, Ack),
    SetRunning(bool, Ack),
    ToggleStress(Ack),
    SetMode(Mode, Ack),
    Flush(Vec<usize>, Ack),
    Compress(Ack),
    ForceExpand(Ack),
    Say(String, Ack),
    OverrideEmotion(EmotionComponent, f32, Ack),
    ApplyConfig(
        BrainConfig,
        oneshot::Sender<std::result::Result<Arc<Snapshot>, ConfigError>>,
    ),
    Reset(Ack),
    Decode(usize, oneshot::Sender<Option<DecodedMemory>>),
    Shutdown,
}

/// Client side of a running session.
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<Arc<Snapshot>>,
    status: watch::Receiver<SessionStatus>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Move `session` into a background heartbeat task.
    pub fn spawn(session: Session, heartbeat: HeartbeatConfig) -> Self {
        let (commands, command_rx) = mpsc::channel(64);
        let (snapshot_tx, snapshots) = watch::channel(session.snapshot());
        let (status_tx, status) = watch::channel(session.status());

        let publisher = Publisher {
            snapshots: snapshot_tx,
            status: status_tx,
        };
        let task = tokio::spawn(run_heartbeat(session, heartbeat, command_rx, publisher));

        Self {
            commands,
            snapshots,
            status,
            task,
        }
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshots.borrow().clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    /// Receiver that sees every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshots.clone()
    }

    /// Run `count` ticks in one batch. The count is clamped to
    /// `1..=MAX_STEP_BATCH`, so `0` runs a single tick.
    pub async fn step(&self, count: usize) -> Result<Arc<Snapshot>> {
        self.request(|ack| Command::Step(count, ack)).await
    }

    pub async fn set_running(&self, running: bool) -> Result<Arc<Snapshot>> {
        self.request(|ack| Command::SetRunning(running, ack)).await
    }

    pub async fn toggle_stress(&self) -> Result<Arc<Snapshot>> {
        self.request(Command::ToggleStress).await
    }

    pub async fn set_mode(&self, mode: Mode) -> Result<Arc<Snapshot>> {
        self.request(|ack| Command::SetMode(mode, ack)).await
    }

    pub async fn compress(&self) -> Result<Arc<Snapshot>> {
        self.request(Command::Compress).await
    }

    pub async fn flush_slots(&self, indices: Vec<usize>) -> Result<Arc<Snapshot>> {
        self.request(|ack| Command::Flush(indices, ack)).await
    }

    pub async fn force_expand(&self) -> Result<Arc<Snapshot>> {
        self.request(Command::ForceExpand).await
    }

    pub async fn send_message(&self, text: impl Into<String>) -> Result<Arc<Snapshot>> {
        let text = text.into();
        self.request(|ack| Command::Say(text, ack)).await
    }

    pub async fn override_emotion(
        &self,
        component: EmotionComponent,
        value: f32,
    ) -> Result<Arc<Snapshot>> {
        self.request(|ack| Command::OverrideEmotion(component, value, ack))
            .await
    }

    /// Replace the brain config. A rejected config leaves the session untouched.
    pub async fn apply_config(&self, config: BrainConfig) -> Result<Arc<Snapshot>> {
        let outcome = self
            .request(|ack| Command::ApplyConfig(config, ack))
            .await?;
        Ok(outcome?)
    }

    pub async fn reset(&self) -> Result<Arc<Snapshot>> {
        self.request(Command::Reset).await
    }

    pub async fn decode_slot(&self, index: usize) -> Result<Option<DecodedMemory>> {
        self.request(|ack| Command::Decode(index, ack)).await
    }

    /// Stop the heartbeat and wait for the task to finish.
    pub async fn shutdown(self) -> Result<()> {
        // The task may already be gone; joining below covers both cases.
        let _ = self.commands.send(Command::Shutdown).await;
        self.task.await.map_err(|_| SessionError::Closed)
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }
}

struct Publisher {
    snapshots: watch::Sender<Arc<Snapshot>>,
    status: watch::Sender<SessionStatus>,
}

impl Publisher {
    fn publish(&self, session: &Session) {
        let snapshot = session.snapshot();
        self.snapshots.send_if_modified(|current| {
            if Arc::ptr_eq(current, &snapshot) {
                false
            } else {
                *current = snapshot;
                true
            }
        });
        let status = session.status();
        self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }
}

/// Interval whose first tick lands one full period from now.
fn heartbeat_interval(period: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

async fn run_heartbeat(
    mut session: Session,
    heartbeat: HeartbeatConfig,
    mut commands: mpsc::Receiver<Command>,
    publisher: Publisher,
) {
    let mut interval = heartbeat_interval(heartbeat.interval_for(session.mode()));

    loop {
        let schedule = (session.mode(), session.is_running());

        tokio::select! {
            // Regular heartbeat, only while running
            _ = interval.tick(), if session.is_running() => {
                session.step();
                publisher.publish(&session);
            }

            command = commands.recv() => {
                let Some(command) = command else {
                    debug!("All session handles dropped");
                    break;
                };
                if !dispatch(&mut session, command, &publisher) {
                    break;
                }
            }
        }

        // Restart the period whenever the cadence or the run flag changes
        if (session.mode(), session.is_running()) != schedule {
            interval = heartbeat_interval(heartbeat.interval_for(session.mode()));
        }
    }

    debug!("Session heartbeat stopped at tick {}", session.snapshot().tick);
}

/// Apply one command, publish, then acknowledge. Returns false on shutdown.
fn dispatch(session: &mut Session, command: Command, publisher: &Publisher) -> bool {
    let ack = match command {
        Command::Shutdown => return false,
        Command::Decode(index, reply) => {
            let _ = reply.send(session.decode_slot(index));
            return true;
        }
        Command::ApplyConfig(config, reply) => {
            let outcome = session.apply_config(config).map(|_| session.snapshot());
            publisher.publish(session);
            let _ = reply.send(outcome);
            return true;
        }
        Command::Step(count, ack) => {
            for _ in 0..count.clamp(1, MAX_STEP_BATCH) {
                session.step();
            }
            ack
        }
        Command::SetRunning(running, ack) => {
            session.set_running(running);
            ack
        }
        Command::ToggleStress(ack) => {
            session.toggle_stress();
            ack
        }
        Command::SetMode(mode, ack) => {
            session.set_mode(mode);
            ack
        }
        Command::Flush(indices, ack) => {
            session.flush_slots(&indices);
            ack
        }
        Command::Compress(ack) => {
            session.compress();
            ack
        }
        Command::ForceExpand(ack) => {
            session.force_expand();
            ack
        }
        Command::Say(text, ack) => {
            session.send_message(&text);
            ack
        }
        Command::OverrideEmotion(component, value, ack) => {
            session.override_emotion(component, value);
            ack
        }
        Command::Reset(ack) => {
            session.reset();
            ack
        }
    };

    publisher.publish(session);
    // The caller may have stopped waiting
    let _ = ack.send(session.snapshot());
    true
}
