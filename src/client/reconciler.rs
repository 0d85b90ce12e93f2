//! Client reconciliation loop
//!
//! Drives a `MirrorSet` against a `CheckpointSource`: a once-per-second
//! local tick, a periodic full refresh, and action round trips whose
//! returned checkpoints always win over local guesses. The loop never
//! blocks on the network inside a tick; the only suspension points are the
//! refresh and the action round trips, and dropping the loop future
//! detaches cleanly with nothing left pending.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::time::{interval, interval_at, Instant};
use tracing::{debug, info, warn};

use crate::state::{Checkpoint, TimerAction};

use super::mirror::{MirrorSet, TaskMirror};
use super::source::{CheckpointSource, SourceError};

/// Cadence of the local tick and the full refresh.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    pub tick_interval: Duration,
    pub refresh_interval: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            refresh_interval: Duration::from_secs(30),
        }
    }
}

/// One viewer's reconciler: the mirrors it displays and the transport it
/// reconciles them through.
pub struct Reconciler<S: CheckpointSource> {
    source: S,
    mirrors: Arc<Mutex<MirrorSet>>,
    config: ReconcilerConfig,
}

impl<S: CheckpointSource> Reconciler<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, ReconcilerConfig::default())
    }

    pub fn with_config(source: S, config: ReconcilerConfig) -> Self {
        Self {
            source,
            mirrors: Arc::new(Mutex::new(MirrorSet::new())),
            config,
        }
    }

    /// Current mirrored view of one task, if it is being displayed.
    pub fn mirror(&self, task_id: &str) -> Option<TaskMirror> {
        self.mirrors
            .lock()
            .ok()
            .and_then(|mirrors| mirrors.get(task_id).cloned())
    }

    /// Re-seed every mirror from the engine. On failure the mirrors keep
    /// their last known values and ticking continues; repeated failures
    /// flag the counters as possibly stale.
    pub async fn refresh(&self) {
        match self.source.fetch().await {
            Ok(checkpoints) => {
                let now = Utc::now();
                match self.mirrors.lock() {
                    Ok(mut mirrors) => {
                        mirrors.seed(&checkpoints, now);
                        debug!("Refreshed {} task mirrors", mirrors.len());
                    }
                    Err(_) => warn!("Mirror lock poisoned, dropping refreshed checkpoints"),
                }
            }
            Err(e) => {
                warn!("Checkpoint refresh failed: {}", e);
                match self.mirrors.lock() {
                    Ok(mut mirrors) => mirrors.refresh_failed(),
                    Err(_) => warn!("Mirror lock poisoned, failure count not recorded"),
                }
            }
        }
    }

    /// Send one command to the engine. On success the returned checkpoint
    /// is applied to the mirror; on failure the mirror is left untouched
    /// and the caller is told the action did not take effect.
    pub async fn send(&self, task_id: &str, action: TimerAction) -> Result<Checkpoint, SourceError> {
        let checkpoint = self.source.command(task_id, action).await?;
        match self.mirrors.lock() {
            Ok(mut mirrors) => mirrors.apply(task_id, &checkpoint, Utc::now()),
            Err(_) => warn!("Mirror lock poisoned, checkpoint for task {} not mirrored", task_id),
        }
        Ok(checkpoint)
    }

    pub async fn start(&self, task_id: &str) -> Result<Checkpoint, SourceError> {
        self.send(task_id, TimerAction::Start).await
    }

    pub async fn pause(&self, task_id: &str) -> Result<Checkpoint, SourceError> {
        self.send(task_id, TimerAction::Pause).await
    }

    pub async fn resume(&self, task_id: &str) -> Result<Checkpoint, SourceError> {
        self.send(task_id, TimerAction::Resume).await
    }

    pub async fn stop(&self, task_id: &str) -> Result<Checkpoint, SourceError> {
        self.send(task_id, TimerAction::Stop).await
    }

    /// Drive the tick and refresh loops until the future is dropped. The
    /// first refresh fires immediately and doubles as the initial seed.
    pub async fn run(&self) {
        info!(
            "Starting reconciler: tick every {:?}, refresh every {:?}",
            self.config.tick_interval, self.config.refresh_interval
        );

        let mut tick = interval_at(
            Instant::now() + self.config.tick_interval,
            self.config.tick_interval,
        );
        let mut refresh = interval(self.config.refresh_interval);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    match self.mirrors.lock() {
                        Ok(mut mirrors) => mirrors.tick(),
                        Err(_) => warn!("Mirror lock poisoned, tick skipped"),
                    }
                }
                _ = refresh.tick() => {
                    self.refresh().await;
                }
            }
        }
    }
}
