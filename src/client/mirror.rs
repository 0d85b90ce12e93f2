//! Client-held mirror state
//!
//! A mirror is a pure cache of the server's timer checkpoints. It carries
//! no authority: it is seeded from a checkpoint, advanced locally once per
//! second between checkpoints, and snapped back to whatever the server
//! reports next. Dropping it and rebuilding from any checkpoint is always
//! safe.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::state::timer::whole_seconds_between;
use crate::state::Checkpoint;

/// Consecutive failed refreshes before the displayed counters are flagged
/// as possibly stale.
const STALE_AFTER_FAILURES: u32 = 3;

/// One task's mirrored timer as a viewer displays it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskMirror {
    /// Best local estimate of total elapsed seconds, open period included
    pub seconds: u64,
    pub running: bool,
    pub paused: bool,
    /// Last known open-period start, kept so a re-seed needs no round trip
    pub active_timer: Option<DateTime<Utc>>,
    /// Set when refreshes have failed long enough that the counter may
    /// have drifted; cleared by the next successful checkpoint
    pub stale: bool,
}

impl TaskMirror {
    /// Seed from an authoritative checkpoint: the committed total plus
    /// however much of the open period has elapsed on the local clock.
    pub fn from_checkpoint(checkpoint: &Checkpoint, now: DateTime<Utc>) -> Self {
        let mut seconds = checkpoint.total_time_spent;
        if checkpoint.running() {
            if let Some(started) = checkpoint.active_timer {
                seconds = seconds.saturating_add(whole_seconds_between(started, now));
            }
        }
        Self {
            seconds,
            running: checkpoint.running(),
            paused: checkpoint.paused(),
            active_timer: checkpoint.active_timer,
            stale: false,
        }
    }
}

/// The full set of mirrors one viewer holds, one per displayed task.
#[derive(Debug, Default)]
pub struct MirrorSet {
    timers: HashMap<String, TaskMirror>,
    failed_refreshes: u32,
}

impl MirrorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, task_id: &str) -> Option<&TaskMirror> {
        self.timers.get(task_id)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Rebuild every mirror from a full set of checkpoints. Local guesses
    /// are discarded wholesale; tasks no longer reported vanish.
    pub fn seed(&mut self, checkpoints: &[(String, Checkpoint)], now: DateTime<Utc>) {
        self.timers = checkpoints
            .iter()
            .map(|(id, cp)| (id.clone(), TaskMirror::from_checkpoint(cp, now)))
            .collect();
        self.failed_refreshes = 0;
    }

    /// Snap one task's mirror to a checkpoint returned by an action round
    /// trip. The authoritative value always wins over the local guess.
    pub fn apply(&mut self, task_id: &str, checkpoint: &Checkpoint, now: DateTime<Utc>) {
        self.timers
            .insert(task_id.to_string(), TaskMirror::from_checkpoint(checkpoint, now));
    }

    /// The once-per-second local advance. Purely local, self-correcting at
    /// the next seed.
    pub fn tick(&mut self) {
        for mirror in self.timers.values_mut() {
            if mirror.running && !mirror.paused {
                mirror.seconds = mirror.seconds.saturating_add(1);
            }
        }
    }

    /// Record a failed refresh; after enough in a row, flag every mirror
    /// so the UI can mark the counters as possibly stale. The counters
    /// themselves keep ticking from their last known values.
    pub fn refresh_failed(&mut self) {
        self.failed_refreshes = self.failed_refreshes.saturating_add(1);
        if self.failed_refreshes >= STALE_AFTER_FAILURES {
            for mirror in self.timers.values_mut() {
                mirror.stale = true;
            }
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.failed_refreshes
    }
}
