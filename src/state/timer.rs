//! Task timer state machine and session ledger
//!
//! One `TaskTimer` exists per task and is the authoritative record of how
//! long that task has been worked on. All transitions are pure functions of
//! the current state and a caller-supplied `now`, so the state machine can
//! be exercised in tests with synthetic clocks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Timer lifecycle status - the single source of truth.
///
/// `running`/`paused` booleans exposed over the API are derived from this
/// enum, never stored separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    /// Never started timing
    Idle,
    /// An accounting period is open
    Running,
    /// Open period committed, can be resumed
    Paused,
    /// Explicitly stopped; a later start opens a new accounting period
    /// without resetting the total
    Stopped,
}

impl TimerStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, TimerStatus::Running)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, TimerStatus::Paused)
    }
}

/// One start/stop accounting period in the ledger.
///
/// `end_time` is `None` only for the period matching the timer's
/// `active_timer`; it is filled in exactly once, on pause or stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Session {
    /// Whole-second duration of a closed session; `None` while ongoing
    pub fn duration_seconds(&self) -> Option<u64> {
        self.end_time.map(|end| whole_seconds_between(self.start_time, end))
    }
}

/// The four inbound timer commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    Start,
    Pause,
    Resume,
    Stop,
}

/// Guard failures for timer transitions. Checked before any mutation, so a
/// rejected action never leaves partial state behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("Timer not running")]
    NotRunning,
    #[error("Task not paused")]
    NotPaused,
}

/// Authoritative snapshot returned by every transition and bulk read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub status: TimerStatus,
    pub active_timer: Option<DateTime<Utc>>,
    pub total_time_spent: u64,
}

impl Checkpoint {
    pub fn running(&self) -> bool {
        self.status.is_running()
    }

    pub fn paused(&self) -> bool {
        self.status.is_paused()
    }
}

/// Per-task elapsed-time tracker: status, the current open period, the
/// committed total in whole seconds, and the append-only session ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskTimer {
    status: TimerStatus,
    active_timer: Option<DateTime<Utc>>,
    total_time_spent: u64,
    sessions: Vec<Session>,
}

impl TaskTimer {
    pub fn new() -> Self {
        Self {
            status: TimerStatus::Idle,
            active_timer: None,
            total_time_spent: 0,
            sessions: Vec::new(),
        }
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn active_timer(&self) -> Option<DateTime<Utc>> {
        self.active_timer
    }

    pub fn total_time_spent(&self) -> u64 {
        self.total_time_spent
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            status: self.status,
            active_timer: self.active_timer,
            total_time_spent: self.total_time_spent,
        }
    }

    /// Start timing. If a period is already open this is a no-op that
    /// reports the existing checkpoint, so a retried or double-clicked
    /// start can never open a second session or double-count time.
    pub fn start(&mut self, now: DateTime<Utc>) -> Checkpoint {
        if self.active_timer.is_some() {
            return self.checkpoint();
        }
        self.open_session(now)
    }

    /// Commit the open period into the total and close its ledger entry.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<Checkpoint, TimerError> {
        let started = self.active_timer.ok_or(TimerError::NotRunning)?;
        self.close_session(started, now);
        self.status = TimerStatus::Paused;
        Ok(self.checkpoint())
    }

    /// Reopen after a pause. Same effect as `start`, but guarded so a
    /// resume against a running or stopped timer is reported to the caller.
    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<Checkpoint, TimerError> {
        if self.status != TimerStatus::Paused {
            return Err(TimerError::NotPaused);
        }
        Ok(self.open_session(now))
    }

    /// Stop timing. Valid from `Running` (commits the open period like
    /// `pause`) and from `Paused` (nothing left to commit); rejected when
    /// nothing was ever started.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Result<Checkpoint, TimerError> {
        match (self.status, self.active_timer) {
            (TimerStatus::Running, Some(started)) => self.close_session(started, now),
            (TimerStatus::Paused, _) => {}
            _ => return Err(TimerError::NotRunning),
        }
        self.status = TimerStatus::Stopped;
        Ok(self.checkpoint())
    }

    /// Rebuild after a process restart. The open period's end boundary died
    /// with the process, so drop the open ledger entry and surface the
    /// timer as paused with its committed total intact.
    pub fn recover_from_restart(&mut self) {
        if self.active_timer.take().is_some() {
            self.sessions.retain(|s| s.end_time.is_some());
            self.status = TimerStatus::Paused;
        }
    }

    fn open_session(&mut self, now: DateTime<Utc>) -> Checkpoint {
        self.active_timer = Some(now);
        self.sessions.push(Session {
            start_time: now,
            end_time: None,
        });
        self.status = TimerStatus::Running;
        self.checkpoint()
    }

    fn close_session(&mut self, started: DateTime<Utc>, now: DateTime<Utc>) {
        let elapsed = whole_seconds_between(started, now);
        self.total_time_spent = self.total_time_spent.saturating_add(elapsed);
        if let Some(open) = self.sessions.iter_mut().rev().find(|s| s.end_time.is_none()) {
            open.end_time = Some(now);
        }
        self.active_timer = None;
    }
}

impl Default for TaskTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Whole seconds from `from` to `to`, truncated toward zero and clamped at
/// zero so clock skew can never produce a negative duration.
pub fn whole_seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    (to - from).num_seconds().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn at_millis(secs: i64, millis: u32) -> DateTime<Utc> {
        Utc.timestamp_millis_opt((1_700_000_000 + secs) * 1000 + i64::from(millis)).unwrap()
    }

    #[test]
    fn new_timer_is_idle_and_empty() {
        let timer = TaskTimer::new();
        assert_eq!(timer.status(), TimerStatus::Idle);
        assert_eq!(timer.total_time_spent(), 0);
        assert!(timer.sessions().is_empty());
        assert!(timer.active_timer().is_none());
    }

    #[test]
    fn start_opens_one_session() {
        let mut timer = TaskTimer::new();
        let cp = timer.start(at(0));
        assert_eq!(cp.status, TimerStatus::Running);
        assert_eq!(cp.active_timer, Some(at(0)));
        assert_eq!(cp.total_time_spent, 0);
        assert_eq!(timer.sessions().len(), 1);
        assert!(timer.sessions()[0].end_time.is_none());
    }

    #[test]
    fn start_is_idempotent_while_running() {
        let mut timer = TaskTimer::new();
        let first = timer.start(at(0));
        let second = timer.start(at(30));
        assert_eq!(first.active_timer, second.active_timer);
        assert_eq!(second.active_timer, Some(at(0)));
        assert_eq!(timer.sessions().len(), 1);
        assert_eq!(timer.total_time_spent(), 0);
    }

    #[test]
    fn pause_commits_elapsed_and_closes_session() {
        let mut timer = TaskTimer::new();
        timer.start(at(0));
        let cp = timer.pause(at(5)).unwrap();
        assert_eq!(cp.status, TimerStatus::Paused);
        assert_eq!(cp.total_time_spent, 5);
        assert!(cp.active_timer.is_none());
        assert_eq!(timer.sessions().len(), 1);
        assert_eq!(timer.sessions()[0].end_time, Some(at(5)));
    }

    #[test]
    fn elapsed_truncates_toward_zero() {
        let mut timer = TaskTimer::new();
        timer.start(at_millis(0, 0));
        let cp = timer.pause(at_millis(4, 900)).unwrap();
        assert_eq!(cp.total_time_spent, 4);
    }

    #[test]
    fn repeated_cycles_under_count_at_most_one_second_each() {
        let mut timer = TaskTimer::new();
        let cycles: i64 = 5;

        // Each cycle runs for 4.9 real seconds across a whole-second
        // boundary, the worst case for truncation
        timer.start(at_millis(0, 0));
        timer.pause(at_millis(4, 900)).unwrap();
        for i in 1..cycles {
            timer.resume(at_millis(i * 10, 0)).unwrap();
            timer.pause(at_millis(i * 10 + 4, 900)).unwrap();
        }

        let real_open_millis = cycles * 4_900;
        let total = timer.total_time_spent() as i64;

        // Truncation is one-directional: the committed total never
        // exceeds the real open time, and loses under a second per cycle
        assert_eq!(total, cycles * 4);
        assert!(total <= real_open_millis / 1000);
        assert!(real_open_millis / 1000 - total < cycles);
    }

    #[test]
    fn clock_skew_clamps_to_zero() {
        let mut timer = TaskTimer::new();
        timer.start(at(10));
        let cp = timer.pause(at(7)).unwrap();
        assert_eq!(cp.total_time_spent, 0);
    }

    #[test]
    fn pause_without_open_session_is_rejected() {
        let mut timer = TaskTimer::new();
        assert_eq!(timer.pause(at(0)), Err(TimerError::NotRunning));
        assert_eq!(timer.status(), TimerStatus::Idle);

        timer.start(at(0));
        timer.pause(at(3)).unwrap();
        assert_eq!(timer.pause(at(4)), Err(TimerError::NotRunning));
        assert_eq!(timer.total_time_spent(), 3);
    }

    #[test]
    fn resume_requires_paused() {
        let mut timer = TaskTimer::new();
        assert_eq!(timer.resume(at(0)), Err(TimerError::NotPaused));

        timer.start(at(0));
        assert_eq!(timer.resume(at(1)), Err(TimerError::NotPaused));

        timer.pause(at(2)).unwrap();
        let cp = timer.resume(at(10)).unwrap();
        assert_eq!(cp.status, TimerStatus::Running);
        assert_eq!(cp.active_timer, Some(at(10)));
        assert_eq!(timer.sessions().len(), 2);
    }

    #[test]
    fn stop_from_running_commits_elapsed() {
        let mut timer = TaskTimer::new();
        timer.start(at(0));
        let cp = timer.stop(at(8)).unwrap();
        assert_eq!(cp.status, TimerStatus::Stopped);
        assert_eq!(cp.total_time_spent, 8);
        assert!(timer.sessions().iter().all(|s| s.end_time.is_some()));
    }

    #[test]
    fn stop_from_paused_keeps_total() {
        let mut timer = TaskTimer::new();
        timer.start(at(0));
        timer.pause(at(5)).unwrap();
        let cp = timer.stop(at(20)).unwrap();
        assert_eq!(cp.status, TimerStatus::Stopped);
        assert_eq!(cp.total_time_spent, 5);
    }

    #[test]
    fn stop_with_nothing_started_is_rejected() {
        let mut timer = TaskTimer::new();
        assert_eq!(timer.stop(at(0)), Err(TimerError::NotRunning));

        timer.start(at(0));
        timer.stop(at(1)).unwrap();
        assert_eq!(timer.stop(at(2)), Err(TimerError::NotRunning));
    }

    #[test]
    fn restart_after_stop_keeps_cumulative_total() {
        let mut timer = TaskTimer::new();
        timer.start(at(0));
        timer.stop(at(4)).unwrap();
        let cp = timer.start(at(10));
        assert_eq!(cp.status, TimerStatus::Running);
        assert_eq!(cp.total_time_spent, 4);
        assert_eq!(timer.sessions().len(), 2);
    }

    #[test]
    fn conservation_of_closed_sessions() {
        let mut timer = TaskTimer::new();
        timer.start(at(0));
        timer.pause(at(5)).unwrap();
        timer.resume(at(10)).unwrap();
        timer.pause(at(17)).unwrap();
        timer.resume(at(20)).unwrap();
        timer.stop(at(23)).unwrap();

        let ledger_total: u64 = timer
            .sessions()
            .iter()
            .filter_map(Session::duration_seconds)
            .sum();
        assert_eq!(ledger_total, timer.total_time_spent());
        assert_eq!(timer.total_time_spent(), 15);
    }

    #[test]
    fn total_never_decreases() {
        let mut timer = TaskTimer::new();
        let mut last = 0;
        timer.start(at(0));
        for (step, now) in [3, 5, 9, 11, 14].into_iter().enumerate() {
            if step % 2 == 0 {
                timer.pause(at(now)).unwrap();
            } else {
                timer.resume(at(now)).unwrap();
            }
            assert!(timer.total_time_spent() >= last);
            last = timer.total_time_spent();
        }
    }

    #[test]
    fn end_to_end_scenario() {
        let mut timer = TaskTimer::new();
        timer.start(at(0));
        let cp = timer.pause(at(5)).unwrap();
        assert_eq!(cp.total_time_spent, 5);
        assert_eq!(
            timer.sessions(),
            &[Session {
                start_time: at(0),
                end_time: Some(at(5)),
            }]
        );

        timer.resume(at(10)).unwrap();
        let cp = timer.stop(at(13)).unwrap();
        assert_eq!(cp.total_time_spent, 8);
        assert_eq!(timer.sessions().len(), 2);
        assert_eq!(timer.sessions()[1].end_time, Some(at(13)));
    }

    #[test]
    fn recover_from_restart_drops_open_session() {
        let mut timer = TaskTimer::new();
        timer.start(at(0));
        timer.pause(at(5)).unwrap();
        timer.resume(at(10)).unwrap();
        timer.recover_from_restart();

        assert_eq!(timer.status(), TimerStatus::Paused);
        assert!(timer.active_timer().is_none());
        assert_eq!(timer.sessions().len(), 1);
        assert_eq!(timer.total_time_spent(), 5);
    }

    #[test]
    fn recover_is_a_no_op_when_nothing_open() {
        let mut timer = TaskTimer::new();
        timer.start(at(0));
        timer.pause(at(5)).unwrap();
        timer.recover_from_restart();
        assert_eq!(timer.status(), TimerStatus::Paused);
        assert_eq!(timer.sessions().len(), 1);
    }
}
