use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, instrument, trace, warn};

use crate::task::{Status, Task};

/// Per-task stopwatches for the board.
///
/// A task is *registered* while its timer ticks. Its elapsed seconds are
/// remembered across a pause and forgotten when the run stops or is
/// discarded.
#[derive(Debug, Default, Clone)]
pub struct TimerEngine {
    running: BTreeSet<String>,
    active_seconds: BTreeMap<String, u64>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub ticked: usize,
    /// Tasks that gained whole minutes on this tick, with the minutes gained.
    pub folded: Vec<(String, u32)>,
}

impl TimerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a timer for `task`. Returns `false` if one is already ticking.
    #[instrument(skip(self, task, now), fields(id = %task.id))]
    pub fn start(&mut self, task: &mut Task, now: DateTime<Utc>) -> bool {
        if self.running.contains(&task.id) {
            debug!("timer already registered; ignoring start");
            return false;
        }

        let seeded = match (self.active_seconds.get(&task.id), task.paused_seconds) {
            (Some(seconds), _) => *seconds,
            (None, Some(seconds)) => seconds,
            (None, None) => {
                task.folded_minutes = 0;
                0
            }
        };
        self.active_seconds.insert(task.id.clone(), seeded);
        task.paused_seconds = None;

        if task.start_time.is_none() {
            task.start_time = Some(now - Duration::seconds(seconds_i64(seeded)));
        }
        self.running.insert(task.id.clone());

        debug!(seeded, "timer started");
        true
    }

    /// Advances every registered timer by one second and folds whole minutes.
    #[instrument(skip(self, tasks))]
    pub fn tick(&mut self, tasks: &mut [Task]) -> TickReport {
        let mut report = TickReport::default();
        let mut seen = BTreeSet::new();

        for task in tasks.iter_mut() {
            if !self.running.contains(&task.id) {
                continue;
            }
            seen.insert(task.id.clone());

            let seconds = self.active_seconds.entry(task.id.clone()).or_insert(0);
            *seconds += 1;
            let seconds = *seconds;
            report.ticked += 1;

            let gained = fold_whole_minutes(task, seconds);
            if gained > 0 {
                trace!(id = %task.id, seconds, gained, "folded minute");
                report.folded.push((task.id.clone(), gained));
            }
        }

        let stale: Vec<String> = self.running.difference(&seen).cloned().collect();
        for id in stale {
            warn!(id = %id, "dropping timer for task no longer on the board");
            self.running.remove(&id);
            self.active_seconds.remove(&id);
        }

        report
    }

    /// Ends the run: deregisters, folds what is left and clears `start_time`.
    /// Returns the minutes folded by this call.
    #[instrument(skip(self, task), fields(id = %task.id))]
    pub fn stop(&mut self, task: &mut Task) -> u32 {
        self.running.remove(&task.id);
        let seconds = self.active_seconds.remove(&task.id).unwrap_or(0);
        let gained = fold_whole_minutes(task, seconds);
        task.start_time = None;
        task.paused_seconds = None;
        task.folded_minutes = 0;
        debug!(seconds, gained, spent = task.spent_minutes, "timer stopped");
        gained
    }

    /// Like [`stop`](Self::stop) but the elapsed seconds are kept for a resume.
    #[instrument(skip(self, task), fields(id = %task.id))]
    pub fn pause(&mut self, task: &mut Task) -> u32 {
        self.running.remove(&task.id);
        let seconds = self.active_seconds.get(&task.id).copied().unwrap_or(0);
        let gained = fold_whole_minutes(task, seconds);
        task.start_time = None;
        task.paused_seconds = Some(seconds);
        debug!(seconds, gained, "timer paused");
        gained
    }

    /// Forgets the run without folding its unfinished minute.
    #[instrument(skip(self, task), fields(id = %task.id))]
    pub fn discard(&mut self, task: &mut Task) {
        self.running.remove(&task.id);
        let dropped = self.active_seconds.remove(&task.id).unwrap_or(0);
        task.start_time = None;
        task.paused_seconds = None;
        task.folded_minutes = 0;
        debug!(dropped_seconds = dropped % 60, "timer discarded");
    }

    /// Re-registers timers that were running when the board was last saved,
    /// crediting the wall-clock time that passed in between. Paused timers
    /// come back paused with their saved seconds.
    #[instrument(skip(self, tasks, now))]
    pub fn recover(&mut self, tasks: &mut [Task], now: DateTime<Utc>) -> usize {
        let mut recovered = 0;

        for task in tasks.iter_mut() {
            if task.start_time.is_none() && task.paused_seconds.is_none() {
                continue;
            }
            if task.status != Status::InProgress {
                warn!(id = %task.id, status = %task.status, "clearing timer on task that is not in progress");
                task.start_time = None;
                task.paused_seconds = None;
                task.folded_minutes = 0;
                continue;
            }
            if self.running.contains(&task.id) {
                continue;
            }

            let Some(start) = task.start_time else {
                if let Some(seconds) = task.paused_seconds
                    && !self.active_seconds.contains_key(&task.id)
                {
                    self.active_seconds.insert(task.id.clone(), seconds);
                    debug!(id = %task.id, seconds, "restored paused timer");
                }
                continue;
            };
            task.paused_seconds = None;

            let seconds = u64::try_from((now - start).num_seconds()).unwrap_or(0);
            self.active_seconds.insert(task.id.clone(), seconds);
            let gained = fold_whole_minutes(task, seconds);
            self.running.insert(task.id.clone());
            recovered += 1;

            debug!(id = %task.id, seconds, gained, "recovered running timer");
        }

        recovered
    }

    pub fn is_running(&self, id: &str) -> bool {
        self.running.contains(id)
    }

    pub fn is_paused(&self, id: &str) -> bool {
        !self.running.contains(id) && self.active_seconds.contains_key(id)
    }

    /// Seconds since the run began, for the timer display.
    pub fn elapsed(&self, id: &str) -> Option<u64> {
        self.active_seconds.get(id).copied()
    }

    /// Seconds past the last whole-minute boundary.
    pub fn unfolded(&self, id: &str) -> Option<u64> {
        self.elapsed(id).map(|seconds| seconds % 60)
    }

    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    pub fn reset(&mut self) {
        self.running.clear();
        self.active_seconds.clear();
    }
}

fn fold_whole_minutes(task: &mut Task, seconds: u64) -> u32 {
    let whole = u32::try_from(seconds / 60).unwrap_or(u32::MAX);
    if whole <= task.folded_minutes {
        return 0;
    }
    let gained = whole - task.folded_minutes;
    task.spent_minutes = task.spent_minutes.saturating_add(gained);
    task.folded_minutes = whole;
    gained
}

fn seconds_i64(seconds: u64) -> i64 {
    i64::try_from(seconds).unwrap_or(i64::MAX)
}
