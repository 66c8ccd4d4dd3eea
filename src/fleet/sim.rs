//! Serial event loop driving a [`Fleet`].
//!
//! All fleet mutation goes through one queue. Outside callers send
//! [`FleetEvent`]s over an mpsc channel, the interval produces ticks, and
//! follow-up events produced by a tick are queued behind it and applied on
//! the next pass.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::dispatch::{Dispatcher, Fleet, FleetEvent};

/// Summary of one [`FleetSimulation::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Queued events applied before the tick.
    pub applied: usize,
    /// Arrivals detected by the tick and queued for the next step.
    pub arrivals: usize,
    /// Whether a tick ran at all.
    pub ticked: bool,
}

pub struct FleetSimulation {
    fleet: Fleet,
    queue: VecDeque<FleetEvent>,
    tick_interval: Duration,
    max_ticks: Option<u64>,
}

impl FleetSimulation {
    pub fn new(fleet: Fleet, tick_interval: Duration) -> Self {
        Self {
            fleet,
            queue: VecDeque::new(),
            tick_interval,
            max_ticks: None,
        }
    }

    /// Make [`run`](Self::run) return after this many ticks.
    pub fn with_tick_limit(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    pub fn into_fleet(self) -> Fleet {
        self.fleet
    }

    pub fn enqueue(&mut self, event: FleetEvent) {
        self.queue.push_back(event);
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// True when nothing is moving and nothing is waiting to be applied.
    pub fn is_settled(&self) -> bool {
        self.queue.is_empty() && self.fleet.busy_count() == 0
    }

    /// Apply everything queued so far, then tick once if any driver is busy.
    pub fn step(&mut self) -> StepReport {
        let mut report = StepReport::default();

        // Only drain what was queued before this step; anything produced
        // while draining waits for the next one.
        let queued = self.queue.len();
        for _ in 0..queued {
            let Some(event) = self.queue.pop_front() else {
                break;
            };
            let follow_ups = Dispatcher::next(&mut self.fleet, event);
            self.queue.extend(follow_ups);
            report.applied += 1;
        }

        if self.fleet.busy_count() > 0 {
            let arrivals = Dispatcher::next(&mut self.fleet, FleetEvent::Tick);
            report.arrivals = arrivals.len();
            report.ticked = true;
            self.queue.extend(arrivals);
        }

        report
    }

    /// Step until the fleet settles or `max_ticks` ticks have run.
    /// Returns the number of ticks taken.
    pub fn run_until_settled(&mut self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while !self.is_settled() && ticks < max_ticks {
            if self.step().ticked {
                ticks += 1;
            }
        }
        debug!(ticks, settled = self.is_settled(), "simulation stopped");
        ticks
    }

    /// Drive the fleet on a timer until `cancel` fires or the tick limit is
    /// reached.
    ///
    /// Commands are applied in arrival order through the same queue as
    /// arrivals. Each step publishes a snapshot to `snapshots`. Steps are
    /// skipped entirely while the fleet is settled and do not count toward
    /// the limit. Returns the final fleet.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<FleetEvent>,
        snapshots: watch::Sender<Fleet>,
        cancel: CancellationToken,
    ) -> Fleet {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut commands_open = true;
        let mut ticks: u64 = 0;

        info!(interval_ms = self.tick_interval.as_millis() as u64, "fleet simulation started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                command = commands.recv(), if commands_open => match command {
                    Some(event) => self.enqueue(event),
                    None => commands_open = false,
                },
                _ = interval.tick() => {
                    if self.is_settled() {
                        continue;
                    }
                    if self.step().ticked {
                        ticks += 1;
                    }
                    snapshots.send_replace(self.fleet.clone());
                    if self.max_ticks.is_some_and(|max| ticks >= max) {
                        warn!(ticks, busy = self.fleet.busy_count(), "tick limit reached");
                        break;
                    }
                }
            }
        }
        info!(deliveries = self.fleet.deliveries, "fleet simulation stopped");
        self.fleet
    }
}
