#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic analytics system that tallies run metrics and decides when a run ends.

use std::time::Duration;

use warehouse_core::{Event, FailureReason, RunMetrics, RunOutcome, SkipReason};

/// Pure analytics system fed with every event the world emits.
#[derive(Debug, Default)]
pub struct Analytics {
    metrics: RunMetrics,
    fleet_size: u32,
    ledger_entries: Option<usize>,
    ledger_cleared: bool,
}

impl Analytics {
    /// Creates a new analytics system with zeroed metrics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Metrics accumulated so far.
    #[must_use]
    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    /// Number of robots that joined the fleet.
    #[must_use]
    pub fn fleet_size(&self) -> u32 {
        self.fleet_size
    }

    /// Consumes world events and folds them into the metrics.
    pub fn handle(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::TimeAdvanced { tick } => self.metrics.ticks = *tick,
                Event::RobotSpawned { .. } => self.fleet_size += 1,
                Event::LedgerAssigned { entries } => {
                    self.ledger_entries = Some(*entries);
                    self.ledger_cleared = false;
                }
                Event::ActionResolved { success, .. } => {
                    self.metrics.actions_attempted += 1;
                    if !success {
                        self.metrics.actions_failed += 1;
                    }
                }
                Event::ItemsSubmitted { count, .. } => self.metrics.items_retrieved += count,
                Event::RobotDied { .. } => self.metrics.dead_robots += 1,
                Event::ObstaclePlaced { .. } => self.metrics.obstacles_placed += 1,
                Event::LedgerCleared => self.ledger_cleared = true,
                Event::SpawnRejected { .. }
                | Event::ItemTaken { .. }
                | Event::ItemsTransferred { .. }
                | Event::ObstacleCleared { .. }
                | Event::ObstacleRejected { .. } => {}
            }
        }
    }

    /// Adds wall-clock time spent simulating.
    pub fn record_wall_clock(&mut self, elapsed: Duration) {
        self.metrics.wall_clock = self.metrics.wall_clock.saturating_add(elapsed);
    }

    /// Outcome for a run that cannot start, evaluated after setup.
    #[must_use]
    pub fn preflight(&self) -> Option<RunOutcome> {
        if self.fleet_size == 0 {
            return Some(RunOutcome::Skipped(SkipReason::NoRobots));
        }
        if self.ledger_entries.unwrap_or(0) == 0 {
            return Some(RunOutcome::Skipped(SkipReason::EmptyLedger));
        }
        None
    }

    /// Terminal outcome reached so far, if any.
    ///
    /// A cleared ledger wins over a dead majority reached on the same tick.
    #[must_use]
    pub fn evaluate(&self, tick_budget: u64) -> Option<RunOutcome> {
        if self.ledger_cleared {
            return Some(RunOutcome::Success);
        }
        if u64::from(self.metrics.dead_robots) * 2 > u64::from(self.fleet_size) {
            return Some(RunOutcome::Failure(FailureReason::FleetLost));
        }
        if self.metrics.ticks >= tick_budget {
            return Some(RunOutcome::Failure(FailureReason::TickBudgetExceeded));
        }
        None
    }

    /// Consumes the system, yielding the final metrics.
    #[must_use]
    pub fn into_metrics(self) -> RunMetrics {
        self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warehouse_core::{CellCoord, RobotAction, RobotId};

    fn spawned(id: u32) -> Event {
        Event::RobotSpawned {
            robot: RobotId::new(id),
            cell: CellCoord::new(id, 0),
        }
    }

    fn died(id: u32) -> Event {
        Event::RobotDied {
            robot: RobotId::new(id),
            cell: CellCoord::new(id, 0),
        }
    }

    #[test]
    fn half_the_fleet_dead_is_not_yet_a_failure() {
        let mut analytics = Analytics::new();
        analytics.handle(&[
            spawned(0),
            spawned(1),
            spawned(2),
            spawned(3),
            Event::LedgerAssigned { entries: 1 },
            died(0),
            died(1),
        ]);
        assert_eq!(analytics.evaluate(100), None);

        analytics.handle(&[died(2)]);
        assert_eq!(
            analytics.evaluate(100),
            Some(RunOutcome::Failure(FailureReason::FleetLost))
        );
    }

    #[test]
    fn ledger_clearing_beats_other_terminations() {
        let mut analytics = Analytics::new();
        analytics.handle(&[
            spawned(0),
            Event::LedgerAssigned { entries: 1 },
            Event::TimeAdvanced { tick: 10 },
            died(0),
            Event::LedgerCleared,
        ]);
        assert_eq!(analytics.evaluate(10), Some(RunOutcome::Success));
    }

    #[test]
    fn tick_budget_ends_the_run() {
        let mut analytics = Analytics::new();
        analytics.handle(&[
            spawned(0),
            Event::LedgerAssigned { entries: 1 },
            Event::TimeAdvanced { tick: 9 },
        ]);
        assert_eq!(analytics.evaluate(10), None);
        analytics.handle(&[Event::TimeAdvanced { tick: 10 }]);
        assert_eq!(
            analytics.evaluate(10),
            Some(RunOutcome::Failure(FailureReason::TickBudgetExceeded))
        );
    }

    #[test]
    fn preflight_skips_runs_without_robots_or_items() {
        let mut analytics = Analytics::new();
        assert_eq!(
            analytics.preflight(),
            Some(RunOutcome::Skipped(SkipReason::NoRobots))
        );
        analytics.handle(&[spawned(0), Event::LedgerAssigned { entries: 0 }]);
        assert_eq!(
            analytics.preflight(),
            Some(RunOutcome::Skipped(SkipReason::EmptyLedger))
        );
    }

    #[test]
    fn action_results_are_tallied() {
        let mut analytics = Analytics::new();
        let resolved = |success| Event::ActionResolved {
            robot: RobotId::new(0),
            action: RobotAction::Wait,
            success,
        };
        analytics.handle(&[resolved(true), resolved(false), resolved(false)]);
        analytics.record_wall_clock(Duration::from_millis(3));

        let metrics = analytics.into_metrics();
        assert_eq!(metrics.actions_attempted, 3);
        assert_eq!(metrics.actions_failed, 2);
        assert_eq!(metrics.wall_clock, Duration::from_millis(3));
    }
}
