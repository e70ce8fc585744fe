#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that walks the capybara toward the nearest vent.

use std::time::Duration;

use capyvent_core::{CapybaraSnapshot, CapybaraState, CellCoord, Command, Event, VentGoal};

/// Configuration parameters required to construct the escape system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    step_interval: Duration,
    goal: VentGoal,
}

impl Config {
    /// Creates a configuration from a step cadence and the vents that count
    /// as an exit.
    #[must_use]
    pub const fn new(step_interval: Duration, goal: VentGoal) -> Self {
        Self {
            step_interval,
            goal,
        }
    }
}

/// Emits one capybara step per elapsed interval along a fresh route.
#[derive(Debug)]
pub struct Escape {
    step_interval: Duration,
    goal: VentGoal,
    accumulator: Duration,
}

impl Escape {
    /// Creates a new escape system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            step_interval: config.step_interval,
            goal: config.goal,
            accumulator: Duration::ZERO,
        }
    }

    /// Consumes events and the capybara view to emit step commands.
    ///
    /// `route` is only consulted when a step is due; it receives the
    /// configured goal and returns a path starting at the capybara's cell.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        capybara: Option<CapybaraSnapshot>,
        route: F,
        out: &mut Vec<Command>,
    ) where
        F: FnOnce(VentGoal) -> Option<Vec<CellCoord>>,
    {
        let mut elapsed = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => elapsed = elapsed.saturating_add(*dt),
                Event::RoomDisposed => self.accumulator = Duration::ZERO,
                _ => {}
            }
        }

        let Some(capybara) = capybara else {
            self.accumulator = Duration::ZERO;
            return;
        };
        if capybara.state == CapybaraState::Escaped || self.step_interval.is_zero() {
            self.accumulator = Duration::ZERO;
            return;
        }

        self.accumulator = self.accumulator.saturating_add(elapsed);
        if self.accumulator < self.step_interval {
            return;
        }
        self.accumulator = self.accumulator.saturating_sub(self.step_interval);
        if self.accumulator >= self.step_interval {
            self.accumulator = Duration::ZERO;
        }

        let Some(path) = route(self.goal) else {
            return;
        };
        let next_step = match path.as_slice() {
            [from, to, ..] if *from == capybara.cell => from.direction_to(*to),
            _ => None,
        };
        if let Some(direction) = next_step {
            out.push(Command::StepCapybara { direction });
        }
    }
}
