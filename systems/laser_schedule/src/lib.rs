#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Timing system for fixture lasers.
//!
//! A fixture that fires stays visible for a fixed window and is then switched
//! off. Fixtures with an auto-repeat interval are fired again each time the
//! interval elapses. The system never touches the world directly: it turns
//! elapsed time into `ExtinguishLaser` and `FireLaserOnce` commands that the
//! room feeds back through its serial queue.

use std::{collections::BTreeMap, time::Duration};

use capyvent_core::{BeamSource, Command, Event, LaserId};

/// Configuration parameters required to construct the laser schedule.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    visibility: Duration,
}

impl Config {
    /// Creates a configuration with the provided visibility window.
    #[must_use]
    pub const fn new(visibility: Duration) -> Self {
        Self { visibility }
    }
}

#[derive(Clone, Copy, Debug)]
struct Repeat {
    interval: Duration,
    elapsed: Duration,
}

/// Pure system tracking laser visibility windows and repeat cadences.
#[derive(Debug)]
pub struct LaserSchedule {
    visibility: Duration,
    visible: BTreeMap<LaserId, Duration>,
    repeating: BTreeMap<LaserId, Repeat>,
}

impl LaserSchedule {
    /// Creates a new schedule using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            visibility: config.visibility,
            visible: BTreeMap::new(),
            repeating: BTreeMap::new(),
        }
    }

    /// Consumes world events and emits the laser commands that became due.
    ///
    /// A repeating fixture fires at most once per call, however many
    /// intervals the elapsed time spans.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        let mut elapsed = Duration::ZERO;

        for event in events {
            match event {
                Event::TimeAdvanced { dt } => elapsed = elapsed.saturating_add(*dt),
                Event::LaserFired {
                    source: BeamSource::Fixture(laser),
                    ..
                } => {
                    let _ = self.visible.insert(laser.clone(), self.visibility);
                }
                Event::LaserSwitchedOff {
                    source: BeamSource::Fixture(laser),
                    ..
                } => {
                    let _ = self.visible.remove(laser);
                }
                Event::LaserIntervalChanged { laser, interval } => match interval {
                    Some(interval) => {
                        let _ = self.repeating.insert(
                            laser.clone(),
                            Repeat {
                                interval: *interval,
                                elapsed: Duration::ZERO,
                            },
                        );
                    }
                    None => {
                        let _ = self.repeating.remove(laser);
                    }
                },
                Event::RoomDisposed => {
                    self.visible.clear();
                    self.repeating.clear();
                }
                _ => {}
            }
        }

        if elapsed.is_zero() {
            return;
        }

        self.visible.retain(|laser, remaining| {
            *remaining = remaining.saturating_sub(elapsed);
            if remaining.is_zero() {
                out.push(Command::ExtinguishLaser {
                    laser: laser.clone(),
                });
                false
            } else {
                true
            }
        });

        for (laser, repeat) in &mut self.repeating {
            if repeat.interval.is_zero() {
                continue;
            }
            repeat.elapsed = repeat.elapsed.saturating_add(elapsed);
            if repeat.elapsed >= repeat.interval {
                repeat.elapsed = Duration::from_nanos(
                    u64::try_from(repeat.elapsed.as_nanos() % repeat.interval.as_nanos())
                        .unwrap_or(0),
                );
                out.push(Command::FireLaserOnce {
                    laser: laser.clone(),
                });
            }
        }
    }
}
