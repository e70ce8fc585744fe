//! Tunables shared by every room a lobby creates.

use std::time::Duration;

use capyvent_core::VentGoal;

const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);
const DEFAULT_MAX_PLAYERS: usize = 4;
const DEFAULT_LASER_VISIBILITY: Duration = Duration::from_millis(500);
const DEFAULT_CAPYBARA_STEP: Duration = Duration::from_millis(400);

/// Configuration applied to a room when it is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoomConfig {
    tick_interval: Duration,
    max_players: usize,
    laser_visibility: Duration,
    capybara_step: Duration,
    capybara_goal: VentGoal,
}

impl RoomConfig {
    /// Creates a configuration populated with the default tunables.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            max_players: DEFAULT_MAX_PLAYERS,
            laser_visibility: DEFAULT_LASER_VISIBILITY,
            capybara_step: DEFAULT_CAPYBARA_STEP,
            capybara_goal: VentGoal::OpenOnly,
        }
    }

    /// Replaces the cadence of the background clock. Zero disables it.
    #[must_use]
    pub const fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    /// Replaces the number of players admitted at once.
    #[must_use]
    pub const fn with_max_players(mut self, max_players: usize) -> Self {
        self.max_players = max_players;
        self
    }

    /// Replaces how long a single-shot fixture beam stays visible.
    #[must_use]
    pub const fn with_laser_visibility(mut self, laser_visibility: Duration) -> Self {
        self.laser_visibility = laser_visibility;
        self
    }

    /// Replaces the time between capybara steps.
    #[must_use]
    pub const fn with_capybara_step(mut self, capybara_step: Duration) -> Self {
        self.capybara_step = capybara_step;
        self
    }

    /// Replaces the vents the capybara heads for.
    #[must_use]
    pub const fn with_capybara_goal(mut self, capybara_goal: VentGoal) -> Self {
        self.capybara_goal = capybara_goal;
        self
    }

    /// Cadence of the background clock.
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Number of players admitted at once.
    #[must_use]
    pub const fn max_players(&self) -> usize {
        self.max_players
    }

    /// Visibility window of single-shot fixture beams.
    #[must_use]
    pub const fn laser_visibility(&self) -> Duration {
        self.laser_visibility
    }

    /// Time between capybara steps.
    #[must_use]
    pub const fn capybara_step(&self) -> Duration {
        self.capybara_step
    }

    /// Vents the capybara heads for.
    #[must_use]
    pub const fn capybara_goal(&self) -> VentGoal {
        self.capybara_goal
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self::new()
    }
}
