//! Laser beams, their toggle state machine, and periodic cable hazards.

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use capyvent_core::{
    BeamHit, BeamSource, CableId, CableSnapshot, CableSpec, CellCoord, CellKind, Color, CrateId,
    Direction, HitKind, LaserId, LaserSnapshot, LaserSpec, SessionId,
};

use crate::{grid::Grid, registry::CrateRegistry};

/// Upper bound on re-casts performed for a single activation.
const MAX_RECAST_PASSES: usize = 100;

/// Result of casting a beam against the grid.
#[derive(Clone, Debug)]
pub(crate) struct BeamTrace {
    /// Visited cells in order, each recorded once.
    pub(crate) hits: Vec<BeamHit>,
    /// Last visited cell, or the origin when nothing was visited.
    pub(crate) endpoint: CellCoord,
    /// Box cells turned into floor.
    pub(crate) destroyed_boxes: Vec<CellCoord>,
    /// Crates removed from the registry.
    pub(crate) destroyed_crates: Vec<(CrateId, CellCoord)>,
}

/// Casts a beam from `origin` (exclusive) toward `direction`.
///
/// Walls stop the beam. Boxes and crates are destroyed and the beam carries
/// on past them. The scan repeats until a pass destroys nothing, bounded by
/// [`MAX_RECAST_PASSES`]; hits from every pass are merged so each cell
/// appears once, keeping the first classification recorded for it.
pub(crate) fn cast(
    grid: &mut Grid,
    crates: &mut CrateRegistry,
    origin: CellCoord,
    direction: Direction,
    range: Option<u32>,
) -> BeamTrace {
    let mut trace = BeamTrace {
        hits: Vec::new(),
        endpoint: origin,
        destroyed_boxes: Vec::new(),
        destroyed_crates: Vec::new(),
    };
    let mut recorded: BTreeSet<CellCoord> = BTreeSet::new();

    for _ in 0..MAX_RECAST_PASSES {
        let pass = trace_pass(grid, crates, origin, direction, range);
        trace.endpoint = pass.endpoint;
        let destroyed_any = !pass.destroyed_boxes.is_empty() || !pass.destroyed_crates.is_empty();

        for hit in pass.hits {
            if recorded.insert(hit.cell) {
                trace.hits.push(hit);
            }
        }
        trace.destroyed_boxes.extend(pass.destroyed_boxes);
        trace.destroyed_crates.extend(pass.destroyed_crates);

        if !destroyed_any {
            break;
        }
    }

    trace
}

fn trace_pass(
    grid: &mut Grid,
    crates: &mut CrateRegistry,
    origin: CellCoord,
    direction: Direction,
    range: Option<u32>,
) -> BeamTrace {
    let mut pass = BeamTrace {
        hits: Vec::new(),
        endpoint: origin,
        destroyed_boxes: Vec::new(),
        destroyed_crates: Vec::new(),
    };
    let (columns, rows) = (grid.columns(), grid.rows());
    let mut cursor = origin;
    let mut visited: u32 = 0;

    loop {
        if range.is_some_and(|limit| visited >= limit) {
            break;
        }
        let Some(next) = cursor.step(direction, columns, rows) else {
            break;
        };
        visited += 1;
        cursor = next;
        pass.endpoint = next;

        if grid.cell_at(next) == CellKind::Wall {
            pass.hits.push(BeamHit {
                kind: HitKind::Wall,
                cell: next,
            });
            break;
        }

        let kind = if grid.clear_box(next) {
            pass.destroyed_boxes.push(next);
            HitKind::Box
        } else if let Some(crate_id) = crates.remove_at(next) {
            pass.destroyed_crates.push((crate_id, next));
            HitKind::Box
        } else {
            HitKind::Beam
        };
        pass.hits.push(BeamHit { kind, cell: next });
    }

    pass
}

/// Rendered state of a single beam.
#[derive(Clone, Debug)]
pub(crate) struct Beam {
    pub(crate) origin: CellCoord,
    pub(crate) direction: Direction,
    pub(crate) on: bool,
    pub(crate) endpoint: CellCoord,
    pub(crate) color: Color,
}

impl Beam {
    fn dark(origin: CellCoord, direction: Direction, color: Color) -> Self {
        Self {
            origin,
            direction,
            on: false,
            endpoint: origin,
            color,
        }
    }

    /// Switches the beam off, collapsing it onto its origin.
    pub(crate) fn extinguish(&mut self) -> bool {
        if !self.on {
            return false;
        }
        self.on = false;
        self.endpoint = self.origin;
        true
    }

    pub(crate) fn snapshot(&self, source: BeamSource) -> LaserSnapshot {
        LaserSnapshot {
            source,
            origin: self.origin,
            direction: self.direction,
            on: self.on,
            endpoint: self.endpoint,
            color: self.color.clone(),
        }
    }
}

#[derive(Clone, Debug)]
struct Fixture {
    beam: Beam,
    range: u32,
    interval: Option<Duration>,
}

/// Outcome of a toggle request against a session beam.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Toggle {
    /// The beam was on with identical parameters and is now off.
    SwitchedOff,
    /// The beam is on with the requested parameters and must be cast.
    Lit,
}

/// Session beams and level fixture lasers.
#[derive(Debug, Default)]
pub(crate) struct Lasers {
    personal: BTreeMap<SessionId, Beam>,
    fixtures: BTreeMap<LaserId, Fixture>,
}

impl Lasers {
    pub(crate) fn add_fixture(&mut self, spec: LaserSpec) {
        let _ = self.fixtures.insert(
            spec.id,
            Fixture {
                beam: Beam::dark(spec.origin, spec.direction, spec.color),
                range: spec.range,
                interval: None,
            },
        );
    }

    /// Applies the session beam state machine.
    ///
    /// `ON` with the same origin and direction goes `OFF`; every other
    /// request ends `ON` with the new parameters.
    pub(crate) fn toggle(
        &mut self,
        session: &SessionId,
        origin: CellCoord,
        direction: Direction,
        color: Color,
    ) -> Toggle {
        let beam = self
            .personal
            .entry(session.clone())
            .or_insert_with(|| Beam::dark(origin, direction, color.clone()));

        if beam.on && beam.origin == origin && beam.direction == direction {
            let _ = beam.extinguish();
            return Toggle::SwitchedOff;
        }

        beam.on = true;
        beam.origin = origin;
        beam.direction = direction;
        beam.endpoint = origin;
        beam.color = color;
        Toggle::Lit
    }

    /// Marks a fixture as firing. Returns `false` for unknown lasers.
    pub(crate) fn ignite_fixture(&mut self, laser: &LaserId) -> bool {
        match self.fixtures.get_mut(laser) {
            Some(fixture) => {
                fixture.beam.on = true;
                true
            }
            None => false,
        }
    }

    /// Stores a fixture's auto-repeat cadence. Returns `false` for unknown
    /// lasers.
    pub(crate) fn set_interval(&mut self, laser: &LaserId, interval: Option<Duration>) -> bool {
        match self.fixtures.get_mut(laser) {
            Some(fixture) => {
                fixture.interval = interval;
                true
            }
            None => false,
        }
    }

    pub(crate) fn beam(&self, source: &BeamSource) -> Option<&Beam> {
        match source {
            BeamSource::Session(session) => self.personal.get(session),
            BeamSource::Fixture(laser) => self.fixtures.get(laser).map(|fixture| &fixture.beam),
        }
    }

    pub(crate) fn beam_mut(&mut self, source: &BeamSource) -> Option<&mut Beam> {
        match source {
            BeamSource::Session(session) => self.personal.get_mut(session),
            BeamSource::Fixture(laser) => self
                .fixtures
                .get_mut(laser)
                .map(|fixture| &mut fixture.beam),
        }
    }

    /// Beam length limit: fixtures use their range, session beams are
    /// bounded only by the grid.
    pub(crate) fn range(&self, source: &BeamSource) -> Option<u32> {
        match source {
            BeamSource::Session(_) => None,
            BeamSource::Fixture(laser) => self.fixtures.get(laser).map(|fixture| fixture.range),
        }
    }

    pub(crate) fn remove_session(&mut self, session: &SessionId) -> Option<Beam> {
        self.personal.remove(session)
    }

    pub(crate) fn interval(&self, laser: &LaserId) -> Option<Duration> {
        self.fixtures.get(laser).and_then(|fixture| fixture.interval)
    }

    pub(crate) fn snapshots(&self) -> Vec<LaserSnapshot> {
        let fixtures = self
            .fixtures
            .iter()
            .map(|(id, fixture)| fixture.beam.snapshot(BeamSource::Fixture(id.clone())));
        let personal = self
            .personal
            .iter()
            .map(|(session, beam)| beam.snapshot(BeamSource::Session(session.clone())));
        fixtures.chain(personal).collect()
    }

    pub(crate) fn clear(&mut self) {
        self.personal.clear();
        self.fixtures.clear();
    }
}

#[derive(Clone, Copy, Debug)]
struct Cable {
    cell: CellCoord,
    damage: bool,
    damage_ms: i64,
    safe_ms: i64,
    timer_ms: i64,
}

impl Cable {
    fn period(&self) -> i64 {
        if self.damage {
            self.damage_ms
        } else {
            self.safe_ms
        }
    }

    /// Advances the timer by `dt_ms`, flipping state as periods elapse.
    /// Returns whether the damage state differs from before the advance.
    fn advance(&mut self, dt_ms: i64) -> bool {
        if dt_ms <= 0 {
            return false;
        }
        if self.timer_ms <= 0 {
            self.timer_ms = self.period();
        }

        let before = self.damage;
        self.timer_ms = self.timer_ms.saturating_sub(dt_ms);

        // A full cycle flips twice and lands on the same state.
        let cycle = self.damage_ms.saturating_add(self.safe_ms);
        if self.timer_ms < -cycle {
            self.timer_ms = -((-self.timer_ms) % cycle);
        }

        while self.timer_ms <= 0 {
            self.damage = !self.damage;
            self.timer_ms += self.period();
        }
        before != self.damage
    }
}

/// Periodic damage/safe hazards.
#[derive(Debug, Default)]
pub(crate) struct Cables {
    entries: BTreeMap<CableId, Cable>,
    next_id: u32,
}

impl Cables {
    pub(crate) fn spawn(&mut self, spec: CableSpec) -> CableId {
        let id = CableId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        let damage_ms = duration_ms(spec.damage_duration);
        let safe_ms = duration_ms(spec.safe_duration);
        let cable = Cable {
            cell: spec.cell,
            damage: spec.start_damaging,
            damage_ms,
            safe_ms,
            timer_ms: if spec.start_damaging {
                damage_ms
            } else {
                safe_ms
            },
        };
        let _ = self.entries.insert(id, cable);
        id
    }

    /// Advances every cable, returning those whose damage state changed.
    pub(crate) fn advance(&mut self, dt: Duration) -> Vec<(CableId, bool)> {
        let dt_ms = i64::try_from(dt.as_millis()).unwrap_or(i64::MAX);
        self.entries
            .iter_mut()
            .filter_map(|(id, cable)| cable.advance(dt_ms).then_some((*id, cable.damage)))
            .collect()
    }

    /// Damage flag of the cable on `cell`, `false` when there is none.
    pub(crate) fn damages_at(&self, cell: CellCoord) -> bool {
        self.entries
            .values()
            .find(|cable| cable.cell == cell)
            .is_some_and(|cable| cable.damage)
    }

    pub(crate) fn snapshots(&self) -> Vec<CableSnapshot> {
        self.entries
            .iter()
            .map(|(id, cable)| CableSnapshot {
                id: *id,
                cell: cable.cell,
                damage: cable.damage,
                timer_ms: cable.timer_ms,
            })
            .collect()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.next_id = 0;
    }
}

fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cable(damage: bool) -> Cable {
        Cable {
            cell: CellCoord::new(0, 0),
            damage,
            damage_ms: 3_000,
            safe_ms: 2_000,
            timer_ms: if damage { 3_000 } else { 2_000 },
        }
    }

    #[test]
    fn cable_consumes_full_damage_period() {
        let mut cable = cable(true);
        assert!(cable.advance(4_000));
        assert!(!cable.damage);
        assert_eq!(cable.timer_ms, 1_000);
    }

    #[test]
    fn cable_handles_multiple_flips_in_one_advance() {
        let mut cable = cable(true);
        // 3000 damage + 2000 safe + 1000 into the next damage period.
        assert!(!cable.advance(6_000));
        assert!(cable.damage);
        assert_eq!(cable.timer_ms, 2_000);
    }

    #[test]
    fn huge_advance_terminates_with_matching_phase() {
        let mut small = cable(true);
        let mut huge = cable(true);
        let cycle = 5_000;
        let _ = small.advance(4_000);
        let _ = huge.advance(4_000 + cycle * 1_000_000);
        assert_eq!((small.damage, small.timer_ms), (huge.damage, huge.timer_ms));
    }

    #[test]
    fn non_positive_advance_is_ignored() {
        let mut cable = cable(true);
        assert!(!cable.advance(0));
        assert_eq!(cable.timer_ms, 3_000);
    }

    #[test]
    fn corrupted_timer_is_reset_before_advancing() {
        let mut cable = cable(false);
        cable.timer_ms = -50;
        assert!(!cable.advance(500));
        assert_eq!(cable.timer_ms, 1_500);
    }

    #[test]
    fn toggling_same_parameters_twice_turns_beam_off() {
        let mut lasers = Lasers::default();
        let session = SessionId::new("s");
        let origin = CellCoord::new(1, 1);

        assert_eq!(
            lasers.toggle(&session, origin, Direction::East, Color::default()),
            Toggle::Lit
        );
        assert_eq!(
            lasers.toggle(&session, origin, Direction::East, Color::default()),
            Toggle::SwitchedOff
        );
        let beam = lasers
            .beam(&BeamSource::Session(session))
            .expect("beam exists");
        assert!(!beam.on);
        assert_eq!(beam.endpoint, origin);
    }

    #[test]
    fn toggling_new_parameters_while_on_retargets() {
        let mut lasers = Lasers::default();
        let session = SessionId::new("s");
        let origin = CellCoord::new(1, 1);
        let _ = lasers.toggle(&session, origin, Direction::East, Color::default());

        assert_eq!(
            lasers.toggle(&session, origin, Direction::South, Color::new("blue")),
            Toggle::Lit
        );
        let beam = lasers
            .beam(&BeamSource::Session(session))
            .expect("beam exists");
        assert!(beam.on);
        assert_eq!(beam.direction, Direction::South);
        assert_eq!(beam.color, Color::new("blue"));
    }

    #[test]
    fn beam_clears_consecutive_boxes_and_stops_at_wall() {
        // origin, box, box, box, floor, wall, floor
        let mut grid = Grid::new(
            7,
            1,
            vec![
                CellKind::Floor,
                CellKind::Box,
                CellKind::Box,
                CellKind::Box,
                CellKind::Floor,
                CellKind::Wall,
                CellKind::Floor,
            ],
        );
        let mut crates = CrateRegistry::default();

        let trace = cast(
            &mut grid,
            &mut crates,
            CellCoord::new(0, 0),
            Direction::East,
            None,
        );

        assert_eq!(trace.destroyed_boxes.len(), 3);
        assert_eq!(trace.endpoint, CellCoord::new(5, 0));
        let kinds: Vec<HitKind> = trace.hits.iter().map(|hit| hit.kind).collect();
        assert_eq!(
            kinds,
            vec![
                HitKind::Box,
                HitKind::Box,
                HitKind::Box,
                HitKind::Beam,
                HitKind::Wall
            ]
        );
    }

    #[test]
    fn beam_without_wall_ends_at_grid_edge_and_respects_range() {
        let mut grid = Grid::new(6, 1, vec![CellKind::Floor; 6]);
        let mut crates = CrateRegistry::default();
        let _ = crates.spawn(CellCoord::new(2, 0));

        let trace = cast(
            &mut grid,
            &mut crates,
            CellCoord::new(0, 0),
            Direction::East,
            None,
        );
        assert_eq!(trace.endpoint, CellCoord::new(5, 0));
        assert_eq!(trace.destroyed_crates.len(), 1);
        assert!(!crates.contains_cell(CellCoord::new(2, 0)));

        let ranged = cast(
            &mut grid,
            &mut crates,
            CellCoord::new(0, 0),
            Direction::East,
            Some(2),
        );
        assert_eq!(ranged.endpoint, CellCoord::new(2, 0));
        assert_eq!(ranged.hits.len(), 2);
    }

    #[test]
    fn beam_facing_grid_edge_stays_on_origin() {
        let mut grid = Grid::new(2, 1, vec![CellKind::Floor; 2]);
        let mut crates = CrateRegistry::default();
        let trace = cast(
            &mut grid,
            &mut crates,
            CellCoord::new(0, 0),
            Direction::West,
            None,
        );
        assert!(trace.hits.is_empty());
        assert_eq!(trace.endpoint, CellCoord::new(0, 0));
    }
}
