use std::time::Duration;

use capyvent_core::{
    BeamSource, CellCoord, CellKind, Color, Command, Direction, Event, LaserId, LaserSpec, Level,
};
use capyvent_system_laser_schedule::{Config, LaserSchedule};
use capyvent_world::{self as world, query, World};

fn corridor_with_fixture() -> World {
    let mut cells = vec![CellKind::Floor; 6];
    cells[3] = CellKind::Box;
    World::from_level(Level {
        columns: 6,
        rows: 1,
        cells,
        spawn_points: vec![CellCoord::new(0, 0)],
        crates: Vec::new(),
        doors: Vec::new(),
        buttons: Vec::new(),
        lasers: vec![LaserSpec {
            id: LaserId::new("turret"),
            origin: CellCoord::new(0, 0),
            direction: Direction::East,
            range: 4,
            color: Color::new("red"),
        }],
        cables: Vec::new(),
        vents: Vec::new(),
        capybara: None,
    })
}

/// Applies `command` and feeds the resulting events through the schedule
/// until no further commands are produced, returning every event.
fn pump(world: &mut World, schedule: &mut LaserSchedule, command: Command) -> Vec<Event> {
    let mut log = Vec::new();
    let mut pending = vec![command];

    while !pending.is_empty() {
        let mut events = Vec::new();
        for command in pending.drain(..) {
            world::apply(world, command, &mut events);
        }
        schedule.handle(&events, &mut pending);
        log.extend(events);
    }
    log
}

fn turret() -> BeamSource {
    BeamSource::Fixture(LaserId::new("turret"))
}

#[test]
fn single_shot_stays_visible_for_the_window_then_switches_off() {
    let mut world = corridor_with_fixture();
    let mut schedule = LaserSchedule::new(Config::new(Duration::from_millis(500)));

    let events = pump(
        &mut world,
        &mut schedule,
        Command::FireLaserOnce {
            laser: LaserId::new("turret"),
        },
    );
    assert!(events.iter().any(|event| matches!(
        event,
        Event::BoxesDestroyed { cells, .. } if cells == &vec![CellCoord::new(3, 0)]
    )));
    let laser = query::laser(&world, &turret()).expect("fixture");
    assert!(laser.on);
    assert_eq!(laser.endpoint, CellCoord::new(4, 0));

    let _ = pump(
        &mut world,
        &mut schedule,
        Command::Tick {
            dt: Duration::from_millis(400),
        },
    );
    assert!(query::laser(&world, &turret()).expect("fixture").on);

    let events = pump(
        &mut world,
        &mut schedule,
        Command::Tick {
            dt: Duration::from_millis(100),
        },
    );
    assert!(events.contains(&Event::LaserSwitchedOff {
        source: turret(),
        origin: CellCoord::new(0, 0),
    }));
    let laser = query::laser(&world, &turret()).expect("fixture");
    assert!(!laser.on);
    assert_eq!(laser.endpoint, laser.origin);
}

#[test]
fn interval_refires_the_fixture() {
    let mut world = corridor_with_fixture();
    let mut schedule = LaserSchedule::new(Config::new(Duration::from_millis(200)));

    let _ = pump(
        &mut world,
        &mut schedule,
        Command::SetLaserInterval {
            laser: LaserId::new("turret"),
            interval: Some(Duration::from_millis(1_000)),
        },
    );

    let mut fired = 0;
    for _ in 0..30 {
        let events = pump(
            &mut world,
            &mut schedule,
            Command::Tick {
                dt: Duration::from_millis(100),
            },
        );
        fired += events
            .iter()
            .filter(|event| matches!(event, Event::LaserFired { .. }))
            .count();
    }

    assert_eq!(fired, 3);
}
