use std::time::Duration;

use capyvent_core::{
    CapybaraState, CellCoord, CellKind, Command, Event, Level, VentGoal, VentId, VentSpec,
};
use capyvent_system_escape::{Config, Escape};
use capyvent_world::{self as world, query, World};

fn burrow() -> World {
    // . # .
    // . # v
    // . . .
    let mut cells = vec![CellKind::Floor; 9];
    cells[1] = CellKind::Wall;
    cells[4] = CellKind::Wall;
    World::from_level(Level {
        columns: 3,
        rows: 3,
        cells,
        spawn_points: vec![CellCoord::new(0, 2)],
        crates: Vec::new(),
        doors: Vec::new(),
        buttons: Vec::new(),
        lasers: Vec::new(),
        cables: Vec::new(),
        vents: vec![VentSpec {
            cell: CellCoord::new(2, 1),
            open: false,
        }],
        capybara: Some(CellCoord::new(0, 0)),
    })
}

fn tick(world: &mut World, escape: &mut Escape) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::Tick {
            dt: Duration::from_millis(100),
        },
        &mut events,
    );

    let mut commands = Vec::new();
    let view: &World = world;
    escape.handle(
        &events,
        query::capybara(view),
        |goal| query::escape_path(view, goal),
        &mut commands,
    );
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

#[test]
fn capybara_waits_for_the_vent_to_open_then_escapes() {
    let mut world = burrow();
    let mut escape = Escape::new(Config::new(Duration::from_millis(100), VentGoal::OpenOnly));

    for _ in 0..5 {
        let events = tick(&mut world, &mut escape);
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::CapybaraMoved { .. })));
    }

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::OpenVent {
            vent: VentId::new(0),
        },
        &mut events,
    );

    let mut escaped = false;
    for _ in 0..10 {
        let events = tick(&mut world, &mut escape);
        if events
            .iter()
            .any(|event| matches!(event, Event::CapybaraEscaped { .. }))
        {
            escaped = true;
            break;
        }
    }

    assert!(escaped);
    let capybara = query::capybara(&world).expect("capybara");
    assert_eq!(capybara.state, CapybaraState::Escaped);
    assert_eq!(capybara.cell, CellCoord::new(2, 1));
}

#[test]
fn any_vent_goal_walks_toward_closed_vents() {
    let mut world = burrow();
    let mut escape = Escape::new(Config::new(Duration::from_millis(100), VentGoal::AnyVent));

    let events = tick(&mut world, &mut escape);

    assert!(events.contains(&Event::CapybaraMoved {
        from: CellCoord::new(0, 0),
        to: CellCoord::new(0, 1),
    }));
}

#[test]
fn covered_vent_is_passed_over_for_a_reachable_one() {
    let mut world = World::from_level(Level {
        columns: 5,
        rows: 1,
        cells: vec![CellKind::Floor; 5],
        spawn_points: vec![CellCoord::new(0, 0)],
        crates: vec![CellCoord::new(1, 0)],
        doors: Vec::new(),
        buttons: Vec::new(),
        lasers: Vec::new(),
        cables: Vec::new(),
        vents: vec![
            VentSpec {
                cell: CellCoord::new(1, 0),
                open: true,
            },
            VentSpec {
                cell: CellCoord::new(4, 0),
                open: true,
            },
        ],
        capybara: Some(CellCoord::new(2, 0)),
    });
    let mut escape = Escape::new(Config::new(Duration::from_millis(100), VentGoal::OpenOnly));

    assert_eq!(
        query::escape_path(&world, VentGoal::OpenOnly),
        Some(vec![
            CellCoord::new(2, 0),
            CellCoord::new(3, 0),
            CellCoord::new(4, 0)
        ])
    );

    let mut log = Vec::new();
    for _ in 0..2 {
        log.extend(tick(&mut world, &mut escape));
    }

    assert!(log.contains(&Event::CapybaraMoved {
        from: CellCoord::new(2, 0),
        to: CellCoord::new(3, 0),
    }));
    assert!(log.contains(&Event::CapybaraEscaped {
        vent: VentId::new(1),
        cell: CellCoord::new(4, 0),
    }));
}
