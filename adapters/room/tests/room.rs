use capyvent_core::{
    BeamSource, ButtonId, CellCoord, CrateId, DoorId, Event, LaserId, SessionId, VentId,
};
use capyvent_room::{Batch, ClientRequest, Room, RoomConfig, RoomInput};

const WORKSHOP: &str = r#"{
    "width": 5,
    "height": 2,
    "layout": [
        0, 0, 0, 0, 0,
        3, 0, 2, 0, 2
    ],
    "mechanics": [
        { "type": "door", "id": "gate", "position": { "x": 4, "y": 0 } },
        { "type": "button", "id": "plate", "position": { "x": 3, "y": 0 }, "doorId": "gate" },
        { "type": "laser", "id": "turret", "position": { "x": 0, "y": 1 }, "direction": { "dx": 1, "dy": 0 } }
    ],
    "entities": {
        "crates": [{ "x": 2, "y": 0 }],
        "players": [{ "x": 1, "y": 0 }, { "x": 0, "y": 0 }]
    }
}"#;

fn workshop() -> Room {
    Room::from_document(WORKSHOP, RoomConfig::new()).expect("valid level")
}

/// Parses one script line and feeds it to the room.
fn send(room: &mut Room, line: &str) -> Batch {
    let input: RoomInput = serde_json::from_str(line).expect("valid input");
    room.process(input).expect("open room")
}

#[test]
fn scripted_push_opens_the_gate() {
    let mut room = workshop();

    let joined = send(&mut room, r#"{"input":"join","session":"a","name":" ada "}"#);
    assert!(joined.events.contains(&Event::PlayerJoined {
        session: SessionId::new("a"),
        name: "ADA".to_owned(),
        index: 0,
        cell: CellCoord::new(1, 0),
    }));

    let pushed = send(
        &mut room,
        r#"{"input":"client","session":"a","request":{"type":"move","dx":1,"dy":0}}"#,
    );
    assert_eq!(
        pushed.events,
        vec![
            Event::CrateMoved {
                crate_id: CrateId::new(0),
                from: CellCoord::new(2, 0),
                to: CellCoord::new(3, 0),
            },
            Event::PlayerMoved {
                session: SessionId::new("a"),
                name: "ADA".to_owned(),
                from: CellCoord::new(1, 0),
                to: CellCoord::new(2, 0),
            },
            Event::ButtonChanged {
                button: ButtonId::new("plate"),
                pressed: true,
            },
            Event::DoorChanged {
                door: DoorId::new("gate"),
                open: true,
            },
        ]
    );
}

#[test]
fn map_info_is_served_between_inputs() {
    let mut room = workshop();
    let _ = send(&mut room, r#"{"input":"join","session":"a"}"#);
    let _ = send(&mut room, r#"{"input":"join","session":"b","name":"bo"}"#);

    let batch = send(
        &mut room,
        r#"{"input":"client","session":"b","request":{"type":"getMapInfo"}}"#,
    );

    assert!(batch.events.is_empty());
    let snapshot = batch.snapshot.expect("snapshot");
    assert_eq!((snapshot.width, snapshot.height), (5, 2));
    assert_eq!(snapshot.grid[1], vec![3, 0, 2, 0, 2]);
    let names: Vec<_> = snapshot.players.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["ANONYMOUS", "BO"]);
    assert_eq!(snapshot, room.snapshot());
}

#[test]
fn fixture_interval_is_driven_by_ticks() {
    let mut room = Room::from_document(
        WORKSHOP,
        RoomConfig::new().with_laser_visibility(std::time::Duration::from_millis(100)),
    )
    .expect("valid level");
    let _ = send(&mut room, r#"{"input":"join","session":"a"}"#);

    let configured = send(
        &mut room,
        r#"{"input":"client","session":"a","request":{"type":"setLaserInterval","laser":"turret","ms":300}}"#,
    );
    assert_eq!(configured.events.len(), 1);

    let mut fired = Vec::new();
    for _ in 0..3 {
        fired.extend(send(&mut room, r#"{"input":"tick","ms":100}"#).events);
    }

    assert!(fired.contains(&Event::BoxesDestroyed {
        cells: vec![CellCoord::new(2, 1), CellCoord::new(4, 1)],
        color: capyvent_core::Color::default(),
    }));

    let next = send(&mut room, r#"{"input":"tick","ms":100}"#);
    assert!(next.events.contains(&Event::LaserSwitchedOff {
        source: BeamSource::Fixture(LaserId::new("turret")),
        origin: CellCoord::new(0, 1),
    }));
}

#[test]
fn takeover_keeps_name_cell_and_index() {
    let mut room = workshop();
    let _ = send(&mut room, r#"{"input":"join","session":"old","name":"ada"}"#);
    let _ = send(
        &mut room,
        r#"{"input":"client","session":"old","request":{"type":"moveDirection","direction":"left"}}"#,
    );

    let batch = send(
        &mut room,
        r#"{"input":"takeover","previous":"old","session":"new"}"#,
    );

    assert_eq!(
        batch.events,
        vec![
            Event::PlayerLeft {
                session: SessionId::new("old"),
                name: "ADA".to_owned(),
            },
            Event::PlayerJoined {
                session: SessionId::new("new"),
                name: "ADA".to_owned(),
                index: 0,
                cell: CellCoord::new(0, 0),
            },
        ]
    );
    let stale = room
        .process(RoomInput::Client {
            session: SessionId::new("old"),
            request: ClientRequest::GetMapInfo,
        })
        .expect("open room");
    assert!(stale.is_empty());
}

#[test]
fn batches_serialise_without_an_absent_snapshot() {
    let mut room = workshop();
    let batch = send(&mut room, r#"{"input":"tick","ms":250}"#);

    let json = serde_json::to_value(&batch).expect("serialise batch");
    assert!(json.get("snapshot").is_none());
    assert_eq!(json["events"].as_array().map(Vec::len), Some(1));
}

#[test]
fn clients_can_open_the_vent_under_the_capybara() {
    let mut room = Room::from_document(
        r#"{
            "width": 3, "height": 1, "layout": [0, 0, 0],
            "mechanics": [{ "type": "vent", "id": "exit", "position": { "x": 2, "y": 0 } }],
            "entities": { "players": [{ "x": 0, "y": 0 }], "capybara": { "x": 2, "y": 0 } }
        }"#,
        RoomConfig::new(),
    )
    .expect("valid level");
    let _ = send(&mut room, r#"{"input":"join","session":"a"}"#);

    let opened = send(
        &mut room,
        r#"{"input":"client","session":"a","request":{"type":"openVent","vent":0}}"#,
    );

    assert_eq!(
        opened.events,
        vec![
            Event::VentOpened {
                vent: VentId::new(0),
            },
            Event::CapybaraEscaped {
                vent: VentId::new(0),
                cell: CellCoord::new(2, 0),
            },
        ]
    );
}
