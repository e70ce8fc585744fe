//! Button to door wiring and pressure recomputation.
//!
//! Buttons reference doors by identifier only. Every recomputation resolves
//! the identifier through the door map again, so a dangling reference is
//! skipped instead of faulting.

use std::collections::BTreeMap;

use capyvent_core::{
    ButtonId, ButtonSnapshot, ButtonSpec, CellCoord, Color, DoorId, DoorSnapshot, DoorSpec, Event,
};
use tracing::debug;

#[derive(Clone, Debug)]
pub(crate) struct Door {
    color: Color,
    cell: CellCoord,
    open: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct Button {
    color: Color,
    cell: CellCoord,
    door: DoorId,
    pressed: bool,
}

/// Doors and the buttons wired to them.
#[derive(Debug, Default)]
pub(crate) struct Interactables {
    doors: BTreeMap<DoorId, Door>,
    buttons: BTreeMap<ButtonId, Button>,
}

impl Interactables {
    pub(crate) fn add_door(&mut self, spec: DoorSpec) {
        let _ = self.doors.insert(
            spec.id,
            Door {
                color: spec.color,
                cell: spec.cell,
                open: false,
            },
        );
    }

    pub(crate) fn add_button(&mut self, spec: ButtonSpec) {
        let _ = self.buttons.insert(
            spec.id,
            Button {
                color: spec.color,
                cell: spec.cell,
                door: spec.door,
                pressed: false,
            },
        );
    }

    /// Reports whether a closed door stands on `cell`.
    pub(crate) fn door_closed_at(&self, cell: CellCoord) -> bool {
        self.doors
            .values()
            .any(|door| door.cell == cell && !door.open)
    }

    /// Recomputes every button's pressure state and the doors wired to them.
    ///
    /// A door is open while any of its buttons is pressed. A door that should
    /// close stays open while `is_occupied` reports something standing in its
    /// cell, and closes on the first recomputation after the cell clears.
    /// Events are only emitted for actual changes.
    pub(crate) fn recompute_pressure<P, O>(
        &mut self,
        is_pressed: P,
        is_occupied: O,
        out_events: &mut Vec<Event>,
    ) where
        P: Fn(CellCoord) -> bool,
        O: Fn(CellCoord) -> bool,
    {
        let mut wanted: BTreeMap<DoorId, bool> = BTreeMap::new();

        for (id, button) in self.buttons.iter_mut() {
            let pressed = is_pressed(button.cell);
            if pressed != button.pressed {
                button.pressed = pressed;
                out_events.push(Event::ButtonChanged {
                    button: id.clone(),
                    pressed,
                });
            }
            let entry = wanted.entry(button.door.clone()).or_insert(false);
            *entry |= pressed;
        }

        for (door_id, any_pressed) in wanted {
            let Some(door) = self.doors.get_mut(&door_id) else {
                debug!(door = door_id.as_str(), "button wired to unknown door");
                continue;
            };
            let open = any_pressed || (door.open && is_occupied(door.cell));
            if open != door.open {
                door.open = open;
                out_events.push(Event::DoorChanged {
                    door: door_id,
                    open,
                });
            }
        }
    }

    pub(crate) fn door_snapshots(&self) -> Vec<DoorSnapshot> {
        self.doors
            .iter()
            .map(|(id, door)| DoorSnapshot {
                id: id.clone(),
                color: door.color.clone(),
                cell: door.cell,
                open: door.open,
            })
            .collect()
    }

    pub(crate) fn button_snapshots(&self) -> Vec<ButtonSnapshot> {
        self.buttons
            .iter()
            .map(|(id, button)| ButtonSnapshot {
                id: id.clone(),
                color: button.color.clone(),
                cell: button.cell,
                door: button.door.clone(),
                pressed: button.pressed,
            })
            .collect()
    }

    pub(crate) fn clear(&mut self) {
        self.doors.clear();
        self.buttons.clear();
    }
}
