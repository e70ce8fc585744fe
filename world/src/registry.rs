//! Position-indexed collections for crates, vents and the capybara.

use std::collections::BTreeMap;

use capyvent_core::{CapybaraState, CellCoord, CrateId, VentId};

/// Crates keyed by identifier with a reverse cell index.
///
/// The two maps are updated together so at most one crate ever occupies a
/// cell. Identifiers are the lowest unused value and are reused after a crate
/// is removed.
#[derive(Debug, Default)]
pub(crate) struct CrateRegistry {
    entries: BTreeMap<CrateId, CellCoord>,
    by_cell: BTreeMap<CellCoord, CrateId>,
}

impl CrateRegistry {
    /// Places a crate, refusing cells that already hold one.
    pub(crate) fn spawn(&mut self, cell: CellCoord) -> Option<CrateId> {
        if self.by_cell.contains_key(&cell) {
            return None;
        }

        let mut value = 0;
        while self.entries.contains_key(&CrateId::new(value)) {
            value += 1;
        }
        let crate_id = CrateId::new(value);
        let _ = self.entries.insert(crate_id, cell);
        let _ = self.by_cell.insert(cell, crate_id);
        Some(crate_id)
    }

    pub(crate) fn remove_at(&mut self, cell: CellCoord) -> Option<CrateId> {
        let crate_id = self.by_cell.remove(&cell)?;
        let _ = self.entries.remove(&crate_id);
        Some(crate_id)
    }

    pub(crate) fn at(&self, cell: CellCoord) -> Option<CrateId> {
        self.by_cell.get(&cell).copied()
    }

    pub(crate) fn contains_cell(&self, cell: CellCoord) -> bool {
        self.by_cell.contains_key(&cell)
    }

    pub(crate) fn cell_of(&self, crate_id: CrateId) -> Option<CellCoord> {
        self.entries.get(&crate_id).copied()
    }

    /// Moves a crate onto an empty cell. Returns `false` without side effects
    /// when the crate is unknown or the destination is taken.
    pub(crate) fn relocate(&mut self, crate_id: CrateId, to: CellCoord) -> bool {
        if self.by_cell.contains_key(&to) {
            return false;
        }
        let Some(slot) = self.entries.get_mut(&crate_id) else {
            return false;
        };
        let from = std::mem::replace(slot, to);
        let _ = self.by_cell.remove(&from);
        let _ = self.by_cell.insert(to, crate_id);
        true
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (CrateId, CellCoord)> + '_ {
        self.entries.iter().map(|(id, cell)| (*id, *cell))
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.by_cell.clear();
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Vent {
    pub(crate) id: VentId,
    pub(crate) cell: CellCoord,
    pub(crate) open: bool,
}

/// Vents keyed by sequentially allocated identifiers.
#[derive(Debug, Default)]
pub(crate) struct VentRegistry {
    entries: BTreeMap<VentId, Vent>,
    next_id: u32,
}

impl VentRegistry {
    pub(crate) fn spawn(&mut self, cell: CellCoord, open: bool) -> VentId {
        let id = VentId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        let _ = self.entries.insert(id, Vent { id, cell, open });
        id
    }

    /// Opens the vent, reporting whether its state changed.
    pub(crate) fn open(&mut self, id: VentId) -> bool {
        match self.entries.get_mut(&id) {
            Some(vent) if !vent.open => {
                vent.open = true;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn at(&self, cell: CellCoord) -> Option<&Vent> {
        self.entries.values().find(|vent| vent.cell == cell)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Vent> {
        self.entries.values()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.next_id = 0;
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Capybara {
    pub(crate) cell: CellCoord,
    pub(crate) state: CapybaraState,
}

impl Capybara {
    pub(crate) fn new(cell: CellCoord) -> Self {
        Self {
            cell,
            state: CapybaraState::Idle,
        }
    }
}
