//! Push-chain resolution for crates shoved by an actor or a direct command.
//!
//! A push is planned in full before anything moves: the forward scan collects
//! the contiguous run of crates, checks the cell beyond it, and only then are
//! the shifts applied from the far end inward.

use capyvent_core::{CellCoord, CrateId, Direction, Event};

use crate::registry::CrateRegistry;

/// Ordered run of crates starting at the pushed cell.
pub(crate) type PushChain = Vec<(CrateId, CellCoord)>;

/// Scans forward from `head` and returns the chain that would move, or `None`
/// when `head` holds no crate, the chain runs off the grid, or the cell beyond
/// the last crate cannot receive one.
pub(crate) fn collect_push_chain<F>(
    crates: &CrateRegistry,
    head: CellCoord,
    direction: Direction,
    columns: u32,
    rows: u32,
    can_receive: F,
) -> Option<PushChain>
where
    F: Fn(CellCoord) -> bool,
{
    let mut chain = PushChain::new();
    let mut cursor = head;
    let limit = u64::from(columns) * u64::from(rows);

    while let Some(crate_id) = crates.at(cursor) {
        if u64::try_from(chain.len()).unwrap_or(u64::MAX) >= limit {
            return None;
        }
        chain.push((crate_id, cursor));
        cursor = cursor.step(direction, columns, rows)?;
    }

    if chain.is_empty() || !can_receive(cursor) {
        return None;
    }
    Some(chain)
}

/// Shifts every crate of a planned chain one cell, far end first.
pub(crate) fn shift_chain(
    crates: &mut CrateRegistry,
    chain: &[(CrateId, CellCoord)],
    direction: Direction,
    columns: u32,
    rows: u32,
    out_events: &mut Vec<Event>,
) {
    for &(crate_id, from) in chain.iter().rev() {
        let Some(to) = from.step(direction, columns, rows) else {
            continue;
        };
        if crates.relocate(crate_id, to) {
            out_events.push(Event::CrateMoved { crate_id, from, to });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_of_crates(columns: &[u32]) -> CrateRegistry {
        let mut crates = CrateRegistry::default();
        for column in columns {
            let _ = crates.spawn(CellCoord::new(*column, 0));
        }
        crates
    }

    #[test]
    fn chain_collects_contiguous_crates_in_push_order() {
        let crates = row_of_crates(&[1, 2, 3, 5]);
        let chain = collect_push_chain(&crates, CellCoord::new(1, 0), Direction::East, 8, 1, |_| {
            true
        })
        .expect("chain");

        let cells: Vec<CellCoord> = chain.iter().map(|(_, cell)| *cell).collect();
        assert_eq!(
            cells,
            vec![
                CellCoord::new(1, 0),
                CellCoord::new(2, 0),
                CellCoord::new(3, 0)
            ]
        );
    }

    #[test]
    fn chain_against_grid_edge_is_refused() {
        let crates = row_of_crates(&[2, 3]);
        assert!(
            collect_push_chain(&crates, CellCoord::new(2, 0), Direction::East, 4, 1, |_| true)
                .is_none()
        );
    }

    #[test]
    fn blocked_terminal_cell_refuses_the_chain() {
        let crates = row_of_crates(&[1, 2]);
        let blocked = CellCoord::new(3, 0);
        assert!(collect_push_chain(
            &crates,
            CellCoord::new(1, 0),
            Direction::East,
            8,
            1,
            |cell| cell != blocked
        )
        .is_none());
    }

    #[test]
    fn shifting_moves_far_end_first() {
        let mut crates = row_of_crates(&[1, 2]);
        let chain = collect_push_chain(&crates, CellCoord::new(1, 0), Direction::East, 8, 1, |_| {
            true
        })
        .expect("chain");
        let mut events = Vec::new();

        shift_chain(&mut crates, &chain, Direction::East, 8, 1, &mut events);

        assert_eq!(
            events,
            vec![
                Event::CrateMoved {
                    crate_id: CrateId::new(1),
                    from: CellCoord::new(2, 0),
                    to: CellCoord::new(3, 0),
                },
                Event::CrateMoved {
                    crate_id: CrateId::new(0),
                    from: CellCoord::new(1, 0),
                    to: CellCoord::new(2, 0),
                },
            ]
        );
        assert!(!crates.contains_cell(CellCoord::new(1, 0)));
    }
}
