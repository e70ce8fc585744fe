//! Breadth-first route search used to guide the capybara toward a vent.

use std::collections::VecDeque;

use capyvent_core::{CellCoord, Direction};

/// Expansion order shared by every search so routes are deterministic.
const EXPANSION_ORDER: [Direction; 4] = [
    Direction::South,
    Direction::North,
    Direction::East,
    Direction::West,
];

/// Shortest path from `start` to the first goal cell reached.
///
/// The returned path includes both `start` and the goal. A start that is
/// already a goal yields a single-cell path. `None` means no goal is
/// reachable, which is an ordinary outcome rather than a failure. A goal cell
/// only counts once it is traversable itself.
pub(crate) fn shortest_path<G, T>(
    start: CellCoord,
    width: u32,
    height: u32,
    is_goal: G,
    is_traversable: T,
) -> Option<Vec<CellCoord>>
where
    G: Fn(CellCoord) -> bool,
    T: Fn(CellCoord) -> bool,
{
    let width_usize = usize::try_from(width).ok()?;
    let height_usize = usize::try_from(height).ok()?;
    let cell_count = width_usize.checked_mul(height_usize)?;
    if start.column() >= width || start.row() >= height {
        return None;
    }
    let start_index = index(width_usize, start)?;
    if is_goal(start) {
        return Some(vec![start]);
    }

    let mut parents: Vec<Option<usize>> = vec![None; cell_count];
    let mut visited = vec![false; cell_count];
    visited[start_index] = true;

    let mut queue = VecDeque::new();
    queue.push_back(start);

    while let Some(cell) = queue.pop_front() {
        let Some(current_index) = index(width_usize, cell) else {
            continue;
        };

        for direction in EXPANSION_ORDER {
            let Some(neighbor) = cell.step(direction, width, height) else {
                continue;
            };
            let Some(neighbor_index) = index(width_usize, neighbor) else {
                continue;
            };
            if visited[neighbor_index] {
                continue;
            }

            if !is_traversable(neighbor) {
                continue;
            }
            if is_goal(neighbor) {
                parents[neighbor_index] = Some(current_index);
                return Some(reconstruct(&parents, width_usize, neighbor_index));
            }

            visited[neighbor_index] = true;
            parents[neighbor_index] = Some(current_index);
            queue.push_back(neighbor);
        }
    }

    None
}

fn reconstruct(parents: &[Option<usize>], width: usize, goal: usize) -> Vec<CellCoord> {
    let mut path = Vec::new();
    let mut cursor = Some(goal);
    while let Some(offset) = cursor {
        path.push(coord(width, offset));
        cursor = parents.get(offset).copied().flatten();
    }
    path.reverse();
    path
}

fn coord(width: usize, offset: usize) -> CellCoord {
    let column = u32::try_from(offset % width).unwrap_or(u32::MAX);
    let row = u32::try_from(offset / width).unwrap_or(u32::MAX);
    CellCoord::new(column, row)
}

fn index(width: usize, cell: CellCoord) -> Option<usize> {
    let column = usize::try_from(cell.column()).ok()?;
    let row = usize::try_from(cell.row()).ok()?;
    row.checked_mul(width)?.checked_add(column)
}
