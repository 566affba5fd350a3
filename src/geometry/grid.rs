//! Index geometry of the Mesa Real: a 4-row by 8-column analytic grid over
//! slots 0..32 (row = i / 8, col = i % 8) plus the veredict zone 32..36.

use std::ops::Range;
use std::sync::OnceLock;

use crate::board::{Slot, SLOT_COUNT};

pub const ROWS: usize = 4;
pub const COLS: usize = 8;
pub const GRID_CELLS: usize = ROWS * COLS;

/// Corner cells: houses 1, 8, 25 and 32.
pub const FRAME: [Slot; 4] = [0, 7, 24, 31];

const KNIGHT_OFFSETS: [(isize, isize); 8] = [
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
];

/// Every pure relation of one grid cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellRelations {
    pub mirrors: Vec<Slot>,
    pub knight: Vec<Slot>,
    pub diagonals_up: Vec<Slot>,
    pub diagonals_down: Vec<Slot>,
}

static TABLE: OnceLock<Vec<CellRelations>> = OnceLock::new();

fn table() -> &'static [CellRelations] {
    TABLE.get_or_init(|| (0..GRID_CELLS).map(compute_cell).collect())
}

/// Cached relations for a grid cell; `None` outside the 4x8 grid.
pub fn cell(index: Slot) -> Option<&'static CellRelations> {
    table().get(index)
}

fn row_col(index: Slot) -> (isize, isize) {
    ((index / COLS) as isize, (index % COLS) as isize)
}

fn at(row: isize, col: isize) -> Option<Slot> {
    let in_bounds = (0..ROWS as isize).contains(&row) && (0..COLS as isize).contains(&col);
    in_bounds.then(|| row as usize * COLS + col as usize)
}

fn compute_cell(index: Slot) -> CellRelations {
    let (row, col) = row_col(index);
    let last_row = ROWS as isize - 1;
    let last_col = COLS as isize - 1;

    let mut mirrors = Vec::with_capacity(3);
    for m in [
        at(row, last_col - col),
        at(last_row - row, col),
        at(last_row - row, last_col - col),
    ]
    .into_iter()
    .flatten()
    {
        if m != index && !mirrors.contains(&m) {
            mirrors.push(m);
        }
    }

    let knight = KNIGHT_OFFSETS
        .iter()
        .filter_map(|(dr, dc)| at(row + dr, col + dc))
        .collect();

    CellRelations {
        mirrors,
        knight,
        diagonals_up: [at(row - 1, col - 1), at(row - 1, col + 1)].into_iter().flatten().collect(),
        diagonals_down: [at(row + 1, col - 1), at(row + 1, col + 1)].into_iter().flatten().collect(),
    }
}

/// The general-climate corners, independent of any selection.
pub fn frame() -> [Slot; 4] {
    FRAME
}

/// Same row, mirrored column.
pub fn horizontal_mirror(index: Slot) -> Option<Slot> {
    if index >= GRID_CELLS {
        return None;
    }
    let (row, col) = row_col(index);
    at(row, COLS as isize - 1 - col)
}

/// Horizontal, vertical and diagonal mirror images, excluding `index`.
pub fn mirrors(index: Slot) -> &'static [Slot] {
    cell(index).map(|c| c.mirrors.as_slice()).unwrap_or(&[])
}

pub fn knight_moves(index: Slot) -> &'static [Slot] {
    cell(index).map(|c| c.knight.as_slice()).unwrap_or(&[])
}

/// Cells at (row - 1, col +/- 1).
pub fn diagonals_above(index: Slot) -> &'static [Slot] {
    cell(index).map(|c| c.diagonals_up.as_slice()).unwrap_or(&[])
}

/// Cells at (row + 1, col +/- 1).
pub fn diagonals_below(index: Slot) -> &'static [Slot] {
    cell(index).map(|c| c.diagonals_down.as_slice()).unwrap_or(&[])
}

/// The synthesis cells outside the grid.
pub fn veredict_zone() -> Range<Slot> {
    GRID_CELLS..SLOT_COUNT
}

pub fn is_veredict(index: Slot) -> bool {
    veredict_zone().contains(&index)
}
