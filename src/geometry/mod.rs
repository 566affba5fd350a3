//! Structural relations between board slots.
//!
//! Two capability groups:
//! - [`grid`] and [`clock`]: pure index geometry. Results depend only on the
//!   slot index and are cached per layout.
//! - [`relations`]: relations that read board contents and must be
//!   recomputed after every board mutation.
//!
//! Every query fails closed: an index outside the layout's valid range
//! yields an empty set or `None`.

pub mod clock;
pub mod grid;
pub mod relations;

pub use clock::{axis, opposition, AxisKind, ClockAxis};
pub use grid::{
    diagonals_above, diagonals_below, frame, horizontal_mirror, is_veredict, knight_moves, mirrors,
    veredict_zone,
};
pub use relations::bridge_target;
