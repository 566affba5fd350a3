//! Relations that depend on what the board holds, not only on indices.

use crate::board::{Board, CardId, Slot, SLOT_COUNT};

/// The card that "owns" house `index + 1` under the bridge technique.
///
/// House numbers and card ids share the 1..=36 numbering, so the owner of
/// house n is card n.
pub fn house_owner(index: Slot) -> Option<CardId> {
    if index >= SLOT_COUNT {
        return None;
    }
    CardId::new(index as u8 + 1)
}

/// Slot currently holding the owner card of the house at `index`.
pub fn bridge_target(index: Slot, board: &Board) -> Option<Slot> {
    house_owner(index).and_then(|owner| board.position_of(owner))
}
