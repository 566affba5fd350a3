//! The 36-slot board shared by both spread layouts, card ids and draws.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Physical slots on the board, regardless of layout.
pub const SLOT_COUNT: usize = 36;
/// Cards in the deck, numbered 1..=36.
pub const DECK_SIZE: u8 = 36;

pub type Slot = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct CardId(u8);

/// Board or card data that breaks the deck invariants.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("card id {0} outside 1..=36")]
    CardOutOfRange(u8),
    #[error("board has {0} slots, expected 36")]
    WrongLength(usize),
    #[error("card {0} appears more than once")]
    DuplicateCard(u8),
}

impl TryFrom<u8> for CardId {
    type Error = BoardError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        CardId::new(id).ok_or(BoardError::CardOutOfRange(id))
    }
}

impl From<CardId> for u8 {
    fn from(id: CardId) -> u8 {
        id.0
    }
}

impl CardId {
    pub fn new(id: u8) -> Option<Self> {
        (1..=DECK_SIZE).contains(&id).then_some(Self(id))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// The whole deck in id order.
    pub fn all() -> impl Iterator<Item = CardId> {
        (1..=DECK_SIZE).map(CardId)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Mesa Real: 4x8 analytic grid plus the 4-cell veredict zone.
    Grid,
    /// Relógio: 12 month positions around one center cell.
    Clock,
}

impl Layout {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "grid" | "mesa-real" | "mesa" => Some(Layout::Grid),
            "clock" | "relogio" | "relógio" => Some(Layout::Clock),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Layout::Grid => "grid",
            Layout::Clock => "clock",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Layout::Grid => "Mesa Real (36 casas)",
            Layout::Clock => "Tiragem em Relógio (12 meses/casas)",
        }
    }

    /// Slots that carry meaning in this layout.
    pub fn active_slots(&self) -> usize {
        match self {
            Layout::Grid => SLOT_COUNT,
            Layout::Clock => 13,
        }
    }

    pub fn contains(&self, slot: Slot) -> bool {
        slot < self.active_slots()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DrawError {
    #[error("cannot draw {requested} unique cards from a pool of {available}")]
    Exhausted { requested: usize, available: usize },
}

/// Draw `count` distinct card ids uniformly at random, never returning an
/// id listed in `exclude`.
pub fn draw_unique<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    exclude: &[CardId],
) -> Result<Vec<CardId>, DrawError> {
    let mut pool: Vec<CardId> = CardId::all().filter(|id| !exclude.contains(id)).collect();
    if pool.len() < count {
        return Err(DrawError::Exhausted {
            requested: count,
            available: pool.len(),
        });
    }
    pool.shuffle(rng);
    pool.truncate(count);
    Ok(pool)
}

/// Slot contents; `None` is an empty slot. Always exactly `SLOT_COUNT` long
/// with no card twice. Serialized as the plain slot array.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Option<u8>>", into = "Vec<Option<u8>>")]
pub struct Board {
    slots: Vec<Option<CardId>>,
}

impl TryFrom<Vec<Option<u8>>> for Board {
    type Error = BoardError;

    fn try_from(raw: Vec<Option<u8>>) -> Result<Self, Self::Error> {
        if raw.len() != SLOT_COUNT {
            return Err(BoardError::WrongLength(raw.len()));
        }
        let mut board = Board::empty();
        for (slot, id) in raw.into_iter().enumerate() {
            let Some(id) = id else { continue };
            let card = CardId::try_from(id)?;
            if board.position_of(card).is_some() {
                return Err(BoardError::DuplicateCard(id));
            }
            board.slots[slot] = Some(card);
        }
        Ok(board)
    }
}

impl From<Board> for Vec<Option<u8>> {
    fn from(board: Board) -> Self {
        board.slots.into_iter().map(|s| s.map(CardId::get)).collect()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl Board {
    pub fn empty() -> Self {
        Self {
            slots: vec![None; SLOT_COUNT],
        }
    }

    /// Lay `cards` out from slot 0; remaining slots stay empty and extra
    /// cards are ignored.
    pub fn from_cards<I: IntoIterator<Item = CardId>>(cards: I) -> Self {
        let mut board = Self::empty();
        for (slot, card) in cards.into_iter().take(SLOT_COUNT).enumerate() {
            board.slots[slot] = Some(card);
        }
        board
    }

    /// A fresh permutation of the full deck over all 36 slots.
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut ids: Vec<CardId> = CardId::all().collect();
        ids.shuffle(rng);
        Self::from_cards(ids)
    }

    pub fn get(&self, slot: Slot) -> Option<CardId> {
        self.slots.get(slot).copied().flatten()
    }

    pub fn slots(&self) -> &[Option<CardId>] {
        &self.slots
    }

    /// Cards in `range` slots, skipping empties.
    pub fn cards_in(&self, range: std::ops::Range<Slot>) -> Vec<CardId> {
        self.slots
            .get(range)
            .unwrap_or(&[])
            .iter()
            .flatten()
            .copied()
            .collect()
    }

    pub fn position_of(&self, card: CardId) -> Option<Slot> {
        self.slots.iter().position(|s| *s == Some(card))
    }

    pub fn first_occupied(&self) -> Option<Slot> {
        self.slots.iter().position(Option::is_some)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Place `card` at `slot`, vacating whatever slot held it before.
    /// Returns the slot that was vacated, if any. Out-of-range slots are
    /// ignored.
    pub fn assign(&mut self, slot: Slot, card: CardId) -> Option<Slot> {
        if slot >= SLOT_COUNT {
            return None;
        }
        let previous = self.position_of(card).filter(|&p| p != slot);
        if let Some(p) = previous {
            self.slots[p] = None;
        }
        self.slots[slot] = Some(card);
        previous
    }

    pub fn clear_slot(&mut self, slot: Slot) {
        if let Some(s) = self.slots.get_mut(slot) {
            *s = None;
        }
    }

    /// Keep only the first `len` slots, emptying the rest.
    pub fn truncated(&self, len: usize) -> Self {
        let mut board = self.clone();
        for s in board.slots.iter_mut().skip(len) {
            *s = None;
        }
        board
    }

    /// Hex sha256 over slot contents, for correlating logs with a layout.
    pub fn digest(&self) -> String {
        let bytes: Vec<u8> = self.slots.iter().map(|s| s.map(CardId::get).unwrap_or(0)).collect();
        hex::encode(Sha256::digest(&bytes))
    }
}
