//! Everything a reading session knows: board, draws, selection, filters,
//! study topic and narration. Hashed after each event for the logs.

use serde::{Deserialize, Serialize};

use crate::board::{Board, Layout, Slot};
use crate::interpret::{ReadingTheme, StudyLevel};
use crate::study::StudyTopic;

use super::filters::FilterSet;

/// Slots captured by each clock draw (12 months + center).
pub const CLOCK_DRAW_SLOTS: usize = 13;

/// Both clock draws, kept so the reader can flip between them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DrawHistory {
    /// Slots 0..13 of the board as it was before the second draw.
    pub first: Board,
    pub second: Board,
    pub viewing_first: bool,
}

impl DrawHistory {
    /// The snapshot currently on display.
    pub fn visible(&self) -> &Board {
        if self.viewing_first {
            &self.first
        } else {
            &self.second
        }
    }
}

/// An outstanding narrator request. Responses carrying any other id are
/// stale and get dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PendingNarration {
    pub request_id: u64,
    pub slot: Slot,
    pub layout: Layout,
}

/// The whole reading on the table, plus how the reader is looking at it.
#[derive(Debug, Clone, Serialize)]
pub struct ReadingState {
    pub layout: Layout,
    /// Editor mode: cards are placed by hand instead of drawn.
    pub manual: bool,

    /// Live board
    pub board: Board,
    pub history: Option<DrawHistory>,

    pub selected: Option<Slot>,
    pub filters: FilterSet,
    pub study: Option<StudyTopic>,

    pub theme: ReadingTheme,
    pub level: StudyLevel,

    /// Narrator text for the current selection
    pub analysis: Option<String>,
    pub pending: Option<PendingNarration>,

    /// Events applied so far
    pub seq: u64,
    pub next_request_id: u64,
}

impl ReadingState {
    /// Empty board, nothing selected. The session fills the board on start.
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            manual: false,
            board: Board::empty(),
            history: None,
            selected: None,
            filters: FilterSet::default(),
            study: None,
            theme: ReadingTheme::default(),
            level: StudyLevel::default(),
            analysis: None,
            pending: None,
            seq: 0,
            next_request_id: 1,
        }
    }

    pub fn is_viewing_first_draw(&self) -> bool {
        self.history.as_ref().map_or(false, |h| h.viewing_first)
    }

    /// Drop the analysis text and forget any outstanding narration.
    pub fn reset_analysis(&mut self) {
        self.analysis = None;
        self.pending = None;
    }

    /// Fingerprint of the reading, logged with every applied event so two
    /// seeded sessions can be compared line by line.
    pub fn hash(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut h = DefaultHasher::new();

        self.seq.hash(&mut h);
        self.layout.hash(&mut h);
        self.manual.hash(&mut h);

        self.board.hash(&mut h);
        self.history.hash(&mut h);

        self.selected.hash(&mut h);
        self.filters.hash(&mut h);
        self.study.hash(&mut h);
        self.theme.hash(&mut h);
        self.level.hash(&mut h);

        self.analysis.hash(&mut h);
        self.pending.hash(&mut h);
        self.next_request_id.hash(&mut h);

        h.finish()
    }
}
