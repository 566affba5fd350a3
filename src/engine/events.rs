//! Events accepted by the reducer and the commands it emits.

use serde::Serialize;

use crate::board::{Board, CardId, Layout, Slot};
use crate::interpret::{InterpretationContext, ReadingTheme, StudyLevel};
use crate::study::{StudyBalloon, StudyTopic};

use super::filters::GeometryFilter;

/// Everything that can change a reading.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Fresh permutation of the full deck.
    Shuffle,
    /// Clock ritual: redraw the 13 clock slots from cards the first draw
    /// did not use.
    DrawSecond,
    /// Flip the visible board between the two clock draws.
    ToggleDrawHistory,
    Clear,
    AssignManual { slot: Slot, card: CardId },
    Select { slot: Slot },
    Deselect,
    /// Switch layouts. Choosing the current one changes nothing.
    SetLayout(Layout),
    /// Put a saved board back on the table.
    Restore { layout: Layout, board: Box<Board> },
    SetManualMode(bool),
    ToggleFilter(GeometryFilter),
    SetTheme(ReadingTheme),
    SetLevel(StudyLevel),
    EnterStudy(StudyTopic),
    ExitStudy,
    /// Show a random tip balloon for the current layout.
    ShowTip,
    RequestNarration,
    NarrationResolved { request_id: u64, text: String },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Shuffle => "shuffle",
            Event::DrawSecond => "draw_second",
            Event::ToggleDrawHistory => "toggle_draw_history",
            Event::Clear => "clear",
            Event::AssignManual { .. } => "assign_manual",
            Event::Select { .. } => "select",
            Event::Deselect => "deselect",
            Event::SetLayout(_) => "set_layout",
            Event::Restore { .. } => "restore",
            Event::SetManualMode(_) => "set_manual_mode",
            Event::ToggleFilter(_) => "toggle_filter",
            Event::SetTheme(_) => "set_theme",
            Event::SetLevel(_) => "set_level",
            Event::EnterStudy(_) => "enter_study",
            Event::ExitStudy => "exit_study",
            Event::ShowTip => "show_tip",
            Event::RequestNarration => "request_narration",
            Event::NarrationResolved { .. } => "narration_resolved",
        }
    }
}

/// Side effects requested by the reducer. The session (or the CLI on top
/// of it) carries them out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Manual mode: ask the user which card goes in `slot`.
    OpenCardPicker { slot: Slot },
    Narrate {
        request_id: u64,
        context: Box<InterpretationContext>,
    },
    ShowBalloon(&'static StudyBalloon),
    Rejected { reason: &'static str },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::OpenCardPicker { .. } => "open_card_picker",
            Command::Narrate { .. } => "narrate",
            Command::ShowBalloon(_) => "show_balloon",
            Command::Rejected { .. } => "rejected",
        }
    }
}
