//! Per-slot highlight classification.
//!
//! Each slot gets at most one tag. When several relations apply, the first
//! match in this order wins:
//!
//! 1. grid layout, driven by the active study topic or else the filter set:
//!    frame, veredict, bridge, knight, mirror, diagonal-up, diagonal-down
//! 2. clock layout in study mode: center, house (axis), opposition (axis)
//! 3. clock layout outside study mode: center, opposition of the selection
//! 4. theme significator, only while every filter is shown

use serde::Serialize;

use crate::board::{Layout, Slot};
use crate::catalog::CLOCK_CENTER_SLOT;
use crate::geometry::{self, grid, relations};
use crate::interpret::{is_significator, ReadingTheme};
use crate::study::StudyTopic;

use super::filters::{FilterSet, GeometryFilter};
use super::state::ReadingState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Highlight {
    #[serde(rename = "mirror")]
    Mirror,
    #[serde(rename = "knight")]
    Knight,
    #[serde(rename = "frame")]
    Frame,
    #[serde(rename = "axis")]
    Axis,
    #[serde(rename = "bridge")]
    Bridge,
    #[serde(rename = "veredict")]
    Veredict,
    #[serde(rename = "diag-up")]
    DiagonalUp,
    #[serde(rename = "diag-down")]
    DiagonalDown,
    #[serde(rename = "center")]
    Center,
    #[serde(rename = "theme")]
    Theme,
    #[serde(rename = "none")]
    None,
}

impl Highlight {
    pub fn as_str(&self) -> &'static str {
        match self {
            Highlight::Mirror => "mirror",
            Highlight::Knight => "knight",
            Highlight::Frame => "frame",
            Highlight::Axis => "axis",
            Highlight::Bridge => "bridge",
            Highlight::Veredict => "veredict",
            Highlight::DiagonalUp => "diag-up",
            Highlight::DiagonalDown => "diag-down",
            Highlight::Center => "center",
            Highlight::Theme => "theme",
            Highlight::None => "none",
        }
    }
}

/// Which grid relations are switched on.
#[derive(Debug, Clone, Copy, Default)]
struct GridRelations {
    frame: bool,
    veredict: bool,
    bridge: bool,
    knight: bool,
    mirror: bool,
    diag_up: bool,
    diag_down: bool,
}

impl GridRelations {
    fn from_filters(filters: &FilterSet) -> Self {
        let diagonals = filters.shows(GeometryFilter::Diagonals);
        Self {
            frame: filters.shows(GeometryFilter::Frame),
            veredict: filters.shows(GeometryFilter::Veredict),
            bridge: filters.shows(GeometryFilter::Bridge),
            knight: filters.shows(GeometryFilter::Knight),
            mirror: filters.shows(GeometryFilter::Mirror),
            diag_up: diagonals,
            diag_down: diagonals,
        }
    }

    fn from_topic(topic: StudyTopic) -> Self {
        let mut rel = Self::default();
        match topic {
            StudyTopic::Frame => rel.frame = true,
            StudyTopic::Veredict => rel.veredict = true,
            StudyTopic::Bridge => rel.bridge = true,
            StudyTopic::Knight => rel.knight = true,
            StudyTopic::Mirror => rel.mirror = true,
            StudyTopic::DiagonalsUp => rel.diag_up = true,
            StudyTopic::DiagonalsDown => rel.diag_down = true,
            StudyTopic::Diagonals => {
                rel.diag_up = true;
                rel.diag_down = true;
            }
            _ => {}
        }
        rel
    }
}

fn grid_highlight(state: &ReadingState, slot: Slot) -> Option<Highlight> {
    let rel = match state.study {
        Some(topic) => GridRelations::from_topic(topic),
        None => GridRelations::from_filters(&state.filters),
    };

    if rel.frame && grid::frame().contains(&slot) {
        return Some(Highlight::Frame);
    }
    if rel.veredict && grid::is_veredict(slot) {
        return Some(Highlight::Veredict);
    }
    let selected = state.selected?;
    if rel.bridge && relations::bridge_target(selected, &state.board) == Some(slot) {
        return Some(Highlight::Bridge);
    }
    if rel.knight && grid::knight_moves(selected).contains(&slot) {
        return Some(Highlight::Knight);
    }
    if rel.mirror && grid::mirrors(selected).contains(&slot) {
        return Some(Highlight::Mirror);
    }
    if rel.diag_up && grid::diagonals_above(selected).contains(&slot) {
        return Some(Highlight::DiagonalUp);
    }
    if rel.diag_down && grid::diagonals_below(selected).contains(&slot) {
        return Some(Highlight::DiagonalDown);
    }
    None
}

fn clock_highlight(state: &ReadingState, slot: Slot) -> Option<Highlight> {
    // The center has no opposite, so opposition is only ever asked about
    // month slots.
    let opposite = || {
        state
            .selected
            .filter(|&s| s != CLOCK_CENTER_SLOT)
            .and_then(geometry::opposition)
    };

    match state.study {
        Some(StudyTopic::ClockCenter) if slot == CLOCK_CENTER_SLOT => Some(Highlight::Center),
        Some(StudyTopic::ClockHouse) if slot < CLOCK_CENTER_SLOT => Some(Highlight::Axis),
        Some(StudyTopic::ClockOpposition) if opposite() == Some(slot) => Some(Highlight::Axis),
        Some(_) => None,
        None if slot == CLOCK_CENTER_SLOT => Some(Highlight::Center),
        None if opposite() == Some(slot) => Some(Highlight::Axis),
        None => None,
    }
}

fn theme_highlight(state: &ReadingState, slot: Slot) -> Option<Highlight> {
    let applies = state.filters.is_all()
        && state.theme != ReadingTheme::General
        && is_significator(state.theme, state.board.get(slot));
    applies.then_some(Highlight::Theme)
}

/// Highlight tag for `slot` given the selection, filters, study topic and
/// theme in `state`.
pub fn highlight_for(state: &ReadingState, slot: Slot) -> Highlight {
    if !state.layout.contains(slot) {
        return Highlight::None;
    }
    let relation = match state.layout {
        Layout::Grid => grid_highlight(state, slot),
        Layout::Clock => clock_highlight(state, slot),
    };
    relation
        .or_else(|| theme_highlight(state, slot))
        .unwrap_or(Highlight::None)
}

/// Tags for every active slot of the layout, in slot order.
pub fn highlight_map(state: &ReadingState) -> Vec<Highlight> {
    (0..state.layout.active_slots())
        .map(|slot| highlight_for(state, slot))
        .collect()
}
