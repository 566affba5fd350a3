//! Reading reducer: (ReadingState, Event) -> (ReadingState, Vec<Command>)
//!
//! All state transitions of a reading happen here. Randomness comes in
//! through the `rng` argument so a seeded generator replays a session
//! exactly.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::board::{draw_unique, Board, Layout};
use crate::catalog::CLOCK_CENTER_SLOT;
use crate::interpret::build_context;
use crate::narrator::EMPTY_SELECTION;
use crate::study::{balloon_for, balloons, StudyTopic};

use super::events::{Command, Event};
use super::state::{DrawHistory, PendingNarration, ReadingState, CLOCK_DRAW_SLOTS};

/// Commands an event produced and the state fingerprint after it.
#[derive(Debug)]
pub struct ReducerOutput {
    pub commands: Vec<Command>,
    pub state_hash: u64,
}

/// Apply one reader action to the state.
pub fn reduce<R: Rng + ?Sized>(state: &mut ReadingState, event: Event, rng: &mut R) -> ReducerOutput {
    let mut commands = Vec::new();
    state.seq += 1;

    match event {
        Event::Shuffle => {
            state.board = Board::shuffled(rng);
            state.history = None;
            state.selected = None;
            state.reset_analysis();
        }

        Event::DrawSecond => draw_second(state, rng, &mut commands),

        Event::ToggleDrawHistory => match state.history.as_mut() {
            Some(history) => {
                history.viewing_first = !history.viewing_first;
                state.board = history.visible().clone();
                state.selected = None;
                state.reset_analysis();
            }
            None => reject(&mut commands, "no second draw to toggle"),
        },

        Event::Clear => {
            state.board = Board::empty();
            state.history = None;
            state.selected = None;
            state.reset_analysis();
        }

        Event::AssignManual { slot, card } => {
            if !state.manual {
                reject(&mut commands, "manual mode is off");
            } else if !state.layout.contains(slot) {
                reject(&mut commands, "slot outside layout");
            } else {
                state.board.assign(slot, card);
                state.reset_analysis();
            }
        }

        Event::Select { slot } => {
            if !state.layout.contains(slot) {
                reject(&mut commands, "slot outside layout");
            } else {
                state.selected = Some(slot);
                state.reset_analysis();
                if state.manual {
                    commands.push(Command::OpenCardPicker { slot });
                }
            }
        }

        Event::Deselect => {
            state.selected = None;
            state.reset_analysis();
        }

        Event::SetLayout(layout) => {
            if layout != state.layout {
                state.layout = layout;
                if state.study.map_or(false, |t| t.target() != layout) {
                    state.study = None;
                }
                reinitialize(state, rng);
            }
        }

        Event::Restore { layout, board } => {
            state.layout = layout;
            if state.study.map_or(false, |t| t.target() != layout) {
                state.study = None;
            }
            state.board = *board;
            state.history = None;
            state.selected = None;
            state.reset_analysis();
        }

        Event::SetManualMode(manual) => {
            state.manual = manual;
            reinitialize(state, rng);
        }

        Event::ToggleFilter(filter) => state.filters.toggle(filter),

        Event::SetTheme(theme) => state.theme = theme,

        Event::SetLevel(level) => state.level = level,

        Event::EnterStudy(topic) => enter_study(state, topic, rng, &mut commands),

        Event::ExitStudy => state.study = None,

        Event::ShowTip => match balloons(state.layout).choose(rng) {
            Some(balloon) => commands.push(Command::ShowBalloon(balloon)),
            None => reject(&mut commands, "no tips for this layout"),
        },

        Event::RequestNarration => request_narration(state, &mut commands),

        Event::NarrationResolved { request_id, text } => {
            let current = state
                .pending
                .as_ref()
                .map_or(false, |p| p.request_id == request_id);
            if current {
                state.analysis = Some(text);
                state.pending = None;
            } else {
                reject(&mut commands, "stale narration discarded");
            }
        }
    }

    ReducerOutput {
        commands,
        state_hash: state.hash(),
    }
}

fn reject(commands: &mut Vec<Command>, reason: &'static str) {
    commands.push(Command::Rejected { reason });
}

/// Layout or mode change: fresh board for the new context.
fn reinitialize<R: Rng + ?Sized>(state: &mut ReadingState, rng: &mut R) {
    state.board = if state.manual {
        Board::empty()
    } else {
        Board::shuffled(rng)
    };
    state.history = None;
    state.selected = None;
    state.reset_analysis();
}

fn draw_second<R: Rng + ?Sized>(state: &mut ReadingState, rng: &mut R, commands: &mut Vec<Command>) {
    if state.layout != Layout::Clock {
        return reject(commands, "second draw needs the clock layout");
    }

    // Redrawing keeps the original first draw; only the second is replaced.
    let first = match &state.history {
        Some(history) => history.first.clone(),
        None => {
            let months_filled = (0..CLOCK_CENTER_SLOT).all(|s| state.board.get(s).is_some());
            if !months_filled {
                return reject(commands, "first draw incomplete");
            }
            state.board.truncated(CLOCK_DRAW_SLOTS)
        }
    };

    let used = first.cards_in(0..CLOCK_DRAW_SLOTS);
    let drawn = match draw_unique(rng, CLOCK_DRAW_SLOTS, &used) {
        Ok(drawn) => drawn,
        Err(_) => return reject(commands, "not enough unused cards"),
    };

    let second = Board::from_cards(drawn);
    state.board = second.clone();
    state.history = Some(DrawHistory {
        first,
        second,
        viewing_first: false,
    });
    state.selected = None;
    state.reset_analysis();
}

fn enter_study<R: Rng + ?Sized>(
    state: &mut ReadingState,
    topic: StudyTopic,
    rng: &mut R,
    commands: &mut Vec<Command>,
) {
    let target = topic.target();
    if state.layout != target {
        state.layout = target;
        reinitialize(state, rng);
    }
    state.study = Some(topic);

    if topic.is_global() {
        state.selected = None;
        state.reset_analysis();
    } else if state.selected.is_none() {
        state.selected = state.board.first_occupied().filter(|&s| target.contains(s));
    }

    if let Some(balloon) = balloon_for(topic) {
        commands.push(Command::ShowBalloon(balloon));
    }
}

fn request_narration(state: &mut ReadingState, commands: &mut Vec<Command>) {
    let Some(slot) = state.selected else {
        return reject(commands, "no slot selected");
    };
    if state.pending.is_some() {
        return reject(commands, "narration already pending");
    }
    if state.board.get(slot).is_none() {
        state.analysis = Some(EMPTY_SELECTION.to_string());
        return;
    }
    let Some(context) = build_context(&state.board, slot, state.layout, state.theme, state.level) else {
        return reject(commands, "slot outside layout");
    };

    let request_id = state.next_request_id;
    state.next_request_id += 1;
    state.analysis = None;
    state.pending = Some(PendingNarration {
        request_id,
        slot,
        layout: state.layout,
    });
    commands.push(Command::Narrate {
        request_id,
        context: Box::new(context),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::CardId;
    use crate::engine::filters::GeometryFilter;
    use crate::interpret::ReadingTheme;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn id(n: u8) -> CardId {
        CardId::new(n).unwrap()
    }

    fn started(layout: Layout) -> (ReadingState, StdRng) {
        let mut rng = StdRng::seed_from_u64(42);
        let mut state = ReadingState::new(layout);
        reduce(&mut state, Event::Shuffle, &mut rng);
        (state, rng)
    }

    fn rejected(out: &ReducerOutput) -> Option<&'static str> {
        out.commands.iter().find_map(|c| match c {
            Command::Rejected { reason } => Some(*reason),
            _ => None,
        })
    }

    #[test]
    fn test_shuffle_resets_selection_and_analysis() {
        let (mut state, mut rng) = started(Layout::Grid);
        reduce(&mut state, Event::Select { slot: 4 }, &mut rng);
        state.analysis = Some("texto".into());
        let before = state.seq;
        reduce(&mut state, Event::Shuffle, &mut rng);
        assert_eq!(state.seq, before + 1);
        assert!(state.selected.is_none());
        assert!(state.analysis.is_none());
        let ids: HashSet<_> = state.board.slots().iter().flatten().collect();
        assert_eq!(ids.len(), 36);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (mut state, mut rng) = started(Layout::Grid);
        reduce(&mut state, Event::Clear, &mut rng);
        let once = state.board.clone();
        reduce(&mut state, Event::Clear, &mut rng);
        assert_eq!(state.board, once);
        assert!(state.board.is_empty());
        assert!(state.history.is_none());
    }

    #[test]
    fn test_second_draw_requires_clock() {
        let (mut state, mut rng) = started(Layout::Grid);
        let out = reduce(&mut state, Event::DrawSecond, &mut rng);
        assert_eq!(rejected(&out), Some("second draw needs the clock layout"));
        assert!(state.history.is_none());
    }

    #[test]
    fn test_second_draw_requires_first() {
        let (mut state, mut rng) = started(Layout::Clock);
        reduce(&mut state, Event::Clear, &mut rng);
        let out = reduce(&mut state, Event::DrawSecond, &mut rng);
        assert_eq!(rejected(&out), Some("first draw incomplete"));
    }

    #[test]
    fn test_second_draw_disjoint_from_first() {
        let (mut state, mut rng) = started(Layout::Clock);
        let first: HashSet<_> = state.board.cards_in(0..13).into_iter().collect();
        let out = reduce(&mut state, Event::DrawSecond, &mut rng);
        assert!(rejected(&out).is_none());

        let second = state.board.cards_in(0..36);
        assert_eq!(second.len(), 13);
        assert!(second.iter().all(|c| !first.contains(c)));
        assert!(state.board.cards_in(13..36).is_empty());

        let history = state.history.as_ref().unwrap();
        let snapshot: HashSet<_> = history.first.cards_in(0..36).into_iter().collect();
        assert_eq!(snapshot, first);
    }

    #[test]
    fn test_redraw_keeps_original_first() {
        let (mut state, mut rng) = started(Layout::Clock);
        reduce(&mut state, Event::DrawSecond, &mut rng);
        let first = state.history.as_ref().unwrap().first.clone();
        reduce(&mut state, Event::DrawSecond, &mut rng);
        let history = state.history.as_ref().unwrap();
        assert_eq!(history.first, first);
        let used: HashSet<_> = first.cards_in(0..13).into_iter().collect();
        assert!(history.second.cards_in(0..13).iter().all(|c| !used.contains(c)));
    }

    #[test]
    fn test_toggle_history_does_not_mutate_snapshots() {
        let (mut state, mut rng) = started(Layout::Clock);
        reduce(&mut state, Event::DrawSecond, &mut rng);
        let saved = state.history.clone().unwrap();
        reduce(&mut state, Event::Select { slot: 2 }, &mut rng);

        reduce(&mut state, Event::ToggleDrawHistory, &mut rng);
        assert!(state.is_viewing_first_draw());
        assert_eq!(state.board, saved.first);
        assert!(state.selected.is_none());

        reduce(&mut state, Event::ToggleDrawHistory, &mut rng);
        assert!(!state.is_viewing_first_draw());
        assert_eq!(state.board, saved.second);
        let history = state.history.as_ref().unwrap();
        assert_eq!(history.first, saved.first);
        assert_eq!(history.second, saved.second);
    }

    #[test]
    fn test_toggle_without_history_rejected() {
        let (mut state, mut rng) = started(Layout::Clock);
        let out = reduce(&mut state, Event::ToggleDrawHistory, &mut rng);
        assert_eq!(rejected(&out), Some("no second draw to toggle"));
    }

    #[test]
    fn test_manual_mode_clears_board_and_opens_picker() {
        let (mut state, mut rng) = started(Layout::Grid);
        reduce(&mut state, Event::SetManualMode(true), &mut rng);
        assert!(state.board.is_empty());
        let out = reduce(&mut state, Event::Select { slot: 5 }, &mut rng);
        assert_eq!(out.commands, vec![Command::OpenCardPicker { slot: 5 }]);
    }

    #[test]
    fn test_assign_manual_keeps_ids_unique() {
        let (mut state, mut rng) = started(Layout::Grid);
        reduce(&mut state, Event::SetManualMode(true), &mut rng);
        reduce(&mut state, Event::AssignManual { slot: 20, card: id(9) }, &mut rng);
        reduce(&mut state, Event::AssignManual { slot: 2, card: id(9) }, &mut rng);
        assert_eq!(state.board.get(20), None);
        assert_eq!(state.board.get(2), Some(id(9)));
    }

    #[test]
    fn test_assign_manual_rejected_outside_manual_or_layout() {
        let (mut state, mut rng) = started(Layout::Clock);
        let out = reduce(&mut state, Event::AssignManual { slot: 2, card: id(9) }, &mut rng);
        assert_eq!(rejected(&out), Some("manual mode is off"));
        reduce(&mut state, Event::SetManualMode(true), &mut rng);
        let out = reduce(&mut state, Event::AssignManual { slot: 20, card: id(9) }, &mut rng);
        assert_eq!(rejected(&out), Some("slot outside layout"));
        assert!(state.board.is_empty());
    }

    #[test]
    fn test_layout_change_resets() {
        let (mut state, mut rng) = started(Layout::Clock);
        reduce(&mut state, Event::DrawSecond, &mut rng);
        reduce(&mut state, Event::Select { slot: 3 }, &mut rng);
        reduce(&mut state, Event::SetLayout(Layout::Grid), &mut rng);
        assert!(state.history.is_none());
        assert!(state.selected.is_none());
        assert_eq!(state.board.cards_in(0..36).len(), 36);
    }

    #[test]
    fn test_same_layout_keeps_reading() {
        let (mut state, mut rng) = started(Layout::Clock);
        reduce(&mut state, Event::DrawSecond, &mut rng);
        reduce(&mut state, Event::Select { slot: 3 }, &mut rng);
        reduce(&mut state, Event::RequestNarration, &mut rng);
        let board = state.board.clone();

        let out = reduce(&mut state, Event::SetLayout(Layout::Clock), &mut rng);
        assert!(out.commands.is_empty());
        assert_eq!(state.board, board);
        assert_eq!(state.selected, Some(3));
        assert!(state.history.is_some());
        assert!(state.pending.is_some());
    }

    #[test]
    fn test_restore_replaces_board() {
        let (mut state, mut rng) = started(Layout::Clock);
        reduce(&mut state, Event::DrawSecond, &mut rng);
        reduce(&mut state, Event::Select { slot: 2 }, &mut rng);
        let saved = Board::from_cards([id(7), id(8)]);
        reduce(
            &mut state,
            Event::Restore { layout: Layout::Grid, board: Box::new(saved.clone()) },
            &mut rng,
        );
        assert_eq!(state.layout, Layout::Grid);
        assert_eq!(state.board, saved);
        assert!(state.history.is_none());
        assert!(state.selected.is_none());
    }

    #[test]
    fn test_select_outside_layout_rejected() {
        let (mut state, mut rng) = started(Layout::Clock);
        let out = reduce(&mut state, Event::Select { slot: 13 }, &mut rng);
        assert_eq!(rejected(&out), Some("slot outside layout"));
        assert!(state.selected.is_none());
    }

    #[test]
    fn test_global_study_topic_deselects() {
        let (mut state, mut rng) = started(Layout::Grid);
        reduce(&mut state, Event::Select { slot: 9 }, &mut rng);
        let out = reduce(&mut state, Event::EnterStudy(StudyTopic::Frame), &mut rng);
        assert!(state.selected.is_none());
        assert!(matches!(out.commands.as_slice(), [Command::ShowBalloon(b)] if b.target == "frame"));
    }

    #[test]
    fn test_local_study_topic_selects_first_occupied() {
        let (mut state, mut rng) = started(Layout::Grid);
        reduce(&mut state, Event::EnterStudy(StudyTopic::Knight), &mut rng);
        assert_eq!(state.selected, Some(0));
    }

    #[test]
    fn test_study_switches_layout() {
        let (mut state, mut rng) = started(Layout::Grid);
        reduce(&mut state, Event::EnterStudy(StudyTopic::ClockCenter), &mut rng);
        assert_eq!(state.layout, Layout::Clock);
        assert_eq!(state.study, Some(StudyTopic::ClockCenter));
        reduce(&mut state, Event::SetLayout(Layout::Grid), &mut rng);
        assert!(state.study.is_none());
    }

    #[test]
    fn test_show_tip_uses_layout_balloons() {
        let (mut state, mut rng) = started(Layout::Clock);
        let out = reduce(&mut state, Event::ShowTip, &mut rng);
        match out.commands.as_slice() {
            [Command::ShowBalloon(b)] => assert!(["center", "house"].contains(&b.target)),
            other => panic!("unexpected commands {:?}", other),
        }
    }

    #[test]
    fn test_narration_request_and_resolve() {
        let (mut state, mut rng) = started(Layout::Grid);
        reduce(&mut state, Event::SetTheme(ReadingTheme::Work), &mut rng);
        reduce(&mut state, Event::Select { slot: 3 }, &mut rng);
        let out = reduce(&mut state, Event::RequestNarration, &mut rng);
        let request_id = match out.commands.as_slice() {
            [Command::Narrate { request_id, context }] => {
                assert_eq!(context.selected.slot, 3);
                assert_eq!(context.theme, ReadingTheme::Work);
                *request_id
            }
            other => panic!("unexpected commands {:?}", other),
        };
        assert_eq!(state.pending.as_ref().map(|p| p.slot), Some(3));

        let again = reduce(&mut state, Event::RequestNarration, &mut rng);
        assert_eq!(rejected(&again), Some("narration already pending"));

        reduce(
            &mut state,
            Event::NarrationResolved { request_id, text: "síntese".into() },
            &mut rng,
        );
        assert_eq!(state.analysis.as_deref(), Some("síntese"));
        assert!(state.pending.is_none());
    }

    #[test]
    fn test_stale_narration_discarded() {
        let (mut state, mut rng) = started(Layout::Grid);
        reduce(&mut state, Event::Select { slot: 3 }, &mut rng);
        reduce(&mut state, Event::RequestNarration, &mut rng);
        let stale_id = state.pending.as_ref().unwrap().request_id;

        reduce(&mut state, Event::Select { slot: 8 }, &mut rng);
        assert!(state.pending.is_none());

        let out = reduce(
            &mut state,
            Event::NarrationResolved { request_id: stale_id, text: "velho".into() },
            &mut rng,
        );
        assert_eq!(rejected(&out), Some("stale narration discarded"));
        assert!(state.analysis.is_none());
    }

    #[test]
    fn test_narration_on_empty_slot() {
        let (mut state, mut rng) = started(Layout::Grid);
        reduce(&mut state, Event::SetManualMode(true), &mut rng);
        reduce(&mut state, Event::Select { slot: 3 }, &mut rng);
        let out = reduce(&mut state, Event::RequestNarration, &mut rng);
        assert!(out.commands.is_empty());
        assert_eq!(state.analysis.as_deref(), Some(EMPTY_SELECTION));
    }

    #[test]
    fn test_filters_do_not_touch_board() {
        let (mut state, mut rng) = started(Layout::Grid);
        let board = state.board.clone();
        reduce(&mut state, Event::ToggleFilter(GeometryFilter::Knight), &mut rng);
        assert!(state.filters.shows(GeometryFilter::Knight));
        assert_eq!(state.board, board);
    }

    #[test]
    fn test_same_seed_same_hash() {
        let run = || {
            let (mut state, mut rng) = started(Layout::Clock);
            reduce(&mut state, Event::DrawSecond, &mut rng);
            reduce(&mut state, Event::Select { slot: 1 }, &mut rng).state_hash
        };
        assert_eq!(run(), run());
    }
}
