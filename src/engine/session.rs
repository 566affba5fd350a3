//! Session driver: owns the state and the RNG, applies events through the
//! reducer and runs narration against a [`Narrator`].

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::board::Layout;
use crate::interpret::{build_context, InterpretationContext};
use crate::logging::{log_draw, log_event_applied, log_narration, log_rejected};
use crate::narrator::{narrate_or_fallback, Narrator};

use super::events::{Command, Event};
use super::highlight::{highlight_map, Highlight};
use super::reducer::reduce;
use super::state::ReadingState;

pub struct ReadingSession<R: Rng = StdRng> {
    state: ReadingState,
    rng: R,
}

impl ReadingSession<StdRng> {
    /// Seeded sessions replay the same draws.
    pub fn new(layout: Layout, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(layout, rng)
    }
}

impl<R: Rng> ReadingSession<R> {
    pub fn with_rng(layout: Layout, rng: R) -> Self {
        let mut session = Self {
            state: ReadingState::new(layout),
            rng,
        };
        session.dispatch(Event::Shuffle);
        session
    }

    pub fn state(&self) -> &ReadingState {
        &self.state
    }

    /// Apply one event and return the commands it produced.
    pub fn dispatch(&mut self, event: Event) -> Vec<Command> {
        let name = event.name();
        let draws = matches!(
            event,
            Event::Shuffle | Event::DrawSecond | Event::SetLayout(_) | Event::SetManualMode(_)
        );

        let out = reduce(&mut self.state, event, &mut self.rng);

        let command_names: Vec<&str> = out.commands.iter().map(Command::name).collect();
        log_event_applied(name, out.state_hash, &command_names);

        let mut rejected = false;
        for cmd in &out.commands {
            if let Command::Rejected { reason } = cmd {
                log_rejected(name, reason);
                rejected = true;
            }
        }
        if draws && !rejected && !self.state.board.is_empty() {
            log_draw(name, self.state.layout.as_str(), &self.state.board.digest());
        }

        out.commands
    }

    pub fn highlights(&self) -> Vec<Highlight> {
        highlight_map(&self.state)
    }

    /// Context for the current selection, if any.
    pub fn context(&self) -> Option<InterpretationContext> {
        let slot = self.state.selected?;
        build_context(&self.state.board, slot, self.state.layout, self.state.theme, self.state.level)
    }

    /// Start a narration for the current selection. `None` when the reducer
    /// did not ask for one (nothing selected, empty slot, already pending).
    pub fn begin_narration(&mut self) -> Option<(u64, Box<InterpretationContext>)> {
        self.dispatch(Event::RequestNarration)
            .into_iter()
            .find_map(|cmd| match cmd {
                Command::Narrate { request_id, context } => Some((request_id, context)),
                _ => None,
            })
    }

    /// Deliver a narrator answer. Returns false if it was stale and dropped.
    pub fn finish_narration(&mut self, request_id: u64, text: String) -> bool {
        let commands = self.dispatch(Event::NarrationResolved { request_id, text });
        !commands.iter().any(|c| matches!(c, Command::Rejected { .. }))
    }

    /// Narrate the current selection and store the text as the analysis.
    /// `None` when nothing was narrated or the answer came back stale.
    pub async fn analyze(&mut self, narrator: &dyn Narrator) -> Option<String> {
        let Some((request_id, context)) = self.begin_narration() else {
            return self.state.analysis.clone();
        };

        let started = Instant::now();
        let (text, ok) = narrate_or_fallback(narrator, &context).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let applied = self.finish_narration(request_id, text);
        let outcome = match (applied, ok) {
            (false, _) => "stale",
            (true, true) => "ok",
            (true, false) => "failed",
        };
        log_narration(request_id, context.selected.slot, outcome, elapsed_ms);

        if applied {
            self.state.analysis.clone()
        } else {
            None
        }
    }
}
