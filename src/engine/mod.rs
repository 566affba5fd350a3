//! Reading-session engine: one explicit state container mutated only by a
//! pure reducer.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  UI / CLI    │────►│    Event     │────►│   Reducer    │
//! │  actions     │     │              │     │  (pure fn)   │
//! └──────────────┘     └──────────────┘     └──────────────┘
//!        ▲                                         │
//!        │                                         ▼
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  Narrator /  │◄────│   Commands   │◄────│ ReadingState │
//! │  card picker │     │              │     │   (hashed)   │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! Geometry queries and the interpretation context only ever read the
//! state; [`session::ReadingSession`] owns it and is the single writer.

pub mod events;
pub mod filters;
pub mod highlight;
pub mod reducer;
pub mod session;
pub mod state;
