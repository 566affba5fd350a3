//! Lenormand reading engine: the 36-card deck laid out on the Mesa Real
//! grid or the 13-cell clock, the geometry that links houses, a reducer
//! driving the session, and the clients for the narrator, the account gate
//! and saved readings.

pub mod access;
pub mod board;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod geometry;
pub mod interpret;
pub mod logging;
pub mod narrator;
pub mod storage;
pub mod study;
