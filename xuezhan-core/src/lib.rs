//! Xuezhan room service.
//!
//! Command dispatch, the room persistence boundary, per-wind display
//! projections, and deterministic session seeding on top of
//! `xuezhan-engine`.

pub mod command;
pub mod projection;
pub mod seeding;
pub mod service;
pub mod store;
