//! Xuezhan Room Engine
//!
//! Four-player, 108-tile (three suit) tile-matching engine: deck building
//! and dealing, hand grouping into quads/triplets/runs, discard processing,
//! and room/seat state transitions. Pure and synchronous; persistence,
//! account lookups, and transport belong to the callers.

pub mod decompose;
pub mod errors;
pub mod state;
pub mod tile;
pub mod types;
