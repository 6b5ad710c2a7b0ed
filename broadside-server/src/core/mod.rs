//! Core primitives.
//!
//! Board coordinates and the deterministic RNG used for fleet layout.
//! Nothing here touches storage or the clock.

pub mod coord;
pub mod rng;

// Re-export core types
pub use coord::Coord;
pub use rng::{DeterministicRng, derive_game_seed};
