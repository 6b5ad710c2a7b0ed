//! # Broadside Game Server
//!
//! Authoritative engine for two-player, turn-based naval combat.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    BROADSIDE SERVER                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/             - Deterministic primitives                │
//! │  ├── coord.rs      - Board coordinates                       │
//! │  └── rng.rs        - Deterministic Xorshift128+ PRNG         │
//! │                                                              │
//! │  game/             - Game logic (deterministic)              │
//! │  ├── state.rs      - Game, player, board and ship state      │
//! │  ├── action.rs     - Inbound attack / move payloads          │
//! │  ├── placement.rs  - Fleet placement                         │
//! │  ├── rules.rs      - Validation and transitions              │
//! │  ├── view.rs       - Fog-of-war projection                   │
//! │  └── events.rs     - Journal events, notifications           │
//! │                                                              │
//! │  store/            - Storage (async)                         │
//! │  ├── state_store.rs- Cache-first state, snapshot fallback    │
//! │  ├── gate.rs       - Action idempotency                      │
//! │  ├── codec.rs      - Cached state encoding                   │
//! │  └── memory.rs     - In-memory collaborators                 │
//! │                                                              │
//! │  service/          - Orchestration (async)                   │
//! │  ├── engine.rs     - Load / apply / persist                  │
//! │  ├── locks.rs      - Per-game single writer                  │
//! │  ├── publisher.rs  - Event sequencing and journaling         │
//! │  ├── broadcast.rs  - Notification fan-out                    │
//! │  └── games.rs      - End-to-end action handling              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Hidden Information
//!
//! Players only ever receive a [`PlayerView`]. It is built from the
//! viewer's own attack ledger and the opponent's sunk ships, never from
//! the opponent's active fleet.
//!
//! ## Determinism
//!
//! `core/` and `game/` hold no I/O. Fleet layout comes from a seeded
//! Xorshift128+, so a game's boards are reproducible from its seed. Live
//! games mix fresh random bytes into that seed.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod error;
pub mod game;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use config::EngineConfig;
pub use crate::core::coord::Coord;
pub use crate::core::rng::DeterministicRng;
pub use error::{BroadcastError, GameError, StoreError};
pub use game::action::{AttackAction, ShipMoveAction};
pub use game::rules::{ActionOutcome, Rejection};
pub use game::state::{GameId, GameState, PlayerId, ShipId, ShipKind};
pub use game::view::PlayerView;
pub use service::{ActionResponse, GameEngine, GameService};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Board edge length
pub const BOARD_SIZE: i32 = 10;

/// Snapshot every N-th turn
pub const SNAPSHOT_INTERVAL: u32 = 5;

/// Idempotency key lifetime (5 minutes)
pub const ACTION_TTL_SECS: u64 = 300;

/// Placement attempts per ship
pub const PLACEMENT_ATTEMPTS: u32 = 1000;
