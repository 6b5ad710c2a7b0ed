//! Service Layer
//!
//! Async orchestration around the pure `game/` code. This layer is
//! **non-deterministic**: it talks to storage, the clock and subscribers.

pub mod broadcast;
pub mod engine;
pub mod games;
pub mod locks;
pub mod publisher;

pub use broadcast::{Broadcaster, ChannelBroadcaster, Delivery, Recipient};
pub use engine::{Committed, GameEngine};
pub use games::{ActionResponse, GameService, MemoryBackends};
pub use locks::GameLocks;
pub use publisher::EventPublisher;
