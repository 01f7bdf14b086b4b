//! The live game-state engine: world graph, sessions, combat, monster
//! lifecycle, command dispatch, and player persistence.
//!
//! The engine is transport-agnostic: it accepts command lines per session
//! and publishes scoped outcome events; rendering and wire protocol are the
//! embedding application's concern.

pub mod catalog;
pub mod combat;
pub mod commands;
pub mod dispatch;
pub mod engine;
pub mod errors;
pub mod events;
pub mod lifecycle;
pub mod session;
pub mod storage;
pub mod types;
pub mod world;

pub use catalog::{Catalog, ItemDef, ItemEffect, ItemKind, SpellDef, SpellEffect, SHOP_STOCK};
pub use combat::{apply_level_ups, resolve_round, RoundOutcome};
pub use commands::Command;
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use engine::Engine;
pub use errors::GameError;
pub use events::{Envelope, EventBus, GameEvent, Scope};
pub use lifecycle::{respawn_sweep, wander_sweep};
pub use session::{Session, SessionRegistry};
pub use storage::{hash_password, verify_password, PlayerStore, PlayerStoreBuilder};
pub use types::{Monster, MonsterId, Player, PlayerRecord, Portal, Room, StatBlock};
pub use world::{canonical_castle_seed, WorldGraph};
