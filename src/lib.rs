//! # Incarnadine - a multi-user dungeon engine
//!
//! Incarnadine is the live game-state engine behind the Castle of 144,000
//! Doors: a shared graph of rooms that many concurrently connected players
//! explore, fight over, and trade in, with persistent per-player progress.
//!
//! ## Features
//!
//! - **Shared world graph**: a fixed castle of rooms joined by attunement-gated
//!   portals, each room carrying a mutable item pile and monster population.
//! - **Combat engine**: a cancellable per-player combat loop with damage and
//!   mitigation formulas, loot drops, respawn scheduling, and level-ups.
//! - **Monster lifecycle**: background respawn and wander sweeps that take the
//!   same per-room locks as foreground command handling.
//! - **Command dispatch**: a verb parser and handler set covering movement,
//!   combat, trade, chat, and account commands, behind an authentication gate.
//! - **Persistence**: sled-backed player records with Argon2id credentials.
//! - **Async design**: built on Tokio; one logical actor per session plus the
//!   two periodic sweeps, synchronized per room and per player.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use incarnadine::config::Config;
//! use incarnadine::game::{Engine, EventBus, PlayerStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let store = PlayerStore::open(&config.storage.data_dir)?;
//!     let (bus, mut outbox) = EventBus::new();
//!     let engine = Engine::new(&config, store, bus)?;
//!     let _tasks = engine.start_background_tasks();
//!     // hand `outbox` to a transport and feed commands through a Dispatcher
//!     # let _ = &mut outbox;
//!     Ok(())
//! }
//! ```
//!
//! ## Module organization
//!
//! - [`game`] - world graph, sessions, combat, lifecycle sweeps, dispatch
//! - [`config`] - configuration management and validation
//! - [`logutil`] - log sanitization helpers
//! - [`validation`] - player-name validation rules

pub mod config;
pub mod game;
pub mod logutil;
pub mod validation;
