//! The engine ties the world graph, session registry, player store, catalog,
//! and event bus together and owns the session lifecycle.
//!
//! Everything here is shared behind an `Arc<Engine>`; per-session dispatch,
//! combat loop tasks, and the lifecycle sweeps all operate on the same
//! instance and synchronize through the per-room and per-player locks.

use std::sync::Arc;

use log::{info, warn};
use tokio::task::JoinHandle;

use crate::config::{Config, GameConfig, ServerConfig};
use crate::logutil::escape_log;

use super::catalog::Catalog;
use super::errors::GameError;
use super::events::{EventBus, ExitView, GameEvent, MonsterView};
use super::lifecycle;
use super::session::{Session, SessionRegistry};
use super::storage::PlayerStore;
use super::types::{Player, Room};
use super::world::WorldGraph;

pub struct Engine {
    pub world: WorldGraph,
    pub sessions: SessionRegistry,
    pub store: PlayerStore,
    pub catalog: Catalog,
    pub events: EventBus,
    pub game: GameConfig,
    pub server: ServerConfig,
}

impl Engine {
    /// Build an engine over the canonical castle.
    pub fn new(config: &Config, store: PlayerStore, events: EventBus) -> Result<Arc<Self>, GameError> {
        let world = WorldGraph::canonical(&config.server.start_room, &config.server.safe_room)?;
        Self::assemble(config.server.clone(), config.game, world, store, events)
    }

    /// Build an engine over a custom world. Tests use this to supply small,
    /// deterministic room graphs.
    pub fn assemble(
        server: ServerConfig,
        game: GameConfig,
        world: WorldGraph,
        store: PlayerStore,
        events: EventBus,
    ) -> Result<Arc<Self>, GameError> {
        Ok(Arc::new(Self {
            world,
            sessions: SessionRegistry::new(),
            store,
            catalog: Catalog::new(),
            events,
            game,
            server,
        }))
    }

    /// Start the respawn and wander sweeps. The returned handles live as
    /// long as the server; dropping them does not stop the tasks.
    pub fn start_background_tasks(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        lifecycle::start(self.clone())
    }

    /// Create a new anonymous guest session at the start room and greet it.
    pub async fn connect(self: &Arc<Self>) -> Result<String, GameError> {
        let session = Arc::new(Session::new_guest(self.world.start_room()));
        let session_id = session.id.clone();
        self.sessions.insert(session.clone()).await;
        {
            let player = session.player.lock().await;
            info!("session {} connected as {}", session_id, escape_log(&player.name));
            self.events
                .to_session(&session_id, GameEvent::Info(self.server.motd.clone()));
            let view = self.room_view(&player).await?;
            self.events.to_session(&session_id, view);
        }
        Ok(session_id)
    }

    /// Tear down a session: cancel its combat loop, release any engagement,
    /// save a registered player, and announce the departure. The save
    /// completes before this returns.
    pub async fn disconnect(self: &Arc<Self>, session_id: &str) -> Result<(), GameError> {
        let Some(session) = self.sessions.remove(session_id).await else {
            return Ok(());
        };
        session.abort_combat().await;
        let mut player = session.player.lock().await;
        if let Some(target) = player.combat_target.take() {
            if let Ok(mut room) = self.world.lock(&player.location).await {
                if let Some(monster) = room.monster_mut(target) {
                    monster.engaged_by.remove(session_id);
                }
            }
        }
        let name = player.name.clone();
        let location = player.location.clone();
        let registered = !player.is_guest();
        if registered {
            self.persist(&player);
        }
        drop(player);
        if registered {
            self.events
                .to_room(&location, GameEvent::PlayerLoggedOut { name: name.clone() });
        }
        info!("session {} disconnected ({})", session_id, escape_log(&name));
        Ok(())
    }

    /// Write a registered player's state to the store. Guests are skipped;
    /// store failures are logged and swallowed so a bad disk never takes a
    /// session actor down with it.
    pub fn persist(&self, player: &Player) {
        let Some(record) = player.to_record() else {
            return;
        };
        if let Err(e) = self.store.put_player(record) {
            warn!("failed to save player {}: {}", escape_log(&player.name), e);
        }
    }

    /// Build the room view event for the player's current room.
    pub async fn room_view(&self, player: &Player) -> Result<GameEvent, GameError> {
        let room = self.world.lock(&player.location).await?;
        Ok(build_room_view(&room, player, &self.catalog))
    }

    /// Display name for an item id, falling back to the raw id for anything
    /// outside the catalog.
    pub fn item_name(&self, id: &str) -> String {
        self.catalog
            .item(id)
            .map(|def| def.name.to_string())
            .unwrap_or_else(|| id.to_string())
    }
}

fn build_room_view(room: &Room, player: &Player, catalog: &Catalog) -> GameEvent {
    let exits = room
        .portals
        .iter()
        .map(|(target, portal)| ExitView {
            target: target.clone(),
            label: portal.label.clone(),
            passable: player.stats.attunement >= portal.min_attunement,
        })
        .collect();
    let items = room
        .items
        .iter()
        .map(|id| {
            catalog
                .item(id)
                .map(|def| def.name.to_string())
                .unwrap_or_else(|| id.clone())
        })
        .collect();
    let monsters = room
        .living_monsters()
        .map(|m| MonsterView {
            name: m.name.clone(),
            is_aggro: m.is_aggro,
            is_roaming: m.is_roaming,
        })
        .collect();
    GameEvent::RoomView {
        name: room.name.clone(),
        description: room.description.clone(),
        exits,
        items,
        monsters,
        has_shop: room.has_shop,
    }
}
