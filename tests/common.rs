//! Shared fixtures for the integration suites: small deterministic worlds,
//! an engine over a throwaway store, and event draining helpers.
#![allow(dead_code)]

use std::sync::Arc;

use incarnadine::config::{GameConfig, ServerConfig};
use incarnadine::game::{
    Engine, Envelope, EventBus, GameEvent, Monster, MonsterId, PlayerStore, Room, Scope,
    WorldGraph,
};
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

pub struct Fixture {
    pub engine: Arc<Engine>,
    pub rx: UnboundedReceiver<Envelope>,
    _dir: TempDir,
}

/// Tuning for tests: intervals far in the future so only explicit calls
/// drive the engine, wander always rolls, aggro never does.
pub fn test_game_config() -> GameConfig {
    GameConfig {
        combat_round_secs: 3600,
        respawn_sweep_secs: 3600,
        respawn_delay_secs: 30,
        wander_sweep_secs: 3600,
        wander_chance: 1.0,
        aggro_chance: 0.0,
    }
}

pub async fn fixture(rooms: Vec<Room>, start: &str, safe: &str, game: GameConfig) -> Fixture {
    let dir = TempDir::new().expect("tempdir");
    let store = PlayerStore::open(dir.path()).expect("store");
    let (bus, rx) = EventBus::new();
    let server = ServerConfig {
        name: "Test Castle".to_string(),
        motd: "Welcome to the proving grounds.".to_string(),
        start_room: start.to_string(),
        safe_room: safe.to_string(),
    };
    let world = WorldGraph::from_rooms(rooms, start, safe).expect("world");
    let engine = Engine::assemble(server, game, world, store, bus).expect("engine");
    Fixture {
        engine,
        rx,
        _dir: dir,
    }
}

/// Five-room proving ground: a safe shop room, a sparring hall with monsters
/// of very different temperament, a quiet gallery, a perch with a hostile,
/// and a vault behind a high attunement gate.
pub fn arena_rooms() -> Vec<Room> {
    vec![
        Room::new("1", "The Grand Foyer", "Safe ground by the card table.")
            .with_portal("2", "Sparring Hall", 0)
            .with_portal("4", "Gargoyle Perch", 0)
            .with_portal("9", "Sealed Vault", 10)
            .with_shop()
            .safe(),
        Room::new("2", "The Sparring Hall", "Scuffed flagstones and old blood.")
            .with_portal("1", "The Foyer", 0)
            .with_portal("3", "Quiet Gallery", 0)
            .with_item("rusty_sword")
            .with_monster(Monster::spawn("Training Golem", 1000, 6, 40, 10, "potion"))
            .with_monster(Monster::spawn("Straw Dummy", 1, 4, 30, 5, "potion"))
            .with_monster(Monster::spawn("Sparring Partner", 800, 4, 35, 5, "potion"))
            .with_monster(Monster::spawn("Pit Horror", 5000, 80, 500, 100, "elixir")),
        Room::new("3", "The Quiet Gallery", "Nothing stirs here.")
            .with_portal("2", "Sparring Hall", 0),
        Room::new("4", "The Gargoyle Perch", "Claw marks on every ledge.")
            .with_portal("1", "The Foyer", 0)
            .with_monster(Monster::spawn("Ledge Gargoyle", 500, 5, 60, 20, "crystal").aggro()),
        Room::new("9", "The Sealed Vault", "Treasure behind a high gate.")
            .with_portal("1", "The Foyer", 0),
    ]
}

pub async fn arena() -> Fixture {
    fixture(arena_rooms(), "1", "1", test_game_config()).await
}

/// Connect a session and promote it in place to a registered identity with
/// default stats, skipping the interactive login flow.
pub async fn connect_registered(fx: &Fixture, name: &str) -> String {
    let sid = fx.engine.connect().await.expect("connect");
    set_registered(&fx.engine, &sid, name).await;
    sid
}

pub async fn set_registered(engine: &Arc<Engine>, session_id: &str, name: &str) {
    let session = engine.sessions.get(session_id).await.expect("session");
    let mut player = session.player.lock().await;
    player.name = name.to_string();
    player.password_hash = Some("$argon2id$test-stub".to_string());
}

pub async fn place(engine: &Arc<Engine>, session_id: &str, room_id: &str) {
    let session = engine.sessions.get(session_id).await.expect("session");
    session.player.lock().await.location = room_id.to_string();
}

pub async fn monster_id(engine: &Arc<Engine>, room_id: &str, name: &str) -> MonsterId {
    let room = engine.world.lock(room_id).await.expect("room");
    room.monsters
        .iter()
        .find(|m| m.name == name)
        .map(|m| m.id)
        .expect("monster present")
}

/// Record an engagement directly on the player and the monster, the way the
/// attack handler does, without spawning the round loop.
pub async fn engage(engine: &Arc<Engine>, session_id: &str, room_id: &str, target: MonsterId) {
    let session = engine.sessions.get(session_id).await.expect("session");
    let mut player = session.player.lock().await;
    player.combat_target = Some(target);
    let mut room = engine.world.lock(room_id).await.expect("room");
    if let Some(monster) = room.monster_mut(target) {
        monster.engaged_by.insert(session_id.to_string());
    }
}

pub fn drain(rx: &mut UnboundedReceiver<Envelope>) -> Vec<Envelope> {
    let mut out = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        out.push(envelope);
    }
    out
}

/// Events addressed directly to one session.
pub fn session_events(envelopes: &[Envelope], session_id: &str) -> Vec<GameEvent> {
    envelopes
        .iter()
        .filter(|e| matches!(&e.scope, Scope::Session(sid) if sid == session_id))
        .map(|e| e.event.clone())
        .collect()
}

pub fn error_containing(events: &[GameEvent], needle: &str) -> bool {
    events
        .iter()
        .any(|e| matches!(e, GameEvent::Error(msg) if msg.contains(needle)))
}

pub fn info_containing(events: &[GameEvent], needle: &str) -> bool {
    events
        .iter()
        .any(|e| matches!(e, GameEvent::Info(msg) if msg.contains(needle)))
}
