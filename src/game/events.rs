//! Semantic outcome events and the scoped delivery bus.
//!
//! The engine never formats markup; it publishes structured events addressed
//! to a recipient scope. The transport layer owns the receiving half and
//! decides how to render and route them. [`GameEvent::render`] provides the
//! plain-text rendering used by the bundled terminal transport.

use log::debug;
use tokio::sync::mpsc;

/// Who should see an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Exactly one session.
    Session(String),
    /// Everyone whose player currently stands in `room_id`, minus exclusions.
    Room {
        room_id: String,
        exclude: Vec<String>,
    },
    /// Every connected session.
    Broadcast,
}

impl Scope {
    pub fn room(room_id: &str) -> Self {
        Scope::Room {
            room_id: room_id.to_string(),
            exclude: Vec::new(),
        }
    }

    pub fn room_except(room_id: &str, exclude: &[&str]) -> Self {
        Scope::Room {
            room_id: room_id.to_string(),
            exclude: exclude.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// One visible exit in a room view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitView {
    pub target: String,
    pub label: String,
    /// False when the player's Attunement is below the portal gate; locked
    /// exits render obscured.
    pub passable: bool,
}

/// One monster line in a room view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonsterView {
    pub name: String,
    pub is_aggro: bool,
    pub is_roaming: bool,
}

/// Structured outcome data emitted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Full room description in response to `look`, movement, or respawn.
    RoomView {
        name: String,
        description: String,
        exits: Vec<ExitView>,
        items: Vec<String>,
        monsters: Vec<MonsterView>,
        has_shop: bool,
    },
    /// The player's strike landed.
    CombatHit {
        target: String,
        damage: i32,
        target_hp: i32,
    },
    /// The monster's retaliation landed.
    CombatStruck {
        monster: String,
        damage: i32,
        player_hp: i32,
    },
    Engaged {
        monster: String,
    },
    AggroLunge {
        monster: String,
    },
    MonsterDefeated {
        monster: String,
        loot: String,
        gold: u32,
        xp: u32,
    },
    PlayerDied {
        respawn_room: String,
    },
    LevelUp {
        level: u32,
    },
    RetreatSuccess {
        refuge: String,
    },
    RetreatFailed {
        monster: String,
        damage: i32,
        player_hp: i32,
    },
    Says {
        speaker: String,
        text: String,
    },
    Shouts {
        speaker: String,
        text: String,
    },
    PlayerArrived {
        name: String,
    },
    PlayerDeparted {
        name: String,
    },
    PlayerLoggedOut {
        name: String,
    },
    MonsterWandersIn {
        name: String,
    },
    MonsterWandersOff {
        name: String,
    },
    MonsterRespawned {
        name: String,
    },
    Leaderboard {
        entries: Vec<LeaderboardEntry>,
    },
    /// Informational line (stats, inventory, help...).
    Info(String),
    /// Rejection line; no state was mutated.
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub name: String,
    pub level: u32,
    pub xp: u32,
    pub gold: u32,
}

impl GameEvent {
    /// Plain-text rendering used by the bundled terminal transport. Richer
    /// transports are expected to match on the variants instead.
    pub fn render(&self) -> String {
        match self {
            GameEvent::RoomView {
                name,
                description,
                exits,
                items,
                monsters,
                has_shop,
            } => {
                let mut out = format!("== {} ==\n{}", name, description);
                if !exits.is_empty() {
                    let list: Vec<String> = exits
                        .iter()
                        .map(|e| {
                            if e.passable {
                                format!("[{}] {}", e.target, e.label)
                            } else {
                                "[locked] ???".to_string()
                            }
                        })
                        .collect();
                    out.push_str(&format!("\nExits: {}", list.join(", ")));
                }
                if !items.is_empty() {
                    out.push_str(&format!("\nYou see: {}", items.join(", ")));
                }
                if !monsters.is_empty() {
                    let list: Vec<String> = monsters
                        .iter()
                        .map(|m| {
                            let mut line = m.name.clone();
                            if m.is_aggro {
                                line.push_str(" (hostile)");
                            }
                            if m.is_roaming {
                                line.push_str(" (roaming)");
                            }
                            line
                        })
                        .collect();
                    out.push_str(&format!("\nCreatures: {}", list.join(", ")));
                }
                if *has_shop {
                    out.push_str("\n[SHOP] Phil is here, ready to trade.");
                }
                out
            }
            GameEvent::CombatHit {
                target,
                damage,
                target_hp,
            } => format!("You hit the {} for {}. (Foe HP: {})", target, damage, target_hp),
            GameEvent::CombatStruck {
                monster,
                damage,
                player_hp,
            } => format!("The {} hits you for {}! (HP: {})", monster, damage, player_hp),
            GameEvent::Engaged { monster } => format!("You engage the {}!", monster),
            GameEvent::AggroLunge { monster } => {
                format!("The {} notices you and lunges!", monster)
            }
            GameEvent::MonsterDefeated {
                monster,
                loot,
                gold,
                xp,
            } => format!(
                "DEFEATED! The {} drops {} and {} gold. (+{} xp)",
                monster, loot, gold, xp
            ),
            GameEvent::PlayerDied { respawn_room } => {
                format!("DE-MATERIALIZED! You come to in {}.", respawn_room)
            }
            GameEvent::LevelUp { level } => format!("*** LEVEL UP! You are now level {}. ***", level),
            GameEvent::RetreatSuccess { refuge } => {
                format!("You slip away and escape to {}!", refuge)
            }
            GameEvent::RetreatFailed {
                monster,
                damage,
                player_hp,
            } => format!(
                "Retreat failed! The {} catches you for {} damage. (HP: {})",
                monster, damage, player_hp
            ),
            GameEvent::Says { speaker, text } => format!("{} says: \"{}\"", speaker, text),
            GameEvent::Shouts { speaker, text } => {
                format!("{} shouts: {}!!", speaker, text.to_uppercase())
            }
            GameEvent::PlayerArrived { name } => format!("{} steps out of the shadows.", name),
            GameEvent::PlayerDeparted { name } => format!("{} vanishes through a portal.", name),
            GameEvent::PlayerLoggedOut { name } => {
                format!("{} has faded into the mists of time.", name)
            }
            GameEvent::MonsterWandersIn { name } => format!("A {} wanders in.", name),
            GameEvent::MonsterWandersOff { name } => format!("The {} wanders away.", name),
            GameEvent::MonsterRespawned { name } => format!("The {} stirs back to life.", name),
            GameEvent::Leaderboard { entries } => {
                let mut out = String::from("--- LEGENDS OF THE REALM ---");
                for (i, e) in entries.iter().enumerate() {
                    out.push_str(&format!(
                        "\n{}. {} - Lvl {} ({} XP) | {}g",
                        i + 1,
                        e.name,
                        e.level,
                        e.xp,
                        e.gold
                    ));
                }
                out
            }
            GameEvent::Info(text) => text.clone(),
            GameEvent::Error(text) => text.clone(),
        }
    }
}

/// Addressed event ready for transport routing.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub scope: Scope,
    pub event: GameEvent,
}

/// Sending half of the engine-to-transport channel.
///
/// Publishing never blocks and never fails gameplay: if the transport has
/// hung up, the envelope is dropped with a debug log.
#[derive(Clone)]
pub struct EventBus {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl EventBus {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn publish(&self, scope: Scope, event: GameEvent) {
        if self.tx.send(Envelope { scope, event }).is_err() {
            debug!("event dropped: transport receiver closed");
        }
    }

    pub fn to_session(&self, session_id: &str, event: GameEvent) {
        self.publish(Scope::Session(session_id.to_string()), event);
    }

    pub fn to_room(&self, room_id: &str, event: GameEvent) {
        self.publish(Scope::room(room_id), event);
    }

    pub fn to_room_except(&self, room_id: &str, exclude: &[&str], event: GameEvent) {
        self.publish(Scope::room_except(room_id, exclude), event);
    }

    pub fn broadcast(&self, event: GameEvent) {
        self.publish(Scope::Broadcast, event);
    }
}
