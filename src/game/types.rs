//! Core data types for the live game state: players, monsters, rooms, and
//! the persisted player record.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::GUEST_PREFIX;

pub const PLAYER_SCHEMA_VERSION: u8 = 1;

/// Stable identity of one monster instance, unique for the process lifetime.
///
/// Combat targets and engagement bookkeeping refer to monsters by this id,
/// never by list position, so concurrent list mutation (wander, death) leaves
/// a stored target either valid or detectably gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonsterId(u64);

static NEXT_MONSTER_ID: AtomicU64 = AtomicU64::new(1);

impl MonsterId {
    fn next() -> Self {
        MonsterId(NEXT_MONSTER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// The three player attributes.
///
/// Attunement gates portals and scales magic, Hardiness is the hit-point
/// ceiling, Wit mitigates incoming damage and improves retreat odds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBlock {
    pub attunement: i32,
    pub hardiness: i32,
    pub wit: i32,
}

impl Default for StatBlock {
    fn default() -> Self {
        Self {
            attunement: 0,
            hardiness: 60,
            wit: 12,
        }
    }
}

/// One monster instance living inside a room's monster list.
#[derive(Debug, Clone)]
pub struct Monster {
    pub id: MonsterId,
    pub name: String,
    pub hp: i32,
    pub max_hp: i32,
    pub attack: i32,
    pub xp_reward: u32,
    pub gold_reward: u32,
    pub loot: String,
    pub is_aggro: bool,
    pub is_roaming: bool,
    /// Respawn deadline; `None` means the monster is alive.
    pub dead_until: Option<DateTime<Utc>>,
    /// Sessions currently fighting this instance. Mutated and read only
    /// under the owning room's lock.
    pub engaged_by: HashSet<String>,
}

impl Monster {
    pub fn spawn(
        name: &str,
        max_hp: i32,
        attack: i32,
        xp_reward: u32,
        gold_reward: u32,
        loot: &str,
    ) -> Self {
        Self {
            id: MonsterId::next(),
            name: name.to_string(),
            hp: max_hp,
            max_hp,
            attack,
            xp_reward,
            gold_reward,
            loot: loot.to_string(),
            is_aggro: false,
            is_roaming: false,
            dead_until: None,
            engaged_by: HashSet::new(),
        }
    }

    pub fn aggro(mut self) -> Self {
        self.is_aggro = true;
        self
    }

    pub fn roaming(mut self) -> Self {
        self.is_roaming = true;
        self
    }

    pub fn is_alive(&self) -> bool {
        self.dead_until.is_none()
    }
}

/// A directed, attunement-gated edge between two rooms.
#[derive(Debug, Clone)]
pub struct Portal {
    pub label: String,
    pub min_attunement: i32,
}

/// One room of the castle: static shape (portals, flags) plus mutable
/// runtime state (item pile, monster list).
///
/// Rooms are owned exclusively by the world graph; everything else refers to
/// them by id and mutates them under the graph's per-room lock.
#[derive(Debug)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Target room id -> portal. Ordered so exit listings are stable.
    pub portals: BTreeMap<String, Portal>,
    pub items: Vec<String>,
    pub monsters: Vec<Monster>,
    pub has_shop: bool,
    pub is_safe: bool,
    pub can_rest: bool,
}

impl Room {
    pub fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            portals: BTreeMap::new(),
            items: Vec::new(),
            monsters: Vec::new(),
            has_shop: false,
            is_safe: false,
            can_rest: false,
        }
    }

    pub fn with_portal(mut self, target: &str, label: &str, min_attunement: i32) -> Self {
        self.portals.insert(
            target.to_string(),
            Portal {
                label: label.to_string(),
                min_attunement,
            },
        );
        self
    }

    pub fn with_item(mut self, item: &str) -> Self {
        self.items.push(item.to_string());
        self
    }

    pub fn with_monster(mut self, monster: Monster) -> Self {
        self.monsters.push(monster);
        self
    }

    pub fn with_shop(mut self) -> Self {
        self.has_shop = true;
        self
    }

    pub fn safe(mut self) -> Self {
        self.is_safe = true;
        self
    }

    pub fn restful(mut self) -> Self {
        self.can_rest = true;
        self
    }

    pub fn monster(&self, id: MonsterId) -> Option<&Monster> {
        self.monsters.iter().find(|m| m.id == id)
    }

    pub fn monster_mut(&mut self, id: MonsterId) -> Option<&mut Monster> {
        self.monsters.iter_mut().find(|m| m.id == id)
    }

    pub fn living_monsters(&self) -> impl Iterator<Item = &Monster> {
        self.monsters.iter().filter(|m| m.is_alive())
    }

    /// First living aggressive monster, if any. Used by room-entry aggro.
    pub fn first_aggressor(&self) -> Option<&Monster> {
        self.living_monsters().find(|m| m.is_aggro)
    }
}

/// Live in-memory state of one player, guest or registered.
#[derive(Debug, Clone)]
pub struct Player {
    pub name: String,
    /// PHC-format Argon2id hash. `None` for guests.
    pub password_hash: Option<String>,
    pub location: String,
    pub level: u32,
    pub xp: u32,
    pub gold: u32,
    pub stats: StatBlock,
    pub current_hp: i32,
    pub equipped: Option<String>,
    pub inventory: Vec<String>,
    pub combat_target: Option<MonsterId>,
    /// Transient Wit bonus from the blur spell; never persisted.
    pub blur_wit: i32,
}

impl Player {
    /// Fresh anonymous identity placed at the start room.
    pub fn guest(tag: &str, start_room: &str) -> Self {
        let stats = StatBlock::default();
        Self {
            name: format!("{}{}", GUEST_PREFIX, tag),
            password_hash: None,
            location: start_room.to_string(),
            level: 1,
            xp: 0,
            gold: 50,
            stats,
            current_hp: stats.hardiness,
            equipped: None,
            inventory: Vec::new(),
            combat_target: None,
            blur_wit: 0,
        }
    }

    pub fn is_guest(&self) -> bool {
        self.password_hash.is_none()
    }

    pub fn is_engaged(&self) -> bool {
        self.combat_target.is_some()
    }

    /// Wit used for mitigation and retreat rolls, including the blur bonus.
    pub fn effective_wit(&self) -> i32 {
        self.stats.wit + self.blur_wit
    }

    /// Rebuild live state from a persisted record.
    pub fn from_record(record: PlayerRecord) -> Self {
        let stats = StatBlock {
            attunement: record.attunement,
            hardiness: record.hardiness,
            wit: record.wit,
        };
        Self {
            name: record.username,
            password_hash: Some(record.password_hash),
            location: record.location,
            level: record.level,
            xp: record.xp,
            gold: record.gold,
            stats,
            current_hp: record.current_hp.clamp(0, stats.hardiness),
            equipped: record.equipped,
            inventory: record.inventory,
            combat_target: None,
            blur_wit: 0,
        }
    }

    /// Snapshot the persistable parts of this player. Returns `None` for
    /// guests, which are never written to the store.
    pub fn to_record(&self) -> Option<PlayerRecord> {
        let password_hash = self.password_hash.clone()?;
        let now = Utc::now();
        Some(PlayerRecord {
            username: self.name.clone(),
            password_hash,
            location: self.location.clone(),
            level: self.level,
            xp: self.xp,
            gold: self.gold,
            attunement: self.stats.attunement,
            hardiness: self.stats.hardiness,
            wit: self.stats.wit,
            current_hp: self.current_hp,
            equipped: self.equipped.clone(),
            inventory: self.inventory.clone(),
            created_at: now,
            updated_at: now,
            schema_version: PLAYER_SCHEMA_VERSION,
        })
    }
}

/// Persisted shape of a registered player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub username: String,
    pub password_hash: String,
    pub location: String,
    pub level: u32,
    pub xp: u32,
    pub gold: u32,
    pub attunement: i32,
    pub hardiness: i32,
    pub wit: i32,
    pub current_hp: i32,
    pub equipped: Option<String>,
    pub inventory: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl PlayerRecord {
    /// Record for a freshly registered player with default starting stats.
    pub fn new(username: &str, password_hash: &str, start_room: &str) -> Self {
        let now = Utc::now();
        let stats = StatBlock::default();
        Self {
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            location: start_room.to_string(),
            level: 1,
            xp: 0,
            gold: 50,
            attunement: stats.attunement,
            hardiness: stats.hardiness,
            wit: stats.wit,
            current_hp: stats.hardiness,
            equipped: None,
            inventory: Vec::new(),
            created_at: now,
            updated_at: now,
            schema_version: PLAYER_SCHEMA_VERSION,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monster_ids_are_unique() {
        let a = Monster::spawn("Ink Sprite", 20, 5, 25, 5, "void_dust");
        let b = Monster::spawn("Ink Sprite", 20, 5, 25, 5, "void_dust");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn guest_players_never_produce_records() {
        let guest = Player::guest("ab12", "1");
        assert!(guest.is_guest());
        assert!(guest.to_record().is_none());
    }

    #[test]
    fn record_round_trips_into_live_state() {
        let mut record = PlayerRecord::new("keeper", "$argon2id$stub", "1");
        record.gold = 123;
        record.inventory = vec!["potion".into(), "potion".into()];
        let player = Player::from_record(record.clone());
        assert_eq!(player.name, "keeper");
        assert_eq!(player.gold, 123);
        assert_eq!(player.inventory.len(), 2);
        let back = player.to_record().expect("registered");
        assert_eq!(back.username, record.username);
        assert_eq!(back.inventory, record.inventory);
    }

    #[test]
    fn first_aggressor_skips_dead_and_passive() {
        let dead = {
            let mut m = Monster::spawn("Gargoyle", 90, 18, 150, 45, "crystal").aggro();
            m.dead_until = Some(Utc::now());
            m
        };
        let passive = Monster::spawn("Castle Guard", 60, 10, 40, 15, "iron_key");
        let live = Monster::spawn("Ink Sprite", 20, 5, 25, 5, "void_dust").aggro();
        let room = Room::new("2", "Library", "Shelves.")
            .with_monster(dead)
            .with_monster(passive)
            .with_monster(live);
        assert_eq!(room.first_aggressor().map(|m| m.name.as_str()), Some("Ink Sprite"));
    }
}
