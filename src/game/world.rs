//! The world graph: the fixed castle of rooms and the per-room locking
//! discipline every mutator goes through.
//!
//! The set of rooms and the portal graph are fixed at startup; only room
//! contents (item piles, monster lists) mutate at runtime. Each room sits
//! behind its own async mutex, and the graph exposes a sorted pair-locking
//! helper so two-room operations (monster wander) cannot deadlock.

use std::collections::HashMap;

use tokio::sync::{Mutex, MutexGuard};

use super::errors::GameError;
use super::types::{Monster, Room};

/// Owner of all room and monster state.
pub struct WorldGraph {
    rooms: HashMap<String, Mutex<Room>>,
    start_room: String,
    safe_room: String,
}

impl WorldGraph {
    /// Build a world from seeded rooms, validating graph integrity: every
    /// portal target, the start room, and the safe room must exist.
    pub fn from_rooms(rooms: Vec<Room>, start_room: &str, safe_room: &str) -> Result<Self, GameError> {
        let mut map = HashMap::new();
        for room in &rooms {
            for target in room.portals.keys() {
                if !rooms.iter().any(|r| &r.id == target) {
                    return Err(GameError::UnknownRoom(format!(
                        "portal from {} to undefined room {}",
                        room.id, target
                    )));
                }
            }
        }
        for room in rooms {
            map.insert(room.id.clone(), Mutex::new(room));
        }
        if !map.contains_key(start_room) {
            return Err(GameError::UnknownRoom(start_room.to_string()));
        }
        if !map.contains_key(safe_room) {
            return Err(GameError::UnknownRoom(safe_room.to_string()));
        }
        Ok(Self {
            rooms: map,
            start_room: start_room.to_string(),
            safe_room: safe_room.to_string(),
        })
    }

    /// The canonical castle with the configured entry points.
    pub fn canonical(start_room: &str, safe_room: &str) -> Result<Self, GameError> {
        Self::from_rooms(canonical_castle_seed(), start_room, safe_room)
    }

    pub fn start_room(&self) -> &str {
        &self.start_room
    }

    pub fn safe_room(&self) -> &str {
        &self.safe_room
    }

    pub fn contains(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// All room ids in sorted order, for deterministic sweeps.
    pub fn room_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.rooms.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Lock one room for reading or mutation.
    pub async fn lock(&self, room_id: &str) -> Result<MutexGuard<'_, Room>, GameError> {
        let room = self
            .rooms
            .get(room_id)
            .ok_or_else(|| GameError::UnknownRoom(room_id.to_string()))?;
        Ok(room.lock().await)
    }

    /// Lock two distinct rooms, always acquiring in sorted-id order. Guards
    /// are returned in argument order.
    pub async fn lock_pair(
        &self,
        a: &str,
        b: &str,
    ) -> Result<(MutexGuard<'_, Room>, MutexGuard<'_, Room>), GameError> {
        if a == b {
            return Err(GameError::Internal(format!(
                "lock_pair called with identical room {}",
                a
            )));
        }
        if a < b {
            let first = self.lock(a).await?;
            let second = self.lock(b).await?;
            Ok((first, second))
        } else {
            let second = self.lock(b).await?;
            let first = self.lock(a).await?;
            Ok((first, second))
        }
    }

    pub async fn room_name(&self, room_id: &str) -> Option<String> {
        let room = self.rooms.get(room_id)?;
        Some(room.lock().await.name.clone())
    }
}

/// The Castle of 144,000 Doors: 25 rooms across five regions. Deterministic
/// so tests can assert over the shape.
pub fn canonical_castle_seed() -> Vec<Room> {
    vec![
        // Region 1: the core castle
        Room::new("1", "The Grand Foyer",
            "The heart of the Castle. Phil sits at his card table outside his shop.")
            .with_portal("2", "The Library", 0)
            .with_portal("3", "The Kitchen", 0)
            .with_portal("4", "The Battlements", 0)
            .with_portal("8", "The Lab", 0)
            .with_portal("12", "The Music Room", 0)
            .with_portal("15", "The Armory", 0)
            .with_shop()
            .safe()
            .with_monster(
                Monster::spawn("Castle Guard", 60, 10, 40, 15, "iron_key").roaming(),
            ),
        Room::new("2", "The Library of Whispers",
            "Infinite shelves of gossip. Ozone fills the air.")
            .with_portal("1", "The Foyer", 0)
            .with_portal("16", "Restricted Section", 5)
            .with_portal("666", "The Void", 20)
            .with_item("parchment")
            .with_monster(Monster::spawn("Paper Golem", 50, 8, 60, 15, "potion"))
            .with_monster(
                Monster::spawn("Ink Sprite", 20, 5, 25, 5, "void_dust").aggro().roaming(),
            ),
        Room::new("3", "The Great Kitchens",
            "Gnomes and steam-powered spits. Smells like roasted phoenix.")
            .with_portal("1", "The Foyer", 0)
            .with_portal("20", "The Cellar", 0)
            .with_item("ladle")
            .with_monster(Monster::spawn("Kitchen Scullion", 40, 7, 40, 10, "potion").aggro()),
        Room::new("4", "The Outer Battlements",
            "Cold wind and a view of 144,000 horizons.")
            .with_portal("1", "The Foyer", 0)
            .with_portal("7", "Primeval World", 10)
            .with_portal("21", "Clockwork Tower", 5)
            .with_monster(Monster::spawn("Castle Gargoyle", 90, 18, 150, 45, "crystal").aggro())
            .with_monster(
                Monster::spawn("Castle Guard", 60, 10, 40, 15, "iron_key").roaming(),
            ),
        // Region 2: the arcane wing
        Room::new("8", "The Alchemical Laboratory",
            "Beakers bubble without heat. Smells of cloves.")
            .with_portal("1", "The Foyer", 0)
            .with_portal("9", "Crystal Garden", 2)
            .with_portal("22", "Hall of Mirrors", 5)
            .with_item("empty_vial")
            .with_monster(Monster::spawn("Homunculus", 70, 12, 90, 30, "elixir")),
        Room::new("9", "The Crystal Garden", "Flora made of prismatic glass.")
            .with_portal("8", "The Lab", 0)
            .with_portal("23", "Gravity Well", 15)
            .with_monster(Monster::spawn("Glass Spider", 110, 22, 180, 60, "crystal").aggro()),
        Room::new("15", "The Armory of Ages",
            "Suits of armor stand in silent vigil.")
            .with_portal("1", "The Foyer", 0)
            .with_portal("24", "The Observatory", 8)
            .with_item("rusty_sword")
            .with_monster(Monster::spawn("Animated Plate", 120, 25, 200, 50, "potion").aggro()),
        Room::new("16", "The Restricted Section",
            "Books here are chained to the walls because they bite.")
            .with_portal("2", "The Library", 0)
            .with_monster(Monster::spawn("Book Wyrm", 60, 14, 100, 25, "potion").aggro()),
        // Region 3: earth echoes
        Room::new("12", "The Music Room",
            "A piano plays itself. The notes are visible sparks.")
            .with_portal("1", "The Foyer", 0)
            .with_portal("13", "Victorian Parlour", 0)
            .with_portal("1984", "The Arcade", 0)
            .with_item("sheet_music"),
        Room::new("13", "The Victorian Parlor",
            "Dusty tea sets and velvet chairs. A grandfather clock ticks backward.")
            .with_portal("12", "The Music Room", 0)
            .with_portal("14", "The Fog of London", 0)
            .with_item("porcelain_cup"),
        Room::new("14", "London - 1888",
            "Fog so thick you can taste the coal smoke. A gaslight flickers.")
            .with_portal("13", "The Parlor", 0)
            .with_item("lump_of_coal")
            .with_monster(Monster::spawn("Street Urchin", 25, 5, 20, 2, "potion").roaming()),
        Room::new("1984", "The Neon Arcade",
            "Smells like stale popcorn and ozone. Pac-man beeps eternally.")
            .with_portal("12", "The Music Room", 0)
            .with_portal("25", "Dive Bar", 0)
            .with_item("game_token")
            .restful(),
        Room::new("25", "New York - The Dive Bar",
            "The Rusty Anchor. A jukebox plays 'True' by Spandau Ballet.")
            .with_portal("1984", "The Arcade", 0)
            .with_item("broken_bottle")
            .with_monster(Monster::spawn("Drunk Brawler", 55, 10, 70, 12, "potion").aggro()),
        // Region 4: the wilds below and beyond
        Room::new("7", "The Primeval World",
            "A humid jungle behind portal seven. Dinosaurs rule here.")
            .with_portal("4", "The Outer Battlements", 0)
            .with_portal("26", "Tar Pits", 0)
            .with_monster(
                Monster::spawn("Allosaurus", 300, 45, 700, 200, "crystal").aggro().roaming(),
            ),
        Room::new("26", "The Tar Pits",
            "A sticky, bubbling landscape. Skeletal remains poke out of the black goo.")
            .with_portal("7", "Primeval World", 0)
            .with_monster(Monster::spawn("Tar Elemental", 150, 20, 250, 40, "elixir").aggro()),
        Room::new("20", "The Wine Cellar",
            "Vast tuns of wine that could drown a giant. Deeply dark.")
            .with_portal("3", "The Kitchen", 0)
            .with_portal("27", "Dark Catacombs", 0)
            .with_monster(Monster::spawn("Giant Spider", 45, 9, 50, 5, "potion").aggro()),
        Room::new("27", "The Catacombs",
            "The bones of former Guests form the architecture here.")
            .with_portal("20", "The Cellar", 0)
            .with_portal("28", "Frozen Waste", 0)
            .with_monster(
                Monster::spawn("Skeletal Guest", 80, 15, 120, 30, "crystal").aggro().roaming(),
            ),
        // Region 5: the outer realms
        Room::new("666", "The Void", "Gravity is a suggestion.")
            .with_portal("2", "The Library", 0)
            .with_portal("667", "Edge of Forever", 50)
            .with_monster(
                Monster::spawn("Chaos Beast", 250, 35, 500, 120, "crystal").aggro().roaming(),
            ),
        Room::new("667", "The Edge of Forever",
            "A platform of white light overlooking the end of time. The silence is deafening.")
            .with_portal("666", "The Void", 0)
            .with_portal("999", "The Throne Room", 75)
            .with_item("void_dust")
            .with_item("chronoshard")
            .with_monster(Monster::spawn("Time Warden", 400, 55, 1000, 500, "eternal_watch").aggro()),
        Room::new("999", "The Throne Room",
            "A massive seat carved from a single diamond.")
            .with_portal("667", "Edge of Forever", 0)
            .with_item("the_crown")
            .with_monster(Monster::spawn("Incarnadine Avatar", 1000, 80, 5000, 2000, "crystal")),
        // Additional oddities
        Room::new("21", "The Clockwork Tower",
            "Gears the size of houses grind against each other.")
            .with_portal("4", "Outer Battlements", 0)
            .with_monster(Monster::spawn("Clockwork Soldier", 100, 20, 180, 40, "potion").aggro()),
        Room::new("22", "The Hall of Mirrors",
            "Every reflection shows a different version of you.")
            .with_portal("8", "The Lab", 0)
            .with_monster(Monster::spawn("Mirror Doppelganger", 90, 18, 160, 35, "elixir").aggro()),
        Room::new("23", "The Gravity Well",
            "You walk on the walls. The floor is the ceiling.")
            .with_portal("9", "Crystal Garden", 0)
            .with_monster(
                Monster::spawn("Void Manta", 130, 28, 220, 70, "crystal").aggro().roaming(),
            ),
        Room::new("24", "The Solar Observatory",
            "A lens focuses the light of a distant supernova onto a map.")
            .with_portal("15", "The Armory", 0)
            .with_monster(Monster::spawn("Solar Flare", 140, 30, 240, 80, "crystal").aggro()),
        Room::new("28", "The Frozen Waste",
            "An eternal blizzard. The air freezes in your lungs.")
            .with_portal("27", "Dark Catacombs", 0)
            .with_item("ever-ice")
            .with_monster(Monster::spawn("Frost Giant", 200, 38, 350, 90, "potion").aggro()),
    ]
}
