//! Immutable item and spell catalogs.
//!
//! These tables are configuration data consumed by the engine, loaded once at
//! startup and never mutated. Ids are the tokens players type; display names
//! are what the transport renders.

use std::collections::HashMap;

/// Broad item classification driving how `use`, `wield` and shops treat it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Potion,
    Food,
    Weapon,
    Material,
    Quest,
    Flavor,
}

/// Effect applied when an item is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemEffect {
    /// Restore hit points, capped at Hardiness.
    Heal(i32),
    /// Permanently raise Attunement.
    BoostAttunement(i32),
    /// Opens something, somewhere.
    Unlock,
    /// Claiming this wins the castle.
    Win,
}

#[derive(Debug, Clone)]
pub struct ItemDef {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: ItemKind,
    pub price: u32,
    pub effect: Option<ItemEffect>,
    /// Resale/market value in gold.
    pub value: u32,
    /// Bonus damage when wielded; zero for non-weapons.
    pub damage: i32,
    pub description: &'static str,
}

/// Effect of a castable spell. Spell costs are paid in hit points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpellEffect {
    /// Damage = Attunement scaled by `multiplier_pct` / 100.
    Fireball { multiplier_pct: u32 },
    Mend { heal: i32 },
    /// Transient Wit bonus for the rest of the session.
    Blur { wit_bonus: i32 },
}

#[derive(Debug, Clone)]
pub struct SpellDef {
    pub id: &'static str,
    pub cost: i32,
    pub effect: SpellEffect,
    pub description: &'static str,
}

/// Items Phil keeps in stock wherever a shop flag is set.
pub const SHOP_STOCK: &[&str] = &["potion", "crystal", "elixir", "sword", "broadsword", "spoon"];

/// Item and spell lookup tables, built once at engine startup.
pub struct Catalog {
    items: HashMap<&'static str, ItemDef>,
    spells: HashMap<&'static str, SpellDef>,
}

impl Catalog {
    pub fn new() -> Self {
        let mut items = HashMap::new();
        for def in item_defs() {
            items.insert(def.id, def);
        }
        let mut spells = HashMap::new();
        for def in spell_defs() {
            spells.insert(def.id, def);
        }
        Self { items, spells }
    }

    pub fn item(&self, id: &str) -> Option<&ItemDef> {
        self.items.get(id)
    }

    pub fn spell(&self, id: &str) -> Option<&SpellDef> {
        self.spells.get(id)
    }

    /// Resolve a player-typed token against item ids first, then display
    /// names (case-insensitive), so "get Old Map" works as well as
    /// "get old_map".
    pub fn resolve_item(&self, token: &str) -> Option<&ItemDef> {
        if let Some(def) = self.items.get(token) {
            return Some(def);
        }
        let lowered = token.to_ascii_lowercase();
        self.items
            .values()
            .find(|def| def.name.to_ascii_lowercase() == lowered)
    }

    /// Bonus damage for an equipped weapon id; zero when unarmed or when the
    /// id is not a weapon.
    pub fn weapon_damage(&self, equipped: Option<&str>) -> i32 {
        equipped
            .and_then(|id| self.items.get(id))
            .filter(|def| def.kind == ItemKind::Weapon)
            .map(|def| def.damage)
            .unwrap_or(0)
    }

    pub fn item_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.items.keys().copied()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

fn item(
    id: &'static str,
    name: &'static str,
    kind: ItemKind,
    price: u32,
    effect: Option<ItemEffect>,
    value: u32,
    damage: i32,
    description: &'static str,
) -> ItemDef {
    ItemDef {
        id,
        name,
        kind,
        price,
        effect,
        value,
        damage,
        description,
    }
}

fn item_defs() -> Vec<ItemDef> {
    use ItemEffect::*;
    use ItemKind::*;
    vec![
        // Consumables
        item("potion", "Red Potion", Potion, 20, Some(Heal(30)), 30, 0,
            "A bubbling crimson liquid. Heals 30 HP."),
        item("elixir", "Luminous Elixir", Potion, 50, Some(Heal(100)), 100, 0,
            "Smells like ozone. Heals 100 HP."),
        item("stale_bread", "Stale Bread", Food, 2, Some(Heal(5)), 5, 0,
            "Hard enough to use as a weapon, but edible. Heals 5 HP."),
        // Weapons
        item("ladle", "Plastic Ladle", Weapon, 5, None, 1, 1,
            "How could this get worse as a weapon?"),
        item("spoon", "Wooden Spoon", Weapon, 10, None, 2, 2,
            "What are you going to do, stir me to death?"),
        item("rusty_sword", "Rusty Sword", Weapon, 15, None, 5, 3,
            "Better than your fists, barely."),
        item("sword", "Iron Longsword", Weapon, 50, None, 10, 15,
            "A crude iron sword."),
        item("broadsword", "Heavy Broadsword", Weapon, 150, None, 75, 25,
            "A double-edged blade with a leather-wrapped hilt."),
        // Materials and quest items
        item("iron_ingot", "Iron Ingot", Material, 40, None, 20, 0,
            "A heavy block of metal. Could be used for crafting."),
        item("iron_key", "Iron Key", Quest, 0, Some(Unlock), 0, 0,
            "A heavy, skeleton-style key from the Foyer."),
        item("the_crown", "The Diamond Crown", Quest, 10000, Some(Win), 0, 0,
            "The ultimate symbol of the Castle's master."),
        // Attunement items
        item("crystal", "Prismatic Crystal", Potion, 100, Some(BoostAttunement(2)), 0, 0,
            "Used to increase your magical attunement (+2)."),
        item("chronoshard", "Chronoshard", Potion, 500, Some(BoostAttunement(10)), 0, 0,
            "A fragment of a broken timeline. +10 Attunement."),
        // Flavor and trash
        item("ever-ice", "Ever-Ice Brand Drink", Flavor, 10, None, 2, 0,
            "Deep Freeze Cool in every bottle. BEWARE: not for the warm-blooded."),
        item("eternal_watch", "Timepiece of an Eternal", Flavor, 1000, None, 250, 0,
            "An impressive watch. It keeps time you do not have."),
        item("broken_bottle", "Broken Beer Bottle", Flavor, 2, None, 0, 0,
            "Don't look too hard, you'll poke your eye out."),
        item("lump_of_coal", "Lump of Coal", Flavor, 2, None, 0, 0,
            "No value unless you're cold. Probably just put it back."),
        item("porcelain_cup", "Victorian Era Cup", Flavor, 2, None, 0, 0,
            "Just an old cup. It's empty."),
        item("sheet_music", "Old Sheet Music", Flavor, 2, None, 0, 0,
            "It contains half a poem. The first half is somewhere else."),
        item("old_map", "Old Map", Flavor, 5, None, 0, 0,
            "Smudged and unreadable."),
        item("parchment", "Scrap of Parchment", Flavor, 2, None, 0, 0,
            "It contains half a poem."),
        item("game_token", "Arcade Token", Flavor, 5, None, 0, 0,
            "Good for one game of Galaga... if the power was on."),
        item("void_dust", "Void Dust", Flavor, 25, None, 0, 0,
            "It slips through your fingers."),
        item("empty_vial", "Empty Vial", Flavor, 5, None, 0, 0,
            "Just a useless piece of glass."),
    ]
}

fn spell_defs() -> Vec<SpellDef> {
    vec![
        SpellDef {
            id: "fireball",
            cost: 10,
            effect: SpellEffect::Fireball { multiplier_pct: 250 },
            description: "High damage attack (10 HP).",
        },
        SpellDef {
            id: "mend",
            cost: 15,
            effect: SpellEffect::Mend { heal: 35 },
            description: "Heal mid-battle (15 HP).",
        },
        SpellDef {
            id: "blur",
            cost: 8,
            effect: SpellEffect::Blur { wit_bonus: 15 },
            description: "Boost escape chance (8 HP).",
        },
    ]
}
