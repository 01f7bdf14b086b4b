//! Command dispatch: per-verb handlers over the engine.
//!
//! Dispatch is a synchronous request/response machine per incoming line: it
//! resolves the issuing session, parses the verb, enforces the
//! authentication gate and per-verb preconditions, mutates world state under
//! the standard locks, persists registered players on state change, and
//! publishes outcome events.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::logutil::escape_log;
use crate::validation::validate_player_name;

use super::catalog::{Catalog, ItemEffect, ItemKind, SpellEffect, SHOP_STOCK};
use super::combat;
use super::commands::Command;
use super::engine::Engine;
use super::errors::GameError;
use super::events::{GameEvent, LeaderboardEntry};
use super::session::Session;
use super::storage::{hash_password, verify_password};
use super::types::{MonsterId, Player, PlayerRecord};

const MIN_PASSWORD_LEN: usize = 4;

/// What the transport should do after a dispatched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Continue,
    /// The session quit; the connection should be closed.
    Disconnect,
}

pub struct Dispatcher {
    engine: Arc<Engine>,
}

impl Dispatcher {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    /// Process one input line for a session.
    pub async fn dispatch(
        &self,
        session_id: &str,
        line: &str,
    ) -> Result<DispatchOutcome, GameError> {
        let session = self
            .engine
            .sessions
            .get(session_id)
            .await
            .ok_or_else(|| GameError::UnknownSession(session_id.to_string()))?;
        let command = Command::parse(line);
        if command == Command::Empty {
            return Ok(DispatchOutcome::Continue);
        }
        debug!("session {}: {}", session_id, escape_log(line));

        // Authentication gate: until the session is bound to a registered
        // identity, only login and help are accepted.
        let is_guest = session.player.lock().await.is_guest();
        if is_guest && !matches!(command, Command::Login { .. } | Command::Help) {
            self.engine.events.to_session(
                session_id,
                GameEvent::Error("Identify yourself. Use: login <name> <password>".into()),
            );
            return Ok(DispatchOutcome::Continue);
        }

        match command {
            Command::Login { name, password } => {
                self.handle_login(&session, &name, &password).await?
            }
            Command::Quit => return self.handle_quit(&session).await,
            Command::Help => self.handle_help(&session),
            Command::Look => self.handle_look(&session).await?,
            Command::Who => self.handle_who(&session).await,
            Command::Stats => self.handle_stats(&session).await,
            Command::Inventory => self.handle_inventory(&session).await,
            Command::ShopList => self.handle_shop_list(&session).await?,
            Command::Buy { item } => self.handle_buy(&session, &item).await?,
            Command::Cast { spell } => self.handle_cast(&session, &spell).await?,
            Command::Go { portal } => self.handle_go(&session, &portal).await?,
            Command::Attack { query } => self.handle_attack(&session, query.as_deref()).await?,
            Command::Retreat => combat::try_retreat(&self.engine, &session).await,
            Command::Say { text } => self.handle_say(&session, &text).await,
            Command::Shout { text } => self.handle_shout(&session, &text).await,
            Command::Use { item } => self.handle_use(&session, &item).await,
            Command::Where { name } => self.handle_where(&session, &name).await,
            Command::Top => self.handle_top(&session),
            Command::Wield { item } => self.handle_wield(&session, &item).await,
            Command::Unwield => self.handle_unwield(&session).await,
            Command::Inspect { target } => self.handle_inspect(&session, &target).await,
            Command::Take { item } => self.handle_take(&session, &item).await?,
            Command::Drop { item } => self.handle_drop(&session, &item).await?,
            Command::Give { item, target } => self.handle_give(&session, &item, &target).await,
            Command::Junk { item } => self.handle_junk(&session, &item).await,
            Command::Usage(usage) => {
                self.engine
                    .events
                    .to_session(session_id, GameEvent::Error(usage.to_string()));
            }
            Command::Unknown(verb) => {
                self.engine.events.to_session(
                    session_id,
                    GameEvent::Error(format!(
                        "The command '{}' is not available at this time.",
                        verb
                    )),
                );
            }
            Command::Empty => {}
        }
        Ok(DispatchOutcome::Continue)
    }

    async fn handle_login(
        &self,
        session: &Arc<Session>,
        name: &str,
        password: &str,
    ) -> Result<(), GameError> {
        let session_id = session.id.as_str();
        match self.engine.store.get_player(name) {
            Ok(record) => {
                if !verify_password(&record.password_hash, password) {
                    self.engine.events.to_session(
                        session_id,
                        GameEvent::Error("Incorrect password for this Guest.".into()),
                    );
                    return Ok(());
                }
                if let Some(existing) = self.engine.sessions.find_by_player_name(name).await {
                    if existing.id != session.id {
                        self.engine.events.to_session(
                            session_id,
                            GameEvent::Error(format!(
                                "{} is already wandering the castle.",
                                record.username
                            )),
                        );
                        return Ok(());
                    }
                }
                self.bind(session, record, false).await
            }
            Err(GameError::NotFound(_)) => {
                if let Err(e) = validate_player_name(name) {
                    self.engine
                        .events
                        .to_session(session_id, GameEvent::Error(e.to_string()));
                    return Ok(());
                }
                if password.len() < MIN_PASSWORD_LEN {
                    self.engine.events.to_session(
                        session_id,
                        GameEvent::Error(format!(
                            "Password too short (minimum {} characters).",
                            MIN_PASSWORD_LEN
                        )),
                    );
                    return Ok(());
                }
                let hash = match hash_password(password) {
                    Ok(hash) => hash,
                    Err(e) => {
                        warn!("password hash failed during registration: {}", e);
                        self.engine.events.to_session(
                            session_id,
                            GameEvent::Error("Registration failed. Try again.".into()),
                        );
                        return Ok(());
                    }
                };
                let record = PlayerRecord::new(name, &hash, self.engine.world.start_room());
                if let Err(e) = self.engine.store.put_player(record.clone()) {
                    warn!("registration save failed for {}: {}", escape_log(name), e);
                    self.engine.events.to_session(
                        session_id,
                        GameEvent::Error("The archives are unavailable. Try again.".into()),
                    );
                    return Ok(());
                }
                self.bind(session, record, true).await
            }
            Err(e) => {
                warn!("player load failed for {}: {}", escape_log(name), e);
                self.engine.events.to_session(
                    session_id,
                    GameEvent::Error("The archives are unavailable. Try again.".into()),
                );
                Ok(())
            }
        }
    }

    /// Bind a session to a loaded record, releasing any prior engagement.
    async fn bind(
        &self,
        session: &Arc<Session>,
        record: PlayerRecord,
        fresh: bool,
    ) -> Result<(), GameError> {
        session.abort_combat().await;
        let mut player = session.player.lock().await;
        if let Some(target) = player.combat_target.take() {
            if let Ok(mut room) = self.engine.world.lock(&player.location).await {
                if let Some(monster) = room.monster_mut(target) {
                    monster.engaged_by.remove(session.id.as_str());
                }
            }
        }
        let username = record.username.clone();
        let mut incoming = Player::from_record(record);
        if !self.engine.world.contains(&incoming.location) {
            incoming.location = self.engine.world.start_room().to_string();
        }
        *player = incoming;
        let greeting = if fresh {
            format!("New Guest {} registered and logged in!", username)
        } else {
            format!("Authenticated. Welcome back, {}!", username)
        };
        self.engine
            .events
            .to_session(&session.id, GameEvent::Info(greeting));
        let view = self.engine.room_view(&player).await?;
        self.engine.events.to_session(&session.id, view);
        info!("session {} bound to {}", session.id, escape_log(&username));
        drop(player);
        combat::maybe_aggro(&self.engine, session).await;
        Ok(())
    }

    async fn handle_quit(&self, session: &Arc<Session>) -> Result<DispatchOutcome, GameError> {
        if session.player.lock().await.is_engaged() {
            self.engine.events.to_session(
                &session.id,
                GameEvent::Error("You cannot quit while in combat! Fight or flee first!".into()),
            );
            return Ok(DispatchOutcome::Continue);
        }
        self.engine.events.to_session(
            &session.id,
            GameEvent::Info("You phase out of existence.".into()),
        );
        self.engine.disconnect(&session.id).await?;
        Ok(DispatchOutcome::Disconnect)
    }

    fn handle_help(&self, session: &Arc<Session>) {
        let help = "\
--- COMMANDS ---
login <name> <password>: log in, or register a new hero
quit: leave these realms
look: scan the room
stats: view your status
go <portal>: step through a portal
attack [name]: fight a monster nearby
retreat: flee to safety, if your nerve holds
cast <spell>: fireball / mend / blur
inv: view your pack
list: list the shop's wares
buy <item>: buy from the shop
use <item>: use an item from your pack
wield <item>: ready a weapon
unwield: sheath your weapon
inspect <item or player>: what is this thing?
get <item>: pick something off the floor
drop <item>: leave something behind
give <item> <player>: hand an item over
junk <item>: destroy an item
say <text>: talk to the room
shout <text>: yell across the castle
who: who else is here
where <name>: find another player
top: the legends of the realm";
        self.engine
            .events
            .to_session(&session.id, GameEvent::Info(help.to_string()));
    }

    async fn handle_look(&self, session: &Arc<Session>) -> Result<(), GameError> {
        {
            let player = session.player.lock().await;
            let view = self.engine.room_view(&player).await?;
            self.engine.events.to_session(&session.id, view);
        }
        combat::maybe_aggro(&self.engine, session).await;
        Ok(())
    }

    async fn handle_who(&self, session: &Arc<Session>) {
        let sessions = self.engine.sessions.snapshot().await;
        let mut lines = vec!["--- Guests in the Realm ---".to_string()];
        let total = sessions.len();
        for other in sessions {
            let player = other.player.lock().await;
            let room_name = self
                .engine
                .world
                .room_name(&player.location)
                .await
                .unwrap_or_else(|| "an unknown void".to_string());
            lines.push(format!("Lvl {} {} - {}", player.level, player.name, room_name));
        }
        lines.push(format!("--- Total: {} ---", total));
        self.engine
            .events
            .to_session(&session.id, GameEvent::Info(lines.join("\n")));
    }

    async fn handle_stats(&self, session: &Arc<Session>) {
        let player = session.player.lock().await;
        let equipped = player
            .equipped
            .as_deref()
            .map(|id| self.engine.item_name(id))
            .unwrap_or_else(|| "fists".to_string());
        let line = format!(
            "Name: {} | Lvl: {} | HP: {}/{} | ATN: {} | WIT: {} | Gold: {} | XP: {} | Wielding: {}",
            player.name,
            player.level,
            player.current_hp.max(0),
            player.stats.hardiness,
            player.stats.attunement,
            player.effective_wit(),
            player.gold,
            player.xp,
            equipped
        );
        self.engine
            .events
            .to_session(&session.id, GameEvent::Info(line));
    }

    async fn handle_inventory(&self, session: &Arc<Session>) {
        let player = session.player.lock().await;
        if player.inventory.is_empty() {
            self.engine
                .events
                .to_session(&session.id, GameEvent::Info("Your pack is empty.".into()));
            return;
        }
        // Collapse duplicates while preserving first-seen order.
        let mut counted: Vec<(String, u32)> = Vec::new();
        for id in &player.inventory {
            let name = self.engine.item_name(id);
            match counted.iter_mut().find(|(n, _)| n == &name) {
                Some((_, count)) => *count += 1,
                None => counted.push((name, 1)),
            }
        }
        let listing = counted
            .into_iter()
            .map(|(name, count)| {
                if count > 1 {
                    format!("{} (x{})", name, count)
                } else {
                    name
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        self.engine
            .events
            .to_session(&session.id, GameEvent::Info(format!("You carry: {}", listing)));
    }

    async fn handle_shop_list(&self, session: &Arc<Session>) -> Result<(), GameError> {
        let player = session.player.lock().await;
        let room = self.engine.world.lock(&player.location).await?;
        if !room.has_shop {
            self.engine.events.to_session(
                &session.id,
                GameEvent::Error("There is no shop here.".into()),
            );
            return Ok(());
        }
        let listing = SHOP_STOCK
            .iter()
            .filter_map(|id| self.engine.catalog.item(id))
            .map(|def| format!("{} ({}g)", def.name, def.price))
            .collect::<Vec<_>>()
            .join(", ");
        self.engine.events.to_session(
            &session.id,
            GameEvent::Info(format!("Phil's wares: {}", listing)),
        );
        Ok(())
    }

    async fn handle_buy(&self, session: &Arc<Session>, item: &str) -> Result<(), GameError> {
        let mut player = session.player.lock().await;
        let room = self.engine.world.lock(&player.location).await?;
        if !room.has_shop {
            self.engine.events.to_session(
                &session.id,
                GameEvent::Error("Are you sure there is a shop here?".into()),
            );
            return Ok(());
        }
        drop(room);
        let Some(def) = self.engine.catalog.resolve_item(item) else {
            self.engine.events.to_session(
                &session.id,
                GameEvent::Error(format!("Phil has never heard of a '{}'.", item)),
            );
            return Ok(());
        };
        if !SHOP_STOCK.contains(&def.id) {
            self.engine.events.to_session(
                &session.id,
                GameEvent::Error(format!("Phil doesn't stock the {}.", def.name)),
            );
            return Ok(());
        }
        if player.gold < def.price {
            self.engine.events.to_session(
                &session.id,
                GameEvent::Error("Check your coin purse; you can't afford that.".into()),
            );
            return Ok(());
        }
        player.gold -= def.price;
        player.inventory.push(def.id.to_string());
        self.engine.persist(&player);
        self.engine.events.to_session(
            &session.id,
            GameEvent::Info(format!("Bought {} for {} gold.", def.name, def.price)),
        );
        Ok(())
    }

    async fn handle_cast(&self, session: &Arc<Session>, spell: &str) -> Result<(), GameError> {
        let session_id = session.id.as_str();
        let Some(def) = self.engine.catalog.spell(spell) else {
            self.engine.events.to_session(
                session_id,
                GameEvent::Error(format!("You don't know the spell '{}'.", spell)),
            );
            return Ok(());
        };
        let mut player = session.player.lock().await;
        if player.current_hp <= def.cost {
            self.engine.events.to_session(
                session_id,
                GameEvent::Error("You lack the vitality to cast that.".into()),
            );
            return Ok(());
        }
        match def.effect {
            SpellEffect::Fireball { multiplier_pct } => {
                let Some(target) = player.combat_target else {
                    self.engine.events.to_session(
                        session_id,
                        GameEvent::Error("The fire needs a foe; you are not in combat.".into()),
                    );
                    return Ok(());
                };
                let damage = player.stats.attunement * multiplier_pct as i32 / 100;
                let mut room = self.engine.world.lock(&player.location).await?;
                let Some((name, hp_left)) =
                    room.monster_mut(target).filter(|m| m.is_alive()).map(|m| {
                        m.hp -= damage;
                        (m.name.clone(), m.hp)
                    })
                else {
                    // Target vanished between rounds; the engagement just ends.
                    player.combat_target = None;
                    self.engine
                        .events
                        .to_session(session_id, GameEvent::Info("Your target is gone.".into()));
                    return Ok(());
                };
                player.current_hp -= def.cost;
                self.engine.events.to_session(
                    session_id,
                    GameEvent::CombatHit {
                        target: name,
                        damage,
                        target_hp: hp_left.max(0),
                    },
                );
                if hp_left <= 0 {
                    combat::finish_kill(&self.engine, session_id, &mut player, &mut room, target);
                }
                drop(room);
                self.engine.persist(&player);
            }
            SpellEffect::Mend { heal } => {
                player.current_hp -= def.cost;
                player.current_hp = (player.current_hp + heal).min(player.stats.hardiness);
                self.engine.events.to_session(
                    session_id,
                    GameEvent::Info(format!(
                        "You knit your wounds closed. (HP: {})",
                        player.current_hp
                    )),
                );
                self.engine.persist(&player);
            }
            SpellEffect::Blur { wit_bonus } => {
                player.current_hp -= def.cost;
                player.blur_wit = wit_bonus;
                self.engine.events.to_session(
                    session_id,
                    GameEvent::Info(format!(
                        "The world smears around you. (+{} Wit while it lasts)",
                        wit_bonus
                    )),
                );
                self.engine.persist(&player);
            }
        }
        Ok(())
    }

    async fn handle_go(&self, session: &Arc<Session>, portal: &str) -> Result<(), GameError> {
        let session_id = session.id.as_str();
        let mut player = session.player.lock().await;
        if player.is_engaged() {
            self.engine.events.to_session(
                session_id,
                GameEvent::Error("You can't walk away while being attacked!".into()),
            );
            return Ok(());
        }
        let old_room = player.location.clone();
        {
            let room = self.engine.world.lock(&old_room).await?;
            let Some(gate) = room.portals.get(portal) else {
                self.engine
                    .events
                    .to_session(session_id, GameEvent::Error("Invalid portal.".into()));
                return Ok(());
            };
            if player.stats.attunement < gate.min_attunement {
                self.engine.events.to_session(
                    session_id,
                    GameEvent::Error(
                        "The portal remains solid. You need more Attunement.".into(),
                    ),
                );
                return Ok(());
            }
        }
        self.engine.events.to_room_except(
            &old_room,
            &[session_id],
            GameEvent::PlayerDeparted {
                name: player.name.clone(),
            },
        );
        player.location = portal.to_string();
        self.engine.persist(&player);
        self.engine.events.to_room_except(
            portal,
            &[session_id],
            GameEvent::PlayerArrived {
                name: player.name.clone(),
            },
        );
        let view = self.engine.room_view(&player).await?;
        self.engine.events.to_session(session_id, view);
        drop(player);
        combat::maybe_aggro(&self.engine, session).await;
        Ok(())
    }

    async fn handle_attack(
        &self,
        session: &Arc<Session>,
        query: Option<&str>,
    ) -> Result<(), GameError> {
        let session_id = session.id.as_str();
        let was_engaged;
        {
            let mut player = session.player.lock().await;
            let mut room = self.engine.world.lock(&player.location).await?;
            if room.is_safe {
                self.engine.events.to_session(
                    session_id,
                    GameEvent::Error("This is a safe area; no one fights here.".into()),
                );
                return Ok(());
            }
            let living: Vec<(MonsterId, String)> = room
                .living_monsters()
                .map(|m| (m.id, m.name.clone()))
                .collect();
            if living.is_empty() {
                self.engine.events.to_session(
                    session_id,
                    GameEvent::Error("There is nothing here to attack.".into()),
                );
                return Ok(());
            }
            let chosen = match query {
                Some(q) => living
                    .iter()
                    .find(|(_, name)| name.to_ascii_lowercase().contains(q)),
                None => living.first(),
            };
            let Some((target, name)) = chosen.cloned() else {
                self.engine.events.to_session(
                    session_id,
                    GameEvent::Error(format!(
                        "You don't see a '{}' here.",
                        query.unwrap_or_default()
                    )),
                );
                return Ok(());
            };
            was_engaged = player.combat_target.is_some();
            if let Some(previous) = player.combat_target {
                if previous != target {
                    if let Some(monster) = room.monster_mut(previous) {
                        monster.engaged_by.remove(session_id);
                    }
                }
            }
            player.combat_target = Some(target);
            if let Some(monster) = room.monster_mut(target) {
                monster.engaged_by.insert(session_id.to_string());
            }
            let event = if was_engaged {
                GameEvent::Info(format!("You shift your focus to the {}!", name))
            } else {
                GameEvent::Engaged { monster: name }
            };
            self.engine.events.to_session(session_id, event);
        }
        // A set target should always be backed by a live loop task.
        if !was_engaged || !session.combat_running().await {
            combat::spawn_loop(&self.engine, session).await;
        }
        Ok(())
    }

    async fn handle_say(&self, session: &Arc<Session>, text: &str) {
        let player = session.player.lock().await;
        self.engine.events.to_room(
            &player.location,
            GameEvent::Says {
                speaker: player.name.clone(),
                text: text.to_string(),
            },
        );
    }

    async fn handle_shout(&self, session: &Arc<Session>, text: &str) {
        let player = session.player.lock().await;
        self.engine.events.broadcast(GameEvent::Shouts {
            speaker: player.name.clone(),
            text: text.to_string(),
        });
    }

    async fn handle_use(&self, session: &Arc<Session>, item: &str) {
        let session_id = session.id.as_str();
        let mut player = session.player.lock().await;
        let Some(position) = find_in_pack(&player.inventory, item, &self.engine.catalog) else {
            self.engine.events.to_session(
                session_id,
                GameEvent::Error("You aren't carrying that.".into()),
            );
            return;
        };
        let id = player.inventory[position].clone();
        let Some(def) = self.engine.catalog.item(&id) else {
            self.engine.events.to_session(
                session_id,
                GameEvent::Error("You aren't carrying that.".into()),
            );
            return;
        };
        match (def.kind, def.effect) {
            (ItemKind::Potion | ItemKind::Food, Some(ItemEffect::Heal(amount))) => {
                player.current_hp = (player.current_hp + amount).min(player.stats.hardiness);
                let hp = player.current_hp;
                player.inventory.remove(position);
                self.engine.events.to_session(
                    session_id,
                    GameEvent::Info(format!(
                        "You consume the {}. Healed for {} HP. (HP: {})",
                        def.name, amount, hp
                    )),
                );
                self.engine.persist(&player);
            }
            (ItemKind::Potion | ItemKind::Food, Some(ItemEffect::BoostAttunement(amount))) => {
                player.stats.attunement += amount;
                player.inventory.remove(position);
                self.engine.events.to_session(
                    session_id,
                    GameEvent::Info(format!(
                        "The {} shatters! Attunement increased by {}.",
                        def.name, amount
                    )),
                );
                self.engine.persist(&player);
            }
            (ItemKind::Weapon, _) => {
                self.engine.events.to_session(
                    session_id,
                    GameEvent::Info("You can't eat that. Try 'wield' instead.".into()),
                );
            }
            _ => {
                self.engine.events.to_session(
                    session_id,
                    GameEvent::Info(format!(
                        "You fiddle with the {}, but nothing happens.",
                        def.name
                    )),
                );
            }
        }
    }

    async fn handle_where(&self, session: &Arc<Session>, name: &str) {
        let Some(found) = self.engine.sessions.find_by_player_name(name).await else {
            self.engine.events.to_session(
                &session.id,
                GameEvent::Error(format!("'{}' is not currently in this reality.", name)),
            );
            return;
        };
        let (player_name, location) = {
            let player = found.player.lock().await;
            (player.name.clone(), player.location.clone())
        };
        let room_name = self
            .engine
            .world
            .room_name(&location)
            .await
            .unwrap_or_else(|| "an unknown void".to_string());
        self.engine.events.to_session(
            &session.id,
            GameEvent::Info(format!("{} is currently in: {}", player_name, room_name)),
        );
    }

    fn handle_top(&self, session: &Arc<Session>) {
        match self.engine.store.top_players(10) {
            Ok(records) if records.is_empty() => {
                self.engine.events.to_session(
                    &session.id,
                    GameEvent::Info("The history books are currently empty.".into()),
                );
            }
            Ok(records) => {
                let entries = records
                    .into_iter()
                    .map(|r| LeaderboardEntry {
                        name: r.username,
                        level: r.level,
                        xp: r.xp,
                        gold: r.gold,
                    })
                    .collect();
                self.engine
                    .events
                    .to_session(&session.id, GameEvent::Leaderboard { entries });
            }
            Err(e) => {
                warn!("leaderboard query failed: {}", e);
                self.engine.events.to_session(
                    &session.id,
                    GameEvent::Error("The history books are unreadable right now.".into()),
                );
            }
        }
    }

    async fn handle_wield(&self, session: &Arc<Session>, item: &str) {
        let session_id = session.id.as_str();
        let mut player = session.player.lock().await;
        let Some(position) = find_in_pack(&player.inventory, item, &self.engine.catalog) else {
            self.engine.events.to_session(
                session_id,
                GameEvent::Error(format!("You aren't carrying a '{}'.", item)),
            );
            return;
        };
        let id = player.inventory[position].clone();
        let Some(def) = self.engine.catalog.item(&id) else {
            self.engine.events.to_session(
                session_id,
                GameEvent::Error(format!("You aren't carrying a '{}'.", item)),
            );
            return;
        };
        if def.kind != ItemKind::Weapon {
            self.engine.events.to_session(
                session_id,
                GameEvent::Error(format!(
                    "You can't effectively wield a {} as a weapon.",
                    def.name
                )),
            );
            return;
        }
        player.equipped = Some(id);
        self.engine.persist(&player);
        self.engine.events.to_session(
            session_id,
            GameEvent::Info(format!(
                "You are now wielding: {} (+{} dmg)",
                def.name, def.damage
            )),
        );
        self.engine.events.to_room_except(
            &player.location,
            &[session_id],
            GameEvent::Info(format!("{} draws a {}.", player.name, def.name)),
        );
    }

    async fn handle_unwield(&self, session: &Arc<Session>) {
        let mut player = session.player.lock().await;
        player.equipped = None;
        self.engine.persist(&player);
        self.engine.events.to_session(
            &session.id,
            GameEvent::Info("You sheath your weapon and make do with your fists.".into()),
        );
    }

    async fn handle_inspect(&self, session: &Arc<Session>, target: &str) {
        let session_id = session.id.as_str();
        // A player by that name wins over items.
        if let Some(found) = self.engine.sessions.find_by_player_name(target).await {
            let player = found.player.lock().await;
            let status = if player.is_engaged() { "In Combat" } else { "Idle" };
            self.engine.events.to_session(
                session_id,
                GameEvent::Info(format!(
                    "{} (Lvl {}) - Status: {}",
                    player.name, player.level, status
                )),
            );
            return;
        }
        let (in_pack, on_floor) = {
            let player = session.player.lock().await;
            let in_pack = find_in_pack(&player.inventory, target, &self.engine.catalog)
                .map(|i| player.inventory[i].clone());
            let on_floor = match self.engine.world.lock(&player.location).await {
                Ok(room) => find_in_pack(&room.items, target, &self.engine.catalog)
                    .map(|i| room.items[i].clone()),
                Err(_) => None,
            };
            (in_pack, on_floor)
        };
        let (id, where_found) = match (in_pack, on_floor) {
            (Some(id), _) => (id, "your pack"),
            (None, Some(id)) => (id, "the room"),
            (None, None) => {
                self.engine.events.to_session(
                    session_id,
                    GameEvent::Error(format!(
                        "You don't see a '{}' here or in your pack.",
                        target
                    )),
                );
                return;
            }
        };
        let Some(def) = self.engine.catalog.item(&id) else {
            self.engine.events.to_session(
                session_id,
                GameEvent::Info(format!(
                    "{}: a mysterious object with no visible markings.",
                    id
                )),
            );
            return;
        };
        let mut lines = vec![
            format!("Inspecting: {} ({})", def.name, where_found),
            def.description.to_string(),
        ];
        if def.damage > 0 {
            lines.push(format!("Damage: {}", def.damage));
        }
        if def.value > 0 {
            lines.push(format!("Market value: {} gold", def.value));
        }
        self.engine
            .events
            .to_session(session_id, GameEvent::Info(lines.join("\n")));
    }

    async fn handle_take(&self, session: &Arc<Session>, item: &str) -> Result<(), GameError> {
        let session_id = session.id.as_str();
        let mut player = session.player.lock().await;
        let mut room = self.engine.world.lock(&player.location).await?;
        let Some(position) = find_in_pack(&room.items, item, &self.engine.catalog) else {
            self.engine.events.to_session(
                session_id,
                GameEvent::Error(format!("There is no '{}' here.", item)),
            );
            return Ok(());
        };
        let id = room.items.remove(position);
        drop(room);
        player.inventory.push(id.clone());
        self.engine.persist(&player);
        let name = self.engine.item_name(&id);
        self.engine.events.to_session(
            session_id,
            GameEvent::Info(format!("You picked up: {}", name)),
        );
        self.engine.events.to_room_except(
            &player.location,
            &[session_id],
            GameEvent::Info(format!("{} picks up a {}.", player.name, name)),
        );
        Ok(())
    }

    async fn handle_drop(&self, session: &Arc<Session>, item: &str) -> Result<(), GameError> {
        let session_id = session.id.as_str();
        let mut player = session.player.lock().await;
        let Some(position) = find_in_pack(&player.inventory, item, &self.engine.catalog) else {
            self.engine.events.to_session(
                session_id,
                GameEvent::Error(format!("You aren't carrying a '{}'.", item)),
            );
            return Ok(());
        };
        let id = player.inventory.remove(position);
        if player.equipped.as_deref() == Some(id.as_str()) {
            player.equipped = None;
            self.engine.events.to_session(
                session_id,
                GameEvent::Info("(You unequip it before letting go.)".into()),
            );
        }
        {
            let mut room = self.engine.world.lock(&player.location).await?;
            room.items.push(id.clone());
        }
        self.engine.persist(&player);
        let name = self.engine.item_name(&id);
        self.engine.events.to_session(
            session_id,
            GameEvent::Info(format!("You dropped: {}", name)),
        );
        self.engine.events.to_room_except(
            &player.location,
            &[session_id],
            GameEvent::Info(format!("{} drops a {} on the floor.", player.name, name)),
        );
        Ok(())
    }

    async fn handle_give(&self, session: &Arc<Session>, item: &str, target: &str) {
        let session_id = session.id.as_str();
        let Some(target_session) = self.engine.sessions.find_by_player_name(target).await else {
            self.engine.events.to_session(
                session_id,
                GameEvent::Error(format!("You don't see anyone named '{}' here.", target)),
            );
            return;
        };
        if target_session.id == session.id {
            self.engine.events.to_session(
                session_id,
                GameEvent::Error("You can't give something to yourself.".into()),
            );
            return;
        }
        // Two-player locking in sorted session-id order.
        let (mut first, mut second) = if session.id < target_session.id {
            let a = session.player.lock().await;
            let b = target_session.player.lock().await;
            (a, b)
        } else {
            let b = target_session.player.lock().await;
            let a = session.player.lock().await;
            (a, b)
        };
        let (giver, receiver) = if session.id < target_session.id {
            (&mut *first, &mut *second)
        } else {
            (&mut *second, &mut *first)
        };
        if giver.location != receiver.location {
            self.engine.events.to_session(
                session_id,
                GameEvent::Error(format!("You don't see anyone named '{}' here.", target)),
            );
            return;
        }
        let Some(position) = find_in_pack(&giver.inventory, item, &self.engine.catalog) else {
            self.engine.events.to_session(
                session_id,
                GameEvent::Error(format!("You aren't carrying a '{}'.", item)),
            );
            return;
        };
        let id = giver.inventory.remove(position);
        receiver.inventory.push(id.clone());
        if giver.equipped.as_deref() == Some(id.as_str()) && !giver.inventory.contains(&id) {
            giver.equipped = None;
        }
        self.engine.persist(giver);
        self.engine.persist(receiver);
        let name = self.engine.item_name(&id);
        self.engine.events.to_session(
            session_id,
            GameEvent::Info(format!("You gave the {} to {}.", name, receiver.name)),
        );
        self.engine.events.to_session(
            &target_session.id,
            GameEvent::Info(format!("{} handed you a {}!", giver.name, name)),
        );
        self.engine.events.to_room_except(
            &giver.location,
            &[session_id, target_session.id.as_str()],
            GameEvent::Info(format!(
                "{} hands something to {}.",
                giver.name, receiver.name
            )),
        );
    }

    async fn handle_junk(&self, session: &Arc<Session>, item: &str) {
        let session_id = session.id.as_str();
        let mut player = session.player.lock().await;
        let Some(position) = find_in_pack(&player.inventory, item, &self.engine.catalog) else {
            self.engine.events.to_session(
                session_id,
                GameEvent::Error(format!("You aren't carrying a '{}'.", item)),
            );
            return;
        };
        let id = player.inventory.remove(position);
        if player.equipped.as_deref() == Some(id.as_str()) && !player.inventory.contains(&id) {
            player.equipped = None;
        }
        self.engine.persist(&player);
        let name = self.engine.item_name(&id);
        self.engine
            .events
            .to_session(session_id, GameEvent::Info(format!("You junk the {}.", name)));
        self.engine.events.to_room_except(
            &player.location,
            &[session_id],
            GameEvent::Info(format!("{} tosses a {} into the trash.", player.name, name)),
        );
    }
}

/// Find an item in a list of ids by id or catalog display name, both
/// case-insensitive against an already-lowercased token.
fn find_in_pack(items: &[String], token: &str, catalog: &Catalog) -> Option<usize> {
    items.iter().position(|id| {
        id.eq_ignore_ascii_case(token)
            || catalog
                .item(id)
                .is_some_and(|def| def.name.eq_ignore_ascii_case(token))
    })
}
