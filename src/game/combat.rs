//! Combat engine: the per-player engagement loop, round resolution,
//! level-ups, retreat, and room-entry aggro.
//!
//! Each engaged player owns exactly one combat task, spawned on engagement
//! and aborted on quit, disconnect, or successful retreat. A round takes the
//! player lock, then the room lock, so damage against a monster is mutually
//! exclusive with every other actor touching that room, and a stored target
//! id that no longer resolves to a living monster ends the engagement
//! silently instead of erroring.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{debug, info};
use rand::Rng;
use tokio::time::{interval, MissedTickBehavior};

use crate::logutil::escape_log;

use super::engine::Engine;
use super::events::GameEvent;
use super::session::Session;
use super::types::{MonsterId, Player, Room};

/// What one resolved round did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// No target was set; nothing happened.
    Idle,
    /// The stored target no longer resolves to a living monster here.
    TargetLost,
    /// Both sides struck and both still stand.
    Exchanged,
    /// The player's strike ended the fight.
    MonsterSlain,
    /// The retaliation dropped the player; they were returned to safety.
    PlayerSlain,
}

fn d100() -> i32 {
    rand::thread_rng().gen_range(1..=100)
}

fn chance(probability: f64) -> bool {
    rand::thread_rng().gen_bool(probability.clamp(0.0, 1.0))
}

/// Player damage for one strike: an 8-15 swing plus Attunement scaling plus
/// the equipped weapon's bonus.
fn strike_damage(player: &Player, engine: &Engine) -> i32 {
    let base = rand::thread_rng().gen_range(8..=15);
    base + player.stats.attunement / 2 + engine.catalog.weapon_damage(player.equipped.as_deref())
}

/// Apply pending level-ups, cumulatively: every crossed threshold grants its
/// increments. Returns the number of levels gained; hit points are restored
/// to the new Hardiness when at least one level was gained.
pub fn apply_level_ups(player: &mut Player) -> u32 {
    let mut gained = 0;
    while player.xp >= player.level * 100 {
        player.xp -= player.level * 100;
        player.level += 1;
        player.stats.attunement += 5;
        player.stats.hardiness += 20;
        player.stats.wit += 3;
        gained += 1;
    }
    if gained > 0 {
        player.current_hp = player.stats.hardiness;
    }
    gained
}

/// Death bookkeeping for a monster the player just dropped: schedule the
/// respawn, stage hp for it, release all engagements, drop loot into the
/// room, award the player, and run the level-up check.
///
/// Caller holds both the player and the room lock.
pub(crate) fn finish_kill(
    engine: &Engine,
    session_id: &str,
    player: &mut Player,
    room: &mut Room,
    target: MonsterId,
) {
    let Some(monster) = room.monster_mut(target) else {
        player.combat_target = None;
        return;
    };
    monster.dead_until =
        Some(Utc::now() + chrono::Duration::seconds(engine.game.respawn_delay_secs as i64));
    monster.hp = monster.max_hp;
    monster.engaged_by.clear();
    let name = monster.name.clone();
    let loot = monster.loot.clone();
    let xp = monster.xp_reward;
    let gold = monster.gold_reward;
    room.items.push(loot.clone());
    player.combat_target = None;
    player.xp += xp;
    player.gold += gold;
    engine.events.to_session(
        session_id,
        GameEvent::MonsterDefeated {
            monster: name.clone(),
            loot: engine.item_name(&loot),
            gold,
            xp,
        },
    );
    if apply_level_ups(player) > 0 {
        engine
            .events
            .to_session(session_id, GameEvent::LevelUp { level: player.level });
    }
    info!(
        "{} defeated {} (+{} xp, +{} gold)",
        escape_log(&player.name),
        name,
        xp,
        gold
    );
}

/// Relocate a dead player to the safe room at full Hardiness and show them
/// where they came to. Caller holds the player lock and no room lock.
async fn handle_player_death(engine: &Engine, session_id: &str, player: &mut Player) {
    player.location = engine.world.safe_room().to_string();
    player.current_hp = player.stats.hardiness;
    let refuge = engine
        .world
        .room_name(&player.location)
        .await
        .unwrap_or_else(|| player.location.clone());
    engine
        .events
        .to_session(session_id, GameEvent::PlayerDied { respawn_room: refuge });
    if let Ok(view) = engine.room_view(player).await {
        engine.events.to_session(session_id, view);
    }
}

/// Resolve one combat round for this session.
///
/// Step order follows the engagement contract: validate the target, strike,
/// resolve a kill, otherwise take the retaliation, resolve a death. A kill
/// ends the engagement before the monster can retaliate.
pub async fn resolve_round(engine: &Engine, session: &Session) -> RoundOutcome {
    let session_id = session.id.as_str();
    let mut player = session.player.lock().await;
    let Some(target) = player.combat_target else {
        return RoundOutcome::Idle;
    };
    let Ok(mut room) = engine.world.lock(&player.location).await else {
        player.combat_target = None;
        return RoundOutcome::TargetLost;
    };

    let (monster_name, slain) = {
        let Some(monster) = room.monster_mut(target) else {
            player.combat_target = None;
            return RoundOutcome::TargetLost;
        };
        if !monster.is_alive() {
            monster.engaged_by.remove(session_id);
            player.combat_target = None;
            return RoundOutcome::TargetLost;
        }
        let damage = strike_damage(&player, engine);
        monster.hp -= damage;
        engine.events.to_session(
            session_id,
            GameEvent::CombatHit {
                target: monster.name.clone(),
                damage,
                target_hp: monster.hp.max(0),
            },
        );
        (monster.name.clone(), monster.hp <= 0)
    };

    if slain {
        finish_kill(engine, session_id, &mut player, &mut room, target);
        drop(room);
        engine.persist(&player);
        return RoundOutcome::MonsterSlain;
    }

    let attack = room.monster(target).map(|m| m.attack).unwrap_or(0);
    let retaliation = (attack - player.effective_wit() / 4).max(2);
    player.current_hp -= retaliation;
    engine.events.to_session(
        session_id,
        GameEvent::CombatStruck {
            monster: monster_name,
            damage: retaliation,
            player_hp: player.current_hp.max(0),
        },
    );

    if player.current_hp <= 0 {
        if let Some(monster) = room.monster_mut(target) {
            monster.engaged_by.remove(session_id);
        }
        player.combat_target = None;
        drop(room);
        handle_player_death(engine, session_id, &mut player).await;
        engine.persist(&player);
        return RoundOutcome::PlayerSlain;
    }

    RoundOutcome::Exchanged
}

/// Spawn the round loop for an engagement just recorded on the session.
/// The handle is stored on the session so quit/disconnect/retreat can cancel
/// the loop immediately rather than waiting for its next wakeup.
pub async fn spawn_loop(engine: &Arc<Engine>, session: &Arc<Session>) {
    let engine = engine.clone();
    let task_session = session.clone();
    let handle = tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(engine.game.combat_round_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let outcome = resolve_round(&engine, &task_session).await;
            debug!("session {} combat round: {:?}", task_session.id, outcome);
            if outcome != RoundOutcome::Exchanged {
                break;
            }
        }
    });
    session.set_combat_task(handle).await;
}

/// Room-entry aggro: viewing a room with a living aggressive monster can
/// start a fight unprompted. Only registered, unengaged players in unsafe
/// rooms are lunged at.
pub async fn maybe_aggro(engine: &Arc<Engine>, session: &Arc<Session>) {
    {
        let mut player = session.player.lock().await;
        if player.is_guest() || player.is_engaged() {
            return;
        }
        let Ok(mut room) = engine.world.lock(&player.location).await else {
            return;
        };
        if room.is_safe {
            return;
        }
        let Some((target, name)) = room.first_aggressor().map(|m| (m.id, m.name.clone())) else {
            return;
        };
        if !chance(engine.game.aggro_chance) {
            return;
        }
        player.combat_target = Some(target);
        if let Some(monster) = room.monster_mut(target) {
            monster.engaged_by.insert(session.id.clone());
        }
        engine
            .events
            .to_session(&session.id, GameEvent::AggroLunge { monster: name });
    }
    spawn_loop(engine, session).await;
}

/// Attempt to flee the current engagement. Success relocates to the safe
/// room; failure costs one unmitigated monster hit.
pub async fn try_retreat(engine: &Arc<Engine>, session: &Arc<Session>) {
    let session_id = session.id.as_str();
    let mut player = session.player.lock().await;
    let Some(target) = player.combat_target else {
        engine
            .events
            .to_session(session_id, GameEvent::Error("You aren't in combat.".into()));
        return;
    };
    let Ok(mut room) = engine.world.lock(&player.location).await else {
        player.combat_target = None;
        return;
    };

    if d100() <= 40 + player.effective_wit() {
        if let Some(monster) = room.monster_mut(target) {
            monster.engaged_by.remove(session_id);
        }
        player.combat_target = None;
        drop(room);
        player.location = engine.world.safe_room().to_string();
        let refuge = engine
            .world
            .room_name(&player.location)
            .await
            .unwrap_or_else(|| player.location.clone());
        engine
            .events
            .to_session(session_id, GameEvent::RetreatSuccess { refuge });
        engine.persist(&player);
        drop(player);
        session.abort_combat().await;
        return;
    }

    let Some((monster_name, attack)) = room.monster(target).map(|m| (m.name.clone(), m.attack))
    else {
        player.combat_target = None;
        drop(room);
        drop(player);
        session.abort_combat().await;
        return;
    };
    // A failed retreat hit bypasses Wit mitigation.
    player.current_hp -= attack;
    engine.events.to_session(
        session_id,
        GameEvent::RetreatFailed {
            monster: monster_name,
            damage: attack,
            player_hp: player.current_hp.max(0),
        },
    );
    if player.current_hp <= 0 {
        if let Some(monster) = room.monster_mut(target) {
            monster.engaged_by.remove(session_id);
        }
        player.combat_target = None;
        drop(room);
        handle_player_death(engine, session_id, &mut player).await;
        engine.persist(&player);
        drop(player);
        session.abort_combat().await;
    }
}
