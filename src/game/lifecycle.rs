//! Monster lifecycle: the periodic respawn and wander sweeps.
//!
//! Both sweeps are detached tasks on a fixed cadence that acquire the same
//! per-room locks as foreground command handling, so they can never bypass
//! the invariants those locks protect. The sweep bodies are plain async
//! functions over the engine so tests can drive them directly, without
//! timers.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::debug;
use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::engine::Engine;
use super::events::GameEvent;
use super::types::Room;

/// Start both sweeps. Handles are returned for the caller to hold; the
/// tasks run for the life of the process.
pub fn start(engine: Arc<Engine>) -> Vec<JoinHandle<()>> {
    let respawn_engine = engine.clone();
    let respawn = tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(respawn_engine.game.respawn_sweep_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let revived = respawn_sweep(&respawn_engine).await;
            if revived > 0 {
                debug!("respawn sweep revived {} monster(s)", revived);
            }
        }
    });

    let wander = tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(engine.game.wander_sweep_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let moved = wander_sweep(&engine).await;
            if moved > 0 {
                debug!("wander sweep relocated {} monster(s)", moved);
            }
        }
    });

    vec![respawn, wander]
}

/// Revive every monster whose death timer has elapsed: clear the timer and
/// restore hit points to maximum. Monsters still on cooldown, and living
/// monsters, are untouched. Returns the number revived.
pub async fn respawn_sweep(engine: &Engine) -> usize {
    let now = Utc::now();
    let mut revived = 0;
    for room_id in engine.world.room_ids() {
        let Ok(mut room) = engine.world.lock(&room_id).await else {
            continue;
        };
        for monster in room.monsters.iter_mut() {
            let elapsed = monster.dead_until.is_some_and(|until| until <= now);
            if elapsed {
                monster.dead_until = None;
                monster.hp = monster.max_hp;
                engine.events.to_room(
                    &room_id,
                    GameEvent::MonsterRespawned {
                        name: monster.name.clone(),
                    },
                );
                revived += 1;
            }
        }
    }
    revived
}

/// Pick a random exit for a wandering monster, uniformly over the room's
/// portals.
fn pick_exit(room: &Room) -> Option<String> {
    if room.portals.is_empty() {
        return None;
    }
    let index = rand::thread_rng().gen_range(0..room.portals.len());
    room.portals.keys().nth(index).cloned()
}

fn wander_roll(probability: f64) -> bool {
    rand::thread_rng().gen_bool(probability.clamp(0.0, 1.0))
}

/// Give every roaming monster its chance to relocate through a random
/// portal. A monster that is dead, or that any player currently has engaged,
/// stays put; the engagement test happens under the same room lock combat
/// uses, so it cannot race a fight starting. Returns the number moved.
pub async fn wander_sweep(engine: &Engine) -> usize {
    let mut moved = 0;
    for room_id in engine.world.room_ids() {
        // First pass: pick candidates under the source lock alone.
        let candidates = {
            let Ok(room) = engine.world.lock(&room_id).await else {
                continue;
            };
            let mut picks = Vec::new();
            for monster in &room.monsters {
                if !monster.is_roaming || !monster.is_alive() {
                    continue;
                }
                if !monster.engaged_by.is_empty() {
                    continue;
                }
                if !wander_roll(engine.game.wander_chance) {
                    continue;
                }
                if let Some(dest) = pick_exit(&room) {
                    if dest != room_id {
                        picks.push((monster.id, dest));
                    }
                }
            }
            picks
        };

        // Second pass: take both rooms in sorted order and re-verify before
        // moving, since the world may have changed between the passes.
        for (monster_id, dest_id) in candidates {
            let Ok((mut source, mut dest)) = engine.world.lock_pair(&room_id, &dest_id).await
            else {
                continue;
            };
            let eligible = source.monster(monster_id).is_some_and(|m| {
                m.is_roaming && m.is_alive() && m.engaged_by.is_empty()
            });
            if !eligible {
                continue;
            }
            let Some(position) = source.monsters.iter().position(|m| m.id == monster_id) else {
                continue;
            };
            let monster = source.monsters.remove(position);
            engine.events.to_room(
                &room_id,
                GameEvent::MonsterWandersOff {
                    name: monster.name.clone(),
                },
            );
            engine.events.to_room(
                &dest_id,
                GameEvent::MonsterWandersIn {
                    name: monster.name.clone(),
                },
            );
            debug!("{} wandered {} -> {}", monster.name, room_id, dest_id);
            dest.monsters.push(monster);
            moved += 1;
        }
    }
    moved
}
