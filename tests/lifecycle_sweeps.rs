//! The respawn and wander sweeps: revival timing, idempotence, and the
//! rules that keep engaged or dead monsters in place.

mod common;

use chrono::{Duration, Utc};
use common::*;
use incarnadine::game::{respawn_sweep, wander_sweep, GameEvent, Monster, Room, Scope};

/// Two rooms joined one way: the hollow is a dead end, so a wandering shade
/// settles there instead of oscillating within a single sweep.
fn bog_rooms() -> Vec<Room> {
    vec![
        Room::new("10", "The Sodden Causeway", "Planks over black water.")
            .with_portal("11", "Reed Hollow", 0)
            .with_monster(Monster::spawn("Bog Shade", 40, 5, 25, 5, "potion").roaming()),
        Room::new("11", "The Reed Hollow", "Rushes taller than a man."),
    ]
}

async fn bog() -> Fixture {
    fixture(bog_rooms(), "10", "10", test_game_config()).await
}

#[tokio::test]
async fn respawn_restores_hp_exactly_when_the_timer_elapses() {
    let mut fx = bog().await;
    {
        let mut room = fx.engine.world.lock("10").await.expect("room");
        let shade = &mut room.monsters[0];
        shade.dead_until = Some(Utc::now() - Duration::seconds(1));
        shade.hp = 0;
    }

    let revived = respawn_sweep(&fx.engine).await;
    assert_eq!(revived, 1);

    let room = fx.engine.world.lock("10").await.expect("room");
    let shade = &room.monsters[0];
    assert!(shade.is_alive());
    assert_eq!(shade.hp, shade.max_hp);
    drop(room);

    let envelopes = drain(&mut fx.rx);
    assert!(envelopes.iter().any(|e| matches!(
        (&e.scope, &e.event),
        (Scope::Room { room_id, .. }, GameEvent::MonsterRespawned { .. }) if room_id == "10"
    )));
}

#[tokio::test]
async fn respawn_sweep_with_nothing_elapsed_mutates_nothing() {
    let mut fx = bog().await;
    // A living monster is untouched.
    assert_eq!(respawn_sweep(&fx.engine).await, 0);

    // A monster still on cooldown stays down.
    {
        let mut room = fx.engine.world.lock("10").await.expect("room");
        let shade = &mut room.monsters[0];
        shade.dead_until = Some(Utc::now() + Duration::seconds(60));
        shade.hp = 0;
    }
    assert_eq!(respawn_sweep(&fx.engine).await, 0);
    let room = fx.engine.world.lock("10").await.expect("room");
    assert!(!room.monsters[0].is_alive());
    assert_eq!(room.monsters[0].hp, 0);
    drop(room);
    assert!(drain(&mut fx.rx).is_empty());
}

#[tokio::test]
async fn wander_relocates_a_roaming_monster() {
    let mut fx = bog().await;
    let moved = wander_sweep(&fx.engine).await;
    assert_eq!(moved, 1);

    let source = fx.engine.world.lock("10").await.expect("source");
    assert!(source.monsters.is_empty());
    drop(source);
    let dest = fx.engine.world.lock("11").await.expect("dest");
    assert_eq!(dest.monsters.len(), 1);
    assert_eq!(dest.monsters[0].name, "Bog Shade");
    drop(dest);

    let envelopes = drain(&mut fx.rx);
    assert!(envelopes.iter().any(|e| matches!(
        (&e.scope, &e.event),
        (Scope::Room { room_id, .. }, GameEvent::MonsterWandersOff { .. }) if room_id == "10"
    )));
    assert!(envelopes.iter().any(|e| matches!(
        (&e.scope, &e.event),
        (Scope::Room { room_id, .. }, GameEvent::MonsterWandersIn { .. }) if room_id == "11"
    )));
}

#[tokio::test]
async fn wander_never_moves_an_engaged_monster() {
    let fx = bog().await;
    {
        let mut room = fx.engine.world.lock("10").await.expect("room");
        room.monsters[0]
            .engaged_by
            .insert("some-session".to_string());
    }

    assert_eq!(wander_sweep(&fx.engine).await, 0);
    let room = fx.engine.world.lock("10").await.expect("room");
    assert_eq!(room.monsters.len(), 1, "engaged monster stays put");
}

#[tokio::test]
async fn wander_skips_dead_monsters() {
    let fx = bog().await;
    {
        let mut room = fx.engine.world.lock("10").await.expect("room");
        room.monsters[0].dead_until = Some(Utc::now() + Duration::seconds(60));
    }

    assert_eq!(wander_sweep(&fx.engine).await, 0);
    let room = fx.engine.world.lock("10").await.expect("room");
    assert_eq!(room.monsters.len(), 1);
}

#[tokio::test]
async fn a_respawned_wanderer_roams_again() {
    let fx = bog().await;
    {
        let mut room = fx.engine.world.lock("10").await.expect("room");
        let shade = &mut room.monsters[0];
        shade.dead_until = Some(Utc::now() - Duration::seconds(1));
        shade.hp = 0;
    }
    assert_eq!(wander_sweep(&fx.engine).await, 0, "dead: no move");
    assert_eq!(respawn_sweep(&fx.engine).await, 1);
    assert_eq!(wander_sweep(&fx.engine).await, 1, "revived: moves again");
}
