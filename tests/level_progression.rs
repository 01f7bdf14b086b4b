//! Level-ups earned through combat: threshold crossing, stat grants, and
//! persistence of the new level.

mod common;

use common::*;
use incarnadine::game::{resolve_round, GameEvent, RoundOutcome};

#[tokio::test]
async fn crossing_the_threshold_on_a_kill_levels_up() {
    let mut fx = arena().await;
    let sid = connect_registered(&fx, "Alma").await;
    place(&fx.engine, &sid, "2").await;
    let dummy = monster_id(&fx.engine, "2", "Straw Dummy").await;
    engage(&fx.engine, &sid, "2", dummy).await;
    let session = fx.engine.sessions.get(&sid).await.expect("session");
    {
        let mut player = session.player.lock().await;
        player.xp = 95;
        player.current_hp = 12;
    }
    drain(&mut fx.rx);

    // The dummy is worth 30 xp: 95 + 30 crosses the level-2 bar of 100.
    let outcome = resolve_round(&fx.engine, &session).await;
    assert_eq!(outcome, RoundOutcome::MonsterSlain);

    let player = session.player.lock().await;
    assert_eq!(player.level, 2);
    assert_eq!(player.xp, 25);
    assert_eq!(player.stats.attunement, 5);
    assert_eq!(player.stats.hardiness, 80);
    assert_eq!(player.stats.wit, 15);
    assert_eq!(player.current_hp, 80, "restored to the new Hardiness");
    drop(player);

    let events = session_events(&drain(&mut fx.rx), &sid);
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::LevelUp { level: 2 })));

    // The kill persisted the freshly leveled record.
    let record = fx.engine.store.get_player("alma").expect("saved");
    assert_eq!(record.level, 2);
    assert_eq!(record.hardiness, 80);
}

#[tokio::test]
async fn a_kill_below_the_threshold_only_banks_xp() {
    let mut fx = arena().await;
    let sid = connect_registered(&fx, "Alma").await;
    place(&fx.engine, &sid, "2").await;
    let dummy = monster_id(&fx.engine, "2", "Straw Dummy").await;
    engage(&fx.engine, &sid, "2", dummy).await;
    drain(&mut fx.rx);

    let session = fx.engine.sessions.get(&sid).await.expect("session");
    let outcome = resolve_round(&fx.engine, &session).await;
    assert_eq!(outcome, RoundOutcome::MonsterSlain);

    let player = session.player.lock().await;
    assert_eq!(player.level, 1);
    assert_eq!(player.xp, 30);
    assert_eq!(player.stats.hardiness, 60);
    drop(player);

    let events = session_events(&drain(&mut fx.rx), &sid);
    assert!(!events
        .iter()
        .any(|e| matches!(e, GameEvent::LevelUp { .. })));
}
