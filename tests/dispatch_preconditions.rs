//! Per-verb preconditions: portal gates, combat locks, safe rooms, shop
//! checks, and the unknown-verb fallback.

mod common;

use common::*;
use incarnadine::game::{DispatchOutcome, Dispatcher, GameEvent};

#[tokio::test]
async fn portals_refuse_players_below_the_attunement_gate() {
    let mut fx = arena().await;
    let dispatcher = Dispatcher::new(fx.engine.clone());
    let sid = connect_registered(&fx, "Alma").await;
    drain(&mut fx.rx);

    // The vault needs Attunement 10; a fresh player has 0.
    dispatcher.dispatch(&sid, "go 9").await.expect("dispatch");
    let events = session_events(&drain(&mut fx.rx), &sid);
    assert!(error_containing(&events, "Attunement"));
    let session = fx.engine.sessions.get(&sid).await.expect("session");
    assert_eq!(session.player.lock().await.location, "1");
}

#[tokio::test]
async fn attuned_players_pass_the_same_gate() {
    let mut fx = arena().await;
    let dispatcher = Dispatcher::new(fx.engine.clone());
    let sid = connect_registered(&fx, "Alma").await;
    {
        let session = fx.engine.sessions.get(&sid).await.expect("session");
        session.player.lock().await.stats.attunement = 10;
    }
    drain(&mut fx.rx);

    dispatcher.dispatch(&sid, "go 9").await.expect("dispatch");
    let session = fx.engine.sessions.get(&sid).await.expect("session");
    assert_eq!(session.player.lock().await.location, "9");
    let events = session_events(&drain(&mut fx.rx), &sid);
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::RoomView { name, .. } if name == "The Sealed Vault")));
}

#[tokio::test]
async fn unknown_portals_are_refused() {
    let mut fx = arena().await;
    let dispatcher = Dispatcher::new(fx.engine.clone());
    let sid = connect_registered(&fx, "Alma").await;
    drain(&mut fx.rx);

    dispatcher.dispatch(&sid, "go 42").await.expect("dispatch");
    let events = session_events(&drain(&mut fx.rx), &sid);
    assert!(error_containing(&events, "Invalid portal"));
}

#[tokio::test]
async fn movement_is_refused_while_engaged() {
    let mut fx = arena().await;
    let dispatcher = Dispatcher::new(fx.engine.clone());
    let sid = connect_registered(&fx, "Alma").await;
    place(&fx.engine, &sid, "2").await;
    let golem = monster_id(&fx.engine, "2", "Training Golem").await;
    engage(&fx.engine, &sid, "2", golem).await;
    drain(&mut fx.rx);

    dispatcher.dispatch(&sid, "go 1").await.expect("dispatch");
    let events = session_events(&drain(&mut fx.rx), &sid);
    assert!(error_containing(&events, "walk away"));
    let session = fx.engine.sessions.get(&sid).await.expect("session");
    assert_eq!(session.player.lock().await.location, "2");
}

#[tokio::test]
async fn quitting_is_refused_while_engaged() {
    let mut fx = arena().await;
    let dispatcher = Dispatcher::new(fx.engine.clone());
    let sid = connect_registered(&fx, "Alma").await;
    place(&fx.engine, &sid, "2").await;
    let golem = monster_id(&fx.engine, "2", "Training Golem").await;
    engage(&fx.engine, &sid, "2", golem).await;
    drain(&mut fx.rx);

    let outcome = dispatcher.dispatch(&sid, "quit").await.expect("dispatch");
    assert_eq!(outcome, DispatchOutcome::Continue);
    assert!(fx.engine.sessions.get(&sid).await.is_some());
    let events = session_events(&drain(&mut fx.rx), &sid);
    assert!(error_containing(&events, "cannot quit"));
}

#[tokio::test]
async fn safe_rooms_forbid_combat() {
    let mut fx = arena().await;
    let dispatcher = Dispatcher::new(fx.engine.clone());
    let sid = connect_registered(&fx, "Alma").await;
    drain(&mut fx.rx);

    dispatcher.dispatch(&sid, "attack").await.expect("dispatch");
    let events = session_events(&drain(&mut fx.rx), &sid);
    assert!(error_containing(&events, "safe area"));
    let session = fx.engine.sessions.get(&sid).await.expect("session");
    assert_eq!(session.player.lock().await.combat_target, None);
}

#[tokio::test]
async fn attack_engages_and_starts_the_round_loop() {
    let mut fx = arena().await;
    let dispatcher = Dispatcher::new(fx.engine.clone());
    let sid = connect_registered(&fx, "Alma").await;
    place(&fx.engine, &sid, "2").await;
    drain(&mut fx.rx);

    dispatcher
        .dispatch(&sid, "attack training")
        .await
        .expect("dispatch");

    let golem = monster_id(&fx.engine, "2", "Training Golem").await;
    let session = fx.engine.sessions.get(&sid).await.expect("session");
    assert_eq!(session.player.lock().await.combat_target, Some(golem));
    assert!(session.combat_running().await);
    {
        let room = fx.engine.world.lock("2").await.expect("room");
        assert!(room.monster(golem).expect("golem").engaged_by.contains(&sid));
    }
    let events = session_events(&drain(&mut fx.rx), &sid);
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::Engaged { monster } if monster == "Training Golem")));
}

#[tokio::test]
async fn attacking_again_switches_targets_without_a_second_loop() {
    let mut fx = arena().await;
    let dispatcher = Dispatcher::new(fx.engine.clone());
    let sid = connect_registered(&fx, "Alma").await;
    place(&fx.engine, &sid, "2").await;
    drain(&mut fx.rx);

    dispatcher
        .dispatch(&sid, "attack training")
        .await
        .expect("first");
    dispatcher
        .dispatch(&sid, "attack sparring")
        .await
        .expect("second");

    let golem = monster_id(&fx.engine, "2", "Training Golem").await;
    let partner = monster_id(&fx.engine, "2", "Sparring Partner").await;
    let session = fx.engine.sessions.get(&sid).await.expect("session");
    assert_eq!(session.player.lock().await.combat_target, Some(partner));
    let room = fx.engine.world.lock("2").await.expect("room");
    assert!(!room.monster(golem).expect("golem").engaged_by.contains(&sid));
    assert!(room
        .monster(partner)
        .expect("partner")
        .engaged_by
        .contains(&sid));
    drop(room);
    let events = session_events(&drain(&mut fx.rx), &sid);
    assert!(info_containing(&events, "shift your focus"));
}

#[tokio::test]
async fn attack_with_an_unmatched_name_is_refused() {
    let mut fx = arena().await;
    let dispatcher = Dispatcher::new(fx.engine.clone());
    let sid = connect_registered(&fx, "Alma").await;
    place(&fx.engine, &sid, "2").await;
    drain(&mut fx.rx);

    dispatcher
        .dispatch(&sid, "attack dragon")
        .await
        .expect("dispatch");
    let events = session_events(&drain(&mut fx.rx), &sid);
    assert!(error_containing(&events, "don't see"));
    let session = fx.engine.sessions.get(&sid).await.expect("session");
    assert_eq!(session.player.lock().await.combat_target, None);
}

#[tokio::test]
async fn entering_a_room_with_a_hostile_can_start_a_fight() {
    let mut game = test_game_config();
    game.aggro_chance = 1.0;
    let mut fx = fixture(arena_rooms(), "1", "1", game).await;
    let dispatcher = Dispatcher::new(fx.engine.clone());
    let sid = connect_registered(&fx, "Alma").await;
    drain(&mut fx.rx);

    dispatcher.dispatch(&sid, "go 4").await.expect("dispatch");

    let gargoyle = monster_id(&fx.engine, "4", "Ledge Gargoyle").await;
    let session = fx.engine.sessions.get(&sid).await.expect("session");
    assert_eq!(session.player.lock().await.combat_target, Some(gargoyle));
    assert!(session.combat_running().await);
    let events = session_events(&drain(&mut fx.rx), &sid);
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::AggroLunge { monster } if monster == "Ledge Gargoyle")));
}

#[tokio::test]
async fn purchases_without_enough_gold_change_nothing() {
    let mut fx = arena().await;
    let dispatcher = Dispatcher::new(fx.engine.clone());
    let sid = connect_registered(&fx, "Alma").await;
    {
        let session = fx.engine.sessions.get(&sid).await.expect("session");
        session.player.lock().await.gold = 15;
    }
    drain(&mut fx.rx);

    // The potion costs 20.
    dispatcher
        .dispatch(&sid, "buy potion")
        .await
        .expect("dispatch");
    let events = session_events(&drain(&mut fx.rx), &sid);
    assert!(error_containing(&events, "afford"));
    let session = fx.engine.sessions.get(&sid).await.expect("session");
    let player = session.player.lock().await;
    assert_eq!(player.gold, 15);
    assert!(player.inventory.is_empty());
}

#[tokio::test]
async fn a_funded_purchase_moves_gold_into_goods() {
    let mut fx = arena().await;
    let dispatcher = Dispatcher::new(fx.engine.clone());
    let sid = connect_registered(&fx, "Alma").await;
    drain(&mut fx.rx);

    dispatcher
        .dispatch(&sid, "buy potion")
        .await
        .expect("dispatch");
    let session = fx.engine.sessions.get(&sid).await.expect("session");
    let player = session.player.lock().await;
    assert_eq!(player.gold, 30);
    assert_eq!(player.inventory, vec!["potion".to_string()]);
    drop(player);
    let events = session_events(&drain(&mut fx.rx), &sid);
    assert!(info_containing(&events, "Bought"));
}

#[tokio::test]
async fn buying_outside_a_shop_is_refused() {
    let mut fx = arena().await;
    let dispatcher = Dispatcher::new(fx.engine.clone());
    let sid = connect_registered(&fx, "Alma").await;
    place(&fx.engine, &sid, "3").await;
    drain(&mut fx.rx);

    dispatcher
        .dispatch(&sid, "buy potion")
        .await
        .expect("dispatch");
    let events = session_events(&drain(&mut fx.rx), &sid);
    assert!(error_containing(&events, "shop"));
}

#[tokio::test]
async fn unknown_verbs_get_the_generic_refusal() {
    let mut fx = arena().await;
    let dispatcher = Dispatcher::new(fx.engine.clone());
    let sid = connect_registered(&fx, "Alma").await;
    drain(&mut fx.rx);

    dispatcher.dispatch(&sid, "dance").await.expect("dispatch");
    let events = session_events(&drain(&mut fx.rx), &sid);
    assert!(error_containing(&events, "not available"));
}

#[tokio::test]
async fn bad_arity_answers_with_the_usage_line() {
    let mut fx = arena().await;
    let dispatcher = Dispatcher::new(fx.engine.clone());
    let sid = connect_registered(&fx, "Alma").await;
    drain(&mut fx.rx);

    dispatcher.dispatch(&sid, "go").await.expect("dispatch");
    let events = session_events(&drain(&mut fx.rx), &sid);
    assert!(error_containing(&events, "Usage: go"));
}
