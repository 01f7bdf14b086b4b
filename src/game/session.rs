//! # Session management
//!
//! A session is the ephemeral binding of one live connection to a player.
//! Sessions begin as anonymous guests with default starting stats and become
//! registered identities through `login`; they exist only while connected and
//! are never persisted themselves.
//!
//! Each session owns its player state behind a per-player mutex (the lock
//! other actors take before touching that player) and the handle of its
//! active combat task, if any.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::types::Player;

/// One connected session.
pub struct Session {
    pub id: String,
    pub connected_at: DateTime<Utc>,
    /// Live player state. Lock ordering: registry read -> player -> room.
    pub player: Mutex<Player>,
    /// Active combat loop task, if engaged.
    combat: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    /// Create a fresh guest session placed at the start room.
    pub fn new_guest(start_room: &str) -> Self {
        let id = Uuid::new_v4().simple().to_string();
        let tag: String = id.chars().take(4).collect();
        Session {
            id,
            connected_at: Utc::now(),
            player: Mutex::new(Player::guest(&tag, start_room)),
            combat: Mutex::new(None),
        }
    }

    /// Record a newly spawned combat task, aborting any finished leftover.
    pub async fn set_combat_task(&self, handle: JoinHandle<()>) {
        let mut guard = self.combat.lock().await;
        if let Some(old) = guard.replace(handle) {
            old.abort();
        }
    }

    /// True while a combat loop task is live for this session.
    pub async fn combat_running(&self) -> bool {
        let guard = self.combat.lock().await;
        guard.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel the combat loop immediately. Safe to call when idle.
    pub async fn abort_combat(&self) {
        let mut guard = self.combat.lock().await;
        if let Some(handle) = guard.take() {
            handle.abort();
        }
    }
}

/// Registry of live sessions keyed by session id.
///
/// The registry is the narrow interface other components use to reach
/// sessions; nobody holds the inner map across an await.
#[derive(Default)]
pub struct SessionRegistry {
    inner: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: Arc<Session>) {
        self.inner.write().await.insert(session.id.clone(), session);
    }

    pub async fn get(&self, session_id: &str) -> Option<Arc<Session>> {
        self.inner.read().await.get(session_id).cloned()
    }

    pub async fn remove(&self, session_id: &str) -> Option<Arc<Session>> {
        self.inner.write().await.remove(session_id)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Snapshot of all sessions, for who-lists and scope resolution.
    pub async fn snapshot(&self) -> Vec<Arc<Session>> {
        self.inner.read().await.values().cloned().collect()
    }

    /// Find the session of an online player by name (case-insensitive).
    pub async fn find_by_player_name(&self, name: &str) -> Option<Arc<Session>> {
        let lowered = name.to_ascii_lowercase();
        for session in self.snapshot().await {
            let player = session.player.lock().await;
            if player.name.to_ascii_lowercase() == lowered {
                drop(player);
                return Some(session);
            }
        }
        None
    }

    /// True if a registered player with this name is already connected.
    pub async fn is_name_online(&self, name: &str) -> bool {
        self.find_by_player_name(name).await.is_some()
    }
}
