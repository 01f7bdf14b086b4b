//! Sled-backed persistence for player records, plus credential hashing.
//!
//! The store is the only component that touches disk during gameplay. Player
//! records are bincode-serialized under a lowercased username key and carry a
//! schema version that is checked on every read.

use std::path::{Path, PathBuf};

use argon2::Argon2;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use sled::IVec;

use super::errors::GameError;
use super::types::{PlayerRecord, PLAYER_SCHEMA_VERSION};

const TREE_PLAYERS: &str = "players";

/// Helper builder so tests can easily create throwaway stores.
pub struct PlayerStoreBuilder {
    path: PathBuf,
}

impl PlayerStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open(self) -> Result<PlayerStore, GameError> {
        PlayerStore::open(self.path)
    }
}

/// Sled-backed store of registered player records.
pub struct PlayerStore {
    _db: sled::Db,
    players: sled::Tree,
}

impl PlayerStore {
    /// Open (or create) the player store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GameError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let players = db.open_tree(TREE_PLAYERS)?;
        Ok(Self { _db: db, players })
    }

    fn player_key(username: &str) -> Vec<u8> {
        format!("players:{}", username.to_ascii_lowercase()).into_bytes()
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, GameError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, GameError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }

    /// Insert or update a player record.
    pub fn put_player(&self, mut record: PlayerRecord) -> Result<(), GameError> {
        record.schema_version = PLAYER_SCHEMA_VERSION;
        record.touch();
        let key = Self::player_key(&record.username);
        let bytes = Self::serialize(&record)?;
        self.players.insert(key, bytes)?;
        self.players.flush()?;
        Ok(())
    }

    /// Fetch a player record by username (case-insensitive).
    pub fn get_player(&self, username: &str) -> Result<PlayerRecord, GameError> {
        let key = Self::player_key(username);
        let Some(bytes) = self.players.get(&key)? else {
            return Err(GameError::NotFound(format!("player: {}", username)));
        };
        let record: PlayerRecord = Self::deserialize(bytes)?;
        if record.schema_version != PLAYER_SCHEMA_VERSION {
            return Err(GameError::SchemaMismatch {
                entity: "player",
                expected: PLAYER_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    pub fn player_exists(&self, username: &str) -> Result<bool, GameError> {
        Ok(self.players.contains_key(Self::player_key(username))?)
    }

    pub fn player_count(&self) -> usize {
        self.players.scan_prefix(b"players:").count()
    }

    /// Top players ordered by xp descending, capped at `limit`.
    pub fn top_players(&self, limit: usize) -> Result<Vec<PlayerRecord>, GameError> {
        let mut records = Vec::new();
        for entry in self.players.scan_prefix(b"players:") {
            let (_, bytes) = entry?;
            records.push(Self::deserialize::<PlayerRecord>(bytes)?);
        }
        records.sort_by(|a, b| b.xp.cmp(&a.xp));
        records.truncate(limit);
        Ok(records)
    }
}

/// Hash a password with Argon2id, producing a PHC-format string.
pub fn hash_password(password: &str) -> Result<String, GameError> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| GameError::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash. Corrupt hashes fail closed.
pub fn verify_password(stored: &str, password: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn store_round_trip_player() {
        let dir = TempDir::new().expect("tempdir");
        let store = PlayerStoreBuilder::new(dir.path()).open().expect("store");
        let mut record = PlayerRecord::new("Alice", "$argon2id$stub", "1");
        record.gold = 99;
        record.inventory = vec!["potion".into(), "spoon".into()];
        store.put_player(record.clone()).expect("put");
        let fetched = store.get_player("alice").expect("get");
        assert_eq!(fetched.username, "Alice");
        assert_eq!(fetched.gold, 99);
        assert_eq!(fetched.inventory, record.inventory);
        assert_eq!(fetched.schema_version, PLAYER_SCHEMA_VERSION);
    }

    #[test]
    fn missing_player_is_not_found() {
        let dir = TempDir::new().expect("tempdir");
        let store = PlayerStoreBuilder::new(dir.path()).open().expect("store");
        assert!(matches!(
            store.get_player("nobody"),
            Err(GameError::NotFound(_))
        ));
        assert!(!store.player_exists("nobody").expect("exists"));
    }

    #[test]
    fn top_players_orders_by_xp_desc() {
        let dir = TempDir::new().expect("tempdir");
        let store = PlayerStoreBuilder::new(dir.path()).open().expect("store");
        for (name, xp) in [("a", 10u32), ("b", 500), ("c", 120)] {
            let mut record = PlayerRecord::new(name, "hash", "1");
            record.xp = xp;
            store.put_player(record).expect("put");
        }
        let top = store.top_players(2).expect("top");
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].username, "b");
        assert_eq!(top[1].username, "c");
    }

    #[test]
    fn password_hashing_round_trip() {
        let hash = hash_password("swordfish").expect("hash");
        assert!(verify_password(&hash, "swordfish"));
        assert!(!verify_password(&hash, "sword_fish"));
        assert!(!verify_password("not-a-phc-string", "swordfish"));
    }
}
