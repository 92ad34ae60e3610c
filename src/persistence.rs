//! Snapshot persistence for the store's collections.
//!
//! The services expose their full collection state; [`SnapshotRepository`]
//! decides where it goes, so the durability mechanism is swappable without
//! touching business logic.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{Order, PickupRequest, Product, User};
use crate::error::PersistenceError;

/// Full collection state of the store at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub users: Vec<User>,
    pub pickups: Vec<PickupRequest>,
    pub products: Vec<Product>,
    pub orders: Vec<Order>,
}

pub trait SnapshotRepository {
    /// Returns `None` when no snapshot has been saved yet.
    fn load(&self) -> Result<Option<StoreSnapshot>, PersistenceError>;
    fn save(&self, snapshot: &StoreSnapshot) -> Result<(), PersistenceError>;
}

/// Stores the snapshot as pretty-printed JSON at a fixed path.
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotRepository for JsonFileRepository {
    fn load(&self) -> Result<Option<StoreSnapshot>, PersistenceError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, snapshot: &StoreSnapshot) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::domain::{Role, UserKind};

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("snapshot.json"));
        assert!(repo.load().unwrap().is_none());
    }

    #[test]
    fn snapshot_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("snapshot.json"));

        let now = Utc::now();
        let snapshot = StoreSnapshot {
            users: vec![User {
                id: "user_1".to_string(),
                name: "Asha".to_string(),
                email: "asha@example.com".to_string(),
                role: Role::EndUser,
                kind: Some(UserKind::Generator),
                green_coins: 38,
                eco_score: 5,
                is_verified: true,
                created_at: now,
                updated_at: now,
            }],
            ..Default::default()
        };

        repo.save(&snapshot).unwrap();
        let restored = repo.load().unwrap().unwrap();
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn corrupt_file_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        fs::write(&path, "not json").unwrap();

        let repo = JsonFileRepository::new(path);
        assert!(matches!(
            repo.load().unwrap_err(),
            PersistenceError::Format(_)
        ));
    }
}
