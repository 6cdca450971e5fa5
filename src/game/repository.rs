use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::core::Game;
use crate::shared::AppError;

/// Persistence for room snapshots, keyed by room id.
///
/// Callers follow read-modify-write for every action: load the snapshot,
/// apply the mutation, save it back. Writes are last-writer-wins per room;
/// the per-room serialization that makes that safe lives in the service.
#[async_trait]
pub trait GameRepository: Send + Sync {
    /// Loads the snapshot for a room, if the room exists.
    async fn load(&self, room_id: &str) -> Result<Option<Game>, AppError>;

    /// Persists the snapshot for a room, creating or replacing it.
    async fn save(&self, room_id: &str, game: &Game) -> Result<(), AppError>;

    /// Drops a room's snapshot once its last player has left.
    async fn remove(&self, room_id: &str) -> Result<(), AppError>;
}

/// In-memory implementation for development and testing. Data is lost when
/// the process exits.
pub struct InMemoryGameRepository {
    games: Mutex<HashMap<String, Game>>,
}

impl Default for InMemoryGameRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGameRepository {
    pub fn new() -> Self {
        Self {
            games: Mutex::new(HashMap::new()),
        }
    }

    /// Number of rooms currently stored.
    pub fn room_count(&self) -> usize {
        self.games.lock().unwrap().len()
    }
}

#[async_trait]
impl GameRepository for InMemoryGameRepository {
    #[instrument(skip(self))]
    async fn load(&self, room_id: &str) -> Result<Option<Game>, AppError> {
        let games = self.games.lock().unwrap();
        let game = games.get(room_id).cloned();
        debug!(room_id = %room_id, found = game.is_some(), "Loaded room from memory");
        Ok(game)
    }

    #[instrument(skip(self, game))]
    async fn save(&self, room_id: &str, game: &Game) -> Result<(), AppError> {
        let mut games = self.games.lock().unwrap();
        games.insert(room_id.to_string(), game.clone());
        debug!(room_id = %room_id, "Saved room to memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, room_id: &str) -> Result<(), AppError> {
        let mut games = self.games.lock().unwrap();
        games.remove(room_id);
        debug!(room_id = %room_id, "Removed room from memory");
        Ok(())
    }
}

/// PostgreSQL implementation: one row per room holding the serialized
/// snapshot. `save` upserts, so concurrent processes get last-writer-wins
/// per room.
///
/// Expected schema:
///   CREATE TABLE game_rooms (
///       room_id    TEXT PRIMARY KEY,
///       snapshot   TEXT NOT NULL,
///       updated_at TIMESTAMPTZ NOT NULL
///   );
pub struct PostgresGameRepository {
    pool: PgPool,
}

impl PostgresGameRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GameRepository for PostgresGameRepository {
    #[instrument(skip(self))]
    async fn load(&self, room_id: &str) -> Result<Option<Game>, AppError> {
        debug!(room_id = %room_id, "Fetching room from database");

        let row = sqlx::query("SELECT snapshot FROM game_rooms WHERE room_id = $1")
            .bind(room_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, room_id = %room_id, "Failed to fetch room from database");
                AppError::StorageError(e.to_string())
            })?;

        match row {
            Some(row) => {
                let snapshot: String = row.get("snapshot");
                let game = serde_json::from_str(&snapshot).map_err(|e| {
                    warn!(error = %e, room_id = %room_id, "Corrupt room snapshot");
                    AppError::StorageError(e.to_string())
                })?;
                Ok(Some(game))
            }
            None => {
                debug!(room_id = %room_id, "Room not found in database");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, game))]
    async fn save(&self, room_id: &str, game: &Game) -> Result<(), AppError> {
        debug!(room_id = %room_id, "Saving room to database");

        let snapshot = serde_json::to_string(game).map_err(|e| {
            warn!(error = %e, room_id = %room_id, "Failed to encode room snapshot");
            AppError::StorageError(e.to_string())
        })?;

        sqlx::query(
            "INSERT INTO game_rooms (room_id, snapshot, updated_at) VALUES ($1, $2, $3) \
             ON CONFLICT (room_id) DO UPDATE SET snapshot = $2, updated_at = $3",
        )
        .bind(room_id)
        .bind(snapshot)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, room_id = %room_id, "Failed to save room to database");
            AppError::StorageError(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, room_id: &str) -> Result<(), AppError> {
        debug!(room_id = %room_id, "Deleting room from database");

        sqlx::query("DELETE FROM game_rooms WHERE room_id = $1")
            .bind(room_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, room_id = %room_id, "Failed to delete room from database");
                AppError::StorageError(e.to_string())
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::core::GameSettings;

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let repo = InMemoryGameRepository::new();
        let mut game = Game::new(GameSettings::default());
        game.join("conn-0", "id-0", "Alice").unwrap();

        repo.save("room-1", &game).await.unwrap();

        let loaded = repo.load("room-1").await.unwrap().unwrap();
        assert_eq!(loaded.players().len(), 1);
        assert_eq!(loaded.players()[0].name, "Alice");
        assert_eq!(loaded.join_code(), game.join_code());
    }

    #[tokio::test]
    async fn test_load_missing_room() {
        let repo = InMemoryGameRepository::new();
        assert!(repo.load("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_snapshot() {
        let repo = InMemoryGameRepository::new();
        let mut game = Game::new(GameSettings::default());
        game.join("conn-0", "id-0", "Alice").unwrap();
        repo.save("room-1", &game).await.unwrap();

        game.join("conn-1", "id-1", "Bob").unwrap();
        repo.save("room-1", &game).await.unwrap();

        let loaded = repo.load("room-1").await.unwrap().unwrap();
        assert_eq!(loaded.players().len(), 2);
        assert_eq!(repo.room_count(), 1);
    }

    #[tokio::test]
    async fn test_remove_room() {
        let repo = InMemoryGameRepository::new();
        let game = Game::new(GameSettings::default());
        repo.save("room-1", &game).await.unwrap();

        repo.remove("room-1").await.unwrap();
        assert!(repo.load("room-1").await.unwrap().is_none());
        assert_eq!(repo.room_count(), 0);
    }

    #[tokio::test]
    async fn test_snapshot_survives_json_round_trip() {
        // The Postgres repository stores snapshots as JSON text; make sure
        // a populated game encodes and decodes without loss.
        let mut game = Game::new(GameSettings {
            board_size: 9,
            max_rounds: 3,
        });
        game.join("conn-0", "id-0", "Alice").unwrap();
        game.join("conn-1", "id-1", "Bob").unwrap();

        let encoded = serde_json::to_string(&game).unwrap();
        let decoded: Game = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded.players().len(), 2);
        assert_eq!(decoded.board().size(), 9);
        assert_eq!(decoded.max_rounds(), 3);
        assert_eq!(decoded.tile_bag_len(), game.tile_bag_len());
        assert!(decoded.running());
    }
}
