//! Cumulative per-player statistics, kept for the lifetime of the process.

use std::time::SystemTime;

use indexmap::IndexMap;
use tokio::sync::RwLock;
#[cfg(test)]
use tokio::sync::RwLockWriteGuard;

use crate::state::game::PlayerId;

/// Cumulative stats of one player across all of their sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
    /// Stable player identity.
    pub player_id: PlayerId,
    /// Name captured when the record was created.
    pub display_name: String,
    /// Number of sessions started so far, never above the configured quota.
    pub attempts_used: u32,
    /// Highest final score of any finished session.
    pub best_score: u32,
    /// Final scores of finished sessions, oldest first.
    pub score_history: Vec<u32>,
    /// When the player was first seen.
    pub first_seen_at: SystemTime,
}

impl PlayerRecord {
    fn new(player_id: PlayerId, display_name: String) -> Self {
        Self {
            player_id,
            display_name,
            attempts_used: 0,
            best_score: 0,
            score_history: Vec::new(),
            first_seen_at: SystemTime::now(),
        }
    }

    /// Mean of the finished-session scores, `0.0` without history.
    pub fn average_score(&self) -> f64 {
        if self.score_history.is_empty() {
            return 0.0;
        }
        let total: u64 = self.score_history.iter().map(|&score| u64::from(score)).sum();
        total as f64 / self.score_history.len() as f64
    }
}

/// Returned by [`PlayerRecordStore::reserve_attempt`] when the quota is used up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaExhausted {
    /// Best score of the player, reported back to them.
    pub best_score: u32,
}

/// Thread-safe map from player to record, iterated in first-interaction order.
pub struct PlayerRecordStore {
    records: RwLock<IndexMap<PlayerId, PlayerRecord>>,
    max_attempts: u32,
}

impl PlayerRecordStore {
    /// Create an empty store enforcing `max_attempts` sessions per player.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            records: RwLock::new(IndexMap::new()),
            max_attempts,
        }
    }

    /// Configured per-player session quota.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Return the player's record, creating an empty one on first contact.
    ///
    /// The display name of an existing record is left untouched.
    pub async fn get_or_create(&self, player_id: PlayerId, display_name: &str) -> PlayerRecord {
        let mut records = self.records.write().await;
        records
            .entry(player_id)
            .or_insert_with(|| PlayerRecord::new(player_id, display_name.to_string()))
            .clone()
    }

    /// Look up a record without creating it.
    pub async fn get(&self, player_id: PlayerId) -> Option<PlayerRecord> {
        self.records.read().await.get(&player_id).cloned()
    }

    /// Sessions the player may still start.
    pub async fn quota_remaining(&self, player_id: PlayerId) -> u32 {
        let records = self.records.read().await;
        let used = records
            .get(&player_id)
            .map(|record| record.attempts_used)
            .unwrap_or(0);
        self.max_attempts.saturating_sub(used)
    }

    /// Consume one attempt for the player, creating the record if needed.
    ///
    /// Check and increment happen under the same lock. Returns the 1-based attempt number.
    pub async fn reserve_attempt(
        &self,
        player_id: PlayerId,
        display_name: &str,
    ) -> Result<u32, QuotaExhausted> {
        let mut records = self.records.write().await;
        let record = records
            .entry(player_id)
            .or_insert_with(|| PlayerRecord::new(player_id, display_name.to_string()));

        if record.attempts_used >= self.max_attempts {
            return Err(QuotaExhausted {
                best_score: record.best_score,
            });
        }

        record.attempts_used += 1;
        Ok(record.attempts_used)
    }

    /// Give back an attempt whose session never started.
    pub async fn release_attempt(&self, player_id: PlayerId) {
        let mut records = self.records.write().await;
        if let Some(record) = records.get_mut(&player_id) {
            record.attempts_used = record.attempts_used.saturating_sub(1);
        }
    }

    /// Commit the final score of a finished session.
    ///
    /// Must be called exactly once per finished session; duplicates are not detected here.
    pub async fn record_finish(&self, player_id: PlayerId, final_score: u32) {
        let mut records = self.records.write().await;
        let record = records
            .entry(player_id)
            .or_insert_with(|| PlayerRecord::new(player_id, String::new()));
        record.score_history.push(final_score);
        record.best_score = record.best_score.max(final_score);
    }

    /// Copy of every record in first-interaction order.
    pub async fn snapshot(&self) -> Vec<PlayerRecord> {
        self.records.read().await.values().cloned().collect()
    }

    /// Number of known players.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether no player has interacted yet.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Hold the store's write lock, stalling every other operation until the guard drops.
    #[cfg(test)]
    pub(crate) async fn lock(&self) -> RwLockWriteGuard<'_, IndexMap<PlayerId, PlayerRecord>> {
        self.records.write().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_or_create_keeps_first_display_name() {
        let store = PlayerRecordStore::new(10);
        let first = store.get_or_create(1, "Anna").await;
        assert_eq!(first.display_name, "Anna");
        assert_eq!(first.attempts_used, 0);
        assert_eq!(first.best_score, 0);

        let again = store.get_or_create(1, "Annie").await;
        assert_eq!(again.display_name, "Anna");
    }

    #[tokio::test]
    async fn record_finish_appends_history_and_keeps_best() {
        let store = PlayerRecordStore::new(10);
        store.get_or_create(7, "Bence").await;
        store.record_finish(7, 30).await;
        store.record_finish(7, 10).await;

        let record = store.get(7).await.unwrap();
        assert_eq!(record.score_history, vec![30, 10]);
        assert_eq!(record.best_score, 30);
        assert!((record.average_score() - 20.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn reserve_attempt_enforces_quota() {
        let store = PlayerRecordStore::new(2);
        assert_eq!(store.quota_remaining(3).await, 2);
        assert_eq!(store.reserve_attempt(3, "Csilla").await, Ok(1));
        assert_eq!(store.reserve_attempt(3, "Csilla").await, Ok(2));
        store.record_finish(3, 60).await;
        assert_eq!(
            store.reserve_attempt(3, "Csilla").await,
            Err(QuotaExhausted { best_score: 60 })
        );
        assert_eq!(store.quota_remaining(3).await, 0);
        assert_eq!(store.get(3).await.unwrap().attempts_used, 2);
    }

    #[tokio::test]
    async fn release_attempt_returns_quota() {
        let store = PlayerRecordStore::new(1);
        assert_eq!(store.reserve_attempt(4, "Dora").await, Ok(1));
        store.release_attempt(4).await;
        assert_eq!(store.quota_remaining(4).await, 1);
        assert_eq!(store.reserve_attempt(4, "Dora").await, Ok(1));

        store.release_attempt(99).await;
        assert!(store.get(99).await.is_none());
    }

    #[tokio::test]
    async fn snapshot_preserves_first_interaction_order() {
        let store = PlayerRecordStore::new(10);
        store.get_or_create(30, "c").await;
        store.get_or_create(10, "a").await;
        store.get_or_create(20, "b").await;
        store.get_or_create(30, "c").await;

        let order: Vec<PlayerId> = store
            .snapshot()
            .await
            .into_iter()
            .map(|record| record.player_id)
            .collect();
        assert_eq!(order, vec![30, 10, 20]);
        assert_eq!(store.len().await, 3);
    }
}
