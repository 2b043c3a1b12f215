//! High score leaderboard system
//!
//! Persisted as JSON in a key-value store, tracks the top 10 scores. Also
//! serves as the offline [`ScoreService`] used when no backend is configured.

use serde::{Deserialize, Serialize};

use crate::platform::KeyValueStore;
use crate::services::{LeaderboardEntry, RecordId, ScoreService, ServiceError};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub record_id: RecordId,
    pub player_name: String,
    pub email: String,
    pub score: u64,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// High score leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
    #[serde(default)]
    next_record: u64,
}

impl HighScores {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "cat_pop_highscores";

    /// Create empty leaderboard
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Rank of an existing record (1-indexed)
    pub fn rank_of(&self, record_id: &RecordId) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| &e.record_id == record_id)
            .map(|i| i + 1)
    }

    /// Issue a fresh record id
    fn allocate_record(&mut self) -> RecordId {
        self.next_record += 1;
        RecordId(format!("local-{}", self.next_record))
    }

    /// Insert or replace an entry keyed by its record id.
    /// Returns the rank achieved (1-indexed) or None if it didn't qualify.
    pub fn upsert(&mut self, entry: HighScoreEntry) -> Option<usize> {
        self.entries.retain(|e| e.record_id != entry.record_id);
        if !self.qualifies(entry.score) {
            return None;
        }

        // Find insertion point (sorted descending by score)
        let pos = self.entries.iter().position(|e| entry.score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        // Trim to max size
        self.entries.truncate(MAX_HIGH_SCORES);

        Some(rank)
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Load from storage, starting fresh on missing or corrupt data
    pub fn load<S: KeyValueStore>(store: &S) -> Self {
        match store.get_json::<HighScores>(Self::STORAGE_KEY) {
            Some(scores) => {
                log::info!("Loaded {} high scores", scores.entries.len());
                scores
            }
            None => {
                log::info!("No high scores found, starting fresh");
                Self::new()
            }
        }
    }

    /// Save to storage
    pub fn save<S: KeyValueStore>(&self, store: &mut S) {
        if store.set_json(Self::STORAGE_KEY, self) {
            log::info!("High scores saved ({} entries)", self.entries.len());
        }
    }
}

/// Format a timestamp relative to `now` ("Just now", "3 mins ago", ...)
pub fn format_date(timestamp: f64, now: f64) -> String {
    let diff_ms = (now - timestamp).max(0.0);
    let diff_secs = diff_ms / 1000.0;
    let diff_mins = diff_secs / 60.0;
    let diff_hours = diff_mins / 60.0;
    let diff_days = diff_hours / 24.0;

    if diff_days >= 1.0 {
        let days = diff_days.floor() as i64;
        if days == 1 {
            "Yesterday".to_string()
        } else if days < 7 {
            format!("{} days ago", days)
        } else {
            let weeks = days / 7;
            if weeks == 1 {
                "1 week ago".to_string()
            } else {
                format!("{} weeks ago", weeks)
            }
        }
    } else if diff_hours >= 1.0 {
        let hours = diff_hours.floor() as i64;
        if hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", hours)
        }
    } else if diff_mins >= 1.0 {
        let mins = diff_mins.floor() as i64;
        if mins == 1 {
            "1 min ago".to_string()
        } else {
            format!("{} mins ago", mins)
        }
    } else {
        "Just now".to_string()
    }
}

/// Offline score backend on top of [`HighScores`]
pub struct LocalScoreService<S: KeyValueStore> {
    store: S,
    scores: HighScores,
    clock: fn() -> f64,
}

impl<S: KeyValueStore> LocalScoreService<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, crate::platform::now_ms)
    }

    /// Use a custom clock (tests)
    pub fn with_clock(store: S, clock: fn() -> f64) -> Self {
        let scores = HighScores::load(&store);
        Self {
            store,
            scores,
            clock,
        }
    }

    pub fn scores(&self) -> &HighScores {
        &self.scores
    }
}

impl<S: KeyValueStore> ScoreService for LocalScoreService<S> {
    fn submit_score(
        &mut self,
        email: &str,
        display_name: &str,
        score: u64,
        existing: Option<&RecordId>,
    ) -> Result<RecordId, ServiceError> {
        let record_id = match existing {
            Some(id) => id.clone(),
            None => self.scores.allocate_record(),
        };

        // Retries keep the original timestamp
        let timestamp = self
            .scores
            .entries
            .iter()
            .find(|e| e.record_id == record_id)
            .map(|e| e.timestamp)
            .unwrap_or_else(self.clock);

        let rank = self.scores.upsert(HighScoreEntry {
            record_id: record_id.clone(),
            player_name: display_name.to_string(),
            email: email.to_string(),
            score,
            timestamp,
        });
        self.scores.save(&mut self.store);

        match rank {
            Some(rank) => {
                log::info!("Score {} recorded as {} (rank #{})", score, record_id, rank)
            }
            None => log::info!(
                "Score {} recorded as {} (not in top {})",
                score,
                record_id,
                MAX_HIGH_SCORES
            ),
        }
        Ok(record_id)
    }

    fn fetch_leaderboard(&mut self, limit: usize) -> Result<Vec<LeaderboardEntry>, ServiceError> {
        let now = (self.clock)();
        Ok(self
            .scores
            .entries
            .iter()
            .take(limit)
            .map(|e| LeaderboardEntry {
                player_name: e.player_name.clone(),
                score: e.score,
                date: format_date(e.timestamp, now),
                record_id: Some(e.record_id.clone()),
            })
            .collect())
    }
}
