//! External collaborators
//!
//! The core never talks to the network, the speakers or storage directly.
//! Everything goes through these traits so each session (and each test) can
//! own isolated instances.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::KeyValueStore;

/// Identifier of a submitted score, issued by the score backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub String);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub player_name: String,
    pub score: u64,
    pub date: String,
    /// Backend record, when the backend exposes it
    #[serde(default)]
    pub record_id: Option<RecordId>,
}

/// Failures at the score backend boundary
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Record not found: {0}")]
    NotFound(RecordId),

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Why a score submission did not go through
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Please enter your name")]
    MissingName,

    #[error("Please enter your email")]
    MissingEmail,

    #[error("Please enter a valid email")]
    InvalidEmail,

    #[error("Scores can only be submitted after a finished run")]
    NotFinished,

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Score persistence backend
pub trait ScoreService {
    /// Store `score` for the player. Passing `existing` updates that record
    /// instead of creating a new one; retrying with the same id is idempotent.
    fn submit_score(
        &mut self,
        email: &str,
        display_name: &str,
        score: u64,
        existing: Option<&RecordId>,
    ) -> Result<RecordId, ServiceError>;

    /// Top `limit` scores, highest first
    fn fetch_leaderboard(&mut self, limit: usize) -> Result<Vec<LeaderboardEntry>, ServiceError>;
}

/// Fetch the leaderboard, degrading to an empty list on any failure
pub fn fetch_leaderboard(service: &mut dyn ScoreService, limit: usize) -> Vec<LeaderboardEntry> {
    match service.fetch_leaderboard(limit) {
        Ok(mut entries) => {
            entries.sort_by(|a, b| b.score.cmp(&a.score));
            entries.truncate(limit);
            entries
        }
        Err(e) => {
            log::warn!("Error fetching leaderboard: {}", e);
            Vec::new()
        }
    }
}

/// Loose `local@domain.tld` check, no whitespace anywhere
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Validate submission fields, returning trimmed (email, name)
pub fn validate_submission<'a>(
    email: &'a str,
    name: &'a str,
) -> Result<(&'a str, &'a str), SubmitError> {
    let name = name.trim();
    let email = email.trim();
    if name.is_empty() {
        return Err(SubmitError::MissingName);
    }
    if email.is_empty() {
        return Err(SubmitError::MissingEmail);
    }
    if !is_valid_email(email) {
        return Err(SubmitError::InvalidEmail);
    }
    Ok((email, name))
}

/// Named sound cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    /// A cat was launched
    Pop,
    /// A cat was collected
    Click,
    /// Run ended
    GameOver,
}

impl SoundCue {
    pub fn name(self) -> &'static str {
        match self {
            SoundCue::Pop => "catPop",
            SoundCue::Click => "catClick",
            SoundCue::GameOver => "gameOver",
        }
    }
}

/// Fire-and-forget audio. Implementations swallow their own failures.
pub trait AudioSink {
    fn play(&self, cue: SoundCue);
}

/// Silent sink
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&self, _cue: SoundCue) {}
}

/// The most recently used player identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub email: String,
    pub display_name: String,
    pub saved_at_ms: f64,
}

/// Remembers who played last
pub trait ProfileStore {
    fn latest(&self) -> Option<PlayerProfile>;
    fn remember(&mut self, profile: PlayerProfile);
}

/// Profiles kept in a key-value store, one `user-<email>` key per player
pub struct StoredProfiles<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> StoredProfiles<S> {
    const KEY_PREFIX: &'static str = "user-";

    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S: KeyValueStore> ProfileStore for StoredProfiles<S> {
    fn latest(&self) -> Option<PlayerProfile> {
        self.store
            .keys()
            .into_iter()
            .filter(|k| k.starts_with(Self::KEY_PREFIX))
            .filter_map(|k| self.store.get_json::<PlayerProfile>(&k))
            .max_by(|a, b| {
                a.saved_at_ms
                    .partial_cmp(&b.saved_at_ms)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    fn remember(&mut self, profile: PlayerProfile) {
        let key = format!("{}{}", Self::KEY_PREFIX, profile.email);
        if !self.store.set_json(&key, &profile) {
            log::warn!("Could not store profile for {}", profile.email);
        }
    }
}

/// Injected collaborators for a session
pub struct Services {
    pub audio: Box<dyn AudioSink>,
    pub profiles: Box<dyn ProfileStore>,
}

impl Default for Services {
    fn default() -> Self {
        Self {
            audio: Box::new(NullAudio),
            profiles: Box::new(StoredProfiles::new(crate::platform::MemoryStore::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStore;

    struct Failing;

    impl ScoreService for Failing {
        fn submit_score(
            &mut self,
            _email: &str,
            _display_name: &str,
            _score: u64,
            _existing: Option<&RecordId>,
        ) -> Result<RecordId, ServiceError> {
            Err(ServiceError::Unavailable("offline".into()))
        }

        fn fetch_leaderboard(
            &mut self,
            _limit: usize,
        ) -> Result<Vec<LeaderboardEntry>, ServiceError> {
            Err(ServiceError::Unavailable("offline".into()))
        }
    }

    struct Unsorted;

    impl ScoreService for Unsorted {
        fn submit_score(
            &mut self,
            _email: &str,
            _display_name: &str,
            _score: u64,
            _existing: Option<&RecordId>,
        ) -> Result<RecordId, ServiceError> {
            Ok(RecordId("x".into()))
        }

        fn fetch_leaderboard(
            &mut self,
            _limit: usize,
        ) -> Result<Vec<LeaderboardEntry>, ServiceError> {
            Ok([3, 9, 5]
                .into_iter()
                .map(|score| LeaderboardEntry {
                    player_name: format!("p{}", score),
                    score,
                    date: String::new(),
                    record_id: None,
                })
                .collect())
        }
    }

    #[test]
    fn test_leaderboard_failure_is_empty() {
        assert!(fetch_leaderboard(&mut Failing, 10).is_empty());
    }

    #[test]
    fn test_leaderboard_sorted_and_limited() {
        let entries = fetch_leaderboard(&mut Unsorted, 2);
        let scores: Vec<u64> = entries.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![9, 5]);
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("cat@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.co"));
        assert!(!is_valid_email("cat@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("cat@.com"));
        assert!(!is_valid_email("cat example@x.com"));
        assert!(!is_valid_email("a@b@c.com"));
    }

    #[test]
    fn test_validate_submission_order() {
        assert!(matches!(validate_submission("x@y.z", "  "), Err(SubmitError::MissingName)));
        assert!(matches!(validate_submission("", "Tom"), Err(SubmitError::MissingEmail)));
        assert!(matches!(validate_submission("nope", "Tom"), Err(SubmitError::InvalidEmail)));
        let (email, name) = validate_submission(" x@y.z ", " Tom ").unwrap();
        assert_eq!((email, name), ("x@y.z", "Tom"));
    }

    #[test]
    fn test_latest_profile_wins() {
        let mut profiles = StoredProfiles::new(MemoryStore::new());
        assert!(profiles.latest().is_none());
        profiles.remember(PlayerProfile {
            email: "a@x.io".into(),
            display_name: "A".into(),
            saved_at_ms: 10.0,
        });
        profiles.remember(PlayerProfile {
            email: "b@x.io".into(),
            display_name: "B".into(),
            saved_at_ms: 20.0,
        });
        assert_eq!(profiles.latest().unwrap().display_name, "B");

        let mut store = profiles.into_inner();
        store.set("unrelated", "1");
        store.set("user-broken", "{");
        let profiles = StoredProfiles::new(store);
        assert_eq!(profiles.latest().unwrap().email, "b@x.io");
    }
}
