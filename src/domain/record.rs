//! Action records and their identities.
//!
//! A record is owned by an [`Actor`]: either a pseudonymised user (the SHA-512
//! digest of the caller-supplied identifier) or the reserved [`Actor::Cleared`]
//! identity that tags tombstones written during a sweep.
//!
//! Records are addressed by [`RecordKey`], the `(actor, action_time)` pair.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Sub;
use std::time::Duration;

/// Partition string under which [`Actor::Cleared`] records are stored.
///
/// A real [`UserHash`] is always 128 hex characters, so this can never collide.
pub const CLEARED_PARTITION: &str = "-";

/// Wall-clock instant expressed as fractional seconds since the Unix epoch.
///
/// Unlike `f64`, timestamps are totally ordered (via `f64::total_cmp`) so they
/// can be used as map keys.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(f64);

impl Timestamp {
    /// The Unix epoch.
    pub const EPOCH: Timestamp = Timestamp(0.0);

    /// Create a timestamp from fractional seconds since the epoch.
    pub fn from_secs_f64(secs: f64) -> Self {
        Timestamp(secs)
    }

    /// Seconds since the epoch.
    pub fn as_secs_f64(&self) -> f64 {
        self.0
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Timestamp {}

impl Hash for Timestamp {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Consistent with `total_cmp` equality: equal bit patterns only.
        self.0.to_bits().hash(state);
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Sub<Duration> for Timestamp {
    type Output = Timestamp;

    fn sub(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0 - rhs.as_secs_f64())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One-way digest of a raw user identifier.
///
/// The digest is the lowercase hex encoding of SHA-512 over the identifier's
/// UTF-8 bytes. Raw identifiers never reach the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserHash(String);

impl UserHash {
    /// Hash a raw user identifier (username, e-mail address, chat id...).
    pub fn of(user_id: &str) -> Self {
        let digest = Sha512::digest(user_id.as_bytes());
        UserHash(hex::encode(digest))
    }

    /// The hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix of the digest, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for UserHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Owner of an action record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Actor {
    /// A pseudonymised user.
    User(UserHash),
    /// Reserved identity for tombstones written by a sweep.
    Cleared,
}

impl Actor {
    /// Actor for a raw user identifier.
    pub fn user(user_id: &str) -> Self {
        Actor::User(UserHash::of(user_id))
    }

    /// Partition string used by store adapters.
    pub fn partition(&self) -> &str {
        match self {
            Actor::User(hash) => hash.as_str(),
            Actor::Cleared => CLEARED_PARTITION,
        }
    }

    /// Check if this is the tombstone identity.
    pub fn is_cleared(&self) -> bool {
        matches!(self, Actor::Cleared)
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::User(hash) => write!(f, "user:{}", hash.short()),
            Actor::Cleared => f.write_str("cleared"),
        }
    }
}

/// Addressable key of a record: `(actor, action_time)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    pub actor: Actor,
    pub action_time: Timestamp,
}

impl RecordKey {
    pub fn new(actor: Actor, action_time: Timestamp) -> Self {
        Self { actor, action_time }
    }
}

/// One entry in the action log. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub actor: Actor,
    pub action_time: Timestamp,
    pub action_name: String,
    pub source: String,
}

impl ActionRecord {
    /// Create a record for a raw user identifier.
    pub fn for_user(
        user_id: &str,
        action_name: impl Into<String>,
        source: impl Into<String>,
        action_time: Timestamp,
    ) -> Self {
        Self {
            actor: Actor::user(user_id),
            action_time,
            action_name: action_name.into(),
            source: source.into(),
        }
    }

    /// Tombstone recording that `self` was removed by a sweep.
    pub fn tombstone(&self) -> Self {
        Self {
            actor: Actor::Cleared,
            action_time: self.action_time,
            action_name: self.action_name.clone(),
            source: self.source.clone(),
        }
    }

    /// The record's key.
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.actor.clone(), self.action_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_hash_is_deterministic() {
        assert_eq!(UserHash::of("alice"), UserHash::of("alice"));
        assert_ne!(UserHash::of("alice"), UserHash::of("bob"));
    }

    #[test]
    fn test_user_hash_is_sha512_hex() {
        let hash = UserHash::of("");
        assert_eq!(hash.as_str().len(), 128);
        assert!(hash.as_str().starts_with("cf83e1357eefb8bd"));
        assert!(hash.as_str().ends_with("a538327af927da3e"));
    }

    #[test]
    fn test_actor_partitions() {
        let user = Actor::user("alice");
        assert_eq!(user.partition(), UserHash::of("alice").as_str());
        assert_eq!(Actor::Cleared.partition(), CLEARED_PARTITION);
    }

    #[test]
    fn test_cleared_never_matches_a_user() {
        // The raw identifier "-" hashes to a digest, not to the sentinel.
        assert_ne!(Actor::user(CLEARED_PARTITION), Actor::Cleared);
        assert!(Actor::Cleared.is_cleared());
        assert!(!Actor::user("alice").is_cleared());
    }

    #[test]
    fn test_timestamp_ordering() {
        let a = Timestamp::from_secs_f64(1000.0);
        let b = Timestamp::from_secs_f64(1000.5);
        assert!(a < b);
        assert_eq!(a, Timestamp::from_secs_f64(1000.0));
        assert_eq!(b - Duration::from_millis(500), a);
    }

    #[test]
    fn test_tombstone_keeps_name_source_and_time() {
        let record =
            ActionRecord::for_user("alice", "app.apk", "bot", Timestamp::from_secs_f64(10.0));
        let tombstone = record.tombstone();

        assert_eq!(tombstone.actor, Actor::Cleared);
        assert_eq!(tombstone.action_name, "app.apk");
        assert_eq!(tombstone.source, "bot");
        assert_eq!(tombstone.action_time, record.action_time);
    }
}
