//! Key-value backends behind the catalog cache.
//!
//! The cache client only speaks in terms of the handful of commands the
//! managed store exposes (`GET`, `SET .. EX`, `DEL`, `KEYS`, `PING`), so every
//! backend implements exactly that surface.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KvError {
    #[error("key-value transport error: {0}")]
    Transport(String),
    #[error("key-value backend rejected `{command}`: {message}")]
    Backend { command: &'static str, message: String },
    #[error("unexpected reply to `{command}`: {detail}")]
    Protocol { command: &'static str, detail: String },
    #[error("key-value request timed out")]
    Timeout,
}

impl KvError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn protocol(command: &'static str, detail: impl Into<String>) -> Self {
        Self::Protocol {
            command,
            detail: detail.into(),
        }
    }
}

#[async_trait]
pub trait KvStore: Send + Sync {
    /// Short backend name used in logs.
    fn backend(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), KvError>;

    /// Returns whether the key existed.
    async fn del(&self, key: &str) -> Result<bool, KvError>;

    /// Lists keys matching a Redis-style glob pattern.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, KvError>;

    async fn ping(&self) -> Result<(), KvError>;
}

// ============================================================================
// In-process store
// ============================================================================

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Single-process store with per-entry expiry.
///
/// Expired entries are dropped lazily when touched or listed.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: DashMap<String, Entry>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let now = Instant::now();
        let value = match self.entries.get(key) {
            Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
            Some(_) => None,
            None => return Ok(None),
        };
        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), KvError> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool, KvError> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(key)
            .is_some_and(|(_, entry)| entry.is_live(now)))
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, KvError> {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.is_live(now));
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| glob_match(pattern, entry.key()))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn ping(&self) -> Result<(), KvError> {
        Ok(())
    }
}

// ============================================================================
// Disabled store
// ============================================================================

/// Backend used when caching is switched off: every read misses, writes vanish.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledKvStore;

#[async_trait]
impl KvStore for DisabledKvStore {
    fn backend(&self) -> &'static str {
        "disabled"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, KvError> {
        Ok(None)
    }

    async fn set_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), KvError> {
        Ok(())
    }

    async fn del(&self, _key: &str) -> Result<bool, KvError> {
        Ok(false)
    }

    async fn keys(&self, _pattern: &str) -> Result<Vec<String>, KvError> {
        Ok(Vec::new())
    }

    async fn ping(&self) -> Result<(), KvError> {
        Ok(())
    }
}

// ============================================================================
// Glob matching
// ============================================================================

/// Redis `KEYS` glob semantics: `*`, `?`, `[abc]`, `[^a-z]` and `\` escapes.
pub fn glob_match(pattern: &str, key: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let key: Vec<char> = key.chars().collect();

    let (mut p, mut k) = (0usize, 0usize);
    // Position after the last `*` and the key index it is currently absorbing up to.
    let mut backtrack: Option<(usize, usize)> = None;

    while k < key.len() {
        if p < pattern.len() {
            match pattern[p] {
                '*' => {
                    backtrack = Some((p + 1, k));
                    p += 1;
                    continue;
                }
                '?' => {
                    p += 1;
                    k += 1;
                    continue;
                }
                '[' => match match_class(&pattern, p, key[k]) {
                    Some((true, next)) => {
                        p = next;
                        k += 1;
                        continue;
                    }
                    Some((false, _)) => {}
                    None if key[k] == '[' => {
                        p += 1;
                        k += 1;
                        continue;
                    }
                    None => {}
                },
                '\\' if p + 1 < pattern.len() => {
                    if pattern[p + 1] == key[k] {
                        p += 2;
                        k += 1;
                        continue;
                    }
                }
                literal => {
                    if literal == key[k] {
                        p += 1;
                        k += 1;
                        continue;
                    }
                }
            }
        }

        match backtrack {
            Some((star_next, absorbed)) => {
                p = star_next;
                k = absorbed + 1;
                backtrack = Some((star_next, absorbed + 1));
            }
            None => return false,
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}

/// Evaluates a `[...]` class starting at `start`; returns the match flag and the
/// index following the closing bracket. An unterminated class is treated as a
/// literal `[`.
fn match_class(pattern: &[char], start: usize, ch: char) -> Option<(bool, usize)> {
    let mut i = start + 1;
    let negate = pattern.get(i) == Some(&'^');
    if negate {
        i += 1;
    }

    let mut matched = false;
    loop {
        let current = *pattern.get(i)?;
        match current {
            ']' => break,
            '\\' => {
                let escaped = *pattern.get(i + 1)?;
                matched |= escaped == ch;
                i += 2;
            }
            low if pattern.get(i + 1) == Some(&'-')
                && pattern.get(i + 2).is_some_and(|c| *c != ']') =>
            {
                let high = pattern[i + 2];
                let (low, high) = if low <= high { (low, high) } else { (high, low) };
                matched |= (low..=high).contains(&ch);
                i += 3;
            }
            other => {
                matched |= other == ch;
                i += 1;
            }
        }
    }

    Some((matched != negate, i + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_star_matches_any_suffix() {
        assert!(glob_match("bouquets:list*", "bouquets:list"));
        assert!(glob_match("bouquets:list*", "bouquets:list:limit:10:with-flowers"));
        assert!(!glob_match("bouquets:list*", "featured:bouquets"));
    }

    #[test]
    fn glob_star_in_the_middle() {
        assert!(glob_match("category:*:bouquets", "category:abc:bouquets"));
        assert!(!glob_match("category:*:bouquets", "category:abc"));
        assert!(glob_match("bouquet:*:tags", "bouquet:1:tags"));
        assert!(!glob_match("bouquet:*:tags", "bouquet:1:tags:extra"));
    }

    #[test]
    fn glob_classes_and_escapes() {
        assert!(glob_match("h?llo", "hello"));
        assert!(glob_match("h[ae]llo", "hallo"));
        assert!(!glob_match("h[^e]llo", "hello"));
        assert!(glob_match("h[a-c]llo", "hbllo"));
        assert!(glob_match("a\\*b", "a*b"));
        assert!(!glob_match("a\\*b", "axb"));
        assert!(glob_match("*", ""));
    }

    #[tokio::test]
    async fn memory_store_expires_entries() {
        let store = MemoryKvStore::new();
        store
            .set_ex("flower:1", "{}", Duration::from_millis(0))
            .await
            .unwrap();
        store
            .set_ex("flower:2", "{}", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(store.get("flower:1").await.unwrap(), None);
        assert_eq!(store.get("flower:2").await.unwrap().as_deref(), Some("{}"));
        assert_eq!(store.keys("flower:*").await.unwrap(), vec!["flower:2"]);
    }

    #[tokio::test]
    async fn memory_store_reports_whether_delete_removed_a_key() {
        let store = MemoryKvStore::new();
        store
            .set_ex("tag:1", "[]", Duration::from_secs(60))
            .await
            .unwrap();

        assert!(store.del("tag:1").await.unwrap());
        assert!(!store.del("tag:1").await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn disabled_store_never_holds_values() {
        let store = DisabledKvStore;
        store
            .set_ex("tags:list", "[]", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get("tags:list").await.unwrap(), None);
        assert!(store.keys("*").await.unwrap().is_empty());
    }
}
