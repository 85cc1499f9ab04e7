//! API key pool with a shared rotation cursor.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// An outbound API key. Formatting never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(Arc<str>);

impl Credential {
    pub fn new(secret: impl AsRef<str>) -> Self {
        Self(Arc::from(secret.as_ref()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Last four characters, for telling keys apart in logs.
    pub fn hint(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
        format!("…{}", tail)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({})", self.hint())
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hint())
    }
}

/// Fixed, ordered set of credentials. The cursor is shared by all requests
/// and only moves on `rotate`.
#[derive(Debug, Default)]
pub struct CredentialPool {
    credentials: Vec<Credential>,
    cursor: AtomicUsize,
}

impl CredentialPool {
    pub fn new(credentials: Vec<Credential>) -> Self {
        Self {
            credentials,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(keys.into_iter().map(Credential::new).collect())
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    pub fn current(&self) -> Option<Credential> {
        self.credentials.get(self.cursor()).cloned()
    }

    /// Advances the cursor cyclically and returns the new current credential.
    /// A pool of one never moves.
    pub fn rotate(&self) -> Option<Credential> {
        let len = self.credentials.len();
        if len > 1 {
            // The closure always returns Some, so this cannot fail.
            let _ = self
                .cursor
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cursor| {
                    Some((cursor + 1) % len)
                });
        }
        self.current()
    }
}

/// Merges configured keys with `GOOGLE_API_KEYS` (comma separated) and
/// `GOOGLE_API_KEY`. Blank entries and duplicates are dropped; first
/// occurrence wins the position.
pub fn collect_keys(
    configured: &[String],
    env_list: Option<String>,
    env_single: Option<String>,
) -> Vec<String> {
    let from_env_list = env_list
        .map(|list| list.split(',').map(str::to_string).collect::<Vec<_>>())
        .unwrap_or_default();

    let mut keys: Vec<String> = Vec::new();
    for candidate in configured
        .iter()
        .cloned()
        .chain(from_env_list)
        .chain(env_single)
    {
        let trimmed = candidate.trim();
        if trimmed.is_empty() || keys.iter().any(|k| k == trimmed) {
            continue;
        }
        keys.push(trimmed.to_string());
    }
    keys
}

pub fn keys_from_env(configured: &[String]) -> Vec<String> {
    collect_keys(
        configured,
        std::env::var("GOOGLE_API_KEYS").ok(),
        std::env::var("GOOGLE_API_KEY").ok(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pool_has_no_current() {
        let pool = CredentialPool::default();
        assert!(pool.is_empty());
        assert!(pool.current().is_none());
        assert!(pool.rotate().is_none());
    }

    #[test]
    fn single_credential_never_rotates() {
        let pool = CredentialPool::from_keys(["only-key"]);
        let before = pool.current();
        let after = pool.rotate();
        assert_eq!(before, after);
        assert_eq!(pool.cursor(), 0);
        assert_eq!(pool.current().map(|c| c.expose().to_string()), Some("only-key".to_string()));
    }

    #[test]
    fn rotation_cycles_back_after_len_steps() {
        let pool = CredentialPool::from_keys(["a", "b", "c"]);
        let first = pool.current();

        let seen: Vec<String> = (0..3)
            .filter_map(|_| pool.rotate())
            .map(|c| c.expose().to_string())
            .collect();

        assert_eq!(seen, vec!["b", "c", "a"]);
        assert_eq!(pool.current(), first);
        assert_eq!(pool.cursor(), 0);
    }

    #[test]
    fn concurrent_rotations_are_not_lost() {
        let pool = Arc::new(CredentialPool::from_keys(["a", "b", "c", "d", "e"]));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    for _ in 0..125 {
                        pool.rotate();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("rotation thread");
        }
        // 1000 rotations over 5 keys lands back on the first.
        assert_eq!(pool.cursor(), 0);
    }

    #[test]
    fn debug_output_hides_secret() {
        let credential = Credential::new("AIzaSyVerySecretKey1234");
        let rendered = format!("{:?} {}", credential, credential);
        assert!(!rendered.contains("VerySecret"));
        assert!(rendered.contains("1234"));
    }

    #[test]
    fn collect_keys_merges_and_dedups() {
        let keys = collect_keys(
            &["k1".to_string(), " ".to_string()],
            Some("k2, k1 ,,k3".to_string()),
            Some("k4".to_string()),
        );
        assert_eq!(keys, vec!["k1", "k2", "k3", "k4"]);

        assert!(collect_keys(&[], None, Some("   ".to_string())).is_empty());
    }
}
