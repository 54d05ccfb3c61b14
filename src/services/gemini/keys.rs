//! Credential pool with a rotating cursor
//!
//! The key list is loaded once at startup and never changes; only the
//! cursor moves. The cursor is process-wide: a rotation triggered by one
//! request is visible to every subsequent request, and the atomic counter
//! keeps concurrent rotation well-defined.

use std::sync::atomic::{AtomicUsize, Ordering};

use super::client::ClientError;

/// Ordered pool of API keys with a wrapping cursor
#[derive(Debug)]
pub struct KeyRing {
    keys: Vec<String>,
    // Monotonic counter; the active index is `cursor % keys.len()`
    cursor: AtomicUsize,
}

impl KeyRing {
    /// Create a key ring. An empty key list is a configuration error.
    pub fn new(keys: Vec<String>) -> Result<Self, ClientError> {
        if keys.is_empty() {
            return Err(ClientError::NoCredentialsConfigured);
        }
        Ok(Self {
            keys,
            cursor: AtomicUsize::new(0),
        })
    }

    /// The currently active key
    pub fn current(&self) -> &str {
        &self.keys[self.current_index()]
    }

    /// Index of the currently active key
    pub fn current_index(&self) -> usize {
        self.cursor.load(Ordering::SeqCst) % self.keys.len()
    }

    /// Advance the cursor to the next key, wrapping at the end.
    /// Returns the new active index.
    pub fn advance(&self) -> usize {
        (self.cursor.fetch_add(1, Ordering::SeqCst) + 1) % self.keys.len()
    }

    /// Number of keys in the pool
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pool_rejected() {
        let result = KeyRing::new(vec![]);
        assert!(matches!(result, Err(ClientError::NoCredentialsConfigured)));
    }

    #[test]
    fn test_single_key_wraps_to_itself() {
        let ring = KeyRing::new(vec!["k1".to_string()]).unwrap();
        assert_eq!(ring.current(), "k1");
        assert_eq!(ring.advance(), 0);
        assert_eq!(ring.current(), "k1");
    }

    #[test]
    fn test_rotation_order_and_wrap() {
        let ring =
            KeyRing::new(vec!["k1".to_string(), "k2".to_string(), "k3".to_string()]).unwrap();
        assert_eq!(ring.current(), "k1");

        assert_eq!(ring.advance(), 1);
        assert_eq!(ring.current(), "k2");

        assert_eq!(ring.advance(), 2);
        assert_eq!(ring.current(), "k3");

        // Wraps back to the start
        assert_eq!(ring.advance(), 0);
        assert_eq!(ring.current(), "k1");
    }

    #[test]
    fn test_rotation_modular_from_any_index() {
        let ring = KeyRing::new(vec!["a".to_string(), "b".to_string()]).unwrap();
        for _ in 0..7 {
            ring.advance();
        }
        // 7 advances from index 0 over a pool of 2
        assert_eq!(ring.current_index(), 1);
    }
}
