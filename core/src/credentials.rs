//! Bearer-token providers.
//!
//! # Design
//! The client never caches a token. It asks its `CredentialProvider` on every
//! request, so a login or logout performed elsewhere is visible to the very
//! next call. `invalidate` is the explicit hook the client uses when the
//! backend rejects a token.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::warn;

/// Source of the bearer token attached to outgoing requests.
pub trait CredentialProvider: Send + Sync {
    /// Current token, or `None` to send the request anonymously.
    fn token(&self) -> Option<String>;

    /// Drop the current token. Called after the backend answers 401.
    fn invalidate(&self) {}
}

impl<P: CredentialProvider + ?Sized> CredentialProvider for Arc<P> {
    fn token(&self) -> Option<String> {
        (**self).token()
    }

    fn invalidate(&self) {
        (**self).invalidate()
    }
}

/// Provider that never supplies a token.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialProvider for NoCredentials {
    fn token(&self) -> Option<String> {
        None
    }
}

/// In-memory token shared between the client and whoever logs the user in.
///
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct SharedToken {
    slot: Arc<RwLock<Option<String>>>,
}

impl SharedToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let shared = Self::new();
        shared.set(token);
        shared
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    pub fn clear(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl CredentialProvider for SharedToken {
    fn token(&self) -> Option<String> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        non_blank(slot.as_deref())
    }

    fn invalidate(&self) {
        self.clear();
    }
}

/// Token persisted in a single file, re-read on every request.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self, token: &str) -> io::Result<()> {
        fs::write(&self.path, token)
    }

    pub fn remove(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

impl CredentialProvider for FileTokenStore {
    fn token(&self) -> Option<String> {
        // A missing or unreadable file means "logged out".
        let raw = fs::read_to_string(&self.path).ok()?;
        non_blank(Some(&raw))
    }

    fn invalidate(&self) {
        if let Err(e) = self.remove() {
            warn!(path = %self.path.display(), error = %e, "failed to remove token file");
        }
    }
}

fn non_blank(token: Option<&str>) -> Option<String> {
    token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_token_is_visible_through_clones() {
        let token = SharedToken::new();
        let handle = token.clone();
        assert_eq!(token.token(), None);

        handle.set("abc");
        assert_eq!(token.token().as_deref(), Some("abc"));

        token.invalidate();
        assert_eq!(handle.token(), None);
    }

    #[test]
    fn blank_token_counts_as_absent() {
        let token = SharedToken::with_token("   ");
        assert_eq!(token.token(), None);
    }

    #[test]
    fn file_store_reads_fresh_and_invalidates() {
        let path = std::env::temp_dir().join(format!("hr-console-token-{}", uuid::Uuid::new_v4()));
        let store = FileTokenStore::new(&path);
        assert_eq!(store.token(), None);

        store.store("first\n").unwrap();
        assert_eq!(store.token().as_deref(), Some("first"));

        // Another writer replaces the file; no cache to invalidate.
        fs::write(&path, "second").unwrap();
        assert_eq!(store.token().as_deref(), Some("second"));

        store.invalidate();
        assert!(!path.exists());
        assert_eq!(store.token(), None);

        // Removing twice is fine.
        store.remove().unwrap();
    }
}
