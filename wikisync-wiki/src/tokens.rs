//! Cached API tokens.
//!
//! Lookups take the read lock first and only escalate to the write lock to
//! perform the first fetch for a kind. The fetch runs while the write lock is
//! held, so concurrent callers never fetch the same kind twice.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::WikiError;

/// Token kinds requested through `meta=tokens`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Login,
    Csrf,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Login => "login",
            TokenKind::Csrf => "csrf",
        }
    }

    /// Key under `query.tokens` in the API response.
    pub fn response_key(&self) -> &'static str {
        match self {
            TokenKind::Login => "logintoken",
            TokenKind::Csrf => "csrftoken",
        }
    }
}

#[derive(Debug, Default)]
pub struct TokenCache {
    tokens: RwLock<HashMap<TokenKind, String>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached(&self, kind: TokenKind) -> Option<String> {
        self.tokens.read().get(&kind).cloned()
    }

    /// Return the cached token for `kind`, calling `fetch` at most once to
    /// populate it.
    pub fn get_or_fetch<F>(&self, kind: TokenKind, fetch: F) -> Result<String, WikiError>
    where
        F: FnOnce() -> Result<String, WikiError>,
    {
        if let Some(token) = self.cached(kind) {
            return Ok(token);
        }
        let mut tokens = self.tokens.write();
        if let Some(token) = tokens.get(&kind) {
            return Ok(token.clone());
        }
        let token = fetch()?;
        tokens.insert(kind, token.clone());
        Ok(token)
    }

    pub fn invalidate(&self, kind: TokenKind) {
        self.tokens.write().remove(&kind);
    }

    /// Drop every cached token (after a fresh login).
    pub fn clear(&self) {
        self.tokens.write().clear();
    }
}
