//! Token caching.
//!
//! [`CachingTokenProvider`] keeps one token per scope and only goes back to
//! the wrapped provider when the cached token is missing or about to expire.
//! Concurrent callers that find a stale token share a single refresh.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::client::TokenProvider;
use crate::error::Result;
use crate::oauth::AccessToken;

/// Buffer before expiry that triggers a refresh (5 minutes).
pub const REFRESH_BUFFER: Duration = Duration::from_secs(5 * 60);

/// Wraps a [`TokenProvider`] with a per-scope token cache.
#[derive(Debug)]
pub struct CachingTokenProvider<P> {
    inner: P,
    tokens: RwLock<HashMap<String, AccessToken>>,
    refresh_lock: Mutex<()>,
    refresh_buffer: Duration,
    acquisitions: AtomicU32,
}

impl<P: TokenProvider> CachingTokenProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            tokens: RwLock::new(HashMap::new()),
            refresh_lock: Mutex::new(()),
            refresh_buffer: REFRESH_BUFFER,
            acquisitions: AtomicU32::new(0),
        }
    }

    /// Override the refresh buffer.
    pub fn with_refresh_buffer(mut self, buffer: Duration) -> Self {
        self.refresh_buffer = buffer;
        self
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Number of tokens fetched from the wrapped provider.
    pub fn acquisition_count(&self) -> u32 {
        self.acquisitions.load(Ordering::SeqCst)
    }

    /// Drop the cached token for `scope`.
    pub async fn invalidate(&self, scope: &str) {
        if self.tokens.write().await.remove(scope).is_some() {
            tracing::debug!(scope, "Cached token invalidated");
        }
    }

    /// Drop all cached tokens.
    pub async fn clear(&self) {
        self.tokens.write().await.clear();
    }

    async fn cached(&self, scope: &str) -> Option<AccessToken> {
        let tokens = self.tokens.read().await;
        tokens
            .get(scope)
            .filter(|t| !t.expires_within(self.refresh_buffer))
            .cloned()
    }
}

#[async_trait]
impl<P: TokenProvider> TokenProvider for CachingTokenProvider<P> {
    async fn access_token(&self, scope: &str) -> Result<AccessToken> {
        if let Some(token) = self.cached(scope).await {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited.
        if let Some(token) = self.cached(scope).await {
            return Ok(token);
        }

        tracing::debug!(scope, "Acquiring access token");
        let token = self.inner.access_token(scope).await?;
        self.acquisitions.fetch_add(1, Ordering::SeqCst);

        if token.expires_within(self.refresh_buffer) {
            tracing::warn!(
                scope,
                expires_at = %token.expires_at(),
                "Acquired token expires within the refresh buffer"
            );
        }

        self.tokens
            .write()
            .await
            .insert(scope.to_string(), token.clone());
        tracing::info!(scope, "Access token refreshed");
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use chrono::Utc;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    #[derive(Debug)]
    struct CountingProvider {
        calls: AtomicU32,
        lifetime: chrono::Duration,
        delay: Duration,
        fail: AtomicBool,
    }

    impl CountingProvider {
        fn new(lifetime: chrono::Duration) -> Self {
            Self {
                calls: AtomicU32::new(0),
                lifetime,
                delay: Duration::ZERO,
                fail: AtomicBool::new(false),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenProvider for CountingProvider {
        async fn access_token(&self, scope: &str) -> Result<AccessToken> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(AuthError::Network("unreachable".into()));
            }
            Ok(AccessToken::new(
                format!("token-{}", n),
                Utc::now() + self.lifetime,
                scope,
            ))
        }
    }

    #[tokio::test]
    async fn test_reuses_fresh_token() {
        let cache = CachingTokenProvider::new(CountingProvider::new(chrono::Duration::hours(1)));

        let first = cache.access_token("scope-a").await.unwrap();
        let second = cache.access_token("scope-a").await.unwrap();

        assert_eq!(first.secret(), "token-1");
        assert_eq!(second.secret(), "token-1");
        assert_eq!(cache.inner().calls(), 1);
        assert_eq!(cache.acquisition_count(), 1);
    }

    #[tokio::test]
    async fn test_tokens_are_per_scope() {
        let cache = CachingTokenProvider::new(CountingProvider::new(chrono::Duration::hours(1)));

        let a = cache.access_token("scope-a").await.unwrap();
        let b = cache.access_token("scope-b").await.unwrap();

        assert_ne!(a.secret(), b.secret());
        assert_eq!(b.scope(), "scope-b");
        assert_eq!(cache.inner().calls(), 2);
    }

    #[tokio::test]
    async fn test_refreshes_inside_buffer() {
        // Tokens that live two minutes are always inside the five minute buffer.
        let cache = CachingTokenProvider::new(CountingProvider::new(chrono::Duration::minutes(2)));

        cache.access_token("s").await.unwrap();
        let second = cache.access_token("s").await.unwrap();

        assert_eq!(second.secret(), "token-2");
        assert_eq!(cache.inner().calls(), 2);
    }

    #[tokio::test]
    async fn test_custom_buffer() {
        let cache = CachingTokenProvider::new(CountingProvider::new(chrono::Duration::minutes(2)))
            .with_refresh_buffer(Duration::from_secs(30));

        cache.access_token("s").await.unwrap();
        cache.access_token("s").await.unwrap();
        assert_eq!(cache.inner().calls(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reacquire() {
        let cache = CachingTokenProvider::new(CountingProvider::new(chrono::Duration::hours(1)));

        cache.access_token("s").await.unwrap();
        cache.invalidate("s").await;
        let token = cache.access_token("s").await.unwrap();

        assert_eq!(token.secret(), "token-2");
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let cache = CachingTokenProvider::new(CountingProvider::new(chrono::Duration::hours(1)));
        cache.inner().fail.store(true, Ordering::SeqCst);

        assert!(cache.access_token("s").await.is_err());
        assert_eq!(cache.acquisition_count(), 0);

        cache.inner().fail.store(false, Ordering::SeqCst);
        assert!(cache.access_token("s").await.is_ok());
        assert_eq!(cache.inner().calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let mut provider = CountingProvider::new(chrono::Duration::hours(1));
        provider.delay = Duration::from_millis(50);
        let cache = Arc::new(CachingTokenProvider::new(provider));

        let tasks = (0..8).map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.access_token("s").await })
        });
        let results = futures::future::join_all(tasks).await;

        for result in results {
            assert_eq!(result.unwrap().unwrap().secret(), "token-1");
        }
        assert_eq!(cache.inner().calls(), 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = CachingTokenProvider::new(CountingProvider::new(chrono::Duration::hours(1)));
        cache.access_token("a").await.unwrap();
        cache.access_token("b").await.unwrap();
        cache.clear().await;
        cache.access_token("a").await.unwrap();
        assert_eq!(cache.inner().calls(), 3);
    }
}
