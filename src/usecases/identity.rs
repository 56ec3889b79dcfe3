//! Per-run identity resolution cache.

use crate::domain::Identity;
use crate::ports::SlackGateway;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Memoizes author lookups for the lifetime of one run.
///
/// Populated monotonically, never evicted. Passed explicitly into the
/// services that need it so repeated runs in one process don't share state.
/// Lookup failures degrade to a fallback identity built from the raw id;
/// resolution is best-effort and never fails the run.
pub struct IdentityCache {
    gateway: Arc<dyn SlackGateway>,
    cache: Mutex<HashMap<String, Identity>>,
}

impl IdentityCache {
    pub fn new(gateway: Arc<dyn SlackGateway>) -> Self {
        Self {
            gateway,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a user id, hitting the remote directory at most once per id.
    ///
    /// The lock is not held across the remote call; a concurrent double
    /// resolution writes the same value twice, which is harmless.
    pub async fn resolve(&self, user_id: &str) -> Identity {
        if let Some(hit) = self.cache.lock().await.get(user_id) {
            return hit.clone();
        }

        let identity = match self.gateway.lookup_identity(user_id).await {
            Ok(identity) => identity,
            Err(e) => {
                debug!(user_id, error = %e, "identity lookup failed, using fallback");
                Identity::fallback(user_id)
            }
        };

        self.cache
            .lock()
            .await
            .insert(user_id.to_string(), identity.clone());
        identity
    }

    /// Number of identities resolved so far.
    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Channel, DomainError, RawMessage, RawReply};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Gateway stub that counts directory lookups and can be set to fail.
    struct CountingGateway {
        lookups: AtomicUsize,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl SlackGateway for CountingGateway {
        async fn list_channels(&self) -> Result<Vec<Channel>, DomainError> {
            Ok(vec![])
        }

        async fn fetch_history(
            &self,
            _channel_id: &str,
            _oldest: i64,
        ) -> Result<Vec<RawMessage>, DomainError> {
            Ok(vec![])
        }

        async fn fetch_thread_replies(
            &self,
            _channel_id: &str,
            _thread_ts: &str,
        ) -> Result<Vec<RawReply>, DomainError> {
            Ok(vec![])
        }

        async fn lookup_identity(&self, user_id: &str) -> Result<Identity, DomainError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DomainError::SlackGateway("user_not_found".into()));
            }
            Ok(Identity {
                id: user_id.to_string(),
                handle: "jane".to_string(),
                display_name: "Jane".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn second_resolve_is_a_cache_hit() {
        let gateway = Arc::new(CountingGateway {
            lookups: AtomicUsize::new(0),
            fail: false,
        });
        let cache = IdentityCache::new(Arc::clone(&gateway) as Arc<dyn SlackGateway>);

        let first = cache.resolve("U001").await;
        let second = cache.resolve("U001").await;

        assert_eq!(first, second);
        assert_eq!(gateway.lookups.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn lookup_failure_yields_cached_fallback() {
        let gateway = Arc::new(CountingGateway {
            lookups: AtomicUsize::new(0),
            fail: true,
        });
        let cache = IdentityCache::new(Arc::clone(&gateway) as Arc<dyn SlackGateway>);

        let identity = cache.resolve("U404").await;
        assert_eq!(identity, Identity::fallback("U404"));

        // The fallback is cached too; no second remote call.
        cache.resolve("U404").await;
        assert_eq!(gateway.lookups.load(Ordering::SeqCst), 1);
    }
}
