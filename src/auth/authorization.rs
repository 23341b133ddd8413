//! Ownership-based authorization

use crate::core::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Lookup of the owning subject of an owned resource
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Owner id of `resource_id`, or `None` if the resource does not exist
    async fn find_owner(&self, resource_id: &str) -> Result<Option<String>>;
}

/// Decides whether a caller may mutate a resource
#[derive(Clone)]
pub struct OwnershipGuard {
    store: Arc<dyn ResourceStore>,
}

impl OwnershipGuard {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self { store }
    }

    /// True only when the resource exists and is owned by `caller_id`.
    /// Lookup failures deny.
    pub async fn is_owner(&self, caller_id: &str, resource_id: &str) -> bool {
        match self.store.find_owner(resource_id).await {
            Ok(Some(owner)) => owner == caller_id,
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(
                    resource_id = %resource_id,
                    error = %e,
                    "Ownership lookup failed, denying"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ShelfError;
    use std::collections::HashMap;

    struct FixedOwners(HashMap<String, String>);

    #[async_trait]
    impl ResourceStore for FixedOwners {
        async fn find_owner(&self, resource_id: &str) -> Result<Option<String>> {
            Ok(self.0.get(resource_id).cloned())
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl ResourceStore for BrokenStore {
        async fn find_owner(&self, _resource_id: &str) -> Result<Option<String>> {
            Err(ShelfError::PoolError("connection refused".to_string()))
        }
    }

    fn guard() -> OwnershipGuard {
        let owners = HashMap::from([("book-1".to_string(), "alice".to_string())]);
        OwnershipGuard::new(Arc::new(FixedOwners(owners)))
    }

    #[tokio::test]
    async fn test_owner_is_allowed() {
        assert!(guard().is_owner("alice", "book-1").await);
    }

    #[tokio::test]
    async fn test_other_caller_is_denied() {
        assert!(!guard().is_owner("bob", "book-1").await);
    }

    #[tokio::test]
    async fn test_missing_resource_is_denied() {
        assert!(!guard().is_owner("alice", "book-2").await);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_denied() {
        let guard = OwnershipGuard::new(Arc::new(BrokenStore));
        assert!(!guard.is_owner("alice", "book-1").await);
    }
}
