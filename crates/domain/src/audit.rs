//! Best-effort audit history.

use store::{AuditEntry, AuditStore};

use crate::error::ServiceError;

/// Records audit entries without ever failing the calling operation.
#[derive(Clone)]
pub struct AuditRecorder<A: AuditStore> {
    store: A,
}

impl<A: AuditStore> AuditRecorder<A> {
    pub fn new(store: A) -> Self {
        Self { store }
    }

    /// Appends an entry. A store failure is logged and dropped.
    pub async fn record(&self, entry: AuditEntry) {
        let action = entry.action.clone();
        let entity_id = entry.entity_id.clone();
        if let Err(e) = self.store.append_audit(entry).await {
            metrics::counter!("audit_failures_total").increment(1);
            tracing::warn!(%action, %entity_id, error = %e, "failed to record audit entry");
        }
    }

    /// Lists the history of one entity, newest first.
    pub async fn history(&self, entity_id: &str) -> Result<Vec<AuditEntry>, ServiceError> {
        Ok(self.store.list_audit_for_entity(entity_id).await?)
    }

    /// Lists the most recent entries across all entities.
    pub async fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>, ServiceError> {
        Ok(self.store.list_recent_audit(limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use store::{InMemoryStore, StoreError};

    #[derive(Clone)]
    struct BrokenAuditStore;

    #[async_trait]
    impl AuditStore for BrokenAuditStore {
        async fn append_audit(&self, _entry: AuditEntry) -> store::Result<()> {
            Err(StoreError::Corrupt("audit table unavailable".to_string()))
        }

        async fn list_audit_for_entity(&self, _entity_id: &str) -> store::Result<Vec<AuditEntry>> {
            Err(StoreError::Corrupt("audit table unavailable".to_string()))
        }

        async fn list_recent_audit(&self, _limit: usize) -> store::Result<Vec<AuditEntry>> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_record_and_read_back() {
        let store = InMemoryStore::new();
        let recorder = AuditRecorder::new(store.clone());

        recorder
            .record(AuditEntry::success("CREATE", "Order", "o-1", "created"))
            .await;
        recorder
            .record(AuditEntry::failure("CREATE", "Order", "o-2", "confirmation failed"))
            .await;

        let history = recorder.history("o-1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].message, "created");

        let recent = recorder.recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].entity_id, "o-2");
        assert_eq!(recent[0].status, store::AuditStatus::Failure);
    }

    #[tokio::test]
    async fn test_record_swallows_store_failure() {
        let recorder = AuditRecorder::new(BrokenAuditStore);
        recorder
            .record(AuditEntry::success("CREATE", "Order", "o-1", "created"))
            .await;

        // Reads still surface the error
        assert!(matches!(
            recorder.history("o-1").await,
            Err(ServiceError::Store(_))
        ));
    }
}
