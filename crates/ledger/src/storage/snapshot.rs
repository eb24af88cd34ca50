use interface::Database;
use std::sync::Arc;

use super::{KeyValueStore, StoreError};

/// 기본 마스터 저장 키
pub const MASTER_KEY: &str = "WEALTH_HUB_MASTER_STORAGE_PERSISTENT";

/// 마스터 키 하나에 전체 Database를 통째로 저장하는 스냅샷
pub struct DatabaseSnapshot {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl DatabaseSnapshot {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// 마스터 키의 Database 읽기 (없으면 None)
    pub async fn load(&self) -> Result<Option<Database>, StoreError> {
        match self.store.get(&self.key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// 전체 Database를 직렬화해서 마스터 키에 기록
    pub async fn save(&self, db: &Database) -> Result<(), StoreError> {
        let raw = serde_json::to_string(db)?;
        self.store.set(&self.key, &raw).await
    }

    /// 마스터 키 삭제
    pub async fn discard(&self) -> Result<(), StoreError> {
        self.store.remove(&self.key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryKeyValueStore;

    #[tokio::test]
    async fn test_save_load_discard() {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let snapshot = DatabaseSnapshot::new(store.clone(), MASTER_KEY);

        assert!(snapshot.load().await.unwrap().is_none());

        snapshot.save(&Database::new()).await.unwrap();
        let raw = store.get(MASTER_KEY).await.unwrap().unwrap();
        assert_eq!(raw, r#"{"utEntries":[],"bondEntries":[],"genericEntries":[]}"#);
        assert_eq!(snapshot.load().await.unwrap(), Some(Database::new()));

        snapshot.discard().await.unwrap();
        assert!(store.get(MASTER_KEY).await.unwrap().is_none());
    }
}
