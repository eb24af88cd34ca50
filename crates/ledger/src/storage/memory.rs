use async_trait::async_trait;
use std::sync::RwLock;

use super::{KeyValueStore, StoreError};

/// 메모리 기반 키/값 저장소
/// 키 순서는 처음 저장된 순서를 유지 (복구 순서를 테스트에서 제어하기 위함)
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: RwLock<Vec<(String, String)>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 주어진 순서대로 미리 채운 저장소
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Other("in-memory store lock poisoned".to_string())
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.iter().map(|(k, _)| k.clone()).collect())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => entries.push((key.to_string(), value.to_string())),
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.retain(|(k, _)| k != key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_keys_keep_insertion_order() {
        let store = InMemoryKeyValueStore::with_entries([("b", "1"), ("a", "2")]);
        store.set("c", "3").await.unwrap();
        store.set("b", "4").await.unwrap();

        assert_eq!(store.keys().await.unwrap(), vec!["b", "a", "c"]);
        assert_eq!(store.get("b").await.unwrap().as_deref(), Some("4"));

        store.remove("a").await.unwrap();
        assert_eq!(store.keys().await.unwrap(), vec!["b", "c"]);
    }
}
