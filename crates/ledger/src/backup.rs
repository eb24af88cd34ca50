use interface::Database;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::storage::{KeyValueStore, StoreError};

/// Database를 백업 JSON 파일로 내보내기
pub fn export_database(db: &Database, path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let raw = serde_json::to_string_pretty(db)?;
    fs::write(path, raw)?;

    info!(
        "Exported {} entries to {}",
        db.len(),
        path.to_string_lossy()
    );
    Ok(())
}

/// 백업 JSON 파일 읽기 (Import 입력용)
pub fn read_backup(path: &Path) -> Result<Database, StoreError> {
    let raw = fs::read_to_string(path)?;
    let db: Database = serde_json::from_str(&raw)?;
    Ok(db)
}

/// 브라우저 localStorage 덤프(`{ "키": "값", ... }`)를 저장소에 그대로 옮기기
/// 문자열이 아닌 값은 JSON 텍스트로 저장. 옮긴 키 개수를 반환
pub async fn load_local_storage_dump(
    store: &dyn KeyValueStore,
    path: &Path,
) -> Result<usize, StoreError> {
    let raw = fs::read_to_string(path)?;
    let parsed: Value = serde_json::from_str(&raw)?;

    let object = parsed.as_object().ok_or_else(|| {
        StoreError::Other(format!(
            "local storage dump must be a JSON object: {}",
            path.to_string_lossy()
        ))
    })?;

    for (key, value) in object {
        match value {
            Value::String(s) => store.set(key, s).await?,
            other => store.set(key, &other.to_string()).await?,
        }
    }

    info!(
        "Loaded {} local storage keys from {}",
        object.len(),
        path.to_string_lossy()
    );
    Ok(object.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recovery::recover;
    use crate::storage::InMemoryKeyValueStore;
    use interface::{Advisor, Branch, IncomeType, GenericIncome, Stored};
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("ledger-backup-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[test]
    fn test_export_then_read_backup() {
        let mut db = Database::new();
        db.generic_entries.push(Stored::new(
            "g1",
            GenericIncome {
                date: chrono::NaiveDate::from_ymd_opt(2026, 1, 12).unwrap(),
                income_type: IncomeType::CPI,
                advisor: Advisor::Nick,
                branch: Branch::FCB,
                salesperson: "Gil".to_string(),
                revenue: 26994.0,
                deal_amount: None,
            },
        ));

        let path = temp_path("backup.json");
        export_database(&db, &path).unwrap();

        assert_eq!(read_backup(&path).unwrap(), db);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_read_backup_rejects_malformed_file() {
        let path = temp_path("broken.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(read_backup(&path), Err(StoreError::Serialization(_))));
        assert!(matches!(
            read_backup(&path.with_file_name("missing.json")),
            Err(StoreError::Io(_))
        ));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn test_dump_is_loaded_and_recovered() {
        let dump = serde_json::json!({
            "theme": "dark",
            "wealth_hub_backup": "{\"uts\":[{\"id\":\"a\",\"date\":\"2026-01-12\",\"advisor\":\"Joey\",\"branch\":\"HKS\",\"revenue\":28240,\"count\":4}]}",
            "counter": 3
        });
        let path = temp_path("dump.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, dump.to_string()).unwrap();

        let store = InMemoryKeyValueStore::new();
        let loaded = load_local_storage_dump(&store, &path).await.unwrap();
        assert_eq!(loaded, 3);
        assert_eq!(store.get("counter").await.unwrap().as_deref(), Some("3"));

        let (db, _) = recover(&store).await;
        assert_eq!(db.ut_entries.len(), 1);
        assert_eq!(db.ut_entries[0].record.branch, Branch::HKS);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn test_dump_must_be_an_object() {
        let path = temp_path("array.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "[1, 2]").unwrap();

        let store = InMemoryKeyValueStore::new();
        let result = load_local_storage_dump(&store, &path).await;
        assert!(matches!(result, Err(StoreError::Other(_))));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
