use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, QueryOrder,
    QuerySelect, Schema, Set,
};
use std::env;
use std::path::{Path, PathBuf};
use tracing::info;

use super::entities::local_storage;
use super::{KeyValueStore, StoreError};

/// SQLite 기반 키/값 저장소
/// 테이블 하나(`local_storage`)에 키와 원본 문자열 값을 그대로 저장
pub struct SqliteKeyValueStore {
    db: DatabaseConnection,
}

impl SqliteKeyValueStore {
    /// DB 파일을 열거나 새로 생성
    /// 상대 경로는 현재 디렉토리 기준
    pub async fn open(db_path: &Path) -> Result<Self, StoreError> {
        let mut path = PathBuf::from(db_path);
        if !path.is_absolute() {
            if let Ok(current_dir) = env::current_dir() {
                path = current_dir.join(db_path);
            }
        }

        // 디렉토리가 없으면 생성
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Other(format!("Failed to create DB directory: {}", e)))?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", path.to_string_lossy());
        Self::connect(&db_url).await
    }

    /// 연결 URL로 직접 연결 (테스트에서는 "sqlite::memory:")
    pub async fn connect(db_url: &str) -> Result<Self, StoreError> {
        info!("Connecting to SQLite database: {}", db_url);

        // 단일 작성자 모델이므로 연결 하나면 충분하고, 메모리 DB는 연결마다 따로 생긴다
        let mut options = ConnectOptions::new(db_url.to_string());
        options.max_connections(1).sqlx_logging(false);

        let db = Database::connect(options).await?;

        let backend = db.get_database_backend();
        let schema = Schema::new(backend);

        // 테이블 생성 (IF NOT EXISTS)
        let mut create_table_stmt = schema.create_table_from_entity(local_storage::Entity);
        create_table_stmt.if_not_exists();

        db.execute(backend.build(&create_table_stmt)).await?;

        info!("Local storage table initialized");

        Ok(Self { db })
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        let keys = local_storage::Entity::find()
            .select_only()
            .column(local_storage::Column::Key)
            .order_by_asc(local_storage::Column::Key)
            .into_tuple::<String>()
            .all(&self.db)
            .await?;

        Ok(keys)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let model = local_storage::Entity::find_by_id(key.to_string())
            .one(&self.db)
            .await?;

        Ok(model.map(|m| m.value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let model = local_storage::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
        };

        local_storage::Entity::insert(model)
            .on_conflict(
                OnConflict::column(local_storage::Column::Key)
                    .update_column(local_storage::Column::Value)
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        local_storage::Entity::delete_by_id(key.to_string())
            .exec(&self.db)
            .await?;

        Ok(())
    }
}
