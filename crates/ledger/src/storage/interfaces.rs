use async_trait::async_trait;

/// 로컬 키/값 저장소 인터페이스
/// 브라우저 localStorage와 같은 모델: 문자열 키에 문자열 값 하나
/// 확장성을 위해 트레이트로 정의하여 SQLite 외 다른 백엔드로 전환 가능
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// 저장된 모든 키 (순서는 백엔드가 정함)
    async fn keys(&self) -> Result<Vec<String>, StoreError>;

    /// 키의 원본 문자열 값 조회
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// 값 저장 (이미 있으면 덮어씀)
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// 키 삭제 (없으면 아무 일도 하지 않음)
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// 저장소 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}
