use std::env;
use std::path::PathBuf;

use crate::storage::MASTER_KEY;

/// 환경 변수 기반 설정
/// `.env` 파일은 lib.rs에서 자동으로 로드됨
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// SQLite 파일 경로 (LEDGER_DB_PATH, 기본값: "wealth_hub.db")
    pub db_path: PathBuf,
    /// 전체 Database를 저장하는 키 (LEDGER_MASTER_KEY)
    pub master_key: String,
    /// 로그 디렉토리 (LEDGER_LOG_DIR, 기본값: "logs")
    pub log_dir: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("wealth_hub.db"),
            master_key: MASTER_KEY.to_string(),
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl LedgerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Self {
            db_path: non_empty("LEDGER_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            master_key: non_empty("LEDGER_MASTER_KEY").unwrap_or(defaults.master_key),
            log_dir: non_empty("LEDGER_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
        }
    }
}
