pub mod backup;
pub mod config;
pub mod ledger;
pub mod logger;
pub mod recovery;
pub mod storage;

pub use config::LedgerConfig;
pub use ledger::{Confirm, ImportReport, Ledger, CLEAR_WARNING};
pub use recovery::{recover, Recovery, RecoveryReport, ScanOutcome, UnvalidatedEntry};
pub use storage::{
    DatabaseSnapshot, InMemoryKeyValueStore, KeyValueStore, SqliteKeyValueStore, StoreError,
};

// 라이브러리 로드 시 .env 자동 로드
#[ctor::ctor]
fn load_env() {
    dotenv::dotenv().ok();
}
