use chrono::Utc;
use interface::{Database, EntryKind, NewEntry, Stored};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::recovery::{self, Recovery, RecoveryReport, ScanOutcome};
use crate::storage::{DatabaseSnapshot, KeyValueStore, StoreError};

/// 전체 삭제 전에 보여주는 경고 문구
pub const CLEAR_WARNING: &str = "경고: 이 기기에 저장된 로컬 데이터가 모두 삭제됩니다.";

/// 되돌릴 수 없는 작업 전에 사용자 확인을 받는 인터페이스
pub trait Confirm {
    fn confirm(&self, message: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

/// 가져오기 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub added: usize,
    /// 이미 있는 ID라서 버린 기록 수
    pub skipped: usize,
}

/// 메모리의 Database와 그 저장소를 함께 소유
/// 모든 변경 후 전체 Database를 마스터 키에 다시 기록한다 (write-through)
pub struct Ledger {
    db: Database,
    snapshot: DatabaseSnapshot,
    recovery_report: RecoveryReport,
}

impl Ledger {
    /// 저장소 전체를 복구해서 Ledger 생성
    /// 복구된 결과는 곧바로 마스터 키에 기록된다.
    /// 마스터 키에 복구하지 못한 기록이 있으면 덮어쓰기 전에 원본을 백업 키에 복사해 둔다.
    pub async fn open(store: Arc<dyn KeyValueStore>, master_key: &str) -> Result<Self, StoreError> {
        let previous = store.get(master_key).await?;
        let (db, recovery_report) = recovery::recover(store.as_ref()).await;

        // 키 목록을 못 읽었으면 복구 결과가 비어 있으므로 마스터 키를 덮어쓰지 않는다
        if recovery_report.key_listing_failed {
            return Err(StoreError::Other(
                "failed to list local storage keys, refusing to overwrite the master key"
                    .to_string(),
            ));
        }

        if let Some(raw) = previous {
            if has_rejected_records(master_key, &raw) {
                let backup_key = unrecovered_key(master_key);
                store.set(&backup_key, &raw).await?;
                warn!(
                    "Master key {} held records that could not be recovered, original kept under {}",
                    master_key, backup_key
                );
            }
        }

        let ledger = Self {
            db,
            snapshot: DatabaseSnapshot::new(store, master_key),
            recovery_report,
        };
        ledger.persist().await?;

        Ok(ledger)
    }

    /// 현재 Database (읽기 전용)
    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn recovery_report(&self) -> &RecoveryReport {
        &self.recovery_report
    }

    pub fn snapshot(&self) -> &DatabaseSnapshot {
        &self.snapshot
    }

    /// 새 ID를 발급해서 해당 목록 맨 앞에 추가
    /// 필드 값은 검증하지 않는다
    pub async fn add(&mut self, entry: NewEntry) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let kind = entry.kind();

        self.db.prepend(entry.with_id(id.clone()));
        info!("Added {} entry {}", kind, id);

        self.persist().await?;
        Ok(id)
    }

    /// `kind` 목록에서 ID가 일치하는 첫 기록 삭제
    /// 없으면 아무것도 지우지 않지만 저장은 그대로 수행
    pub async fn delete(&mut self, kind: EntryKind, id: &str) -> Result<bool, StoreError> {
        let removed = self.db.remove(kind, id).is_some();
        if removed {
            info!("Deleted {} entry {}", kind, id);
        } else {
            warn!("No {} entry with id {} to delete", kind, id);
        }

        self.persist().await?;
        Ok(removed)
    }

    /// 다른 Database를 합치기
    /// 현재 ID 집합에 없는 기록만 가져온 순서대로 각 목록 뒤에 붙이고, 겹치는 ID는 버린다
    pub async fn import(&mut self, imported: Database) -> Result<ImportReport, StoreError> {
        let seen: HashSet<String> = self.db.ids().into_iter().map(str::to_owned).collect();
        let mut report = ImportReport::default();

        append_unseen(
            &mut self.db.ut_entries,
            imported.ut_entries,
            &seen,
            &mut report,
        );
        append_unseen(
            &mut self.db.bond_entries,
            imported.bond_entries,
            &seen,
            &mut report,
        );
        append_unseen(
            &mut self.db.generic_entries,
            imported.generic_entries,
            &seen,
            &mut report,
        );

        info!(
            "Imported {} entries ({} already present)",
            report.added, report.skipped
        );

        self.persist().await?;
        Ok(report)
    }

    /// 사용자 확인 후 마스터 키를 지우고 Database를 비운다
    /// 확인하지 않으면 아무것도 바뀌지 않는다
    pub async fn clear(&mut self, confirm: &impl Confirm) -> Result<bool, StoreError> {
        if !confirm.confirm(CLEAR_WARNING) {
            info!("Clear cancelled");
            return Ok(false);
        }

        self.snapshot.discard().await?;
        self.db = Database::new();
        warn!("All ledger data cleared (master key {} removed)", self.snapshot.key());

        Ok(true)
    }

    async fn persist(&self) -> Result<(), StoreError> {
        self.snapshot.save(&self.db).await
    }
}

/// 마스터 키 원본만 따로 훑어서 버려지는 기록이 있는지 확인
fn has_rejected_records(master_key: &str, raw: &str) -> bool {
    match Recovery::new().scan(master_key, raw) {
        ScanOutcome::Merged(counts) => counts.rejected > 0,
        _ => false,
    }
}

/// 복구하지 못한 원본을 보관할 키
fn unrecovered_key(master_key: &str) -> String {
    format!(
        "{}.unrecovered.{}",
        master_key,
        Utc::now().format("%Y%m%dT%H%M%S%.3fZ")
    )
}

fn append_unseen<T>(
    target: &mut Vec<Stored<T>>,
    incoming: Vec<Stored<T>>,
    seen: &HashSet<String>,
    report: &mut ImportReport,
) {
    for entry in incoming {
        if seen.contains(&entry.id) {
            report.skipped += 1;
        } else {
            target.push(entry);
            report.added += 1;
        }
    }
}
