//! 시작 시 로컬 저장소 전체를 훑어서 예전 버전이 남긴 기록을 찾아 하나의 Database로 합친다.
//!
//! 최선 노력(best-effort) 경로라서 읽기 실패, 파싱 실패, 형식이 다른 값은 모두 조용히 건너뛴다.
//! ID는 세 종류 전체에서 하나의 집합으로 관리하며 먼저 발견된 기록이 이긴다.

use interface::{Database, Entry, EntryKind};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::storage::KeyValueStore;

/// 원본 문자열에 이 중 하나라도 있어야 파싱을 시도한다
pub const TRIGGER_SUBSTRINGS: [&str; 3] = ["utEntries", "revenue", "advisor"];

/// 종류별 목록 필드 이름 (앞에서부터 우선)
pub fn legacy_fields(kind: EntryKind) -> [&'static str; 3] {
    match kind {
        EntryKind::Ut => ["utEntries", "uts", "ut"],
        EntryKind::Bond => ["bondEntries", "bonds", "bond"],
        EntryKind::Generic => ["genericEntries", "generics", "generic"],
    }
}

/// 아직 검증되지 않은 복구 기록
#[derive(Debug, Clone, PartialEq)]
pub struct UnvalidatedEntry {
    kind: EntryKind,
    value: Value,
}

impl UnvalidatedEntry {
    pub fn new(kind: EntryKind, value: Value) -> Self {
        Self { kind, value }
    }

    /// 참(truthy)으로 취급되는 `id` 값. 숫자 ID는 문자열로 바꾼다.
    pub fn id(&self) -> Option<String> {
        match self.value.get("id")? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) if n.as_f64().map_or(true, |f| f != 0.0) => Some(n.to_string()),
            _ => None,
        }
    }

    /// 타입이 있는 기록으로 승격. 구조가 맞지 않으면 에러.
    pub fn promote(self, id: String) -> Result<Entry, serde_json::Error> {
        let mut value = self.value;
        if let Some(object) = value.as_object_mut() {
            object.insert("id".to_string(), Value::String(id));
        }

        let entry = match self.kind {
            EntryKind::Ut => Entry::Ut(serde_json::from_value(value)?),
            EntryKind::Bond => Entry::Bond(serde_json::from_value(value)?),
            EntryKind::Generic => Entry::Generic(serde_json::from_value(value)?),
        };
        Ok(entry)
    }
}

/// 키 하나를 훑은 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// 트리거 문자열이 없어서 파싱하지 않음
    Filtered,
    /// JSON 파싱 실패
    Unparsable,
    /// JSON 객체가 아님
    NotAnObject,
    Merged(MergeCounts),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeCounts {
    pub recovered: usize,
    pub duplicates: usize,
    pub rejected: usize,
}

/// 복구 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// 키 목록 자체를 읽지 못함
    pub key_listing_failed: bool,
    pub keys_scanned: usize,
    pub keys_unreadable: usize,
    pub keys_filtered: usize,
    pub keys_unparsable: usize,
    pub keys_not_object: usize,
    pub keys_merged: usize,
    pub records_recovered: usize,
    pub duplicates_dropped: usize,
    pub records_rejected: usize,
}

/// 누적 복구 상태
#[derive(Debug, Default)]
pub struct Recovery {
    database: Database,
    seen: HashSet<String>,
    report: RecoveryReport,
}

impl Recovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// 읽을 수 없었던 키 기록
    pub fn skip_unreadable(&mut self, key: &str) {
        debug!("Recovery: key {:?} unreadable, skipped", key);
        self.report.keys_scanned += 1;
        self.report.keys_unreadable += 1;
    }

    /// 키 하나의 원본 값을 훑어서 합치기
    pub fn scan(&mut self, key: &str, raw: &str) -> ScanOutcome {
        self.report.keys_scanned += 1;

        if !TRIGGER_SUBSTRINGS.iter().any(|t| raw.contains(t)) {
            self.report.keys_filtered += 1;
            return ScanOutcome::Filtered;
        }

        let parsed: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                debug!("Recovery: key {:?} is not valid JSON: {}", key, e);
                self.report.keys_unparsable += 1;
                return ScanOutcome::Unparsable;
            }
        };

        match self.merge_value(&parsed) {
            Some(counts) => {
                debug!(
                    "Recovery: key {:?} merged (recovered={}, duplicates={}, rejected={})",
                    key, counts.recovered, counts.duplicates, counts.rejected
                );
                self.report.keys_merged += 1;
                ScanOutcome::Merged(counts)
            }
            None => {
                debug!("Recovery: key {:?} is not a JSON object", key);
                self.report.keys_not_object += 1;
                ScanOutcome::NotAnObject
            }
        }
    }

    /// 파싱된 값에서 세 종류의 목록을 찾아 합치기. 객체가 아니면 None.
    pub fn merge_value(&mut self, value: &Value) -> Option<MergeCounts> {
        let object = value.as_object()?;
        let mut counts = MergeCounts::default();

        for kind in EntryKind::ALL {
            for item in resolve_list(object, kind) {
                let candidate = UnvalidatedEntry::new(kind, item.clone());
                let Some(id) = candidate.id() else {
                    counts.rejected += 1;
                    continue;
                };
                if self.seen.contains(&id) {
                    counts.duplicates += 1;
                    continue;
                }
                match candidate.promote(id.clone()) {
                    Ok(entry) => {
                        self.database.push(entry);
                        self.seen.insert(id);
                        counts.recovered += 1;
                    }
                    Err(e) => {
                        debug!("Recovery: {} entry {:?} rejected: {}", kind, id, e);
                        counts.rejected += 1;
                    }
                }
            }
        }

        self.report.records_recovered += counts.recovered;
        self.report.duplicates_dropped += counts.duplicates;
        self.report.records_rejected += counts.rejected;
        Some(counts)
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn report(&self) -> &RecoveryReport {
        &self.report
    }

    /// 키 목록 조회 실패 기록
    pub fn fail_key_listing(&mut self) {
        self.report.key_listing_failed = true;
    }

    pub fn finish(self) -> (Database, RecoveryReport) {
        (self.database, self.report)
    }
}

/// 저장소의 모든 키를 훑어서 Database 복구
/// 어떤 실패도 에러로 올리지 않는다
pub async fn recover(store: &dyn KeyValueStore) -> (Database, RecoveryReport) {
    let mut recovery = Recovery::new();

    let keys = match store.keys().await {
        Ok(keys) => keys,
        Err(e) => {
            warn!("Recovery: failed to enumerate local storage keys: {}", e);
            recovery.fail_key_listing();
            Vec::new()
        }
    };

    for key in keys {
        match store.get(&key).await {
            Ok(Some(raw)) => {
                recovery.scan(&key, &raw);
            }
            Ok(None) => recovery.skip_unreadable(&key),
            Err(e) => {
                debug!("Recovery: failed to read key {:?}: {}", key, e);
                recovery.skip_unreadable(&key);
            }
        }
    }

    let (database, report) = recovery.finish();
    info!(
        "Recovery finished: {} keys scanned, {} merged, {} records recovered (ut={}, bond={}, generic={}), {} duplicates dropped, {} rejected",
        report.keys_scanned,
        report.keys_merged,
        report.records_recovered,
        database.ut_entries.len(),
        database.bond_entries.len(),
        database.generic_entries.len(),
        report.duplicates_dropped,
        report.records_rejected,
    );

    (database, report)
}

/// 대체 필드 이름을 순서대로 보고 처음으로 참인 값을 고른다.
/// 고른 값이 배열이 아니면 빈 목록.
fn resolve_list(object: &Map<String, Value>, kind: EntryKind) -> &[Value] {
    let resolved = legacy_fields(kind)
        .iter()
        .filter_map(|field| object.get(*field))
        .find(|value| is_truthy(value));

    match resolved {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    }
}

/// 자바스크립트 기준의 참/거짓
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
