use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// 담당 어드바이저
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Advisor {
    Nick,
    Joey,
}

impl Display for Advisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Advisor::Nick => f.pad("Nick"),
            Advisor::Joey => f.pad("Joey"),
        }
    }
}

impl FromStr for Advisor {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Nick" | "NICK" | "nick" => Ok(Advisor::Nick),
            "Joey" | "JOEY" | "joey" => Ok(Advisor::Joey),
            _ => Err(ParseError::new("advisor", s)),
        }
    }
}

/// 지점 코드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Branch {
    MBR,
    FCB,
    HPSK,
    TSB,
    HSV,
    #[serde(rename = "KTV+SKB")]
    KtvSkb,
    SHO,
    HKS,
}

impl Branch {
    pub const ALL: [Branch; 8] = [
        Branch::MBR,
        Branch::FCB,
        Branch::HPSK,
        Branch::TSB,
        Branch::HSV,
        Branch::KtvSkb,
        Branch::SHO,
        Branch::HKS,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Branch::MBR => "MBR",
            Branch::FCB => "FCB",
            Branch::HPSK => "HPSK",
            Branch::TSB => "TSB",
            Branch::HSV => "HSV",
            Branch::KtvSkb => "KTV+SKB",
            Branch::SHO => "SHO",
            Branch::HKS => "HKS",
        }
    }
}

impl Display for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.code())
    }
}

impl FromStr for Branch {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Branch::ALL
            .iter()
            .copied()
            .find(|b| b.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::new("branch", s))
    }
}

/// 기타 수입 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncomeType {
    CPI,
    ELC,
}

impl Display for IncomeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncomeType::CPI => write!(f, "CPI"),
            IncomeType::ELC => write!(f, "ELC"),
        }
    }
}

impl FromStr for IncomeType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CPI" => Ok(IncomeType::CPI),
            "ELC" => Ok(IncomeType::ELC),
            _ => Err(ParseError::new("income type", s)),
        }
    }
}

/// 기록 종류 (UT / 채권 / 기타 수입)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Ut,
    Bond,
    Generic,
}

impl EntryKind {
    pub const ALL: [EntryKind; 3] = [EntryKind::Ut, EntryKind::Bond, EntryKind::Generic];
}

impl Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::Ut => write!(f, "ut"),
            EntryKind::Bond => write!(f, "bond"),
            EntryKind::Generic => write!(f, "generic"),
        }
    }
}

impl FromStr for EntryKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ut" => Ok(EntryKind::Ut),
            "bond" => Ok(EntryKind::Bond),
            "generic" => Ok(EntryKind::Generic),
            _ => Err(ParseError::new("entry kind", s)),
        }
    }
}

/// UT(펀드) 판매 기록
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtSale {
    pub date: NaiveDate,
    pub advisor: Advisor,
    pub branch: Branch,
    /// 초기 버전에는 없던 필드
    #[serde(default)]
    pub salesperson: String,
    pub revenue: f64,
    /// 판매 건수
    pub count: f64,
}

/// 채권 판매 기록
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BondSale {
    pub date: NaiveDate,
    pub advisor: Advisor,
    pub branch: Branch,
    #[serde(default)]
    pub salesperson: String,
    pub product: String,
    pub deal_amount: f64,
    /// 통화 코드 (예: "USD", "HKD")
    pub currency: String,
    pub revenue: f64,
    pub customer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_eli: Option<bool>,
}

/// 기타 수입 기록 (CPI / ELC)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericIncome {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub income_type: IncomeType,
    pub advisor: Advisor,
    pub branch: Branch,
    #[serde(default)]
    pub salesperson: String,
    pub revenue: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_amount: Option<String>,
}

/// 저장된 기록 (ID 포함)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stored<T> {
    /// 전체 데이터베이스에서 유일한 ID
    pub id: String,
    /// 기록 데이터
    #[serde(flatten)]
    pub record: T,
}

impl<T> Stored<T> {
    pub fn new(id: impl Into<String>, record: T) -> Self {
        Self {
            id: id.into(),
            record,
        }
    }
}

/// ID가 없는 새 기록
#[derive(Debug, Clone, PartialEq)]
pub enum NewEntry {
    Ut(UtSale),
    Bond(BondSale),
    Generic(GenericIncome),
}

impl NewEntry {
    pub fn kind(&self) -> EntryKind {
        match self {
            NewEntry::Ut(_) => EntryKind::Ut,
            NewEntry::Bond(_) => EntryKind::Bond,
            NewEntry::Generic(_) => EntryKind::Generic,
        }
    }

    pub fn with_id(self, id: impl Into<String>) -> Entry {
        match self {
            NewEntry::Ut(record) => Entry::Ut(Stored::new(id, record)),
            NewEntry::Bond(record) => Entry::Bond(Stored::new(id, record)),
            NewEntry::Generic(record) => Entry::Generic(Stored::new(id, record)),
        }
    }
}

/// 종류별로 태그된 저장 기록
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Ut(Stored<UtSale>),
    Bond(Stored<BondSale>),
    Generic(Stored<GenericIncome>),
}

impl Entry {
    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::Ut(_) => EntryKind::Ut,
            Entry::Bond(_) => EntryKind::Bond,
            Entry::Generic(_) => EntryKind::Generic,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Entry::Ut(e) => &e.id,
            Entry::Bond(e) => &e.id,
            Entry::Generic(e) => &e.id,
        }
    }
}

/// 세 종류의 기록 목록. 각 목록은 최신 기록이 앞에 온다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    #[serde(default)]
    pub ut_entries: Vec<Stored<UtSale>>,
    #[serde(default)]
    pub bond_entries: Vec<Stored<BondSale>>,
    #[serde(default)]
    pub generic_entries: Vec<Stored<GenericIncome>>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ut_entries.len() + self.bond_entries.len() + self.generic_entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count(&self, kind: EntryKind) -> usize {
        match kind {
            EntryKind::Ut => self.ut_entries.len(),
            EntryKind::Bond => self.bond_entries.len(),
            EntryKind::Generic => self.generic_entries.len(),
        }
    }

    /// 세 목록 전체의 ID 집합
    pub fn ids(&self) -> HashSet<&str> {
        self.ut_entries
            .iter()
            .map(|e| e.id.as_str())
            .chain(self.bond_entries.iter().map(|e| e.id.as_str()))
            .chain(self.generic_entries.iter().map(|e| e.id.as_str()))
            .collect()
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.ut_entries.iter().any(|e| e.id == id)
            || self.bond_entries.iter().any(|e| e.id == id)
            || self.generic_entries.iter().any(|e| e.id == id)
    }

    /// 해당 목록 맨 뒤에 추가
    pub fn push(&mut self, entry: Entry) {
        match entry {
            Entry::Ut(e) => self.ut_entries.push(e),
            Entry::Bond(e) => self.bond_entries.push(e),
            Entry::Generic(e) => self.generic_entries.push(e),
        }
    }

    /// 해당 목록 맨 앞에 추가 (최신순)
    pub fn prepend(&mut self, entry: Entry) {
        match entry {
            Entry::Ut(e) => self.ut_entries.insert(0, e),
            Entry::Bond(e) => self.bond_entries.insert(0, e),
            Entry::Generic(e) => self.generic_entries.insert(0, e),
        }
    }

    /// `kind` 목록에서 ID가 일치하는 첫 기록을 제거
    pub fn remove(&mut self, kind: EntryKind, id: &str) -> Option<Entry> {
        match kind {
            EntryKind::Ut => remove_first(&mut self.ut_entries, id).map(Entry::Ut),
            EntryKind::Bond => remove_first(&mut self.bond_entries, id).map(Entry::Bond),
            EntryKind::Generic => remove_first(&mut self.generic_entries, id).map(Entry::Generic),
        }
    }
}

fn remove_first<T>(list: &mut Vec<Stored<T>>, id: &str) -> Option<Stored<T>> {
    let pos = list.iter().position(|e| e.id == id)?;
    Some(list.remove(pos))
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {field}: {value}")]
pub struct ParseError {
    pub field: &'static str,
    pub value: String,
}

impl ParseError {
    fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 13).unwrap()
    }

    fn ut(id: &str) -> Stored<UtSale> {
        Stored::new(
            id,
            UtSale {
                date: date(),
                advisor: Advisor::Nick,
                branch: Branch::MBR,
                salesperson: "Alice".to_string(),
                revenue: 1200.0,
                count: 2.0,
            },
        )
    }

    #[test]
    fn test_branch_parse_and_display() {
        assert_eq!("KTV+SKB".parse::<Branch>().unwrap(), Branch::KtvSkb);
        assert_eq!("hpsk".parse::<Branch>().unwrap(), Branch::HPSK);
        assert_eq!(Branch::KtvSkb.to_string(), "KTV+SKB");
        assert!("XYZ".parse::<Branch>().is_err());
    }

    #[test]
    fn test_entry_kind_parse() {
        assert_eq!("UT".parse::<EntryKind>().unwrap(), EntryKind::Ut);
        assert_eq!(EntryKind::Generic.to_string(), "generic");
        let err = "fund".parse::<EntryKind>().unwrap_err();
        assert_eq!(err.to_string(), "invalid entry kind: fund");
    }

    #[test]
    fn test_stored_record_json_layout() {
        let json = serde_json::to_value(ut("a")).unwrap();
        assert_eq!(json["id"], "a");
        assert_eq!(json["date"], "2026-01-13");
        assert_eq!(json["advisor"], "Nick");
        assert_eq!(json["branch"], "MBR");
        assert_eq!(json["count"], 2.0);
    }

    #[test]
    fn test_bond_optional_fields_and_camel_case() {
        let raw = r#"{"id":"b1","date":"2026-01-12","advisor":"Joey","branch":"KTV+SKB",
            "product":"HK Gov 2030","dealAmount":500000,"currency":"HKD","revenue":2500,
            "customer":"Chan"}"#;
        let bond: Stored<BondSale> = serde_json::from_str(raw).unwrap();
        assert_eq!(bond.record.branch, Branch::KtvSkb);
        assert_eq!(bond.record.salesperson, "");
        assert_eq!(bond.record.commission_rate, None);
        assert_eq!(bond.record.is_eli, None);

        let json = serde_json::to_value(&bond).unwrap();
        assert_eq!(json["dealAmount"], 500000.0);
        assert!(json.get("commissionRate").is_none());
    }

    #[test]
    fn test_generic_type_field() {
        let raw = r#"{"id":"g1","date":"2026-01-12","type":"ELC","advisor":"Nick",
            "branch":"TSB","salesperson":"Bob","revenue":2000,"dealAmount":"1M"}"#;
        let generic: Stored<GenericIncome> = serde_json::from_str(raw).unwrap();
        assert_eq!(generic.record.income_type, IncomeType::ELC);
        assert_eq!(generic.record.deal_amount.as_deref(), Some("1M"));
    }

    #[test]
    fn test_database_prepend_and_remove_first() {
        let mut db = Database::new();
        db.prepend(Entry::Ut(ut("a")));
        db.prepend(Entry::Ut(ut("b")));
        assert_eq!(db.ut_entries[0].id, "b");
        assert_eq!(db.ids().len(), 2);

        assert!(db.remove(EntryKind::Bond, "a").is_none());
        let removed = db.remove(EntryKind::Ut, "a").unwrap();
        assert_eq!(removed.id(), "a");
        assert_eq!(removed.kind(), EntryKind::Ut);
        assert!(!db.contains_id("a"));
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn test_database_missing_lists_default_to_empty() {
        let db: Database = serde_json::from_str(r#"{"utEntries":[]}"#).unwrap();
        assert!(db.is_empty());
        let json = serde_json::to_value(&db).unwrap();
        assert!(json["bondEntries"].as_array().unwrap().is_empty());
        assert!(json["genericEntries"].as_array().unwrap().is_empty());
    }
}
