use chrono::{Local, NaiveDate};
use color_eyre::eyre;
use interface::{
    Advisor, BondSale, Branch, Database, EntryKind, GenericIncome, IncomeType, NewEntry, UtSale,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use structopt::StructOpt;
use tracing::info;

use ledger::backup;
use ledger::{KeyValueStore, Ledger, LedgerConfig, SqliteKeyValueStore};

// lib.rs에서 자동으로 dotenv가 로드됨

#[derive(Debug, StructOpt)]
#[structopt(name = "ledger", about = "WealthHub 판매 기록 장부")]
enum Command {
    /// 종류별 기록 수와 복구 결과 출력
    Status,
    /// 기록 목록 (최신순)
    List {
        /// ut, bond, generic 중 하나 (생략하면 전체)
        #[structopt(long)]
        kind: Option<EntryKind>,
        #[structopt(long, default_value = "20")]
        limit: usize,
    },
    /// UT(펀드) 판매 기록 추가
    AddUt {
        /// YYYY-MM-DD (생략하면 오늘)
        #[structopt(long)]
        date: Option<NaiveDate>,
        #[structopt(long)]
        advisor: Advisor,
        #[structopt(long)]
        branch: Branch,
        #[structopt(long, default_value = "")]
        salesperson: String,
        #[structopt(long)]
        revenue: f64,
        #[structopt(long)]
        count: f64,
    },
    /// 채권 판매 기록 추가
    AddBond {
        #[structopt(long)]
        date: Option<NaiveDate>,
        #[structopt(long)]
        advisor: Advisor,
        #[structopt(long)]
        branch: Branch,
        #[structopt(long, default_value = "")]
        salesperson: String,
        #[structopt(long)]
        product: String,
        #[structopt(long)]
        deal_amount: f64,
        #[structopt(long, default_value = "USD")]
        currency: String,
        #[structopt(long)]
        revenue: f64,
        #[structopt(long)]
        customer: String,
        #[structopt(long)]
        commission_rate: Option<f64>,
        /// ELI 해당 여부
        #[structopt(long)]
        eli: bool,
    },
    /// 기타 수입(CPI/ELC) 기록 추가
    AddGeneric {
        #[structopt(long)]
        date: Option<NaiveDate>,
        #[structopt(long = "type")]
        income_type: IncomeType,
        #[structopt(long)]
        advisor: Advisor,
        #[structopt(long)]
        branch: Branch,
        #[structopt(long, default_value = "")]
        salesperson: String,
        #[structopt(long)]
        revenue: f64,
        #[structopt(long)]
        deal_amount: Option<String>,
    },
    /// 기록 삭제
    Delete {
        #[structopt(long)]
        kind: EntryKind,
        #[structopt(long)]
        id: String,
    },
    /// 백업 JSON 파일 가져오기 (이미 있는 ID는 건너뜀)
    Import {
        #[structopt(parse(from_os_str))]
        path: PathBuf,
    },
    /// 백업 JSON 파일로 내보내기
    Export {
        #[structopt(parse(from_os_str))]
        path: PathBuf,
    },
    /// 브라우저 localStorage 덤프를 저장소에 넣고 다시 복구
    LoadDump {
        #[structopt(parse(from_os_str))]
        path: PathBuf,
    },
    /// 모든 기록 삭제
    Clear {
        /// 확인 질문 없이 삭제
        #[structopt(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // init error reporting
    color_eyre::install()?;

    let config = LedgerConfig::from_env();

    // init logging
    let _guards = ledger::logger::init_tracing(&config.log_dir);

    let cmd = Command::from_args();

    let store: Arc<dyn KeyValueStore> = Arc::new(
        SqliteKeyValueStore::open(&config.db_path)
            .await
            .map_err(|e| eyre::eyre!("로컬 저장소 초기화 실패: {}", e))?,
    );

    // 시작할 때 한 번 전체 저장소를 복구
    let mut ledger = Ledger::open(store.clone(), &config.master_key)
        .await
        .map_err(|e| eyre::eyre!("장부 복구 실패: {}", e))?;

    match cmd {
        Command::Status => print_status(&ledger),
        Command::List { kind, limit } => {
            write_entries(&mut io::stdout().lock(), ledger.database(), kind, limit)?
        }
        Command::AddUt {
            date,
            advisor,
            branch,
            salesperson,
            revenue,
            count,
        } => {
            let entry = NewEntry::Ut(UtSale {
                date: date.unwrap_or_else(today),
                advisor,
                branch,
                salesperson,
                revenue,
                count,
            });
            add_entry(&mut ledger, entry).await?;
        }
        Command::AddBond {
            date,
            advisor,
            branch,
            salesperson,
            product,
            deal_amount,
            currency,
            revenue,
            customer,
            commission_rate,
            eli,
        } => {
            let entry = NewEntry::Bond(BondSale {
                date: date.unwrap_or_else(today),
                advisor,
                branch,
                salesperson,
                product,
                deal_amount,
                currency,
                revenue,
                customer,
                commission_rate,
                is_eli: eli.then_some(true),
            });
            add_entry(&mut ledger, entry).await?;
        }
        Command::AddGeneric {
            date,
            income_type,
            advisor,
            branch,
            salesperson,
            revenue,
            deal_amount,
        } => {
            let entry = NewEntry::Generic(GenericIncome {
                date: date.unwrap_or_else(today),
                income_type,
                advisor,
                branch,
                salesperson,
                revenue,
                deal_amount,
            });
            add_entry(&mut ledger, entry).await?;
        }
        Command::Delete { kind, id } => {
            let removed = ledger
                .delete(kind, &id)
                .await
                .map_err(|e| eyre::eyre!("기록 삭제 실패: {}", e))?;
            if removed {
                println!("삭제됨: {} {}", kind, id);
            } else {
                println!("해당 기록이 없습니다: {} {}", kind, id);
            }
        }
        Command::Import { path } => {
            let imported = backup::read_backup(&path)
                .map_err(|e| eyre::eyre!("백업 파일 읽기 실패: {}", e))?;
            let report = ledger
                .import(imported)
                .await
                .map_err(|e| eyre::eyre!("가져오기 실패: {}", e))?;
            println!(
                "가져오기 완료: {}건 추가, {}건 중복으로 건너뜀",
                report.added, report.skipped
            );
        }
        Command::Export { path } => {
            backup::export_database(ledger.database(), &path)
                .map_err(|e| eyre::eyre!("내보내기 실패: {}", e))?;
            println!(
                "내보내기 완료: {}건 -> {}",
                ledger.database().len(),
                path.to_string_lossy()
            );
        }
        Command::LoadDump { path } => {
            let loaded = backup::load_local_storage_dump(store.as_ref(), &path)
                .await
                .map_err(|e| eyre::eyre!("덤프 로드 실패: {}", e))?;
            info!("{}개의 키를 저장소에 넣었습니다. 다시 복구합니다...", loaded);

            ledger = Ledger::open(store.clone(), &config.master_key)
                .await
                .map_err(|e| eyre::eyre!("장부 복구 실패: {}", e))?;
            print_status(&ledger);
        }
        Command::Clear { yes } => {
            let cleared = ledger
                .clear(&|message: &str| confirm_clear(yes, message))
                .await
                .map_err(|e| eyre::eyre!("삭제 실패: {}", e))?;

            if cleared {
                println!("모든 기록이 삭제되었습니다.");
            } else {
                println!("취소되었습니다.");
            }
        }
    }

    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn add_entry(ledger: &mut Ledger, entry: NewEntry) -> eyre::Result<()> {
    let kind = entry.kind();
    let id = ledger
        .add(entry)
        .await
        .map_err(|e| eyre::eyre!("기록 추가 실패: {}", e))?;
    println!("추가됨: {} {}", kind, id);
    Ok(())
}

/// `--yes`가 있으면 묻지 않고 진행
fn confirm_clear(yes: bool, message: &str) -> bool {
    yes || prompt_yes_no(message)
}

/// 표준 입력으로 y/N 확인
fn prompt_yes_no(message: &str) -> bool {
    read_yes_no(&mut io::stdin().lock(), &mut io::stdout(), message)
}

fn read_yes_no(input: &mut impl BufRead, output: &mut impl Write, message: &str) -> bool {
    if write!(output, "{} 계속하시겠습니까? [y/N] ", message).is_err() || output.flush().is_err()
    {
        return false;
    }

    let mut answer = String::new();
    if input.read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn print_status(ledger: &Ledger) {
    let db = ledger.database();
    let report = ledger.recovery_report();

    println!("=== 저장 상태 ===");
    println!("마스터 키: {}", ledger.snapshot().key());
    println!("UT 기록:   {}", db.count(EntryKind::Ut));
    println!("채권 기록: {}", db.count(EntryKind::Bond));
    println!("기타 수입: {}", db.count(EntryKind::Generic));
    println!();
    println!("=== 시작 시 복구 ===");
    println!(
        "키 {}개 확인 (병합 {}, 건너뜀 {}, 파싱 실패 {}, 객체 아님 {}, 읽기 실패 {})",
        report.keys_scanned,
        report.keys_merged,
        report.keys_filtered,
        report.keys_unparsable,
        report.keys_not_object,
        report.keys_unreadable
    );
    println!(
        "기록 {}건 복구, 중복 {}건 제외, 형식 오류 {}건 제외",
        report.records_recovered, report.duplicates_dropped, report.records_rejected
    );
}

fn write_entries(
    out: &mut impl Write,
    db: &Database,
    kind: Option<EntryKind>,
    limit: usize,
) -> io::Result<()> {
    let show = |k: EntryKind| kind.map_or(true, |selected| selected == k);

    if show(EntryKind::Ut) {
        writeln!(out, "=== UT ({}건) ===", db.ut_entries.len())?;
        for e in db.ut_entries.iter().take(limit) {
            let r = &e.record;
            writeln!(
                out,
                "{}  {}  {:<4}  {:<7}  {:<12}  revenue={:.2}  count={}",
                e.id, r.date, r.advisor, r.branch, r.salesperson, r.revenue, r.count
            )?;
        }
    }

    if show(EntryKind::Bond) {
        writeln!(out, "=== 채권 ({}건) ===", db.bond_entries.len())?;
        for e in db.bond_entries.iter().take(limit) {
            let r = &e.record;
            let rate = r
                .commission_rate
                .map(|rate| format!("{}%", rate))
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                out,
                "{}  {}  {:<4}  {:<7}  {:<12}  {}  {} {:.2}  revenue={:.2}  customer={}  rate={}{}",
                e.id,
                r.date,
                r.advisor,
                r.branch,
                r.salesperson,
                r.product,
                r.currency,
                r.deal_amount,
                r.revenue,
                r.customer,
                rate,
                if r.is_eli == Some(true) { "  [ELI]" } else { "" }
            )?;
        }
    }

    if show(EntryKind::Generic) {
        writeln!(out, "=== 기타 수입 ({}건) ===", db.generic_entries.len())?;
        for e in db.generic_entries.iter().take(limit) {
            let r = &e.record;
            writeln!(
                out,
                "{}  {}  {}  {:<4}  {:<7}  {:<12}  revenue={:.2}  deal={}",
                e.id,
                r.date,
                r.income_type,
                r.advisor,
                r.branch,
                r.salesperson,
                r.revenue,
                r.deal_amount.as_deref().unwrap_or("-")
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use interface::Stored;
    use ledger::storage::MASTER_KEY;
    use ledger::{InMemoryKeyValueStore, CLEAR_WARNING};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 13).unwrap()
    }

    fn sample_database() -> Database {
        let mut db = Database::new();
        for (id, revenue) in [("u2", 200.0), ("u1", 100.0)] {
            db.ut_entries.push(Stored::new(
                id,
                UtSale {
                    date: date(),
                    advisor: Advisor::Nick,
                    branch: Branch::KtvSkb,
                    salesperson: "Alice".to_string(),
                    revenue,
                    count: 3.0,
                },
            ));
        }
        db.bond_entries.push(Stored::new(
            "b1",
            BondSale {
                date: date(),
                advisor: Advisor::Joey,
                branch: Branch::HSV,
                salesperson: "Bob".to_string(),
                product: "HK Gov 2030".to_string(),
                deal_amount: 500_000.0,
                currency: "HKD".to_string(),
                revenue: 2500.0,
                customer: "Chan".to_string(),
                commission_rate: Some(0.5),
                is_eli: Some(true),
            },
        ));
        db
    }

    fn render(db: &Database, kind: Option<EntryKind>, limit: usize) -> String {
        let mut out = Vec::new();
        write_entries(&mut out, db, kind, limit).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_read_yes_no_answers() {
        for (answer, expected) in [
            ("y\n", true),
            ("YES\n", true),
            ("  yes  \n", true),
            ("n\n", false),
            ("\n", false),
            ("", false),
            ("yep\n", false),
        ] {
            let mut output = Vec::new();
            let confirmed = read_yes_no(&mut answer.as_bytes(), &mut output, CLEAR_WARNING);
            assert_eq!(confirmed, expected, "answer {:?}", answer);

            let prompt = String::from_utf8(output).unwrap();
            assert!(prompt.starts_with(CLEAR_WARNING));
            assert!(prompt.ends_with("[y/N] "));
        }
    }

    #[test]
    fn test_write_entries_filters_and_limits() {
        let db = sample_database();

        let all = render(&db, None, 20);
        assert!(all.contains("=== UT (2건) ==="));
        assert!(all.contains("=== 채권 (1건) ==="));
        assert!(all.contains("=== 기타 수입 (0건) ==="));
        assert!(all.contains("KTV+SKB"));
        assert!(all.contains("HKD 500000.00"));
        assert!(all.contains("rate=0.5%  [ELI]"));

        let first_ut = render(&db, Some(EntryKind::Ut), 1);
        assert!(first_ut.contains("u2"));
        assert!(!first_ut.contains("u1"));
        assert!(first_ut.contains("revenue=200.00"));
        assert!(!first_ut.contains("채권"));
    }

    #[tokio::test]
    async fn test_clear_with_yes_flag_and_declined_prompt() {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let mut ledger = Ledger::open(store, MASTER_KEY).await.unwrap();
        ledger.import(sample_database()).await.unwrap();

        let declined = ledger.clear(&|_: &str| false).await.unwrap();
        assert!(!declined);
        assert_eq!(ledger.database().len(), 3);

        let cleared = ledger
            .clear(&|message: &str| confirm_clear(true, message))
            .await
            .unwrap();
        assert!(cleared);
        assert!(ledger.database().is_empty());
    }
}
