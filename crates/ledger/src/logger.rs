use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// 로깅 초기화
/// stderr와 일별 로그 파일(`<log_dir>/ledger.log.YYYY-MM-DD`)에 동시에 기록
/// 반환된 guard는 프로그램이 끝날 때까지 유지해야 로그가 모두 기록됨
pub fn init_tracing(log_dir: &Path) -> Vec<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_appender = tracing_appender::rolling::daily(log_dir, "ledger.log");
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
    // 표준 출력은 list/export 결과용으로 비워둔다
    let (stderr_writer, stderr_guard) = tracing_appender::non_blocking(std::io::stderr());

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(stderr_writer).with_target(false))
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .try_init();

    if let Err(e) = result {
        eprintln!("tracing already initialized: {}", e);
    }

    vec![file_guard, stderr_guard]
}
