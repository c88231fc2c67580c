//! daver — 우리 팀 데이터 비서 (interactive CLI)
//!
//! Usage:
//!   daver [--config <path>]        Start an interactive session
//!   daver version                  Show version information
//!   daver help                     Show this help message
//!
//! Configuration comes from the YAML file given with --config, overridden by
//! DAVER_* environment variables. The Gemini API key is read from the OS
//! keyring (service "daver") or GEMINI_API_KEY.

use daver::analysis::AnalysisError;
use daver::config::{access_password, AppConfig};
use daver::model::GenerationOptions;
use daver::sheet::{HttpSheetFetcher, SheetSource, SheetStore};
use daver::surface::{
    chart_text, error_line, execution_failure_text, info_line, search_summary, table_text,
    warn_line,
};
use daver::{Assistant, Error, FilterSet, ModelClient, Predicate};
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// The manual filter surface offers at most three simultaneous predicates.
const MAX_FILTERS: usize = 3;

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("help") | Some("--help") | Some("-h") => {
            print_usage();
            return;
        }
        Some("version") | Some("--version") | Some("-V") => {
            println!("daver {}", env!("CARGO_PKG_VERSION"));
            return;
        }
        _ => {}
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&args).await {
        eprintln!("{}", error_line(&e.to_string()));
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"daver — 우리 팀 데이터 비서

USAGE:
    daver [--config <path>]     Start an interactive session
    daver version               Show version information
    daver help                  Show this help message

ENVIRONMENT:
    DAVER_SHEET_URL             Spreadsheet share link (when no config file)
    DAVER_MODEL                 Model name override
    DAVER_TTL_SECS              Cache freshness in seconds
    GEMINI_API_KEY              Model API key (keyring fallback)"#
    );
}

fn resolve_config(args: &[String]) -> Result<AppConfig, Error> {
    for (i, arg) in args.iter().enumerate() {
        if arg == "--config" {
            if let Some(path) = args.get(i + 1) {
                return AppConfig::from_file(path);
            }
        }
    }
    AppConfig::from_env()
}

async fn run(args: &[String]) -> Result<(), Error> {
    let config = resolve_config(args)?;

    println!("DAVER (Data Analyzer & Visualizer for Everyone)");
    println!("우리 팀을 위한 데이터 분석 비서\n");

    if config.require_password && !password_gate()? {
        println!("{}", error_line("비밀번호가 일치하지 않습니다."));
        return Ok(());
    }

    let source = SheetSource::from_share_url(&config.sheet_url)?;
    let store = Arc::new(SheetStore::new(
        source,
        Arc::new(HttpSheetFetcher::new()?),
        config.refresh_ttl(),
        config.timestamp_gid,
    ));
    let client = ModelClient::new(
        &config.model,
        GenerationOptions {
            temperature: config.temperature.or(Some(0.2)),
            max_output_tokens: config.max_output_tokens.or(Some(2048)),
        },
    )?;
    let assistant = Assistant::new(Arc::clone(&store), client, config.sample_rows);

    // Initial load. A failure leaves the session running in a degraded
    // no-data state; commands that need the table will retry the fetch.
    match store.table().await {
        Ok(table) => {
            println!(
                "{}",
                info_line(&format!(
                    "데이터 로드 완료: {}행 x {}열",
                    table.row_count(),
                    table.column_count()
                ))
            );
            println!("컬럼: {}\n", table.columns().join(", "));
        }
        Err(e) => {
            println!(
                "{}",
                error_line(&format!("데이터를 불러오는 데 실패했습니다: {}", e))
            );
        }
    }

    println!("명령어 목록은 'help'를 입력하세요.\n");
    session_loop(&assistant).await
}

fn password_gate() -> Result<bool, Error> {
    let Some(expected) = access_password() else {
        return Err(Error::credential_with_context(
            "require_password is set but no access password is stored",
            daver::ErrorContext::new()
                .with_details("store one in the keyring (service 'daver') or DAVER_ACCESS_PASSWORD")
                .with_source("password_gate"),
        ));
    };
    print!("비밀번호: ");
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']) == expected)
}

async fn session_loop(assistant: &Assistant) -> Result<(), Error> {
    let mut filters = FilterSet::new();
    let stdin = std::io::stdin();

    loop {
        print!("daver> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };

        let result = match command {
            "quit" | "exit" => break,
            "help" => {
                print_session_help();
                Ok(())
            }
            "columns" => cmd_columns(assistant).await,
            "values" => cmd_values(assistant, rest).await,
            "filter" => cmd_filter(assistant, &mut filters, rest).await,
            "filters" => {
                print_filters(&filters);
                Ok(())
            }
            "clear" => {
                filters.clear();
                println!("{}", info_line("필터를 모두 지웠습니다."));
                Ok(())
            }
            "show" => cmd_show(assistant, &filters).await,
            "ask" => cmd_ask(assistant, &filters, rest).await,
            "reload" => {
                assistant.store().invalidate();
                cmd_columns(assistant).await
            }
            "status" => cmd_status(assistant).await,
            other => {
                println!("{}", warn_line(&format!("알 수 없는 명령어: {}", other)));
                Ok(())
            }
        };

        if let Err(e) = result {
            if e.halts_session() {
                return Err(e);
            }
            report(&e);
        }
    }
    Ok(())
}

fn print_session_help() {
    println!(
        r#"COMMANDS:
    columns                  컬럼 목록 보기
    values <컬럼>            해당 컬럼의 고유 값 보기
    filter <컬럼>=<값>       필터 추가 (최대 {MAX_FILTERS}개, 값에 '~'를 붙이면 부분일치)
    filters                  현재 필터 보기
    clear                    필터 초기화
    show                     필터 결과 보기
    ask <질문>               AI에게 질문하기
    reload                   데이터 새로고침
    status                   캐시/업데이트 상태 보기
    quit                     종료"#
    );
}

fn print_filters(filters: &FilterSet) {
    if filters.is_empty() {
        println!("{}", info_line("설정된 필터가 없습니다."));
        return;
    }
    for p in filters.predicates() {
        println!("  {} = {}", p.column, p.value);
    }
}

fn report(e: &Error) {
    match e {
        Error::Analysis(AnalysisError::Execution {
            message, payload, ..
        }) => {
            print!("{}", execution_failure_text(message, payload));
        }
        Error::Analysis(inner) => {
            print!("{}", execution_failure_text(&inner.to_string(), inner.payload()));
        }
        Error::Sheet(inner) => {
            println!(
                "{}",
                error_line(&format!("데이터를 불러오는 데 실패했습니다: {}", inner))
            );
        }
        other => {
            println!("{}", error_line(&other.to_string()));
        }
    }
}

async fn cmd_columns(assistant: &Assistant) -> Result<(), Error> {
    let table = assistant.store().table().await?;
    println!(
        "{}",
        info_line(&format!(
            "{}행 x {}열",
            table.row_count(),
            table.column_count()
        ))
    );
    println!("컬럼: {}", table.columns().join(", "));
    Ok(())
}

async fn cmd_values(assistant: &Assistant, column: &str) -> Result<(), Error> {
    if column.is_empty() {
        println!("{}", warn_line("사용법: values <컬럼>"));
        return Ok(());
    }
    let table = assistant.store().table().await?;
    let values = table.unique_values(column);
    if values.is_empty() {
        println!(
            "{}",
            warn_line(&format!("'{}' 컬럼을 찾을 수 없습니다.", column))
        );
        return Ok(());
    }
    for v in values {
        println!("  {}", v);
    }
    Ok(())
}

async fn cmd_filter(
    assistant: &Assistant,
    filters: &mut FilterSet,
    spec: &str,
) -> Result<(), Error> {
    let Some((column, value)) = spec.split_once('=') else {
        println!("{}", warn_line("사용법: filter <컬럼>=<값>"));
        return Ok(());
    };
    if filters.len() >= MAX_FILTERS {
        println!(
            "{}",
            warn_line(&format!("필터는 최대 {}개까지 설정할 수 있습니다.", MAX_FILTERS))
        );
        return Ok(());
    }
    let column = column.trim();
    let value = value.trim();
    let predicate = match value.strip_prefix('~') {
        Some(sub) => Predicate::contains(column, sub.trim()),
        None => Predicate::equals(column, value),
    };

    // Warn (but allow) when the column is unknown; the stage treats it as
    // "no constraint".
    let table = assistant.store().table().await?;
    if table.column_index(column).is_none() {
        println!(
            "{}",
            warn_line(&format!(
                "'{}' 컬럼이 테이블에 없어 이 필터는 무시됩니다.",
                column
            ))
        );
    }

    filters.push(predicate);
    print_filters(filters);
    Ok(())
}

async fn cmd_show(assistant: &Assistant, filters: &FilterSet) -> Result<(), Error> {
    let outcome = assistant.search(filters).await?;
    println!("{}", search_summary(filters, outcome.filtered.row_count()));
    print!("{}", table_text(&outcome.filtered));
    Ok(())
}

async fn cmd_ask(assistant: &Assistant, filters: &FilterSet, question: &str) -> Result<(), Error> {
    if question.is_empty() {
        println!("{}", warn_line("사용법: ask <질문>"));
        return Ok(());
    }
    println!("{}", info_line("모델에 질문하는 중입니다…"));
    let outcome = assistant.ask(filters, question).await?;

    if let Some(rationale) = &outcome.rationale {
        println!("{}\n", rationale);
    }
    print!("{}", table_text(&outcome.analysis.table));
    if let Some(chart) = &outcome.analysis.chart {
        print!("{}", chart_text(chart));
    }
    Ok(())
}

async fn cmd_status(assistant: &Assistant) -> Result<(), Error> {
    let status = assistant.store().status();
    if !status.loaded {
        println!("{}", warn_line("아직 데이터가 로드되지 않았습니다."));
    } else {
        let age = status.age.map(|a| a.as_secs()).unwrap_or(0);
        let freshness = if status.fresh { "최신" } else { "만료" };
        println!(
            "{}",
            info_line(&format!(
                "캐시 상태: {} ({}초 경과, 리비전 {})",
                freshness, age, status.revision
            ))
        );
    }
    match assistant.store().last_updated().await {
        Ok(Some(ts)) => {
            println!("{}", info_line(&format!("시트 최종 업데이트: {}", ts.raw)));
        }
        Ok(None) => {}
        Err(e) => {
            println!(
                "{}",
                warn_line(&format!("업데이트 시각을 읽지 못했습니다: {}", e))
            );
        }
    }
    Ok(())
}
