//! # clerk-telemetry-cli
//!
//! 텔레메트리 수집기 CLI.
//! 설정을 로드해 수집기를 구성하고, 이벤트 기록 또는 쓰로틀 캐시 관리를 수행한다.

mod payload_arg;
mod settings;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clerk_telemetry::TelemetryCollector;
use clerk_telemetry_core::models::event::{PayloadValue, TelemetryEventRaw};
use clerk_telemetry_core::ports::key_value_store::KeyValueStore;
use clerk_telemetry_storage::{JsonFileStore, SqliteStore};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::payload_arg::parse_payload_field;
use crate::settings::{load_settings, process_environment};

/// 텔레메트리 이벤트 기록 및 쓰로틀 캐시 관리
#[derive(Parser, Debug)]
#[command(name = "clerk-telemetry")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 설정 파일 경로 (TOML/JSON)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "warn")]
    log_level: String,

    /// 쓰로틀 캐시 저장 경로 (`.db`/`.sqlite`는 SQLite, 그 외 JSON 파일)
    #[arg(long)]
    store_path: Option<PathBuf>,

    /// 수집 엔드포인트 지정 (설정값 덮어쓰기)
    #[arg(long, short = 'e')]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 이벤트 하나를 기록하고 전송이 끝날 때까지 대기
    Record {
        /// 이벤트 이름
        event: String,

        /// 페이로드 필드 (반복 가능)
        #[arg(long = "payload", short = 'p', value_parser = parse_payload_field)]
        payload: Vec<(String, PayloadValue)>,

        /// 이 이벤트의 샘플링 비율 (0..=1)
        #[arg(long)]
        sampling_rate: Option<f64>,
    },
    /// 쓰로틀 캐시 관리
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// 캐시 항목 출력
    Show,
    /// 캐시 삭제
    Clear,
}

/// 쓰로틀 캐시 경로 결정 (CLI 인자 또는 플랫폼별 기본 경로)
///
/// # 플랫폼별 기본 경로:
/// - macOS: `~/Library/Application Support/com.clerk.telemetry/throttle.json`
/// - Windows: `%APPDATA%\clerk\telemetry\data\throttle.json`
/// - Linux: `~/.local/share/telemetry/throttle.json`
fn resolve_store_path(store_path: Option<PathBuf>) -> PathBuf {
    store_path
        .or_else(|| {
            ProjectDirs::from("com", "clerk", "telemetry")
                .map(|p| p.data_dir().join("throttle.json"))
        })
        .unwrap_or_else(|| PathBuf::from("./clerk-telemetry-throttle.json"))
}

/// 확장자로 저장소 구현 선택
fn open_store(path: &Path) -> Result<Arc<dyn KeyValueStore>> {
    let is_sqlite = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext, "db" | "sqlite"));

    if is_sqlite {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("디렉토리 생성 실패: {}", parent.display()))?;
        }
        let store = SqliteStore::open(path)
            .with_context(|| format!("SQLite 저장소 열기 실패: {}", path.display()))?;
        Ok(Arc::new(store))
    } else {
        let store = JsonFileStore::open(path)
            .with_context(|| format!("파일 저장소 열기 실패: {}", path.display()))?;
        Ok(Arc::new(store))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = format!(
        "clerk_telemetry={},clerk_telemetry_cli={},clerk_telemetry_core={},clerk_telemetry_storage={},clerk_telemetry_network={}",
        args.log_level, args.log_level, args.log_level, args.log_level, args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    let mut config = load_settings(args.config.as_deref(), process_environment())?;
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
        config.validate()?;
    }

    let store_path = resolve_store_path(args.store_path);
    info!("쓰로틀 캐시: {}", store_path.display());
    let store = open_store(&store_path)?;

    let collector = TelemetryCollector::builder(config)
        .store(store)
        .build()
        .context("수집기 생성 실패")?;

    match args.command {
        Command::Record {
            event,
            payload,
            sampling_rate,
        } => {
            let mut raw = TelemetryEventRaw::new(event);
            raw.payload.extend(payload);
            raw.event_sampling_rate = sampling_rate;

            let outcome = collector.record(raw);
            collector.close().await;
            println!("{outcome:?}");
        }
        Command::Cache { action } => match action {
            CacheAction::Show => {
                let entries: serde_json::Map<String, serde_json::Value> = collector
                    .throttler()
                    .entries()
                    .into_iter()
                    .map(|(key, seen_at)| {
                        let seen = chrono::DateTime::from_timestamp_millis(seen_at)
                            .map(|t| t.to_rfc3339())
                            .unwrap_or_else(|| seen_at.to_string());
                        (key, serde_json::Value::String(seen))
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
            }
            CacheAction::Clear => {
                collector
                    .throttler()
                    .clear()
                    .context("쓰로틀 캐시 삭제 실패")?;
                println!("쓰로틀 캐시 삭제 완료");
            }
        },
    }

    Ok(())
}
