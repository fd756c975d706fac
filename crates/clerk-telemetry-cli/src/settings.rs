//! 설정 로드.
//!
//! 기본값 → 설정 파일(TOML/JSON) → `CLERK_TELEMETRY_*` 환경 변수 순으로
//! 덮어쓴다. 중첩 키는 `__`로 구분한다 (예: `CLERK_TELEMETRY_THROTTLE__TTL_MS`).

use anyhow::{Context, Result};
use clerk_telemetry_core::config::TelemetryConfig;
use config::{Config, Environment, File};
use std::path::Path;

/// 환경 변수 접두사
pub const ENV_PREFIX: &str = "CLERK_TELEMETRY";

/// 프로세스 환경 변수 소스
pub fn process_environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// 설정 로드 및 검증
pub fn load_settings(path: Option<&Path>, env: Environment) -> Result<TelemetryConfig> {
    let defaults = Config::try_from(&TelemetryConfig::default())
        .context("기본 설정 직렬화 실패")?;

    let mut builder = Config::builder().add_source(defaults);
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }

    let config: TelemetryConfig = builder
        .add_source(env)
        .build()
        .context("설정 로드 실패")?
        .try_deserialize()
        .context("설정 형식 오류")?;

    config.validate()?;
    Ok(config)
}
