//! 수집기 설정 구조체.
//!
//! 수집 엔드포인트, 샘플링, 버퍼 크기, 쓰로틀 캐시, 플러시 스케줄링 등
//! 런타임 설정을 정의한다. CLI는 `config` crate로 파일/환경변수에서 로드한다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::TelemetryError;

/// 기본 수집 엔드포인트
pub const DEFAULT_ENDPOINT: &str = "https://clerk-telemetry.com";

/// 쓰로틀 캐시 기본 TTL (24시간)
pub const DEFAULT_THROTTLE_TTL_MS: u64 = 86_400_000;

/// 쓰로틀 캐시가 저장되는 고정 키
pub const DEFAULT_THROTTLE_STORAGE_KEY: &str = "clerk_telemetry_throttler";

/// 수집기 설정
#[derive(Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// 기록 강제 비활성화
    #[serde(default)]
    pub disabled: bool,
    /// 디버그 모드: 로그만 남기고 전송하지 않음
    #[serde(default)]
    pub debug: bool,
    /// 전역 샘플링 비율 (0..=1)
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: f64,
    /// 이벤트별 샘플링 비율 허용 여부
    #[serde(default = "default_true")]
    pub per_event_sampling: bool,
    /// 즉시 플러시를 유발하는 버퍼 크기
    #[serde(default = "default_max_buffer_size")]
    pub max_buffer_size: usize,
    /// 수집 서비스 기본 URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// 전송 요청 타임아웃 (밀리초)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub publishable_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub clerk_version: Option<String>,
    #[serde(default)]
    pub sdk: Option<String>,
    #[serde(default)]
    pub sdk_version: Option<String>,
    /// 실행 컨텍스트 (자동 감지 / 서버 / 이벤트 루프)
    #[serde(default)]
    pub execution_context: ExecutionContextKind,
    /// 지연 플러시 방식
    #[serde(default)]
    pub defer_mode: DeferMode,
    /// 쓰로틀 캐시 설정
    #[serde(default)]
    pub throttle: ThrottleConfig,
}

fn default_sampling_rate() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_max_buffer_size() -> usize {
    5
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            debug: false,
            sampling_rate: default_sampling_rate(),
            per_event_sampling: true,
            max_buffer_size: default_max_buffer_size(),
            endpoint: default_endpoint(),
            request_timeout_ms: default_request_timeout_ms(),
            publishable_key: None,
            secret_key: None,
            clerk_version: None,
            sdk: None,
            sdk_version: None,
            execution_context: ExecutionContextKind::default(),
            defer_mode: DeferMode::default(),
            throttle: ThrottleConfig::default(),
        }
    }
}

impl fmt::Debug for TelemetryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetryConfig")
            .field("disabled", &self.disabled)
            .field("debug", &self.debug)
            .field("sampling_rate", &self.sampling_rate)
            .field("per_event_sampling", &self.per_event_sampling)
            .field("max_buffer_size", &self.max_buffer_size)
            .field("endpoint", &self.endpoint)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("publishable_key", &self.publishable_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[redacted]"))
            .field("clerk_version", &self.clerk_version)
            .field("sdk", &self.sdk)
            .field("sdk_version", &self.sdk_version)
            .field("execution_context", &self.execution_context)
            .field("defer_mode", &self.defer_mode)
            .field("throttle", &self.throttle)
            .finish()
    }
}

impl TelemetryConfig {
    /// 전송 타임아웃
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// 설정값 검증
    pub fn validate(&self) -> Result<(), TelemetryError> {
        if !(0.0..=1.0).contains(&self.sampling_rate) {
            return Err(validation(
                "sampling_rate",
                format!("0..=1 범위여야 합니다: {}", self.sampling_rate),
            ));
        }

        if self.max_buffer_size == 0 {
            return Err(validation("max_buffer_size", "1 이상이어야 합니다"));
        }

        match url::Url::parse(&self.endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(validation(
                    "endpoint",
                    format!("지원하지 않는 스킴: {}", url.scheme()),
                ))
            }
            Err(e) => return Err(validation("endpoint", format!("잘못된 URL: {e}"))),
        }

        self.throttle.validate()
    }
}

fn validation(field: &str, message: impl Into<String>) -> TelemetryError {
    TelemetryError::Validation {
        field: field.to_string(),
        message: message.into(),
    }
}

// ============================================================
// 실행 컨텍스트 / 플러시 스케줄링
// ============================================================

/// 실행 컨텍스트 종류
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionContextKind {
    /// 생성 시점에 tokio 런타임이 있으면 이벤트 루프, 없으면 서버
    #[default]
    Auto,
    /// 이후 실행이 보장되지 않는 요청 단위 컨텍스트: 매 이벤트 즉시 플러시
    Server,
    /// 장수명 이벤트 루프: 배치 후 지연 플러시
    EventLoop,
}

/// 지연 플러시 방식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeferMode {
    /// 다음 유휴 시점 (현재 준비된 태스크가 모두 실행된 뒤)
    #[default]
    Idle,
    /// 0ms 타이머
    Timer,
}

// ============================================================
// 쓰로틀 설정
// ============================================================

/// 만료 항목을 발견했을 때의 처리 정책
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// 만료 항목을 삭제하되 이번 호출은 쓰로틀로 판정 (다음 호출부터 통과)
    #[default]
    SuppressOnce,
    /// 만료 항목을 갱신하고 이번 호출을 바로 통과
    AllowImmediately,
}

/// 쓰로틀 캐시 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// 캐시 항목 TTL (밀리초)
    #[serde(default = "default_throttle_ttl_ms")]
    pub ttl_ms: u64,
    /// 캐시가 저장되는 저장소 키
    #[serde(default = "default_throttle_storage_key")]
    pub storage_key: String,
    /// 만료 처리 정책
    #[serde(default)]
    pub eviction: EvictionPolicy,
}

fn default_throttle_ttl_ms() -> u64 {
    DEFAULT_THROTTLE_TTL_MS
}

fn default_throttle_storage_key() -> String {
    DEFAULT_THROTTLE_STORAGE_KEY.to_string()
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_throttle_ttl_ms(),
            storage_key: default_throttle_storage_key(),
            eviction: EvictionPolicy::default(),
        }
    }
}

impl ThrottleConfig {
    fn validate(&self) -> Result<(), TelemetryError> {
        if self.ttl_ms == 0 {
            return Err(validation("throttle.ttl_ms", "1 이상이어야 합니다"));
        }
        if self.ttl_ms > i64::MAX as u64 {
            return Err(validation("throttle.ttl_ms", "값이 너무 큽니다"));
        }
        if self.storage_key.trim().is_empty() {
            return Err(validation("throttle.storage_key", "비어 있을 수 없습니다"));
        }
        Ok(())
    }
}
