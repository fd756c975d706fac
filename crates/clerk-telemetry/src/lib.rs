//! # clerk-telemetry
//!
//! 텔레메트리 수집기.
//! 원시 이벤트를 런타임 메타데이터로 보강하고, 샘플링과 중복 억제를 거쳐
//! 버퍼에 모은 뒤 수집 엔드포인트로 배치 전송한다.
//! 전송은 best-effort이며 어떤 실패도 호스트 애플리케이션으로 전파되지 않는다.
//!
//! ## 구조
//!
//! - [`collector`]: 공개 진입점 (`TelemetryCollector`)
//! - [`throttler`]: 영속 TTL 캐시 기반 중복 이벤트 억제
//! - [`sampling`]: 전역/이벤트별 샘플링 정책
//! - [`scheduler`]: 실행 컨텍스트별 플러시 스케줄링
//! - [`debug_log`]: 디버그 모드 출력 (tracing)
//! - [`sdk_registry`]: 런타임 SDK 자체 등록
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use clerk_telemetry::TelemetryCollector;
//! use clerk_telemetry_core::models::event::TelemetryEventRaw;
//!
//! let collector = TelemetryCollector::builder(config).build()?;
//! collector.record(TelemetryEventRaw::new("COMPONENT_MOUNTED").with_field("component", "SignIn"));
//! collector.close().await;
//! ```

pub mod collector;
pub mod debug_log;
pub mod sampling;
pub mod scheduler;
pub mod sdk_registry;
pub mod throttler;

pub use collector::{RecordOutcome, TelemetryCollector, TelemetryCollectorBuilder};
pub use sdk_registry::SdkRegistry;
pub use throttler::EventThrottler;
