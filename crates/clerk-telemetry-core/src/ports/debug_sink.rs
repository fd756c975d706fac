//! 디버그 출력 포트.
//!
//! 디버그 모드에서 전송 대신 이벤트를 관찰용으로 출력한다.
//! 구현: `clerk-telemetry` crate (`TracingDebugSink`)

use crate::models::event::TelemetryEvent;

/// 디버그 모드 이벤트 출력 채널
pub trait DebugSink: Send + Sync {
    /// 이벤트 하나를 출력. 버퍼/전송에는 영향 없음.
    fn log_event(&self, event: &TelemetryEvent);
}
