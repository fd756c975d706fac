//! 디버그 모드 이벤트 출력.
//!
//! 디버그 모드에서는 이벤트를 전송하지 않고 `tracing`으로만 남긴다.
//! 그룹 출력이 켜져 있으면 이벤트 이름의 span 안에 기록한다.

use clerk_telemetry_core::models::event::TelemetryEvent;
use clerk_telemetry_core::ports::debug_sink::DebugSink;
use tracing::{info, info_span};

/// 디버그 로그 접두사
pub const DEBUG_LOG_PREFIX: &str = "[clerk/telemetry]";

/// `tracing` 기반 디버그 출력
#[derive(Debug, Clone, Copy)]
pub struct TracingDebugSink {
    grouped: bool,
}

impl TracingDebugSink {
    /// 이벤트 이름별 span으로 묶어 출력
    pub fn grouped() -> Self {
        Self { grouped: true }
    }

    /// 한 줄로 출력
    pub fn flat() -> Self {
        Self { grouped: false }
    }
}

impl Default for TracingDebugSink {
    fn default() -> Self {
        Self::grouped()
    }
}

impl DebugSink for TracingDebugSink {
    fn log_event(&self, event: &TelemetryEvent) {
        let body = serde_json::to_string(event).unwrap_or_else(|e| format!("<직렬화 실패: {e}>"));

        if self.grouped {
            let span = info_span!("clerk_telemetry", event = %event.event());
            let _entered = span.enter();
            info!(target: "clerk_telemetry::debug", "{DEBUG_LOG_PREFIX} {body}");
        } else {
            info!(
                target: "clerk_telemetry::debug",
                "{DEBUG_LOG_PREFIX} {}: {body}",
                event.event()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clerk_telemetry_core::models::event::{EventContext, InstanceType, TelemetryEventRaw};
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn capture(sink: TracingDebugSink, event: &TelemetryEvent) -> String {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || sink.log_event(event));

        let bytes = buf.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    fn test_event() -> TelemetryEvent {
        let ctx = EventContext::new(Some("5.0.0"), Some(InstanceType::Development), None, None);
        TelemetryEvent::enrich(
            TelemetryEventRaw::new("TEST_EVENT").with_field("component", "SignIn"),
            &ctx,
            None,
            None,
        )
    }

    #[test]
    fn grouped_output_is_nested_under_event_name() {
        let output = capture(TracingDebugSink::grouped(), &test_event());
        assert!(output.contains("clerk_telemetry{event=TEST_EVENT}"), "{output}");
        assert!(output.contains(DEBUG_LOG_PREFIX));
        assert!(output.contains(r#""component":"SignIn""#));
    }

    #[test]
    fn flat_output_is_a_single_line() {
        let output = capture(TracingDebugSink::flat(), &test_event());
        assert_eq!(output.lines().count(), 1);
        assert!(output.contains("[clerk/telemetry] TEST_EVENT: {"));
        assert!(!output.contains("clerk_telemetry{"));
    }
}
