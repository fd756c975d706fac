//! 이벤트 전송 포트.
//!
//! 구현: `clerk-telemetry-network` crate (reqwest)

use async_trait::async_trait;

use crate::error::TelemetryError;
use crate::models::event::TelemetryBatch;

/// 수집 엔드포인트로 배치를 전송
#[async_trait]
pub trait EventTransport: Send + Sync {
    /// 배치 한 건 전송. 재시도하지 않는다.
    async fn send_batch(&self, batch: &TelemetryBatch) -> Result<(), TelemetryError>;
}
