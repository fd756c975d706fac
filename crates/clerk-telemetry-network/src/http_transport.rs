//! HTTP 이벤트 전송.
//!
//! `EventTransport` 포트 구현. 재시도 없이 한 번만 전송하며,
//! 결과 처리는 호출자(수집기)가 무시한다.

use async_trait::async_trait;
use clerk_telemetry_core::error::TelemetryError;
use clerk_telemetry_core::models::event::TelemetryBatch;
use clerk_telemetry_core::ports::transport::EventTransport;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// 이벤트 수집 경로 (엔드포인트 기준 절대 경로)
pub const EVENT_PATH: &str = "/v1/event";

/// 응답 본문은 진단용으로 앞부분만 보관
const MAX_ERROR_BODY_LEN: usize = 256;

/// reqwest 기반 `EventTransport` 구현
#[derive(Debug, Clone)]
pub struct HttpEventTransport {
    client: reqwest::Client,
    event_url: Url,
}

impl HttpEventTransport {
    /// 새 전송기 생성
    ///
    /// `endpoint`의 경로는 무시되고 `/v1/event`로 대체된다.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, TelemetryError> {
        let event_url = event_url(endpoint)?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TelemetryError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self { client, event_url })
    }

    /// 이벤트 수집 URL
    pub fn event_url(&self) -> &Url {
        &self.event_url
    }
}

/// 엔드포인트에서 수집 URL 계산
pub fn event_url(endpoint: &str) -> Result<Url, TelemetryError> {
    Url::parse(endpoint)
        .and_then(|base| base.join(EVENT_PATH))
        .map_err(|e| TelemetryError::Config(format!("잘못된 엔드포인트 {endpoint}: {e}")))
}

#[async_trait]
impl EventTransport for HttpEventTransport {
    async fn send_batch(&self, batch: &TelemetryBatch) -> Result<(), TelemetryError> {
        debug!("텔레메트리 배치 전송: {}개 이벤트 → {}", batch.len(), self.event_url);

        let resp = self
            .client
            .post(self.event_url.clone())
            .json(batch)
            .send()
            .await
            .map_err(|e| TelemetryError::Network(format!("배치 전송 요청 실패: {e}")))?;

        let status = resp.status();
        if status.is_success() {
            debug!("텔레메트리 배치 전송 성공 ({status})");
            return Ok(());
        }

        let mut body = resp.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY_LEN {
            let mut cut = MAX_ERROR_BODY_LEN;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }

        Err(TelemetryError::Http {
            status: status.as_u16(),
            body,
        })
    }
}
