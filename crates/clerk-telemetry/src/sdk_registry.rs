//! 런타임 SDK 자체 등록.
//!
//! 수집기보다 늦게 로드되는 SDK가 자신의 이름/버전을 등록하면, 이후
//! 기록되는 이벤트는 설정값 대신 등록값을 사용한다.

use clerk_telemetry_core::models::sdk::SdkMetadata;
use clerk_telemetry_core::ports::sdk_metadata::SdkMetadataProvider;
use parking_lot::RwLock;
use tracing::debug;

/// SDK 메타데이터 등록소
#[derive(Debug, Default)]
pub struct SdkRegistry {
    current: RwLock<Option<SdkMetadata>>,
}

impl SdkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// SDK 등록 (기존 등록값 교체)
    pub fn register(&self, metadata: SdkMetadata) {
        debug!("SDK 등록: {}@{}", metadata.name, metadata.version);
        *self.current.write() = Some(metadata);
    }

    /// 등록 해제
    pub fn clear(&self) {
        *self.current.write() = None;
    }
}

impl SdkMetadataProvider for SdkRegistry {
    fn sdk_metadata(&self) -> Option<SdkMetadata> {
        self.current.read().clone()
    }
}
