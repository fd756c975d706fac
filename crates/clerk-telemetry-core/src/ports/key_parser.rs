//! Publishable key 파서 포트.
//!
//! 구현: [`crate::publishable_key::ClerkKeyParser`]

use crate::models::event::InstanceType;

/// 파싱된 publishable key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishableKey {
    /// 인스턴스 타입 (development / production)
    pub instance_type: InstanceType,
    /// Frontend API 호스트
    pub frontend_api: String,
}

/// publishable key 파서
pub trait PublishableKeyParser: Send + Sync {
    /// 키를 파싱. 형식이 맞지 않으면 `None`.
    fn parse(&self, key: &str) -> Option<PublishableKey>;
}
