//! Publishable key 파서.
//!
//! 형식: `pk_test_<base64(frontendApi + "$")>` 또는 `pk_live_<...>`.
//! `pk_live_` 접두사는 production, `pk_test_`는 development 인스턴스다.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine as _;
use tracing::debug;

use crate::models::event::InstanceType;
use crate::ports::key_parser::{PublishableKey, PublishableKeyParser};

/// production 키 접두사
pub const PUBLISHABLE_KEY_LIVE_PREFIX: &str = "pk_live_";
/// development 키 접두사
pub const PUBLISHABLE_KEY_TEST_PREFIX: &str = "pk_test_";

/// 표준 publishable key 파서
#[derive(Debug, Default, Clone, Copy)]
pub struct ClerkKeyParser;

impl PublishableKeyParser for ClerkKeyParser {
    fn parse(&self, key: &str) -> Option<PublishableKey> {
        let parsed = parse_publishable_key(key);
        if parsed.is_none() {
            debug!("publishable key 형식 불일치: 인스턴스 타입 미확인으로 처리");
        }
        parsed
    }
}

/// publishable key 파싱. 접두사/인코딩/종결 문자(`$`)가 맞지 않으면 `None`.
pub fn parse_publishable_key(key: &str) -> Option<PublishableKey> {
    let (instance_type, encoded) = if let Some(rest) = key.strip_prefix(PUBLISHABLE_KEY_LIVE_PREFIX)
    {
        (InstanceType::Production, rest)
    } else if let Some(rest) = key.strip_prefix(PUBLISHABLE_KEY_TEST_PREFIX) {
        (InstanceType::Development, rest)
    } else {
        return None;
    };

    let decoded = STANDARD
        .decode(encoded)
        .or_else(|_| STANDARD_NO_PAD.decode(encoded))
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let frontend_api = decoded.strip_suffix('$')?;

    if frontend_api.is_empty() {
        return None;
    }

    Some(PublishableKey {
        instance_type,
        frontend_api: frontend_api.to_string(),
    })
}
