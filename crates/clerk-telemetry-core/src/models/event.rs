//! 텔레메트리 이벤트 모델.
//!
//! 호출자가 넘기는 [`TelemetryEventRaw`]와, 런타임 메타데이터로 보강되어
//! 전송 준비가 끝난 [`TelemetryEvent`]를 정의한다.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// `sk` 필드에 남기는 secret key 접두사 길이
pub const SECRET_KEY_PREFIX_LEN: usize = 16;

/// 페이로드 값: 문자열, 숫자, 불리언만 허용
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl PayloadValue {
    /// 유한한 실수만 숫자로 변환 (NaN/무한대는 JSON으로 표현 불가)
    pub fn float(value: f64) -> Option<Self> {
        serde_json::Number::from_f64(value).map(PayloadValue::Number)
    }

    /// JSON 값으로 변환
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            PayloadValue::Bool(b) => serde_json::Value::Bool(*b),
            PayloadValue::Number(n) => serde_json::Value::Number(n.clone()),
            PayloadValue::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl From<bool> for PayloadValue {
    fn from(value: bool) -> Self {
        PayloadValue::Bool(value)
    }
}

impl From<i64> for PayloadValue {
    fn from(value: i64) -> Self {
        PayloadValue::Number(value.into())
    }
}

impl From<u64> for PayloadValue {
    fn from(value: u64) -> Self {
        PayloadValue::Number(value.into())
    }
}

impl From<i32> for PayloadValue {
    fn from(value: i32) -> Self {
        PayloadValue::Number(value.into())
    }
}

impl From<&str> for PayloadValue {
    fn from(value: &str) -> Self {
        PayloadValue::String(value.to_string())
    }
}

impl From<String> for PayloadValue {
    fn from(value: String) -> Self {
        PayloadValue::String(value)
    }
}

/// 이벤트 페이로드: 키 순서는 의미 없음
pub type EventPayload = BTreeMap<String, PayloadValue>;

/// 호출자가 기록하는 원시 이벤트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEventRaw {
    /// 이벤트 이름
    pub event: String,
    /// 이벤트 페이로드
    #[serde(default)]
    pub payload: EventPayload,
    /// 이 이벤트에만 적용되는 샘플링 비율 (0..=1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_sampling_rate: Option<f64>,
}

impl TelemetryEventRaw {
    /// 빈 페이로드로 원시 이벤트 생성
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            payload: EventPayload::new(),
            event_sampling_rate: None,
        }
    }

    /// 페이로드 필드 추가
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<PayloadValue>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// 이벤트별 샘플링 비율 설정
    pub fn with_sampling_rate(mut self, rate: f64) -> Self {
        self.event_sampling_rate = Some(rate);
        self
    }
}

/// 인스턴스 타입: publishable key에서 파생
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceType {
    Development,
    Production,
}

impl InstanceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceType::Development => "development",
            InstanceType::Production => "production",
        }
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 수집기 생성 시점에 고정되는 이벤트 메타데이터
///
/// secret key는 여기서 이미 접두사로 잘려 저장된다.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct EventContext {
    clerk_version: String,
    instance_type: Option<InstanceType>,
    publishable_key: Option<String>,
    secret_key_prefix: Option<String>,
}

impl EventContext {
    pub fn new(
        clerk_version: Option<&str>,
        instance_type: Option<InstanceType>,
        publishable_key: Option<&str>,
        secret_key: Option<&str>,
    ) -> Self {
        Self {
            clerk_version: clerk_version.unwrap_or_default().to_string(),
            instance_type,
            publishable_key: publishable_key
                .filter(|key| !key.is_empty())
                .map(str::to_string),
            secret_key_prefix: secret_key
                .filter(|key| !key.is_empty())
                .map(secret_key_prefix),
        }
    }

    pub fn clerk_version(&self) -> &str {
        &self.clerk_version
    }

    pub fn instance_type(&self) -> Option<InstanceType> {
        self.instance_type
    }

    pub fn publishable_key(&self) -> Option<&str> {
        self.publishable_key.as_deref()
    }
}

impl fmt::Debug for EventContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventContext")
            .field("clerk_version", &self.clerk_version)
            .field("instance_type", &self.instance_type)
            .field("publishable_key", &self.publishable_key)
            .field(
                "secret_key_prefix",
                &self.secret_key_prefix.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// secret key 앞 16자만 남긴다 (문자 단위)
pub fn secret_key_prefix(secret_key: &str) -> String {
    secret_key.chars().take(SECRET_KEY_PREFIX_LEN).collect()
}

/// 보강이 끝난 전송용 이벤트. 생성 후 변경 불가.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    event: String,
    cv: String,
    #[serde(with = "instance_type_field")]
    it: Option<InstanceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sdk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sdkv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sk: Option<String>,
    payload: EventPayload,
}

impl TelemetryEvent {
    /// 원시 이벤트를 수집기 메타데이터와 SDK 정보로 보강
    pub fn enrich(
        raw: TelemetryEventRaw,
        context: &EventContext,
        sdk: Option<&str>,
        sdk_version: Option<&str>,
    ) -> Self {
        Self {
            event: raw.event,
            cv: context.clerk_version.clone(),
            it: context.instance_type,
            sdk: sdk.map(str::to_string),
            sdkv: sdk_version.map(str::to_string),
            pk: context.publishable_key.clone(),
            sk: context.secret_key_prefix.clone(),
            payload: raw.payload,
        }
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn clerk_version(&self) -> &str {
        &self.cv
    }

    pub fn instance_type(&self) -> Option<InstanceType> {
        self.it
    }

    pub fn sdk(&self) -> Option<&str> {
        self.sdk.as_deref()
    }

    pub fn sdk_version(&self) -> Option<&str> {
        self.sdkv.as_deref()
    }

    pub fn publishable_key(&self) -> Option<&str> {
        self.pk.as_deref()
    }

    pub fn secret_key_prefix(&self) -> Option<&str> {
        self.sk.as_deref()
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    /// 식별 필드 (`sk`, `pk`, `payload` 제외): 쓰로틀 키 계산용
    ///
    /// 값이 없는 SDK 필드는 `null`로 남는다.
    pub fn identity_fields(&self) -> [(&'static str, serde_json::Value); 5] {
        let opt = |value: &Option<String>| {
            value
                .as_ref()
                .map_or(serde_json::Value::Null, |v| serde_json::Value::String(v.clone()))
        };
        [
            ("event", serde_json::Value::String(self.event.clone())),
            ("cv", serde_json::Value::String(self.cv.clone())),
            (
                "it",
                serde_json::Value::String(
                    self.it.map(|it| it.as_str()).unwrap_or_default().to_string(),
                ),
            ),
            ("sdk", opt(&self.sdk)),
            ("sdkv", opt(&self.sdkv)),
        ]
    }
}

/// 전송 배치: `{ "events": [...] }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryBatch {
    pub events: Vec<TelemetryEvent>,
}

impl TelemetryBatch {
    pub fn new(events: Vec<TelemetryEvent>) -> Self {
        Self { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// 미확정 인스턴스 타입은 빈 문자열로 직렬화
mod instance_type_field {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<InstanceType>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.map(|it| it.as_str()).unwrap_or_default())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<InstanceType>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.as_str() {
            "development" => Ok(Some(InstanceType::Development)),
            "production" => Ok(Some(InstanceType::Production)),
            _ => Ok(None),
        }
    }
}
