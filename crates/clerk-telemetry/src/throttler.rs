//! 이벤트 쓰로틀러.
//!
//! 구조적으로 동일한 이벤트가 TTL(기본 24시간) 안에 이미 기록되었는지 판정한다.
//! 캐시는 영속 키-값 저장소의 고정 키 하나에 JSON 맵(정규 키 → epoch ms)으로
//! 저장되며, 서버 협조 없이 프로세스 재시작 후에도 유지된다.
//!
//! 저장소가 없거나 쓰기가 불가능하면 항상 "쓰로틀 안 함"으로 동작한다.

use clerk_telemetry_core::config::{EvictionPolicy, ThrottleConfig};
use clerk_telemetry_core::error::StorageError;
use clerk_telemetry_core::models::event::TelemetryEvent;
use clerk_telemetry_core::ports::clock::Clock;
use clerk_telemetry_core::ports::key_value_store::KeyValueStore;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// 쓰기 가능 여부 확인용 키
const PROBE_KEY: &str = "clerk_telemetry_probe";

/// 쓰로틀 캐시: 정규 이벤트 키 → 마지막 발생 시각 (epoch ms)
pub type ThrottleCache = BTreeMap<String, i64>;

/// 영속 캐시 기반 이벤트 쓰로틀러
pub struct EventThrottler {
    store: Option<Arc<dyn KeyValueStore>>,
    clock: Arc<dyn Clock>,
    storage_key: String,
    ttl_ms: i64,
    eviction: EvictionPolicy,
    /// 용량 초과 이후 이번 세션 동안 쓰로틀링 중단
    quota_exhausted: AtomicBool,
}

impl EventThrottler {
    /// 새 쓰로틀러 생성. `store`가 `None`이면 쓰로틀링 불가.
    pub fn new(
        store: Option<Arc<dyn KeyValueStore>>,
        clock: Arc<dyn Clock>,
        config: &ThrottleConfig,
    ) -> Self {
        Self {
            store,
            clock,
            storage_key: config.storage_key.clone(),
            ttl_ms: i64::try_from(config.ttl_ms).unwrap_or(i64::MAX),
            eviction: config.eviction,
            quota_exhausted: AtomicBool::new(false),
        }
    }

    /// 최근에 같은 이벤트가 기록되었으면 `true`
    ///
    /// 처음 보는 이벤트는 캐시에 등록하고 `false`.
    /// TTL이 지난 항목은 삭제하지만, 기본 정책(`SuppressOnce`)에서는 이번
    /// 호출까지 쓰로틀로 판정하고 다음 호출에서 재등록된다.
    pub fn is_event_throttled(&self, event: &TelemetryEvent) -> bool {
        let Some(store) = self.available_store() else {
            return false;
        };

        let now = self.clock.now_millis();
        let key = canonical_key(event);
        let mut cache = self.read_cache(store);

        let Some(&seen_at) = cache.get(&key) else {
            cache.insert(key, now);
            self.write_cache(store, &cache);
            return false;
        };

        if now.saturating_sub(seen_at) <= self.ttl_ms {
            return true;
        }

        match self.eviction {
            EvictionPolicy::SuppressOnce => {
                cache.remove(&key);
                self.write_cache(store, &cache);
                debug!("만료된 쓰로틀 항목 삭제 (이번 호출은 억제): {}", event.event());
                true
            }
            EvictionPolicy::AllowImmediately => {
                cache.insert(key, now);
                self.write_cache(store, &cache);
                debug!("만료된 쓰로틀 항목 갱신: {}", event.event());
                false
            }
        }
    }

    /// 현재 캐시 스냅샷. 저장소가 없으면 빈 캐시.
    pub fn entries(&self) -> ThrottleCache {
        self.store
            .as_deref()
            .map(|store| self.read_cache(store))
            .unwrap_or_default()
    }

    /// 캐시 전체 삭제
    pub fn clear(&self) -> Result<(), StorageError> {
        match self.store.as_deref() {
            Some(store) => store.remove(&self.storage_key),
            None => Ok(()),
        }
    }

    /// 쓰기/삭제 프로브로 저장소 사용 가능 여부 확인
    fn available_store(&self) -> Option<&dyn KeyValueStore> {
        if self.quota_exhausted.load(Ordering::Relaxed) {
            return None;
        }

        let store = self.store.as_deref()?;
        let probe = store
            .set(PROBE_KEY, PROBE_KEY)
            .and_then(|()| store.remove(PROBE_KEY));

        match probe {
            Ok(()) => Some(store),
            Err(e) if e.is_quota_exceeded() => {
                self.quota_exhausted.store(true, Ordering::Relaxed);
                if store.len().is_ok_and(|n| n > 0) {
                    if let Err(e) = store.remove(&self.storage_key) {
                        debug!("쓰로틀 캐시 삭제 실패: {e}");
                    }
                }
                warn!("저장소 용량 초과: 쓰로틀 캐시를 비우고 이번 세션 동안 쓰로틀링 중단");
                None
            }
            Err(e) => {
                debug!("쓰로틀 저장소 사용 불가: {e}");
                None
            }
        }
    }

    /// 캐시 읽기. 없거나 손상된 값은 빈 캐시로 취급.
    fn read_cache(&self, store: &dyn KeyValueStore) -> ThrottleCache {
        match store.get(&self.storage_key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                debug!("쓰로틀 캐시 파싱 실패, 빈 캐시로 취급: {e}");
                ThrottleCache::new()
            }),
            Ok(None) => ThrottleCache::new(),
            Err(e) => {
                debug!("쓰로틀 캐시 읽기 실패: {e}");
                ThrottleCache::new()
            }
        }
    }

    fn write_cache(&self, store: &dyn KeyValueStore, cache: &ThrottleCache) {
        let result = serde_json::to_string(cache)
            .map_err(|e| StorageError::Backend(e.to_string()))
            .and_then(|raw| store.set(&self.storage_key, &raw));

        if let Err(e) = result {
            debug!("쓰로틀 캐시 쓰기 실패 (무시): {e}");
        }
    }
}

/// 이벤트의 정규 키
///
/// `sk`, `pk`를 제외한 최상위 필드와 페이로드 필드를 하나의 평면 객체로
/// 합치고(최상위 필드 우선), 키를 정렬한 순서대로 값 목록을 JSON 배열로
/// 직렬화한다. 페이로드 키 순서와 무관하게 같은 키가 나온다.
pub fn canonical_key(event: &TelemetryEvent) -> String {
    let mut merged: BTreeMap<String, serde_json::Value> = event
        .payload()
        .iter()
        .map(|(key, value)| (key.clone(), value.to_json()))
        .collect();

    for (name, value) in event.identity_fields() {
        merged.insert(name.to_string(), value);
    }

    serde_json::Value::Array(merged.into_values().collect()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clerk_telemetry_core::models::event::{
        EventContext, InstanceType, PayloadValue, TelemetryEventRaw,
    };
    use clerk_telemetry_core::ports::clock::ManualClock;
    use clerk_telemetry_storage::MemoryStore;

    const TTL: i64 = 86_400_000;
    const T0: i64 = 1_700_000_000_000;

    fn context(secret: Option<&str>) -> EventContext {
        EventContext::new(
            Some("5.0.0"),
            Some(InstanceType::Development),
            Some("pk_test_Y2xlcmsuZXhhbXBsZS5jb20k"),
            secret,
        )
    }

    fn event(raw: TelemetryEventRaw) -> TelemetryEvent {
        TelemetryEvent::enrich(raw, &context(None), Some("@clerk/nextjs"), Some("5.1.0"))
    }

    fn throttler_with(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<ManualClock>,
        eviction: EvictionPolicy,
    ) -> EventThrottler {
        let config = ThrottleConfig {
            eviction,
            ..ThrottleConfig::default()
        };
        EventThrottler::new(Some(store), clock, &config)
    }

    #[test]
    fn key_ignores_payload_order() {
        let mut forward = TelemetryEventRaw::new("E");
        forward.payload.insert("a".to_string(), PayloadValue::from(1));
        forward.payload.insert("b".to_string(), PayloadValue::from(2));

        let mut backward = TelemetryEventRaw::new("E");
        backward.payload.insert("b".to_string(), PayloadValue::from(2));
        backward.payload.insert("a".to_string(), PayloadValue::from(1));

        assert_eq!(canonical_key(&event(forward)), canonical_key(&event(backward)));
    }

    #[test]
    fn key_lists_values_in_sorted_key_order() {
        let key = canonical_key(&event(
            TelemetryEventRaw::new("E")
                .with_field("zeta", true)
                .with_field("alpha", "x"),
        ));
        // alpha, cv, event, it, sdk, sdkv, zeta
        assert_eq!(
            key,
            r#"["x","5.0.0","E","development","@clerk/nextjs","5.1.0",true]"#
        );
    }

    #[test]
    fn key_excludes_keys_and_prefers_top_level_fields() {
        let with_secret = TelemetryEvent::enrich(
            TelemetryEventRaw::new("E").with_field("event", "shadowed"),
            &context(Some("sk_test_aaaaaaaaaaaaaaaaaaaa")),
            Some("@clerk/nextjs"),
            Some("5.1.0"),
        );
        let without_secret = event(TelemetryEventRaw::new("E"));

        assert_eq!(canonical_key(&with_secret), canonical_key(&without_secret));
        assert!(!canonical_key(&with_secret).contains("sk_test"));
        assert!(!canonical_key(&with_secret).contains("pk_test"));
    }

    #[test]
    fn different_payloads_have_different_keys() {
        let a = event(TelemetryEventRaw::new("E").with_field("component", "SignIn"));
        let b = event(TelemetryEventRaw::new("E").with_field("component", "SignUp"));
        assert_ne!(canonical_key(&a), canonical_key(&b));
    }

    #[test]
    fn first_occurrence_passes_then_repeats_are_throttled() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(T0));
        let throttler = throttler_with(store.clone(), clock.clone(), EvictionPolicy::SuppressOnce);
        let e = event(TelemetryEventRaw::new("E"));

        assert!(!throttler.is_event_throttled(&e));
        assert!(throttler.is_event_throttled(&e));

        clock.advance(TTL);
        // 정확히 TTL 경과 시점은 아직 유효
        assert!(throttler.is_event_throttled(&e));

        let cache = throttler.entries();
        assert_eq!(cache.get(&canonical_key(&e)), Some(&T0));
        // 프로브 키는 남지 않음
        assert_eq!(store.get(PROBE_KEY).unwrap(), None);
    }

    #[test]
    fn expired_entry_is_evicted_and_suppressed_once() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(T0));
        let throttler = throttler_with(store, clock.clone(), EvictionPolicy::SuppressOnce);
        let e = event(TelemetryEventRaw::new("E"));

        assert!(!throttler.is_event_throttled(&e));

        clock.set(T0 + TTL + 1);
        // 만료 감지 호출: 삭제 후에도 억제
        assert!(throttler.is_event_throttled(&e));
        assert!(throttler.entries().is_empty());

        // 다음 호출은 재등록 후 통과
        assert!(!throttler.is_event_throttled(&e));
        assert_eq!(
            throttler.entries().get(&canonical_key(&e)),
            Some(&(T0 + TTL + 1))
        );
    }

    #[test]
    fn expired_entry_passes_immediately_when_configured() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(T0));
        let throttler = throttler_with(store, clock.clone(), EvictionPolicy::AllowImmediately);
        let e = event(TelemetryEventRaw::new("E"));

        assert!(!throttler.is_event_throttled(&e));
        clock.set(T0 + TTL + 1);
        assert!(!throttler.is_event_throttled(&e));
        assert!(throttler.is_event_throttled(&e));
    }

    #[test]
    fn other_entries_survive_eviction() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(T0));
        let throttler = throttler_with(store, clock.clone(), EvictionPolicy::SuppressOnce);
        let old = event(TelemetryEventRaw::new("OLD"));
        let fresh = event(TelemetryEventRaw::new("FRESH"));

        assert!(!throttler.is_event_throttled(&old));
        clock.set(T0 + TTL);
        assert!(!throttler.is_event_throttled(&fresh));
        clock.set(T0 + TTL + 1);
        assert!(throttler.is_event_throttled(&old));

        let cache = throttler.entries();
        assert_eq!(cache.len(), 1);
        assert!(cache.contains_key(&canonical_key(&fresh)));
    }

    #[test]
    fn missing_store_never_throttles() {
        let throttler = EventThrottler::new(
            None,
            Arc::new(ManualClock::new(T0)),
            &ThrottleConfig::default(),
        );
        let e = event(TelemetryEventRaw::new("E"));
        assert!(!throttler.is_event_throttled(&e));
        assert!(!throttler.is_event_throttled(&e));
        assert!(throttler.entries().is_empty());
        assert!(throttler.clear().is_ok());
    }

    #[test]
    fn unwritable_store_never_throttles() {
        let store = Arc::new(MemoryStore::new().rejecting_writes());
        let throttler = throttler_with(store, Arc::new(ManualClock::new(T0)), EvictionPolicy::SuppressOnce);
        let e = event(TelemetryEventRaw::new("E"));
        assert!(!throttler.is_event_throttled(&e));
        assert!(!throttler.is_event_throttled(&e));
    }

    #[test]
    fn quota_exceeded_evicts_own_cache_and_stops_for_session() {
        let clock = Arc::new(ManualClock::new(T0));
        let config = ThrottleConfig::default();
        let store = Arc::new(MemoryStore::new().with_quota(config.storage_key.len() + 40));
        store.set(&config.storage_key, r#"{"[\"stale\"]":1}"#).unwrap();

        let shared: Arc<dyn KeyValueStore> = store.clone();
        let throttler = EventThrottler::new(Some(shared), clock, &config);
        let e = event(TelemetryEventRaw::new("E"));

        assert!(!throttler.is_event_throttled(&e));
        assert_eq!(store.get(&config.storage_key).unwrap(), None);

        // 공간이 생겼어도 이번 세션은 계속 쓰로틀링하지 않음
        assert!(!throttler.is_event_throttled(&e));
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn corrupt_cache_is_treated_as_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set("clerk_telemetry_throttler", "{not json").unwrap();
        let throttler = throttler_with(store, Arc::new(ManualClock::new(T0)), EvictionPolicy::SuppressOnce);
        let e = event(TelemetryEventRaw::new("E"));

        assert!(!throttler.is_event_throttled(&e));
        assert!(throttler.is_event_throttled(&e));
    }

    #[test]
    fn cache_is_shared_through_the_store() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(T0));
        let first = throttler_with(store.clone(), clock.clone(), EvictionPolicy::SuppressOnce);
        let second = throttler_with(store, clock, EvictionPolicy::SuppressOnce);
        let e = event(TelemetryEventRaw::new("E"));

        assert!(!first.is_event_throttled(&e));
        assert!(second.is_event_throttled(&e));

        second.clear().unwrap();
        assert!(!first.is_event_throttled(&e));
    }
}
