//! 텔레메트리 수집기.
//!
//! 원시 이벤트 → 보강 → (디버그 출력 | 활성화 판정 → 샘플링 → 쓰로틀)
//! → 버퍼 → 플러시 스케줄링 → 배치 전송.
//!
//! 전송은 fire-and-forget이다. 실패한 배치는 재시도하지 않으며(at-most-once)
//! 오류는 호스트로 전파되지 않는다.

use crate::debug_log::TracingDebugSink;
use crate::sampling::{RandomSampler, Sampler, SamplingPolicy};
use crate::scheduler::{schedule_deferred, BackgroundRuntime, ExecutionContext, PendingFlush};
use crate::throttler::EventThrottler;
use clerk_telemetry_core::config::TelemetryConfig;
use clerk_telemetry_core::environment::EnvironmentFlags;
use clerk_telemetry_core::error::TelemetryError;
use clerk_telemetry_core::models::event::{
    EventContext, InstanceType, TelemetryBatch, TelemetryEvent, TelemetryEventRaw,
};
use clerk_telemetry_core::ports::clock::{Clock, SystemClock};
use clerk_telemetry_core::ports::debug_sink::DebugSink;
use clerk_telemetry_core::ports::key_parser::PublishableKeyParser;
use clerk_telemetry_core::ports::key_value_store::KeyValueStore;
use clerk_telemetry_core::ports::sdk_metadata::SdkMetadataProvider;
use clerk_telemetry_core::ports::transport::EventTransport;
use clerk_telemetry_core::publishable_key::ClerkKeyParser;
use clerk_telemetry_network::HttpEventTransport;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// `record` 한 번의 처리 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// 디버그 모드: 출력만 하고 버리기
    Logged,
    /// 비활성화 (production 키, 설정/환경 변수, 자동화 드라이버)
    Disabled,
    /// 샘플링에서 제외
    SampledOut,
    /// 최근 동일 이벤트가 있어 억제
    Throttled,
    /// 버퍼에 추가됨
    Buffered,
}

/// 텔레메트리 수집기
///
/// 복제해도 같은 버퍼와 스케줄러를 공유한다.
#[derive(Clone)]
pub struct TelemetryCollector {
    inner: Arc<CollectorInner>,
}

struct CollectorInner {
    context: EventContext,
    sdk: Option<String>,
    sdk_version: Option<String>,
    sdk_provider: Option<Arc<dyn SdkMetadataProvider>>,
    enabled: bool,
    debug: bool,
    sampling: SamplingPolicy,
    sampler: Arc<dyn Sampler>,
    throttler: EventThrottler,
    transport: Arc<dyn EventTransport>,
    debug_sink: Arc<dyn DebugSink>,
    execution: ExecutionContext,
    runtime: Handle,
    /// 호스트 런타임이 없을 때 직접 소유하는 전송용 런타임
    _background: Option<BackgroundRuntime>,
    max_buffer_size: usize,
    state: Mutex<BufferState>,
    deliveries: Mutex<Vec<JoinHandle<()>>>,
}

#[derive(Default)]
struct BufferState {
    events: Vec<TelemetryEvent>,
    pending: Option<PendingFlush>,
}

impl BufferState {
    /// 버퍼 스냅샷을 가져가고 비움. 예약된 플러시는 취소.
    fn take_batch(&mut self) -> Vec<TelemetryEvent> {
        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }
        std::mem::take(&mut self.events)
    }
}

impl TelemetryCollector {
    /// 빌더 생성
    pub fn builder(config: TelemetryConfig) -> TelemetryCollectorBuilder {
        TelemetryCollectorBuilder::new(config)
    }

    /// 이벤트 기록
    ///
    /// 네트워크를 기다리지 않고 즉시 반환한다.
    pub fn record(&self, raw: TelemetryEventRaw) -> RecordOutcome {
        let inner = &self.inner;
        let event_rate = raw.event_sampling_rate;
        let event = inner.enrich(raw);

        if inner.debug {
            inner.debug_sink.log_event(&event);
            return RecordOutcome::Logged;
        }

        if !inner.enabled {
            return RecordOutcome::Disabled;
        }

        if !inner.sampling.admits(inner.sampler.draw(), event_rate) {
            debug!("샘플링 제외: {}", event.event());
            return RecordOutcome::SampledOut;
        }

        if inner.throttler.is_event_throttled(&event) {
            debug!("중복 이벤트 억제: {}", event.event());
            return RecordOutcome::Throttled;
        }

        let ready = {
            let mut state = inner.state.lock();
            state.events.push(event);
            CollectorInner::schedule_flush(inner, &mut state)
        };

        if let Some(events) = ready {
            inner.dispatch(events);
        }

        RecordOutcome::Buffered
    }

    /// 버퍼를 즉시 전송
    pub fn flush(&self) {
        self.inner.flush();
    }

    /// 남은 버퍼를 전송하고 진행 중인 전송이 끝날 때까지 대기
    ///
    /// 전송 실패는 여전히 무시된다.
    pub async fn close(&self) {
        self.inner.flush();

        let deliveries = std::mem::take(&mut *self.inner.deliveries.lock());
        for delivery in deliveries {
            if let Err(e) = delivery.await {
                debug!("텔레메트리 전송 태스크 비정상 종료: {e}");
            }
        }
    }

    /// 동기 호스트용 `close`
    ///
    /// 비동기 컨텍스트 안에서는 블록할 수 없으므로 플러시만 하고 반환한다.
    /// `runtime()`으로 current-thread 런타임을 넘겼다면 `Runtime::block_on(close())`을 쓴다.
    pub fn close_blocking(&self) {
        if Handle::try_current().is_ok() {
            warn!("비동기 컨텍스트에서 close_blocking 호출: close().await를 사용해야 전송 완료를 기다릴 수 있음");
            self.inner.flush();
            return;
        }

        let runtime = self.inner.runtime.clone();
        runtime.block_on(self.close());
    }

    /// 버퍼에 쌓인 이벤트 수
    pub fn buffered_len(&self) -> usize {
        self.inner.state.lock().events.len()
    }

    /// 예약된 지연 플러시가 있는지 여부
    pub fn has_pending_flush(&self) -> bool {
        self.inner
            .state
            .lock()
            .pending
            .as_ref()
            .is_some_and(|pending| !pending.is_finished())
    }

    /// 완료되지 않은 전송 수
    pub fn in_flight_deliveries(&self) -> usize {
        self.inner
            .deliveries
            .lock()
            .iter()
            .filter(|delivery| !delivery.is_finished())
            .count()
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled
    }

    pub fn is_debug(&self) -> bool {
        self.inner.debug
    }

    /// publishable key에서 파싱한 인스턴스 타입
    pub fn instance_type(&self) -> Option<InstanceType> {
        self.inner.context.instance_type()
    }

    pub fn execution_context(&self) -> ExecutionContext {
        self.inner.execution
    }

    /// 내부 쓰로틀러 (캐시 조회/삭제용)
    pub fn throttler(&self) -> &EventThrottler {
        &self.inner.throttler
    }
}

impl CollectorInner {
    fn enrich(&self, raw: TelemetryEventRaw) -> TelemetryEvent {
        match self.sdk_provider.as_ref().and_then(|p| p.sdk_metadata()) {
            Some(sdk) => {
                TelemetryEvent::enrich(raw, &self.context, Some(&sdk.name), Some(&sdk.version))
            }
            None => TelemetryEvent::enrich(
                raw,
                &self.context,
                self.sdk.as_deref(),
                self.sdk_version.as_deref(),
            ),
        }
    }

    /// 이벤트 추가 직후 호출. 즉시 전송할 배치가 있으면 반환.
    fn schedule_flush(
        inner: &Arc<CollectorInner>,
        state: &mut BufferState,
    ) -> Option<Vec<TelemetryEvent>> {
        let mode = match inner.execution {
            ExecutionContext::Server => return Some(state.take_batch()),
            ExecutionContext::EventLoop(mode) => mode,
        };

        if state.events.len() >= inner.max_buffer_size {
            return Some(state.take_batch());
        }

        if state
            .pending
            .as_ref()
            .is_some_and(|pending| !pending.is_finished())
        {
            return None;
        }

        let weak: Weak<CollectorInner> = Arc::downgrade(inner);
        state.pending = Some(schedule_deferred(&inner.runtime, mode, move || {
            if let Some(inner) = weak.upgrade() {
                inner.flush();
            }
        }));
        None
    }

    fn flush(&self) {
        let events = self.state.lock().take_batch();
        self.dispatch(events);
    }

    /// 배치 전송 태스크 생성 (결과 무시)
    fn dispatch(&self, events: Vec<TelemetryEvent>) {
        if events.is_empty() {
            return;
        }

        let batch = TelemetryBatch::new(events);
        let transport = self.transport.clone();
        let delivery = self.runtime.spawn(async move {
            let count = batch.len();
            match transport.send_batch(&batch).await {
                Ok(()) => debug!("텔레메트리 배치 전송 완료: {count}개"),
                Err(e) => debug!("텔레메트리 배치 전송 실패 (무시): {e}"),
            }
        });

        let mut deliveries = self.deliveries.lock();
        deliveries.retain(|delivery| !delivery.is_finished());
        deliveries.push(delivery);
    }
}

/// 수집기 빌더
///
/// 지정하지 않은 포트는 기본 구현을 사용한다
/// (HTTP 전송, 시스템 시계, `rand` 샘플러, 저장소 없음 = 쓰로틀링 없음).
pub struct TelemetryCollectorBuilder {
    config: TelemetryConfig,
    transport: Option<Arc<dyn EventTransport>>,
    store: Option<Arc<dyn KeyValueStore>>,
    clock: Option<Arc<dyn Clock>>,
    sampler: Option<Arc<dyn Sampler>>,
    key_parser: Option<Arc<dyn PublishableKeyParser>>,
    sdk_provider: Option<Arc<dyn SdkMetadataProvider>>,
    debug_sink: Option<Arc<dyn DebugSink>>,
    environment: Option<EnvironmentFlags>,
    runtime: Option<Handle>,
}

impl TelemetryCollectorBuilder {
    pub fn new(config: TelemetryConfig) -> Self {
        Self {
            config,
            transport: None,
            store: None,
            clock: None,
            sampler: None,
            key_parser: None,
            sdk_provider: None,
            debug_sink: None,
            environment: None,
            runtime: None,
        }
    }

    pub fn transport(mut self, transport: Arc<dyn EventTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// 쓰로틀 캐시 저장소
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn sampler(mut self, sampler: Arc<dyn Sampler>) -> Self {
        self.sampler = Some(sampler);
        self
    }

    pub fn key_parser(mut self, parser: Arc<dyn PublishableKeyParser>) -> Self {
        self.key_parser = Some(parser);
        self
    }

    /// 런타임 SDK 등록값 제공자 (설정의 sdk/sdk_version보다 우선)
    pub fn sdk_provider(mut self, provider: Arc<dyn SdkMetadataProvider>) -> Self {
        self.sdk_provider = Some(provider);
        self
    }

    pub fn debug_sink(mut self, sink: Arc<dyn DebugSink>) -> Self {
        self.debug_sink = Some(sink);
        self
    }

    /// 환경 플래그 (기본: 프로세스 환경 변수)
    pub fn environment(mut self, flags: EnvironmentFlags) -> Self {
        self.environment = Some(flags);
        self
    }

    /// 전송/지연 플러시에 사용할 tokio 런타임
    ///
    /// 기본값은 현재 런타임이며, 없으면 전송 전용 백그라운드 런타임을 띄운다.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn build(self) -> Result<TelemetryCollector, TelemetryError> {
        let config = self.config;
        config.validate()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpEventTransport::new(
                &config.endpoint,
                config.request_timeout(),
            )?),
        };

        let parser = self
            .key_parser
            .unwrap_or_else(|| Arc::new(ClerkKeyParser));
        let instance_type = config
            .publishable_key
            .as_deref()
            .and_then(|key| parser.parse(key))
            .map(|parsed| parsed.instance_type);

        let context = EventContext::new(
            config.clerk_version.as_deref(),
            instance_type,
            config.publishable_key.as_deref(),
            config.secret_key.as_deref(),
        );

        let env = self
            .environment
            .unwrap_or_else(EnvironmentFlags::from_process_env);
        let enabled = instance_type == Some(InstanceType::Development)
            && !config.disabled
            && !env.telemetry_disabled
            && !env.automated_driver;
        let debug_mode = config.debug || env.telemetry_debug;

        let host_runtime = self.runtime.or_else(|| Handle::try_current().ok());
        let execution = ExecutionContext::resolve(
            config.execution_context,
            config.defer_mode,
            host_runtime.is_some(),
        );

        let (runtime, background) = match host_runtime {
            Some(handle) => (handle, None),
            None => {
                let background = BackgroundRuntime::start().map_err(|e| {
                    TelemetryError::Internal(format!("전송용 런타임 생성 실패: {e}"))
                })?;
                (background.handle(), Some(background))
            }
        };

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let throttler = EventThrottler::new(self.store, clock, &config.throttle);

        info!(
            "텔레메트리 수집기 생성: enabled={enabled}, debug={debug_mode}, instance_type={:?}, context={execution:?}",
            instance_type
        );

        let inner = CollectorInner {
            context,
            sdk: config.sdk,
            sdk_version: config.sdk_version,
            sdk_provider: self.sdk_provider,
            enabled,
            debug: debug_mode,
            sampling: SamplingPolicy::new(config.sampling_rate, config.per_event_sampling),
            sampler: self.sampler.unwrap_or_else(|| Arc::new(RandomSampler)),
            throttler,
            transport,
            debug_sink: self
                .debug_sink
                .unwrap_or_else(|| Arc::new(TracingDebugSink::default())),
            execution,
            runtime,
            _background: background,
            max_buffer_size: config.max_buffer_size,
            state: Mutex::new(BufferState::default()),
            deliveries: Mutex::new(Vec::new()),
        };

        Ok(TelemetryCollector {
            inner: Arc::new(inner),
        })
    }
}
