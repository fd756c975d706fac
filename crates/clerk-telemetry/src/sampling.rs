//! 샘플링 정책.
//!
//! 이벤트당 난수 하나를 뽑아 전역 비율과 이벤트별 비율 모두에 같은 값을
//! 사용한다. 이벤트별 비율은 전역 비율보다 관대해질 수 없다.

/// [0, 1) 난수 공급자
pub trait Sampler: Send + Sync {
    fn draw(&self) -> f64;
}

/// `rand` 기반 기본 샘플러
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSampler;

impl Sampler for RandomSampler {
    fn draw(&self) -> f64 {
        rand::random::<f64>()
    }
}

/// 항상 같은 값을 반환하는 샘플러 (테스트용)
#[derive(Debug, Clone, Copy)]
pub struct FixedSampler(pub f64);

impl Sampler for FixedSampler {
    fn draw(&self) -> f64 {
        self.0
    }
}

/// 전역/이벤트별 샘플링 정책
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingPolicy {
    rate: f64,
    per_event: bool,
}

impl SamplingPolicy {
    pub fn new(rate: f64, per_event: bool) -> Self {
        Self { rate, per_event }
    }

    /// 난수 `draw`로 이벤트를 채택할지 판정
    ///
    /// 비율 0은 어떤 난수로도 채택하지 않는다.
    pub fn admits(&self, draw: f64, event_rate: Option<f64>) -> bool {
        if !passes(draw, self.rate) {
            return false;
        }

        match event_rate {
            Some(rate) if self.per_event => passes(draw, rate),
            _ => true,
        }
    }
}

fn passes(draw: f64, rate: f64) -> bool {
    rate > 0.0 && draw <= rate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_never_admits() {
        let policy = SamplingPolicy::new(0.0, true);
        for draw in [0.0, 1e-12, 0.5, 0.999_999] {
            assert!(!policy.admits(draw, None));
        }
    }

    #[test]
    fn full_rate_without_per_event_always_admits() {
        let policy = SamplingPolicy::new(1.0, false);
        for draw in [0.0, 0.5, 0.999_999] {
            assert!(policy.admits(draw, Some(0.0)));
            assert!(policy.admits(draw, None));
        }
    }

    #[test]
    fn per_event_rate_reuses_the_global_draw() {
        let policy = SamplingPolicy::new(0.5, true);
        assert!(policy.admits(0.1, Some(0.2)));
        assert!(!policy.admits(0.3, Some(0.2)));
        // 이벤트별 비율이 더 높아도 전역 비율을 넘지 못함
        assert!(!policy.admits(0.7, Some(0.9)));
    }

    #[test]
    fn boundary_draw_is_inclusive() {
        let policy = SamplingPolicy::new(0.25, true);
        assert!(policy.admits(0.25, None));
        assert!(policy.admits(0.25, Some(0.25)));
        assert!(!policy.admits(0.250_001, None));
    }

    #[test]
    fn per_event_zero_rate_drops_when_enabled() {
        assert!(!SamplingPolicy::new(1.0, true).admits(0.0, Some(0.0)));
    }

    #[test]
    fn random_sampler_stays_in_unit_interval() {
        let sampler = RandomSampler;
        for _ in 0..1_000 {
            let draw = sampler.draw();
            assert!((0.0..1.0).contains(&draw));
        }
    }
}
