//! Fixed-step pacing for wall-clock runs
//!
//! The simulation itself only knows ticks. This accumulates real elapsed
//! time and hands out whole ticks, so a session can be watched at a steady
//! pace without the core ever reading a clock.

use std::time::Duration;

use web_time::Instant;

pub struct FixedStepDriver {
    step: Duration,
    accumulator: Duration,
    last: Option<Instant>,
    max_catch_up: u32,
}

impl FixedStepDriver {
    /// Non-positive or non-finite rates fall back to one tick per second
    pub fn new(ticks_per_second: f64, max_catch_up: u32) -> Self {
        let rate = if ticks_per_second.is_finite() && ticks_per_second > 0.0 {
            ticks_per_second
        } else {
            1.0
        };
        Self {
            step: Duration::from_secs_f64(1.0 / rate),
            accumulator: Duration::ZERO,
            last: None,
            max_catch_up: max_catch_up.max(1),
        }
    }

    pub fn step_duration(&self) -> Duration {
        self.step
    }

    /// Ticks due since the previous call. The first call only starts the clock.
    pub fn update(&mut self) -> u32 {
        let now = Instant::now();
        let elapsed = match self.last {
            Some(last) => now.duration_since(last),
            None => Duration::ZERO,
        };
        self.last = Some(now);
        self.advance(elapsed)
    }

    /// Add `elapsed` to the accumulator and drain whole steps from it.
    /// Backlog beyond `max_catch_up` steps is dropped.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulator += elapsed;
        let mut ticks = 0;
        while self.accumulator >= self.step {
            self.accumulator -= self.step;
            ticks += 1;
            if ticks == self.max_catch_up {
                if self.accumulator >= self.step {
                    log::debug!(
                        "Driver fell behind, dropping {:?} of backlog",
                        self.accumulator
                    );
                    self.accumulator = Duration::ZERO;
                }
                break;
            }
        }
        ticks
    }

    /// Time left until the next tick is due
    pub fn until_next(&self) -> Duration {
        self.step.saturating_sub(self.accumulator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_steps_only() {
        let mut driver = FixedStepDriver::new(10.0, 8);
        assert_eq!(driver.advance(Duration::from_millis(50)), 0);
        assert_eq!(driver.advance(Duration::from_millis(60)), 1);
        assert_eq!(driver.advance(Duration::from_millis(190)), 2);
        assert_eq!(driver.until_next(), Duration::from_millis(100));
    }

    #[test]
    fn test_backlog_capped() {
        let mut driver = FixedStepDriver::new(100.0, 4);
        assert_eq!(driver.advance(Duration::from_secs(5)), 4);
        assert!(driver.until_next() > Duration::ZERO);
        assert_eq!(driver.advance(Duration::ZERO), 0);
    }

    #[test]
    fn test_invalid_rate_falls_back() {
        let driver = FixedStepDriver::new(f64::NAN, 0);
        assert_eq!(driver.step_duration(), Duration::from_secs(1));
        let driver = FixedStepDriver::new(-3.0, 1);
        assert_eq!(driver.step_duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_first_update_starts_clock() {
        let mut driver = FixedStepDriver::new(1.0, 1);
        assert_eq!(driver.update(), 0);
    }
}
