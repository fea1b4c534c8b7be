//! Timer reload calculations
use {
    crate::{
        BUFFER_SIZE, Hz,
        params::{GeneratorParams, RateMode},
        result::{ConfigError, ConfigResult},
    },
    std::time::Duration,
};

/// Timer reload (top) value. The timer overflows, and triggers a DAC conversion, every
/// `reload` clock cycles.
pub type Reload = u32;

#[expect(clippy::cast_possible_truncation)]
const BUFFER_LEN: Hz = BUFFER_SIZE as Hz;

/// Clocking of the sample trigger timer
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TimerConfig {
    /// Input clock of the timer
    pub clock_hz: Hz,
    /// Output sample rate used in [`RateMode::Fixed`]
    pub sample_rate: Hz,
}

/// CD audio rate
pub const DEFAULT_SAMPLE_RATE: Hz = 44_100;
/// Default timer input clock
pub const DEFAULT_CLOCK_HZ: Hz = 48_000_000;

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            clock_hz: DEFAULT_CLOCK_HZ,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl TimerConfig {
    /// Check that every reachable parameter combination yields a usable reload value and
    /// fixed rate step.
    pub fn validate(&self) -> ConfigResult {
        if self.clock_hz == 0 {
            return Err(ConfigError::ZeroClock);
        }
        if self.sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        let min_rate = Hz::from(*GeneratorParams::FIXED_FREQ_RANGE.end());
        if self.sample_rate < min_rate {
            return Err(ConfigError::SampleRateTooLow {
                rate: self.sample_rate,
                min: min_rate,
            });
        }
        let max_variable = Hz::from(*GeneratorParams::VARIABLE_FREQ_RANGE.end());
        let min_clock = (BUFFER_LEN * max_variable).max(self.sample_rate);
        if self.clock_hz < min_clock {
            return Err(ConfigError::ClockTooSlow {
                clock: self.clock_hz,
                min: min_clock,
            });
        }
        Ok(())
    }
    /// The reload value that makes the timer trigger at the rate `params` call for.
    ///
    /// - Variable rate: `clock / BUFFER_SIZE / frequency`, one full table per period.
    /// - Fixed rate: `clock / sample_rate`.
    #[must_use]
    pub fn reload(&self, params: &GeneratorParams) -> Reload {
        match params.rate_mode {
            RateMode::Variable => {
                self.clock_hz / BUFFER_LEN / Hz::from(params.frequency.max(1))
            }
            RateMode::Fixed => self.clock_hz / self.sample_rate.max(1),
        }
    }
}

/// How long the hardware takes to drain one buffer at `reload`.
///
/// This is the time budget for regenerating the other buffer.
#[must_use]
pub fn buffer_duration(reload: Reload, clock_hz: Hz) -> Duration {
    if clock_hz == 0 {
        return Duration::ZERO;
    }
    let cycles = u64::from(reload) * u64::from(BUFFER_LEN);
    Duration::from_nanos(cycles * 1_000_000_000 / u64::from(clock_hz))
}

#[test]
fn test_reload_values() {
    let cfg = TimerConfig::default();
    let mut params = GeneratorParams::default();
    assert_eq!(cfg.reload(&params), 187);
    params.frequency = 50;
    assert_eq!(cfg.reload(&params), 3750);
    params.frequency = 1700;
    assert_eq!(cfg.reload(&params), 110);
    params.rate_mode = RateMode::Fixed;
    assert_eq!(cfg.reload(&params), 1088);
}

#[test]
fn test_validate() {
    assert_eq!(TimerConfig::default().validate(), Ok(()));
    let cfg = TimerConfig {
        clock_hz: 0,
        ..Default::default()
    };
    assert_eq!(cfg.validate(), Err(ConfigError::ZeroClock));
    let cfg = TimerConfig {
        sample_rate: 8000,
        ..Default::default()
    };
    assert_eq!(
        cfg.validate(),
        Err(ConfigError::SampleRateTooLow {
            rate: 8000,
            min: 20_000
        })
    );
    let cfg = TimerConfig {
        clock_hz: 400_000,
        ..Default::default()
    };
    assert_eq!(
        cfg.validate(),
        Err(ConfigError::ClockTooSlow {
            clock: 400_000,
            min: 435_200
        })
    );
}

#[test]
fn test_buffer_duration() {
    // 256 samples at 44.1 kHz is ~5.8 ms
    let d = buffer_duration(1088, DEFAULT_CLOCK_HZ);
    assert_eq!(d.as_micros(), 5802);
    assert_eq!(buffer_duration(187, 0), Duration::ZERO);
}
