use {
    crate::{Hz, params::GeneratorParams, pingpong::BufferRole},
    thiserror::Error,
};

/// Error that can happen when handling a buffer completion event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StreamError {
    /// The event came from a DMA channel the streamer isn't driving
    #[error("Completion on unknown DMA channel {got} (expected {expected})")]
    UnknownChannel {
        /// Channel the event was reported on
        got: u8,
        /// Channel the streamer drives
        expected: u8,
    },
    /// The hardware reported a buffer other than the one being drained.
    ///
    /// Either a completion was missed, or a completion arrived before the previous one was
    /// handled.
    #[error("Completion for {got:?} buffer while {expected:?} buffer was active")]
    UnexpectedRole {
        /// Buffer the event reported as exhausted
        got: BufferRole,
        /// Buffer the streamer considered active
        expected: BufferRole,
    },
}

/// Error that can happen when validating a [`TimerConfig`](crate::TimerConfig) or the
/// starting [`GeneratorParams`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A starting parameter is outside its valid range
    #[error("Generator parameters out of range: {0:?}")]
    InvalidParams(GeneratorParams),
    /// The timer clock is zero
    #[error("Timer clock can't be zero")]
    ZeroClock,
    /// The fixed sample rate is zero
    #[error("Sample rate can't be zero")]
    ZeroSampleRate,
    /// The fixed sample rate is below the highest fixed rate frequency, which would leave
    /// fewer than one sample per period.
    #[error("Sample rate {rate} Hz is too low (should be at least {min} Hz)")]
    SampleRateTooLow {
        /// Configured sample rate
        rate: Hz,
        /// Lowest usable sample rate
        min: Hz,
    },
    /// The timer clock is too slow to produce a non-zero reload value at every reachable
    /// frequency.
    #[error("Timer clock {clock} Hz is too slow (should be at least {min} Hz)")]
    ClockTooSlow {
        /// Configured timer clock
        clock: Hz,
        /// Slowest usable timer clock
        min: Hz,
    },
}

/// Result of handling a completion event
pub type StreamResult<T = ()> = Result<T, StreamError>;

/// Result of validating a configuration
pub type ConfigResult<T = ()> = Result<T, ConfigError>;
