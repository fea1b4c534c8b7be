#![doc = include_str!("../README.md")]
// When we return an error type, the possible errors are encoded within it.
#![allow(clippy::missing_errors_doc)]

pub mod hal;
mod input;
mod params;
mod pingpong;
mod regen;
mod result;
mod streamer;
pub mod tables;
pub mod timing;
mod waveform;

pub use {
    input::{Buttons, InputOutcome, InputState, Joystick},
    params::{GeneratorParams, RateMode},
    pingpong::{BufferRole, PingPong},
    regen::{fill_buffer, transform_sample, unclamped_sample},
    result::{ConfigError, ConfigResult, StreamError, StreamResult},
    streamer::{DMA_CHANNEL, StreamEvent, Streamer, run_event_loop},
    timing::TimerConfig,
    waveform::Waveform,
};

/// Number of sample slots in each of the two ping-pong buffers
///
/// This is also the length of every waveform table.
pub const BUFFER_SIZE: usize = 256;

/// One buffer of 12-bit DAC samples (`0..=4095`)
pub type SampleBuffer = [u16; BUFFER_SIZE];

/// Frequency in Hz
pub type Hz = u32;

/// View a sample buffer as raw little endian bytes, the way the DAC data register receives them.
#[must_use]
pub fn sample_bytes(buf: &SampleBuffer) -> &[u8] {
    bytemuck::cast_slice(buf)
}

#[cfg(target_endian = "big")]
const _: () = panic!("Only little endian architectures are supported currently.");
