//! Hardware the streamer drives
//!
//! These are implemented by whatever sits on the other side: real peripherals on a board,
//! a terminal front-end, or recording mocks in tests.

use crate::{
    SampleBuffer,
    input::{Buttons, Joystick},
    pingpong::BufferRole,
    timing::Reload,
};

/// Polled user controls
pub trait InputDevice {
    /// Current joystick reading
    fn joystick(&mut self) -> Joystick;
    /// Current push button reading
    fn buttons(&mut self) -> Buttons;
}

/// The timer that triggers DAC conversions
pub trait ReloadTimer {
    /// Set the value the timer counts to before overflowing.
    ///
    /// Takes effect at the next overflow.
    fn set_reload(&mut self, reload: Reload);
}

/// DMA ping-pong transfer into the DAC
pub trait PingPongOutput {
    /// Start transferring, beginning with `primary`, then `alternate`, then alternating.
    fn activate(&mut self, primary: &SampleBuffer, alternate: &SampleBuffer);
    /// Re-arm the descriptor of `role` after its buffer was refilled with `samples`.
    fn refresh(&mut self, role: BufferRole, samples: &SampleBuffer);
}
