use crate::params::GeneratorParams;

bitflags::bitflags! {
    /// Reading of the 5-way joystick
    #[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
    pub struct Joystick: u8 {
        /// Pushed down
        const DOWN = 1 << 0;
        /// Pushed right
        const RIGHT = 1 << 1;
        /// Pushed up
        const UP = 1 << 2;
        /// Pushed left
        const LEFT = 1 << 3;
        /// Pressed in
        const CENTER = 1 << 4;
    }
}

bitflags::bitflags! {
    /// Reading of the push buttons
    #[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
    pub struct Buttons: u8 {
        /// Decreases amplitude
        const PB1 = 1 << 0;
        /// Increases amplitude
        const PB2 = 1 << 1;
        /// Decreases offset
        const PB3 = 1 << 2;
        /// Increases offset
        const PB4 = 1 << 3;
    }
}

/// What applying a reading did to the parameters
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub struct InputOutcome {
    /// At least one parameter was modified
    pub params_changed: bool,
    /// The joystick reading changed, so the timer reload value has to be pushed again
    pub reload_dirty: bool,
}

/// Remembers the previous readings, so held controls only act once.
///
/// A control acts when its reading changes to exactly one flag.
/// Releasing it, or pressing several at once, changes the remembered reading but does nothing else.
#[derive(Default, Clone, Copy, Debug)]
pub struct InputState {
    joystick: Joystick,
    buttons: Buttons,
}

impl InputState {
    /// Apply a fresh pair of readings to `params`.
    pub fn apply(
        &mut self,
        joystick: Joystick,
        buttons: Buttons,
        params: &mut GeneratorParams,
    ) -> InputOutcome {
        let before = *params;
        let mut outcome = InputOutcome::default();
        if joystick != self.joystick {
            self.joystick = joystick;
            outcome.reload_dirty = true;
            apply_joystick(joystick, params);
        }
        if buttons != self.buttons {
            self.buttons = buttons;
            apply_buttons(buttons, params);
        }
        outcome.params_changed = *params != before;
        if outcome.params_changed {
            log::debug!("Parameters changed: {before:?} -> {params:?}");
        }
        outcome
    }
}

fn apply_joystick(joystick: Joystick, params: &mut GeneratorParams) {
    if joystick == Joystick::UP {
        params.waveform = params.waveform.next();
    } else if joystick == Joystick::DOWN {
        params.waveform = params.waveform.prev();
    } else if joystick == Joystick::RIGHT {
        params.freq_up();
    } else if joystick == Joystick::LEFT {
        params.freq_down();
    } else if joystick == Joystick::CENTER {
        params.toggle_rate_mode();
        log::debug!("Switched to {:?} rate mode", params.rate_mode);
    }
}

fn apply_buttons(buttons: Buttons, params: &mut GeneratorParams) {
    let step = GeneratorParams::LEVEL_STEP;
    if buttons == Buttons::PB1 {
        params.nudge_amplitude(-step);
    } else if buttons == Buttons::PB2 {
        params.nudge_amplitude(step);
    } else if buttons == Buttons::PB3 {
        params.nudge_offset(-step);
    } else if buttons == Buttons::PB4 {
        params.nudge_offset(step);
    }
}

#[cfg(test)]
use crate::{params::RateMode, waveform::Waveform};

/// Press and release, the way a user taps a control
#[cfg(test)]
fn tap_joystick(state: &mut InputState, params: &mut GeneratorParams, j: Joystick) {
    state.apply(j, Buttons::empty(), params);
    state.apply(Joystick::empty(), Buttons::empty(), params);
}

#[cfg(test)]
fn tap_button(state: &mut InputState, params: &mut GeneratorParams, b: Buttons) {
    state.apply(Joystick::empty(), b, params);
    state.apply(Joystick::empty(), Buttons::empty(), params);
}

#[test]
fn test_held_control_acts_once() {
    let mut state = InputState::default();
    let mut params = GeneratorParams::default();
    for _ in 0..10 {
        state.apply(Joystick::RIGHT, Buttons::PB2, &mut params);
    }
    assert_eq!(params.frequency, 1050);
    assert_eq!(params.amplitude, 52);
}

#[test]
fn test_waveform_wraps_both_ways() {
    let mut state = InputState::default();
    let mut params = GeneratorParams::default();
    let mut up = Vec::new();
    for _ in 0..5 {
        tap_joystick(&mut state, &mut params, Joystick::UP);
        up.push(params.waveform.index());
    }
    assert_eq!(up, [1, 2, 3, 4, 0]);
    let mut down = Vec::new();
    for _ in 0..5 {
        tap_joystick(&mut state, &mut params, Joystick::DOWN);
        down.push(params.waveform.index());
    }
    assert_eq!(down, [4, 3, 2, 1, 0]);
    assert_eq!(params.waveform, Waveform::Sine);
}

#[test]
fn test_combined_readings_are_ignored() {
    let mut state = InputState::default();
    let mut params = GeneratorParams::default();
    let outcome = state.apply(
        Joystick::UP | Joystick::LEFT,
        Buttons::PB1 | Buttons::PB4,
        &mut params,
    );
    assert_eq!(params, GeneratorParams::default());
    assert!(!outcome.params_changed);
    // The reading still changed, so the reload gets refreshed anyway
    assert!(outcome.reload_dirty);
    // Releasing one of the two is a change to a single flag, so it acts
    state.apply(Joystick::LEFT, Buttons::empty(), &mut params);
    assert_eq!(params.frequency, 950);
}

#[test]
fn test_center_toggles_mode() {
    let mut state = InputState::default();
    let mut params = GeneratorParams::default();
    tap_joystick(&mut state, &mut params, Joystick::CENTER);
    assert_eq!(params.rate_mode, RateMode::Fixed);
    tap_joystick(&mut state, &mut params, Joystick::RIGHT);
    assert_eq!(params.frequency, 1200);
    tap_joystick(&mut state, &mut params, Joystick::CENTER);
    assert_eq!(params.rate_mode, RateMode::Variable);
    assert_eq!(params.frequency, 1000);
}

#[test]
fn test_buttons_adjust_levels() {
    let mut state = InputState::default();
    let mut params = GeneratorParams::default();
    tap_button(&mut state, &mut params, Buttons::PB1);
    assert_eq!(params.amplitude, 48);
    tap_button(&mut state, &mut params, Buttons::PB2);
    tap_button(&mut state, &mut params, Buttons::PB2);
    assert_eq!(params.amplitude, 52);
    tap_button(&mut state, &mut params, Buttons::PB3);
    assert_eq!(params.offset, 48);
    tap_button(&mut state, &mut params, Buttons::PB4);
    assert_eq!(params.offset, 50);
}

#[test]
fn test_button_change_does_not_dirty_reload() {
    let mut state = InputState::default();
    let mut params = GeneratorParams::default();
    let outcome = state.apply(Joystick::empty(), Buttons::PB2, &mut params);
    assert!(outcome.params_changed);
    assert!(!outcome.reload_dirty);
}
