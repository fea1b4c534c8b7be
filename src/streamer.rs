use {
    crate::{
        hal::{InputDevice, PingPongOutput, ReloadTimer},
        input::{InputOutcome, InputState},
        params::GeneratorParams,
        pingpong::{BufferRole, PingPong},
        regen::fill_buffer,
        result::{ConfigError, ConfigResult, StreamError, StreamResult},
        timing::TimerConfig,
    },
    crossbeam_channel::Receiver,
    std::ops::ControlFlow,
};

/// DMA channel the DAC transfer runs on
pub const DMA_CHANNEL: u8 = 0;

/// The hardware finished draining a buffer
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct StreamEvent {
    /// DMA channel that completed
    pub channel: u8,
    /// The buffer that was just drained
    pub role: BufferRole,
}

impl StreamEvent {
    /// Completion of `role` on [`DMA_CHANNEL`]
    #[must_use]
    pub const fn exhausted(role: BufferRole) -> Self {
        Self {
            channel: DMA_CHANNEL,
            role,
        }
    }
}

/// Ping-pong waveform streamer
///
/// Owns both sample buffers and the generator parameters. All work happens in
/// [`Self::on_buffer_exhausted`], which must run to completion before the hardware finishes
/// the other buffer.
pub struct Streamer {
    params: GeneratorParams,
    input: InputState,
    bufs: PingPong,
    timer_cfg: TimerConfig,
    channel: u8,
    /// Number of completion events handled so far
    pub completions: u64,
}

impl Streamer {
    /// Create a streamer with `params`, checking both `params` and `timer_cfg` first.
    ///
    /// Buffers are empty until [`Self::start`].
    pub fn new(params: GeneratorParams, timer_cfg: TimerConfig) -> ConfigResult<Self> {
        timer_cfg.validate()?;
        if !params.is_valid() {
            return Err(ConfigError::InvalidParams(params));
        }
        Ok(Self {
            params,
            input: InputState::default(),
            bufs: PingPong::default(),
            timer_cfg,
            channel: DMA_CHANNEL,
            completions: 0,
        })
    }
    /// Current generator parameters
    ///
    /// Only input handling in [`Self::on_buffer_exhausted`] changes these, which keeps them
    /// within their valid ranges.
    #[must_use]
    pub const fn params(&self) -> &GeneratorParams {
        &self.params
    }
    /// The timer configuration in use
    #[must_use]
    pub const fn timer_cfg(&self) -> &TimerConfig {
        &self.timer_cfg
    }
    /// The sample buffers
    #[must_use]
    pub const fn buffers(&self) -> &PingPong {
        &self.bufs
    }
    /// Fill both buffers, program the timer and start the output on the primary buffer.
    pub fn start(&mut self, timer: &mut impl ReloadTimer, output: &mut impl PingPongOutput) {
        for role in [BufferRole::Primary, BufferRole::Alternate] {
            self.regenerate(role);
        }
        timer.set_reload(self.timer_cfg.reload(&self.params));
        let (primary, alternate) = self.bufs.both();
        output.activate(primary, alternate);
        log::debug!("Started with {:?}", self.params);
    }
    /// Handle the hardware finishing a buffer.
    ///
    /// Polls `input`, refills the drained buffer, re-arms it in `output`, and hands the active
    /// role to the other buffer. Afterwards the refilled buffer is [`PingPong::standby`].
    pub fn on_buffer_exhausted(
        &mut self,
        event: StreamEvent,
        input: &mut impl InputDevice,
        timer: &mut impl ReloadTimer,
        output: &mut impl PingPongOutput,
    ) -> StreamResult<InputOutcome> {
        if event.channel != self.channel {
            return Err(StreamError::UnknownChannel {
                got: event.channel,
                expected: self.channel,
            });
        }
        if event.role != self.bufs.active() {
            return Err(StreamError::UnexpectedRole {
                got: event.role,
                expected: self.bufs.active(),
            });
        }
        log::trace!("{:?} buffer exhausted", event.role);
        let outcome = self
            .input
            .apply(input.joystick(), input.buttons(), &mut self.params);
        if outcome.reload_dirty {
            timer.set_reload(self.timer_cfg.reload(&self.params));
        }
        self.regenerate(event.role);
        output.refresh(event.role, self.bufs.buffer(event.role));
        self.bufs.swap();
        self.completions += 1;
        Ok(outcome)
    }
    fn regenerate(&mut self, role: BufferRole) {
        fill_buffer(
            &self.params,
            self.timer_cfg.sample_rate,
            self.bufs.buffer_mut(role),
        );
    }
}

/// Handle completion events from `events` until the sending side hangs up, or
/// `after_each` breaks.
///
/// `after_each` runs after every handled event. Stops at the first event the streamer rejects.
pub fn run_event_loop(
    streamer: &mut Streamer,
    events: &Receiver<StreamEvent>,
    input: &mut impl InputDevice,
    timer: &mut impl ReloadTimer,
    output: &mut impl PingPongOutput,
    mut after_each: impl FnMut(&Streamer, InputOutcome) -> ControlFlow<()>,
) -> StreamResult {
    for event in events {
        let outcome = streamer.on_buffer_exhausted(event, input, timer, output)?;
        if after_each(streamer, outcome).is_break() {
            log::debug!("Stopped after {} completions", streamer.completions);
            return Ok(());
        }
    }
    log::debug!(
        "Event source closed after {} completions",
        streamer.completions
    );
    Ok(())
}

#[cfg(test)]
use {
    crate::{
        BUFFER_SIZE, SampleBuffer,
        input::{Buttons, Joystick},
        params::RateMode,
        regen::transform_sample,
        tables,
        timing::Reload,
        waveform::Waveform,
    },
    std::collections::VecDeque,
};

#[cfg(test)]
#[derive(Default)]
struct ScriptedInput {
    readings: VecDeque<(Joystick, Buttons)>,
    current: (Joystick, Buttons),
}

#[cfg(test)]
impl ScriptedInput {
    fn push(&mut self, joystick: Joystick, buttons: Buttons) {
        self.readings.push_back((joystick, buttons));
    }
}

#[cfg(test)]
impl InputDevice for ScriptedInput {
    fn joystick(&mut self) -> Joystick {
        if let Some(next) = self.readings.pop_front() {
            self.current = next;
        }
        self.current.0
    }
    fn buttons(&mut self) -> Buttons {
        self.current.1
    }
}

#[cfg(test)]
#[derive(Default)]
struct RecordingTimer {
    reloads: Vec<Reload>,
}

#[cfg(test)]
impl ReloadTimer for RecordingTimer {
    fn set_reload(&mut self, reload: Reload) {
        self.reloads.push(reload);
    }
}

#[cfg(test)]
#[derive(Default)]
struct RecordingOutput {
    played: Vec<SampleBuffer>,
    refreshed: Vec<BufferRole>,
}

#[cfg(test)]
impl PingPongOutput for RecordingOutput {
    fn activate(&mut self, primary: &SampleBuffer, alternate: &SampleBuffer) {
        self.played.push(*primary);
        self.played.push(*alternate);
    }
    fn refresh(&mut self, role: BufferRole, samples: &SampleBuffer) {
        self.refreshed.push(role);
        self.played.push(*samples);
    }
}

#[cfg(test)]
fn started() -> (Streamer, ScriptedInput, RecordingTimer, RecordingOutput) {
    started_with(GeneratorParams::default())
}

#[cfg(test)]
fn started_with(
    params: GeneratorParams,
) -> (Streamer, ScriptedInput, RecordingTimer, RecordingOutput) {
    let mut streamer = Streamer::new(params, TimerConfig::default()).unwrap();
    let mut timer = RecordingTimer::default();
    let mut output = RecordingOutput::default();
    streamer.start(&mut timer, &mut output);
    (streamer, ScriptedInput::default(), timer, output)
}

#[test]
fn test_start_prefills_both_buffers() {
    let (streamer, _, timer, output) = started();
    assert_eq!(timer.reloads, [187]);
    assert_eq!(output.played.len(), 2);
    let expected: Vec<u16> = tables::SINE
        .iter()
        .map(|&raw| transform_sample(raw, 50, 50))
        .collect();
    for buf in &output.played {
        assert_eq!(buf.as_slice(), expected.as_slice());
    }
    assert_eq!(streamer.buffers().active(), BufferRole::Primary);
}

#[test]
fn test_completions_alternate_roles() {
    let (mut streamer, mut input, mut timer, mut output) = started();
    let mut role = BufferRole::Primary;
    for _ in 0..4 {
        streamer
            .on_buffer_exhausted(
                StreamEvent::exhausted(role),
                &mut input,
                &mut timer,
                &mut output,
            )
            .unwrap();
        role = role.flip();
    }
    assert_eq!(
        output.refreshed,
        [
            BufferRole::Primary,
            BufferRole::Alternate,
            BufferRole::Primary,
            BufferRole::Alternate
        ]
    );
    assert_eq!(streamer.completions, 4);
    // Nothing was touched, so the timer was only programmed at start
    assert_eq!(timer.reloads.len(), 1);
}

#[test]
fn test_out_of_order_completion_is_rejected() {
    let (mut streamer, mut input, mut timer, mut output) = started();
    let err = streamer
        .on_buffer_exhausted(
            StreamEvent::exhausted(BufferRole::Alternate),
            &mut input,
            &mut timer,
            &mut output,
        )
        .unwrap_err();
    assert_eq!(
        err,
        StreamError::UnexpectedRole {
            got: BufferRole::Alternate,
            expected: BufferRole::Primary
        }
    );
    let err = streamer
        .on_buffer_exhausted(
            StreamEvent {
                channel: 3,
                role: BufferRole::Primary,
            },
            &mut input,
            &mut timer,
            &mut output,
        )
        .unwrap_err();
    assert_eq!(
        err,
        StreamError::UnknownChannel {
            got: 3,
            expected: DMA_CHANNEL
        }
    );
    assert!(output.refreshed.is_empty());
    assert_eq!(streamer.buffers().active(), BufferRole::Primary);
}

#[test]
fn test_mode_toggle_pushes_reload() {
    let (mut streamer, mut input, mut timer, mut output) = started();
    input.push(Joystick::CENTER, Buttons::empty());
    input.push(Joystick::empty(), Buttons::empty());
    input.push(Joystick::CENTER, Buttons::empty());
    let mut role = BufferRole::Primary;
    for _ in 0..3 {
        streamer
            .on_buffer_exhausted(
                StreamEvent::exhausted(role),
                &mut input,
                &mut timer,
                &mut output,
            )
            .unwrap();
        role = role.flip();
    }
    // start, fixed rate, release, back to variable rate
    assert_eq!(timer.reloads, [187, 1088, 1088, 187]);
    assert_eq!(streamer.params().rate_mode, RateMode::Variable);
    assert_eq!(streamer.params().frequency, 1000);
}

#[test]
fn test_input_applies_to_refilled_buffer() {
    let (mut streamer, mut input, mut timer, mut output) = started();
    input.push(Joystick::UP, Buttons::PB2);
    streamer
        .on_buffer_exhausted(
            StreamEvent::exhausted(BufferRole::Primary),
            &mut input,
            &mut timer,
            &mut output,
        )
        .unwrap();
    assert_eq!(streamer.params().waveform, Waveform::Square);
    assert_eq!(streamer.params().amplitude, 52);
    let refilled = streamer.buffers().buffer(BufferRole::Primary);
    assert_eq!(refilled[0], transform_sample(0x00, 52, 50));
    assert_eq!(refilled[BUFFER_SIZE - 1], transform_sample(0xff, 52, 50));
    // The standby buffer keeps the old waveform until its own completion
    let old = streamer.buffers().buffer(BufferRole::Alternate);
    assert_eq!(old[0], transform_sample(tables::SINE[0], 50, 50));
}

#[test]
fn test_event_loop_runs_until_disconnect() {
    let (mut streamer, mut input, mut timer, mut output) = started();
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut role = BufferRole::Primary;
    for _ in 0..6 {
        tx.send(StreamEvent::exhausted(role)).unwrap();
        role = role.flip();
    }
    drop(tx);
    run_event_loop(
        &mut streamer,
        &rx,
        &mut input,
        &mut timer,
        &mut output,
        |_, _| ControlFlow::Continue(()),
    )
    .unwrap();
    assert_eq!(streamer.completions, 6);
    assert_eq!(output.played.len(), 8);
}

#[test]
fn test_event_loop_stops_on_rejected_event() {
    let (mut streamer, mut input, mut timer, mut output) = started();
    let (tx, rx) = crossbeam_channel::unbounded();
    tx.send(StreamEvent::exhausted(BufferRole::Primary)).unwrap();
    tx.send(StreamEvent::exhausted(BufferRole::Primary)).unwrap();
    tx.send(StreamEvent::exhausted(BufferRole::Alternate)).unwrap();
    drop(tx);
    let result = run_event_loop(
        &mut streamer,
        &rx,
        &mut input,
        &mut timer,
        &mut output,
        |_, _| ControlFlow::Continue(()),
    );
    assert!(matches!(result, Err(StreamError::UnexpectedRole { .. })));
    assert_eq!(streamer.completions, 1);
}

#[test]
fn test_bad_config_is_rejected() {
    let cfg = TimerConfig {
        sample_rate: 0,
        ..Default::default()
    };
    assert!(Streamer::new(GeneratorParams::default(), cfg).is_err());
}

#[test]
fn test_invalid_params_are_rejected() {
    let params = GeneratorParams {
        rate_mode: RateMode::Fixed,
        frequency: 0,
        amplitude: 900,
        ..Default::default()
    };
    let Err(err) = Streamer::new(params, TimerConfig::default()) else {
        panic!("out of range parameters were accepted");
    };
    assert_eq!(err, ConfigError::InvalidParams(params));
    // Each field on its own is enough
    for params in [
        GeneratorParams {
            frequency: 1750,
            ..Default::default()
        },
        GeneratorParams {
            offset: -2,
            ..Default::default()
        },
    ] {
        assert!(matches!(
            Streamer::new(params, TimerConfig::default()),
            Err(ConfigError::InvalidParams(_))
        ));
    }
}

#[test]
fn test_freq_up_pushes_reload() {
    let (mut streamer, mut input, mut timer, mut output) = started();
    input.push(Joystick::RIGHT, Buttons::empty());
    let outcome = streamer
        .on_buffer_exhausted(
            StreamEvent::exhausted(BufferRole::Primary),
            &mut input,
            &mut timer,
            &mut output,
        )
        .unwrap();
    assert!(outcome.params_changed);
    assert!(outcome.reload_dirty);
    assert_eq!(streamer.params().frequency, 1050);
    // 48 MHz / 256 / 1050
    assert_eq!(timer.reloads, [187, 178]);
}

#[test]
fn test_freq_down_at_floor_pushes_reload() {
    let (mut streamer, mut input, mut timer, mut output) = started_with(GeneratorParams {
        frequency: 100,
        ..Default::default()
    });
    input.push(Joystick::LEFT, Buttons::empty());
    input.push(Joystick::empty(), Buttons::empty());
    input.push(Joystick::LEFT, Buttons::empty());
    let mut role = BufferRole::Primary;
    for _ in 0..3 {
        streamer
            .on_buffer_exhausted(
                StreamEvent::exhausted(role),
                &mut input,
                &mut timer,
                &mut output,
            )
            .unwrap();
        role = role.flip();
    }
    assert_eq!(streamer.params().frequency, 50);
    // Saturated at the floor, but the reading changed, so the reload is pushed again
    assert_eq!(timer.reloads, [1875, 3750, 3750, 3750]);
}

#[test]
fn test_refilled_buffer_becomes_standby() {
    let (mut streamer, mut input, mut timer, mut output) = started();
    streamer
        .on_buffer_exhausted(
            StreamEvent::exhausted(BufferRole::Primary),
            &mut input,
            &mut timer,
            &mut output,
        )
        .unwrap();
    assert_eq!(output.refreshed, [BufferRole::Primary]);
    assert_eq!(streamer.buffers().standby(), BufferRole::Primary);
    assert_eq!(streamer.buffers().active(), BufferRole::Alternate);
}

#[test]
fn test_event_loop_stops_when_hook_breaks() {
    let (mut streamer, mut input, mut timer, mut output) = started();
    input.push(Joystick::empty(), Buttons::PB4);
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut role = BufferRole::Primary;
    for _ in 0..6 {
        tx.send(StreamEvent::exhausted(role)).unwrap();
        role = role.flip();
    }
    let mut changes = Vec::new();
    run_event_loop(
        &mut streamer,
        &rx,
        &mut input,
        &mut timer,
        &mut output,
        |streamer, outcome| {
            changes.push(outcome.params_changed);
            if streamer.completions == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        },
    )
    .unwrap();
    assert_eq!(streamer.completions, 3);
    assert_eq!(changes, [true, false, false]);
    assert_eq!(streamer.params().offset, 52);
    // The rest stay queued
    assert_eq!(rx.len(), 3);
}
