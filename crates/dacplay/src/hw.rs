//! Terminal stand-ins for the board peripherals

use {
    arrayvec::ArrayVec,
    crossbeam_channel::Sender,
    crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    dacwave::{
        BufferRole, Buttons, Hz, Joystick, SampleBuffer, StreamEvent,
        hal::{InputDevice, PingPongOutput, ReloadTimer},
        sample_bytes,
        timing::{Reload, buffer_duration},
    },
    std::{
        io::{self, StdoutLock, Write as _},
        sync::{
            Arc,
            atomic::{AtomicBool, AtomicU32, Ordering},
        },
        thread::JoinHandle,
        time::Duration,
    },
};

/// Keys beyond this many per poll are dropped
const MAX_KEYS_PER_POLL: usize = 8;

/// Keyboard as joystick and push buttons.
///
/// A key press reads as held for exactly one poll.
pub struct Keyboard {
    enabled: bool,
    stop: Arc<AtomicBool>,
    buttons: Buttons,
}

impl Keyboard {
    pub const fn new(enabled: bool, stop: Arc<AtomicBool>) -> Self {
        Self {
            enabled,
            stop,
            buttons: Buttons::empty(),
        }
    }
    fn pressed_keys(&self) -> ArrayVec<KeyCode, MAX_KEYS_PER_POLL> {
        let mut keys = ArrayVec::new();
        if !self.enabled {
            return keys;
        }
        while matches!(event::poll(Duration::ZERO), Ok(true)) {
            let Ok(ev) = event::read() else {
                break;
            };
            let Event::Key(key) = ev else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            // Raw mode swallows SIGINT
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                self.stop.store(true, Ordering::Relaxed);
                continue;
            }
            // Mashing more keys than fit in one poll doesn't mean anything anyway
            let _ = keys.try_push(key.code);
        }
        keys
    }
}

impl InputDevice for Keyboard {
    fn joystick(&mut self) -> Joystick {
        let mut joystick = Joystick::empty();
        let mut buttons = Buttons::empty();
        for code in self.pressed_keys() {
            match code {
                KeyCode::Up => joystick |= Joystick::UP,
                KeyCode::Down => joystick |= Joystick::DOWN,
                KeyCode::Left => joystick |= Joystick::LEFT,
                KeyCode::Right => joystick |= Joystick::RIGHT,
                KeyCode::Enter | KeyCode::Char(' ') => joystick |= Joystick::CENTER,
                KeyCode::Char('1') => buttons |= Buttons::PB1,
                KeyCode::Char('2') => buttons |= Buttons::PB2,
                KeyCode::Char('3') => buttons |= Buttons::PB3,
                KeyCode::Char('4') => buttons |= Buttons::PB4,
                KeyCode::Char('q') | KeyCode::Esc => self.stop.store(true, Ordering::Relaxed),
                _ => {}
            }
        }
        self.buttons = buttons;
        joystick
    }
    fn buttons(&mut self) -> Buttons {
        self.buttons
    }
}

/// Timer whose reload value paces the [`spawn_pacer`] thread
pub struct PacedTimer {
    reload: Arc<AtomicU32>,
}

impl PacedTimer {
    pub fn new() -> (Self, Arc<AtomicU32>) {
        let reload = Arc::new(AtomicU32::new(0));
        (
            Self {
                reload: reload.clone(),
            },
            reload,
        )
    }
    pub fn reload(&self) -> Reload {
        self.reload.load(Ordering::Relaxed)
    }
}

impl ReloadTimer for PacedTimer {
    fn set_reload(&mut self, reload: Reload) {
        log::debug!("Timer reload: {reload}");
        self.reload.store(reload, Ordering::Relaxed);
    }
}

/// DAC that "converts" by writing the samples to stdout as little endian `u16`.
///
/// Buffers come out in the order the hardware would drain them.
/// A write error raises the stop flag.
pub struct StdoutDac {
    out: StdoutLock<'static>,
    stop: Arc<AtomicBool>,
    /// First write error, if any. Writing stops after an error.
    pub error: Option<io::Error>,
}

impl StdoutDac {
    pub fn new(stop: Arc<AtomicBool>) -> Self {
        Self {
            out: io::stdout().lock(),
            stop,
            error: None,
        }
    }
    fn write(&mut self, samples: &SampleBuffer) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.out.write_all(sample_bytes(samples)) {
            self.error = Some(e);
            self.stop.store(true, Ordering::Relaxed);
        }
    }
}

impl PingPongOutput for StdoutDac {
    fn activate(&mut self, primary: &SampleBuffer, alternate: &SampleBuffer) {
        self.write(primary);
        self.write(alternate);
    }
    fn refresh(&mut self, _role: BufferRole, samples: &SampleBuffer) {
        self.write(samples);
    }
}

/// Emit a completion event every time a buffer would have drained, alternating roles.
///
/// Exits once the receiving side hangs up.
pub fn spawn_pacer(
    tx: Sender<StreamEvent>,
    reload: Arc<AtomicU32>,
    clock_hz: Hz,
    pace: bool,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut role = BufferRole::Primary;
        loop {
            if pace {
                std::thread::sleep(buffer_duration(reload.load(Ordering::Relaxed), clock_hz));
            }
            if tx.send(StreamEvent::exhausted(role)).is_err() {
                break;
            }
            role = role.flip();
        }
    })
}
