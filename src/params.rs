use {crate::waveform::Waveform, std::ops::RangeInclusive};

/// How the output frequency is controlled
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub enum RateMode {
    /// The timer runs at `frequency * BUFFER_SIZE`, and every buffer holds one
    /// full period of the waveform table.
    #[default]
    Variable,
    /// The timer runs at a constant sample rate, and the frequency decides how
    /// many table entries are skipped per output sample.
    Fixed,
}

impl RateMode {
    /// Valid frequency range in this mode
    #[must_use]
    pub const fn freq_range(self) -> RangeInclusive<u16> {
        match self {
            Self::Variable => GeneratorParams::VARIABLE_FREQ_RANGE,
            Self::Fixed => GeneratorParams::FIXED_FREQ_RANGE,
        }
    }
    /// How much a single frequency adjustment changes the frequency in this mode
    #[must_use]
    pub const fn freq_step(self) -> u16 {
        match self {
            Self::Variable => 50,
            Self::Fixed => 200,
        }
    }
    /// The other mode
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Variable => Self::Fixed,
            Self::Fixed => Self::Variable,
        }
    }
}

/// User adjustable parameters of the generated signal
///
/// Changes take effect the next time a buffer is regenerated.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct GeneratorParams {
    /// Which table samples are read from
    pub waveform: Waveform,
    /// Output frequency in Hz
    ///
    /// Must stay within [`RateMode::freq_range`] of `rate_mode`.
    pub frequency: u16,
    /// Amplitude in percent (`0..=100`)
    pub amplitude: i16,
    /// DC offset (`0..=100`), 50 being centered
    pub offset: i16,
    /// Whether the sample rate is fixed or follows the frequency
    pub rate_mode: RateMode,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            frequency: Self::DEFAULT_FREQ,
            amplitude: 50,
            offset: 50,
            rate_mode: RateMode::Variable,
        }
    }
}

impl GeneratorParams {
    /// Frequency used at startup, and when switching back to variable rate
    pub const DEFAULT_FREQ: u16 = 1000;
    /// Frequency range in [`RateMode::Variable`]
    pub const VARIABLE_FREQ_RANGE: RangeInclusive<u16> = 50..=1700;
    /// Frequency range in [`RateMode::Fixed`]
    pub const FIXED_FREQ_RANGE: RangeInclusive<u16> = 200..=20_000;
    /// Amplitude must be within this range
    pub const AMP_VALID_RANGE: RangeInclusive<i16> = 0..=100;
    /// Offset must be within this range
    pub const OFFSET_VALID_RANGE: RangeInclusive<i16> = 0..=100;
    /// How much a single button press changes amplitude or offset
    pub const LEVEL_STEP: i16 = 2;

    /// Whether every field is within its valid range
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.rate_mode.freq_range().contains(&self.frequency)
            && Self::AMP_VALID_RANGE.contains(&self.amplitude)
            && Self::OFFSET_VALID_RANGE.contains(&self.offset)
    }
    /// Raise frequency by one step, saturating at the top of the current mode's range
    pub fn freq_up(&mut self) {
        let range = self.rate_mode.freq_range();
        self.frequency = self
            .frequency
            .saturating_add(self.rate_mode.freq_step())
            .min(*range.end());
    }
    /// Lower frequency by one step, saturating at the bottom of the current mode's range
    pub fn freq_down(&mut self) {
        let range = self.rate_mode.freq_range();
        self.frequency = self
            .frequency
            .saturating_sub(self.rate_mode.freq_step())
            .max(*range.start());
    }
    /// Switch between fixed and variable sample rate.
    ///
    /// Going to variable rate resets the frequency to [`Self::DEFAULT_FREQ`], so the timer
    /// reload value can't end up as zero.
    /// Going to fixed rate pulls the frequency into [`Self::FIXED_FREQ_RANGE`].
    pub fn toggle_rate_mode(&mut self) {
        self.rate_mode = self.rate_mode.toggled();
        match self.rate_mode {
            RateMode::Variable => self.frequency = Self::DEFAULT_FREQ,
            RateMode::Fixed => {
                let range = Self::FIXED_FREQ_RANGE;
                self.frequency = self.frequency.clamp(*range.start(), *range.end());
            }
        }
    }
    /// Adjust amplitude by `delta`, clamped to [`Self::AMP_VALID_RANGE`]
    pub fn nudge_amplitude(&mut self, delta: i16) {
        let range = Self::AMP_VALID_RANGE;
        self.amplitude = self
            .amplitude
            .saturating_add(delta)
            .clamp(*range.start(), *range.end());
    }
    /// Adjust offset by `delta`, clamped to [`Self::OFFSET_VALID_RANGE`]
    pub fn nudge_offset(&mut self, delta: i16) {
        let range = Self::OFFSET_VALID_RANGE;
        self.offset = self
            .offset
            .saturating_add(delta)
            .clamp(*range.start(), *range.end());
    }
}

#[test]
fn test_defaults_are_valid() {
    let p = GeneratorParams::default();
    assert!(p.is_valid());
    assert_eq!(p.frequency, 1000);
    assert_eq!(p.rate_mode, RateMode::Variable);
}

#[test]
fn test_variable_freq_saturates() {
    let mut p = GeneratorParams::default();
    for _ in 0..100 {
        p.freq_up();
    }
    assert_eq!(p.frequency, 1700);
    for _ in 0..100 {
        p.freq_down();
    }
    assert_eq!(p.frequency, 50);
}

#[test]
fn test_fixed_freq_saturates() {
    let mut p = GeneratorParams {
        rate_mode: RateMode::Fixed,
        ..Default::default()
    };
    p.freq_up();
    assert_eq!(p.frequency, 1200);
    for _ in 0..200 {
        p.freq_up();
    }
    assert_eq!(p.frequency, 20_000);
    for _ in 0..200 {
        p.freq_down();
    }
    assert_eq!(p.frequency, 200);
}

#[test]
fn test_toggle_resets_or_clamps_freq() {
    let mut p = GeneratorParams {
        frequency: 50,
        ..Default::default()
    };
    p.toggle_rate_mode();
    assert_eq!(p.rate_mode, RateMode::Fixed);
    assert_eq!(p.frequency, 200);
    p.frequency = 15_000;
    p.toggle_rate_mode();
    assert_eq!(p.rate_mode, RateMode::Variable);
    assert_eq!(p.frequency, GeneratorParams::DEFAULT_FREQ);
    assert!(p.is_valid());
}

#[test]
fn test_levels_clamp() {
    let mut p = GeneratorParams::default();
    for _ in 0..40 {
        p.nudge_amplitude(2);
        p.nudge_offset(-2);
    }
    assert_eq!(p.amplitude, 100);
    assert_eq!(p.offset, 0);
    p.nudge_amplitude(-2);
    assert_eq!(p.amplitude, 98);
}
