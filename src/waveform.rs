use crate::tables::{self, WaveTable};

/// Selectable output waveform
///
/// The discriminant is the index the waveform is selected by.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum Waveform {
    /// [`tables::SINE`]
    #[default]
    Sine = 0,
    /// [`tables::SQUARE`]
    Square = 1,
    /// [`tables::SAWTOOTH`]
    Sawtooth = 2,
    /// [`tables::REVERSE_SAWTOOTH`]
    ReverseSawtooth = 3,
    /// [`tables::TRIANGLE`]
    Triangle = 4,
}

impl Waveform {
    /// All waveforms, in index order
    pub const ALL: [Self; 5] = [
        Self::Sine,
        Self::Square,
        Self::Sawtooth,
        Self::ReverseSawtooth,
        Self::Triangle,
    ];
    /// Select a waveform by index. Out of range indices wrap around.
    #[must_use]
    pub const fn from_index(idx: usize) -> Self {
        Self::ALL[idx % Self::ALL.len()]
    }
    /// The index of this waveform
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
    /// The following waveform, wrapping from the last to the first
    #[must_use]
    pub const fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }
    /// The preceding waveform, wrapping from the first to the last
    #[must_use]
    pub const fn prev(self) -> Self {
        Self::from_index(self.index() + Self::ALL.len() - 1)
    }
    /// The lookup table samples are read from
    #[must_use]
    pub const fn table(self) -> &'static WaveTable {
        match self {
            Self::Sine => &tables::SINE,
            Self::Square => &tables::SQUARE,
            Self::Sawtooth => &tables::SAWTOOTH,
            Self::ReverseSawtooth => &tables::REVERSE_SAWTOOTH,
            Self::Triangle => &tables::TRIANGLE,
        }
    }
    /// Short human readable name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sine => "sine",
            Self::Square => "square",
            Self::Sawtooth => "sawtooth",
            Self::ReverseSawtooth => "reverse sawtooth",
            Self::Triangle => "triangle",
        }
    }
}

#[test]
fn test_cycles_up() {
    let mut wf = Waveform::Sine;
    let mut seen = Vec::new();
    for _ in 0..6 {
        seen.push(wf.index());
        wf = wf.next();
    }
    assert_eq!(seen, [0, 1, 2, 3, 4, 0]);
}

#[test]
fn test_cycles_down() {
    let mut wf = Waveform::Sine;
    let mut seen = Vec::new();
    for _ in 0..6 {
        seen.push(wf.index());
        wf = wf.prev();
    }
    assert_eq!(seen, [0, 4, 3, 2, 1, 0]);
}

#[test]
fn test_index_wraps() {
    assert_eq!(Waveform::from_index(5), Waveform::Sine);
    assert_eq!(Waveform::from_index(9), Waveform::Triangle);
    for wf in Waveform::ALL {
        assert_eq!(Waveform::from_index(wf.index()), wf);
    }
}
