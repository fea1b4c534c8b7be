//! Buffer regeneration from the waveform tables

use crate::{BUFFER_SIZE, Hz, SampleBuffer, params::GeneratorParams, params::RateMode};

/// Lowest value a sample can take before it's biased into DAC range
const CLAMP_LOW: i32 = -2047;
/// Highest value a sample can take before it's biased into DAC range
///
/// One more in magnitude than [`CLAMP_LOW`], so the biased result tops out at 4095.
const CLAMP_HIGH: i32 = 2048;
/// Added to the clamped value to bring it into the unsigned DAC input domain
const DAC_BIAS: i32 = 2047;

/// Scale and shift a raw table sample, without clamping.
///
/// `((raw - 127) * 16 * amplitude / 100) + (offset - 50) * 41`, division truncating toward zero.
#[must_use]
pub fn unclamped_sample(raw: u8, amplitude: i16, offset: i16) -> i32 {
    ((i32::from(raw) - 127) * 16 * i32::from(amplitude) / 100) + (i32::from(offset) - 50) * 41
}

/// Turn a raw table sample into a DAC sample (`0..=4095`).
#[must_use]
pub fn transform_sample(raw: u8, amplitude: i16, offset: i16) -> u16 {
    let value = unclamped_sample(raw, amplitude, offset).clamp(CLAMP_LOW, CLAMP_HIGH);
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    ((value + DAC_BIAS) as u16)
}

/// Overwrite every slot of `buf` with samples generated from `params`.
///
/// `sample_rate` is only consulted in [`RateMode::Fixed`].
///
/// # Panics
///
/// In fixed rate mode, panics if `params.frequency` is zero or greater than `sample_rate`.
/// Keeping the frequency within [`RateMode::freq_range`] and validating the
/// [`TimerConfig`](crate::TimerConfig) rules this out.
pub fn fill_buffer(params: &GeneratorParams, sample_rate: Hz, buf: &mut SampleBuffer) {
    let table = params.waveform.table();
    let (amp, off) = (params.amplitude, params.offset);
    match params.rate_mode {
        RateMode::Variable => {
            for (out, &raw) in buf.iter_mut().zip(table) {
                *out = transform_sample(raw, amp, off);
            }
        }
        RateMode::Fixed => {
            let increment = fixed_rate_increment(sample_rate, params.frequency);
            let mut src = 0;
            for out in buf.iter_mut() {
                *out = transform_sample(table[src], amp, off);
                src = (src + increment) % BUFFER_SIZE;
            }
        }
    }
}

/// How many table entries to advance per output sample at a fixed sample rate.
///
/// The integer divisions are intentionally lossy; non-integer ratios round down.
fn fixed_rate_increment(sample_rate: Hz, frequency: u16) -> usize {
    assert!(frequency != 0, "fixed rate regeneration with zero frequency");
    let samples_needed = sample_rate / Hz::from(frequency);
    assert!(
        samples_needed != 0,
        "fixed rate regeneration with frequency {frequency} above sample rate {sample_rate}"
    );
    BUFFER_SIZE / samples_needed as usize
}

#[cfg(test)]
use crate::{tables, waveform::Waveform};

#[cfg(test)]
const CD_RATE: Hz = 44_100;

#[cfg(test)]
fn render(params: &GeneratorParams) -> SampleBuffer {
    let mut buf = [0; BUFFER_SIZE];
    fill_buffer(params, CD_RATE, &mut buf);
    buf
}

#[test]
fn test_transform_matches_formula() {
    for amp in 0..=100 {
        for off in 0..=100 {
            for raw in 0..=255u8 {
                let pre = ((i32::from(raw) - 127) * 16 * i32::from(amp) / 100)
                    + (i32::from(off) - 50) * 41;
                assert_eq!(unclamped_sample(raw, amp, off), pre);
                let expected = pre.clamp(-2047, 2048) + 2047;
                assert_eq!(i32::from(transform_sample(raw, amp, off)), expected);
            }
        }
    }
}

#[test]
fn test_clamp_is_asymmetric() {
    // 128 * 16 + 50 * 41 = 4098, saturates at 2048
    assert_eq!(unclamped_sample(255, 100, 100), 4098);
    assert_eq!(transform_sample(255, 100, 100), 4095);
    // -127 * 16 - 50 * 41 = -4082, saturates at -2047
    assert_eq!(unclamped_sample(0, 100, 0), -4082);
    assert_eq!(transform_sample(0, 100, 0), 0);
    // Negative products truncate toward zero
    assert_eq!(unclamped_sample(126, 3, 50), 0);
}

#[test]
fn test_regeneration_is_repeatable() {
    for wf in Waveform::ALL {
        for rate_mode in [RateMode::Variable, RateMode::Fixed] {
            let params = GeneratorParams {
                waveform: wf,
                rate_mode,
                frequency: 1400,
                amplitude: 74,
                offset: 38,
            };
            assert_eq!(render(&params), render(&params));
        }
    }
}

#[test]
fn test_zero_amplitude_is_constant() {
    for wf in Waveform::ALL {
        for off in [0, 10, 50, 90, 100] {
            let params = GeneratorParams {
                waveform: wf,
                amplitude: 0,
                offset: off,
                ..Default::default()
            };
            let expected = ((i32::from(off) - 50) * 41).clamp(-2047, 2048) + 2047;
            assert!(
                render(&params)
                    .iter()
                    .all(|&s| i32::from(s) == expected)
            );
        }
    }
}

#[test]
fn test_full_sawtooth_is_monotonic() {
    let params = GeneratorParams {
        waveform: Waveform::Sawtooth,
        amplitude: 100,
        offset: 50,
        ..Default::default()
    };
    let buf = render(&params);
    assert!(buf.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(buf[0], 15);
    assert_eq!(buf[255], 4095);
}

#[test]
fn test_default_sine_follows_table() {
    let buf = render(&GeneratorParams::default());
    for (i, (&out, &raw)) in buf.iter().zip(&tables::SINE).enumerate() {
        assert_eq!(out, transform_sample(raw, 50, 50), "index {i}");
    }
    assert_eq!(buf[0], 2055);
    assert_eq!(buf[64], 3071);
}

#[test]
fn test_fixed_rate_steps_through_table() {
    // 44100 / 4410 = 10 samples needed, 256 / 10 = increment of 25
    let params = GeneratorParams {
        waveform: Waveform::Sawtooth,
        rate_mode: RateMode::Fixed,
        frequency: 4410,
        amplitude: 100,
        offset: 50,
    };
    let buf = render(&params);
    for (i, &out) in buf.iter().enumerate() {
        let src = (i * 25) % BUFFER_SIZE;
        #[expect(clippy::cast_possible_truncation)]
        let raw = src as u8;
        assert_eq!(out, transform_sample(raw, 100, 50), "index {i}");
    }
}

#[test]
fn test_fixed_rate_low_freq_is_constant() {
    // 44100 / 200 = 220 samples needed, increment 1: same as variable rate
    let mut params = GeneratorParams {
        rate_mode: RateMode::Fixed,
        frequency: 200,
        ..Default::default()
    };
    let fixed = render(&params);
    params.rate_mode = RateMode::Variable;
    assert_eq!(fixed, render(&params));
    // Below ~173 Hz the increment rounds down to 0
    assert_eq!(fixed_rate_increment(CD_RATE, 150), 0);
}

#[test]
#[should_panic(expected = "above sample rate")]
fn test_fixed_rate_rejects_freq_above_rate() {
    let params = GeneratorParams {
        rate_mode: RateMode::Fixed,
        frequency: 20_000,
        ..Default::default()
    };
    let mut buf = [0; BUFFER_SIZE];
    fill_buffer(&params, 8000, &mut buf);
}
