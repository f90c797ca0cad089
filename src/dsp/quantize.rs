//! Quantization of mono signals into raw device words
//!
//! Chooses the remap source bounds for a buffer according to the
//! configured [`RangeStrategy`], maps every sample into the output word
//! type, and serializes the words in the device byte order.

use log::debug;
use num_traits::{PrimInt, ToBytes};

use crate::config::{ConvertConfig, RangeStrategy, WordSize, NOMINAL_SAMPLE_MAX, NOMINAL_SAMPLE_MIN};
use crate::dsp::endian::to_device_order;
use crate::dsp::remap::{RemapParams, SampleRemapper};
use crate::engine::SignalBuffer;
use crate::error::Result;

/// Pick the remap bounds for one buffer
///
/// `Fixed` reuses the configured source bounds. `Enlarge` uses the
/// buffer's own minimum and maximum so the signal spans the full output
/// range. An empty buffer has nothing to observe and falls back to the
/// nominal bounds.
pub fn remap_params_for(strategy: RangeStrategy, buffer: &SignalBuffer, to_min: f64, to_max: f64) -> RemapParams {
    let (from_min, from_max) = match strategy {
        RangeStrategy::Fixed { from_min, from_max } => (from_min, from_max),
        RangeStrategy::Enlarge => buffer
            .min_max()
            .map(|(min, max)| (min as f64, max as f64))
            .unwrap_or((NOMINAL_SAMPLE_MIN, NOMINAL_SAMPLE_MAX)),
    };
    RemapParams::new(from_min, from_max, to_min, to_max)
}

/// Convert a buffer to raw words as configured
///
/// # Errors
/// * `DegenerateRemapRange` - in enlarge mode, when every sample in the
///   buffer has the same value
pub fn quantize(buffer: &SignalBuffer, config: &ConvertConfig) -> Result<Vec<u8>> {
    let params = remap_params_for(
        config.strategy,
        buffer,
        config.range.min as f64,
        config.range.max as f64,
    );
    let remapper = SampleRemapper::new(params)?;
    debug!(
        "Remapping [{}, {}] onto [{}, {}] (scale {}, shift {})",
        params.from_min,
        params.from_max,
        params.to_min,
        params.to_max,
        remapper.scale(),
        remapper.shift()
    );
    let swap = config.byte_order.needs_swap();

    let bytes = match config.word_size {
        WordSize::One => serialize::<u8>(buffer.samples(), &remapper, swap),
        WordSize::Two => serialize::<u16>(buffer.samples(), &remapper, swap),
        WordSize::Four => serialize::<u32>(buffer.samples(), &remapper, swap),
        WordSize::Eight => serialize::<u64>(buffer.samples(), &remapper, swap),
    };
    Ok(bytes)
}

/// Remap samples into `W` words and lay them out as bytes
pub fn serialize<W>(samples: &[f32], remapper: &SampleRemapper, swap: bool) -> Vec<u8>
where
    W: PrimInt + ToBytes,
{
    let word_bytes = std::mem::size_of::<W>();
    let mut out = Vec::with_capacity(samples.len() * word_bytes);
    for &sample in samples {
        let word: W = to_device_order(remapper.apply(sample), swap);
        out.extend_from_slice(word.to_ne_bytes().as_ref());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ByteOrder, Defaults};
    use std::path::PathBuf;

    fn config(values: Defaults) -> ConvertConfig {
        ConvertConfig::build(PathBuf::from("/dev/sdb1"), vec![PathBuf::from("a.wav")], values).unwrap()
    }

    #[test]
    fn test_fixed_strategy_ignores_signal() {
        let buffer = SignalBuffer::new(vec![0.1, 0.2], 44100);
        let params = remap_params_for(RangeStrategy::default(), &buffer, 0.0, 10.0);
        assert_eq!(params, RemapParams::new(-1.0, 1.0, 0.0, 10.0));
    }

    #[test]
    fn test_enlarge_strategy_uses_observed_bounds() {
        let buffer = SignalBuffer::new(vec![0.25, -0.5, 0.0], 44100);
        let params = remap_params_for(RangeStrategy::Enlarge, &buffer, 0.0, 10.0);
        assert_eq!(params, RemapParams::new(-0.5, 0.25, 0.0, 10.0));
    }

    #[test]
    fn test_enlarge_strategy_on_empty_buffer() {
        let buffer = SignalBuffer::new(Vec::new(), 44100);
        let params = remap_params_for(RangeStrategy::Enlarge, &buffer, 0.0, 10.0);
        assert_eq!(params.from_min, -1.0);
        assert_eq!(params.from_max, 1.0);
    }

    #[test]
    fn test_quantize_word_count_and_size() {
        let buffer = SignalBuffer::new(vec![-1.0, 0.0, 1.0], 44100);
        for (word_size, bit_depth) in [(1u8, 8u32), (2, 12), (4, 24), (8, 48)] {
            let bytes = quantize(
                &buffer,
                &config(Defaults {
                    word_size: Some(word_size),
                    bit_depth: Some(bit_depth),
                    ..Default::default()
                }),
            )
            .unwrap();
            assert_eq!(bytes.len(), 3 * word_size as usize);
        }
    }

    #[test]
    fn test_quantize_fixed_range_values() {
        let buffer = SignalBuffer::new(vec![-1.0, 1.0], 44100);
        let bytes = quantize(&buffer, &config(Defaults::default())).unwrap();
        let words: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| u16::from_ne_bytes([c[0], c[1]]))
            .collect();
        assert_eq!(words, vec![0, 4095]);
    }

    #[test]
    fn test_quantize_big_endian_layout() {
        let buffer = SignalBuffer::new(vec![1.0], 44100);
        let bytes = quantize(
            &buffer,
            &config(Defaults {
                byte_order: Some(ByteOrder::Big),
                ..Default::default()
            }),
        )
        .unwrap();
        assert_eq!(bytes, 4095u16.to_be_bytes().to_vec());

        let bytes = quantize(
            &buffer,
            &config(Defaults {
                byte_order: Some(ByteOrder::Little),
                ..Default::default()
            }),
        )
        .unwrap();
        assert_eq!(bytes, 4095u16.to_le_bytes().to_vec());
    }

    #[test]
    fn test_quantize_enlarge_fills_output_range() {
        let buffer = SignalBuffer::new(vec![-0.1, 0.05, 0.2], 44100);
        let bytes = quantize(
            &buffer,
            &config(Defaults {
                enlarge: Some(true),
                ..Default::default()
            }),
        )
        .unwrap();
        let words: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| u16::from_ne_bytes([c[0], c[1]]))
            .collect();
        assert_eq!(words[0], 0);
        assert_eq!(words[2], 4095);
    }

    #[test]
    fn test_quantize_enlarge_constant_signal_fails() {
        let buffer = SignalBuffer::new(vec![0.3; 16], 44100);
        let err = quantize(
            &buffer,
            &config(Defaults {
                enlarge: Some(true),
                ..Default::default()
            }),
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "DEGENERATE_REMAP_RANGE");
    }
}
