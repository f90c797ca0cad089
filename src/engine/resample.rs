//! Audio resampling using rubato
//!
//! Converts a mono signal to the configured output sample rate with a
//! band-limited sinc interpolator. The whole signal is streamed through
//! the resampler in fixed chunks, the filter delay is discarded, and the
//! result is trimmed to `ceil(target / source * frames)` frames or to
//! however many frames the resampler actually produced, whichever is
//! smaller.

use std::path::Path;

use log::debug;
use rubato::{
    Resampler as RubatoResampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType,
    WindowFunction,
};

use crate::engine::buffer::SignalBuffer;
use crate::error::{RawdeckError, Result};

/// Frames fed to the resampler per call
const CHUNK_FRAMES: usize = 1024;

/// Sinc resampler wrapper with a uniform `(signal, rate) -> signal` shape
pub struct Resampler;

impl Resampler {
    /// Resample a signal to `target_rate`
    ///
    /// # Arguments
    /// - `buffer`: Mono signal to resample
    /// - `target_rate`: Output sample rate in Hz
    ///
    /// # Returns
    /// A new buffer at `target_rate`. If the buffer is already at that
    /// rate an identical copy is returned without resampling.
    ///
    /// # Errors
    /// `ResampleFailure` if either rate is zero or the resampler fails
    pub fn resample(buffer: &SignalBuffer, target_rate: u32) -> Result<SignalBuffer> {
        let source_rate = buffer.sample_rate();
        if source_rate == target_rate {
            debug!("Sample rate already at {}Hz, skipping resample", target_rate);
            return Ok(buffer.clone());
        }

        let fail = |reason: String| RawdeckError::ResampleFailure {
            path: Path::new("<signal>").to_path_buf(),
            reason,
        };

        if source_rate == 0 || target_rate == 0 {
            return Err(fail(format!(
                "cannot resample from {}Hz to {}Hz",
                source_rate, target_rate
            )));
        }

        if buffer.is_empty() {
            return Ok(SignalBuffer::new(Vec::new(), target_rate));
        }

        let ratio = target_rate as f64 / source_rate as f64;
        let expected_frames = expected_frame_count(buffer.len(), source_rate, target_rate);

        debug!(
            "Resampling {} frames from {}Hz to {}Hz (expecting {} frames)",
            buffer.len(),
            source_rate,
            target_rate,
            expected_frames
        );

        let mut resampler = Self::create_resampler(ratio)
            .map_err(|e| fail(format!("failed to create resampler: {}", e)))?;

        let delay = resampler.output_delay();
        let wanted = delay + expected_frames;
        let mut generated: Vec<f32> = Vec::with_capacity(wanted + CHUNK_FRAMES);
        let mut chunk = vec![vec![0.0f32; CHUNK_FRAMES]; 1];

        // Feed the signal, then silence until the delayed tail is flushed
        let mut pos = 0;
        while generated.len() < wanted {
            let end = (pos + CHUNK_FRAMES).min(buffer.len());
            let frames_in = end.saturating_sub(pos);
            chunk[0][..frames_in].copy_from_slice(&buffer.samples()[pos.min(end)..end]);
            chunk[0][frames_in..].fill(0.0);

            let out = resampler
                .process(&chunk, None)
                .map_err(|e| fail(format!("resampling failed: {}", e)))?;
            if out[0].is_empty() {
                break;
            }
            generated.extend_from_slice(&out[0]);
            pos = end;
        }

        let start = delay.min(generated.len());
        let available = generated.len() - start;
        let frames = expected_frames.min(available);
        let samples = generated[start..start + frames].to_vec();

        debug!("Resampled to {} frames", samples.len());

        Ok(SignalBuffer::new(samples, target_rate))
    }

    /// Resample a signal read from `path`, naming the file in any error
    pub fn resample_file(path: &Path, buffer: &SignalBuffer, target_rate: u32) -> Result<SignalBuffer> {
        Self::resample(buffer, target_rate).map_err(|e| match e {
            RawdeckError::ResampleFailure { reason, .. } => RawdeckError::ResampleFailure {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Create the highest quality sinc resampler
    fn create_resampler(ratio: f64) -> std::result::Result<SincFixedIn<f32>, rubato::ResamplerConstructionError> {
        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Cubic,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };

        SincFixedIn::<f32>::new(ratio, 1.0, params, CHUNK_FRAMES, 1)
    }
}

/// `ceil(frames * target / source)` without float rounding
fn expected_frame_count(frames: usize, source_rate: u32, target_rate: u32) -> usize {
    let source = source_rate as u128;
    ((frames as u128 * target_rate as u128 + source - 1) / source) as usize
}
