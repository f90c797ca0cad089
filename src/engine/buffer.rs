//! Signal Buffer
//!
//! In-memory mono signal produced by the decoder. Stereo input is folded
//! to mono before a buffer is created, so a buffer always holds a whole
//! number of frames.

// ============================================================================
// Midpoint
// ============================================================================

/// Numeric midpoint of two samples without intermediate overflow
pub trait Midpoint: Copy {
    fn midpoint(self, other: Self) -> Self;
}

macro_rules! impl_int_midpoint {
    ($($t:ty => $wide:ty),*) => {
        $(
            impl Midpoint for $t {
                /// Rounds towards negative infinity
                #[inline]
                fn midpoint(self, other: Self) -> Self {
                    ((self as $wide + other as $wide) >> 1) as $t
                }
            }
        )*
    };
}

impl_int_midpoint!(i16 => i32, i32 => i64);

macro_rules! impl_float_midpoint {
    ($($t:ty),*) => {
        $(
            impl Midpoint for $t {
                #[inline]
                fn midpoint(self, other: Self) -> Self {
                    self * 0.5 + other * 0.5
                }
            }
        )*
    };
}

impl_float_midpoint!(f32);

// ============================================================================
// Downmix
// ============================================================================

/// Fold interleaved stereo samples to mono in place
///
/// Each `(L, R)` frame becomes `midpoint(L, R)`. A trailing half frame
/// (left sample without its right partner) is dropped, so the result has
/// exactly `samples.len() / 2` samples.
pub fn downmix_stereo<T: Midpoint>(samples: &mut Vec<T>) {
    let frames = samples.len() / 2;
    for frame in 0..frames {
        samples[frame] = samples[2 * frame].midpoint(samples[2 * frame + 1]);
    }
    samples.truncate(frames);
}

// ============================================================================
// Signal Buffer
// ============================================================================

/// Mono floating point signal with its sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct SignalBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl SignalBuffer {
    /// Create a buffer from mono samples
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Create a buffer from interleaved samples with 1 or 2 channels
    ///
    /// Returns `None` for any other channel count.
    pub fn from_interleaved(mut samples: Vec<f32>, channels: u16, sample_rate: u32) -> Option<Self> {
        match channels {
            1 => {}
            2 => downmix_stereo(&mut samples),
            _ => return None,
        }
        Some(Self::new(samples, sample_rate))
    }

    /// Sample data
    #[inline]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples (equal to the number of frames)
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the buffer has no samples
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Smallest and largest sample, ignoring NaN
    ///
    /// Returns `None` for an empty buffer.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        self.samples
            .iter()
            .copied()
            .filter(|s| !s.is_nan())
            .fold(None, |acc, s| match acc {
                None => Some((s, s)),
                Some((lo, hi)) => Some((lo.min(s), hi.max(s))),
            })
    }
}
