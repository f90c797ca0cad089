//! Sample Remapper
//!
//! Linear rescaling of sample values from a source range onto a
//! destination range, paired with a change of sample type.

use num_traits::{Bounded, Float, NumCast, PrimInt};

use crate::error::{RawdeckError, Result};

// ============================================================================
// Remap Parameters
// ============================================================================

/// Bounds of an affine sample remap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemapParams {
    pub from_min: f64,
    pub from_max: f64,
    pub to_min: f64,
    pub to_max: f64,
}

impl RemapParams {
    /// Create remap bounds
    pub fn new(from_min: f64, from_max: f64, to_min: f64, to_max: f64) -> Self {
        Self {
            from_min,
            from_max,
            to_min,
            to_max,
        }
    }
}

// ============================================================================
// Sample Remapper
// ============================================================================

/// Affine transform `y = scale * x + shift`
///
/// # Example
/// ```
/// use rawdeck::dsp::{RemapParams, SampleRemapper};
///
/// let remapper = SampleRemapper::new(RemapParams::new(-1.0, 1.0, 0.0, 4095.0)).unwrap();
/// assert_eq!(remapper.apply::<f32, u16>(-1.0), 0);
/// assert_eq!(remapper.apply::<f32, u16>(1.0), 4095);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRemapper {
    scale: f64,
    shift: f64,
}

impl SampleRemapper {
    /// Create a remapper from remap bounds
    ///
    /// # Errors
    /// * `DegenerateRemapRange` - if the source range is empty or not finite
    pub fn new(params: RemapParams) -> Result<Self> {
        let from_range = params.from_max - params.from_min;
        if from_range == 0.0 || !from_range.is_finite() {
            return Err(RawdeckError::DegenerateRemapRange {
                from_min: params.from_min,
                from_max: params.from_max,
            });
        }

        let scale = (params.to_max - params.to_min) / from_range;
        let shift = params.to_min - params.from_min * scale;
        Ok(Self { scale, shift })
    }

    /// Multiplier of the transform
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Offset of the transform
    pub fn shift(&self) -> f64 {
        self.shift
    }

    /// Map a floating point sample to the destination type
    ///
    /// The result is rounded to the nearest integer and saturates at the
    /// bounds of `To`.
    #[inline]
    pub fn apply<From, To>(&self, sample: From) -> To
    where
        From: Float,
        To: PrimInt + Bounded,
    {
        let x = sample.to_f64().unwrap_or(0.0);
        let y = (self.scale * x + self.shift).round();
        saturating_cast(y)
    }
}

/// Convert `value` to `To`, clamping to its bounds
fn saturating_cast<To: PrimInt + Bounded>(value: f64) -> To {
    if value.is_nan() {
        return To::zero();
    }
    match <To as NumCast>::from(value) {
        Some(v) => v,
        None if value < 0.0 => To::min_value(),
        None => To::max_value(),
    }
}
