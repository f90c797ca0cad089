//! Sample Conversion
//!
//! Pure arithmetic that turns floating point signals into device words:
//! - Affine remapping between value ranges
//! - Byte-order inversion
//! - Quantization and serialization of whole buffers

pub mod endian;
pub mod quantize;
pub mod remap;

pub use endian::{flip_endianness, to_device_order};
pub use quantize::{quantize, remap_params_for, serialize};
pub use remap::{RemapParams, SampleRemapper};
