//! Conversion configuration
//!
//! A [`ConvertConfig`] is built once per run from command-line arguments
//! (optionally layered over a JSON defaults file), validated, and then
//! handed read-only to the write pipeline.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RawdeckError, Result};

// ============================================================================
// Defaults
// ============================================================================

/// Default number of bytes per written word
pub const DEFAULT_WORD_SIZE: u8 = 2;

/// Default number of significant bits within a word
pub const DEFAULT_BIT_DEPTH: u32 = 12;

/// Default output sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: u32 = 44000;

/// Filesystem the playback unit can read
pub const DEFAULT_FILESYSTEM: &str = "vfat";

/// Extension given to every written file
pub const DEFAULT_EXTENSION: &str = "raw";

/// Nominal range of decoded floating point samples
pub const NOMINAL_SAMPLE_MIN: f64 = -1.0;
/// Nominal range of decoded floating point samples
pub const NOMINAL_SAMPLE_MAX: f64 = 1.0;

// ============================================================================
// Word Size
// ============================================================================

/// Number of bytes used to store one output sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordSize {
    One,
    Two,
    Four,
    Eight,
}

impl WordSize {
    /// Create a word size from a byte count
    pub fn from_bytes(bytes: u8) -> Result<Self> {
        match bytes {
            1 => Ok(WordSize::One),
            2 => Ok(WordSize::Two),
            4 => Ok(WordSize::Four),
            8 => Ok(WordSize::Eight),
            _ => Err(RawdeckError::UnrecognizedConfiguration {
                reason: format!("Cannot convert audio samples to a word size of {} bytes", bytes),
            }),
        }
    }

    /// Bytes per word
    pub fn bytes(&self) -> usize {
        match self {
            WordSize::One => 1,
            WordSize::Two => 2,
            WordSize::Four => 4,
            WordSize::Eight => 8,
        }
    }

    /// Bits per word
    pub fn bits(&self) -> u32 {
        self.bytes() as u32 * 8
    }
}

// ============================================================================
// Byte Order
// ============================================================================

/// Byte order of words written to the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    /// Whatever the host uses
    #[default]
    Native,
    Little,
    Big,
}

impl ByteOrder {
    /// Whether words must be byte-swapped relative to the host's layout
    pub fn needs_swap(&self) -> bool {
        match self {
            ByteOrder::Native => false,
            ByteOrder::Little => cfg!(target_endian = "big"),
            ByteOrder::Big => cfg!(target_endian = "little"),
        }
    }
}

impl std::str::FromStr for ByteOrder {
    type Err = RawdeckError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "native" => Ok(ByteOrder::Native),
            "little" | "le" => Ok(ByteOrder::Little),
            "big" | "be" => Ok(ByteOrder::Big),
            other => Err(RawdeckError::UnrecognizedConfiguration {
                reason: format!("Unknown byte order '{}' (expected native, little or big)", other),
            }),
        }
    }
}

// ============================================================================
// Range Strategy
// ============================================================================

/// How the source bounds of the sample remap are chosen
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeStrategy {
    /// Map a fixed source range onto the output range
    Fixed { from_min: f64, from_max: f64 },
    /// Map each buffer's observed minimum and maximum onto the output range
    Enlarge,
}

impl Default for RangeStrategy {
    fn default() -> Self {
        RangeStrategy::Fixed {
            from_min: NOMINAL_SAMPLE_MIN,
            from_max: NOMINAL_SAMPLE_MAX,
        }
    }
}

/// Inclusive range of unsigned output values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputRange {
    pub min: u64,
    pub max: u64,
}

impl OutputRange {
    /// Largest value representable with `bit_depth` bits
    pub fn full_scale(bit_depth: u32) -> Self {
        let max = if bit_depth >= 64 {
            u64::MAX
        } else {
            (1u64 << bit_depth) - 1
        };
        OutputRange { min: 0, max }
    }

    /// Parse a `min,max` pair
    pub fn parse(s: &str) -> Result<Self> {
        let (min, max) = s.split_once(',').ok_or_else(|| RawdeckError::UnrecognizedConfiguration {
            reason: format!("The provided output range does not contain a comma: {}", s),
        })?;
        let parse = |v: &str| {
            v.trim().parse::<u64>().map_err(|e| RawdeckError::UnrecognizedConfiguration {
                reason: format!("Failed parsing '{}' to an unsigned integer for the output range: {}", v, e),
            })
        };
        Ok(OutputRange {
            min: parse(min)?,
            max: parse(max)?,
        })
    }
}

// ============================================================================
// Defaults File
// ============================================================================

/// Optional defaults loaded from a JSON file
///
/// Every field may be omitted. Values given on the command line take
/// precedence over values from this file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Defaults {
    pub word_size: Option<u8>,
    pub bit_depth: Option<u32>,
    pub sample_rate: Option<u32>,
    pub range_min: Option<u64>,
    pub range_max: Option<u64>,
    pub enlarge: Option<bool>,
    pub byte_order: Option<ByteOrder>,
    pub filesystem: Option<String>,
    pub extension: Option<String>,
}

impl Defaults {
    /// Load defaults from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| RawdeckError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| RawdeckError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Overlay `other` on top of `self`; fields set in `other` win
    pub fn merged(self, other: Defaults) -> Defaults {
        Defaults {
            word_size: other.word_size.or(self.word_size),
            bit_depth: other.bit_depth.or(self.bit_depth),
            sample_rate: other.sample_rate.or(self.sample_rate),
            range_min: other.range_min.or(self.range_min),
            range_max: other.range_max.or(self.range_max),
            enlarge: other.enlarge.or(self.enlarge),
            byte_order: other.byte_order.or(self.byte_order),
            filesystem: other.filesystem.or(self.filesystem),
            extension: other.extension.or(self.extension),
        }
    }
}

// ============================================================================
// Convert Config
// ============================================================================

/// Immutable configuration of one conversion-and-write run
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertConfig {
    /// Destination block device (first partition of the card)
    pub block_device: PathBuf,
    /// Input audio files, written in this order
    pub audio_files: Vec<PathBuf>,
    /// Bytes per output word
    pub word_size: WordSize,
    /// Significant bits within each word
    pub bit_depth: u32,
    /// Output value range
    pub range: OutputRange,
    /// How source bounds are chosen
    pub strategy: RangeStrategy,
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Byte order of written words
    pub byte_order: ByteOrder,
    /// Filesystem the destination must be formatted with
    pub filesystem: String,
    /// Extension of written files
    pub extension: String,
}

impl ConvertConfig {
    /// Build and validate a configuration
    ///
    /// # Errors
    /// * `UnrecognizedConfiguration` - if any value is out of range or the
    ///   values are inconsistent with each other
    pub fn build(block_device: PathBuf, audio_files: Vec<PathBuf>, values: Defaults) -> Result<Self> {
        let word_size = WordSize::from_bytes(values.word_size.unwrap_or(DEFAULT_WORD_SIZE))?;
        let bit_depth = values
            .bit_depth
            .unwrap_or_else(|| DEFAULT_BIT_DEPTH.min(word_size.bits()));
        let full_scale = OutputRange::full_scale(bit_depth.min(64));
        let range = OutputRange {
            min: values.range_min.unwrap_or(full_scale.min),
            max: values.range_max.unwrap_or(full_scale.max),
        };
        let strategy = if values.enlarge.unwrap_or(false) {
            RangeStrategy::Enlarge
        } else {
            RangeStrategy::default()
        };

        let config = ConvertConfig {
            block_device,
            audio_files,
            word_size,
            bit_depth,
            range,
            strategy,
            sample_rate: values.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE),
            byte_order: values.byte_order.unwrap_or_default(),
            filesystem: values
                .filesystem
                .unwrap_or_else(|| DEFAULT_FILESYSTEM.to_string()),
            extension: values
                .extension
                .unwrap_or_else(|| DEFAULT_EXTENSION.to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency of the configuration
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(RawdeckError::UnrecognizedConfiguration { reason });

        if self.bit_depth == 0 || self.bit_depth > self.word_size.bits() {
            return invalid(format!(
                "A bit depth of {} cannot be stored in a {} byte word",
                self.bit_depth,
                self.word_size.bytes()
            ));
        }

        if self.range.min > self.range.max {
            return invalid(format!(
                "The output range was specified in reverse order. Was '{},{}', should be '{},{}'",
                self.range.min, self.range.max, self.range.max, self.range.min
            ));
        }

        let bit_max = OutputRange::full_scale(self.bit_depth).max;
        if self.range.max > bit_max {
            return invalid(format!(
                "The output range maximum {} exceeds the largest {}-bit value {}",
                self.range.max, self.bit_depth, bit_max
            ));
        }

        if self.sample_rate == 0 {
            return invalid("The sample rate must be greater than zero".to_string());
        }

        if self.extension.is_empty() || self.extension.contains(['/', '.']) {
            return invalid(format!("Invalid output extension '{}'", self.extension));
        }

        if self.audio_files.is_empty() {
            return invalid("At least one input audio file must be provided".to_string());
        }

        let mut seen: HashMap<PathBuf, &Path> = HashMap::new();
        for input in &self.audio_files {
            let output = self.output_file_name(input)?;
            if let Some(previous) = seen.insert(output.clone(), input) {
                return invalid(format!(
                    "{} and {} would both be written to {}",
                    previous.display(),
                    input.display(),
                    output.display()
                ));
            }
        }

        Ok(())
    }

    /// File name an input is written under on the device
    ///
    /// Only the last extension of the input's file name is replaced, so
    /// `take.02.wav` becomes `take.02.raw`.
    pub fn output_file_name(&self, input: &Path) -> Result<PathBuf> {
        let name = input
            .file_name()
            .ok_or_else(|| RawdeckError::UnrecognizedConfiguration {
                reason: format!("Cannot derive an output name from {}", input.display()),
            })?;
        Ok(PathBuf::from(name).with_extension(&self.extension))
    }
}
