//! Error handling for rawdeck
//!
//! Every stage of the conversion pipeline returns a single descriptive
//! failure. Each error names the offending file or device and carries the
//! underlying system error where there is one.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for rawdeck operations
pub type Result<T> = std::result::Result<T, RawdeckError>;

/// Failure categories reported by the decode service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// The file is not in a format the decoder recognizes
    UnrecognizedFormat,
    /// The operating system failed to read the file
    System,
    /// The container is recognized but its structure is broken
    Malformed,
    /// The container is valid but its sample encoding is not supported
    UnsupportedEncoding,
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            DecodeErrorKind::UnrecognizedFormat => "file format not recognised",
            DecodeErrorKind::System => "system error",
            DecodeErrorKind::Malformed => "malformed file",
            DecodeErrorKind::UnsupportedEncoding => "unsupported encoding",
        };
        f.write_str(msg)
    }
}

/// Main error type for rawdeck operations
#[derive(Error, Debug)]
pub enum RawdeckError {
    // Decode Errors
    #[error("Unsupported number of channels in {path}: {channels}. Audio files must have 1 or 2 channels")]
    UnsupportedChannelCount { path: PathBuf, channels: u16 },

    #[error("Hit EOF while loading {path}: decoded {decoded} of {expected} samples")]
    TruncatedDecode {
        path: PathBuf,
        decoded: usize,
        expected: usize,
    },

    #[error("An error occurred while loading {path}: {kind}: {reason}")]
    DecodeFailure {
        path: PathBuf,
        kind: DecodeErrorKind,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Signal Errors
    #[error("Failed to resample {path}: {reason}")]
    ResampleFailure { path: PathBuf, reason: String },

    #[error("Cannot create a sample remapper for samples without a range of possible values. Range: ({from_min} -> {from_max})")]
    DegenerateRemapRange { from_min: f64, from_max: f64 },

    // Device Errors
    #[error("The block device {path} could not be inspected: {source}")]
    DeviceInaccessible {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("The file {path} is not a block device")]
    NotABlockDevice { path: PathBuf },

    #[error("The block device {path} is part of a drive without partitions. The playback unit reads from partition 1 of its storage device")]
    NoPartitions { path: PathBuf },

    #[error("The block device {path} must refer to the first partition of its drive, {expected}")]
    WrongPartition { path: PathBuf, expected: PathBuf },

    #[error("The device {path} is not mounted")]
    NotMounted { path: PathBuf },

    #[error("The block device {path} is formatted with the {fs_name} filesystem. It must be formatted with {required}")]
    UnsupportedFilesystem {
        path: PathBuf,
        fs_name: String,
        required: String,
    },

    #[error("Failed to read system table {path}: {source}")]
    TableRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Storage Errors
    #[error("Insufficient space on {mount_point}: needed {needed_bytes} bytes, available {available_bytes} bytes")]
    InsufficientSpace {
        mount_point: PathBuf,
        needed_bytes: u64,
        available_bytes: u64,
    },

    #[error("Failed to write {path}: {source}")]
    WriteIoFailure {
        path: PathBuf,
        written: Vec<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    // Configuration Errors
    #[error("Unrecognized configuration: {reason}")]
    UnrecognizedConfiguration { reason: String },

    #[error("Failed to read configuration file {path}: {reason}")]
    ConfigFile { path: PathBuf, reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RawdeckError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            RawdeckError::UnsupportedChannelCount { .. } => "UNSUPPORTED_CHANNEL_COUNT",
            RawdeckError::TruncatedDecode { .. } => "TRUNCATED_DECODE",
            RawdeckError::DecodeFailure { .. } => "DECODE_FAILURE",
            RawdeckError::ResampleFailure { .. } => "RESAMPLE_FAILURE",
            RawdeckError::DegenerateRemapRange { .. } => "DEGENERATE_REMAP_RANGE",
            RawdeckError::DeviceInaccessible { .. } => "DEVICE_INACCESSIBLE",
            RawdeckError::NotABlockDevice { .. } => "NOT_A_BLOCK_DEVICE",
            RawdeckError::NoPartitions { .. } => "NO_PARTITIONS",
            RawdeckError::WrongPartition { .. } => "WRONG_PARTITION",
            RawdeckError::NotMounted { .. } => "NOT_MOUNTED",
            RawdeckError::UnsupportedFilesystem { .. } => "UNSUPPORTED_FILESYSTEM",
            RawdeckError::TableRead { .. } => "TABLE_READ",
            RawdeckError::InsufficientSpace { .. } => "INSUFFICIENT_SPACE",
            RawdeckError::WriteIoFailure { .. } => "WRITE_IO_FAILURE",
            RawdeckError::UnrecognizedConfiguration { .. } => "UNRECOGNIZED_CONFIGURATION",
            RawdeckError::ConfigFile { .. } => "CONFIG_FILE",
            RawdeckError::Io(_) => "IO_ERROR",
            RawdeckError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Warnings are reported to the user but never abort a run
    pub fn is_warning(&self) -> bool {
        matches!(self, RawdeckError::TruncatedDecode { .. })
    }

    /// Returns a user-friendly recovery suggestion.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            RawdeckError::UnsupportedChannelCount { .. } => {
                Some("Convert the file to mono or stereo before writing it.")
            }
            RawdeckError::DecodeFailure { .. } => {
                Some("Check that the file is a valid WAV file and plays in another application.")
            }
            RawdeckError::WrongPartition { .. } | RawdeckError::NoPartitions { .. } => {
                Some("Partition the card so the playback data lives on partition 1.")
            }
            RawdeckError::NotMounted { .. } => Some("Mount the partition and try again."),
            RawdeckError::UnsupportedFilesystem { .. } => {
                Some("Reformat the partition with the required filesystem.")
            }
            RawdeckError::InsufficientSpace { .. } => {
                Some("Free up space on the card or write fewer files.")
            }
            RawdeckError::WriteIoFailure { .. } => {
                Some("Files written before the failure were left in place.")
            }
            _ => None,
        }
    }
}
