//! Block device validation
//!
//! A playback unit reads its audio from the first partition of its storage
//! card, so before anything is written the destination is checked to be:
//!
//! 1. an existing block special file,
//! 2. the first partition of its drive,
//! 3. currently mounted,
//! 4. formatted with the required filesystem.
//!
//! Checks run in that order and stop at the first failure.

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Serialize;

use crate::device::inspect::DeviceInspector;
use crate::device::mounts::{parse_mount_table, Mounting, Mountings};
use crate::device::partitions::drive_partitions;
use crate::error::{RawdeckError, Result};

/// Check that `device` can receive audio files and return its mounting
///
/// # Errors
/// * `DeviceInaccessible` - the path does not exist or cannot be inspected
/// * `NotABlockDevice` - the path is not a block special file
/// * `TableRead` - the partition or mount table cannot be read
/// * `NoPartitions` - the drive holding the device has no partitions
/// * `WrongPartition` - the device is not the drive's first partition
/// * `NotMounted` - the device is not mounted
/// * `UnsupportedFilesystem` - the device is formatted with another filesystem
pub fn validate_device<I: DeviceInspector + ?Sized>(
    inspector: &I,
    device: &Path,
    required_fs: &str,
) -> Result<Mounting> {
    let canonical = check_block_device(inspector, device)?;
    check_first_partition(inspector, device, &canonical)?;
    let mounting = find_mounting(inspector, device, &canonical)?;

    if mounting.fs_name != required_fs {
        return Err(RawdeckError::UnsupportedFilesystem {
            path: device.to_path_buf(),
            fs_name: mounting.fs_name,
            required: required_fs.to_string(),
        });
    }

    info!(
        "Validated {} mounted at {} ({})",
        canonical.display(),
        mounting.mount_point.display(),
        mounting.fs_name
    );
    Ok(mounting)
}

/// Check 1: the path is a block device. Returns its canonical path.
fn check_block_device<I: DeviceInspector + ?Sized>(inspector: &I, device: &Path) -> Result<PathBuf> {
    let inaccessible = |source| RawdeckError::DeviceInaccessible {
        path: device.to_path_buf(),
        source,
    };

    if !inspector.is_block_device(device).map_err(inaccessible)? {
        return Err(RawdeckError::NotABlockDevice {
            path: device.to_path_buf(),
        });
    }

    let canonical = inspector.canonicalize(device).map_err(inaccessible)?;
    debug!("{} resolves to {}", device.display(), canonical.display());
    Ok(canonical)
}

/// Check 2: the canonical device is the first partition of its drive
fn check_first_partition<I: DeviceInspector + ?Sized>(
    inspector: &I,
    device: &Path,
    canonical: &Path,
) -> Result<()> {
    let table = read_partition_table(inspector)?;
    let partitions = drive_partitions(&table, canonical).unwrap_or_default();
    debug!("Drive partitions: {:?}", partitions);

    match partitions.first() {
        None => Err(RawdeckError::NoPartitions {
            path: device.to_path_buf(),
        }),
        Some(first) if first.as_path() != canonical => Err(RawdeckError::WrongPartition {
            path: device.to_path_buf(),
            expected: first.clone(),
        }),
        Some(_) => Ok(()),
    }
}

/// Check 3: the canonical device appears in the mount table
fn find_mounting<I: DeviceInspector + ?Sized>(
    inspector: &I,
    device: &Path,
    canonical: &Path,
) -> Result<Mounting> {
    read_mountings(inspector)?
        .remove(canonical)
        .ok_or_else(|| RawdeckError::NotMounted {
            path: device.to_path_buf(),
        })
}

fn read_partition_table<I: DeviceInspector + ?Sized>(inspector: &I) -> Result<String> {
    inspector
        .partition_table()
        .map_err(|source| RawdeckError::TableRead {
            path: inspector.partition_table_path(),
            source,
        })
}

fn read_mountings<I: DeviceInspector + ?Sized>(inspector: &I) -> Result<Mountings> {
    let table = inspector
        .mount_table()
        .map_err(|source| RawdeckError::TableRead {
            path: inspector.mount_table_path(),
            source,
        })?;
    Ok(parse_mount_table(&table))
}

// ============================================================================
// Probe Report
// ============================================================================

/// Read-only summary of what the system knows about a device
#[derive(Debug, Clone, Serialize)]
pub struct DeviceReport {
    pub device: PathBuf,
    pub canonical_path: PathBuf,
    pub size_bytes: Option<u64>,
    pub drive_partitions: Vec<PathBuf>,
    pub first_partition: bool,
    pub mounting: Option<Mounting>,
    pub available_bytes: Option<u64>,
    /// Result of the full validation; `None` when the device is usable
    pub problem: Option<String>,
}

impl DeviceReport {
    /// Gather a report for `device`
    ///
    /// Fails only when the device is not an accessible block device; every
    /// other finding is recorded in the report.
    pub fn gather<I: DeviceInspector + ?Sized>(
        inspector: &I,
        device: &Path,
        required_fs: &str,
    ) -> Result<Self> {
        let canonical = check_block_device(inspector, device)?;

        let size_bytes = inspector.device_size(&canonical).ok();
        let drive_partitions = drive_partitions(&read_partition_table(inspector)?, &canonical)
            .unwrap_or_default();
        let first_partition = drive_partitions.first().map(PathBuf::as_path) == Some(canonical.as_path());
        let mounting = read_mountings(inspector)?.remove(&canonical);
        let available_bytes = mounting
            .as_ref()
            .and_then(|m| inspector.available_space(&m.mount_point).ok());
        let problem = validate_device(inspector, device, required_fs)
            .err()
            .map(|e| e.to_string());

        Ok(Self {
            device: device.to_path_buf(),
            canonical_path: canonical,
            size_bytes,
            drive_partitions,
            first_partition,
            mounting,
            available_bytes,
            problem,
        })
    }

    /// Whether audio files can be written to the device
    pub fn is_usable(&self) -> bool {
        self.problem.is_none()
    }
}
