//! Device Module
//!
//! Validation of the destination block device:
//! - Block type and first-partition checks
//! - Mount table lookup and filesystem check
//! - Free space queries

pub mod inspect;
pub mod mounts;
pub mod partitions;
pub mod probe;

pub use inspect::{DeviceInspector, SystemInspector};
pub use mounts::{parse_mount_table, Mounting, Mountings};
pub use partitions::{drive_partitions, is_partition_of};
pub use probe::{validate_device, DeviceReport};
