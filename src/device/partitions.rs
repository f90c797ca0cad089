//! Partition table parsing
//!
//! `/proc/partitions` has two header lines followed by one line per block
//! device, the device node name being the last field:
//!
//! ```text
//! major minor  #blocks  name
//!
//!    8       16   15558144 sdb
//!    8       17   15554048 sdb1
//! ```
//!
//! The table does not say which entries are whole drives, so drives are
//! inferred from names: `sdb1` is a partition of `sdb`, and for drive names
//! ending in a digit a `p` separator is used (`mmcblk0p1`, `nvme0n1p2`).

use std::path::{Path, PathBuf};

const DEV_DIR: &str = "/dev";

/// Node names listed in a partition table, in table order
pub fn parse_partition_table(table: &str) -> Vec<String> {
    table
        .lines()
        .skip(2)
        .filter_map(|line| line.split_whitespace().last())
        .map(str::to_string)
        .collect()
}

/// Whether `name` is a partition of `drive`
pub fn is_partition_of(name: &str, drive: &str) -> bool {
    let Some(rest) = name.strip_prefix(drive) else {
        return false;
    };
    let number = if drive.ends_with(|c: char| c.is_ascii_digit()) {
        match rest.strip_prefix('p') {
            Some(number) => number,
            None => return false,
        }
    } else {
        rest
    };
    !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit())
}

/// Entries that are not partitions of another entry
pub fn drives(names: &[String]) -> Vec<&str> {
    names
        .iter()
        .filter(|name| !names.iter().any(|other| is_partition_of(name, other)))
        .map(String::as_str)
        .collect()
}

/// Partitions of the drive holding `device`, in table order
///
/// `device` may name a drive or one of its partitions. Returns `None` when
/// the device is not listed in the table at all.
pub fn drive_partitions(table: &str, device: &Path) -> Option<Vec<PathBuf>> {
    let names = parse_partition_table(table);
    let candidate = device.file_name()?.to_str()?;
    let drive = drives(&names)
        .into_iter()
        .find(|drive| *drive == candidate || is_partition_of(candidate, drive))?;

    Some(
        names
            .iter()
            .filter(|name| is_partition_of(name, drive))
            .map(|name| Path::new(DEV_DIR).join(name))
            .collect(),
    )
}
