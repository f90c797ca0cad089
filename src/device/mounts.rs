//! Mount table parsing
//!
//! Lines of `/proc/mounts` look like
//! `/dev/sdb1 /media/card vfat rw,relatime 0 0`. Only the first three
//! fields are used. Spaces and other awkward characters inside a field are
//! written by the kernel as three-digit octal escapes (`\040`).

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

/// Where and how a device is mounted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mounting {
    pub mount_point: PathBuf,
    pub fs_name: String,
}

/// Mounted devices keyed by device path
pub type Mountings = BTreeMap<PathBuf, Mounting>;

/// Parse a mount table
///
/// Lines with fewer than three fields are skipped. When a device appears
/// more than once the first entry wins.
pub fn parse_mount_table(table: &str) -> Mountings {
    let mut mountings = Mountings::new();
    for line in table.lines() {
        let mut fields = line.split(' ').filter(|f| !f.is_empty());
        let (Some(device), Some(mount_point), Some(fs_name)) = (fields.next(), fields.next(), fields.next()) else {
            continue;
        };
        mountings
            .entry(PathBuf::from(unescape(device)))
            .or_insert_with(|| Mounting {
                mount_point: PathBuf::from(unescape(mount_point)),
                fs_name: unescape(fs_name),
            });
    }
    mountings
}

/// Decode `\NNN` octal escapes
fn unescape(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() && is_octal_escape(&bytes[i + 1..i + 4]) {
            let value = bytes[i + 1..i + 4]
                .iter()
                .fold(0u32, |acc, d| acc * 8 + (d - b'0') as u32);
            out.push(value as u8);
            i += 4;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn is_octal_escape(digits: &[u8]) -> bool {
    digits.len() == 3 && digits[0] <= b'3' && digits.iter().all(|d| (b'0'..=b'7').contains(d))
}
