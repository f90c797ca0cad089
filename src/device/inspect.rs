//! Access to the operating system's view of block devices
//!
//! Everything the prober needs to know about the machine goes through
//! [`DeviceInspector`], so the checks can run against canned tables in
//! tests.

use std::fs;
use std::io;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

use log::debug;
use nix::sys::statvfs::statvfs;

/// Size of the unit `/sys/class/block/<name>/size` is expressed in
const SECTOR_SIZE: u64 = 512;

/// Source of device facts
pub trait DeviceInspector {
    /// Whether `path` is a block special file
    fn is_block_device(&self, path: &Path) -> io::Result<bool>;

    /// Resolve symlinks such as `/dev/disk/by-label/CARD`
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    /// Contents of the kernel partition table
    fn partition_table(&self) -> io::Result<String>;

    /// Contents of the mount table
    fn mount_table(&self) -> io::Result<String>;

    /// Bytes available to unprivileged writers on the filesystem at `mount_point`
    fn available_space(&self, mount_point: &Path) -> io::Result<u64>;

    /// Total size of a block device in bytes
    fn device_size(&self, device: &Path) -> io::Result<u64>;

    /// Where the partition table is read from, for error messages
    fn partition_table_path(&self) -> PathBuf;

    /// Where the mount table is read from, for error messages
    fn mount_table_path(&self) -> PathBuf;
}

/// Inspector backed by procfs, sysfs and `statvfs`
#[derive(Debug, Clone)]
pub struct SystemInspector {
    partitions_path: PathBuf,
    mounts_path: PathBuf,
    sys_block_dir: PathBuf,
}

impl Default for SystemInspector {
    fn default() -> Self {
        Self {
            partitions_path: PathBuf::from("/proc/partitions"),
            mounts_path: PathBuf::from("/proc/mounts"),
            sys_block_dir: PathBuf::from("/sys/class/block"),
        }
    }
}

impl SystemInspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the partition table from another file
    pub fn with_partitions_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.partitions_path = path.into();
        self
    }

    /// Read the mount table from another file
    pub fn with_mounts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.mounts_path = path.into();
        self
    }

    /// Look up device sizes under another sysfs block directory
    pub fn with_sys_block_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.sys_block_dir = path.into();
        self
    }
}

impl DeviceInspector for SystemInspector {
    fn is_block_device(&self, path: &Path) -> io::Result<bool> {
        Ok(fs::metadata(path)?.file_type().is_block_device())
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }

    fn partition_table(&self) -> io::Result<String> {
        fs::read_to_string(&self.partitions_path)
    }

    fn mount_table(&self) -> io::Result<String> {
        fs::read_to_string(&self.mounts_path)
    }

    fn available_space(&self, mount_point: &Path) -> io::Result<u64> {
        let stat = statvfs(mount_point).map_err(io::Error::from)?;

        #[allow(clippy::unnecessary_cast)]
        let available = stat.blocks_available() as u64 * stat.fragment_size() as u64;
        debug!("{} has {} bytes available", mount_point.display(), available);
        Ok(available)
    }

    fn device_size(&self, device: &Path) -> io::Result<u64> {
        let name = device
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "device path has no file name"))?;
        let sectors = fs::read_to_string(self.sys_block_dir.join(name).join("size"))?;
        let sectors: u64 = sectors
            .trim()
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(sectors * SECTOR_SIZE)
    }

    fn partition_table_path(&self) -> PathBuf {
        self.partitions_path.clone()
    }

    fn mount_table_path(&self) -> PathBuf {
        self.mounts_path.clone()
    }
}
