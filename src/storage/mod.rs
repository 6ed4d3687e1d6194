//! Defines the service provider interface for storage back-end
//! implementors, plus a local-filesystem implementation.
//!
//! The server core is written against block-addressable, FAT-flavored
//! back-ends: timestamps are the packed 16-bit date/time pairs such
//! filesystems store, reads may be short, writes may not, and free space
//! is reported in clusters of sectors.

mod error;
mod fs;

pub use error::{Error, ErrorKind, Result};
pub use fs::LocalFs;

use async_trait::async_trait;
use std::fmt::Debug;

/// The sector size the transfer path aligns its writes to.
pub const SECTOR_SIZE: usize = 512;

/// A packed FAT-style timestamp.
///
/// `date` holds `((year - 1980) << 9) | (month << 5) | day` and `time`
/// holds `(hour << 11) | (minute << 5) | (second >> 1)`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FatStamp {
    /// Packed calendar date.
    pub date: u16,
    /// Packed wall-clock time, two-second resolution.
    pub time: u16,
}

impl FatStamp {
    /// Packs civil date/time fields. Years before 1980 clamp to 1980,
    /// seconds lose their low bit.
    pub fn pack(year: u16, month: u16, day: u16, hour: u16, minute: u16, second: u16) -> FatStamp {
        let year = year.max(1980);
        FatStamp {
            date: ((year - 1980) << 9) | (month << 5) | day,
            time: (hour << 11) | (minute << 5) | (second >> 1),
        }
    }

    /// Unpacks into `(year, month, day, hour, minute, second)`.
    pub fn fields(self) -> (u16, u16, u16, u16, u16, u16) {
        (
            ((self.date >> 9) & 0x7f) + 1980,
            (self.date >> 5) & 0x0f,
            self.date & 0x1f,
            (self.time >> 11) & 0x1f,
            (self.time >> 5) & 0x3f,
            (self.time & 0x1f) << 1,
        )
    }

    /// True when the back-end recorded no date for the entry.
    pub fn is_unset(self) -> bool {
        self.date == 0
    }
}

/// Metadata of one file or directory entry.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Entry name (no path components).
    pub name: String,
    /// Size in bytes; zero for directories.
    pub size: u64,
    /// Last-modification stamp.
    pub stamp: FatStamp,
    /// True when the entry is a directory.
    pub is_dir: bool,
}

/// How a file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Open an existing file for reading.
    Read,
    /// Create the file (truncating any existing one) and open it for
    /// writing.
    CreateWrite,
}

/// Free-space figures in cluster units, as FAT's `getfree` reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsUsage {
    /// Number of unallocated clusters.
    pub free_clusters: u64,
    /// Sectors per cluster.
    pub cluster_sectors: u64,
    /// Total clusters on the volume.
    pub total_clusters: u64,
}

/// The `Storage` trait can be implemented to put custom back-ends behind
/// the FTP server. All paths are absolute POSIX-style strings rooted at
/// the back-end's own root.
#[async_trait]
pub trait Storage: Send + Sync + Debug {
    /// Open-file handle type.
    type File: Send;
    /// Open-directory handle type. Dropping it closes the directory.
    type Dir: Send;

    /// Returns the metadata of the entry at `path`.
    async fn stat(&self, path: &str) -> Result<FileInfo>;

    /// Opens the directory at `path` for iteration.
    async fn opendir(&self, path: &str) -> Result<Self::Dir>;

    /// Returns the next entry, or `None` when the directory is
    /// exhausted.
    async fn readdir(&self, dir: &mut Self::Dir) -> Result<Option<FileInfo>>;

    /// Opens the file at `path`.
    async fn open(&self, path: &str, mode: OpenMode) -> Result<Self::File>;

    /// Reads into `buf`, returning the number of bytes read. Short reads
    /// are allowed; zero means end of file.
    async fn read(&self, file: &mut Self::File, buf: &mut [u8]) -> Result<usize>;

    /// Writes `buf`, returning the number of bytes written. A short
    /// write is a back-end failure, not a retry signal.
    async fn write(&self, file: &mut Self::File, buf: &[u8]) -> Result<usize>;

    /// Closes the file, flushing any buffered data.
    async fn close(&self, file: Self::File) -> Result<()>;

    /// Removes the file or empty directory at `path`.
    async fn unlink(&self, path: &str) -> Result<()>;

    /// Creates a directory at `path`.
    async fn mkdir(&self, path: &str) -> Result<()>;

    /// Renames or moves `from` to `to`.
    async fn rename(&self, from: &str, to: &str) -> Result<()>;

    /// Sets the modification stamp of the entry at `path`.
    async fn utime(&self, path: &str, stamp: FatStamp) -> Result<()>;

    /// Reports the volume's free-space figures.
    async fn getfree(&self) -> Result<FsUsage>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn stamp_packs_the_fat_bit_layout() {
        let stamp = FatStamp::pack(2024, 1, 15, 10, 30, 0);
        assert_eq!(stamp.date, ((2024 - 1980) << 9) | (1 << 5) | 15);
        assert_eq!(stamp.time, (10 << 11) | (30 << 5));
        assert_eq!(stamp.fields(), (2024, 1, 15, 10, 30, 0));
    }

    #[test]
    fn stamp_seconds_round_down_to_two() {
        let stamp = FatStamp::pack(1999, 12, 31, 23, 59, 59);
        assert_eq!(stamp.fields(), (1999, 12, 31, 23, 59, 58));
    }

    #[test]
    fn stamp_clamps_pre_epoch_years() {
        let stamp = FatStamp::pack(1970, 1, 1, 0, 0, 0);
        assert_eq!(stamp.fields().0, 1980);
    }
}
