//! A [`Storage`] implementation over a local directory, like a
//! traditional FTP server. Client paths are resolved against the
//! configured root; modification times are mapped to and from the packed
//! FAT representation the server core works with.

use super::{Error, ErrorKind, FatStamp, FileInfo, FsUsage, OpenMode, Result, Storage};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Local-filesystem back-end rooted at a directory. A client asking for
/// `/hello.txt` gets `<root>/hello.txt`.
#[derive(Debug)]
pub struct LocalFs {
    root: PathBuf,
}

/// Open-file handle of [`LocalFs`].
#[derive(Debug)]
pub struct FsFile {
    inner: tokio::fs::File,
    writable: bool,
}

/// Open-directory handle of [`LocalFs`].
#[derive(Debug)]
pub struct FsDir {
    inner: tokio::fs::ReadDir,
}

impl LocalFs {
    /// Creates a back-end serving the tree under `root`.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        LocalFs { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

fn stamp_of(time: SystemTime) -> FatStamp {
    let dt: DateTime<Local> = time.into();
    if dt.year() < 1980 {
        return FatStamp::default();
    }
    FatStamp::pack(
        dt.year() as u16,
        dt.month() as u16,
        dt.day() as u16,
        dt.hour() as u16,
        dt.minute() as u16,
        dt.second() as u16,
    )
}

fn time_of(stamp: FatStamp) -> Result<SystemTime> {
    let (year, month, day, hour, minute, second) = stamp.fields();
    Local
        .with_ymd_and_hms(
            year as i32,
            month as u32,
            day as u32,
            hour as u32,
            minute as u32,
            second as u32,
        )
        .single()
        .map(SystemTime::from)
        .ok_or_else(|| ErrorKind::LocalError.into())
}

fn info_of(name: String, meta: &std::fs::Metadata) -> FileInfo {
    FileInfo {
        name,
        size: if meta.is_dir() { 0 } else { meta.len() },
        stamp: meta.modified().map(stamp_of).unwrap_or_default(),
        is_dir: meta.is_dir(),
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("/"))
}

#[async_trait]
impl Storage for LocalFs {
    type File = FsFile;
    type Dir = FsDir;

    async fn stat(&self, path: &str) -> Result<FileInfo> {
        let full = self.resolve(path);
        let meta = tokio::fs::metadata(&full).await?;
        Ok(info_of(base_name(&full), &meta))
    }

    async fn opendir(&self, path: &str) -> Result<Self::Dir> {
        let inner = tokio::fs::read_dir(self.resolve(path)).await?;
        Ok(FsDir { inner })
    }

    async fn readdir(&self, dir: &mut Self::Dir) -> Result<Option<FileInfo>> {
        match dir.inner.next_entry().await? {
            None => Ok(None),
            Some(entry) => {
                let meta = entry.metadata().await?;
                let name = entry.file_name().to_string_lossy().into_owned();
                Ok(Some(info_of(name, &meta)))
            }
        }
    }

    async fn open(&self, path: &str, mode: OpenMode) -> Result<Self::File> {
        let full = self.resolve(path);
        let (inner, writable) = match mode {
            OpenMode::Read => (tokio::fs::File::open(full).await?, false),
            OpenMode::CreateWrite => (tokio::fs::File::create(full).await?, true),
        };
        Ok(FsFile { inner, writable })
    }

    async fn read(&self, file: &mut Self::File, buf: &mut [u8]) -> Result<usize> {
        Ok(file.inner.read(buf).await?)
    }

    async fn write(&self, file: &mut Self::File, buf: &[u8]) -> Result<usize> {
        file.inner.write_all(buf).await?;
        Ok(buf.len())
    }

    async fn close(&self, mut file: Self::File) -> Result<()> {
        if file.writable {
            file.inner.flush().await?;
            file.inner.sync_all().await?;
        }
        Ok(())
    }

    async fn unlink(&self, path: &str) -> Result<()> {
        let full = self.resolve(path);
        if tokio::fs::metadata(&full).await?.is_dir() {
            tokio::fs::remove_dir(full).await?;
        } else {
            tokio::fs::remove_file(full).await?;
        }
        Ok(())
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        Ok(tokio::fs::create_dir(self.resolve(path)).await?)
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        Ok(tokio::fs::rename(self.resolve(from), self.resolve(to)).await?)
    }

    async fn utime(&self, path: &str, stamp: FatStamp) -> Result<()> {
        let full = self.resolve(path);
        let mtime = time_of(stamp)?;
        // std exposes set_modified only on an open File; keep the whole
        // blocking pair off the async workers.
        tokio::task::spawn_blocking(move || -> Result<()> {
            let file = std::fs::OpenOptions::new().write(true).open(full)?;
            file.set_modified(mtime)?;
            Ok(())
        })
        .await
        .map_err(|err| Error::new(ErrorKind::LocalError, err))?
    }

    #[cfg(unix)]
    async fn getfree(&self) -> Result<FsUsage> {
        let vfs = nix::sys::statvfs::statvfs(&self.root)
            .map_err(|e| Error::new(ErrorKind::LocalError, e))?;
        let sectors = (vfs.fragment_size() as u64 / super::SECTOR_SIZE as u64).max(1);
        Ok(FsUsage {
            free_clusters: vfs.blocks_available() as u64,
            cluster_sectors: sectors,
            total_clusters: vfs.blocks() as u64,
        })
    }

    #[cfg(not(unix))]
    async fn getfree(&self) -> Result<FsUsage> {
        Err(ErrorKind::LocalError.into())
    }
}
