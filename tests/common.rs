//! Shared helpers for the integration tests: a small line-oriented FTP
//! test client over raw TCP, and an in-memory storage back-end that
//! records the size of every write it receives.

#![allow(dead_code)]

use async_trait::async_trait;
use microftp::storage::{
    Error, ErrorKind, FatStamp, FileInfo, FsUsage, OpenMode, Result as StorageResult, Storage,
};
use microftp::{Server, ServerStatus};
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

const REPLY_WINDOW: Duration = Duration::from_secs(10);

/// Waits until the server reaches `want`, for up to `window`.
pub async fn wait_status<S: Storage + 'static>(
    server: &Server<S>,
    want: ServerStatus,
    window: Duration,
) {
    let deadline = tokio::time::Instant::now() + window;
    loop {
        if server.status() == want {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("server stuck in {:?}, wanted {:?}", server.status(), want);
        }
        sleep(Duration::from_millis(50)).await;
    }
}

/// Starts the server and waits for `Running`.
pub async fn start_running<S: Storage + 'static>(server: &Server<S>) {
    server.start().await.unwrap();
    wait_status(server, ServerStatus::Running, Duration::from_secs(5)).await;
}

/// A minimal control-channel client.
pub struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    pub async fn connect(port: u16) -> TestClient {
        let stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let (read, writer) = stream.into_split();
        TestClient {
            reader: BufReader::new(read),
            writer,
        }
    }

    /// Connects and consumes the 220 greeting.
    pub async fn connect_greeted(port: u16) -> TestClient {
        let mut client = TestClient::connect(port).await;
        client.expect("220 ").await;
        client
    }

    /// Connects, reads the greeting and logs in with the default
    /// credentials.
    pub async fn connect_logged_in(port: u16) -> TestClient {
        let mut client = TestClient::connect_greeted(port).await;
        client.send("USER user").await;
        client.expect("331 ").await;
        client.send("PASS pass").await;
        client.expect("230 ").await;
        client
    }

    pub async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\r\n", line).as_bytes())
            .await
            .unwrap();
    }

    /// Reads one CRLF-terminated reply line.
    pub async fn line(&mut self) -> String {
        let mut line = String::new();
        let n = timeout(REPLY_WINDOW, self.reader.read_line(&mut line))
            .await
            .expect("timed out waiting for a reply")
            .unwrap();
        assert!(n > 0, "control connection closed");
        line.trim_end_matches(['\r', '\n']).to_string()
    }

    /// Reads one line and asserts its prefix, returning the whole line.
    pub async fn expect(&mut self, prefix: &str) -> String {
        let line = self.line().await;
        assert!(
            line.starts_with(prefix),
            "expected reply starting with {:?}, got {:?}",
            prefix,
            line
        );
        line
    }

    /// True when no reply arrives within `window` (the login gate's
    /// silent no-op).
    pub async fn stays_silent(&mut self, window: Duration) -> bool {
        let mut line = String::new();
        timeout(window, self.reader.read_line(&mut line)).await.is_err()
    }

    /// Reads until the server closes the control connection.
    pub async fn expect_eof(&mut self) {
        let mut sink = Vec::new();
        timeout(REPLY_WINDOW, self.reader.read_to_end(&mut sink))
            .await
            .expect("timed out waiting for close")
            .unwrap();
    }

    /// Issues PASV and returns the advertised data port.
    pub async fn pasv_port(&mut self) -> u16 {
        self.send("PASV").await;
        let line = self.expect("227 ").await;
        parse_pasv(&line)
    }
}

/// Extracts the data port from a `227 Entering Passive Mode
/// (h1,h2,h3,h4,p1,p2).` reply.
pub fn parse_pasv(line: &str) -> u16 {
    let open = line.find('(').expect("no tuple in 227 reply");
    let close = line.rfind(')').expect("unterminated tuple in 227 reply");
    let fields: Vec<u16> = line[open + 1..close]
        .split(',')
        .map(|f| f.trim().parse().unwrap())
        .collect();
    assert_eq!(fields.len(), 6, "bad tuple: {}", line);
    fields[4] * 256 + fields[5]
}

/// Opens the data connection for a previously issued PASV.
pub async fn data_connect(port: u16) -> TcpStream {
    TcpStream::connect((Ipv4Addr::LOCALHOST, port)).await.unwrap()
}

/// Reads the whole data channel until the server closes it.
pub async fn data_read_all(mut socket: TcpStream) -> Vec<u8> {
    let mut data = Vec::new();
    timeout(REPLY_WINDOW, socket.read_to_end(&mut data))
        .await
        .expect("timed out reading the data channel")
        .unwrap();
    data
}

/// An in-memory [`Storage`] holding a flat set of files, recording the
/// length of every `write` call so tests can check the sector-aligned
/// buffering of uploads.
#[derive(Debug, Default)]
pub struct MemFs {
    files: Mutex<HashMap<String, (Vec<u8>, FatStamp)>>,
    writes: Mutex<Vec<usize>>,
}

impl MemFs {
    pub fn new() -> MemFs {
        MemFs::default()
    }

    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).map(|(data, _)| data.clone())
    }

    pub fn insert(&self, path: &str, data: &[u8]) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), (data.to_vec(), FatStamp::default()));
    }

    /// The sizes of every `write` call so far, in order.
    pub fn write_sizes(&self) -> Vec<usize> {
        self.writes.lock().unwrap().clone()
    }
}

#[derive(Debug)]
pub struct MemFile {
    path: String,
    data: Vec<u8>,
    pos: usize,
    writable: bool,
}

#[derive(Debug)]
pub struct MemDir {
    entries: Vec<FileInfo>,
    next: usize,
}

fn base_name(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

#[async_trait]
impl Storage for MemFs {
    type File = MemFile;
    type Dir = MemDir;

    async fn stat(&self, path: &str) -> StorageResult<FileInfo> {
        if path == "/" {
            return Ok(FileInfo {
                name: "/".to_string(),
                size: 0,
                stamp: FatStamp::default(),
                is_dir: true,
            });
        }
        let files = self.files.lock().unwrap();
        match files.get(path) {
            Some((data, stamp)) => Ok(FileInfo {
                name: base_name(path),
                size: data.len() as u64,
                stamp: *stamp,
                is_dir: false,
            }),
            None => Err(ErrorKind::NotFound.into()),
        }
    }

    async fn opendir(&self, path: &str) -> StorageResult<Self::Dir> {
        if path != "/" {
            return Err(ErrorKind::NotFound.into());
        }
        let files = self.files.lock().unwrap();
        let entries = files
            .iter()
            .map(|(path, (data, stamp))| FileInfo {
                name: base_name(path),
                size: data.len() as u64,
                stamp: *stamp,
                is_dir: false,
            })
            .collect();
        Ok(MemDir { entries, next: 0 })
    }

    async fn readdir(&self, dir: &mut Self::Dir) -> StorageResult<Option<FileInfo>> {
        let entry = dir.entries.get(dir.next).cloned();
        dir.next += 1;
        Ok(entry)
    }

    async fn open(&self, path: &str, mode: OpenMode) -> StorageResult<Self::File> {
        match mode {
            OpenMode::Read => {
                let files = self.files.lock().unwrap();
                let (data, _) = files.get(path).ok_or(Error::from(ErrorKind::NotFound))?;
                Ok(MemFile {
                    path: path.to_string(),
                    data: data.clone(),
                    pos: 0,
                    writable: false,
                })
            }
            OpenMode::CreateWrite => Ok(MemFile {
                path: path.to_string(),
                data: Vec::new(),
                pos: 0,
                writable: true,
            }),
        }
    }

    async fn read(&self, file: &mut Self::File, buf: &mut [u8]) -> StorageResult<usize> {
        let n = buf.len().min(file.data.len() - file.pos);
        buf[..n].copy_from_slice(&file.data[file.pos..file.pos + n]);
        file.pos += n;
        Ok(n)
    }

    async fn write(&self, file: &mut Self::File, buf: &[u8]) -> StorageResult<usize> {
        self.writes.lock().unwrap().push(buf.len());
        file.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    async fn close(&self, file: Self::File) -> StorageResult<()> {
        if file.writable {
            self.files
                .lock()
                .unwrap()
                .insert(file.path, (file.data, FatStamp::default()));
        }
        Ok(())
    }

    async fn unlink(&self, path: &str) -> StorageResult<()> {
        match self.files.lock().unwrap().remove(path) {
            Some(_) => Ok(()),
            None => Err(ErrorKind::NotFound.into()),
        }
    }

    async fn mkdir(&self, _path: &str) -> StorageResult<()> {
        Err(ErrorKind::PermissionDenied.into())
    }

    async fn rename(&self, from: &str, to: &str) -> StorageResult<()> {
        let mut files = self.files.lock().unwrap();
        match files.remove(from) {
            Some(entry) => {
                files.insert(to.to_string(), entry);
                Ok(())
            }
            None => Err(ErrorKind::NotFound.into()),
        }
    }

    async fn utime(&self, path: &str, stamp: FatStamp) -> StorageResult<()> {
        let mut files = self.files.lock().unwrap();
        match files.get_mut(path) {
            Some((_, slot)) => {
                *slot = stamp;
                Ok(())
            }
            None => Err(ErrorKind::NotFound.into()),
        }
    }

    async fn getfree(&self) -> StorageResult<FsUsage> {
        Ok(FsUsage {
            free_clusters: 1024,
            cluster_sectors: 8,
            total_clusters: 4096,
        })
    }
}
