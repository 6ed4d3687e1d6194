//! The RFC 959 Store (`STOR`) command: receive a file over the data
//! channel.
//!
//! Incoming segments are accumulated in the session's sector-aligned
//! transfer buffer and written out only as full buffers, plus one final
//! flush of the remainder; FAT-family back-ends want their bulk writes
//! in whole-sector multiples. The byte counts handed to the back-end
//! must come back unchanged, otherwise the transfer is failed.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::session::{Session, StepResult};
use crate::storage::{OpenMode, Storage};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub(crate) struct Stor;

async fn write_chunk<S>(storage: &Arc<S>, file: &mut S::File, chunk: &[u8]) -> bool
where
    S: Storage + 'static,
{
    matches!(storage.write(file, chunk).await, Ok(n) if n == chunk.len())
}

#[async_trait]
impl<S> CommandHandler<S> for Stor
where
    S: Storage + 'static,
{
    async fn handle(&self, session: &mut Session<S>) -> StepResult {
        let args = session.cmd.args.clone();
        if args.is_empty() {
            return session
                .reply(Reply::new(ReplyCode::ParameterSyntaxError, "No file name"))
                .await;
        }
        if !session.build_path(&args) {
            return session
                .reply(Reply::new(ReplyCode::CommandSyntaxError, "Command line too long"))
                .await;
        }

        let storage = session.storage.clone();
        let target = session.cwd.clone();

        let mut file = match storage.open(&target, OpenMode::CreateWrite).await {
            Ok(file) => file,
            Err(_) => {
                session.restore_path();
                let msg = format!("Can't open/create {}", args);
                return session
                    .reply(Reply::new_with_string(ReplyCode::TransientFileError, msg))
                    .await;
            }
        };
        if session.data_open().await.is_err() {
            let _ = storage.close(file).await;
            session.restore_path();
            return session
                .reply(Reply::new(ReplyCode::CantOpenDataConnection, "Can't create connection"))
                .await;
        }

        slog::debug!(session.logger, "receiving file"; "path" => %target);
        let banner = format!("Connected to port {}", session.data_port);
        if let Err(end) = session
            .reply(Reply::new_with_string(ReplyCode::FileStatusOkay, banner))
            .await
        {
            let _ = storage.close(file).await;
            session.restore_path();
            session.data_close();
            return Err(end);
        }

        let window = session.opts.stor_recv_timeout;
        let cap = session.xfer_buf.len();
        let mut filled = 0usize;
        let mut received: u64 = 0;
        let mut file_err = false;
        let mut sock_err = false;

        loop {
            let n = match session.data_recv(window).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) => {
                    slog::warn!(session.logger, "data receive failed"; "error" => %err);
                    sock_err = true;
                    break;
                }
            };
            received += n as u64;

            if n >= cap {
                // Segment alone covers the buffer: flush what
                // accumulated so far, then write the segment straight
                // through.
                if filled > 0 {
                    if !write_chunk(&storage, &mut file, &session.xfer_buf[..filled]).await {
                        file_err = true;
                        break;
                    }
                    filled = 0;
                }
                if !write_chunk(&storage, &mut file, &session.recv_buf[..n]).await {
                    file_err = true;
                    break;
                }
            } else if cap - filled > n {
                session.xfer_buf[filled..filled + n].copy_from_slice(&session.recv_buf[..n]);
                filled += n;
            } else {
                let take = cap - filled;
                session.xfer_buf[filled..cap].copy_from_slice(&session.recv_buf[..take]);
                if !write_chunk(&storage, &mut file, &session.xfer_buf[..cap]).await {
                    file_err = true;
                    break;
                }
                let rest = n - take;
                if rest > 0 {
                    session.xfer_buf[..rest].copy_from_slice(&session.recv_buf[take..n]);
                }
                filled = rest;
            }
        }

        if !file_err && filled > 0 {
            if !write_chunk(&storage, &mut file, &session.xfer_buf[..filled]).await {
                file_err = true;
            }
        }
        if storage.close(file).await.is_err() {
            file_err = true;
        }
        session.restore_path();
        session.data_close();
        slog::debug!(session.logger, "upload finished"; "bytes" => received,
            "ok" => !(file_err || sock_err));

        session.state.file_received(!(file_err || sock_err));
        if sock_err {
            session
                .reply(Reply::new(ReplyCode::ConnectionClosed, "Error during file transfer"))
                .await
        } else if file_err {
            session
                .reply(Reply::new(ReplyCode::LocalError, "Communication error during transfer"))
                .await
        } else {
            session
                .reply(Reply::new(ReplyCode::ClosingDataConnection, "File successfully transferred"))
                .await
        }
    }
}
