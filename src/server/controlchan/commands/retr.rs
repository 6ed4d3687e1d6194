//! The RFC 959 Retrieve (`RETR`) command: stream a file to the client
//! over the data channel in MSS-sized chunks.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{Reply, ReplyCode};
use crate::server::options::TCP_MSS;
use crate::server::session::{Session, StepResult};
use crate::storage::{OpenMode, Storage};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

#[derive(Debug)]
pub(crate) struct Retr;

#[async_trait]
impl<S> CommandHandler<S> for Retr
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

        let info = match storage.stat(&target).await {
            Ok(info) => info,
            Err(_) => {
                session.restore_path();
                let msg = format!("File {} not found", args);
                return session.reply(Reply::new_with_string(ReplyCode::FileError, msg)).await;
            }
        };
        let mut file = match storage.open(&target, OpenMode::Read).await {
            Ok(file) => file,
            Err(_) => {
                session.restore_path();
                let msg = format!("Can't open {}", args);
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

        slog::debug!(session.logger, "sending file"; "path" => %target, "size" => info.size);
        let banner = format!("Connected to port {}, {} bytes to download", session.data_port, info.size);
        if let Err(end) = session
            .reply(Reply::new_with_string(ReplyCode::FileStatusOkay, banner))
            .await
        {
            let _ = storage.close(file).await;
            session.restore_path();
            session.data_close();
            return Err(end);
        }

        let chunk = TCP_MSS.min(session.xfer_buf.len());
        let mut sent: u64 = 0;
        let mut file_err = false;
        let mut sock_err = false;
        loop {
            let n = match storage.read(&mut file, &mut session.xfer_buf[..chunk]).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) => {
                    slog::warn!(session.logger, "file read failed"; "error" => %err);
                    file_err = true;
                    break;
                }
            };
            let Some(socket) = session.data_socket.as_mut() else {
                sock_err = true;
                break;
            };
            if let Err(err) = socket.write_all(&session.xfer_buf[..n]).await {
                slog::warn!(session.logger, "data write failed"; "error" => %err);
                sock_err = true;
                break;
            }
            sent += n as u64;
        }

        let _ = storage.close(file).await;
        session.restore_path();
        session.data_close();
        slog::debug!(session.logger, "download finished"; "bytes" => sent,
            "ok" => !(file_err || sock_err));

        session.state.file_sent(!(file_err || sock_err));
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
